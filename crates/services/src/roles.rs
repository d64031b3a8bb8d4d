use std::sync::Arc;

use course_core::model::{Gate, Profile, Role, UserId, ViewerState};
use storage::repository::{RoleRepository, StorageError};
use tracing::info;

use crate::error::RoleError;

/// Outcome of checking the admin role for a viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminGate {
    /// Viewer or role lookup still pending.
    Wait,
    Allow,
    Deny,
}

/// A profile together with whether it holds the admin role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserWithRole {
    pub profile: Profile,
    pub is_admin: bool,
}

#[derive(Clone)]
pub struct RoleService {
    roles: Arc<dyn RoleRepository>,
}

impl RoleService {
    #[must_use]
    pub fn new(roles: Arc<dyn RoleRepository>) -> Self {
        Self { roles }
    }

    /// # Errors
    ///
    /// Returns `RoleError::Storage` if roles cannot be read.
    pub async fn is_admin(&self, user: &UserId) -> Result<bool, RoleError> {
        let roles = self.roles.roles_for(user).await?;
        Ok(roles.contains(&Role::Admin))
    }

    /// # Errors
    ///
    /// Returns `RoleError::Storage` if roles cannot be read.
    pub async fn admin_gate(&self, viewer: &ViewerState) -> Result<AdminGate, RoleError> {
        match viewer.gate() {
            Gate::Wait => Ok(AdminGate::Wait),
            Gate::RedirectToSignIn => Ok(AdminGate::Deny),
            Gate::Proceed(user) => Ok(if self.is_admin(user).await? {
                AdminGate::Allow
            } else {
                AdminGate::Deny
            }),
        }
    }

    /// Admin user behind `viewer`, or the reason there is none.
    ///
    /// # Errors
    ///
    /// `Resolving`, `Unauthorized`, `Forbidden` or `Storage`.
    pub async fn require_admin<'a>(&self, viewer: &'a ViewerState) -> Result<&'a UserId, RoleError> {
        match viewer.gate() {
            Gate::Wait => Err(RoleError::Resolving),
            Gate::RedirectToSignIn => Err(RoleError::Unauthorized),
            Gate::Proceed(user) => {
                if self.is_admin(user).await? {
                    Ok(user)
                } else {
                    Err(RoleError::Forbidden)
                }
            }
        }
    }

    /// All known profiles with their admin flag. Admin only.
    ///
    /// # Errors
    ///
    /// Access errors from `require_admin`, or `Storage`.
    pub async fn list_users(&self, viewer: &ViewerState) -> Result<Vec<UserWithRole>, RoleError> {
        self.require_admin(viewer).await?;
        let profiles = self.roles.list_profiles().await?;
        let mut users = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let is_admin = self.is_admin(&profile.id).await?;
            users.push(UserWithRole { profile, is_admin });
        }
        Ok(users)
    }

    /// Grant or revoke the admin role. Setting the current value again is a no-op.
    ///
    /// # Errors
    ///
    /// Access errors from `require_admin`, or `Storage`.
    pub async fn set_admin(
        &self,
        viewer: &ViewerState,
        user: &UserId,
        admin: bool,
    ) -> Result<(), RoleError> {
        let actor = self.require_admin(viewer).await?;
        let result = if admin {
            self.roles.grant_role(user, Role::Admin).await
        } else {
            self.roles.revoke_role(user, Role::Admin).await
        };
        match result {
            Ok(()) | Err(StorageError::Conflict | StorageError::NotFound) => {
                info!(actor = %actor, user = %user, admin, "admin role updated");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}
