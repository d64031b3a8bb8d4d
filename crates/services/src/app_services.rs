use std::sync::Arc;

use course_core::model::ProgressPolicy;
use storage::repository::Storage;

use crate::authoring::AuthoringService;
use crate::course_session::CourseSession;
use crate::error::AppServicesError;
use crate::generation::{ContentGenerator, HttpContentGenerator};
use crate::roles::RoleService;
use crate::Clock;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    clock: Clock,
    policy: ProgressPolicy,
    roles: RoleService,
    authoring: Arc<AuthoringService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage, with generation configured
    /// from the environment.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(
            storage,
            clock,
            Arc::new(HttpContentGenerator::from_env()),
        ))
    }

    #[must_use]
    pub fn from_storage(
        storage: Storage,
        clock: Clock,
        generator: Arc<dyn ContentGenerator>,
    ) -> Self {
        let roles = RoleService::new(Arc::clone(&storage.roles));
        let authoring = Arc::new(AuthoringService::new(
            Arc::clone(&storage.content),
            roles.clone(),
            generator,
        ));
        Self {
            storage,
            clock,
            policy: ProgressPolicy::default(),
            roles,
            authoring,
        }
    }

    /// Policy applied to sessions created afterwards.
    #[must_use]
    pub fn with_progress_policy(mut self, policy: ProgressPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// A fresh learner session; call `CourseSession::open` to load it.
    #[must_use]
    pub fn course_session(&self) -> CourseSession {
        CourseSession::from_storage(&self.storage, self.clock, self.policy)
    }

    #[must_use]
    pub fn roles(&self) -> RoleService {
        self.roles.clone()
    }

    #[must_use]
    pub fn authoring(&self) -> Arc<AuthoringService> {
        Arc::clone(&self.authoring)
    }
}
