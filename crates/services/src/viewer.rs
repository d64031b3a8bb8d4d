use std::sync::Arc;

use async_trait::async_trait;
use course_core::model::{UserId, ViewerState};
use tracing::{info, warn};

use crate::error::IdentityError;

/// Capability answering "who is signed in", supplied by the auth layer.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// # Errors
    ///
    /// Returns `IdentityError` if the provider cannot answer.
    async fn current_user(&self) -> Result<Option<UserId>, IdentityError>;
}

/// Identity provider with a fixed answer, for the CLI and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(Option<UserId>);

impl StaticIdentity {
    #[must_use]
    pub fn signed_in(user: UserId) -> Self {
        Self(Some(user))
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self(None)
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_user(&self) -> Result<Option<UserId>, IdentityError> {
        Ok(self.0.clone())
    }
}

/// Resolves the viewer once per session.
///
/// Starts `Resolving`; the first `resolve` settles it to `Anonymous` or
/// `Authenticated`, and only an explicit `sign_in` changes it afterwards.
pub struct ViewerSession {
    provider: Arc<dyn IdentityProvider>,
    state: ViewerState,
}

impl ViewerSession {
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            state: ViewerState::Resolving,
        }
    }

    #[must_use]
    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    /// True until resolution completes. Distinct from being anonymous.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.state.is_loading()
    }

    /// Ask the provider once. A provider failure resolves to `Anonymous`.
    pub async fn resolve(&mut self) -> &ViewerState {
        if self.state.is_loading() {
            let user = match self.provider.current_user().await {
                Ok(user) => user,
                Err(err) => {
                    warn!(error = %err, "identity lookup failed, continuing as demo viewer");
                    None
                }
            };
            self.state = std::mem::take(&mut self.state).settle(user);
            if let ViewerState::Authenticated(user) = &self.state {
                info!(user = %user, "viewer resolved");
            }
        }
        &self.state
    }

    /// Explicit sign-in action.
    pub fn sign_in(&mut self, user: UserId) {
        self.state = ViewerState::Authenticated(user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingIdentity {
        calls: AtomicUsize,
        answer: Result<Option<UserId>, String>,
    }

    #[async_trait]
    impl IdentityProvider for CountingIdentity {
        async fn current_user(&self) -> Result<Option<UserId>, IdentityError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone().map_err(IdentityError)
        }
    }

    #[tokio::test]
    async fn starts_resolving_then_settles() {
        let mut session = ViewerSession::new(Arc::new(StaticIdentity::signed_in(UserId::new("u1"))));
        assert!(session.loading());
        let state = session.resolve().await.clone();
        assert_eq!(state, ViewerState::Authenticated(UserId::new("u1")));
        assert!(!session.loading());
    }

    #[tokio::test]
    async fn anonymous_is_permanent_until_sign_in() {
        let provider = Arc::new(CountingIdentity {
            calls: AtomicUsize::new(0),
            answer: Ok(None),
        });
        let mut session = ViewerSession::new(provider.clone());
        assert_eq!(session.resolve().await, &ViewerState::Anonymous);
        assert_eq!(session.resolve().await, &ViewerState::Anonymous);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        session.sign_in(UserId::new("u2"));
        assert_eq!(session.state().user_id(), Some(&UserId::new("u2")));
    }

    #[tokio::test]
    async fn provider_failure_resolves_to_anonymous() {
        let provider = Arc::new(CountingIdentity {
            calls: AtomicUsize::new(0),
            answer: Err("offline".into()),
        });
        let mut session = ViewerSession::new(provider);
        assert!(session.resolve().await.is_anonymous());
    }
}
