use crate::model::ids::UserId;

/// Who is looking at the course.
///
/// `Resolving` means the identity provider has not answered yet and must not be
/// confused with `Anonymous` (a demo visitor known to have no identity).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum ViewerState {
    #[default]
    Resolving,
    Anonymous,
    Authenticated(UserId),
}

/// Decision derived from a viewer state before taking a gated action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate<'a> {
    /// Still resolving; take no action and make no redirect decision.
    Wait,
    Proceed(&'a UserId),
    RedirectToSignIn,
}

impl ViewerState {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Resolving)
    }

    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    #[must_use]
    pub fn gate(&self) -> Gate<'_> {
        match self {
            Self::Resolving => Gate::Wait,
            Self::Anonymous => Gate::RedirectToSignIn,
            Self::Authenticated(user) => Gate::Proceed(user),
        }
    }

    /// Apply the identity provider's answer. Only a `Resolving` state moves;
    /// a settled state stays as it is until an explicit sign-in.
    #[must_use]
    pub fn settle(self, user: Option<UserId>) -> Self {
        match self {
            Self::Resolving => user.map_or(Self::Anonymous, Self::Authenticated),
            settled => settled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolving_is_distinct_from_anonymous() {
        assert!(ViewerState::Resolving.is_loading());
        assert!(!ViewerState::Resolving.is_anonymous());
        assert!(ViewerState::Anonymous.is_anonymous());
        assert!(!ViewerState::Anonymous.is_loading());
    }

    #[test]
    fn gate_waits_while_resolving() {
        assert_eq!(ViewerState::Resolving.gate(), Gate::Wait);
        assert_eq!(ViewerState::Anonymous.gate(), Gate::RedirectToSignIn);
        let user = UserId::new("u1");
        assert_eq!(
            ViewerState::Authenticated(user.clone()).gate(),
            Gate::Proceed(&user)
        );
    }

    #[test]
    fn settle_is_one_way() {
        let anon = ViewerState::Resolving.settle(None);
        assert_eq!(anon, ViewerState::Anonymous);
        assert_eq!(anon.settle(Some(UserId::new("u1"))), ViewerState::Anonymous);

        let signed_in = ViewerState::Resolving.settle(Some(UserId::new("u1")));
        assert_eq!(signed_in.user_id(), Some(&UserId::new("u1")));
    }
}
