//! Caller identity and visibility scope.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, TodoError};

/// Identifier of the user owning a task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for OwnerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for OwnerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A caller identity as verified by an [`Authenticator`](super::Authenticator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// No credentials were presented.
    Anonymous,
    /// A verified user.
    User(OwnerId),
}

/// Which records an operation can see and touch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Single-user store: every task is visible.
    Unscoped,
    /// Only tasks owned by this user are visible.
    Owner(OwnerId),
}

impl Scope {
    /// Owner stamped on tasks created under this scope.
    pub fn owner(&self) -> Option<&OwnerId> {
        match self {
            Self::Unscoped => None,
            Self::Owner(owner) => Some(owner),
        }
    }
}

/// Per-call context: the verified identity plus whatever owner the client
/// claimed in its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub identity: Identity,
    pub claimed_owner: Option<OwnerId>,
}

impl RequestContext {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            claimed_owner: None,
        }
    }

    pub fn anonymous() -> Self {
        Self::new(Identity::Anonymous)
    }

    pub fn user(owner: impl Into<OwnerId>) -> Self {
        Self::new(Identity::User(owner.into()))
    }

    /// Records the owner id the client supplied alongside the call.
    pub fn claiming(mut self, owner: Option<OwnerId>) -> Self {
        self.claimed_owner = owner;
        self
    }

    /// Resolves the scope the call runs in.
    ///
    /// A claimed owner must match the verified user. Anonymous callers get
    /// [`Scope::Unscoped`] only when `allow_anonymous` is set and they claim
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns `TodoError::Unauthorized` when the claim cannot be honoured.
    pub fn resolve_scope(&self, allow_anonymous: bool) -> Result<Scope> {
        match (&self.identity, &self.claimed_owner) {
            (Identity::User(user), None) => Ok(Scope::Owner(user.clone())),
            (Identity::User(user), Some(claimed)) if claimed == user => {
                Ok(Scope::Owner(user.clone()))
            }
            (Identity::User(user), Some(claimed)) => Err(TodoError::unauthorized(format!(
                "user '{}' cannot act as '{}'",
                user, claimed
            ))),
            (Identity::Anonymous, Some(claimed)) => Err(TodoError::unauthorized(format!(
                "unauthenticated caller cannot act as '{}'",
                claimed
            ))),
            (Identity::Anonymous, None) if allow_anonymous => Ok(Scope::Unscoped),
            (Identity::Anonymous, None) => {
                Err(TodoError::unauthorized("authentication required"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_without_claim_is_scoped_to_self() {
        let scope = RequestContext::user("alice").resolve_scope(false).unwrap();
        assert_eq!(scope, Scope::Owner(OwnerId::from("alice")));
    }

    #[test]
    fn test_matching_claim_is_accepted() {
        let scope = RequestContext::user("alice")
            .claiming(Some(OwnerId::from("alice")))
            .resolve_scope(false)
            .unwrap();
        assert_eq!(scope.owner().map(OwnerId::as_str), Some("alice"));
    }

    #[test]
    fn test_mismatched_claim_is_rejected() {
        let err = RequestContext::user("alice")
            .claiming(Some(OwnerId::from("bob")))
            .resolve_scope(true)
            .unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_anonymous_claim_is_rejected_even_in_single_user_mode() {
        let err = RequestContext::anonymous()
            .claiming(Some(OwnerId::from("bob")))
            .resolve_scope(true)
            .unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_anonymous_requires_opt_in() {
        assert_eq!(
            RequestContext::anonymous().resolve_scope(true).unwrap(),
            Scope::Unscoped
        );
        assert!(RequestContext::anonymous().resolve_scope(false).is_err());
    }
}
