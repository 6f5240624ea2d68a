//! Seam to the authenticated-identity provider.
//!
//! The engine never stores credentials; it asks this trait at the moment
//! a connection or request needs them.

use std::sync::Arc;

use crate::types::UserId;

/// The logged-in user as seen by the sync engine.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: UserId,
    /// Bearer token attached verbatim to the `Authorization` header.
    pub token: String,
}

pub trait IdentityProvider: Send + Sync {
    /// Current authenticated identity, or `None` when logged out.
    fn identity(&self) -> Option<Identity>;
}

impl<T: IdentityProvider + ?Sized> IdentityProvider for Arc<T> {
    fn identity(&self) -> Option<Identity> {
        (**self).identity()
    }
}

/// Fixed identity, for tests and single-user embeddings.
#[derive(Debug, Clone)]
pub struct StaticIdentity(Identity);

impl StaticIdentity {
    pub fn new(user_id: UserId, token: impl Into<String>) -> Self {
        Self(Identity {
            user_id,
            token: token.into(),
        })
    }
}

impl IdentityProvider for StaticIdentity {
    fn identity(&self) -> Option<Identity> {
        Some(self.0.clone())
    }
}

/// Provider that is never logged in. Useful for auth-failure tests.
#[derive(Debug, Clone, Default)]
pub struct NoIdentity;

impl IdentityProvider for NoIdentity {
    fn identity(&self) -> Option<Identity> {
        None
    }
}
