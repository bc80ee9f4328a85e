//! Authenticator trait.

use async_trait::async_trait;

use super::model::Identity;
use crate::error::Result;

/// Resolves a caller-presented token into a verified identity.
///
/// Implementations live outside the core; the service only consumes the
/// resulting [`Identity`].
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Verifies `token`.
    ///
    /// # Returns
    ///
    /// - `Ok(Identity::Anonymous)`: No token was presented
    /// - `Ok(Identity::User(_))`: Token verified
    /// - `Err(TodoError::Unauthorized)`: Token unknown or malformed
    async fn authenticate(&self, token: Option<&str>) -> Result<Identity>;
}
