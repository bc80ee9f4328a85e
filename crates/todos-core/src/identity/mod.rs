//! Caller identity, scope resolution and the authenticator seam.

mod authenticator;
mod model;

pub use authenticator::Authenticator;
pub use model::{Identity, OwnerId, RequestContext, Scope};
