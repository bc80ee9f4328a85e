//! Authenticator implementations selected by `[auth]` config.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use todos_core::config::{AuthConfig, AuthMode};
use todos_core::error::{Result, TodoError};
use todos_core::identity::{Authenticator, Identity, OwnerId};

/// Single-user mode: every caller is anonymous and shares one list.
#[derive(Debug, Clone, Default)]
pub struct SingleUserAuthenticator;

#[async_trait]
impl Authenticator for SingleUserAuthenticator {
    async fn authenticate(&self, token: Option<&str>) -> Result<Identity> {
        if token.is_some() {
            tracing::debug!("Ignoring bearer token in single-user mode");
        }
        Ok(Identity::Anonymous)
    }
}

/// Static bearer tokens mapped to user ids.
#[derive(Debug, Clone, Default)]
pub struct TokenAuthenticator {
    tokens: HashMap<String, OwnerId>,
}

impl TokenAuthenticator {
    pub fn new(entries: impl IntoIterator<Item = (String, OwnerId)>) -> Self {
        Self {
            tokens: entries.into_iter().collect(),
        }
    }
}

#[async_trait]
impl Authenticator for TokenAuthenticator {
    async fn authenticate(&self, token: Option<&str>) -> Result<Identity> {
        let Some(token) = token else {
            return Ok(Identity::Anonymous);
        };
        match self.tokens.get(token) {
            Some(owner) => Ok(Identity::User(owner.clone())),
            None => {
                tracing::warn!("Rejected unknown bearer token");
                Err(TodoError::unauthorized("unknown token"))
            }
        }
    }
}

/// Builds the authenticator configured by `config`.
pub fn authenticator_from_config(config: &AuthConfig) -> Arc<dyn Authenticator> {
    match config.mode {
        AuthMode::SingleUser => Arc::new(SingleUserAuthenticator),
        AuthMode::Tokens => Arc::new(TokenAuthenticator::new(
            config
                .tokens
                .iter()
                .map(|entry| (entry.token.clone(), OwnerId::from(entry.user_id.as_str()))),
        )),
    }
}
