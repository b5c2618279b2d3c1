//! Port for resolving user profiles.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{User, UserId};

/// Errors raised by user repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserRepositoryError {
    /// Repository connection could not be established.
    #[error("user repository connection failed: {message}")]
    Connection {
        /// Adapter-supplied failure description.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("user repository query failed: {message}")]
    Query {
        /// Adapter-supplied failure description.
        message: String,
    },
}

impl UserRepositoryError {
    /// Build a [`UserRepositoryError::Connection`] from any message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Build a [`UserRepositoryError::Query`] from any message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Port over user profiles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user profile by id.
    async fn find_by_id(&self, user_id: &UserId) -> Result<Option<User>, UserRepositoryError>;
}
