//! Port for reading review ratings.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{EventId, Rating};

/// Errors raised by review repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewRepositoryError {
    /// Repository connection could not be established.
    #[error("review repository connection failed: {message}")]
    Connection {
        /// Adapter-supplied failure description.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("review repository query failed: {message}")]
    Query {
        /// Adapter-supplied failure description.
        message: String,
    },
}

impl ReviewRepositoryError {
    /// Build a [`ReviewRepositoryError::Connection`] from any message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Build a [`ReviewRepositoryError::Query`] from any message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Port over stored event reviews.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Ratings of every review written for the event.
    async fn list_ratings(&self, event_id: &EventId) -> Result<Vec<Rating>, ReviewRepositoryError>;
}
