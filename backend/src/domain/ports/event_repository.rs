//! Port for event lookups and capacity-neutral registration reads.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Event, EventId, UserId};

/// Errors raised by event repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventRepositoryError {
    /// Repository connection could not be established.
    #[error("event repository connection failed: {message}")]
    Connection {
        /// Adapter-supplied failure description.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("event repository query failed: {message}")]
    Query {
        /// Adapter-supplied failure description.
        message: String,
    },
}

impl EventRepositoryError {
    /// Build a [`EventRepositoryError::Connection`] from any message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Build a [`EventRepositoryError::Query`] from any message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Port over the event store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Point lookup of an event.
    async fn find_by_id(&self, event_id: &EventId) -> Result<Option<Event>, EventRepositoryError>;

    /// Number of registrations currently held for the event.
    async fn count_active_registrations(
        &self,
        event_id: &EventId,
    ) -> Result<u64, EventRepositoryError>;

    /// Whether the user holds a registration for the event.
    async fn registration_exists(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<bool, EventRepositoryError>;

    /// Overwrite the event's stored mean rating.
    async fn update_average_rating(
        &self,
        event_id: &EventId,
        average_rating: f64,
    ) -> Result<(), EventRepositoryError>;
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn connection_error_formats_message() {
        let err = EventRepositoryError::connection("pool exhausted");
        assert_eq!(
            err.to_string(),
            "event repository connection failed: pool exhausted"
        );
    }
}
