//! Port for reading FIFO waitlists.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{EventId, UserId, WaitlistEntry};

/// Errors raised by waitlist repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WaitlistRepositoryError {
    /// Repository connection could not be established.
    #[error("waitlist repository connection failed: {message}")]
    Connection {
        /// Adapter-supplied failure description.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("waitlist repository query failed: {message}")]
    Query {
        /// Adapter-supplied failure description.
        message: String,
    },
}

impl WaitlistRepositoryError {
    /// Build a [`WaitlistRepositoryError::Connection`] from any message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Build a [`WaitlistRepositoryError::Query`] from any message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Read-only port over the waitlist store. Entries are added and removed
/// through [`super::AdmissionLedger`] so that every change is serialised with
/// admissions and promotions for the same event.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WaitlistRepository: Send + Sync {
    /// All entries for the event, oldest first.
    async fn list_ordered(
        &self,
        event_id: &EventId,
    ) -> Result<Vec<WaitlistEntry>, WaitlistRepositoryError>;

    /// The oldest entry for the event, if any.
    async fn peek_oldest(
        &self,
        event_id: &EventId,
    ) -> Result<Option<WaitlistEntry>, WaitlistRepositoryError>;

    /// Whether the user holds an entry for the event.
    async fn exists(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<bool, WaitlistRepositoryError>;

    /// Events that currently have at least one waitlist entry.
    async fn list_events_with_entries(&self) -> Result<Vec<EventId>, WaitlistRepositoryError>;
}
