//! Port for capacity-sensitive booking mutations.
//!
//! Each method is one atomic unit of work against a single event: the
//! adapter must serialise it against every other ledger call for the same
//! event (a row lock on the event in PostgreSQL, a mutex in memory). The
//! capacity check and the write it guards therefore can never interleave
//! with a competing admission, and a withdrawal can never interleave with
//! the promotion of the same entry.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{ConflictKind, EventId, Registration, UserId, WaitlistEntry};

/// Errors raised by ledger adapters when the store itself fails.
///
/// Booking conflicts are not errors at this level; they are reported through
/// the result enums below.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionLedgerError {
    /// Ledger connection could not be established.
    #[error("admission ledger connection failed: {message}")]
    Connection {
        /// Adapter-supplied failure description.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("admission ledger query failed: {message}")]
    Query {
        /// Adapter-supplied failure description.
        message: String,
    },
}

impl AdmissionLedgerError {
    /// Build a [`AdmissionLedgerError::Connection`] from any message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Build a [`AdmissionLedgerError::Query`] from any message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Result of an admission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionResult {
    /// A registration was written; any waitlist entry of the user was
    /// removed in the same unit of work.
    Admitted(Registration),
    /// The event was full and the user was enrolled on the waitlist.
    Waitlisted(WaitlistEntry),
    /// The event was full and the call does not enqueue.
    Full,
    /// The request conflicts with existing rows.
    Rejected(ConflictKind),
    /// The event does not exist.
    EventMissing,
}

/// Result of a waitlist enrolment attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueResult {
    /// The user now holds this entry.
    Enqueued(WaitlistEntry),
    /// One of `WaitlistNotEnabled`, `EventNotFull`, `AlreadyRegistered` or
    /// `AlreadyOnWaitlist`.
    Rejected(ConflictKind),
    /// The event does not exist.
    EventMissing,
}

/// Result of a cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancellationResult {
    /// The registration was removed.
    Cancelled {
        /// Whether the event was at capacity immediately before the delete.
        /// Always `false` for unlimited events.
        was_full: bool,
    },
    /// The user held no registration for the event.
    NotRegistered,
    /// The event does not exist.
    EventMissing,
}

/// Result of withdrawing a user from a waitlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawalResult {
    /// The user's entry was removed.
    Withdrawn,
    /// The user held no entry for the event.
    NotListed,
    /// The event does not exist.
    EventMissing,
}

/// Result of admitting one specific waitlist entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromotionStep {
    /// Registration written and entry removed.
    Promoted(Registration),
    /// Registration written but the entry could not be removed.
    PromotedButStillListed(Registration),
    /// The freed slot was taken before the entry could use it.
    SlotTaken,
    /// The entry no longer exists.
    EntryWithdrawn,
    /// The entry's user already holds a registration.
    AlreadyRegistered,
    /// The event does not exist.
    EventMissing,
}

/// Atomic admission operations over registrations and waitlists.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdmissionLedger: Send + Sync {
    /// Write a registration if the event has room; never enqueues.
    ///
    /// Yields `Admitted`, `Full`, `Rejected(AlreadyRegistered)` or
    /// `EventMissing`.
    async fn insert_registration(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<AdmissionResult, AdmissionLedgerError>;

    /// Write a registration if the event has room, otherwise enrol the user
    /// on the waitlist.
    ///
    /// Never yields `Full`.
    async fn admit_or_enqueue(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<AdmissionResult, AdmissionLedgerError>;

    /// Enrol the user on the waitlist only if the event is limited and full.
    async fn add_entry(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<EnqueueResult, AdmissionLedgerError>;

    /// Remove the user's registration, reporting whether the event was full
    /// immediately beforehand.
    async fn cancel(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<CancellationResult, AdmissionLedgerError>;

    /// Remove the user's waitlist entry.
    ///
    /// Serialised with [`AdmissionLedger::promote_entry`], so an entry is
    /// either withdrawn or promoted, never both.
    async fn withdraw_entry(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<WithdrawalResult, AdmissionLedgerError>;

    /// Admit the given entry's user and remove the entry.
    async fn promote_entry(
        &self,
        entry: &WaitlistEntry,
    ) -> Result<PromotionStep, AdmissionLedgerError>;
}
