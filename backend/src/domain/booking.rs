//! Registration and waitlist records produced by the booking engine.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{EventId, UserId};

/// Active booking of a user into an event.
///
/// At most one registration exists per `(event_id, user_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    /// Event the slot belongs to.
    pub event_id: EventId,
    /// User holding the slot.
    pub user_id: UserId,
    /// When the slot was granted.
    pub created_at: DateTime<Utc>,
}

/// Identifier of a single waitlist entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct WaitlistEntryId(Uuid);

impl WaitlistEntryId {
    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a new random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

/// A user deferred because an event was full.
///
/// Entries for one event are served oldest `created_at` first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistEntry {
    /// Entry identifier.
    pub id: WaitlistEntryId,
    /// Event the user is waiting for.
    pub event_id: EventId,
    /// Waiting user.
    pub user_id: UserId,
    /// Enrolment time; the FIFO key.
    pub created_at: DateTime<Utc>,
}

/// Successful result of a registration request.
///
/// `Waitlisted` is an accepted-but-deferred result, not a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegistrationOutcome {
    /// A slot was granted.
    Admitted(Registration),
    /// The event was full and the user joined the waitlist.
    Waitlisted(WaitlistEntry),
}

impl RegistrationOutcome {
    /// Whether a slot was granted.
    #[must_use]
    pub const fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted(_))
    }
}
