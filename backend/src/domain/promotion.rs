//! Outcomes of waitlist promotion.

use serde::Serialize;
use thiserror::Error;

use super::{Error, EventId, Registration, User, WaitlistEntry};

/// A waitlisted user who was admitted into a freed slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotedUser {
    /// The entry that was consumed.
    pub entry: WaitlistEntry,
    /// The registration written for it.
    pub registration: Registration,
    /// Profile used for notification. `None` when the lookup failed; the
    /// promotion itself still stands.
    pub user: Option<User>,
}

/// Why a promotion attempt stopped without admitting anyone.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PromotionFailure {
    /// The event was deleted.
    #[error("event {0} no longer exists")]
    EventMissing(EventId),
    /// A competing admission used the slot first.
    #[error("the freed slot was taken before the oldest entry could use it")]
    SlotTaken,
    /// The entry was removed between lookup and admission.
    #[error("the oldest entry was withdrawn during promotion")]
    EntryWithdrawn,
    /// The entry's user registered by other means.
    #[error("the oldest entry's user is already registered")]
    AlreadyRegistered,
    /// A port returned an error.
    #[error("store failure during promotion: {0}")]
    Store(Error),
}

/// Terminal outcome of one promotion attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum PromotionOutcome {
    /// The oldest entry was admitted.
    Promoted(PromotedUser),
    /// Nothing to do: the event is unlimited, full, or has no waitlist.
    NoOneWaiting,
    /// The attempt stopped without admitting anyone.
    Failed(PromotionFailure),
}

impl PromotionOutcome {
    /// The promoted user, when the attempt admitted one.
    #[must_use]
    pub const fn promoted(&self) -> Option<&PromotedUser> {
        match self {
            Self::Promoted(promoted) => Some(promoted),
            _ => None,
        }
    }
}

/// Result of filling every free slot of one event from its waitlist.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationReport {
    /// Event that was reconciled.
    pub event_id: EventId,
    /// Users admitted during the pass, oldest entry first.
    pub promoted: Vec<PromotedUser>,
    /// The failure that ended the pass early, if any.
    pub stopped_by: Option<PromotionFailure>,
}

impl ReconciliationReport {
    /// An empty report for the event.
    #[must_use]
    pub const fn new(event_id: EventId) -> Self {
        Self {
            event_id,
            promoted: Vec::new(),
            stopped_by: None,
        }
    }
}
