//! Driving ports for the booking engine.
//!
//! Inbound adapters (HTTP handlers, the reconcile binary, job runners) call
//! these traits; the domain services implement them. Authentication and
//! authorisation happen before a request reaches this layer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Error, EventId, PromotionOutcome, ReconciliationReport, RegistrationOutcome, UserId,
    WaitlistEntry,
};

/// A user acting on one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    /// Event being booked.
    pub event_id: EventId,
    /// Authenticated user making the request.
    pub user_id: UserId,
}

impl BookingRequest {
    /// Pair a user with the event they act on.
    #[must_use]
    pub const fn new(event_id: EventId, user_id: UserId) -> Self {
        Self { event_id, user_id }
    }
}

/// Registration and waitlist mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistrationCommand: Send + Sync {
    /// Admit the user, or waitlist them when the event is full.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown event; `Conflict` with `AlreadyRegistered`
    /// or `AlreadyOnWaitlist`; store failures.
    async fn register(&self, request: BookingRequest) -> Result<RegistrationOutcome, Error>;

    /// Remove the user's registration and schedule a promotion when the
    /// event was full.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown event or a missing registration; store
    /// failures.
    async fn cancel(&self, request: BookingRequest) -> Result<(), Error>;

    /// Enrol the user on a full event's waitlist.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown event; `Conflict` with
    /// `WaitlistNotEnabled`, `EventNotFull`, `AlreadyRegistered` or
    /// `AlreadyOnWaitlist`; store failures.
    async fn join_waitlist(&self, request: BookingRequest) -> Result<WaitlistEntry, Error>;

    /// Remove the user's waitlist entry.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown event; `Conflict` with `UserNotOnWaitlist`;
    /// store failures.
    async fn leave_waitlist(&self, request: BookingRequest) -> Result<(), Error>;
}

/// Read access to waitlists.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WaitlistQuery: Send + Sync {
    /// Entries for the event, oldest first.
    async fn waitlist_for_event(&self, event_id: EventId) -> Result<Vec<WaitlistEntry>, Error>;
}

/// Promotion of waitlisted users into freed slots.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WaitlistPromotion: Send + Sync {
    /// Try to admit the oldest waitlisted user. Never advances past a
    /// failed attempt.
    async fn promote_next(&self, event_id: EventId) -> PromotionOutcome;

    /// Promote repeatedly while the event has room and users are waiting.
    async fn reconcile(&self, event_id: EventId) -> Result<ReconciliationReport, Error>;

    /// Reconcile every event that currently has waitlist entries.
    ///
    /// A failure reading one event is logged and does not stop the others.
    async fn reconcile_all(&self) -> Result<Vec<ReconciliationReport>, Error>;
}

/// Maintenance of the per-event mean rating.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RatingRecompute: Send + Sync {
    /// Recompute and store the mean rating, returning the stored value.
    async fn recompute(&self, event_id: EventId) -> Result<f64, Error>;

    /// Queue a recompute after a review write.
    fn schedule_recompute(&self, event_id: EventId) -> Result<(), Error>;
}
