//! Registration coordinator.
//!
//! Decides whether a booking request is admitted, deferred to the waitlist or
//! rejected, and schedules a promotion when a cancellation frees a slot on a
//! full event. Every write goes through the [`AdmissionLedger`]; reads
//! performed here only serve to fail fast with the right conflict kind, the
//! ledger re-checks them atomically.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::domain::booking_service_support::{
    event_not_found, map_event_repository_error, map_ledger_error,
    map_waitlist_repository_error,
};
use crate::domain::ports::{
    AdmissionLedger, AdmissionResult, BackgroundJob, BookingRequest, CancellationResult,
    EnqueueResult, EventRepository, JobDispatcher, RegistrationCommand, WaitlistQuery,
    WaitlistRepository, WithdrawalResult,
};
use crate::domain::{
    ConflictKind, Error, Event, EventId, RegistrationOutcome, UserId, WaitlistEntry,
};

/// Service implementing [`RegistrationCommand`] and [`WaitlistQuery`].
#[derive(Clone)]
pub struct RegistrationCoordinator<E, W, L, J> {
    events: Arc<E>,
    waitlists: Arc<W>,
    ledger: Arc<L>,
    jobs: Arc<J>,
}

impl<E, W, L, J> RegistrationCoordinator<E, W, L, J> {
    /// Create a coordinator over the given stores and job dispatcher.
    #[must_use]
    pub const fn new(events: Arc<E>, waitlists: Arc<W>, ledger: Arc<L>, jobs: Arc<J>) -> Self {
        Self {
            events,
            waitlists,
            ledger,
            jobs,
        }
    }
}

impl<E, W, L, J> RegistrationCoordinator<E, W, L, J>
where
    E: EventRepository,
    W: WaitlistRepository,
    L: AdmissionLedger,
    J: JobDispatcher,
{
    async fn require_event(&self, event_id: &EventId) -> Result<Event, Error> {
        self.events
            .find_by_id(event_id)
            .await
            .map_err(map_event_repository_error)?
            .ok_or_else(|| event_not_found(event_id))
    }

    async fn ensure_not_registered(&self, request: &BookingRequest) -> Result<(), Error> {
        let registered = self
            .events
            .registration_exists(&request.event_id, &request.user_id)
            .await
            .map_err(map_event_repository_error)?;
        if registered {
            return Err(Error::conflict(ConflictKind::AlreadyRegistered));
        }
        Ok(())
    }

    fn admission_outcome(
        request: &BookingRequest,
        result: AdmissionResult,
    ) -> Result<Option<RegistrationOutcome>, Error> {
        match result {
            AdmissionResult::Admitted(registration) => {
                info!(
                    event_id = %request.event_id,
                    user_id = %request.user_id,
                    outcome = "admitted",
                    "registration admitted"
                );
                Ok(Some(RegistrationOutcome::Admitted(registration)))
            }
            AdmissionResult::Waitlisted(entry) => {
                info!(
                    event_id = %request.event_id,
                    user_id = %request.user_id,
                    outcome = "waitlisted",
                    "event full; user added to waitlist"
                );
                Ok(Some(RegistrationOutcome::Waitlisted(entry)))
            }
            AdmissionResult::Full => Ok(None),
            AdmissionResult::Rejected(kind) => Err(Error::conflict(kind)),
            AdmissionResult::EventMissing => Err(event_not_found(&request.event_id)),
        }
    }

    /// Hand a promotion for the event to the job runner.
    ///
    /// The cancellation that triggered it has already committed, so a
    /// dispatch failure is logged rather than returned.
    fn schedule_promotion(&self, event_id: EventId, user_id: UserId) {
        match self.jobs.dispatch(BackgroundJob::PromoteWaitlist { event_id }) {
            Ok(()) => debug!(%event_id, %user_id, "promotion scheduled after cancellation"),
            Err(err) => error!(
                %event_id,
                %user_id,
                error = %err,
                "failed to schedule promotion; slot stays free until reconciliation"
            ),
        }
    }
}

#[async_trait]
impl<E, W, L, J> RegistrationCommand for RegistrationCoordinator<E, W, L, J>
where
    E: EventRepository,
    W: WaitlistRepository,
    L: AdmissionLedger,
    J: JobDispatcher,
{
    async fn register(&self, request: BookingRequest) -> Result<RegistrationOutcome, Error> {
        let event = self.require_event(&request.event_id).await?;
        self.ensure_not_registered(&request).await?;

        if !event.capacity().is_limited() {
            let result = self
                .ledger
                .insert_registration(&request.event_id, &request.user_id)
                .await
                .map_err(map_ledger_error)?;
            if let Some(outcome) = Self::admission_outcome(&request, result)? {
                return Ok(outcome);
            }
            // Capacity was set between the lookup and the insert.
            debug!(event_id = %request.event_id, "event became limited; retrying admission");
        }

        let result = self
            .ledger
            .admit_or_enqueue(&request.event_id, &request.user_id)
            .await
            .map_err(map_ledger_error)?;
        Self::admission_outcome(&request, result)?.ok_or_else(|| {
            Error::internal("admission ledger reported a full event without enqueueing")
        })
    }

    async fn cancel(&self, request: BookingRequest) -> Result<(), Error> {
        self.require_event(&request.event_id).await?;
        match self
            .ledger
            .cancel(&request.event_id, &request.user_id)
            .await
            .map_err(map_ledger_error)?
        {
            CancellationResult::Cancelled { was_full } => {
                info!(
                    event_id = %request.event_id,
                    user_id = %request.user_id,
                    was_full,
                    "registration cancelled"
                );
                if was_full {
                    self.schedule_promotion(request.event_id, request.user_id);
                }
                Ok(())
            }
            CancellationResult::NotRegistered => Err(registration_not_found(&request)),
            CancellationResult::EventMissing => Err(event_not_found(&request.event_id)),
        }
    }

    async fn join_waitlist(&self, request: BookingRequest) -> Result<WaitlistEntry, Error> {
        let event = self.require_event(&request.event_id).await?;
        let capacity = event.capacity();
        if !capacity.is_limited() {
            return Err(Error::conflict(ConflictKind::WaitlistNotEnabled));
        }

        let active = self
            .events
            .count_active_registrations(&request.event_id)
            .await
            .map_err(map_event_repository_error)?;
        if capacity.admits(active) {
            return Err(Error::conflict(ConflictKind::EventNotFull));
        }
        self.ensure_not_registered(&request).await?;
        let listed = self
            .waitlists
            .exists(&request.event_id, &request.user_id)
            .await
            .map_err(map_waitlist_repository_error)?;
        if listed {
            return Err(Error::conflict(ConflictKind::AlreadyOnWaitlist));
        }

        match self
            .ledger
            .add_entry(&request.event_id, &request.user_id)
            .await
            .map_err(map_ledger_error)?
        {
            EnqueueResult::Enqueued(entry) => {
                info!(
                    event_id = %request.event_id,
                    user_id = %request.user_id,
                    "joined waitlist"
                );
                Ok(entry)
            }
            EnqueueResult::Rejected(kind) => Err(Error::conflict(kind)),
            EnqueueResult::EventMissing => Err(event_not_found(&request.event_id)),
        }
    }

    async fn leave_waitlist(&self, request: BookingRequest) -> Result<(), Error> {
        self.require_event(&request.event_id).await?;
        match self
            .ledger
            .withdraw_entry(&request.event_id, &request.user_id)
            .await
            .map_err(map_ledger_error)?
        {
            WithdrawalResult::Withdrawn => {
                info!(event_id = %request.event_id, user_id = %request.user_id, "left waitlist");
                Ok(())
            }
            WithdrawalResult::NotListed => Err(Error::conflict(ConflictKind::UserNotOnWaitlist)),
            WithdrawalResult::EventMissing => Err(event_not_found(&request.event_id)),
        }
    }
}

#[async_trait]
impl<E, W, L, J> WaitlistQuery for RegistrationCoordinator<E, W, L, J>
where
    E: EventRepository,
    W: WaitlistRepository,
    L: AdmissionLedger,
    J: JobDispatcher,
{
    async fn waitlist_for_event(&self, event_id: EventId) -> Result<Vec<WaitlistEntry>, Error> {
        self.require_event(&event_id).await?;
        self.waitlists
            .list_ordered(&event_id)
            .await
            .map_err(map_waitlist_repository_error)
    }
}

fn registration_not_found(request: &BookingRequest) -> Error {
    Error::not_found(format!(
        "user {} is not registered for event {}",
        request.user_id, request.event_id
    ))
}

#[cfg(test)]
#[path = "registration_coordinator_tests.rs"]
mod tests;
