//! Waitlist promotion engine.
//!
//! Fills a freed slot with the oldest waitlisted user. The admission and the
//! removal of the entry happen in one [`AdmissionLedger::promote_entry`]
//! call; if that call finds the slot retaken, the entry gone or the user
//! already registered, the attempt stops without trying the next user.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::domain::booking_service_support::{
    event_not_found, map_event_repository_error, map_ledger_error,
    map_waitlist_repository_error,
};
use crate::domain::ports::{
    AdmissionLedger, EventRepository, PromotionStep, UserRepository, WaitlistPromotion,
    WaitlistRepository,
};
use crate::domain::{
    Error, EventId, PromotedUser, PromotionFailure, PromotionOutcome, ReconciliationReport,
    Registration, User, WaitlistEntry,
};

/// Service implementing [`WaitlistPromotion`].
#[derive(Clone)]
pub struct PromotionEngine<E, W, L, U> {
    events: Arc<E>,
    waitlists: Arc<W>,
    ledger: Arc<L>,
    users: Arc<U>,
}

impl<E, W, L, U> PromotionEngine<E, W, L, U> {
    /// Wire the engine to its ports.
    #[must_use]
    pub const fn new(events: Arc<E>, waitlists: Arc<W>, ledger: Arc<L>, users: Arc<U>) -> Self {
        Self {
            events,
            waitlists,
            ledger,
            users,
        }
    }
}

impl<E, W, L, U> PromotionEngine<E, W, L, U>
where
    E: EventRepository,
    W: WaitlistRepository,
    L: AdmissionLedger,
    U: UserRepository,
{
    fn failed(event_id: EventId, failure: PromotionFailure) -> PromotionOutcome {
        match &failure {
            PromotionFailure::Store(err) => {
                error!(%event_id, error = %err, outcome = "failed", "promotion aborted");
            }
            other => warn!(%event_id, reason = %other, outcome = "failed", "promotion aborted"),
        }
        PromotionOutcome::Failed(failure)
    }

    async fn admit(
        &self,
        entry: &WaitlistEntry,
    ) -> Result<Result<Registration, PromotionFailure>, Error> {
        let step = self
            .ledger
            .promote_entry(entry)
            .await
            .map_err(map_ledger_error)?;
        Ok(match step {
            PromotionStep::Promoted(registration) => Ok(registration),
            PromotionStep::PromotedButStillListed(registration) => {
                error!(
                    event_id = %entry.event_id,
                    user_id = %entry.user_id,
                    "critical inconsistency: promoted user still holds a waitlist entry"
                );
                Ok(registration)
            }
            PromotionStep::SlotTaken => Err(PromotionFailure::SlotTaken),
            PromotionStep::EntryWithdrawn => Err(PromotionFailure::EntryWithdrawn),
            PromotionStep::AlreadyRegistered => Err(PromotionFailure::AlreadyRegistered),
            PromotionStep::EventMissing => Err(PromotionFailure::EventMissing(entry.event_id)),
        })
    }

    /// Best-effort profile lookup for notifying the promoted user.
    async fn resolve_profile(&self, entry: &WaitlistEntry) -> Option<User> {
        match self.users.find_by_id(&entry.user_id).await {
            Ok(Some(user)) => Some(user),
            Ok(None) => {
                warn!(user_id = %entry.user_id, "promoted user has no profile");
                None
            }
            Err(err) => {
                warn!(
                    user_id = %entry.user_id,
                    error = %err,
                    "failed to load promoted user profile"
                );
                None
            }
        }
    }

    async fn reconcile_event(&self, event_id: EventId) -> Result<ReconciliationReport, Error> {
        let event = self
            .events
            .find_by_id(&event_id)
            .await
            .map_err(map_event_repository_error)?
            .ok_or_else(|| event_not_found(&event_id))?;
        let capacity = event.capacity();
        let mut report = ReconciliationReport::new(event_id);

        loop {
            let active = self
                .events
                .count_active_registrations(&event_id)
                .await
                .map_err(map_event_repository_error)?;
            if !capacity.admits(active) {
                break;
            }
            match self.promote_next(event_id).await {
                PromotionOutcome::Promoted(promoted) => report.promoted.push(promoted),
                PromotionOutcome::NoOneWaiting => break,
                PromotionOutcome::Failed(failure) => {
                    report.stopped_by = Some(failure);
                    break;
                }
            }
        }

        info!(
            %event_id,
            promoted = report.promoted.len(),
            stopped_early = report.stopped_by.is_some(),
            "waitlist reconciled"
        );
        Ok(report)
    }
}

#[async_trait]
impl<E, W, L, U> WaitlistPromotion for PromotionEngine<E, W, L, U>
where
    E: EventRepository,
    W: WaitlistRepository,
    L: AdmissionLedger,
    U: UserRepository,
{
    async fn promote_next(&self, event_id: EventId) -> PromotionOutcome {
        let entry = match self.waitlists.peek_oldest(&event_id).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                debug!(%event_id, outcome = "no_one_waiting", "waitlist empty");
                return PromotionOutcome::NoOneWaiting;
            }
            Err(err) => {
                return Self::failed(
                    event_id,
                    PromotionFailure::Store(map_waitlist_repository_error(err)),
                );
            }
        };

        let registration = match self.admit(&entry).await {
            Ok(Ok(registration)) => registration,
            Ok(Err(failure)) => return Self::failed(event_id, failure),
            Err(err) => return Self::failed(event_id, PromotionFailure::Store(err)),
        };

        let user = self.resolve_profile(&entry).await;
        info!(
            %event_id,
            user_id = %entry.user_id,
            outcome = "promoted",
            "waitlisted user promoted"
        );
        PromotionOutcome::Promoted(PromotedUser {
            entry,
            registration,
            user,
        })
    }

    async fn reconcile(&self, event_id: EventId) -> Result<ReconciliationReport, Error> {
        self.reconcile_event(event_id).await
    }

    async fn reconcile_all(&self) -> Result<Vec<ReconciliationReport>, Error> {
        let event_ids = self
            .waitlists
            .list_events_with_entries()
            .await
            .map_err(map_waitlist_repository_error)?;
        let mut reports = Vec::with_capacity(event_ids.len());
        for event_id in event_ids {
            match self.reconcile_event(event_id).await {
                Ok(report) => reports.push(report),
                Err(err) => error!(%event_id, error = %err, "reconciliation failed"),
            }
        }
        Ok(reports)
    }
}

#[cfg(test)]
#[path = "promotion_engine_tests.rs"]
mod tests;
