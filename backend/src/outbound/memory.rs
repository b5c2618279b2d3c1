//! In-process booking store.
//!
//! Implements every driven port over one mutex-guarded state, which makes
//! each ledger operation trivially atomic. Used when no database URL is
//! configured and as the store behind the integration tests.
//!
//! Waitlist entries carry a monotonically increasing position so entries
//! created within the same clock tick keep their insertion order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};

use crate::domain::ports::{
    AdmissionLedger, AdmissionLedgerError, AdmissionResult, CancellationResult, EnqueueResult,
    EventRepository, EventRepositoryError, PromotionStep, ReviewRepository, ReviewRepositoryError,
    UserRepository, UserRepositoryError, WaitlistRepository, WaitlistRepositoryError,
    WithdrawalResult,
};
use crate::domain::{
    Capacity, ConflictKind, Event, EventId, Rating, Registration, User, UserId, WaitlistEntry,
    WaitlistEntryId,
};

#[derive(Debug, Clone)]
struct QueuedEntry {
    position: u64,
    entry: WaitlistEntry,
}

#[derive(Debug, Default)]
struct BookingState {
    events: HashMap<EventId, Event>,
    users: HashMap<UserId, User>,
    registrations: HashMap<(EventId, UserId), Registration>,
    waitlist: Vec<QueuedEntry>,
    reviews: HashMap<EventId, Vec<Rating>>,
    next_position: u64,
}

impl BookingState {
    fn capacity(&self, event_id: &EventId) -> Option<Capacity> {
        self.events.get(event_id).map(Event::capacity)
    }

    fn active_count(&self, event_id: &EventId) -> u64 {
        let count = self
            .registrations
            .keys()
            .filter(|(event, _)| event == event_id)
            .count();
        u64::try_from(count).unwrap_or(u64::MAX)
    }

    fn is_registered(&self, event_id: &EventId, user_id: &UserId) -> bool {
        self.registrations.contains_key(&(*event_id, *user_id))
    }

    fn is_listed(&self, event_id: &EventId, user_id: &UserId) -> bool {
        self.waitlist
            .iter()
            .any(|queued| queued.entry.event_id == *event_id && queued.entry.user_id == *user_id)
    }

    fn remove_listing(&mut self, event_id: &EventId, user_id: &UserId) -> u64 {
        let before = self.waitlist.len();
        self.waitlist.retain(|queued| {
            !(queued.entry.event_id == *event_id && queued.entry.user_id == *user_id)
        });
        u64::try_from(before - self.waitlist.len()).unwrap_or_default()
    }

    fn ordered(&self, event_id: &EventId) -> Vec<&QueuedEntry> {
        let mut entries: Vec<_> = self
            .waitlist
            .iter()
            .filter(|queued| queued.entry.event_id == *event_id)
            .collect();
        entries.sort_by_key(|queued| (queued.entry.created_at, queued.position));
        entries
    }

    fn admit(&mut self, clock: &dyn Clock, event_id: EventId, user_id: UserId) -> Registration {
        self.remove_listing(&event_id, &user_id);
        let registration = Registration {
            event_id,
            user_id,
            created_at: clock.utc(),
        };
        self.registrations
            .insert((event_id, user_id), registration.clone());
        registration
    }

    fn enqueue(&mut self, clock: &dyn Clock, event_id: EventId, user_id: UserId) -> WaitlistEntry {
        let entry = WaitlistEntry {
            id: WaitlistEntryId::random(),
            event_id,
            user_id,
            created_at: clock.utc(),
        };
        self.next_position += 1;
        self.waitlist.push(QueuedEntry {
            position: self.next_position,
            entry: entry.clone(),
        });
        entry
    }
}

/// Mutex-guarded store implementing all booking ports.
pub struct InMemoryBookingStore {
    state: Mutex<BookingState>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryBookingStore {
    fn default() -> Self {
        Self::new(Arc::new(DefaultClock))
    }
}

impl InMemoryBookingStore {
    /// Empty store stamping records with `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(BookingState::default()),
            clock,
        }
    }

    // Every mutation completes before the guard drops, so a poisoned lock
    // still holds consistent state.
    fn state(&self) -> MutexGuard<'_, BookingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace an event.
    pub fn insert_event(&self, event: Event) {
        self.state().events.insert(event.id(), event);
    }

    /// Edit an event's capacity. Existing registrations are kept even when
    /// the new limit is below the active count. Returns `false` for an
    /// unknown event.
    #[must_use]
    pub fn set_capacity(&self, event_id: &EventId, capacity: Capacity) -> bool {
        self.state()
            .events
            .get_mut(event_id)
            .map(|event| *event = event.clone().with_capacity(capacity))
            .is_some()
    }

    /// Delete an event with its registrations, waitlist and reviews.
    pub fn remove_event(&self, event_id: &EventId) {
        let mut state = self.state();
        state.events.remove(event_id);
        state.registrations.retain(|(event, _), _| event != event_id);
        state.waitlist.retain(|queued| queued.entry.event_id != *event_id);
        state.reviews.remove(event_id);
    }

    /// Insert or replace a user profile.
    pub fn insert_user(&self, user: User) {
        self.state().users.insert(user.id(), user);
    }

    /// Record a review rating for an event.
    pub fn insert_review(&self, event_id: EventId, rating: Rating) {
        self.state().reviews.entry(event_id).or_default().push(rating);
    }

    /// Waitlist a user without any capacity check, as a writer outside the
    /// ledger would.
    #[must_use]
    pub fn force_waitlist_entry(&self, event_id: EventId, user_id: UserId) -> WaitlistEntry {
        self.state().enqueue(self.clock.as_ref(), event_id, user_id)
    }
}

#[async_trait]
impl EventRepository for InMemoryBookingStore {
    async fn find_by_id(&self, event_id: &EventId) -> Result<Option<Event>, EventRepositoryError> {
        Ok(self.state().events.get(event_id).cloned())
    }

    async fn count_active_registrations(
        &self,
        event_id: &EventId,
    ) -> Result<u64, EventRepositoryError> {
        Ok(self.state().active_count(event_id))
    }

    async fn registration_exists(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<bool, EventRepositoryError> {
        Ok(self.state().is_registered(event_id, user_id))
    }

    async fn update_average_rating(
        &self,
        event_id: &EventId,
        average_rating: f64,
    ) -> Result<(), EventRepositoryError> {
        if let Some(event) = self.state().events.get_mut(event_id) {
            *event = event.clone().with_average_rating(average_rating);
        }
        Ok(())
    }
}

#[async_trait]
impl WaitlistRepository for InMemoryBookingStore {
    async fn list_ordered(
        &self,
        event_id: &EventId,
    ) -> Result<Vec<WaitlistEntry>, WaitlistRepositoryError> {
        let state = self.state();
        Ok(state
            .ordered(event_id)
            .into_iter()
            .map(|queued| queued.entry.clone())
            .collect())
    }

    async fn peek_oldest(
        &self,
        event_id: &EventId,
    ) -> Result<Option<WaitlistEntry>, WaitlistRepositoryError> {
        let state = self.state();
        Ok(state
            .ordered(event_id)
            .first()
            .map(|queued| queued.entry.clone()))
    }

    async fn exists(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<bool, WaitlistRepositoryError> {
        Ok(self.state().is_listed(event_id, user_id))
    }

    async fn list_events_with_entries(&self) -> Result<Vec<EventId>, WaitlistRepositoryError> {
        let mut ids: Vec<EventId> = self
            .state()
            .waitlist
            .iter()
            .map(|queued| queued.entry.event_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }
}

#[async_trait]
impl UserRepository for InMemoryBookingStore {
    async fn find_by_id(&self, user_id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        Ok(self.state().users.get(user_id).cloned())
    }
}

#[async_trait]
impl ReviewRepository for InMemoryBookingStore {
    async fn list_ratings(&self, event_id: &EventId) -> Result<Vec<Rating>, ReviewRepositoryError> {
        Ok(self
            .state()
            .reviews
            .get(event_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl AdmissionLedger for InMemoryBookingStore {
    async fn insert_registration(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<AdmissionResult, AdmissionLedgerError> {
        let mut state = self.state();
        let Some(capacity) = state.capacity(event_id) else {
            return Ok(AdmissionResult::EventMissing);
        };
        if state.is_registered(event_id, user_id) {
            return Ok(AdmissionResult::Rejected(ConflictKind::AlreadyRegistered));
        }
        if !capacity.admits(state.active_count(event_id)) {
            return Ok(AdmissionResult::Full);
        }
        let registration = state.admit(self.clock.as_ref(), *event_id, *user_id);
        Ok(AdmissionResult::Admitted(registration))
    }

    async fn admit_or_enqueue(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<AdmissionResult, AdmissionLedgerError> {
        let mut state = self.state();
        let Some(capacity) = state.capacity(event_id) else {
            return Ok(AdmissionResult::EventMissing);
        };
        if state.is_registered(event_id, user_id) {
            return Ok(AdmissionResult::Rejected(ConflictKind::AlreadyRegistered));
        }
        if capacity.admits(state.active_count(event_id)) {
            let registration = state.admit(self.clock.as_ref(), *event_id, *user_id);
            return Ok(AdmissionResult::Admitted(registration));
        }
        if state.is_listed(event_id, user_id) {
            return Ok(AdmissionResult::Rejected(ConflictKind::AlreadyOnWaitlist));
        }
        let entry = state.enqueue(self.clock.as_ref(), *event_id, *user_id);
        Ok(AdmissionResult::Waitlisted(entry))
    }

    async fn add_entry(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<EnqueueResult, AdmissionLedgerError> {
        let mut state = self.state();
        let Some(capacity) = state.capacity(event_id) else {
            return Ok(EnqueueResult::EventMissing);
        };
        let rejection = if !capacity.is_limited() {
            Some(ConflictKind::WaitlistNotEnabled)
        } else if capacity.admits(state.active_count(event_id)) {
            Some(ConflictKind::EventNotFull)
        } else if state.is_registered(event_id, user_id) {
            Some(ConflictKind::AlreadyRegistered)
        } else if state.is_listed(event_id, user_id) {
            Some(ConflictKind::AlreadyOnWaitlist)
        } else {
            None
        };
        if let Some(kind) = rejection {
            return Ok(EnqueueResult::Rejected(kind));
        }
        let entry = state.enqueue(self.clock.as_ref(), *event_id, *user_id);
        Ok(EnqueueResult::Enqueued(entry))
    }

    async fn cancel(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<CancellationResult, AdmissionLedgerError> {
        let mut state = self.state();
        let Some(capacity) = state.capacity(event_id) else {
            return Ok(CancellationResult::EventMissing);
        };
        let was_full = capacity.is_full(state.active_count(event_id));
        if state.registrations.remove(&(*event_id, *user_id)).is_none() {
            return Ok(CancellationResult::NotRegistered);
        }
        Ok(CancellationResult::Cancelled { was_full })
    }

    async fn withdraw_entry(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<WithdrawalResult, AdmissionLedgerError> {
        let mut state = self.state();
        if state.capacity(event_id).is_none() {
            return Ok(WithdrawalResult::EventMissing);
        }
        if state.remove_listing(event_id, user_id) == 0 {
            return Ok(WithdrawalResult::NotListed);
        }
        Ok(WithdrawalResult::Withdrawn)
    }

    async fn promote_entry(
        &self,
        entry: &WaitlistEntry,
    ) -> Result<PromotionStep, AdmissionLedgerError> {
        let mut state = self.state();
        let Some(capacity) = state.capacity(&entry.event_id) else {
            return Ok(PromotionStep::EventMissing);
        };
        if !state.waitlist.iter().any(|queued| queued.entry.id == entry.id) {
            return Ok(PromotionStep::EntryWithdrawn);
        }
        if state.is_registered(&entry.event_id, &entry.user_id) {
            return Ok(PromotionStep::AlreadyRegistered);
        }
        if !capacity.admits(state.active_count(&entry.event_id)) {
            return Ok(PromotionStep::SlotTaken);
        }
        let registration = state.admit(self.clock.as_ref(), entry.event_id, entry.user_id);
        Ok(PromotionStep::Promoted(registration))
    }
}
