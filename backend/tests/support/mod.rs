//! Shared wiring for integration suites: the in-memory store, the domain
//! services and a running job queue.

use std::sync::Arc;

use eventbook::domain::ports::{
    BookingRequest, EventRepository, RegistrationCommand, WaitlistRepository,
};
use eventbook::domain::{
    Capacity, EmailAddress, Error, Event, EventDraft, EventId, PromotionEngine, RatingAggregator,
    RegistrationCoordinator, RegistrationOutcome, User, UserId, UserRole,
};
use eventbook::outbound::memory::InMemoryBookingStore;
use eventbook::outbound::queue::{JobRunner, JobRunnerHandle, TokioJobQueue};

pub type Coordinator = RegistrationCoordinator<
    InMemoryBookingStore,
    InMemoryBookingStore,
    InMemoryBookingStore,
    TokioJobQueue,
>;
pub type Engine = PromotionEngine<
    InMemoryBookingStore,
    InMemoryBookingStore,
    InMemoryBookingStore,
    InMemoryBookingStore,
>;
pub type Ratings = RatingAggregator<InMemoryBookingStore, InMemoryBookingStore, TokioJobQueue>;

/// Services sharing one in-memory store and one job queue.
#[derive(Clone)]
pub struct BookingHarness {
    pub store: Arc<InMemoryBookingStore>,
    pub coordinator: Arc<Coordinator>,
    pub engine: Arc<Engine>,
    pub ratings: Arc<Ratings>,
}

impl BookingHarness {
    /// Wire the services and start the job runner. Must run inside a Tokio
    /// runtime.
    pub fn start() -> (Self, JobRunnerHandle) {
        let store = Arc::new(InMemoryBookingStore::default());
        let (sender, jobs) = TokioJobQueue::channel(64);
        let queue = Arc::new(sender);
        let coordinator = Arc::new(RegistrationCoordinator::new(
            store.clone(),
            store.clone(),
            store.clone(),
            queue.clone(),
        ));
        let engine = Arc::new(PromotionEngine::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
        ));
        let ratings = Arc::new(RatingAggregator::new(store.clone(), store.clone(), queue));
        let runner = JobRunner::new(engine.clone(), ratings.clone()).spawn(jobs);
        (
            Self {
                store,
                coordinator,
                engine,
                ratings,
            },
            runner,
        )
    }

    pub fn seed_event(&self, capacity: Capacity) -> EventId {
        let id = EventId::random();
        self.store.insert_event(Event::new(EventDraft {
            id,
            owner_id: UserId::random(),
            category: "workshop".to_owned(),
            capacity,
            average_rating: 0.0,
        }));
        id
    }

    pub fn seed_user(&self, handle: &str) -> UserId {
        let id = UserId::random();
        let email = EmailAddress::new(format!("{handle}@example.test")).expect("valid email");
        self.store.insert_user(User::new(id, email, UserRole::User));
        id
    }

    pub async fn register(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<RegistrationOutcome, Error> {
        self.coordinator
            .register(BookingRequest::new(event_id, user_id))
            .await
    }

    pub async fn active_count(&self, event_id: EventId) -> u64 {
        self.store
            .count_active_registrations(&event_id)
            .await
            .expect("count registrations")
    }

    pub async fn waiting_users(&self, event_id: EventId) -> Vec<UserId> {
        self.store
            .list_ordered(&event_id)
            .await
            .expect("list waitlist")
            .into_iter()
            .map(|entry| entry.user_id)
            .collect()
    }
}
