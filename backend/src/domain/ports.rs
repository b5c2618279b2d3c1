//! Domain ports defining the edges of the hexagon.
//!
//! Ports describe how the domain expects to interact with driven adapters
//! (databases, job queues) and how inbound adapters drive the domain. Each
//! driven trait exposes strongly typed errors so adapters map their failures
//! into predictable variants instead of returning `anyhow::Result`.
//!
//! Every capacity-sensitive mutation lives on [`AdmissionLedger`], whose
//! operations are atomic with respect to one event. The plain repositories
//! only offer reads and mutations that cannot break the capacity invariant.

mod admission_ledger;
mod booking_command;
mod event_repository;
mod job_dispatcher;
mod review_repository;
mod user_repository;
mod waitlist_repository;

#[cfg(test)]
pub use admission_ledger::MockAdmissionLedger;
pub use admission_ledger::{
    AdmissionLedger, AdmissionLedgerError, AdmissionResult, CancellationResult, EnqueueResult,
    PromotionStep, WithdrawalResult,
};
#[cfg(test)]
pub use booking_command::{
    MockRatingRecompute, MockRegistrationCommand, MockWaitlistPromotion, MockWaitlistQuery,
};
pub use booking_command::{
    BookingRequest, RatingRecompute, RegistrationCommand, WaitlistPromotion, WaitlistQuery,
};
#[cfg(test)]
pub use event_repository::MockEventRepository;
pub use event_repository::{EventRepository, EventRepositoryError};
#[cfg(test)]
pub use job_dispatcher::MockJobDispatcher;
pub use job_dispatcher::{BackgroundJob, JobDispatchError, JobDispatcher};
#[cfg(test)]
pub use review_repository::MockReviewRepository;
pub use review_repository::{ReviewRepository, ReviewRepositoryError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
#[cfg(test)]
pub use waitlist_repository::MockWaitlistRepository;
pub use waitlist_repository::{WaitlistRepository, WaitlistRepositoryError};
