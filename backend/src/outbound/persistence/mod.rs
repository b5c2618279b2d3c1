//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repositories are thin translators between Diesel rows and domain types.
//! Row structs (`models.rs`) and table definitions (`schema.rs`) stay
//! private to this module. Connections come from a `bb8` pool over
//! `diesel-async`, so no query blocks the runtime.
//!
//! # Example
//!
//! ```rust,no_run
//! use eventbook::outbound::persistence::{DbPool, DieselAdmissionLedger, PoolConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/eventbook")).await?;
//! let ledger = DieselAdmissionLedger::new(pool);
//! # Ok(())
//! # }
//! ```

mod diesel_admission_ledger;
mod diesel_error_mapping;
mod diesel_event_repository;
mod diesel_user_repository;
mod diesel_waitlist_repository;
mod models;
mod pool;
mod schema;

pub use diesel_admission_ledger::DieselAdmissionLedger;
pub use diesel_event_repository::DieselEventRepository;
pub use diesel_user_repository::{DieselReviewRepository, DieselUserRepository};
pub use diesel_waitlist_repository::DieselWaitlistRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
