//! Domain primitives, ports and services of the booking engine.
//!
//! Purpose: decide, under concurrent requests, whether a registration is
//! admitted, deferred to a FIFO waitlist, or rejected, and promote waitlisted
//! users when capacity frees up. Types here are transport agnostic; adapters
//! live under `outbound`.
//!
//! Public surface:
//! - `Event`, `Capacity`, `EventId` - events and their admission limit.
//! - `Registration`, `WaitlistEntry`, `RegistrationOutcome` - booking records.
//! - `Error`, `ErrorCode`, `ConflictKind` - failures returned to callers.
//! - `RegistrationCoordinator`, `PromotionEngine`, `RatingAggregator` - the
//!   services implementing the driving ports in [`ports`].

pub mod booking;
mod booking_service_support;
pub mod error;
pub mod event;
pub mod ports;
pub mod promotion;
mod promotion_engine;
mod rating_aggregator;
mod registration_coordinator;
pub mod review;
pub mod user;

pub use self::booking::{Registration, RegistrationOutcome, WaitlistEntry, WaitlistEntryId};
pub use self::error::{ConflictKind, Error, ErrorCode, ErrorValidationError};
pub use self::event::{Capacity, Event, EventDraft, EventId};
pub use self::promotion::{
    PromotedUser, PromotionFailure, PromotionOutcome, ReconciliationReport,
};
pub use self::promotion_engine::PromotionEngine;
pub use self::rating_aggregator::RatingAggregator;
pub use self::registration_coordinator::RegistrationCoordinator;
pub use self::review::{Rating, RatingValidationError, average_rating};
pub use self::user::{EmailAddress, User, UserId, UserRole, UserValidationError};
