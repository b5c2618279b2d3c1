//! Admission-controlled event registration with waitlist promotion.
//!
//! The `domain` module holds the booking rules and the ports they depend
//! on. `outbound` provides PostgreSQL, in-memory and job-queue adapters for
//! those ports, and `config` loads runtime settings.

pub mod config;
pub mod domain;
pub mod outbound;
