//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed ports using Diesel ORM
//! - **memory**: a process-local store implementing every driven port
//! - **queue**: a bounded Tokio job queue and its runner
//!
//! Adapters translate between domain types and infrastructure
//! representations. Capacity decisions live in the admission ledger
//! implementations, which must keep each operation atomic per event.

pub mod memory;
pub mod persistence;
pub mod queue;
