//! PostgreSQL-backed `WaitlistRepository`.
//!
//! Entries are ordered by `created_at`, then by the `position` sequence.

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{WaitlistRepository, WaitlistRepositoryError};
use crate::domain::{EventId, UserId, WaitlistEntry};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::WaitlistEntryRow;
use super::pool::{DbPool, PoolError};
use super::schema::waitlist_entries;

/// Diesel-backed implementation of the waitlist repository port.
#[derive(Clone)]
pub struct DieselWaitlistRepository {
    pool: DbPool,
}

impl DieselWaitlistRepository {
    /// Create a repository backed by the given pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> WaitlistRepositoryError {
    map_pool_error(error)
}

fn diesel_error(error: diesel::result::Error) -> WaitlistRepositoryError {
    map_diesel_error(error)
}

#[async_trait]
impl WaitlistRepository for DieselWaitlistRepository {
    async fn list_ordered(
        &self,
        event_id: &EventId,
    ) -> Result<Vec<WaitlistEntry>, WaitlistRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<WaitlistEntryRow> = waitlist_entries::table
            .filter(waitlist_entries::event_id.eq(event_id.as_uuid()))
            .order_by((
                waitlist_entries::created_at.asc(),
                waitlist_entries::position.asc(),
            ))
            .select(WaitlistEntryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(rows.into_iter().map(WaitlistEntry::from).collect())
    }

    async fn peek_oldest(
        &self,
        event_id: &EventId,
    ) -> Result<Option<WaitlistEntry>, WaitlistRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = waitlist_entries::table
            .filter(waitlist_entries::event_id.eq(event_id.as_uuid()))
            .order_by((
                waitlist_entries::created_at.asc(),
                waitlist_entries::position.asc(),
            ))
            .select(WaitlistEntryRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        Ok(row.map(WaitlistEntry::from))
    }

    async fn exists(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<bool, WaitlistRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::select(exists(
            waitlist_entries::table
                .filter(waitlist_entries::event_id.eq(event_id.as_uuid()))
                .filter(waitlist_entries::user_id.eq(user_id.as_uuid())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(diesel_error)
    }

    async fn list_events_with_entries(&self) -> Result<Vec<EventId>, WaitlistRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let ids: Vec<Uuid> = waitlist_entries::table
            .select(waitlist_entries::event_id)
            .distinct()
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(ids.into_iter().map(EventId::from_uuid).collect())
    }
}
