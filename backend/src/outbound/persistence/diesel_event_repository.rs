//! PostgreSQL-backed `EventRepository`.

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{EventRepository, EventRepositoryError};
use crate::domain::{Event, EventId, UserId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::EventRow;
use super::pool::{DbPool, PoolError};
use super::schema::{events, registrations};

/// Diesel-backed implementation of the event repository port.
#[derive(Clone)]
pub struct DieselEventRepository {
    pool: DbPool,
}

impl DieselEventRepository {
    /// Create a repository backed by the given pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> EventRepositoryError {
    map_pool_error(error)
}

fn diesel_error(error: diesel::result::Error) -> EventRepositoryError {
    map_diesel_error(error)
}

#[async_trait]
impl EventRepository for DieselEventRepository {
    async fn find_by_id(&self, event_id: &EventId) -> Result<Option<Event>, EventRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = events::table
            .filter(events::id.eq(event_id.as_uuid()))
            .select(EventRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        Ok(row.map(Event::from))
    }

    async fn count_active_registrations(
        &self,
        event_id: &EventId,
    ) -> Result<u64, EventRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let count: i64 = registrations::table
            .filter(registrations::event_id.eq(event_id.as_uuid()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn registration_exists(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<bool, EventRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::select(exists(
            registrations::table
                .filter(registrations::event_id.eq(event_id.as_uuid()))
                .filter(registrations::user_id.eq(user_id.as_uuid())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(diesel_error)
    }

    async fn update_average_rating(
        &self,
        event_id: &EventId,
        average_rating: f64,
    ) -> Result<(), EventRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::update(events::table.filter(events::id.eq(event_id.as_uuid())))
            .set(events::average_rating.eq(average_rating))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }
}
