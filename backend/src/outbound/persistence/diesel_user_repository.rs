//! PostgreSQL-backed `UserRepository` and `ReviewRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{
    ReviewRepository, ReviewRepositoryError, UserRepository, UserRepositoryError,
};
use crate::domain::{EventId, Rating, User, UserId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::UserRow;
use super::pool::{DbPool, PoolError};
use super::schema::{reviews, users};

/// Diesel-backed implementation of the user repository port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a repository backed by the given pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn user_pool_error(error: PoolError) -> UserRepositoryError {
    map_pool_error(error)
}

fn user_diesel_error(error: diesel::result::Error) -> UserRepositoryError {
    map_diesel_error(error)
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_by_id(&self, user_id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(user_pool_error)?;
        let row = users::table
            .filter(users::id.eq(user_id.as_uuid()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(user_diesel_error)?;
        row.map(User::try_from)
            .transpose()
            .map_err(|message| UserRepositoryError::query(format!("invalid user row: {message}")))
    }
}

/// Reads review ratings. Writing reviews is owned by the review service.
#[derive(Clone)]
pub struct DieselReviewRepository {
    pool: DbPool,
}

impl DieselReviewRepository {
    /// Create a repository backed by the given pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn review_pool_error(error: PoolError) -> ReviewRepositoryError {
    map_pool_error(error)
}

fn review_diesel_error(error: diesel::result::Error) -> ReviewRepositoryError {
    map_diesel_error(error)
}

#[async_trait]
impl ReviewRepository for DieselReviewRepository {
    async fn list_ratings(&self, event_id: &EventId) -> Result<Vec<Rating>, ReviewRepositoryError> {
        let mut conn = self.pool.get().await.map_err(review_pool_error)?;
        let raw: Vec<i16> = reviews::table
            .filter(reviews::event_id.eq(event_id.as_uuid()))
            .select(reviews::rating)
            .load(&mut conn)
            .await
            .map_err(review_diesel_error)?;
        raw.into_iter()
            .map(|value| Rating::new(i64::from(value)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| ReviewRepositoryError::query(format!("invalid review rating: {err}")))
    }
}
