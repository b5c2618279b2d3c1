//! PostgreSQL-backed `AdmissionLedger`.
//!
//! Every operation runs in one transaction that starts by locking the event
//! row with `SELECT ... FOR UPDATE`. All ledger calls for the same event are
//! therefore serialised, so the capacity count read inside the transaction
//! stays valid until commit. Promotion additionally locks the entry row it
//! consumes, always after the event row. Unique constraints on
//! `(event_id, user_id)` back the duplicate checks for writers that bypass
//! the ledger.

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{
    AdmissionLedger, AdmissionLedgerError, AdmissionResult, CancellationResult, EnqueueResult,
    PromotionStep, WithdrawalResult,
};
use crate::domain::{
    Capacity, ConflictKind, EventId, Registration, UserId, WaitlistEntry, WaitlistEntryId,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error, unique_violation_conflict};
use super::models::{NewRegistrationRow, NewWaitlistEntryRow, RegistrationRow, WaitlistEntryRow};
use super::pool::{DbPool, PoolError};
use super::schema::{events, registrations, waitlist_entries};

/// Diesel-backed implementation of the admission ledger port.
#[derive(Clone)]
pub struct DieselAdmissionLedger {
    pool: DbPool,
}

impl DieselAdmissionLedger {
    /// Create a ledger backed by the given pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> AdmissionLedgerError {
    map_pool_error(error)
}

fn diesel_error(error: DieselError) -> AdmissionLedgerError {
    map_diesel_error(error)
}

/// Lock the event row and return its capacity, or `None` when it is gone.
async fn lock_event(
    conn: &mut AsyncPgConnection,
    event_id: Uuid,
) -> QueryResult<Option<Capacity>> {
    let capacity: Option<Option<i32>> = events::table
        .filter(events::id.eq(event_id))
        .select(events::capacity)
        .for_update()
        .first(conn)
        .await
        .optional()?;
    Ok(capacity.map(|raw| Capacity::from_raw(raw.map(i64::from))))
}

/// Lock one waitlist entry row. Always taken after the event lock.
async fn lock_entry(conn: &mut AsyncPgConnection, entry_id: Uuid) -> QueryResult<Option<Uuid>> {
    waitlist_entries::table
        .filter(waitlist_entries::id.eq(entry_id))
        .select(waitlist_entries::id)
        .for_update()
        .first(conn)
        .await
        .optional()
}

async fn active_count(conn: &mut AsyncPgConnection, event_id: Uuid) -> QueryResult<u64> {
    let count: i64 = registrations::table
        .filter(registrations::event_id.eq(event_id))
        .count()
        .get_result(conn)
        .await?;
    Ok(u64::try_from(count).unwrap_or_default())
}

async fn is_registered(
    conn: &mut AsyncPgConnection,
    event_id: Uuid,
    user_id: Uuid,
) -> QueryResult<bool> {
    diesel::select(exists(
        registrations::table
            .filter(registrations::event_id.eq(event_id))
            .filter(registrations::user_id.eq(user_id)),
    ))
    .get_result(conn)
    .await
}

async fn is_listed(
    conn: &mut AsyncPgConnection,
    event_id: Uuid,
    user_id: Uuid,
) -> QueryResult<bool> {
    diesel::select(exists(
        waitlist_entries::table
            .filter(waitlist_entries::event_id.eq(event_id))
            .filter(waitlist_entries::user_id.eq(user_id)),
    ))
    .get_result(conn)
    .await
}

async fn insert_registration_row(
    conn: &mut AsyncPgConnection,
    event_id: Uuid,
    user_id: Uuid,
) -> QueryResult<Registration> {
    diesel::insert_into(registrations::table)
        .values(&NewRegistrationRow { event_id, user_id })
        .returning(RegistrationRow::as_returning())
        .get_result(conn)
        .await
        .map(Registration::from)
}

/// Write a registration and drop the user's own waitlist entry, if any.
async fn admit(
    conn: &mut AsyncPgConnection,
    event_id: Uuid,
    user_id: Uuid,
) -> QueryResult<Registration> {
    diesel::delete(
        waitlist_entries::table
            .filter(waitlist_entries::event_id.eq(event_id))
            .filter(waitlist_entries::user_id.eq(user_id)),
    )
    .execute(conn)
    .await?;
    insert_registration_row(conn, event_id, user_id).await
}

async fn enqueue(
    conn: &mut AsyncPgConnection,
    event_id: Uuid,
    user_id: Uuid,
) -> QueryResult<WaitlistEntry> {
    let row = NewWaitlistEntryRow {
        id: *WaitlistEntryId::random().as_uuid(),
        event_id,
        user_id,
    };
    diesel::insert_into(waitlist_entries::table)
        .values(&row)
        .returning(WaitlistEntryRow::as_returning())
        .get_result(conn)
        .await
        .map(WaitlistEntry::from)
}

/// Turn a late unique violation into the matching rejection.
fn admission_or_conflict(
    result: Result<AdmissionResult, DieselError>,
) -> Result<AdmissionResult, AdmissionLedgerError> {
    match result {
        Err(err) => match unique_violation_conflict(&err) {
            Some(kind) => Ok(AdmissionResult::Rejected(kind)),
            None => Err(diesel_error(err)),
        },
        other => other.map_err(diesel_error),
    }
}

#[async_trait]
impl AdmissionLedger for DieselAdmissionLedger {
    async fn insert_registration(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<AdmissionResult, AdmissionLedgerError> {
        let (event_id, user_id) = (*event_id.as_uuid(), *user_id.as_uuid());
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let result = conn
            .transaction(|conn| {
                async move {
                    let Some(capacity) = lock_event(conn, event_id).await? else {
                        return Ok(AdmissionResult::EventMissing);
                    };
                    if is_registered(conn, event_id, user_id).await? {
                        return Ok(AdmissionResult::Rejected(ConflictKind::AlreadyRegistered));
                    }
                    if !capacity.admits(active_count(conn, event_id).await?) {
                        return Ok(AdmissionResult::Full);
                    }
                    admit(conn, event_id, user_id)
                        .await
                        .map(AdmissionResult::Admitted)
                }
                .scope_boxed()
            })
            .await;
        admission_or_conflict(result)
    }

    async fn admit_or_enqueue(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<AdmissionResult, AdmissionLedgerError> {
        let (event_id, user_id) = (*event_id.as_uuid(), *user_id.as_uuid());
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let result = conn
            .transaction(|conn| {
                async move {
                    let Some(capacity) = lock_event(conn, event_id).await? else {
                        return Ok(AdmissionResult::EventMissing);
                    };
                    if is_registered(conn, event_id, user_id).await? {
                        return Ok(AdmissionResult::Rejected(ConflictKind::AlreadyRegistered));
                    }
                    if capacity.admits(active_count(conn, event_id).await?) {
                        return admit(conn, event_id, user_id)
                            .await
                            .map(AdmissionResult::Admitted);
                    }
                    if is_listed(conn, event_id, user_id).await? {
                        return Ok(AdmissionResult::Rejected(ConflictKind::AlreadyOnWaitlist));
                    }
                    enqueue(conn, event_id, user_id)
                        .await
                        .map(AdmissionResult::Waitlisted)
                }
                .scope_boxed()
            })
            .await;
        admission_or_conflict(result)
    }

    async fn add_entry(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<EnqueueResult, AdmissionLedgerError> {
        let (event_id, user_id) = (*event_id.as_uuid(), *user_id.as_uuid());
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let result = conn
            .transaction(|conn| {
                async move {
                    let Some(capacity) = lock_event(conn, event_id).await? else {
                        return Ok(EnqueueResult::EventMissing);
                    };
                    if !capacity.is_limited() {
                        return Ok(EnqueueResult::Rejected(ConflictKind::WaitlistNotEnabled));
                    }
                    if capacity.admits(active_count(conn, event_id).await?) {
                        return Ok(EnqueueResult::Rejected(ConflictKind::EventNotFull));
                    }
                    if is_registered(conn, event_id, user_id).await? {
                        return Ok(EnqueueResult::Rejected(ConflictKind::AlreadyRegistered));
                    }
                    if is_listed(conn, event_id, user_id).await? {
                        return Ok(EnqueueResult::Rejected(ConflictKind::AlreadyOnWaitlist));
                    }
                    enqueue(conn, event_id, user_id)
                        .await
                        .map(EnqueueResult::Enqueued)
                }
                .scope_boxed()
            })
            .await;
        match result {
            Err(err) => match unique_violation_conflict(&err) {
                Some(kind) => Ok(EnqueueResult::Rejected(kind)),
                None => Err(diesel_error(err)),
            },
            other => other.map_err(diesel_error),
        }
    }

    async fn cancel(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<CancellationResult, AdmissionLedgerError> {
        let (event_id, user_id) = (*event_id.as_uuid(), *user_id.as_uuid());
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        conn.transaction(|conn| {
            async move {
                let Some(capacity) = lock_event(conn, event_id).await? else {
                    return Ok(CancellationResult::EventMissing);
                };
                let was_full = capacity.is_full(active_count(conn, event_id).await?);
                let removed = diesel::delete(
                    registrations::table
                        .filter(registrations::event_id.eq(event_id))
                        .filter(registrations::user_id.eq(user_id)),
                )
                .execute(conn)
                .await?;
                if removed == 0 {
                    return Ok(CancellationResult::NotRegistered);
                }
                Ok(CancellationResult::Cancelled { was_full })
            }
            .scope_boxed()
        })
        .await
        .map_err(diesel_error)
    }

    async fn withdraw_entry(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<WithdrawalResult, AdmissionLedgerError> {
        let (event_id, user_id) = (*event_id.as_uuid(), *user_id.as_uuid());
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        conn.transaction(|conn| {
            async move {
                if lock_event(conn, event_id).await?.is_none() {
                    return Ok(WithdrawalResult::EventMissing);
                }
                let removed = diesel::delete(
                    waitlist_entries::table
                        .filter(waitlist_entries::event_id.eq(event_id))
                        .filter(waitlist_entries::user_id.eq(user_id)),
                )
                .execute(conn)
                .await?;
                if removed == 0 {
                    return Ok(WithdrawalResult::NotListed);
                }
                Ok(WithdrawalResult::Withdrawn)
            }
            .scope_boxed()
        })
        .await
        .map_err(diesel_error)
    }

    async fn promote_entry(
        &self,
        entry: &WaitlistEntry,
    ) -> Result<PromotionStep, AdmissionLedgerError> {
        let entry_id = *entry.id.as_uuid();
        let (event_id, user_id) = (*entry.event_id.as_uuid(), *entry.user_id.as_uuid());
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        conn.transaction(|conn| {
            async move {
                let Some(capacity) = lock_event(conn, event_id).await? else {
                    return Ok(PromotionStep::EventMissing);
                };
                if lock_entry(conn, entry_id).await?.is_none() {
                    return Ok(PromotionStep::EntryWithdrawn);
                }
                if is_registered(conn, event_id, user_id).await? {
                    return Ok(PromotionStep::AlreadyRegistered);
                }
                if !capacity.admits(active_count(conn, event_id).await?) {
                    return Ok(PromotionStep::SlotTaken);
                }
                let registration = insert_registration_row(conn, event_id, user_id).await?;
                let removed = diesel::delete(
                    waitlist_entries::table.filter(waitlist_entries::id.eq(entry_id)),
                )
                .execute(conn)
                .await?;
                debug!(%event_id, %user_id, removed, "waitlist entry promoted");
                if removed == 0 {
                    return Ok(PromotionStep::PromotedButStillListed(registration));
                }
                Ok(PromotionStep::Promoted(registration))
            }
            .scope_boxed()
        })
        .await
        .map_err(diesel_error)
    }
}
