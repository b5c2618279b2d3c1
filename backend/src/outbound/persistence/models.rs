//! Internal Diesel row structs. Never exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    Capacity, EmailAddress, Event, EventDraft, EventId, Registration, User, UserId, UserRole,
    WaitlistEntry, WaitlistEntryId,
};

use super::schema::{events, registrations, users, waitlist_entries};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct EventRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub category: String,
    pub capacity: Option<i32>,
    pub average_rating: f64,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self::new(EventDraft {
            id: EventId::from_uuid(row.id),
            owner_id: UserId::from_uuid(row.owner_id),
            category: row.category,
            capacity: Capacity::from_raw(row.capacity.map(i64::from)),
            average_rating: row.average_rating,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

impl TryFrom<UserRow> for User {
    type Error = String;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = EmailAddress::new(row.email).map_err(|err| err.to_string())?;
        let role = row.role.parse::<UserRole>().map_err(|err| err.to_string())?;
        Ok(Self::new(UserId::from_uuid(row.id), email, role))
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = registrations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RegistrationRow {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<RegistrationRow> for Registration {
    fn from(row: RegistrationRow) -> Self {
        Self {
            event_id: EventId::from_uuid(row.event_id),
            user_id: UserId::from_uuid(row.user_id),
            created_at: row.created_at,
        }
    }
}

/// Insertable registration; `created_at` comes from the column default.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = registrations)]
pub(crate) struct NewRegistrationRow {
    pub event_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = waitlist_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct WaitlistEntryRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<WaitlistEntryRow> for WaitlistEntry {
    fn from(row: WaitlistEntryRow) -> Self {
        Self {
            id: WaitlistEntryId::from_uuid(row.id),
            event_id: EventId::from_uuid(row.event_id),
            user_id: UserId::from_uuid(row.user_id),
            created_at: row.created_at,
        }
    }
}

/// Insertable waitlist entry; `position` and `created_at` come from column
/// defaults.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = waitlist_entries)]
pub(crate) struct NewWaitlistEntryRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
}
