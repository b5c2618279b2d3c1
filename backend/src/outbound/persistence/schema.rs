//! Diesel table definitions.
//!
//! These must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Bookable events. `capacity` is `NULL` or non-positive for unlimited
    /// events.
    events (id) {
        id -> Uuid,
        owner_id -> Uuid,
        category -> Varchar,
        capacity -> Nullable<Int4>,
        average_rating -> Float8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    users (id) {
        id -> Uuid,
        email -> Varchar,
        role -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per admitted user. The primary key enforces a single
    /// registration per `(event_id, user_id)`.
    registrations (event_id, user_id) {
        event_id -> Uuid,
        user_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// FIFO waitlist. `position` is a sequence used to break ties between
    /// entries created in the same instant.
    waitlist_entries (id) {
        id -> Uuid,
        event_id -> Uuid,
        user_id -> Uuid,
        position -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    reviews (id) {
        id -> Uuid,
        event_id -> Uuid,
        user_id -> Uuid,
        rating -> Int2,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(registrations -> events (event_id));
diesel::joinable!(waitlist_entries -> events (event_id));
diesel::joinable!(reviews -> events (event_id));

diesel::allow_tables_to_appear_in_same_query!(
    events,
    registrations,
    reviews,
    users,
    waitlist_entries,
);
