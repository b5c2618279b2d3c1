//! Translation of pool and Diesel failures into port errors.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ConflictKind;
use crate::domain::ports::{
    AdmissionLedgerError, EventRepositoryError, ReviewRepositoryError, UserRepositoryError,
    WaitlistRepositoryError,
};

use super::pool::PoolError;

/// Port errors that distinguish connectivity from query failures.
pub(crate) trait StoreError: Sized {
    fn connection(message: String) -> Self;
    fn query(message: String) -> Self;
}

macro_rules! impl_store_error {
    ($($error:ty),+ $(,)?) => {
        $(
            impl StoreError for $error {
                fn connection(message: String) -> Self {
                    <$error>::connection(message)
                }

                fn query(message: String) -> Self {
                    <$error>::query(message)
                }
            }
        )+
    };
}

impl_store_error!(
    AdmissionLedgerError,
    EventRepositoryError,
    ReviewRepositoryError,
    UserRepositoryError,
    WaitlistRepositoryError,
);

pub(crate) fn map_pool_error<E: StoreError>(error: PoolError) -> E {
    E::connection(error.into_message())
}

pub(crate) fn map_diesel_error<E: StoreError>(error: DieselError) -> E {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        other => debug!(error = %other, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            E::connection("database connection closed".to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
            E::query("transaction serialization failure".to_owned())
        }
        DieselError::NotFound => E::query("record not found".to_owned()),
        DieselError::QueryBuilderError(_) => E::query("database query error".to_owned()),
        _ => E::query("database error".to_owned()),
    }
}

/// Conflict implied by a unique-constraint violation, if any.
///
/// The ledger holds the event row lock, so these only fire when a row was
/// written outside the ledger.
pub(crate) fn unique_violation_conflict(error: &DieselError) -> Option<ConflictKind> {
    let DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) = error else {
        return None;
    };
    match info.table_name() {
        Some("registrations") => Some(ConflictKind::AlreadyRegistered),
        Some("waitlist_entries") => Some(ConflictKind::AlreadyOnWaitlist),
        _ => match info.constraint_name() {
            Some(name) if name.starts_with("registrations") => {
                Some(ConflictKind::AlreadyRegistered)
            }
            Some(name) if name.starts_with("waitlist_entries") => {
                Some(ConflictKind::AlreadyOnWaitlist)
            }
            _ => None,
        },
    }
}
