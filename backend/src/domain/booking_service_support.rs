//! Internal helpers shared by the booking services.

use crate::domain::ports::{
    AdmissionLedgerError, EventRepositoryError, ReviewRepositoryError, WaitlistRepositoryError,
};
use crate::domain::{Error, EventId};

pub(crate) fn map_event_repository_error(error: EventRepositoryError) -> Error {
    match error {
        EventRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("event repository unavailable: {message}"))
        }
        EventRepositoryError::Query { message } => {
            Error::internal(format!("event repository error: {message}"))
        }
    }
}

pub(crate) fn map_waitlist_repository_error(error: WaitlistRepositoryError) -> Error {
    match error {
        WaitlistRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("waitlist repository unavailable: {message}"))
        }
        WaitlistRepositoryError::Query { message } => {
            Error::internal(format!("waitlist repository error: {message}"))
        }
    }
}

pub(crate) fn map_ledger_error(error: AdmissionLedgerError) -> Error {
    match error {
        AdmissionLedgerError::Connection { message } => {
            Error::service_unavailable(format!("admission ledger unavailable: {message}"))
        }
        AdmissionLedgerError::Query { message } => {
            Error::internal(format!("admission ledger error: {message}"))
        }
    }
}

pub(crate) fn map_review_repository_error(error: ReviewRepositoryError) -> Error {
    match error {
        ReviewRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("review repository unavailable: {message}"))
        }
        ReviewRepositoryError::Query { message } => {
            Error::internal(format!("review repository error: {message}"))
        }
    }
}

pub(crate) fn event_not_found(event_id: &EventId) -> Error {
    Error::not_found(format!("event {event_id} not found"))
}
