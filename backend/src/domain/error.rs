//! Domain-level error types.
//!
//! These errors are transport agnostic. Inbound adapters map them to HTTP
//! responses or any other protocol-specific envelope. Branching on an error
//! always goes through [`ErrorCode`] and [`ConflictKind`], never the message.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The event, registration, or user does not exist.
    NotFound,
    /// The request clashes with current booking state; see [`ConflictKind`].
    Conflict,
    /// A store could not be reached.
    ServiceUnavailable,
    /// An unexpected store or domain failure.
    InternalError,
}

/// Reason a booking request conflicts with the current state of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// The user already holds a registration for the event.
    AlreadyRegistered,
    /// The user already holds a waitlist entry for the event.
    AlreadyOnWaitlist,
    /// The event still has free capacity, so waitlisting is refused.
    EventNotFull,
    /// The event has unlimited capacity and therefore no waitlist.
    WaitlistNotEnabled,
    /// The user has no waitlist entry to remove.
    UserNotOnWaitlist,
}

impl ConflictKind {
    /// Default human-readable description of the conflict.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::AlreadyRegistered => "user is already registered for this event",
            Self::AlreadyOnWaitlist => "user is already on the waitlist for this event",
            Self::EventNotFull => "event is not full, cannot join waitlist",
            Self::WaitlistNotEnabled => {
                "waitlist not enabled for this event (capacity is 0 or not set)"
            }
            Self::UserNotOnWaitlist => "user is not on the waitlist for this event",
        }
    }
}

/// Domain error payload.
///
/// ## Invariants
/// - `message` must be non-empty once trimmed of whitespace.
/// - `conflict` is present exactly when `code` is [`ErrorCode::Conflict`].
///
/// # Examples
/// ```
/// use eventbook::domain::{ConflictKind, Error, ErrorCode};
///
/// let err = Error::conflict(ConflictKind::AlreadyRegistered);
/// assert_eq!(err.code(), ErrorCode::Conflict);
/// assert_eq!(err.conflict_kind(), Some(ConflictKind::AlreadyRegistered));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(try_from = "ErrorDto", into = "ErrorDto")]
pub struct Error {
    code: ErrorCode,
    conflict: Option<ConflictKind>,
    message: String,
    details: Option<Value>,
}

/// Validation errors emitted by the constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorValidationError {
    /// The message was blank.
    #[error("error message must not be empty")]
    EmptyMessage,
    /// A conflict kind was attached to a non-conflict code, or missing from a
    /// conflict code.
    #[error("conflict kind must be present exactly for conflict errors")]
    MismatchedConflictKind,
}

impl Error {
    /// Fallible constructor that validates the message content.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorValidationError::EmptyMessage`] for a blank message and
    /// [`ErrorValidationError::MismatchedConflictKind`] for
    /// [`ErrorCode::Conflict`], which must go through [`Error::conflict`].
    pub fn try_new(
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Result<Self, ErrorValidationError> {
        let text: String = message.into();
        if text.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        if code == ErrorCode::Conflict {
            return Err(ErrorValidationError::MismatchedConflictKind);
        }
        Ok(Self {
            code,
            conflict: None,
            message: text,
            details: None,
        })
    }

    fn from_parts(code: ErrorCode, message: impl Into<String>) -> Self {
        let text: String = message.into();
        let message = if text.trim().is_empty() {
            format!("{code:?}")
        } else {
            text
        };
        Self {
            code,
            conflict: None,
            message,
            details: None,
        }
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Conflict reason when [`Self::code`] is [`ErrorCode::Conflict`].
    #[must_use]
    pub const fn conflict_kind(&self) -> Option<ConflictKind> {
        self.conflict
    }

    /// Human-readable message returned to adapters.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Supplementary error details for adapters.
    #[must_use]
    pub const fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Whether the failure originates in the store layer rather than in the
    /// request itself.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::ServiceUnavailable | ErrorCode::InternalError
        )
    }

    /// Attach structured details to the error.
    ///
    /// # Examples
    /// ```
    /// use eventbook::domain::Error;
    /// use serde_json::json;
    ///
    /// let err = Error::not_found("event missing")
    ///     .with_details(json!({ "eventId": "e1" }));
    /// assert!(err.details().is_some());
    /// ```
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::from_parts(ErrorCode::NotFound, message)
    }

    /// Conflict error carrying its tagged reason.
    #[must_use]
    pub fn conflict(kind: ConflictKind) -> Self {
        Self {
            code: ErrorCode::Conflict,
            conflict: Some(kind),
            message: kind.description().to_owned(),
            details: None,
        }
    }

    /// Convenience constructor for [`ErrorCode::ServiceUnavailable`].
    #[must_use]
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::from_parts(ErrorCode::ServiceUnavailable, message)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::from_parts(ErrorCode::InternalError, message)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDto {
    code: ErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    conflict: Option<ConflictKind>,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl From<Error> for ErrorDto {
    fn from(value: Error) -> Self {
        Self {
            code: value.code,
            conflict: value.conflict,
            message: value.message,
            details: value.details,
        }
    }
}

impl TryFrom<ErrorDto> for Error {
    type Error = ErrorValidationError;

    fn try_from(value: ErrorDto) -> Result<Self, Self::Error> {
        let ErrorDto {
            code,
            conflict,
            message,
            details,
        } = value;

        if message.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        if (code == ErrorCode::Conflict) != conflict.is_some() {
            return Err(ErrorValidationError::MismatchedConflictKind);
        }

        Ok(Self {
            code,
            conflict,
            message,
            details,
        })
    }
}

#[cfg(test)]
mod tests;
