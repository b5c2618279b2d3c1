//! Tests for error construction, tagging, and serialisation.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn conflict_error() -> Error {
    Error::conflict(ConflictKind::AlreadyOnWaitlist)
}

#[rstest]
fn conflict_constructor_tags_kind(conflict_error: Error) {
    assert_eq!(conflict_error.code(), ErrorCode::Conflict);
    assert_eq!(
        conflict_error.conflict_kind(),
        Some(ConflictKind::AlreadyOnWaitlist)
    );
    assert_eq!(
        conflict_error.message(),
        ConflictKind::AlreadyOnWaitlist.description()
    );
}

#[rstest]
#[case(ErrorCode::NotFound, false)]
#[case(ErrorCode::ServiceUnavailable, true)]
#[case(ErrorCode::InternalError, true)]
fn is_internal_follows_code(#[case] code: ErrorCode, #[case] internal: bool) {
    let error = Error::try_new(code, "boom").expect("valid error");
    assert_eq!(error.is_internal(), internal);
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = Error::try_new(ErrorCode::NotFound, "   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyMessage)));
}

#[rstest]
fn try_new_refuses_untagged_conflicts() {
    let result = Error::try_new(ErrorCode::Conflict, "clash");
    assert!(matches!(
        result,
        Err(ErrorValidationError::MismatchedConflictKind)
    ));
}

#[rstest]
fn blank_convenience_messages_fall_back_to_code() {
    let error = Error::internal(" ");
    assert_eq!(error.message(), "InternalError");
}

#[rstest]
fn conflict_serialises_with_kind(conflict_error: Error) {
    let value = serde_json::to_value(&conflict_error).expect("serialise error");
    assert_eq!(value.get("code"), Some(&json!("conflict")));
    assert_eq!(value.get("conflict"), Some(&json!("already_on_waitlist")));
    assert!(value.get("details").is_none());
}

#[rstest]
fn deserialisation_rejects_conflict_without_kind() {
    let payload = json!({ "code": "conflict", "message": "clash" });
    let result: Result<Error, _> = serde_json::from_value(payload);
    assert!(result.is_err());
}

#[rstest]
fn deserialisation_preserves_details() {
    let payload = json!({
        "code": "not_found",
        "message": "event missing",
        "details": { "eventId": "e1" }
    });
    let error: Error = serde_json::from_value(payload).expect("valid payload");
    assert_eq!(error.code(), ErrorCode::NotFound);
    assert_eq!(error.details(), Some(&json!({ "eventId": "e1" })));
}
