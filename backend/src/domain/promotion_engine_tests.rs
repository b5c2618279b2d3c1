//! Tests for the promotion engine.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rstest::rstest;

use super::*;
use crate::domain::ports::{
    AdmissionLedgerError, MockAdmissionLedger, MockEventRepository, MockUserRepository,
    MockWaitlistRepository, UserRepositoryError, WaitlistRepositoryError,
};
use crate::domain::{
    Capacity, EmailAddress, ErrorCode, Event, EventDraft, UserId, UserRole, WaitlistEntryId,
};

type TestEngine = PromotionEngine<
    MockEventRepository,
    MockWaitlistRepository,
    MockAdmissionLedger,
    MockUserRepository,
>;

#[derive(Default)]
struct Mocks {
    events: MockEventRepository,
    waitlists: MockWaitlistRepository,
    ledger: MockAdmissionLedger,
    users: MockUserRepository,
}

impl Mocks {
    fn build(self) -> TestEngine {
        PromotionEngine::new(
            Arc::new(self.events),
            Arc::new(self.waitlists),
            Arc::new(self.ledger),
            Arc::new(self.users),
        )
    }
}

fn entry(event_id: EventId, age_minutes: i64) -> WaitlistEntry {
    WaitlistEntry {
        id: WaitlistEntryId::random(),
        event_id,
        user_id: UserId::random(),
        created_at: Utc::now() - Duration::minutes(age_minutes),
    }
}

fn registration_for(entry: &WaitlistEntry) -> Registration {
    Registration {
        event_id: entry.event_id,
        user_id: entry.user_id,
        created_at: Utc::now(),
    }
}

fn profile(user_id: UserId) -> User {
    let email = EmailAddress::new("waiting@example.com").expect("valid email");
    User::new(user_id, email, UserRole::User)
}

fn event(event_id: EventId, capacity: Capacity) -> Event {
    Event::new(EventDraft {
        id: event_id,
        owner_id: UserId::random(),
        category: "concert".to_owned(),
        capacity,
        average_rating: 0.0,
    })
}

#[tokio::test]
async fn promote_next_reports_empty_waitlist() {
    let mut mocks = Mocks::default();
    mocks
        .waitlists
        .expect_peek_oldest()
        .times(1)
        .return_once(|_| Ok(None));
    mocks.ledger.expect_promote_entry().never();

    let outcome = mocks.build().promote_next(EventId::random()).await;
    assert_eq!(outcome, PromotionOutcome::NoOneWaiting);
}

#[tokio::test]
async fn promote_next_admits_oldest_entry_and_resolves_profile() {
    let event_id = EventId::random();
    let oldest = entry(event_id, 10);
    let user = profile(oldest.user_id);
    let registration = registration_for(&oldest);

    let mut mocks = Mocks::default();
    let peeked = oldest.clone();
    mocks
        .waitlists
        .expect_peek_oldest()
        .times(1)
        .return_once(move |_| Ok(Some(peeked)));
    let expected_id = oldest.id;
    let admitted = registration.clone();
    mocks
        .ledger
        .expect_promote_entry()
        .withf(move |candidate| candidate.id == expected_id)
        .times(1)
        .return_once(move |_| Ok(PromotionStep::Promoted(admitted)));
    let found = user.clone();
    mocks
        .users
        .expect_find_by_id()
        .times(1)
        .return_once(move |_| Ok(Some(found)));

    let outcome = mocks.build().promote_next(event_id).await;
    assert_eq!(
        outcome,
        PromotionOutcome::Promoted(PromotedUser {
            entry: oldest,
            registration,
            user: Some(user),
        })
    );
}

#[rstest]
#[case(PromotionStep::SlotTaken, PromotionFailure::SlotTaken)]
#[case(PromotionStep::EntryWithdrawn, PromotionFailure::EntryWithdrawn)]
#[case(PromotionStep::AlreadyRegistered, PromotionFailure::AlreadyRegistered)]
#[tokio::test]
async fn promote_next_aborts_without_advancing(
    #[case] step: PromotionStep,
    #[case] expected: PromotionFailure,
) {
    let event_id = EventId::random();
    let oldest = entry(event_id, 5);
    let mut mocks = Mocks::default();
    mocks
        .waitlists
        .expect_peek_oldest()
        .times(1)
        .return_once(move |_| Ok(Some(oldest)));
    mocks
        .ledger
        .expect_promote_entry()
        .times(1)
        .return_once(move |_| Ok(step));
    mocks.users.expect_find_by_id().never();

    let outcome = mocks.build().promote_next(event_id).await;
    assert_eq!(outcome, PromotionOutcome::Failed(expected));
}

#[tokio::test]
async fn promote_next_treats_lingering_entry_as_promotion() {
    let event_id = EventId::random();
    let oldest = entry(event_id, 5);
    let registration = registration_for(&oldest);
    let mut mocks = Mocks::default();
    let peeked = oldest.clone();
    mocks
        .waitlists
        .expect_peek_oldest()
        .times(1)
        .return_once(move |_| Ok(Some(peeked)));
    mocks
        .ledger
        .expect_promote_entry()
        .times(1)
        .return_once(move |_| Ok(PromotionStep::PromotedButStillListed(registration)));
    mocks
        .users
        .expect_find_by_id()
        .times(1)
        .return_once(|_| Ok(None));

    let outcome = mocks.build().promote_next(event_id).await;
    let promoted = outcome.promoted().expect("promotion stands");
    assert_eq!(promoted.entry, oldest);
    assert!(promoted.user.is_none());
}

#[tokio::test]
async fn promote_next_survives_profile_lookup_failure() {
    let event_id = EventId::random();
    let oldest = entry(event_id, 5);
    let registration = registration_for(&oldest);
    let mut mocks = Mocks::default();
    mocks
        .waitlists
        .expect_peek_oldest()
        .times(1)
        .return_once(move |_| Ok(Some(oldest)));
    mocks
        .ledger
        .expect_promote_entry()
        .times(1)
        .return_once(move |_| Ok(PromotionStep::Promoted(registration)));
    mocks
        .users
        .expect_find_by_id()
        .times(1)
        .return_once(|_| Err(UserRepositoryError::connection("down")));

    let outcome = mocks.build().promote_next(event_id).await;
    assert!(outcome.promoted().is_some_and(|promoted| promoted.user.is_none()));
}

#[tokio::test]
async fn promote_next_reports_store_failures() {
    let event_id = EventId::random();
    let oldest = entry(event_id, 5);
    let mut mocks = Mocks::default();
    mocks
        .waitlists
        .expect_peek_oldest()
        .times(1)
        .return_once(move |_| Ok(Some(oldest)));
    mocks
        .ledger
        .expect_promote_entry()
        .times(1)
        .return_once(|_| Err(AdmissionLedgerError::query("serialization failure")));

    let outcome = mocks.build().promote_next(event_id).await;
    let PromotionOutcome::Failed(PromotionFailure::Store(err)) = outcome else {
        panic!("expected store failure, got {outcome:?}");
    };
    assert_eq!(err.code(), ErrorCode::InternalError);
}

#[tokio::test]
async fn promote_next_reports_peek_failure() {
    let mut mocks = Mocks::default();
    mocks
        .waitlists
        .expect_peek_oldest()
        .times(1)
        .return_once(|_| Err(WaitlistRepositoryError::connection("refused")));

    let outcome = mocks.build().promote_next(EventId::random()).await;
    assert!(matches!(
        outcome,
        PromotionOutcome::Failed(PromotionFailure::Store(_))
    ));
}

#[tokio::test]
async fn reconcile_fills_free_slots_until_capacity() {
    let event_id = EventId::random();
    let first = entry(event_id, 20);
    let second = entry(event_id, 10);
    let mut mocks = Mocks::default();
    mocks
        .events
        .expect_find_by_id()
        .times(1)
        .return_once(move |_| Ok(Some(event(event_id, Capacity::limited(3)))));
    let mut counts = vec![1_u64, 2, 3].into_iter();
    mocks
        .events
        .expect_count_active_registrations()
        .times(3)
        .returning(move |_| Ok(counts.next().unwrap_or(u64::MAX)));
    let mut queue = vec![first.clone(), second.clone()].into_iter();
    mocks
        .waitlists
        .expect_peek_oldest()
        .times(2)
        .returning(move |_| Ok(queue.next()));
    mocks
        .ledger
        .expect_promote_entry()
        .times(2)
        .returning(|candidate| Ok(PromotionStep::Promoted(registration_for(candidate))));
    mocks
        .users
        .expect_find_by_id()
        .times(2)
        .returning(|_| Ok(None));

    let report = mocks.build().reconcile(event_id).await.expect("reconciled");
    let promoted: Vec<_> = report.promoted.iter().map(|p| p.entry.user_id).collect();
    assert_eq!(promoted, vec![first.user_id, second.user_id]);
    assert!(report.stopped_by.is_none());
}

#[tokio::test]
async fn reconcile_stops_at_first_failure() {
    let event_id = EventId::random();
    let oldest = entry(event_id, 5);
    let mut mocks = Mocks::default();
    mocks
        .events
        .expect_find_by_id()
        .times(1)
        .return_once(move |_| Ok(Some(event(event_id, Capacity::limited(5)))));
    mocks
        .events
        .expect_count_active_registrations()
        .times(1)
        .returning(|_| Ok(1));
    mocks
        .waitlists
        .expect_peek_oldest()
        .times(1)
        .return_once(move |_| Ok(Some(oldest)));
    mocks
        .ledger
        .expect_promote_entry()
        .times(1)
        .return_once(|_| Ok(PromotionStep::SlotTaken));

    let report = mocks.build().reconcile(event_id).await.expect("reconciled");
    assert!(report.promoted.is_empty());
    assert_eq!(report.stopped_by, Some(PromotionFailure::SlotTaken));
}

#[tokio::test]
async fn reconcile_unknown_event_is_not_found() {
    let mut mocks = Mocks::default();
    mocks
        .events
        .expect_find_by_id()
        .times(1)
        .return_once(|_| Ok(None));

    let err = mocks
        .build()
        .reconcile(EventId::random())
        .await
        .expect_err("missing event");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn reconcile_all_skips_events_that_fail() {
    let missing = EventId::random();
    let full = EventId::random();
    let mut mocks = Mocks::default();
    mocks
        .waitlists
        .expect_list_events_with_entries()
        .times(1)
        .return_once(move || Ok(vec![missing, full]));
    mocks
        .events
        .expect_find_by_id()
        .times(2)
        .returning(move |event_id| {
            Ok((*event_id == full).then(|| event(full, Capacity::limited(1))))
        });
    mocks
        .events
        .expect_count_active_registrations()
        .times(1)
        .returning(|_| Ok(1));

    let reports = mocks.build().reconcile_all().await.expect("reconciled");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports.first().map(|r| r.event_id), Some(full));
}
