//! Event aggregate and its capacity semantics.

use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;

/// Stable event identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a new random [`EventId`].
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Maximum number of concurrent registrations an event accepts.
///
/// An absent or non-positive limit means the event is unlimited and has no
/// waitlist.
///
/// # Examples
/// ```
/// use eventbook::domain::Capacity;
///
/// let capacity = Capacity::limited(2);
/// assert!(capacity.admits(1));
/// assert!(capacity.is_full(2));
/// assert!(!Capacity::from_raw(-4_i64).is_limited());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capacity(Option<NonZeroU32>);

impl Capacity {
    /// Capacity with no upper bound.
    pub const UNLIMITED: Self = Self(None);

    /// Build a capacity from a count; zero yields [`Capacity::UNLIMITED`].
    #[must_use]
    pub const fn limited(limit: u32) -> Self {
        Self(NonZeroU32::new(limit))
    }

    /// Build a capacity from a stored column value where zero, negative, or
    /// `NULL` all mean unlimited. Limits above `u32::MAX` saturate.
    #[must_use]
    pub fn from_raw(raw: impl Into<Option<i64>>) -> Self {
        match raw.into() {
            Some(value) if value > 0 => Self::limited(u32::try_from(value).unwrap_or(u32::MAX)),
            _ => Self::UNLIMITED,
        }
    }

    /// The configured limit, if any.
    #[must_use]
    pub const fn limit(self) -> Option<u32> {
        match self.0 {
            Some(limit) => Some(limit.get()),
            None => None,
        }
    }

    /// Whether registrations are bounded (and a waitlist is available).
    #[must_use]
    pub const fn is_limited(self) -> bool {
        self.0.is_some()
    }

    /// Whether one more registration fits given `active` registrations.
    #[must_use]
    pub fn admits(self, active: u64) -> bool {
        self.limit().is_none_or(|limit| active < u64::from(limit))
    }

    /// Whether the event is at or over its limit with `active` registrations.
    #[must_use]
    pub fn is_full(self, active: u64) -> bool {
        !self.admits(active)
    }
}

/// Fields required to construct an [`Event`].
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    /// Event identifier.
    pub id: EventId,
    /// Creating user.
    pub owner_id: UserId,
    /// Free-form category label.
    pub category: String,
    /// Admission limit.
    pub capacity: Capacity,
    /// Mean review rating.
    pub average_rating: f64,
}

/// Event record with the attributes the booking engine reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    id: EventId,
    owner_id: UserId,
    category: String,
    capacity: Capacity,
    average_rating: f64,
}

impl Event {
    /// Assemble an event from its draft.
    #[must_use]
    pub fn new(draft: EventDraft) -> Self {
        let EventDraft {
            id,
            owner_id,
            category,
            capacity,
            average_rating,
        } = draft;
        Self {
            id,
            owner_id,
            category,
            capacity,
            average_rating,
        }
    }

    /// Event identifier.
    #[must_use]
    pub const fn id(&self) -> EventId {
        self.id
    }

    /// User that created the event; owners and admins may read its waitlist.
    #[must_use]
    pub const fn owner_id(&self) -> UserId {
        self.owner_id
    }

    /// Category label.
    #[must_use]
    pub fn category(&self) -> &str {
        self.category.as_str()
    }

    /// Admission limit.
    #[must_use]
    pub const fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// Mean review rating as last recomputed.
    #[must_use]
    pub const fn average_rating(&self) -> f64 {
        self.average_rating
    }

    /// Return a copy with an edited capacity. Existing registrations are
    /// never dropped when the new limit is below the active count.
    #[must_use]
    pub fn with_capacity(mut self, capacity: Capacity) -> Self {
        self.capacity = capacity;
        self
    }

    /// Return a copy carrying a recomputed mean rating.
    #[must_use]
    pub fn with_average_rating(mut self, average_rating: f64) -> Self {
        self.average_rating = average_rating;
        self
    }
}

#[cfg(test)]
mod tests {
    //! Capacity arithmetic.

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(None, None)]
    #[case(Some(0), None)]
    #[case(Some(-3), None)]
    #[case(Some(5), Some(5))]
    #[case(Some(i64::from(u32::MAX)), Some(u32::MAX))]
    #[case(Some(i64::from(u32::MAX) + 1), Some(u32::MAX))]
    #[case(Some(i64::MAX), Some(u32::MAX))]
    fn from_raw_normalises_and_saturates(
        #[case] raw: Option<i64>,
        #[case] expected: Option<u32>,
    ) {
        assert_eq!(Capacity::from_raw(raw).limit(), expected);
    }

    #[rstest]
    #[case(0, true)]
    #[case(1, true)]
    #[case(2, false)]
    #[case(3, false)]
    fn limited_capacity_admits_below_limit(#[case] active: u64, #[case] admits: bool) {
        let capacity = Capacity::limited(2);
        assert_eq!(capacity.admits(active), admits);
        assert_eq!(capacity.is_full(active), !admits);
    }

    #[rstest]
    fn unlimited_capacity_never_fills() {
        assert!(Capacity::UNLIMITED.admits(u64::MAX));
        assert!(!Capacity::UNLIMITED.is_full(u64::MAX));
        assert!(!Capacity::UNLIMITED.is_limited());
    }

    #[rstest]
    fn lowering_capacity_keeps_event_over_limit() {
        let event = Event::new(EventDraft {
            id: EventId::random(),
            owner_id: UserId::random(),
            category: "music".to_owned(),
            capacity: Capacity::limited(5),
            average_rating: 0.0,
        })
        .with_capacity(Capacity::limited(1));

        assert!(event.capacity().is_full(3));
        assert_eq!(event.category(), "music");
    }
}
