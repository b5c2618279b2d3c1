//! Review ratings and their aggregate.

use serde::{Deserialize, Serialize};

/// Validation errors for [`Rating`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RatingValidationError {
    /// The score lies outside the accepted range.
    #[error("rating must be between {min} and {max}, got {value}")]
    OutOfRange {
        /// Lowest accepted score.
        min: u8,
        /// Highest accepted score.
        max: u8,
        /// Score that was supplied.
        value: i64,
    },
}

/// A single review score between 1 and 5 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Lowest accepted score.
    pub const MIN: u8 = 1;
    /// Highest accepted score.
    pub const MAX: u8 = 5;

    /// Validate a raw score.
    ///
    /// # Errors
    ///
    /// Returns [`RatingValidationError::OutOfRange`] outside `1..=5`.
    pub fn new(value: i64) -> Result<Self, RatingValidationError> {
        u8::try_from(value)
            .ok()
            .filter(|score| (Self::MIN..=Self::MAX).contains(score))
            .map(Self)
            .ok_or(RatingValidationError::OutOfRange {
                min: Self::MIN,
                max: Self::MAX,
                value,
            })
    }

    /// The score as an integer.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = RatingValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

/// Arithmetic mean of an event's ratings; `0.0` when there are none.
///
/// # Examples
/// ```
/// use eventbook::domain::{average_rating, Rating};
///
/// let ratings = [Rating::new(4).unwrap(), Rating::new(5).unwrap()];
/// assert_eq!(average_rating(&ratings), 4.5);
/// assert_eq!(average_rating(&[]), 0.0);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "the stored aggregate is a floating-point mean"
)]
pub fn average_rating(ratings: &[Rating]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: u64 = ratings.iter().map(|rating| u64::from(rating.get())).sum();
    let count = u32::try_from(ratings.len()).map_or(f64::from(u32::MAX), f64::from);
    let total = u32::try_from(sum).map_or(f64::from(u32::MAX), f64::from);
    total / count
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0)]
    #[case(6)]
    #[case(-1)]
    #[case(300)]
    fn out_of_range_ratings_are_rejected(#[case] value: i64) {
        assert!(Rating::new(value).is_err());
    }

    #[rstest]
    fn average_of_mixed_ratings() {
        let ratings: Vec<Rating> = [1, 2, 2, 5]
            .into_iter()
            .map(|value| Rating::new(value).expect("valid rating"))
            .collect();
        assert_eq!(average_rating(&ratings), 2.5);
    }
}
