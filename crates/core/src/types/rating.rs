//! Book rating scores.

use serde::{Deserialize, Serialize};

/// Error returned for a score outside the accepted range.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("rating must be between {min} and {max} (got {got})", min = RatingScore::MIN, max = RatingScore::MAX)]
pub struct RatingError {
    /// The rejected value.
    pub got: i16,
}

/// A 1-5 star rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub struct RatingScore(i16);

impl RatingScore {
    /// Lowest score.
    pub const MIN: i16 = 1;
    /// Highest score.
    pub const MAX: i16 = 5;

    /// Create a score.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError`] if `value` is outside `1..=5`.
    pub const fn new(value: i16) -> Result<Self, RatingError> {
        if value < Self::MIN || value > Self::MAX {
            return Err(RatingError { got: value });
        }
        Ok(Self(value))
    }

    /// Get the raw score.
    #[must_use]
    pub const fn value(&self) -> i16 {
        self.0
    }
}

impl TryFrom<i16> for RatingScore {
    type Error = RatingError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RatingScore> for i16 {
    fn from(score: RatingScore) -> Self {
        score.0
    }
}

impl std::fmt::Display for RatingScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.0, Self::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_range() {
        for value in 1..=5 {
            assert!(RatingScore::new(value).is_ok());
        }
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert_eq!(RatingScore::new(0), Err(RatingError { got: 0 }));
        assert_eq!(RatingScore::new(6), Err(RatingError { got: 6 }));
        assert_eq!(
            RatingError { got: 9 }.to_string(),
            "rating must be between 1 and 5 (got 9)"
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(RatingScore::new(4).map(|s| s.to_string()), Ok("4/5".to_owned()));
    }
}
