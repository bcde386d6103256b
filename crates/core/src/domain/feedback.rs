use crate::error::MatchingError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Star rating an investor gives a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 5;

    pub fn new(value: i64) -> Result<Self, MatchingError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(MatchingError::InvalidRating(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = MatchingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for i64 {
    fn from(r: Rating) -> Self {
        i64::from(r.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: Uuid,
    pub profile_id: String,
    pub asset_id: String,
    pub rating: Rating,
    pub comment: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl FeedbackRecord {
    pub fn new(
        profile_id: &str,
        asset_id: &str,
        rating: i64,
        comment: Option<String>,
    ) -> Result<Self, MatchingError> {
        let rating = Rating::new(rating)?;
        Ok(Self {
            id: Uuid::new_v4(),
            profile_id: profile_id.trim().to_string(),
            asset_id: asset_id.trim().to_string(),
            rating,
            comment: comment.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            recorded_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ratings_one_through_five() {
        for r in 1..=5 {
            assert_eq!(Rating::new(r).unwrap().get() as i64, r);
        }
    }

    #[test]
    fn rejects_out_of_range_ratings() {
        for r in [0, 6, -1, 100] {
            assert!(matches!(
                Rating::new(r),
                Err(MatchingError::InvalidRating(v)) if v == r
            ));
        }
    }

    #[test]
    fn deserialize_enforces_range() {
        assert!(serde_json::from_str::<Rating>("4").is_ok());
        assert!(serde_json::from_str::<Rating>("9").is_err());
    }

    #[test]
    fn blank_comment_is_dropped() {
        let rec = FeedbackRecord::new("p1", "a1", 3, Some("  ".to_string())).unwrap();
        assert_eq!(rec.comment, None);
        assert_eq!(rec.rating.get(), 3);
    }
}
