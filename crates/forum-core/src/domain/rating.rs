use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::Rater;
use crate::error::DomainError;

/// Realtime event name carrying a post's current aggregate.
pub const RATING_UPDATED_EVENT: &str = "ratingUpdated";

/// A star score, always within `Score::MIN..=Score::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Score(u8);

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Validate a raw score.
    pub fn new(value: i64) -> Result<Self, DomainError> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(DomainError::Validation(format!(
                "rating must be an integer between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            )))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rating entity - one user's score for one post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rating {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub score: Score,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rating {
    /// Create a new rating.
    pub fn new(post_id: Uuid, user_id: Uuid, score: Score) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            post_id,
            user_id,
            score,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the score in place.
    pub fn rescore(&mut self, score: Score) {
        self.score = score;
        self.updated_at = Utc::now();
    }
}

/// A rating with its rater resolved, as shown on a post's rating list.
#[derive(Debug, Clone)]
pub struct RatingWithRater {
    pub rating: Rating,
    pub rater: Option<Rater>,
}

/// Mean score (one decimal) and number of ratings for a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingAggregate {
    pub average_rating: f64,
    pub count: u64,
}

impl RatingAggregate {
    /// Build from a score total and count, as returned by `SUM`/`COUNT`.
    pub fn from_totals(total: i64, count: u64) -> Self {
        if count == 0 {
            return Self::default();
        }
        let mean = total as f64 / count as f64;
        Self {
            average_rating: (mean * 10.0).round() / 10.0,
            count,
        }
    }

    pub fn from_scores<I>(scores: I) -> Self
    where
        I: IntoIterator<Item = Score>,
    {
        let (total, count) = scores
            .into_iter()
            .fold((0i64, 0u64), |(total, count), s| {
                (total + i64::from(s.get()), count + 1)
            });
        Self::from_totals(total, count)
    }
}

/// All ratings of a post together with their aggregate.
#[derive(Debug, Clone)]
pub struct PostRatings {
    pub ratings: Vec<RatingWithRater>,
    pub aggregate: RatingAggregate,
}

/// Outcome of a submission: a fresh rating or an overwritten one.
#[derive(Debug, Clone)]
pub enum Submission {
    Created(Rating),
    Updated(Rating),
}

impl Submission {
    pub fn rating(&self) -> &Rating {
        match self {
            Submission::Created(r) | Submission::Updated(r) => r,
        }
    }

    pub fn into_rating(self) -> Rating {
        match self {
            Submission::Created(r) | Submission::Updated(r) => r,
        }
    }
}

/// Payload of the `ratingUpdated` realtime event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingUpdated {
    pub post_id: Uuid,
    pub average_rating: f64,
    pub count: u64,
}

impl RatingUpdated {
    pub fn new(post_id: Uuid, aggregate: RatingAggregate) -> Self {
        Self {
            post_id,
            average_rating: aggregate.average_rating,
            count: aggregate.count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(values: &[i64]) -> Vec<Score> {
        values.iter().map(|v| Score::new(*v).unwrap()).collect()
    }

    #[test]
    fn test_score_bounds() {
        assert!(Score::new(0).is_err());
        assert!(Score::new(6).is_err());
        assert!(Score::new(-3).is_err());
        assert_eq!(Score::new(1).unwrap().get(), 1);
        assert_eq!(Score::new(5).unwrap().get(), 5);
    }

    #[test]
    fn test_empty_aggregate_is_zero() {
        let aggregate = RatingAggregate::from_scores(Vec::new());
        assert_eq!(aggregate.average_rating, 0.0);
        assert_eq!(aggregate.count, 0);
    }

    #[test]
    fn test_aggregate_rounds_to_one_decimal() {
        let aggregate = RatingAggregate::from_scores(scores(&[4, 5, 5]));
        assert_eq!(aggregate.average_rating, 4.7);
        assert_eq!(aggregate.count, 3);

        let aggregate = RatingAggregate::from_scores(scores(&[1, 2]));
        assert_eq!(aggregate.average_rating, 1.5);

        let aggregate = RatingAggregate::from_scores(scores(&[1, 1, 2]));
        assert_eq!(aggregate.average_rating, 1.3);
    }

    #[test]
    fn test_aggregate_of_two_users() {
        let aggregate = RatingAggregate::from_scores(scores(&[4, 2]));
        assert_eq!(aggregate, RatingAggregate { average_rating: 3.0, count: 2 });
    }

    #[test]
    fn test_rating_updated_payload_is_camel_case() {
        let post_id = Uuid::new_v4();
        let payload = RatingUpdated::new(post_id, RatingAggregate::from_totals(9, 2));
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["postId"], post_id.to_string());
        assert_eq!(json["averageRating"], 4.5);
        assert_eq!(json["count"], 2);
    }
}
