//! Domain entities - the core business objects.

mod rating;
mod user;

pub use rating::{
    PostRatings, RATING_UPDATED_EVENT, Rating, RatingAggregate, RatingUpdated, RatingWithRater,
    Score, Submission,
};
pub use user::{Rater, User};
