//! Application services - orchestrate ports around the domain rules.

mod rating;

pub use rating::RatingService;
