//! SeaORM entities.

pub mod rating;
pub mod user;
