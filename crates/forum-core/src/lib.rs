//! # Forum Core
//!
//! The domain layer of the forum backend.
//! This crate contains the rating rules and services with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::DomainError;
pub use services::RatingService;
