//! Remote media downloads.

mod http;

pub use http::{HttpImageFetcher, ImageFetchConfig};
