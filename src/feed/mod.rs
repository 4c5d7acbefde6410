//! Feed sources and the fetcher collaborator.

pub mod fetcher;
pub mod types;

pub use fetcher::{validate_url, FeedFetcher, Fetcher};
pub use types::{ContentItem, FeedSource};
