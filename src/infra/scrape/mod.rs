//! Upstream listing access: HTTP fetching and markup extraction.

pub mod extractor;
pub mod fetcher;
pub mod selectors;
pub mod text;

pub use extractor::{ExtractError, extract_candidates};
pub use fetcher::{DEFAULT_USER_AGENT, FetchPolicy, HttpPageFetcher};
