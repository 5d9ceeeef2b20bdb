//! Listing sources and the fetcher seam used to read them.

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::domain::races::Distance;

/// One upstream page enumerating races of a single distance category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSource {
    pub distance: Distance,
    pub url: Url,
}

impl ListingSource {
    pub fn new(distance: Distance, url: Url) -> Self {
        Self { distance, url }
    }

    /// `scheme://host[:port]/` of the listing page; relative links resolve against it.
    pub fn root(&self) -> Url {
        let mut root = self.url.clone();
        root.set_path("/");
        root.set_query(None);
        root.set_fragment(None);
        root
    }
}

/// Transient failure reading an upstream page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to `{url}` timed out")]
    Timeout { url: String },
    #[error("`{url}` responded with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("request to `{url}` failed: {message}")]
    Transport { url: String, message: String },
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Return the raw document body, retrying transient failures per the fetcher's policy.
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}
