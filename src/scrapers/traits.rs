use crate::scrapers::error::FetchError;
use async_trait::async_trait;

/// Source of raw pages for the crawl.
/// The live site sits behind this, and tests plug in canned pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch a page body. `Ok(None)` means the server answered with a
    /// non-success status.
    async fn fetch(&self, url: &str) -> Result<Option<String>, FetchError>;
}
