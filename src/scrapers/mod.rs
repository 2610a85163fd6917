pub mod error;
pub mod fetcher;
pub mod hoas;
pub mod links;
pub mod property;
pub mod traits;
pub mod types;

pub use error::{ExtractError, FetchError};
pub use fetcher::HttpFetcher;
pub use hoas::{CrawlOutcome, HoasScraper, SkippedProperty};
pub use property::PropertyExtractor;
pub use traits::PageFetcher;
pub use types::{CrawlConfig, ExtractionSchema};
