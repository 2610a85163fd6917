use crate::models::UnitRecord;
use crate::scrapers::error::ExtractError;
use crate::scrapers::links::extract_links;
use crate::scrapers::property::PropertyExtractor;
use crate::scrapers::traits::PageFetcher;
use crate::scrapers::types::{CrawlConfig, ExtractionSchema};
use anyhow::Result;
use chrono::{DateTime, Utc};
use scraper::Html;
use std::collections::BTreeSet;
use tracing::{info, warn};

/// A property whose page could not be turned into records
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedProperty {
    pub url: String,
    pub reason: ExtractError,
}

/// Everything one crawl produced
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub records: Vec<UnitRecord>,
    pub skipped: Vec<SkippedProperty>,
    pub areas: usize,
    pub properties: usize,
    pub failed_fetches: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlOutcome {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
            areas: 0,
            properties: 0,
            failed_fetches: 0,
            started_at: now,
            finished_at: now,
        }
    }

    pub fn log_summary(&self) {
        let elapsed = self.finished_at - self.started_at;
        info!(
            records = self.records.len(),
            areas = self.areas,
            properties = self.properties,
            skipped = self.skipped.len(),
            failed_fetches = self.failed_fetches,
            elapsed_secs = elapsed.num_seconds(),
            "Crawl finished"
        );
        for skipped in &self.skipped {
            warn!(url = %skipped.url, reason = %skipped.reason, "Skipped property");
        }
    }
}

/// Crawls areas, then properties per area, then units per property
pub struct HoasScraper<F> {
    fetcher: F,
    config: CrawlConfig,
    extractor: PropertyExtractor,
}

impl<F: PageFetcher> HoasScraper<F> {
    pub fn new(fetcher: F, config: CrawlConfig) -> Result<Self> {
        Self::with_schema(fetcher, config, ExtractionSchema::default())
    }

    pub fn with_schema(fetcher: F, config: CrawlConfig, schema: ExtractionSchema) -> Result<Self> {
        let extractor = PropertyExtractor::new(schema)?;
        Ok(Self {
            fetcher,
            config,
            extractor,
        })
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    pub async fn crawl(&self) -> CrawlOutcome {
        let mut outcome = CrawlOutcome::new();

        let area_urls = self.area_urls(&mut outcome).await;
        info!("Found {} areas.", area_urls.len());
        outcome.areas = area_urls.len();

        for (idx, area_url) in area_urls.iter().enumerate() {
            info!("Progress: {}/{}", idx + 1, area_urls.len());
            let property_urls = self.scrape_area(area_url, &mut outcome).await;
            info!("Found {} buildings.", property_urls.len());

            for property_url in &property_urls {
                self.scrape_property(property_url, &mut outcome).await;
            }
        }

        outcome.finished_at = Utc::now();
        outcome
    }

    async fn area_urls(&self, outcome: &mut CrawlOutcome) -> BTreeSet<String> {
        let config = &self.config;
        match self.fetch_document(&config.areas_url, outcome).await {
            Some(document) => {
                self.resolved_links(&document, &config.area_marker, &config.areas_index_url)
            }
            None => BTreeSet::new(),
        }
    }

    async fn scrape_area(&self, area_url: &str, outcome: &mut CrawlOutcome) -> BTreeSet<String> {
        let config = &self.config;
        info!("{}", "-".repeat(50));
        info!("Scraping area: {}", config.short_path(area_url, &config.area_marker));

        match self.fetch_document(area_url, outcome).await {
            Some(document) => self.resolved_links(
                &document,
                &config.property_marker,
                &config.properties_index_url,
            ),
            None => BTreeSet::new(),
        }
    }

    /// Matching links as absolute URLs, without the index page itself
    fn resolved_links(&self, document: &Html, marker: &str, index_url: &str) -> BTreeSet<String> {
        extract_links(document, marker, &[index_url])
            .iter()
            .map(|href| self.config.absolute_url(href))
            .filter(|url| url != index_url)
            .collect()
    }

    async fn scrape_property(&self, property_url: &str, outcome: &mut CrawlOutcome) {
        let config = &self.config;
        info!("Scraping property: {}", config.short_path(property_url, &config.property_marker));

        let document = match self.fetch_document(property_url, outcome).await {
            Some(document) => document,
            None => return,
        };

        match self.extractor.extract(&document) {
            Ok(mut records) => {
                outcome.properties += 1;
                outcome.records.append(&mut records);
            }
            Err(reason) => {
                warn!(url = %property_url, error = %reason, "Failed to extract property");
                outcome.skipped.push(SkippedProperty {
                    url: property_url.to_string(),
                    reason,
                });
            }
        }
    }

    /// Fetch and parse a page. Any failure means no data from this URL.
    async fn fetch_document(&self, url: &str, outcome: &mut CrawlOutcome) -> Option<Html> {
        match self.fetcher.fetch(url).await {
            Ok(Some(html)) => Some(Html::parse_document(&html)),
            Ok(None) => {
                outcome.failed_fetches += 1;
                None
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Fetch failed");
                outcome.failed_fetches += 1;
                None
            }
        }
    }
}
