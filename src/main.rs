use hoas_scout::scrapers::{CrawlConfig, HoasScraper, HttpFetcher};
use hoas_scout::table::Table;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("🏠 HOAS Scout - rental listing crawler");
    info!("======================================");

    let config = CrawlConfig::default();
    let fetcher = HttpFetcher::new(&config)?;
    let scraper = HoasScraper::new(fetcher, config)?;

    info!("Starting crawl from {}", scraper.config().areas_url);
    let outcome = scraper.crawl().await;
    outcome.log_summary();

    let table = Table::from_records(&outcome.records);
    info!("{} amenity columns", table.amenities.len());
    table.save(&scraper.config().output_path)?;

    Ok(())
}
