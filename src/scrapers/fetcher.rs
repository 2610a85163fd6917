use crate::scrapers::error::FetchError;
use crate::scrapers::traits::PageFetcher;
use crate::scrapers::types::CrawlConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

/// Plain HTTP fetcher for the live site
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &CrawlConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Option<String>, FetchError> {
        debug!("Fetching URL: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source: Box::new(source),
            })?;

        if !response.status().is_success() {
            warn!("{} returned status: {}", url, response.status());
            return Ok(None);
        }

        let html = response
            .text()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source: Box::new(source),
            })?;

        debug!("Downloaded {} bytes of HTML", html.len());
        Ok(Some(html))
    }
}
