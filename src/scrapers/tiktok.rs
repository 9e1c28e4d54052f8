use async_trait::async_trait;
use moka::future::Cache;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;

use super::parser::extract_video_data;
use super::{ScrapedVideo, ScraperConfig, VideoScraper};
use crate::error::MarketError;

/// Scrapes public video pages over HTTP.
///
/// Results are cached per URL for a short TTL so bursts of scrapes for the
/// same video hit the upstream site once.
#[derive(Clone)]
pub struct HttpVideoScraper {
    client: Client,
    cache: Option<Arc<Cache<String, ScrapedVideo>>>,
}

impl HttpVideoScraper {
    pub fn new(config: &ScraperConfig) -> Result<Self, MarketError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| MarketError::scrape_network(format!("Failed to build HTTP client: {}", e)))?;

        let cache = (config.cache_ttl_secs > 0).then(|| {
            Arc::new(
                Cache::builder()
                    .max_capacity(1_000)
                    .time_to_live(Duration::from_secs(config.cache_ttl_secs))
                    .build(),
            )
        });

        Ok(Self { client, cache })
    }

    async fn fetch(&self, video_url: &str) -> Result<ScrapedVideo, MarketError> {
        tracing::info!("Starting scrape for: {}", video_url);

        let response = self
            .client
            .get(video_url)
            .header("Referer", "https://www.tiktok.com/")
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MarketError::scrape_timeout(format!("{}: {}", video_url, e))
                } else {
                    MarketError::scrape_network(format!("{}: {}", video_url, e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = format!("{} returned HTTP {}", video_url, status);
            return Err(
                if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                    MarketError::scrape_network(message)
                } else {
                    MarketError::scrape_unresolvable(message)
                },
            );
        }

        let html = response
            .text()
            .await
            .map_err(|e| MarketError::scrape_network(format!("Failed to read page body: {}", e)))?;

        extract_video_data(&html).ok_or_else(|| {
            tracing::warn!("No video data in page for {} ({} bytes)", video_url, html.len());
            MarketError::scrape_unresolvable("Could not extract video data (all strategies failed)")
        })
    }
}

#[async_trait]
impl VideoScraper for HttpVideoScraper {
    async fn scrape(&self, video_url: &str) -> Result<ScrapedVideo, MarketError> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(video_url).await {
                tracing::debug!("Cache hit for {}", video_url);
                return Ok(cached);
            }
        }

        let video = self.fetch(video_url).await?;

        if let Some(cache) = &self.cache {
            cache.insert(video_url.to_string(), video.clone()).await;
        }

        Ok(video)
    }
}
