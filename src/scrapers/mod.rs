pub mod parser;
pub mod tiktok;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MarketError;

/// Raw result from the scraping collaborator. Counts are left unvalidated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrapedVideo {
    pub video_id: Option<String>,
    pub author: String,
    pub views: Option<i64>,
    pub likes: Option<i64>,
    pub canonical_url: Option<String>,
}

/// Boundary to whatever resolves a video URL into engagement metadata.
#[async_trait]
pub trait VideoScraper: Send + Sync {
    async fn scrape(&self, video_url: &str) -> Result<ScrapedVideo, MarketError>;
}

#[derive(Clone)]
pub struct ScraperConfig {
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub cache_ttl_secs: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 14_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0.3 Mobile/15E148 Safari/604.1".to_string(),
            request_timeout_secs: 20,
            cache_ttl_secs: 15,
        }
    }
}
