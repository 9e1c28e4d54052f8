//! Asset Registry
//!
//! Maps scraped videos to tradable assets and prices them from their latest
//! engagement snapshot. The index lock is never held across a scrape.

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::MarketError;
use crate::models::asset::{Asset, Engagement};
use crate::scrapers::parser::{extract_video_id, normalize_video_url};
use crate::scrapers::{ScrapedVideo, VideoScraper};
use crate::services::pricing::PricingFunction;

/// Max scrapes in flight during a full refresh
const REFRESH_CONCURRENCY: usize = 4;

/// Asset together with the price derived from its current engagement
#[derive(Debug, Clone)]
pub struct AssetQuote {
    pub asset: Asset,
    pub current_price: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub updated: usize,
    pub failed: usize,
}

#[derive(Default)]
struct AssetIndex {
    assets: HashMap<String, Asset>,
    /// Normalized source URL -> asset id
    by_source: HashMap<String, String>,
}

pub struct AssetRegistry {
    index: RwLock<AssetIndex>,
    scraper: Arc<dyn VideoScraper>,
    pricing: PricingFunction,
    scrape_timeout: Duration,
}

impl AssetRegistry {
    pub fn new(
        scraper: Arc<dyn VideoScraper>,
        pricing: PricingFunction,
        scrape_timeout: Duration,
    ) -> Self {
        Self {
            index: RwLock::new(AssetIndex::default()),
            scraper,
            pricing,
            scrape_timeout,
        }
    }

    /// Scrape `source_url` and return its asset, creating it on first sight.
    ///
    /// An already registered asset gets its current engagement refreshed.
    pub async fn register_or_get(&self, source_url: &str) -> Result<AssetQuote, MarketError> {
        let normalized = normalize_video_url(source_url).ok_or_else(|| {
            MarketError::scrape_unresolvable(format!("Not a valid video URL: {}", source_url))
        })?;

        let scraped = self.scrape_bounded(&normalized).await?;
        let engagement = Engagement::from_counts(scraped.views, scraped.likes)?;

        let asset = self.upsert(&normalized, scraped, engagement);
        let current_price = self.pricing.price(&asset.current_engagement);

        Ok(AssetQuote {
            asset,
            current_price,
        })
    }

    pub fn quote(&self, asset_id: &str) -> Result<AssetQuote, MarketError> {
        let index = self.index.read();
        let asset = index
            .assets
            .get(asset_id)
            .ok_or_else(|| MarketError::AssetNotFound(asset_id.to_string()))?;

        Ok(AssetQuote {
            current_price: self.pricing.price(&asset.current_engagement),
            asset: asset.clone(),
        })
    }

    pub fn get(&self, asset_id: &str) -> Option<Asset> {
        self.index.read().assets.get(asset_id).cloned()
    }

    /// All assets, oldest discovery first
    pub fn list(&self) -> Vec<AssetQuote> {
        let index = self.index.read();
        let mut quotes: Vec<AssetQuote> = index
            .assets
            .values()
            .map(|asset| AssetQuote {
                current_price: self.pricing.price(&asset.current_engagement),
                asset: asset.clone(),
            })
            .collect();
        quotes.sort_by(|a, b| {
            a.asset
                .discovered_at
                .cmp(&b.asset.discovered_at)
                .then_with(|| a.asset.asset_id.cmp(&b.asset.asset_id))
        });
        quotes
    }

    pub fn len(&self) -> usize {
        self.index.read().assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the current engagement snapshot with counts pushed by an ingestion service
    pub fn update_engagement(
        &self,
        asset_id: &str,
        views: Option<i64>,
        likes: Option<i64>,
    ) -> Result<AssetQuote, MarketError> {
        let engagement = Engagement::from_counts(views, likes)?;

        let mut index = self.index.write();
        let asset = index
            .assets
            .get_mut(asset_id)
            .ok_or_else(|| MarketError::AssetNotFound(asset_id.to_string()))?;

        asset.current_engagement = engagement;
        asset.engagement_updated_at = Utc::now();

        debug!(
            asset_id = %asset_id,
            views = engagement.views,
            likes = engagement.likes,
            "Engagement updated"
        );

        Ok(AssetQuote {
            current_price: self.pricing.price(&engagement),
            asset: asset.clone(),
        })
    }

    /// Re-scrape one asset's source URL
    pub async fn refresh(&self, asset_id: &str) -> Result<AssetQuote, MarketError> {
        let source_url = self
            .get(asset_id)
            .map(|asset| asset.source_url)
            .ok_or_else(|| MarketError::AssetNotFound(asset_id.to_string()))?;

        let scraped = self.scrape_bounded(&source_url).await?;
        let engagement = Engagement::from_counts(scraped.views, scraped.likes)?;
        let asset = self.upsert(&source_url, scraped, engagement);

        Ok(AssetQuote {
            current_price: self.pricing.price(&asset.current_engagement),
            asset,
        })
    }

    /// Re-scrape every registered asset. Failures are counted, not propagated.
    pub async fn refresh_all(&self) -> RefreshSummary {
        let asset_ids: Vec<String> = self.index.read().assets.keys().cloned().collect();
        if asset_ids.is_empty() {
            return RefreshSummary::default();
        }

        info!("Refreshing {} assets", asset_ids.len());

        let results: Vec<(String, Result<AssetQuote, MarketError>)> = stream::iter(asset_ids)
            .map(|asset_id| async move {
                let result = self.refresh(&asset_id).await;
                (asset_id, result)
            })
            .buffer_unordered(REFRESH_CONCURRENCY)
            .collect()
            .await;

        let mut summary = RefreshSummary::default();
        for (asset_id, result) in results {
            match result {
                Ok(_) => summary.updated += 1,
                Err(e) => {
                    warn!(asset_id = %asset_id, error = %e, "Asset refresh failed");
                    summary.failed += 1;
                }
            }
        }

        info!(
            "Asset refresh finished: {} updated, {} failed",
            summary.updated, summary.failed
        );
        summary
    }

    async fn scrape_bounded(&self, url: &str) -> Result<ScrapedVideo, MarketError> {
        match tokio::time::timeout(self.scrape_timeout, self.scraper.scrape(url)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Scrape of {} exceeded {}s timeout",
                    url,
                    self.scrape_timeout.as_secs_f64()
                );
                Err(MarketError::scrape_timeout(format!(
                    "{} did not respond within {:?}",
                    url, self.scrape_timeout
                )))
            }
        }
    }

    fn upsert(&self, normalized_url: &str, scraped: ScrapedVideo, engagement: Engagement) -> Asset {
        let derived_id = derive_asset_id(normalized_url, &scraped);
        let now = Utc::now();

        let mut index = self.index.write();

        let existing_id = index.by_source.get(normalized_url).cloned().or_else(|| {
            derived_id
                .as_ref()
                .filter(|id| index.assets.contains_key(id.as_str()))
                .cloned()
        });

        if let Some(asset_id) = existing_id {
            index
                .by_source
                .insert(normalized_url.to_string(), asset_id.clone());

            if let Some(asset) = index.assets.get_mut(&asset_id) {
                asset.current_engagement = engagement;
                asset.engagement_updated_at = now;
                if asset.author == "unknown" && !scraped.author.is_empty() {
                    asset.author = scraped.author;
                }

                debug!(
                    asset_id = %asset_id,
                    views = engagement.views,
                    likes = engagement.likes,
                    "Existing asset refreshed"
                );
                return asset.clone();
            }
        }

        let asset_id = derived_id
            .unwrap_or_else(|| format!("asset_{}", uuid::Uuid::new_v4().simple()));
        let author = if scraped.author.is_empty() {
            "unknown".to_string()
        } else {
            scraped.author
        };

        let asset = Asset {
            asset_id: asset_id.clone(),
            author,
            source_url: normalized_url.to_string(),
            video_url: scraped
                .canonical_url
                .unwrap_or_else(|| normalized_url.to_string()),
            discovery_engagement: engagement,
            current_engagement: engagement,
            discovered_at: now,
            engagement_updated_at: now,
        };

        info!(
            asset_id = %asset_id,
            author = %asset.author,
            views = engagement.views,
            likes = engagement.likes,
            "New asset registered"
        );

        index
            .by_source
            .insert(normalized_url.to_string(), asset_id.clone());
        index.assets.insert(asset_id, asset.clone());
        asset
    }
}

/// Stable id for a video when its numeric id is known
fn derive_asset_id(normalized_url: &str, scraped: &ScrapedVideo) -> Option<String> {
    scraped
        .video_id
        .clone()
        .filter(|id| !id.is_empty())
        .or_else(|| extract_video_id(normalized_url))
        .map(|id| format!("asset_{}", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::pricing::PricingStrategy;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;

    struct StubScraper {
        videos: Mutex<HashMap<String, ScrapedVideo>>,
        delay: Option<Duration>,
    }

    impl StubScraper {
        fn new() -> Self {
            Self {
                videos: Mutex::new(HashMap::new()),
                delay: None,
            }
        }

        fn set(&self, url: &str, author: &str, views: i64, likes: i64) {
            self.videos.lock().insert(
                url.to_string(),
                ScrapedVideo {
                    video_id: None,
                    author: author.to_string(),
                    views: Some(views),
                    likes: Some(likes),
                    canonical_url: None,
                },
            );
        }
    }

    #[async_trait]
    impl VideoScraper for StubScraper {
        async fn scrape(&self, video_url: &str) -> Result<ScrapedVideo, MarketError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.videos
                .lock()
                .get(video_url)
                .cloned()
                .ok_or_else(|| MarketError::scrape_unresolvable("video not found"))
        }
    }

    const URL: &str = "https://www.tiktok.com/@bob/video/111";

    fn registry(scraper: Arc<StubScraper>) -> AssetRegistry {
        AssetRegistry::new(
            scraper,
            PricingFunction::with_defaults(PricingStrategy::Linear),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_register_then_refresh_same_asset() {
        let scraper = Arc::new(StubScraper::new());
        scraper.set(URL, "bob", 10_000, 50);
        let registry = registry(scraper.clone());

        let first = registry.register_or_get(URL).await.unwrap();
        assert_eq!(first.asset.asset_id, "asset_111");
        assert_eq!(first.current_price, dec!(10));

        scraper.set(URL, "bob", 20_000, 80);
        let second = registry
            .register_or_get("https://WWW.tiktok.com/@bob/video/111/?lang=en")
            .await
            .unwrap();

        assert_eq!(second.asset.asset_id, "asset_111");
        assert_eq!(second.current_price, dec!(20));
        assert_eq!(second.asset.discovery_engagement, Engagement::new(10_000, 50));
        assert_eq!(second.asset.current_engagement, Engagement::new(20_000, 80));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_scrape_failure_propagates() {
        let registry = registry(Arc::new(StubScraper::new()));
        let err = registry.register_or_get(URL).await.unwrap_err();
        assert_eq!(err.code(), "SCRAPE_FAILED");
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_url_rejected() {
        let registry = registry(Arc::new(StubScraper::new()));
        let err = registry.register_or_get("not a url").await.unwrap_err();
        assert!(matches!(err, MarketError::ScrapeFailed { .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_negative_counts_rejected() {
        let scraper = Arc::new(StubScraper::new());
        scraper.set(URL, "bob", -5, 0);
        let registry = registry(scraper);

        let err = registry.register_or_get(URL).await.unwrap_err();
        assert!(matches!(err, MarketError::InvalidEngagement(_)));
    }

    #[tokio::test]
    async fn test_scrape_timeout() {
        let scraper = Arc::new(StubScraper {
            videos: Mutex::new(HashMap::new()),
            delay: Some(Duration::from_millis(500)),
        });
        scraper.set(URL, "bob", 1, 1);
        let registry = AssetRegistry::new(
            scraper,
            PricingFunction::with_defaults(PricingStrategy::Linear),
            Duration::from_millis(20),
        );

        let err = registry.register_or_get(URL).await.unwrap_err();
        assert_eq!(err.code(), "SCRAPE_TIMEOUT");
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_update_engagement_reprices() {
        let scraper = Arc::new(StubScraper::new());
        scraper.set(URL, "bob", 10_000, 0);
        let registry = registry(scraper);
        registry.register_or_get(URL).await.unwrap();

        let quote = registry
            .update_engagement("asset_111", Some(35_000), Some(10))
            .unwrap();
        assert_eq!(quote.current_price, dec!(35));
        assert_eq!(registry.quote("asset_111").unwrap().current_price, dec!(35));

        assert!(matches!(
            registry.update_engagement("asset_111", Some(-1), Some(0)),
            Err(MarketError::InvalidEngagement(_))
        ));
        assert!(matches!(
            registry.quote("asset_missing"),
            Err(MarketError::AssetNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_refresh_all_counts_failures() {
        let scraper = Arc::new(StubScraper::new());
        let other = "https://www.tiktok.com/@amy/video/222";
        scraper.set(URL, "bob", 1_000, 0);
        scraper.set(other, "amy", 2_000, 0);
        let registry = registry(scraper.clone());
        registry.register_or_get(URL).await.unwrap();
        registry.register_or_get(other).await.unwrap();

        scraper.set(URL, "bob", 5_000, 0);
        scraper.videos.lock().remove(other);

        let summary = registry.refresh_all().await;
        assert_eq!(summary, RefreshSummary { updated: 1, failed: 1 });
        assert_eq!(registry.quote("asset_111").unwrap().current_price, dec!(5));
        assert_eq!(registry.quote("asset_222").unwrap().current_price, dec!(2));
    }
}
