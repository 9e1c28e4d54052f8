use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::services::asset_registry::AssetRegistry;

/// Periodically re-scrape every registered asset so prices follow engagement.
/// Returns `None` when the interval is 0.
pub fn start_asset_refresh_job(
    registry: Arc<AssetRegistry>,
    interval_secs: u64,
) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        tracing::info!("Asset refresh job disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut interval = interval(Duration::from_secs(interval_secs));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // First tick completes immediately; assets are freshly scraped at registration
        interval.tick().await;

        loop {
            interval.tick().await;

            if registry.is_empty() {
                tracing::debug!("No assets registered, skipping refresh");
                continue;
            }

            tracing::info!(assets = registry.len(), "Starting scheduled asset refresh");
            let summary = registry.refresh_all().await;

            if summary.failed > 0 {
                tracing::warn!(
                    updated = summary.updated,
                    failed = summary.failed,
                    "Asset refresh finished with failures"
                );
            } else {
                tracing::info!(updated = summary.updated, "Asset refresh complete");
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MarketError;
    use crate::scrapers::{ScrapedVideo, VideoScraper};
    use crate::services::pricing::{PricingFunction, PricingStrategy};
    use async_trait::async_trait;

    struct NeverScraper;

    #[async_trait]
    impl VideoScraper for NeverScraper {
        async fn scrape(&self, _url: &str) -> Result<ScrapedVideo, MarketError> {
            Err(MarketError::scrape_unresolvable("not used"))
        }
    }

    fn registry() -> Arc<AssetRegistry> {
        Arc::new(AssetRegistry::new(
            Arc::new(NeverScraper),
            PricingFunction::with_defaults(PricingStrategy::Linear),
            Duration::from_secs(1),
        ))
    }

    #[tokio::test]
    async fn test_zero_interval_disables_job() {
        assert!(start_asset_refresh_job(registry(), 0).is_none());
    }

    #[tokio::test]
    async fn test_job_runs_until_aborted() {
        let handle = start_asset_refresh_job(registry(), 3600).unwrap();
        assert!(!handle.is_finished());
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
    }
}
