use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::MarketError;

/// Views/likes pair used as pricing input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub views: u64,
    pub likes: u64,
}

impl Engagement {
    pub fn new(views: u64, likes: u64) -> Self {
        Self { views, likes }
    }

    /// Validate raw counts coming from a collaborator.
    ///
    /// Missing or negative counts are rejected rather than defaulted to zero.
    pub fn from_counts(views: Option<i64>, likes: Option<i64>) -> Result<Self, MarketError> {
        let views = views
            .ok_or_else(|| MarketError::InvalidEngagement("missing view count".to_string()))?;
        let likes = likes
            .ok_or_else(|| MarketError::InvalidEngagement("missing like count".to_string()))?;

        if views < 0 || likes < 0 {
            return Err(MarketError::InvalidEngagement(format!(
                "counts must be non-negative (views={}, likes={})",
                views, likes
            )));
        }

        Ok(Self::new(views as u64, likes as u64))
    }
}

/// A tradable video. Price is never stored here; it is derived from `current_engagement`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub asset_id: String,
    pub author: String,
    /// Normalized URL the asset was registered under
    pub source_url: String,
    /// Canonical video URL reported by the scraper (falls back to `source_url`)
    pub video_url: String,
    pub discovery_engagement: Engagement,
    pub current_engagement: Engagement,
    pub discovered_at: DateTime<Utc>,
    pub engagement_updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeRequest {
    pub video_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    pub video_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default)]
    pub retryable: bool,
}

impl ScrapeResponse {
    pub fn failed(video_url: String, err: &MarketError) -> Self {
        Self {
            success: false,
            asset_id: None,
            video_url,
            views: None,
            likes: None,
            author: None,
            current_price: None,
            error: Some(err.to_string()),
            code: Some(err.code().to_string()),
            retryable: err.is_retryable(),
        }
    }
}

/// Asset as exposed by the asset endpoints, with its live price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetResponse {
    pub asset_id: String,
    pub author: String,
    pub video_url: String,
    pub source_url: String,
    pub views_at_discovery: u64,
    pub likes_at_discovery: u64,
    pub current_views: u64,
    pub current_likes: u64,
    pub current_price: Decimal,
    pub discovered_at: DateTime<Utc>,
    pub engagement_updated_at: DateTime<Utc>,
}

impl AssetResponse {
    pub fn from_asset(asset: &Asset, current_price: Decimal) -> Self {
        Self {
            asset_id: asset.asset_id.clone(),
            author: asset.author.clone(),
            video_url: asset.video_url.clone(),
            source_url: asset.source_url.clone(),
            views_at_discovery: asset.discovery_engagement.views,
            likes_at_discovery: asset.discovery_engagement.likes,
            current_views: asset.current_engagement.views,
            current_likes: asset.current_engagement.likes,
            current_price: super::round_money(current_price),
            discovered_at: asset.discovered_at,
            engagement_updated_at: asset.engagement_updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetListResponse {
    pub assets: Vec<AssetResponse>,
}

/// Engagement pushed by an ingestion service. Signed so negative input can be rejected explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementUpdateRequest {
    pub views: Option<i64>,
    pub likes: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub assets_updated: usize,
    pub assets_failed: usize,
}
