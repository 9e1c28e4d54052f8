use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use parking_lot::Mutex;
use rust_decimal_macros::dec;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use viral_market_backend::config::{AppConfig, DemoUser};
use viral_market_backend::error::MarketError;
use viral_market_backend::scrapers::{ScrapedVideo, VideoScraper};
use viral_market_backend::services::pricing::{PricingFunction, PricingStrategy};
use viral_market_backend::{build_router, AppState};

/// In-memory scraper keyed by normalized video URL
#[derive(Default)]
pub struct StubScraper {
    videos: Mutex<HashMap<String, Result<ScrapedVideo, MarketError>>>,
    delay: Option<Duration>,
}

#[allow(dead_code)]
impl StubScraper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn set_video(&self, url: &str, author: &str, views: i64, likes: i64) {
        self.videos.lock().insert(
            url.to_string(),
            Ok(ScrapedVideo {
                video_id: None,
                author: author.to_string(),
                views: Some(views),
                likes: Some(likes),
                canonical_url: None,
            }),
        );
    }

    pub fn set_failure(&self, url: &str, err: MarketError) {
        self.videos.lock().insert(url.to_string(), Err(err));
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
            .unwrap_or_else(|| Err(MarketError::scrape_unresolvable("video not found")))
    }
}

/// Linear pricing (views / 1000), a 1000 coin grant and one demo account
pub fn test_config() -> AppConfig {
    AppConfig {
        starting_balance: dec!(1000),
        demo_users: vec![DemoUser {
            user_id: "user1".to_string(),
            balance: None,
        }],
        pricing: PricingFunction::with_defaults(PricingStrategy::Linear),
        scrape_timeout_secs: 1,
        asset_refresh_interval_secs: 0,
        ..AppConfig::default()
    }
}

pub fn build_test_app(scraper: Arc<StubScraper>) -> (AppState, Router) {
    build_test_app_with(&test_config(), scraper)
}

#[allow(dead_code)]
pub fn build_test_app_with(config: &AppConfig, scraper: Arc<StubScraper>) -> (AppState, Router) {
    let state = AppState::new(config, scraper);
    let router = build_router(state.clone());
    (state, router)
}

/// Send a request and decode the JSON body
#[allow(dead_code)]
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };
    dispatch(app, request).await
}

/// Sends a body verbatim, for payloads `serde_json::Value` cannot represent
#[allow(dead_code)]
pub async fn send_raw(app: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    dispatch(app, request).await
}

async fn dispatch(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    (status, json)
}
