// src/lib.rs

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;

use config::AppConfig;
use scrapers::VideoScraper;
use services::{
    asset_registry::AssetRegistry, leaderboard::LeaderboardAggregator, ledger::Ledger,
    portfolio::PortfolioValuator,
};

pub mod config;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod models;
pub mod scrapers;

pub mod services {
    pub mod asset_registry;
    pub mod leaderboard;
    pub mod ledger;
    pub mod portfolio;
    pub mod pricing;
}

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<AssetRegistry>,
    pub ledger: Arc<Ledger>,
    pub valuator: PortfolioValuator,
    pub leaderboard: LeaderboardAggregator,
}

impl AppState {
    /// Build the stores and seed the configured demo accounts
    pub fn new(config: &AppConfig, scraper: Arc<dyn VideoScraper>) -> Self {
        let registry = Arc::new(AssetRegistry::new(
            scraper,
            config.pricing.clone(),
            Duration::from_secs(config.scrape_timeout_secs),
        ));
        let ledger = Arc::new(Ledger::new(registry.clone(), config.starting_balance));

        for demo in &config.demo_users {
            let balance = demo.balance.unwrap_or(config.starting_balance);
            if let Err(e) = ledger.seed_user(&demo.user_id, balance) {
                tracing::warn!(user_id = %demo.user_id, error = %e, "Skipping demo account");
            }
        }

        let valuator = PortfolioValuator::new(ledger.clone(), registry.clone());
        let leaderboard = LeaderboardAggregator::new(ledger.clone(), valuator.clone());

        Self {
            registry,
            ledger,
            valuator,
            leaderboard,
        }
    }
}

/// All API routes, without middleware layers
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health_check))
        .route("/api/scrape", post(handlers::scrape::scrape_video))
        .route("/api/assets", get(handlers::asset::list_assets))
        .route("/api/assets/refresh", post(handlers::asset::refresh_assets))
        .route("/api/assets/{asset_id}", get(handlers::asset::get_asset))
        .route(
            "/api/assets/{asset_id}/engagement",
            put(handlers::asset::update_engagement),
        )
        .route("/api/users", post(handlers::user::create_user))
        .route("/api/invest", post(handlers::invest::create_investment))
        .route("/api/portfolio/{user_id}", get(handlers::portfolio::get_portfolio))
        .route(
            "/api/portfolio/{user_id}/investments",
            get(handlers::portfolio::get_investment_history),
        )
        .route("/api/leaderboard", get(handlers::leaderboard::get_leaderboard))
        .with_state(state)
}
