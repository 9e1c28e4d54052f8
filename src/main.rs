use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use viral_market_backend::config::AppConfig;
use viral_market_backend::jobs::asset_refresh_sync::start_asset_refresh_job;
use viral_market_backend::scrapers::tiktok::HttpVideoScraper;
use viral_market_backend::{build_router, AppState};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,viral_market_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().expect("Invalid configuration");
    tracing::info!(
        pricing = ?config.pricing.strategy(),
        starting_balance = %config.starting_balance,
        demo_users = config.demo_users.len(),
        "Configuration loaded"
    );

    let scraper = HttpVideoScraper::new(&config.scraper).expect("Failed to build HTTP scraper");
    let state = AppState::new(&config, Arc::new(scraper));

    let refresh_job = start_asset_refresh_job(
        state.registry.clone(),
        config.asset_refresh_interval_secs,
    );

    let app = build_router(state.clone())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    // Start server
    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .expect("Failed to bind listener");

    tracing::info!(
        "Server listening on {}",
        listener.local_addr().expect("Listener has no local address")
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    if let Some(job) = refresh_job {
        job.abort();
    }

    let summary = state.ledger.summary();
    tracing::info!(
        users = summary.users,
        holdings = summary.holdings,
        transactions = summary.transactions,
        coins_invested = %summary.coins_invested,
        "Shutdown complete"
    );
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
