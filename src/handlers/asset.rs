use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use tracing::info;

use super::{map_json_rejection, map_market_error, ApiError};
use crate::error::MarketError;
use crate::models::asset::{
    AssetListResponse, AssetResponse, EngagementUpdateRequest, RefreshResponse,
};
use crate::AppState;

/// GET /api/assets
pub async fn list_assets(State(state): State<AppState>) -> Json<AssetListResponse> {
    let assets = state
        .registry
        .list()
        .iter()
        .map(|quote| AssetResponse::from_asset(&quote.asset, quote.current_price))
        .collect();

    Json(AssetListResponse { assets })
}

/// GET /api/assets/{asset_id}
pub async fn get_asset(
    State(state): State<AppState>,
    Path(asset_id): Path<String>,
) -> Result<Json<AssetResponse>, ApiError> {
    let quote = state.registry.quote(&asset_id).map_err(map_market_error)?;
    Ok(Json(AssetResponse::from_asset(&quote.asset, quote.current_price)))
}

/// PUT /api/assets/{asset_id}/engagement
///
/// Push path for an ingestion service that tracks engagement independently.
pub async fn update_engagement(
    State(state): State<AppState>,
    Path(asset_id): Path<String>,
    payload: Result<Json<EngagementUpdateRequest>, JsonRejection>,
) -> Result<Json<AssetResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        map_market_error(map_json_rejection(rejection, |detail| {
            (detail.contains("views") || detail.contains("likes"))
                .then(|| MarketError::InvalidEngagement(detail.to_string()))
        }))
    })?;

    let quote = state
        .registry
        .update_engagement(&asset_id, payload.views, payload.likes)
        .map_err(map_market_error)?;

    info!(
        asset_id = %asset_id,
        current_price = %quote.current_price,
        "Engagement pushed"
    );

    Ok(Json(AssetResponse::from_asset(&quote.asset, quote.current_price)))
}

/// POST /api/assets/refresh
///
/// Re-scrapes every registered asset to update prices.
pub async fn refresh_assets(State(state): State<AppState>) -> Json<RefreshResponse> {
    let summary = state.registry.refresh_all().await;

    Json(RefreshResponse {
        success: summary.failed == 0,
        assets_updated: summary.updated,
        assets_failed: summary.failed,
    })
}
