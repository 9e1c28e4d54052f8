//! POST /api/scrape
//!
//! Resolves a video URL through the scraper and registers (or refreshes) its asset.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use tracing::{info, warn};

use super::{map_json_rejection, no_field_error};
use crate::models::asset::{ScrapeRequest, ScrapeResponse};
use crate::models::round_money;
use crate::AppState;

pub async fn scrape_video(
    State(state): State<AppState>,
    payload: Result<Json<ScrapeRequest>, JsonRejection>,
) -> Result<Json<ScrapeResponse>, (StatusCode, Json<ScrapeResponse>)> {
    let Json(payload) = payload.map_err(|rejection| {
        let err = map_json_rejection(rejection, no_field_error);
        (
            err.status_code(),
            Json(ScrapeResponse::failed(String::new(), &err)),
        )
    })?;

    info!(video_url = %payload.video_url, "Scrape request received");

    let quote = state
        .registry
        .register_or_get(&payload.video_url)
        .await
        .map_err(|e| {
            warn!(video_url = %payload.video_url, error = %e, code = e.code(), "Scrape failed");
            (
                e.status_code(),
                Json(ScrapeResponse::failed(payload.video_url.clone(), &e)),
            )
        })?;

    Ok(Json(ScrapeResponse {
        success: true,
        asset_id: Some(quote.asset.asset_id),
        video_url: quote.asset.video_url,
        views: Some(quote.asset.current_engagement.views),
        likes: Some(quote.asset.current_engagement.likes),
        author: Some(quote.asset.author),
        current_price: Some(round_money(quote.current_price)),
        error: None,
        code: None,
        retryable: false,
    }))
}
