//! POST /api/invest
//!
//! Buys shares of a registered asset with the user's coins.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::{info, warn};

use super::{map_json_rejection, map_market_error, ApiError};
use crate::error::MarketError;
use crate::models::ledger::{InvestRequest, InvestResponse};
use crate::AppState;

pub async fn create_investment(
    State(state): State<AppState>,
    payload: Result<Json<InvestRequest>, JsonRejection>,
) -> Result<Json<InvestResponse>, ApiError> {
    // Non-numeric, out-of-range or missing amounts fail here, before the ledger sees them
    let Json(payload) = payload.map_err(|rejection| {
        map_market_error(map_json_rejection(rejection, |detail| {
            detail
                .contains("amount_coins")
                .then(|| MarketError::InvalidAmount(detail.to_string()))
        }))
    })?;

    info!(
        user_id = %payload.user_id,
        asset_id = %payload.asset_id,
        amount_coins = %payload.amount_coins,
        "Investment request received"
    );

    let result = state
        .ledger
        .invest(&payload.user_id, &payload.asset_id, payload.amount_coins)
        .map_err(|e| {
            warn!(
                user_id = %payload.user_id,
                asset_id = %payload.asset_id,
                error = %e,
                "Investment failed"
            );
            map_market_error(e)
        })?;

    Ok(Json(InvestResponse::from(result)))
}
