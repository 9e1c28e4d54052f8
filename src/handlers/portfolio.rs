use axum::{
    extract::{Path, State},
    Json,
};

use super::{map_market_error, ApiError};
use crate::models::ledger::InvestmentHistoryResponse;
use crate::models::portfolio::PortfolioResponse;
use crate::AppState;

/// GET /api/portfolio/{user_id}
///
/// Balance, holdings and profit/loss at current prices.
pub async fn get_portfolio(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<PortfolioResponse>, ApiError> {
    let snapshot = state
        .valuator
        .get_portfolio(&user_id)
        .map_err(map_market_error)?;

    tracing::debug!(
        user_id = %user_id,
        holdings = snapshot.holdings.len(),
        total_value = %snapshot.total_value,
        "Portfolio valued"
    );

    Ok(Json(PortfolioResponse::from(snapshot)))
}

/// GET /api/portfolio/{user_id}/investments
pub async fn get_investment_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<InvestmentHistoryResponse>, ApiError> {
    let investments = state
        .ledger
        .transactions(&user_id)
        .map_err(map_market_error)?;

    Ok(Json(InvestmentHistoryResponse {
        user_id,
        investments,
    }))
}
