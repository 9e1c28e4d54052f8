use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use super::{map_json_rejection, map_market_error, no_field_error, ApiError};
use crate::models::round_money;
use crate::models::user::{CreateUserRequest, CreateUserResponse};
use crate::AppState;

/// POST /api/users
///
/// Opens an account with the starting coin grant.
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<CreateUserResponse>, ApiError> {
    let Json(payload) = payload
        .map_err(|rejection| map_market_error(map_json_rejection(rejection, no_field_error)))?;

    let user = state
        .ledger
        .create_user(&payload.user_id, payload.username.as_deref())
        .map_err(map_market_error)?;

    Ok(Json(CreateUserResponse {
        success: true,
        user_id: user.user_id,
        username: user.username,
        balance: round_money(user.balance),
    }))
}
