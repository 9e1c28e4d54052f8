use axum::{extract::rejection::JsonRejection, http::StatusCode, Json};

use crate::error::MarketError;
use crate::models::error::ErrorResponse;

pub mod asset;
pub mod health;
pub mod invest;
pub mod leaderboard;
pub mod portfolio;
pub mod scrape;
pub mod user;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a domain error to its HTTP status and `{success: false, error}` body
pub fn map_market_error(err: MarketError) -> ApiError {
    (err.status_code(), Json(ErrorResponse::from(&err)))
}

/// Turn a rejected JSON body into a domain error.
///
/// `field_error` gets the rejection text of a body that parsed but did not fit the
/// target type, and may claim it as a field-specific error.
pub fn map_json_rejection(
    rejection: JsonRejection,
    field_error: impl Fn(&str) -> Option<MarketError>,
) -> MarketError {
    let detail = rejection.body_text();
    tracing::debug!(status = %rejection.status(), detail = %detail, "Rejected request body");

    if matches!(rejection, JsonRejection::JsonDataError(_)) {
        if let Some(err) = field_error(&detail) {
            return err;
        }
    }
    MarketError::InvalidRequest(detail)
}

/// Rejections with no field-specific meaning
pub fn no_field_error(_detail: &str) -> Option<MarketError> {
    None
}
