use axum::Json;
use chrono::Utc;

use crate::models::health::HealthResponse;

pub async fn root() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "online".to_string(),
        message: "Viral Market API is running!".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        message: "All systems operational".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}
