use serde::{Deserialize, Serialize};

use crate::error::MarketError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default)]
    pub retryable: bool,
}

impl From<&MarketError> for ErrorResponse {
    fn from(err: &MarketError) -> Self {
        Self {
            success: false,
            error: err.to_string(),
            code: Some(err.code().to_string()),
            retryable: err.is_retryable(),
        }
    }
}
