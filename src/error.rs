//! Domain errors shared by the registry, ledger and HTTP layer.

use axum::http::StatusCode;
use rust_decimal::Decimal;

/// Why a call to the scraping collaborator failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeFailureKind {
    /// The scrape did not finish within the configured timeout
    Timeout,
    /// Transport failure or upstream 5xx/429, worth retrying later
    Network,
    /// The URL was rejected or the page held no usable video data
    Unresolvable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarketError {
    InvalidAmount(String),
    InsufficientFunds { balance: Decimal, required: Decimal },
    AssetNotFound(String),
    UserNotFound(String),
    UserAlreadyExists(String),
    InvalidUserId(String),
    /// Request body could not be read as the expected JSON shape
    InvalidRequest(String),
    InvalidEngagement(String),
    ScrapeFailed {
        kind: ScrapeFailureKind,
        reason: String,
    },
}

impl MarketError {
    pub fn scrape_timeout(reason: impl Into<String>) -> Self {
        MarketError::ScrapeFailed {
            kind: ScrapeFailureKind::Timeout,
            reason: reason.into(),
        }
    }

    pub fn scrape_network(reason: impl Into<String>) -> Self {
        MarketError::ScrapeFailed {
            kind: ScrapeFailureKind::Network,
            reason: reason.into(),
        }
    }

    pub fn scrape_unresolvable(reason: impl Into<String>) -> Self {
        MarketError::ScrapeFailed {
            kind: ScrapeFailureKind::Unresolvable,
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code returned to clients
    pub fn code(&self) -> &'static str {
        match self {
            MarketError::InvalidAmount(_) => "INVALID_AMOUNT",
            MarketError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            MarketError::AssetNotFound(_) => "ASSET_NOT_FOUND",
            MarketError::UserNotFound(_) => "USER_NOT_FOUND",
            MarketError::UserAlreadyExists(_) => "USER_ALREADY_EXISTS",
            MarketError::InvalidUserId(_) => "INVALID_USER_ID",
            MarketError::InvalidRequest(_) => "INVALID_REQUEST",
            MarketError::InvalidEngagement(_) => "INVALID_ENGAGEMENT",
            MarketError::ScrapeFailed { kind, .. } => match kind {
                ScrapeFailureKind::Timeout => "SCRAPE_TIMEOUT",
                ScrapeFailureKind::Network => "SCRAPE_UNAVAILABLE",
                ScrapeFailureKind::Unresolvable => "SCRAPE_FAILED",
            },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            MarketError::InvalidAmount(_)
            | MarketError::InsufficientFunds { .. }
            | MarketError::InvalidUserId(_)
            | MarketError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            MarketError::AssetNotFound(_) | MarketError::UserNotFound(_) => StatusCode::NOT_FOUND,
            MarketError::UserAlreadyExists(_) => StatusCode::CONFLICT,
            MarketError::InvalidEngagement(_) => StatusCode::UNPROCESSABLE_ENTITY,
            MarketError::ScrapeFailed { kind, .. } => match kind {
                ScrapeFailureKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
                ScrapeFailureKind::Network => StatusCode::BAD_GATEWAY,
                ScrapeFailureKind::Unresolvable => StatusCode::UNPROCESSABLE_ENTITY,
            },
        }
    }

    /// Only collaborator outages are worth a client retry; domain failures never are.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MarketError::ScrapeFailed {
                kind: ScrapeFailureKind::Timeout | ScrapeFailureKind::Network,
                ..
            }
        )
    }
}

impl std::fmt::Display for MarketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketError::InvalidAmount(msg) => write!(f, "Invalid amount: {}", msg),
            MarketError::InsufficientFunds { balance, required } => write!(
                f,
                "Insufficient funds. Balance: {:.2}, Required: {:.2}",
                balance, required
            ),
            MarketError::AssetNotFound(id) => {
                write!(f, "Asset not found: {}. Please scrape the video first.", id)
            }
            MarketError::UserNotFound(id) => write!(f, "User not found: {}", id),
            MarketError::UserAlreadyExists(id) => write!(f, "User already exists: {}", id),
            MarketError::InvalidUserId(msg) => write!(f, "Invalid user id: {}", msg),
            MarketError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            MarketError::InvalidEngagement(msg) => write!(f, "Invalid engagement: {}", msg),
            MarketError::ScrapeFailed { kind, reason } => match kind {
                ScrapeFailureKind::Timeout => write!(f, "Scrape timed out: {}", reason),
                ScrapeFailureKind::Network => write!(f, "Scraper unavailable: {}", reason),
                ScrapeFailureKind::Unresolvable => write!(f, "Scraping failed: {}", reason),
            },
        }
    }
}

impl std::error::Error for MarketError {}
