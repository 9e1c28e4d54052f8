//! Service configuration read from the environment (after `dotenvy` has loaded `.env`).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::env;
use std::str::FromStr;

use crate::scrapers::ScraperConfig;
use crate::services::pricing::{PricingFunction, PricingStrategy};

type ConfigResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Debug, Clone, PartialEq)]
pub struct DemoUser {
    pub user_id: String,
    pub balance: Option<Decimal>,
}

#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub starting_balance: Decimal,
    pub demo_users: Vec<DemoUser>,
    pub pricing: PricingFunction,
    pub scrape_timeout_secs: u64,
    pub scraper: ScraperConfig,
    /// 0 disables the periodic re-scrape
    pub asset_refresh_interval_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            starting_balance: dec!(1000.00),
            demo_users: parse_demo_users("user1:1000,testuser:5000").unwrap_or_default(),
            pricing: PricingFunction::with_defaults(PricingStrategy::Logarithmic),
            scrape_timeout_secs: 20,
            scraper: ScraperConfig::default(),
            asset_refresh_interval_secs: 1800,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> ConfigResult<Self> {
        let defaults = Self::default();

        let strategy = match env::var("PRICING_STRATEGY") {
            Ok(value) => PricingStrategy::from_str(&value)
                .ok_or_else(|| format!("Unknown PRICING_STRATEGY: {}", value))?,
            Err(_) => defaults.pricing.strategy(),
        };
        let base_params = strategy.default_params();
        let params = crate::services::pricing::PricingParams {
            base: env_or("PRICE_BASE", base_params.base)?,
            views_weight: env_or("PRICE_VIEWS_WEIGHT", base_params.views_weight)?,
            likes_weight: env_or("PRICE_LIKES_WEIGHT", base_params.likes_weight)?,
            floor: env_or("PRICE_FLOOR", base_params.floor)?,
        };
        let pricing = PricingFunction::new(strategy, params)?;

        let starting_balance: Decimal = env_or("STARTING_BALANCE", defaults.starting_balance)?;
        if starting_balance < Decimal::ZERO {
            return Err(format!("STARTING_BALANCE must not be negative, got {}", starting_balance).into());
        }

        let demo_users = match env::var("DEMO_USERS") {
            Ok(value) => parse_demo_users(&value)?,
            Err(_) => defaults.demo_users,
        };

        let scrape_timeout_secs = env_or("SCRAPE_TIMEOUT_SECS", defaults.scrape_timeout_secs)?;
        let scraper = ScraperConfig {
            user_agent: env::var("SCRAPER_USER_AGENT").unwrap_or(defaults.scraper.user_agent),
            request_timeout_secs: scrape_timeout_secs,
            cache_ttl_secs: env_or("SCRAPE_CACHE_TTL_SECS", defaults.scraper.cache_ttl_secs)?,
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port)?,
            starting_balance,
            demo_users,
            pricing,
            scrape_timeout_secs,
            scraper,
            asset_refresh_interval_secs: env_or(
                "ASSET_REFRESH_INTERVAL_SECS",
                defaults.asset_refresh_interval_secs,
            )?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_or<T>(key: &str, default: T) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|e| format!("Invalid {}={}: {}", key, value, e).into()),
        Err(_) => Ok(default),
    }
}

/// Parse "user1:1000,testuser:5000,guest" into demo accounts.
/// A missing balance means the starting grant.
pub fn parse_demo_users(value: &str) -> ConfigResult<Vec<DemoUser>> {
    let mut users = Vec::new();

    for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (user_id, balance) = match entry.split_once(':') {
            Some((id, balance)) => {
                let balance: Decimal = balance
                    .trim()
                    .parse()
                    .map_err(|e| format!("Invalid balance in DEMO_USERS entry '{}': {}", entry, e))?;
                (id.trim(), Some(balance))
            }
            None => (entry, None),
        };

        if user_id.is_empty() {
            return Err(format!("Empty user id in DEMO_USERS entry '{}'", entry).into());
        }

        users.push(DemoUser {
            user_id: user_id.to_string(),
            balance,
        });
    }

    Ok(users)
}
