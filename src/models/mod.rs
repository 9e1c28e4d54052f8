use rust_decimal::Decimal;

pub mod asset;
pub mod error;
pub mod health;
pub mod ledger;
pub mod leaderboard;
pub mod portfolio;
pub mod user;

/// Decimal places kept for coin amounts and prices on the wire
pub const MONEY_DP: u32 = 4;
/// Decimal places kept for fractional shares on the wire
pub const SHARES_DP: u32 = 8;
/// Decimal places kept for percentages on the wire
pub const PERCENT_DP: u32 = 2;

pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp(MONEY_DP).normalize()
}

pub fn round_shares(value: Decimal) -> Decimal {
    value.round_dp(SHARES_DP).normalize()
}

pub fn round_percent(value: Decimal) -> Decimal {
    value.round_dp(PERCENT_DP).normalize()
}
