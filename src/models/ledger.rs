use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::asset::Engagement;
use super::{round_money, round_shares};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub username: String,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    /// Creation order, breaks ties between accounts created in the same instant
    pub seq: u64,
}

/// Immutable record of a single buy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentTransaction {
    pub investment_id: String,
    pub user_id: String,
    pub asset_id: String,
    pub coins_spent: Decimal,
    pub entry_price: Decimal,
    pub shares_purchased: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// A user's cumulative position in one asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    pub asset_id: String,
    pub shares: Decimal,
    /// Weighted-average entry price per share
    pub cost_basis: Decimal,
    pub coins_invested: Decimal,
    pub entry_engagement: Engagement,
    pub first_entry_at: DateTime<Utc>,
    pub last_entry_at: DateTime<Utc>,
}

impl Holding {
    /// Fold a new buy into the existing position (or open one).
    ///
    /// newBasis = (oldShares * oldBasis + shares * price) / (oldShares + shares)
    pub fn apply(
        existing: Option<&Holding>,
        tx: &InvestmentTransaction,
        engagement: Engagement,
    ) -> Holding {
        match existing {
            None => Holding {
                asset_id: tx.asset_id.clone(),
                shares: tx.shares_purchased,
                cost_basis: tx.entry_price,
                coins_invested: tx.coins_spent,
                entry_engagement: engagement,
                first_entry_at: tx.timestamp,
                last_entry_at: tx.timestamp,
            },
            Some(old) => {
                let total_shares = old.shares + tx.shares_purchased;
                // Zero total shares only if both legs were empty; keep the old basis then
                let cost_basis = (old.shares * old.cost_basis
                    + tx.shares_purchased * tx.entry_price)
                    .checked_div(total_shares)
                    .unwrap_or(old.cost_basis);

                Holding {
                    asset_id: old.asset_id.clone(),
                    shares: total_shares,
                    cost_basis,
                    coins_invested: old.coins_invested + tx.coins_spent,
                    entry_engagement: old.entry_engagement,
                    first_entry_at: old.first_entry_at,
                    last_entry_at: tx.timestamp,
                }
            }
        }
    }

    /// Total cost of the position at its cost basis
    pub fn cost(&self) -> Decimal {
        self.shares * self.cost_basis
    }
}

/// Committed outcome of `Ledger::invest`
#[derive(Debug, Clone)]
pub struct InvestmentResult {
    pub investment_id: String,
    pub shares_purchased: Decimal,
    pub entry_price: Decimal,
    pub total_cost: Decimal,
    pub new_balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestRequest {
    pub user_id: String,
    pub asset_id: String,
    pub amount_coins: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub investment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares_purchased: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_balance: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<InvestmentResult> for InvestResponse {
    fn from(result: InvestmentResult) -> Self {
        Self {
            success: true,
            investment_id: Some(result.investment_id),
            shares_purchased: Some(round_shares(result.shares_purchased)),
            entry_price: Some(round_money(result.entry_price)),
            total_cost: Some(round_money(result.total_cost)),
            new_balance: Some(round_money(result.new_balance)),
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentHistoryResponse {
    pub user_id: String,
    pub investments: Vec<InvestmentTransaction>,
}
