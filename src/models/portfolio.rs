use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{round_money, round_percent, round_shares};

/// Valuation of one holding at current prices
#[derive(Debug, Clone)]
pub struct HoldingValuation {
    pub asset_id: String,
    pub video_url: String,
    pub author: String,
    pub shares: Decimal,
    pub cost_basis: Decimal,
    pub current_price: Decimal,
    pub current_value: Decimal,
    pub profit_loss: Decimal,
    pub profit_loss_percent: Decimal,
    pub views_on_investment: u64,
    pub likes_on_investment: u64,
    pub current_views: u64,
    pub current_likes: u64,
    pub coins_invested: Decimal,
    pub invested_at: DateTime<Utc>,
    pub last_invested_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PortfolioSnapshot {
    pub user_id: String,
    pub username: String,
    pub balance: Decimal,
    pub total_invested: Decimal,
    pub total_value: Decimal,
    pub total_profit_loss: Decimal,
    pub holdings: Vec<HoldingValuation>,
}

impl PortfolioSnapshot {
    /// Coins on hand plus current value of every holding
    pub fn portfolio_value(&self) -> Decimal {
        self.balance + self.total_value
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioItem {
    pub asset_id: String,
    pub video_url: String,
    pub author: String,
    pub shares: Decimal,
    pub buy_price: Decimal,
    pub current_price: Decimal,
    pub current_value: Decimal,
    pub profit_loss: Decimal,
    pub profit_loss_percent: Decimal,
    pub views_on_investment: u64,
    pub likes_on_investment: u64,
    pub current_views: u64,
    pub current_likes: u64,
    pub coins_invested: Decimal,
    pub invested_at: DateTime<Utc>,
    pub last_invested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioResponse {
    pub user_id: String,
    pub balance: Decimal,
    pub total_invested: Decimal,
    pub total_value: Decimal,
    pub total_profit_loss: Decimal,
    pub portfolio_value: Decimal,
    pub investments: Vec<PortfolioItem>,
}

impl From<PortfolioSnapshot> for PortfolioResponse {
    fn from(snapshot: PortfolioSnapshot) -> Self {
        let portfolio_value = snapshot.portfolio_value();
        let investments = snapshot
            .holdings
            .into_iter()
            .map(|h| PortfolioItem {
                asset_id: h.asset_id,
                video_url: h.video_url,
                author: h.author,
                shares: round_shares(h.shares),
                buy_price: round_money(h.cost_basis),
                current_price: round_money(h.current_price),
                current_value: round_money(h.current_value),
                profit_loss: round_money(h.profit_loss),
                profit_loss_percent: round_percent(h.profit_loss_percent),
                views_on_investment: h.views_on_investment,
                likes_on_investment: h.likes_on_investment,
                current_views: h.current_views,
                current_likes: h.current_likes,
                coins_invested: round_money(h.coins_invested),
                invested_at: h.invested_at,
                last_invested_at: h.last_invested_at,
            })
            .collect();

        Self {
            user_id: snapshot.user_id,
            balance: round_money(snapshot.balance),
            total_invested: round_money(snapshot.total_invested),
            total_value: round_money(snapshot.total_value),
            total_profit_loss: round_money(snapshot.total_profit_loss),
            portfolio_value: round_money(portfolio_value),
            investments,
        }
    }
}
