use rust_decimal::Decimal;
use std::sync::Arc;

use crate::error::MarketError;
use crate::models::ledger::Holding;
use crate::models::portfolio::{HoldingValuation, PortfolioSnapshot};
use crate::services::asset_registry::AssetRegistry;
use crate::services::ledger::{AccountSnapshot, Ledger};

/// Values portfolios at live prices. Read-only: never touches ledger state.
#[derive(Clone)]
pub struct PortfolioValuator {
    ledger: Arc<Ledger>,
    registry: Arc<AssetRegistry>,
}

/// current value, profit/loss and profit/loss percent for a position
pub fn value_position(
    shares: Decimal,
    cost_basis: Decimal,
    current_price: Decimal,
) -> (Decimal, Decimal, Decimal) {
    let current_value = shares * current_price;
    let cost = shares * cost_basis;
    let profit_loss = current_value - cost;
    let profit_loss_percent = if cost.is_zero() {
        Decimal::ZERO
    } else {
        profit_loss / cost * Decimal::ONE_HUNDRED
    };

    (current_value, profit_loss, profit_loss_percent)
}

impl PortfolioValuator {
    pub fn new(ledger: Arc<Ledger>, registry: Arc<AssetRegistry>) -> Self {
        Self { ledger, registry }
    }

    pub fn get_portfolio(&self, user_id: &str) -> Result<PortfolioSnapshot, MarketError> {
        let account = self.ledger.snapshot(user_id)?;
        Ok(self.value_account(account))
    }

    pub fn value_account(&self, account: AccountSnapshot) -> PortfolioSnapshot {
        let holdings: Vec<HoldingValuation> = account
            .holdings
            .iter()
            .map(|holding| self.value_holding(&account.user.user_id, holding))
            .collect();

        let total_invested: Decimal = account.holdings.iter().map(Holding::cost).sum();
        let total_value: Decimal = holdings.iter().map(|h| h.current_value).sum();

        PortfolioSnapshot {
            user_id: account.user.user_id,
            username: account.user.username,
            balance: account.user.balance,
            total_invested,
            total_value,
            total_profit_loss: total_value - total_invested,
            holdings,
        }
    }

    fn value_holding(&self, user_id: &str, holding: &Holding) -> HoldingValuation {
        let (current_price, video_url, author, current_engagement) =
            match self.registry.quote(&holding.asset_id) {
                Ok(quote) => (
                    quote.current_price,
                    quote.asset.video_url,
                    quote.asset.author,
                    quote.asset.current_engagement,
                ),
                Err(e) => {
                    // Assets are never removed, so this only happens on a corrupted registry
                    tracing::warn!(
                        user_id = %user_id,
                        asset_id = %holding.asset_id,
                        error = %e,
                        "Valuing holding at cost basis"
                    );
                    (
                        holding.cost_basis,
                        String::new(),
                        "unknown".to_string(),
                        holding.entry_engagement,
                    )
                }
            };

        let (current_value, profit_loss, profit_loss_percent) =
            value_position(holding.shares, holding.cost_basis, current_price);

        HoldingValuation {
            asset_id: holding.asset_id.clone(),
            video_url,
            author,
            shares: holding.shares,
            cost_basis: holding.cost_basis,
            current_price,
            current_value,
            profit_loss,
            profit_loss_percent,
            views_on_investment: holding.entry_engagement.views,
            likes_on_investment: holding.entry_engagement.likes,
            current_views: current_engagement.views,
            current_likes: current_engagement.likes,
            coins_invested: holding.coins_invested,
            invested_at: holding.first_entry_at,
            last_invested_at: holding.last_entry_at,
        }
    }
}
