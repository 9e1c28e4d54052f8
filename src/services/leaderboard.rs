use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::models::leaderboard::LeaderboardEntry;
use crate::models::round_money;
use crate::services::ledger::Ledger;
use crate::services::portfolio::PortfolioValuator;

/// One user's standing before ranking
#[derive(Debug, Clone)]
pub struct Standing {
    pub user_id: String,
    pub username: String,
    pub portfolio_value: Decimal,
    pub created_at: DateTime<Utc>,
    pub seq: u64,
}

/// Ranks users by total portfolio value, recomputed on every call
#[derive(Clone)]
pub struct LeaderboardAggregator {
    ledger: Arc<Ledger>,
    valuator: PortfolioValuator,
}

impl LeaderboardAggregator {
    pub fn new(ledger: Arc<Ledger>, valuator: PortfolioValuator) -> Self {
        Self { ledger, valuator }
    }

    pub fn get_leaderboard(&self, limit: Option<usize>) -> Vec<LeaderboardEntry> {
        let standings: Vec<Standing> = self
            .ledger
            .snapshots()
            .into_iter()
            .map(|account| {
                let created_at = account.user.created_at;
                let seq = account.user.seq;
                let portfolio = self.valuator.value_account(account);
                Standing {
                    portfolio_value: portfolio.portfolio_value(),
                    user_id: portfolio.user_id,
                    username: portfolio.username,
                    created_at,
                    seq,
                }
            })
            .collect();

        let mut ranked = rank_standings(standings);
        if let Some(limit) = limit {
            ranked.truncate(limit);
        }

        tracing::debug!("Leaderboard computed with {} entries", ranked.len());
        ranked
    }
}

/// Highest value first; ties go to the older account
pub fn rank_standings(mut standings: Vec<Standing>) -> Vec<LeaderboardEntry> {
    standings.sort_by(|a, b| {
        b.portfolio_value
            .cmp(&a.portfolio_value)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.seq.cmp(&b.seq))
    });

    standings
        .into_iter()
        .enumerate()
        .map(|(i, standing)| LeaderboardEntry {
            rank: i + 1,
            user_id: standing.user_id,
            username: standing.username,
            portfolio_value: round_money(standing.portfolio_value),
        })
        .collect()
}
