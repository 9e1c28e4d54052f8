//! Ledger
//!
//! Per-user balances, holdings and the investment audit trail.
//!
//! Every account sits behind its own mutex. `invest` holds that mutex from the
//! balance check through the commit, so two buys by the same user can never
//! both pass the check. The critical section has no await points, which makes
//! the commit all-or-nothing even when the calling request is cancelled.
//! Accounts of different users never contend with each other.

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use crate::error::MarketError;
use crate::models::ledger::{Holding, InvestmentResult, InvestmentTransaction, User};
use crate::services::asset_registry::AssetRegistry;

struct Account {
    user: User,
    holdings: HashMap<String, Holding>,
    transactions: Vec<InvestmentTransaction>,
}

/// Consistent copy of one account, taken under its lock
#[derive(Debug, Clone)]
pub struct AccountSnapshot {
    pub user: User,
    /// Ordered by first entry
    pub holdings: Vec<Holding>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LedgerSummary {
    pub users: usize,
    pub holdings: usize,
    pub transactions: usize,
    pub coins_invested: Decimal,
}

pub struct Ledger {
    accounts: RwLock<HashMap<String, Arc<Mutex<Account>>>>,
    registry: Arc<AssetRegistry>,
    starting_balance: Decimal,
    next_seq: AtomicU64,
}

impl Ledger {
    pub fn new(registry: Arc<AssetRegistry>, starting_balance: Decimal) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            registry,
            starting_balance,
            next_seq: AtomicU64::new(0),
        }
    }

    /// Open an account with the starting grant
    pub fn create_user(&self, user_id: &str, username: Option<&str>) -> Result<User, MarketError> {
        self.open_account(user_id, username, self.starting_balance)
    }

    /// Open an account with an explicit balance (demo accounts)
    pub fn seed_user(&self, user_id: &str, balance: Decimal) -> Result<User, MarketError> {
        if balance < Decimal::ZERO {
            return Err(MarketError::InvalidAmount(format!(
                "starting balance for {} must not be negative, got {}",
                user_id, balance
            )));
        }
        self.open_account(user_id, None, balance)
    }

    fn open_account(
        &self,
        user_id: &str,
        username: Option<&str>,
        balance: Decimal,
    ) -> Result<User, MarketError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(MarketError::InvalidUserId("user id must not be empty".to_string()));
        }

        let mut accounts = self.accounts.write();
        match accounts.entry(user_id.to_string()) {
            Entry::Occupied(_) => Err(MarketError::UserAlreadyExists(user_id.to_string())),
            Entry::Vacant(slot) => {
                let user = User {
                    user_id: user_id.to_string(),
                    username: username
                        .map(str::trim)
                        .filter(|name| !name.is_empty())
                        .unwrap_or(user_id)
                        .to_string(),
                    balance,
                    created_at: Utc::now(),
                    seq: self.next_seq.fetch_add(1, Ordering::SeqCst),
                };

                slot.insert(Arc::new(Mutex::new(Account {
                    user: user.clone(),
                    holdings: HashMap::new(),
                    transactions: Vec::new(),
                })));

                info!(user_id = %user.user_id, balance = %user.balance, "Account opened");
                Ok(user)
            }
        }
    }

    fn account(&self, user_id: &str) -> Result<Arc<Mutex<Account>>, MarketError> {
        self.accounts
            .read()
            .get(user_id)
            .cloned()
            .ok_or_else(|| MarketError::UserNotFound(user_id.to_string()))
    }

    /// Buy `coin_amount` worth of shares of `asset_id` at the current price
    pub fn invest(
        &self,
        user_id: &str,
        asset_id: &str,
        coin_amount: Decimal,
    ) -> Result<InvestmentResult, MarketError> {
        if coin_amount <= Decimal::ZERO {
            return Err(MarketError::InvalidAmount(format!(
                "amount must be positive, got {}",
                coin_amount
            )));
        }

        let account = self.account(user_id)?;
        let mut account = account.lock();

        if account.user.balance < coin_amount {
            warn!(
                user_id = %user_id,
                balance = %account.user.balance,
                required = %coin_amount,
                "Investment rejected: insufficient funds"
            );
            return Err(MarketError::InsufficientFunds {
                balance: account.user.balance,
                required: coin_amount,
            });
        }

        let quote = self.registry.quote(asset_id)?;
        let entry_price = quote.current_price;
        let shares = coin_amount
            .checked_div(entry_price)
            .filter(|shares| !shares.is_zero())
            .ok_or_else(|| {
                MarketError::InvalidAmount(format!(
                    "{} coins buys no shares at price {}",
                    coin_amount, entry_price
                ))
            })?;

        let tx = InvestmentTransaction {
            investment_id: format!("inv_{}", uuid::Uuid::new_v4().simple()),
            user_id: account.user.user_id.clone(),
            asset_id: asset_id.to_string(),
            coins_spent: coin_amount,
            entry_price,
            shares_purchased: shares,
            timestamp: Utc::now(),
        };
        let holding = Holding::apply(
            account.holdings.get(asset_id),
            &tx,
            quote.asset.current_engagement,
        );

        // Commit: nothing below can fail
        account.user.balance -= coin_amount;
        account.holdings.insert(asset_id.to_string(), holding);
        account.transactions.push(tx.clone());

        info!(
            user_id = %user_id,
            asset_id = %asset_id,
            investment_id = %tx.investment_id,
            coins = %coin_amount,
            entry_price = %entry_price,
            shares = %shares,
            new_balance = %account.user.balance,
            "Investment committed"
        );

        Ok(InvestmentResult {
            investment_id: tx.investment_id,
            shares_purchased: shares,
            entry_price,
            total_cost: coin_amount,
            new_balance: account.user.balance,
        })
    }

    pub fn snapshot(&self, user_id: &str) -> Result<AccountSnapshot, MarketError> {
        let account = self.account(user_id)?;
        let account = account.lock();
        Ok(snapshot_of(&account))
    }

    /// Snapshot of every account. Each one is individually consistent.
    pub fn snapshots(&self) -> Vec<AccountSnapshot> {
        let handles: Vec<Arc<Mutex<Account>>> = self.accounts.read().values().cloned().collect();

        handles
            .iter()
            .map(|account| snapshot_of(&account.lock()))
            .collect()
    }

    /// Audit trail of a user's buys, oldest first
    pub fn transactions(&self, user_id: &str) -> Result<Vec<InvestmentTransaction>, MarketError> {
        let account = self.account(user_id)?;
        let transactions = account.lock().transactions.clone();
        Ok(transactions)
    }

    pub fn summary(&self) -> LedgerSummary {
        let handles: Vec<Arc<Mutex<Account>>> = self.accounts.read().values().cloned().collect();

        let mut summary = LedgerSummary {
            users: handles.len(),
            ..LedgerSummary::default()
        };
        for account in handles {
            let account = account.lock();
            summary.holdings += account.holdings.len();
            summary.transactions += account.transactions.len();
            summary.coins_invested += account
                .transactions
                .iter()
                .map(|tx| tx.coins_spent)
                .sum::<Decimal>();
        }

        debug!(?summary, "Ledger summary computed");
        summary
    }
}

fn snapshot_of(account: &Account) -> AccountSnapshot {
    let mut holdings: Vec<Holding> = account.holdings.values().cloned().collect();
    holdings.sort_by(|a, b| {
        a.first_entry_at
            .cmp(&b.first_entry_at)
            .then_with(|| a.asset_id.cmp(&b.asset_id))
    });

    AccountSnapshot {
        user: account.user.clone(),
        holdings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::{ScrapedVideo, VideoScraper};
    use crate::services::pricing::{PricingFunction, PricingStrategy};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    /// Reports `views` from the path segment after "/views/"
    struct PathScraper;

    #[async_trait]
    impl VideoScraper for PathScraper {
        async fn scrape(&self, video_url: &str) -> Result<ScrapedVideo, MarketError> {
            let views = video_url
                .rsplit("/views/")
                .next()
                .and_then(|v| v.parse().ok());
            Ok(ScrapedVideo {
                video_id: None,
                author: "bob".to_string(),
                views,
                likes: Some(0),
                canonical_url: None,
            })
        }
    }

    async fn setup(views: u64) -> (Ledger, Arc<AssetRegistry>, String) {
        let registry = Arc::new(AssetRegistry::new(
            Arc::new(PathScraper),
            PricingFunction::with_defaults(PricingStrategy::Linear),
            Duration::from_secs(5),
        ));
        let quote = registry
            .register_or_get(&format!("https://example.com/video/1/views/{}", views))
            .await
            .unwrap();
        let ledger = Ledger::new(registry.clone(), dec!(1000.00));
        ledger.create_user("user1", Some("Bob")).unwrap();
        (ledger, registry, quote.asset.asset_id)
    }

    #[tokio::test]
    async fn test_invest_scenario() {
        let (ledger, registry, asset_id) = setup(10_000).await;

        let result = ledger.invest("user1", &asset_id, dec!(100)).unwrap();
        assert_eq!(result.shares_purchased, dec!(10));
        assert_eq!(result.entry_price, dec!(10));
        assert_eq!(result.total_cost, dec!(100));
        assert_eq!(result.new_balance, dec!(900));

        // Price doubles, second buy averages the basis
        registry
            .update_engagement(&asset_id, Some(20_000), Some(0))
            .unwrap();
        let result = ledger.invest("user1", &asset_id, dec!(50)).unwrap();
        assert_eq!(result.shares_purchased, dec!(2.5));
        assert_eq!(result.new_balance, dec!(850));

        let snapshot = ledger.snapshot("user1").unwrap();
        assert_eq!(snapshot.holdings.len(), 1);
        assert_eq!(snapshot.holdings[0].shares, dec!(12.5));
        assert_eq!(snapshot.holdings[0].cost_basis, dec!(12));
        assert_eq!(ledger.transactions("user1").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_insufficient_funds_leaves_state_unchanged() {
        let (ledger, _registry, asset_id) = setup(10_000).await;
        ledger.invest("user1", &asset_id, dec!(100)).unwrap();

        let err = ledger.invest("user1", &asset_id, dec!(2000)).unwrap_err();
        assert_eq!(
            err,
            MarketError::InsufficientFunds {
                balance: dec!(900),
                required: dec!(2000)
            }
        );

        let snapshot = ledger.snapshot("user1").unwrap();
        assert_eq!(snapshot.user.balance, dec!(900));
        assert_eq!(snapshot.holdings[0].shares, dec!(10));
        assert_eq!(ledger.transactions("user1").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_non_positive_amounts() {
        let (ledger, _registry, asset_id) = setup(10_000).await;
        for amount in [dec!(0), dec!(-5)] {
            assert!(matches!(
                ledger.invest("user1", &asset_id, amount),
                Err(MarketError::InvalidAmount(_))
            ));
        }
        assert_eq!(ledger.snapshot("user1").unwrap().user.balance, dec!(1000));
    }

    #[tokio::test]
    async fn test_unknown_user_and_asset() {
        let (ledger, _registry, asset_id) = setup(10_000).await;
        assert!(matches!(
            ledger.invest("ghost", &asset_id, dec!(10)),
            Err(MarketError::UserNotFound(_))
        ));
        assert!(matches!(
            ledger.invest("user1", "asset_missing", dec!(10)),
            Err(MarketError::AssetNotFound(_))
        ));
        assert_eq!(ledger.snapshot("user1").unwrap().user.balance, dec!(1000));
    }

    #[tokio::test]
    async fn test_dust_amount_buying_no_shares_is_rejected() {
        let (ledger, _registry, asset_id) = setup(10_000).await;
        let dust = dec!(0.0000000000000000000000000001);

        for _ in 0..2 {
            assert!(matches!(
                ledger.invest("user1", &asset_id, dust),
                Err(MarketError::InvalidAmount(_))
            ));
        }

        let snapshot = ledger.snapshot("user1").unwrap();
        assert_eq!(snapshot.user.balance, dec!(1000));
        assert!(snapshot.holdings.is_empty());
        assert!(ledger.transactions("user1").unwrap().is_empty());

        // A normal buy afterwards still works
        let result = ledger.invest("user1", &asset_id, dec!(10)).unwrap();
        assert_eq!(result.shares_purchased, dec!(1));
    }

    #[tokio::test]
    async fn test_spending_entire_balance() {
        let (ledger, _registry, asset_id) = setup(3_000).await;
        let result = ledger.invest("user1", &asset_id, dec!(1000)).unwrap();
        assert_eq!(result.new_balance, dec!(0));
        assert!(matches!(
            ledger.invest("user1", &asset_id, dec!(0.01)),
            Err(MarketError::InsufficientFunds { .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_user_rejected() {
        let (ledger, _registry, _asset_id) = setup(10_000).await;
        assert_eq!(
            ledger.create_user("user1", None).unwrap_err(),
            MarketError::UserAlreadyExists("user1".to_string())
        );

        let user = ledger.create_user("amy", None).unwrap();
        assert_eq!(user.username, "amy");
        assert_eq!(user.balance, dec!(1000));
        assert!(user.seq > 0);
        assert_eq!(ledger.summary().users, 2);

        assert!(matches!(
            ledger.create_user("   ", None),
            Err(MarketError::InvalidUserId(_))
        ));
    }

    #[tokio::test]
    async fn test_seed_user_balance() {
        let (ledger, _registry, _asset_id) = setup(10_000).await;
        let user = ledger.seed_user("testuser", dec!(5000)).unwrap();
        assert_eq!(user.balance, dec!(5000));
        assert!(ledger.seed_user("broke", dec!(-1)).is_err());
    }

    #[tokio::test]
    async fn test_summary() {
        let (ledger, _registry, asset_id) = setup(10_000).await;
        ledger.invest("user1", &asset_id, dec!(100)).unwrap();
        ledger.invest("user1", &asset_id, dec!(25)).unwrap();

        let summary = ledger.summary();
        assert_eq!(summary.users, 1);
        assert_eq!(summary.holdings, 1);
        assert_eq!(summary.transactions, 2);
        assert_eq!(summary.coins_invested, dec!(125));
    }
}
