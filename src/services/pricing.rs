use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal_macros::dec;

use crate::models::asset::Engagement;

/// Price curve applied to an engagement snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PricingStrategy {
    /// base + vw * ln(1 + views) + lw * ln(1 + likes)
    Logarithmic,
    /// base + vw * views + lw * likes
    Linear,
}

impl PricingStrategy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "logarithmic" | "log" => Some(PricingStrategy::Logarithmic),
            "linear" => Some(PricingStrategy::Linear),
            _ => None,
        }
    }

    pub fn default_params(&self) -> PricingParams {
        match self {
            PricingStrategy::Logarithmic => PricingParams {
                base: Decimal::ZERO,
                views_weight: dec!(1.0),
                likes_weight: dec!(2.0),
                floor: dec!(0.01),
            },
            // views / 1000
            PricingStrategy::Linear => PricingParams {
                base: Decimal::ZERO,
                views_weight: dec!(0.001),
                likes_weight: Decimal::ZERO,
                floor: dec!(0.01),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingParams {
    pub base: Decimal,
    pub views_weight: Decimal,
    pub likes_weight: Decimal,
    /// Minimum price, keeps every asset strictly positive
    pub floor: Decimal,
}

/// Deterministic engagement -> price mapping.
///
/// Weights and base are non-negative, so the price never drops when views or likes grow.
#[derive(Debug, Clone)]
pub struct PricingFunction {
    strategy: PricingStrategy,
    params: PricingParams,
}

/// Decimal places kept by the logarithmic curve
const LOG_PRICE_DP: u32 = 4;

impl PricingFunction {
    pub fn new(
        strategy: PricingStrategy,
        params: PricingParams,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        if params.floor <= Decimal::ZERO {
            return Err(format!("Price floor must be positive, got {}", params.floor).into());
        }
        if params.base < Decimal::ZERO
            || params.views_weight < Decimal::ZERO
            || params.likes_weight < Decimal::ZERO
        {
            return Err(format!(
                "Pricing base and weights must be non-negative (base={}, views_weight={}, likes_weight={})",
                params.base, params.views_weight, params.likes_weight
            )
            .into());
        }

        tracing::debug!(
            "Pricing: {:?} base={} views_weight={} likes_weight={} floor={}",
            strategy,
            params.base,
            params.views_weight,
            params.likes_weight,
            params.floor
        );

        Ok(Self { strategy, params })
    }

    pub fn with_defaults(strategy: PricingStrategy) -> Self {
        Self {
            strategy,
            params: strategy.default_params(),
        }
    }

    pub fn strategy(&self) -> PricingStrategy {
        self.strategy
    }

    pub fn price(&self, engagement: &Engagement) -> Decimal {
        let raw = match self.strategy {
            PricingStrategy::Linear => self.linear_price(engagement),
            PricingStrategy::Logarithmic => self.logarithmic_price(engagement),
        };

        raw.max(self.params.floor)
    }

    fn linear_price(&self, engagement: &Engagement) -> Decimal {
        self.weighted_sum(
            Decimal::from(engagement.views),
            Decimal::from(engagement.likes),
        )
    }

    fn logarithmic_price(&self, engagement: &Engagement) -> Decimal {
        // ln_1p keeps zero engagement at exactly zero contribution
        let views_term = (engagement.views as f64).ln_1p();
        let likes_term = (engagement.likes as f64).ln_1p();

        let views_term = Decimal::from_f64(views_term).unwrap_or(Decimal::ZERO);
        let likes_term = Decimal::from_f64(likes_term).unwrap_or(Decimal::ZERO);

        self.weighted_sum(views_term, likes_term)
            .round_dp(LOG_PRICE_DP)
    }

    /// base + views_weight * views + likes_weight * likes, saturating at `Decimal::MAX`.
    /// All operands are non-negative, so saturation keeps the curve monotone.
    fn weighted_sum(&self, views: Decimal, likes: Decimal) -> Decimal {
        views
            .checked_mul(self.params.views_weight)
            .and_then(|v| likes.checked_mul(self.params.likes_weight).and_then(|l| v.checked_add(l)))
            .and_then(|sum| sum.checked_add(self.params.base))
            .unwrap_or(Decimal::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_from_str() {
        assert_eq!(
            PricingStrategy::from_str("Logarithmic"),
            Some(PricingStrategy::Logarithmic)
        );
        assert_eq!(PricingStrategy::from_str("linear"), Some(PricingStrategy::Linear));
        assert_eq!(PricingStrategy::from_str("quadratic"), None);
    }

    #[test]
    fn test_linear_matches_views_per_thousand() {
        let pricing = PricingFunction::with_defaults(PricingStrategy::Linear);
        assert_eq!(pricing.price(&Engagement::new(10_000, 0)), dec!(10));
        assert_eq!(pricing.price(&Engagement::new(20_000, 999)), dec!(20));
    }

    #[test]
    fn test_floor_applies_to_zero_engagement() {
        for strategy in [PricingStrategy::Linear, PricingStrategy::Logarithmic] {
            let pricing = PricingFunction::with_defaults(strategy);
            assert_eq!(pricing.price(&Engagement::new(0, 0)), dec!(0.01));
        }
    }

    #[test]
    fn test_logarithmic_is_deterministic() {
        let pricing = PricingFunction::with_defaults(PricingStrategy::Logarithmic);
        let engagement = Engagement::new(1_234_567, 89_012);
        assert_eq!(pricing.price(&engagement), pricing.price(&engagement));
        assert!(pricing.price(&engagement) > dec!(30));
    }

    #[test]
    fn test_price_is_monotone_in_views_and_likes() {
        let counts = [0u64, 1, 9, 10, 738, 1_000, 125_000, 297_000, 10_000_000, u64::MAX / 2];

        for strategy in [PricingStrategy::Linear, PricingStrategy::Logarithmic] {
            let pricing = PricingFunction::with_defaults(strategy);
            for &views in &counts {
                for pair in counts.windows(2) {
                    let lower = pricing.price(&Engagement::new(views, pair[0]));
                    let higher = pricing.price(&Engagement::new(views, pair[1]));
                    assert!(higher >= lower, "{:?}: likes {:?} at views {}", strategy, pair, views);

                    let lower = pricing.price(&Engagement::new(pair[0], views));
                    let higher = pricing.price(&Engagement::new(pair[1], views));
                    assert!(higher >= lower, "{:?}: views {:?} at likes {}", strategy, pair, views);
                }
            }
        }
    }

    #[test]
    fn test_huge_weights_saturate_instead_of_overflowing() {
        let params = PricingParams {
            base: Decimal::MAX,
            views_weight: dec!(1000000000000000000000),
            likes_weight: dec!(1000000000000000000000),
            floor: dec!(0.01),
        };
        let pricing = PricingFunction::new(PricingStrategy::Linear, params).unwrap();

        let max = Engagement::new(i64::MAX as u64, i64::MAX as u64);
        assert_eq!(pricing.price(&max), Decimal::MAX);
        assert!(pricing.price(&max) >= pricing.price(&Engagement::new(1, 1)));

        let pricing = PricingFunction::new(PricingStrategy::Logarithmic, params).unwrap();
        assert_eq!(pricing.price(&Engagement::new(u64::MAX, u64::MAX)), Decimal::MAX);
    }

    #[test]
    fn test_rejects_invalid_params() {
        let mut params = PricingStrategy::Linear.default_params();
        params.floor = Decimal::ZERO;
        assert!(PricingFunction::new(PricingStrategy::Linear, params).is_err());

        let mut params = PricingStrategy::Logarithmic.default_params();
        params.likes_weight = dec!(-1);
        assert!(PricingFunction::new(PricingStrategy::Logarithmic, params).is_err());
    }
}
