//! Depreciation calculator.
//!
//! Straight-line only. Daily granularity uses a 30-day month for every
//! calendar month; changing that would alter historical amounts.

use homeledger_shared::types::Money;
use rust_decimal::Decimal;

use super::types::{Asset, DepreciationMethod, DepreciationScheduleItem, Granularity};

/// Days per month under the daily convention.
pub const DAYS_PER_MONTH: u32 = 30;

/// Depreciation calculator.
pub struct DepreciationCalculator;

impl DepreciationCalculator {
    /// `original_cost * (1 - residual_rate / 100)`, truncated to the cent.
    #[must_use]
    pub fn depreciable_base(original_cost: Money, residual_rate: Decimal) -> Money {
        original_cost.mul_rate_trunc(Decimal::ONE - residual_rate / Decimal::ONE_HUNDRED)
    }

    /// Value the net book value never drops below.
    #[must_use]
    pub fn residual_value(original_cost: Money, residual_rate: Decimal) -> Money {
        original_cost - Self::depreciable_base(original_cost, residual_rate)
    }

    /// Number of periods in the useful life.
    #[must_use]
    pub fn total_periods(useful_life_months: u32, granularity: Granularity) -> u32 {
        match granularity {
            Granularity::Monthly => useful_life_months,
            Granularity::Daily => useful_life_months.saturating_mul(DAYS_PER_MONTH),
        }
    }

    /// Depreciable base of an asset.
    #[must_use]
    pub fn base_of(asset: &Asset) -> Money {
        Self::depreciable_base(asset.original_cost, asset.residual_rate)
    }

    /// Regular per-period amount, truncated to the cent. Zero for `none`.
    #[must_use]
    pub fn period_amount(asset: &Asset) -> Money {
        match asset.depreciation_method {
            DepreciationMethod::None => Money::ZERO,
            DepreciationMethod::StraightLine => {
                let periods = Self::total_periods(asset.useful_life_months, asset.depreciation_granularity);
                Self::base_of(asset).div_trunc(i64::from(periods))
            }
        }
    }

    /// Amount for a 1-based period given what is already accumulated.
    ///
    /// The last period of the useful life takes the exact remainder; no
    /// period takes more than what remains of the base.
    #[must_use]
    pub fn amount_for_period(asset: &Asset, period: u32, accumulated: Money) -> Money {
        if asset.depreciation_method == DepreciationMethod::None {
            return Money::ZERO;
        }
        let remaining = (Self::base_of(asset) - accumulated).max(Money::ZERO);
        let periods = Self::total_periods(asset.useful_life_months, asset.depreciation_granularity);
        if period >= periods {
            remaining
        } else {
            Self::period_amount(asset).min(remaining)
        }
    }

    /// Projected schedule over the whole useful life. Empty for `none`.
    #[must_use]
    pub fn schedule(asset: &Asset) -> Vec<DepreciationScheduleItem> {
        if asset.depreciation_method == DepreciationMethod::None {
            return Vec::new();
        }
        let periods = Self::total_periods(asset.useful_life_months, asset.depreciation_granularity);
        let mut accumulated = Money::ZERO;
        (1..=periods)
            .map(|period| {
                let amount = Self::amount_for_period(asset, period, accumulated);
                accumulated += amount;
                DepreciationScheduleItem {
                    period,
                    amount,
                    accumulated,
                    net_book_value: asset.original_cost - accumulated,
                }
            })
            .collect()
    }
}
