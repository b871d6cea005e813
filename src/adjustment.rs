//! Index adjustment of statutory amounts
//!
//! A minimum published at one date is brought forward to a later date by the
//! variation of the selected index. The updated value is what gets compared
//! against the computed compensation; the carried base is what later
//! calculations start from.

use crate::indices::IndexStore;
use crate::rates::{resolve, IndexKind, RateError, RipteDataset};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Outcome of bringing an amount forward between two dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustedAmount {
    pub base: Decimal,
    /// base + interest
    pub comparison_value: Decimal,
    /// Amount later calculations start from
    pub carried_base: Decimal,
    /// Interest left outside the carried base (zero when capitalized)
    pub uncapitalized_interest: Decimal,
    /// Index variation applied, in percent. None when nothing was applied.
    pub rate: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset: Option<RipteDataset>,
    pub applied: bool,
}

impl AdjustedAmount {
    /// The base unchanged
    pub fn unadjusted(base: Decimal) -> Self {
        Self {
            base,
            comparison_value: base,
            carried_base: base,
            uncapitalized_interest: Decimal::ZERO,
            rate: None,
            dataset: None,
            applied: false,
        }
    }

    pub fn interest(&self) -> Decimal {
        self.comparison_value - self.base
    }
}

/// Update `base` from `from` to `to` by the variation of `kind`.
///
/// `capitalize` folds the interest into the carried base; otherwise it is
/// reported separately. When `from >= to` the base is returned unchanged.
pub fn adjust_amount(
    store: &IndexStore,
    kind: IndexKind,
    base: Decimal,
    from: NaiveDate,
    to: NaiveDate,
    capitalize: bool,
) -> Result<AdjustedAmount, RateError> {
    if from >= to {
        return Ok(AdjustedAmount::unadjusted(base));
    }

    let variation = resolve(store, kind, from, to)?;
    let (interest, updated) = base
        .checked_mul(variation.percent)
        .map(|scaled| scaled / Decimal::ONE_HUNDRED)
        .and_then(|interest| Some((interest, base.checked_add(interest)?)))
        .ok_or(RateError::Overflow { series: kind.series() })?;

    log::debug!(
        "Adjusted {} by {} {}% from {} to {} (capitalize={})",
        base,
        kind,
        variation.percent,
        from,
        to,
        capitalize
    );

    let (carried_base, uncapitalized_interest) = if capitalize {
        (updated, Decimal::ZERO)
    } else {
        (base, interest)
    };

    Ok(AdjustedAmount {
        base,
        comparison_value: updated,
        carried_base,
        uncapitalized_interest,
        rate: Some(variation.percent),
        dataset: variation.dataset,
        applied: true,
    })
}
