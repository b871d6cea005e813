//! Time-weighted RIPTE variation (Res. 332/23)
//!
//! Partial months at both ends of the interval are prorated by calendar days,
//! whole months in between contribute their full month-over-month variation,
//! and the contributions are summed. The sum is the statutory method and is
//! not compounded.

use super::resolver::{level, ratio_variation, RateError, Variation};
use crate::indices::{days_in_month, shift_month, IndexStore, MonthKey, PeriodKey, Series};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which RIPTE publication satisfied a weighted request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RipteDataset {
    Canonical,
    Lag1,
    Lag2,
}

impl RipteDataset {
    /// Datasets are tried in this order
    pub const FALLBACK_ORDER: [RipteDataset; 3] =
        [RipteDataset::Canonical, RipteDataset::Lag1, RipteDataset::Lag2];

    pub fn series(&self) -> Series {
        match self {
            RipteDataset::Canonical => Series::Ripte,
            RipteDataset::Lag1 => Series::RipteLag1,
            RipteDataset::Lag2 => Series::RipteLag2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RipteDataset::Canonical => "canonical",
            RipteDataset::Lag1 => "lag-1",
            RipteDataset::Lag2 => "lag-2",
        }
    }
}

impl fmt::Display for RipteDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn month_key(date: NaiveDate) -> PeriodKey {
    PeriodKey::Month(MonthKey::from_date(date))
}

/// First dataset holding both end-point months
fn select_dataset(store: &IndexStore, start: &PeriodKey, end: &PeriodKey) -> Option<RipteDataset> {
    RipteDataset::FALLBACK_ORDER
        .into_iter()
        .find(|d| store.contains(d.series(), start) && store.contains(d.series(), end))
}

/// Month-over-month variation (percent) of the month containing `date`
fn monthly_variation(store: &IndexStore, series: Series, date: NaiveDate) -> Result<Decimal, RateError> {
    let key = month_key(date);
    let prior_key = month_key(shift_month(date, -1));
    let current = level(store, series, key)?;
    let prior = level(store, series, prior_key)?;
    ratio_variation(series, prior_key, prior, current)
}

/// `variation × days / month_days`
fn prorate(series: Series, variation: Decimal, days: u32, month_days: u32) -> Result<Decimal, RateError> {
    variation
        .checked_mul(Decimal::from(days))
        .map(|v| v / Decimal::from(month_days))
        .ok_or(RateError::Overflow { series })
}

fn accumulate(series: Series, total: Decimal, term: Decimal) -> Result<Decimal, RateError> {
    total.checked_add(term).ok_or(RateError::Overflow { series })
}

/// Day-prorated RIPTE variation between `from` and `to`, with lag-dataset fallback
pub fn ripte_weighted(store: &IndexStore, from: NaiveDate, to: NaiveDate) -> Result<Variation, RateError> {
    if from > to {
        return Err(RateError::InvalidInterval { from, to });
    }

    let start_key = month_key(from);
    let end_key = month_key(to);
    let dataset = select_dataset(store, &start_key, &end_key).ok_or_else(|| {
        let key = if store.contains(Series::Ripte, &start_key) {
            end_key
        } else {
            start_key
        };
        RateError::NoData {
            series: Series::Ripte,
            key,
        }
    })?;
    let series = dataset.series();

    // Both ends in one month: a single prorated term over the covered days
    if start_key == end_key && from.year() == to.year() {
        let covered = to.day() - from.day() + 1;
        let percent = prorate(series, monthly_variation(store, series, from)?, covered, days_in_month(from))?;
        return Ok(Variation::from_dataset(percent, dataset));
    }

    let remaining = days_in_month(from) - from.day() + 1;
    let mut total = prorate(series, monthly_variation(store, series, from)?, remaining, days_in_month(from))?;

    let end_month = shift_month(to, 0);
    let mut cursor = shift_month(from, 1);
    while cursor < end_month {
        total = accumulate(series, total, monthly_variation(store, series, cursor)?)?;
        cursor = shift_month(cursor, 1);
    }

    let last = prorate(series, monthly_variation(store, series, to)?, to.day(), days_in_month(to))?;
    total = accumulate(series, total, last)?;

    log::debug!(
        "Weighted RIPTE {} -> {} = {}% using {} dataset",
        from,
        to,
        total,
        dataset
    );

    Ok(Variation::from_dataset(total, dataset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indices::IndexSeries;
    use rust_decimal_macros::dec;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn monthly(series: Series, rows: &[(&str, Decimal)]) -> (Series, IndexSeries) {
        let levels = rows
            .iter()
            .map(|(token, value)| (MonthKey::parse(token).unwrap(), *value));
        (series, IndexSeries::from_levels(series, levels).unwrap())
    }

    /// Canonical RIPTE growing 10% a month from dic-23 through mar-24
    fn canonical_store() -> IndexStore {
        IndexStore::from_series([monthly(
            Series::Ripte,
            &[
                ("dic-23", dec!(100)),
                ("ene-24", dec!(110)),
                ("feb-24", dec!(121)),
                ("mar-24", dec!(133.1)),
            ],
        )])
    }

    fn assert_close(actual: Decimal, expected: Decimal) {
        assert!(
            (actual - expected).abs() < dec!(0.0000001),
            "expected {} got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_weighted_sum_across_months() {
        let store = canonical_store();
        let v = ripte_weighted(&store, day(2024, 1, 17), day(2024, 3, 10)).unwrap();

        // ene: 10% * 15/31, feb: 10% whole, mar: 10% * 10/31
        let expected = dec!(150) / dec!(31) + dec!(10) + dec!(100) / dec!(31);
        assert_close(v.percent, expected);
        assert_eq!(v.dataset, Some(RipteDataset::Canonical));
    }

    #[test]
    fn test_adjacent_months_have_no_whole_month_term() {
        let store = canonical_store();
        let v = ripte_weighted(&store, day(2024, 1, 31), day(2024, 2, 1)).unwrap();

        // ene: 1/31 of 10%, feb: 1/29 of 10% (leap year)
        let expected = dec!(10) / dec!(31) + dec!(10) / dec!(29);
        assert_close(v.percent, expected);
    }

    #[test]
    fn test_sum_is_not_compounded() {
        let store = canonical_store();
        let v = ripte_weighted(&store, day(2024, 1, 1), day(2024, 2, 29)).unwrap();

        // Two full months of 10% add to 20%, not the compounded 21%
        assert_close(v.percent, dec!(20));
    }

    #[test]
    fn test_same_month_single_term() {
        let store = canonical_store();
        let v = ripte_weighted(&store, day(2024, 2, 10), day(2024, 2, 19)).unwrap();
        assert_close(v.percent, dec!(100) / dec!(29));
    }

    #[test]
    fn test_falls_back_to_lag_one() {
        let (_, canonical) = monthly(
            Series::Ripte,
            &[("dic-23", dec!(100)), ("ene-24", dec!(110)), ("feb-24", dec!(121))],
        );
        let store = IndexStore::from_series([
            (Series::Ripte, canonical),
            monthly(
                Series::RipteLag1,
                &[
                    ("dic-23", dec!(100)),
                    ("ene-24", dec!(110)),
                    ("feb-24", dec!(121)),
                    ("mar-24", dec!(133.1)),
                ],
            ),
        ]);

        let v = ripte_weighted(&store, day(2024, 1, 17), day(2024, 3, 10)).unwrap();
        assert_eq!(v.dataset, Some(RipteDataset::Lag1));
        assert_eq!(v.dataset.unwrap().as_str(), "lag-1");
    }

    #[test]
    fn test_falls_back_to_lag_two() {
        let store = IndexStore::from_series([
            monthly(Series::Ripte, &[("dic-23", dec!(100))]),
            monthly(Series::RipteLag1, &[("dic-23", dec!(100)), ("ene-24", dec!(110))]),
            monthly(
                Series::RipteLag2,
                &[("ene-24", dec!(110)), ("feb-24", dec!(121)), ("mar-24", dec!(133.1))],
            ),
        ]);

        let v = ripte_weighted(&store, day(2024, 2, 1), day(2024, 3, 31)).unwrap();
        assert_eq!(v.dataset, Some(RipteDataset::Lag2));
        assert_close(v.percent, dec!(20));
    }

    #[test]
    fn test_no_dataset_has_both_months() {
        let store = canonical_store();
        let err = ripte_weighted(&store, day(2024, 1, 17), day(2024, 4, 10)).unwrap_err();
        assert!(matches!(err, RateError::NoData { .. }));
    }

    #[test]
    fn test_missing_prior_month_aborts() {
        // Endpoints present but the month before the start is not
        let store = IndexStore::from_series([monthly(
            Series::Ripte,
            &[("ene-24", dec!(110)), ("feb-24", dec!(121))],
        )]);
        let err = ripte_weighted(&store, day(2024, 1, 5), day(2024, 2, 5)).unwrap_err();
        assert_eq!(
            err,
            RateError::NoData {
                series: Series::Ripte,
                key: PeriodKey::Month(MonthKey::parse("dic-23").unwrap()),
            }
        );
    }

    #[test]
    fn test_gap_in_whole_months_aborts() {
        let store = IndexStore::from_series([monthly(
            Series::Ripte,
            &[
                ("dic-23", dec!(100)),
                ("ene-24", dec!(110)),
                ("mar-24", dec!(133.1)),
                ("abr-24", dec!(140)),
            ],
        )]);
        let err = ripte_weighted(&store, day(2024, 1, 5), day(2024, 4, 5)).unwrap_err();
        assert!(matches!(err, RateError::NoData { .. }));
    }

    #[test]
    fn test_inverted_interval() {
        let store = canonical_store();
        let err = ripte_weighted(&store, day(2024, 3, 1), day(2024, 2, 1)).unwrap_err();
        assert!(matches!(err, RateError::InvalidInterval { .. }));
    }
}
