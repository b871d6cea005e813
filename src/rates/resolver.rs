//! Index-rate dispatch: percentage variation of an index between two dates

use super::weighted::{ripte_weighted, RipteDataset};
use crate::indices::{IndexStore, MonthKey, PeriodKey, Series};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Index used to update an amount between two dates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexKind {
    /// BNA active rate: difference of accumulated levels
    #[default]
    #[serde(rename = "activa")]
    BnaActiva,
    /// BCRA passive rate: ratio of (100 + level)
    #[serde(rename = "pasiva")]
    BcraPasiva,
    /// RIPTE, month-to-month ratio
    #[serde(rename = "ripte")]
    Ripte,
    /// RIPTE prorated by days (Res. 332/23)
    #[serde(rename = "ripte-332")]
    RipteWeighted,
    /// Minimum wage (SMVM)
    #[serde(rename = "smvm")]
    Smvm,
    /// Consumer prices (IPC)
    #[serde(rename = "ipc", alias = "inflacion")]
    Ipc,
    /// CER coefficient, daily
    #[serde(rename = "cer")]
    Cer,
}

impl IndexKind {
    pub const ALL: [IndexKind; 7] = [
        IndexKind::BnaActiva,
        IndexKind::BcraPasiva,
        IndexKind::Ripte,
        IndexKind::RipteWeighted,
        IndexKind::Smvm,
        IndexKind::Ipc,
        IndexKind::Cer,
    ];

    /// Dataset the formula reads (the canonical one for weighted RIPTE)
    pub fn series(&self) -> Series {
        match self {
            IndexKind::BnaActiva => Series::Activa,
            IndexKind::BcraPasiva => Series::Pasiva,
            IndexKind::Ripte | IndexKind::RipteWeighted => Series::Ripte,
            IndexKind::Smvm => Series::Smvm,
            IndexKind::Ipc => Series::Ipc,
            IndexKind::Cer => Series::Cer,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::BnaActiva => "activa",
            IndexKind::BcraPasiva => "pasiva",
            IndexKind::Ripte => "ripte",
            IndexKind::RipteWeighted => "ripte-332",
            IndexKind::Smvm => "smvm",
            IndexKind::Ipc => "ipc",
            IndexKind::Cer => "cer",
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "activa" | "bna-activa" => Ok(IndexKind::BnaActiva),
            "pasiva" | "bcra-pasiva" => Ok(IndexKind::BcraPasiva),
            "ripte" => Ok(IndexKind::Ripte),
            "ripte-332" | "ripte-weighted" | "ripte res. 332/23" => Ok(IndexKind::RipteWeighted),
            "smvm" => Ok(IndexKind::Smvm),
            "ipc" | "inflacion" => Ok(IndexKind::Ipc),
            "cer" => Ok(IndexKind::Cer),
            other => Err(format!("Unknown index: {}", other)),
        }
    }
}

/// Why a variation could not be computed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateError {
    #[error("no {series} level for {key}")]
    NoData { series: Series, key: PeriodKey },

    #[error("invalid interval: {from} is after {to}")]
    InvalidInterval { from: NaiveDate, to: NaiveDate },

    #[error("{series} level at {key} is zero")]
    ZeroBase { series: Series, key: PeriodKey },

    #[error("{series} variation exceeds the decimal range")]
    Overflow { series: Series },
}

/// Percentage variation of an index over an interval (1.5 means 1.5%)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variation {
    pub percent: Decimal,
    /// RIPTE publication used, reported only by the weighted variant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset: Option<RipteDataset>,
}

impl Variation {
    pub fn new(percent: Decimal) -> Self {
        Self { percent, dataset: None }
    }

    pub fn from_dataset(percent: Decimal, dataset: RipteDataset) -> Self {
        Self {
            percent,
            dataset: Some(dataset),
        }
    }
}

pub(crate) fn level(store: &IndexStore, series: Series, key: PeriodKey) -> Result<Decimal, RateError> {
    store.get(series, &key).ok_or(RateError::NoData { series, key })
}

/// ((to / from) - 1) * 100
pub(crate) fn ratio_variation(
    series: Series,
    base_key: PeriodKey,
    base: Decimal,
    to: Decimal,
) -> Result<Decimal, RateError> {
    if base.is_zero() {
        return Err(RateError::ZeroBase { series, key: base_key });
    }
    to.checked_div(base)
        .and_then(|ratio| (ratio - Decimal::ONE).checked_mul(Decimal::ONE_HUNDRED))
        .ok_or(RateError::Overflow { series })
}

fn daily_pair(
    store: &IndexStore,
    series: Series,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<(Decimal, Decimal), RateError> {
    Ok((level(store, series, from.into())?, level(store, series, to.into())?))
}

fn ratio_by_date(store: &IndexStore, series: Series, from: NaiveDate, to: NaiveDate) -> Result<Variation, RateError> {
    let (start, end) = daily_pair(store, series, from, to)?;
    ratio_variation(series, from.into(), start, end).map(Variation::new)
}

fn ratio_by_month(store: &IndexStore, series: Series, from: NaiveDate, to: NaiveDate) -> Result<Variation, RateError> {
    let from_key = PeriodKey::Month(MonthKey::from_date(from));
    let to_key = PeriodKey::Month(MonthKey::from_date(to));
    let start = level(store, series, from_key)?;
    let end = level(store, series, to_key)?;
    ratio_variation(series, from_key, start, end).map(Variation::new)
}

/// Percentage variation of `kind` between `from` and `to`.
///
/// Missing levels are reported as [`RateError::NoData`]; a missing point is
/// never read as a zero variation.
pub fn resolve(store: &IndexStore, kind: IndexKind, from: NaiveDate, to: NaiveDate) -> Result<Variation, RateError> {
    if from > to {
        return Err(RateError::InvalidInterval { from, to });
    }

    match kind {
        // Level difference, not a ratio: the BNA series is published as an accumulated rate
        IndexKind::BnaActiva => {
            let (start, end) = daily_pair(store, Series::Activa, from, to)?;
            Ok(Variation::new(end - start))
        }
        IndexKind::BcraPasiva => {
            let (start, end) = daily_pair(store, Series::Pasiva, from, to)?;
            let shift = |level: Decimal| {
                Decimal::ONE_HUNDRED
                    .checked_add(level)
                    .ok_or(RateError::Overflow { series: Series::Pasiva })
            };
            ratio_variation(Series::Pasiva, from.into(), shift(start)?, shift(end)?).map(Variation::new)
        }
        IndexKind::Ripte => ratio_by_month(store, Series::Ripte, from, to),
        IndexKind::RipteWeighted => ripte_weighted(store, from, to),
        IndexKind::Smvm => ratio_by_month(store, Series::Smvm, from, to),
        IndexKind::Ipc => ratio_by_month(store, Series::Ipc, from, to),
        IndexKind::Cer => ratio_by_date(store, Series::Cer, from, to),
    }
}

/// Resolver bound to one index snapshot
#[derive(Debug, Clone, Copy)]
pub struct RateResolver<'a> {
    store: &'a IndexStore,
}

impl<'a> RateResolver<'a> {
    pub fn new(store: &'a IndexStore) -> Self {
        Self { store }
    }

    pub fn resolve(&self, kind: IndexKind, from: NaiveDate, to: NaiveDate) -> Result<Variation, RateError> {
        resolve(self.store, kind, from, to)
    }

    pub fn store(&self) -> &'a IndexStore {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indices::IndexSeries;
    use rust_decimal_macros::dec;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily(series: Series, rows: &[(NaiveDate, Decimal)]) -> (Series, IndexSeries) {
        (series, IndexSeries::from_levels(series, rows.iter().copied()).unwrap())
    }

    fn monthly(series: Series, rows: &[(&str, Decimal)]) -> (Series, IndexSeries) {
        let levels = rows
            .iter()
            .map(|(token, value)| (MonthKey::parse(token).unwrap(), *value));
        (series, IndexSeries::from_levels(series, levels).unwrap())
    }

    fn test_store() -> IndexStore {
        IndexStore::from_series([
            daily(Series::Activa, &[(day(2024, 1, 1), dec!(250)), (day(2024, 2, 1), dec!(257.5))]),
            daily(Series::Pasiva, &[(day(2024, 1, 1), dec!(10)), (day(2024, 2, 1), dec!(12))]),
            daily(Series::Cer, &[(day(2024, 1, 1), dec!(200)), (day(2024, 2, 1), dec!(210))]),
            monthly(Series::Ripte, &[("ene-24", dec!(400)), ("mar-24", dec!(440))]),
            monthly(Series::Smvm, &[("ene-24", dec!(0)), ("feb-24", dec!(180000))]),
            monthly(Series::Ipc, &[("ene-24", dec!(4000)), ("feb-24", dec!(4500))]),
        ])
    }

    #[test]
    fn test_activa_is_level_difference() {
        // Accumulated-rate series: the variation is to - from, never to / from
        let v = resolve(&test_store(), IndexKind::BnaActiva, day(2024, 1, 1), day(2024, 2, 1)).unwrap();
        assert_eq!(v.percent, dec!(7.5));
        assert_eq!(v.dataset, None);
    }

    #[test]
    fn test_pasiva_formula() {
        let v = resolve(&test_store(), IndexKind::BcraPasiva, day(2024, 1, 1), day(2024, 2, 1)).unwrap();
        let expected = (dec!(112) / dec!(110) - Decimal::ONE) * dec!(100);
        assert_eq!(v.percent, expected);
        assert!((v.percent - dec!(1.818)).abs() < dec!(0.001));
    }

    #[test]
    fn test_monthly_ratio_ignores_day_of_month() {
        let store = test_store();
        let a = resolve(&store, IndexKind::Ripte, day(2024, 1, 3), day(2024, 3, 28)).unwrap();
        let b = resolve(&store, IndexKind::Ripte, day(2024, 1, 31), day(2024, 3, 1)).unwrap();
        assert_eq!(a.percent, dec!(10));
        assert_eq!(a, b);

        let ipc = resolve(&store, IndexKind::Ipc, day(2024, 1, 15), day(2024, 2, 15)).unwrap();
        assert_eq!(ipc.percent, dec!(12.5));
    }

    #[test]
    fn test_cer_keyed_by_exact_date() {
        let store = test_store();
        let v = resolve(&store, IndexKind::Cer, day(2024, 1, 1), day(2024, 2, 1)).unwrap();
        assert_eq!(v.percent, dec!(5));

        let err = resolve(&store, IndexKind::Cer, day(2024, 1, 2), day(2024, 2, 1)).unwrap_err();
        assert_eq!(
            err,
            RateError::NoData {
                series: Series::Cer,
                key: day(2024, 1, 2).into()
            }
        );
    }

    #[test]
    fn test_missing_key_is_no_data_for_every_kind() {
        let store = test_store();
        for kind in IndexKind::ALL {
            let result = resolve(&store, kind, day(2030, 1, 1), day(2030, 2, 1));
            assert!(
                matches!(result, Err(RateError::NoData { .. })),
                "{} returned {:?}",
                kind,
                result
            );
        }
    }

    #[test]
    fn test_zero_base_is_not_a_variation() {
        let err = resolve(&test_store(), IndexKind::Smvm, day(2024, 1, 10), day(2024, 2, 10)).unwrap_err();
        assert!(matches!(err, RateError::ZeroBase { .. }));
    }

    #[test]
    fn test_out_of_range_ratio_is_overflow() {
        let store = IndexStore::from_series([monthly(
            Series::Ipc,
            &[("ene-24", dec!(0.5)), ("feb-24", Decimal::MAX)],
        )]);
        let err = resolve(&store, IndexKind::Ipc, day(2024, 1, 10), day(2024, 2, 10)).unwrap_err();
        assert_eq!(err, RateError::Overflow { series: Series::Ipc });

        let store = IndexStore::from_series([daily(
            Series::Pasiva,
            &[(day(2024, 1, 1), dec!(10)), (day(2024, 2, 1), Decimal::MAX)],
        )]);
        let err = resolve(&store, IndexKind::BcraPasiva, day(2024, 1, 1), day(2024, 2, 1)).unwrap_err();
        assert_eq!(err, RateError::Overflow { series: Series::Pasiva });
    }

    #[test]
    fn test_inverted_interval_for_every_kind() {
        let store = test_store();
        for kind in IndexKind::ALL {
            let result = resolve(&store, kind, day(2024, 2, 1), day(2024, 1, 1));
            assert!(matches!(result, Err(RateError::InvalidInterval { .. })));
        }
    }

    #[test]
    fn test_same_date_is_zero_variation() {
        let v = resolve(&test_store(), IndexKind::BcraPasiva, day(2024, 1, 1), day(2024, 1, 1)).unwrap();
        assert!(v.percent.is_zero());
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let store = test_store();
        let resolver = RateResolver::new(&store);
        for kind in [IndexKind::BnaActiva, IndexKind::BcraPasiva, IndexKind::Cer, IndexKind::Ipc] {
            let first = resolver.resolve(kind, day(2024, 1, 1), day(2024, 2, 1));
            let second = resolver.resolve(kind, day(2024, 1, 1), day(2024, 2, 1));
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_parse_index_tags() {
        assert_eq!("activa".parse::<IndexKind>().unwrap(), IndexKind::BnaActiva);
        assert_eq!("RIPTE Res. 332/23".parse::<IndexKind>().unwrap(), IndexKind::RipteWeighted);
        assert_eq!("inflacion".parse::<IndexKind>().unwrap(), IndexKind::Ipc);
        assert!("libor".parse::<IndexKind>().is_err());

        let kind: IndexKind = serde_json::from_str("\"ripte-332\"").unwrap();
        assert_eq!(kind, IndexKind::RipteWeighted);
    }
}
