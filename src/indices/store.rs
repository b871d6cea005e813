//! Immutable snapshot of every index dataset used by the rate resolver

use super::month_key::MonthKey;
use super::{KeyKind, Series};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Period key of a single index level: a calendar day or a month token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PeriodKey {
    Day(NaiveDate),
    Month(MonthKey),
}

impl PeriodKey {
    /// Parse a raw dataset key according to the series key kind
    pub fn parse(kind: KeyKind, raw: &str) -> Option<Self> {
        match kind {
            KeyKind::Daily => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .ok()
                .map(PeriodKey::Day),
            KeyKind::Monthly => MonthKey::parse(raw).map(PeriodKey::Month),
        }
    }

    pub fn kind(&self) -> KeyKind {
        match self {
            PeriodKey::Day(_) => KeyKind::Daily,
            PeriodKey::Month(_) => KeyKind::Monthly,
        }
    }
}

impl From<NaiveDate> for PeriodKey {
    fn from(date: NaiveDate) -> Self {
        PeriodKey::Day(date)
    }
}

impl From<MonthKey> for PeriodKey {
    fn from(key: MonthKey) -> Self {
        PeriodKey::Month(key)
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodKey::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            PeriodKey::Month(key) => write!(f, "{}", key),
        }
    }
}

/// Errors raised while ingesting index levels
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    File {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("malformed CSV record: {0}")]
    Csv(#[from] csv::Error),

    #[error("{series}: unparsable key '{raw}'")]
    InvalidKey { series: Series, raw: String },

    #[error("{series}: key {key} does not match the series key kind")]
    KeyKindMismatch { series: Series, key: PeriodKey },

    #[error("{series}: unparsable level '{raw}' at {key}")]
    InvalidLevel {
        series: Series,
        key: PeriodKey,
        raw: String,
    },

    #[error("{series}: negative level {value} at {key}")]
    NegativeLevel {
        series: Series,
        key: PeriodKey,
        value: Decimal,
    },

    #[error("{series}: duplicate key {key}")]
    DuplicateKey { series: Series, key: PeriodKey },
}

/// Levels of one dataset, keyed by period
#[derive(Debug, Clone, Default)]
pub struct IndexSeries {
    levels: HashMap<PeriodKey, Decimal>,
}

impl IndexSeries {
    /// Build a series, enforcing unique keys of the right kind and non-negative levels
    pub fn from_levels<I, K>(series: Series, levels: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = (K, Decimal)>,
        K: Into<PeriodKey>,
    {
        let mut out = HashMap::new();
        for (key, value) in levels {
            let key = key.into();
            if key.kind() != series.key_kind() {
                return Err(LoadError::KeyKindMismatch { series, key });
            }
            if value.is_sign_negative() && !value.is_zero() {
                return Err(LoadError::NegativeLevel { series, key, value });
            }
            if out.insert(key, value).is_some() {
                return Err(LoadError::DuplicateKey { series, key });
            }
        }
        Ok(Self { levels: out })
    }

    pub fn get(&self, key: &PeriodKey) -> Option<Decimal> {
        self.levels.get(key).copied()
    }

    pub fn contains(&self, key: &PeriodKey) -> bool {
        self.levels.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Read-only snapshot of all datasets.
///
/// Populated once by a loader and never mutated afterwards, so a single
/// snapshot can be shared by concurrent simulations.
#[derive(Debug, Clone, Default)]
pub struct IndexStore {
    series: HashMap<Series, IndexSeries>,
}

impl IndexStore {
    /// Empty store: every lookup reports "no data"
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a store from already-validated series
    pub fn from_series<I>(series: I) -> Self
    where
        I: IntoIterator<Item = (Series, IndexSeries)>,
    {
        Self {
            series: series.into_iter().collect(),
        }
    }

    /// Level of `series` at `key`, or `None` when the dataset has no such point
    pub fn get(&self, series: Series, key: &PeriodKey) -> Option<Decimal> {
        self.series.get(&series).and_then(|s| s.get(key))
    }

    pub fn contains(&self, series: Series, key: &PeriodKey) -> bool {
        self.series.get(&series).is_some_and(|s| s.contains(key))
    }

    pub fn series(&self, series: Series) -> Option<&IndexSeries> {
        self.series.get(&series)
    }

    /// Row count per dataset, in canonical series order
    pub fn row_counts(&self) -> Vec<(Series, usize)> {
        Series::ALL
            .iter()
            .map(|s| (*s, self.series.get(s).map_or(0, IndexSeries::len)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn month(token: &str) -> MonthKey {
        MonthKey::parse(token).unwrap()
    }

    #[test]
    fn test_lookup_present_and_absent() {
        let pasiva = IndexSeries::from_levels(
            Series::Pasiva,
            [(day(2024, 1, 1), dec!(10)), (day(2024, 2, 1), dec!(12))],
        )
        .unwrap();
        let store = IndexStore::from_series([(Series::Pasiva, pasiva)]);

        assert_eq!(store.get(Series::Pasiva, &day(2024, 1, 1).into()), Some(dec!(10)));
        assert_eq!(store.get(Series::Pasiva, &day(2024, 1, 2).into()), None);
        // Unloaded series is absent, not zero
        assert_eq!(store.get(Series::Activa, &day(2024, 1, 1).into()), None);
    }

    #[test]
    fn test_zero_level_is_data() {
        let cer = IndexSeries::from_levels(Series::Cer, [(day(2024, 1, 1), Decimal::ZERO)]).unwrap();
        let store = IndexStore::from_series([(Series::Cer, cer)]);
        assert_eq!(store.get(Series::Cer, &day(2024, 1, 1).into()), Some(Decimal::ZERO));
    }

    #[test]
    fn test_rejects_negative_levels() {
        let err = IndexSeries::from_levels(Series::Ripte, [(month("ene-24"), dec!(-1))]).unwrap_err();
        assert!(matches!(err, LoadError::NegativeLevel { .. }));
    }

    #[test]
    fn test_rejects_duplicate_keys() {
        let err = IndexSeries::from_levels(
            Series::Smvm,
            [(month("sept-23"), dec!(100)), (month("sep-23"), dec!(101))],
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::DuplicateKey { .. }));
    }

    #[test]
    fn test_rejects_wrong_key_kind() {
        let err = IndexSeries::from_levels(Series::Activa, [(month("ene-24"), dec!(1))]).unwrap_err();
        assert!(matches!(err, LoadError::KeyKindMismatch { .. }));
    }

    #[test]
    fn test_row_counts() {
        let ipc = IndexSeries::from_levels(
            Series::Ipc,
            [(month("ene-24"), dec!(1)), (month("feb-24"), dec!(2))],
        )
        .unwrap();
        let store = IndexStore::from_series([(Series::Ipc, ipc)]);
        let counts = store.row_counts();
        assert_eq!(counts.len(), Series::ALL.len());
        assert!(counts.contains(&(Series::Ipc, 2)));
        assert!(counts.contains(&(Series::Cer, 0)));
    }
}
