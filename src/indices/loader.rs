//! CSV-based index loader
//!
//! Loads one `key,value` file per dataset from data/indices/

use super::{IndexSeries, IndexStore, LoadError, PeriodKey, Series};
use rust_decimal::Decimal;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Default path to the indices directory
pub const DEFAULT_INDICES_PATH: &str = "data/indices";

/// Load one dataset from a CSV file
pub fn load_series(path: &Path, series: Series) -> Result<IndexSeries, LoadError> {
    let reader = csv::Reader::from_path(path).map_err(|source| LoadError::File {
        path: path.display().to_string(),
        source,
    })?;
    read_series(reader, series)
}

/// Load one dataset from any reader (e.g., string buffer, network stream)
pub fn load_series_from_reader<R: Read>(reader: R, series: Series) -> Result<IndexSeries, LoadError> {
    read_series(csv::Reader::from_reader(reader), series)
}

fn read_series<R: Read>(mut reader: csv::Reader<R>, series: Series) -> Result<IndexSeries, LoadError> {
    let mut levels = Vec::new();

    for result in reader.records() {
        let record = result?;
        let raw_key = record.get(0).unwrap_or("").trim();
        let raw_value = record.get(1).unwrap_or("").trim();

        // Blank rows are padding in the published sheets
        if raw_key.is_empty() && raw_value.is_empty() {
            continue;
        }

        let key = PeriodKey::parse(series.key_kind(), raw_key).ok_or_else(|| LoadError::InvalidKey {
            series,
            raw: raw_key.to_string(),
        })?;
        let value = Decimal::from_str(raw_value).map_err(|_| LoadError::InvalidLevel {
            series,
            key,
            raw: raw_value.to_string(),
        })?;

        levels.push((key, value));
    }

    IndexSeries::from_levels(series, levels)
}

impl IndexStore {
    /// Load every dataset from the default location (data/indices/)
    pub fn load_default() -> Result<Self, LoadError> {
        Self::load_from(Path::new(DEFAULT_INDICES_PATH))
    }

    /// Load every dataset from a specific directory
    pub fn load_from(dir: &Path) -> Result<Self, LoadError> {
        let mut loaded = Vec::with_capacity(Series::ALL.len());
        for series in Series::ALL {
            let data = load_series(&dir.join(series.file_name()), series)?;
            loaded.push((series, data));
        }

        let store = Self::from_series(loaded);
        let counts: Vec<String> = store
            .row_counts()
            .iter()
            .map(|(series, rows)| format!("{} {}", series, rows))
            .collect();
        log::info!("Loaded index datasets from {}: {}", dir.display(), counts.join(" | "));

        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indices::MonthKey;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_load_daily_series() {
        let csv = "key,value\n2024-01-01,10.5\n2024-01-02,10.75\n";
        let series = load_series_from_reader(csv.as_bytes(), Series::Pasiva).unwrap();
        assert_eq!(series.len(), 2);
        let key = PeriodKey::Day(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(series.get(&key), Some(dec!(10.75)));
    }

    #[test]
    fn test_load_monthly_series_with_alias() {
        let csv = "key,value\nago-23,1000\nSEPT-23,1100\n\n,\noct-23,1210\n";
        let series = load_series_from_reader(csv.as_bytes(), Series::Ripte).unwrap();
        assert_eq!(series.len(), 3);
        let sep = PeriodKey::Month(MonthKey::parse("sep-23").unwrap());
        assert_eq!(series.get(&sep), Some(dec!(1100)));
    }

    #[test]
    fn test_unparsable_value_is_an_error() {
        let csv = "key,value\nene-24,1.234,56\n";
        let err = load_series_from_reader(csv.as_bytes(), Series::Smvm).unwrap_err();
        assert!(matches!(err, LoadError::Csv(_) | LoadError::InvalidLevel { .. }));

        let csv = "key,value\nene-24,n/a\n";
        let err = load_series_from_reader(csv.as_bytes(), Series::Smvm).unwrap_err();
        assert!(matches!(err, LoadError::InvalidLevel { .. }));
    }

    #[test]
    fn test_unparsable_key_is_an_error() {
        let csv = "key,value\n01/02/2024,3.5\n";
        let err = load_series_from_reader(csv.as_bytes(), Series::Cer).unwrap_err();
        assert!(matches!(err, LoadError::InvalidKey { .. }));
    }

    #[test]
    fn test_load_default_indices() {
        let result = IndexStore::load_default();
        assert!(result.is_ok(), "Failed to load indices: {:?}", result.err());

        let store = result.unwrap();
        for (series, rows) in store.row_counts() {
            assert!(rows > 0, "{} is empty", series);
        }
    }
}
