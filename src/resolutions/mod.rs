//! Statutory minimum amounts by resolution period
//!
//! Each published resolution fixes minimum amounts per article for a closed
//! date range. Periods never overlap, so any date maps to at most one period.

pub mod loader;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Article whose minimum amount a period publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MinimumCategory {
    #[serde(rename = "11A")]
    Art11A,
    #[serde(rename = "11B")]
    Art11B,
    #[serde(rename = "11C")]
    Art11C,
    #[serde(rename = "14A")]
    Art14A,
    #[serde(rename = "14B")]
    Art14B,
    #[serde(rename = "15")]
    Art15,
    /// Art. 3 Ley 26.773 additional compensation
    #[serde(rename = "3")]
    Art3,
}

impl MinimumCategory {
    pub const ALL: [MinimumCategory; 7] = [
        MinimumCategory::Art11A,
        MinimumCategory::Art11B,
        MinimumCategory::Art11C,
        MinimumCategory::Art14A,
        MinimumCategory::Art14B,
        MinimumCategory::Art15,
        MinimumCategory::Art3,
    ];

    /// Lenient parse of the labels used in published tables
    /// ("Art. 14.2.B", "14B", "11.A", "Art. 3 Ley 26.773")
    pub fn parse(label: &str) -> Option<Self> {
        let compact: String = label
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();
        let compact = compact.strip_suffix("LEY26.773").unwrap_or(&compact);
        let compact = compact
            .strip_prefix("ART.")
            .or_else(|| compact.strip_prefix("ART"))
            .unwrap_or(compact);
        let key = compact.replace("14.2", "14").replace("15.2", "15").replace('.', "");

        match key.as_str() {
            "11A" => Some(MinimumCategory::Art11A),
            "11B" => Some(MinimumCategory::Art11B),
            "11C" => Some(MinimumCategory::Art11C),
            "14A" => Some(MinimumCategory::Art14A),
            "14B" => Some(MinimumCategory::Art14B),
            "15" => Some(MinimumCategory::Art15),
            "3" => Some(MinimumCategory::Art3),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MinimumCategory::Art11A => "Art. 11.A",
            MinimumCategory::Art11B => "Art. 11.B",
            MinimumCategory::Art11C => "Art. 11.C",
            MinimumCategory::Art14A => "Art. 14.2.A",
            MinimumCategory::Art14B => "Art. 14.2.B",
            MinimumCategory::Art15 => "Art. 15.2",
            MinimumCategory::Art3 => "Art. 3 Ley 26.773",
        }
    }
}

impl fmt::Display for MinimumCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MinimumCategory {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ResolutionError::UnknownCategory(s.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("unknown minimum category '{0}'")]
    UnknownCategory(String),

    #[error("resolution {resolution}: period starts {from} after it ends {to}")]
    InvertedPeriod {
        resolution: String,
        from: NaiveDate,
        to: NaiveDate,
    },

    #[error("resolution {later} starting {from} overlaps {earlier} ending {to}")]
    Overlap {
        earlier: String,
        later: String,
        from: NaiveDate,
        to: NaiveDate,
    },

    #[error("cannot read {path}: {source}")]
    File {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("malformed CSV record: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing column '{0}'")]
    MissingColumn(&'static str),

    #[error("row {row}: unparsable date '{raw}'")]
    InvalidDate { row: usize, raw: String },

    #[error("row {row}: unparsable amount '{raw}' for {category}")]
    InvalidAmount {
        row: usize,
        category: MinimumCategory,
        raw: String,
    },
}

/// A resolution and the minimum amounts it fixes for its validity range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionPeriod {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub resolution: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Categories without a published amount are absent, never zero
    pub amounts: BTreeMap<MinimumCategory, Decimal>,
}

impl ResolutionPeriod {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    pub fn amount(&self, category: MinimumCategory) -> Option<Decimal> {
        self.amounts.get(&category).copied()
    }
}

/// Minimum amount in force for a category at a date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimumLookup {
    pub category: MinimumCategory,
    pub amount: Decimal,
    pub resolution: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Ordered, non-overlapping list of resolution periods
#[derive(Debug, Clone, Default)]
pub struct ResolutionStore {
    periods: Vec<ResolutionPeriod>,
}

impl ResolutionStore {
    /// Sort periods by end date and reject inverted or overlapping ranges
    pub fn new(mut periods: Vec<ResolutionPeriod>) -> Result<Self, ResolutionError> {
        for period in &periods {
            if period.from > period.to {
                return Err(ResolutionError::InvertedPeriod {
                    resolution: period.resolution.clone(),
                    from: period.from,
                    to: period.to,
                });
            }
        }

        periods.sort_by_key(|p| (p.to, p.from));

        for pair in periods.windows(2) {
            if pair[1].from <= pair[0].to {
                return Err(ResolutionError::Overlap {
                    earlier: pair[0].resolution.clone(),
                    later: pair[1].resolution.clone(),
                    from: pair[1].from,
                    to: pair[0].to,
                });
            }
        }

        Ok(Self { periods })
    }

    pub fn periods(&self) -> &[ResolutionPeriod] {
        &self.periods
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Period in force at `date`, bounds inclusive
    pub fn period_at(&self, date: NaiveDate) -> Option<&ResolutionPeriod> {
        // Sorted by end date: first period ending on or after `date`
        let idx = self.periods.partition_point(|p| p.to < date);
        self.periods.get(idx).filter(|p| p.contains(date))
    }

    /// Minimum for `category` in force at `date`
    pub fn lookup(&self, category: MinimumCategory, date: NaiveDate) -> Option<MinimumLookup> {
        let period = self.period_at(date)?;
        let amount = period.amount(category)?;
        Some(MinimumLookup {
            category,
            amount,
            resolution: period.resolution.clone(),
            from: period.from,
            to: period.to,
            url: period.url.clone(),
        })
    }

    /// Published link for a resolution name, if any period carries one
    pub fn link_for(&self, resolution: &str) -> Option<&str> {
        self.periods
            .iter()
            .find(|p| p.resolution == resolution && p.url.is_some())
            .and_then(|p| p.url.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn period(from: NaiveDate, to: NaiveDate, name: &str, art_14a: Option<Decimal>) -> ResolutionPeriod {
        let mut amounts = BTreeMap::new();
        amounts.insert(MinimumCategory::Art11A, dec!(1000000));
        if let Some(amount) = art_14a {
            amounts.insert(MinimumCategory::Art14A, amount);
        }
        ResolutionPeriod {
            from,
            to,
            resolution: name.to_string(),
            url: Some(format!("https://example.org/{}", name)),
            amounts,
        }
    }

    fn store() -> ResolutionStore {
        ResolutionStore::new(vec![
            period(day(2024, 3, 1), day(2024, 8, 31), "Res. 2", None),
            period(day(2023, 9, 1), day(2024, 2, 29), "Res. 1", Some(dec!(500000))),
        ])
        .unwrap()
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(MinimumCategory::parse("Art. 14.2.B"), Some(MinimumCategory::Art14B));
        assert_eq!(MinimumCategory::parse("14.2A"), Some(MinimumCategory::Art14A));
        assert_eq!(MinimumCategory::parse("11.a"), Some(MinimumCategory::Art11A));
        assert_eq!(MinimumCategory::parse("Art. 15.2"), Some(MinimumCategory::Art15));
        assert_eq!(MinimumCategory::parse("Art. 3 Ley 26.773"), Some(MinimumCategory::Art3));
        assert_eq!(MinimumCategory::parse("Art. 12"), None);
        for category in MinimumCategory::ALL {
            assert_eq!(MinimumCategory::parse(category.label()), Some(category));
        }
    }

    #[test]
    fn test_lookup_inclusive_bounds() {
        let store = store();
        assert_eq!(store.periods()[0].resolution, "Res. 1");

        let hit = store.lookup(MinimumCategory::Art14A, day(2024, 2, 29)).unwrap();
        assert_eq!(hit.resolution, "Res. 1");
        assert_eq!(hit.amount, dec!(500000));

        let start = store.lookup(MinimumCategory::Art11A, day(2024, 3, 1)).unwrap();
        assert_eq!(start.resolution, "Res. 2");
    }

    #[test]
    fn test_lookup_misses() {
        let store = store();
        // Before the first period and after the last
        assert!(store.lookup(MinimumCategory::Art11A, day(2023, 8, 31)).is_none());
        assert!(store.lookup(MinimumCategory::Art11A, day(2024, 9, 1)).is_none());
        // Period exists but publishes no amount for the category
        assert!(store.lookup(MinimumCategory::Art14A, day(2024, 5, 1)).is_none());
    }

    #[test]
    fn test_rejects_overlap() {
        let err = ResolutionStore::new(vec![
            period(day(2023, 9, 1), day(2024, 3, 1), "Res. 1", None),
            period(day(2024, 3, 1), day(2024, 8, 31), "Res. 2", None),
        ])
        .unwrap_err();
        assert!(matches!(err, ResolutionError::Overlap { .. }));
    }

    #[test]
    fn test_rejects_inverted_period() {
        let err = ResolutionStore::new(vec![period(day(2024, 3, 1), day(2024, 1, 1), "Res. X", None)]).unwrap_err();
        assert!(matches!(err, ResolutionError::InvertedPeriod { .. }));
    }

    #[test]
    fn test_link_for() {
        let store = store();
        assert_eq!(store.link_for("Res. 2"), Some("https://example.org/Res. 2"));
        assert_eq!(store.link_for("Res. 9"), None);
    }
}
