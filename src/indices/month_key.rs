//! Month-year tokens used as keys by the monthly series ("feb-24", "sep-23")

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Month abbreviations as published in the source datasets (January first)
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sep", "oct", "nov", "dic",
];

/// A month-year key with a two-digit year, exactly as the datasets publish it.
///
/// The century is intentionally not stored: "jul-94" is the same key whether it
/// was derived from 1994-07-15 or 2094-07-15.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthKey {
    year: u8,
    month: u8,
}

impl MonthKey {
    /// Key for the month containing `date`
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year().rem_euclid(100) as u8,
            month: date.month() as u8,
        }
    }

    /// Parse a token such as "feb-24", "SEPT-23" or " dic-99 ".
    ///
    /// The four-letter September abbreviation is folded onto "sep".
    pub fn parse(token: &str) -> Option<Self> {
        let normalized = token.trim().to_lowercase();
        let (abbr, year) = normalized.split_once('-')?;
        let abbr = if abbr == "sept" { "sep" } else { abbr };

        let month = MONTH_ABBREVIATIONS.iter().position(|m| *m == abbr)? as u8 + 1;
        if year.len() != 2 || !year.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let year: u8 = year.parse().ok()?;

        Some(Self { year, month })
    }

    /// Month number (1-12)
    pub fn month(&self) -> u32 {
        self.month as u32
    }

    /// Two-digit year (0-99)
    pub fn two_digit_year(&self) -> u32 {
        self.year as u32
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{:02}",
            MONTH_ABBREVIATIONS[(self.month - 1) as usize],
            self.year
        )
    }
}

/// First day of the month `offset` months away from the month containing `date`
pub fn shift_month(date: NaiveDate, offset: i32) -> NaiveDate {
    let total = date.year() * 12 + date.month0() as i32 + offset;
    let year = total.div_euclid(12);
    let month0 = total.rem_euclid(12) as u32;
    // Day 1 exists in every month
    NaiveDate::from_ymd_opt(year, month0 + 1, 1).unwrap_or(date)
}

/// Number of days in the month containing `date`
pub fn days_in_month(date: NaiveDate) -> u32 {
    let first = shift_month(date, 0);
    let next = shift_month(date, 1);
    (next - first).num_days() as u32
}
