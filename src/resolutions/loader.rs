//! CSV loading for resolution periods
//!
//! Expected columns (header names are matched loosely):
//! - from / desde: first day in force (ISO or dd/mm/yyyy)
//! - to / hasta: last day in force
//! - resolution: resolution name
//! - url / link: optional publication link
//! - one column per minimum category, e.g. "Art. 14.2.B"
//!
//! Amounts use Argentine formatting ("$ 1.234.567,89"); blank cells mean the
//! category has no published amount in that period.

use super::{MinimumCategory, ResolutionError, ResolutionPeriod, ResolutionStore};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Default resolutions table path
pub const DEFAULT_RESOLUTIONS_PATH: &str = "data/resolutions.csv";

const FROM_HEADERS: &[&str] = &["from", "desde", "vigenciadesde"];
const TO_HEADERS: &[&str] = &["to", "hasta", "vigenciahasta"];
const RESOLUTION_HEADERS: &[&str] = &["resolution", "resolucion", "resolucionnota", "nota"];
const URL_HEADERS: &[&str] = &["url", "link", "enlace"];

struct Columns {
    from: usize,
    to: usize,
    resolution: usize,
    url: Option<usize>,
    categories: Vec<(usize, MinimumCategory)>,
}

/// Lowercase and keep only letters and digits; strips Spanish accents
fn normalize_header(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' => 'u',
            other => other,
        })
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

fn find_column(headers: &[String], candidates: &[&str]) -> Option<usize> {
    headers.iter().position(|h| candidates.contains(&h.as_str()))
}

impl Columns {
    fn from_headers(record: &csv::StringRecord) -> Result<Self, ResolutionError> {
        let normalized: Vec<String> = record.iter().map(normalize_header).collect();

        let from = find_column(&normalized, FROM_HEADERS).ok_or(ResolutionError::MissingColumn("from"))?;
        let to = find_column(&normalized, TO_HEADERS).ok_or(ResolutionError::MissingColumn("to"))?;
        let resolution =
            find_column(&normalized, RESOLUTION_HEADERS).ok_or(ResolutionError::MissingColumn("resolution"))?;
        let url = find_column(&normalized, URL_HEADERS);

        let categories = record
            .iter()
            .enumerate()
            .filter(|(idx, _)| ![from, to, resolution].contains(idx) && Some(*idx) != url)
            .filter_map(|(idx, raw)| MinimumCategory::parse(raw).map(|c| (idx, c)))
            .collect();

        Ok(Self {
            from,
            to,
            resolution,
            url,
            categories,
        })
    }
}

/// Accepts 2024-03-01 and 01/03/2024
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .ok()
}

/// Parse an Argentine formatted amount. `Ok(None)` for a blank cell.
fn parse_amount(raw: &str) -> Result<Option<Decimal>, ()> {
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace() && *c != '$').collect();
    if cleaned.is_empty() {
        return Ok(None);
    }
    let canonical = cleaned.replace('.', "").replace(',', ".");
    Decimal::from_str(&canonical).map(Some).map_err(|_| ())
}

fn cell(record: &csv::StringRecord, idx: usize) -> &str {
    record.get(idx).map(str::trim).unwrap_or("")
}

/// Load resolution periods from any reader
pub fn load_periods_from_reader<R: Read>(reader: R) -> Result<Vec<ResolutionPeriod>, ResolutionError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = Columns::from_headers(rdr.headers()?)?;
    let mut periods = Vec::new();

    for (idx, record) in rdr.records().enumerate() {
        let record = record?;
        // Header is line 1
        let row = idx + 2;

        let raw_from = cell(&record, columns.from);
        let raw_to = cell(&record, columns.to);
        let resolution = cell(&record, columns.resolution);

        // Padding rows in exported sheets
        if raw_from.is_empty() && raw_to.is_empty() && resolution.is_empty() {
            continue;
        }

        let from = parse_date(raw_from).ok_or_else(|| ResolutionError::InvalidDate {
            row,
            raw: raw_from.to_string(),
        })?;
        let to = parse_date(raw_to).ok_or_else(|| ResolutionError::InvalidDate {
            row,
            raw: raw_to.to_string(),
        })?;

        let url = columns
            .url
            .map(|i| cell(&record, i))
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let mut amounts = BTreeMap::new();
        for &(col, category) in &columns.categories {
            let raw = cell(&record, col);
            let amount = parse_amount(raw).map_err(|_| ResolutionError::InvalidAmount {
                row,
                category,
                raw: raw.to_string(),
            })?;
            if let Some(amount) = amount {
                amounts.insert(category, amount);
            }
        }

        periods.push(ResolutionPeriod {
            from,
            to,
            resolution: resolution.to_string(),
            url,
            amounts,
        });
    }

    Ok(periods)
}

impl ResolutionStore {
    /// Load from the default data path
    pub fn load_default() -> Result<Self, ResolutionError> {
        Self::load_from(DEFAULT_RESOLUTIONS_PATH)
    }

    /// Load and validate a resolutions CSV
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ResolutionError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| ResolutionError::File {
            path: path.display().to_string(),
            source: csv::Error::from(e),
        })?;
        let store = Self::from_reader(file)?;
        log::info!("Loaded {} resolution periods from {}", store.len(), path.display());
        Ok(store)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ResolutionError> {
        Self::new(load_periods_from_reader(reader)?)
    }
}
