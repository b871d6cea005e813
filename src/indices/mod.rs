//! Index datasets: month tokens, the immutable store, and CSV ingestion

mod month_key;
mod store;
pub mod loader;

pub use month_key::{days_in_month, shift_month, MonthKey, MONTH_ABBREVIATIONS};
pub use store::{IndexSeries, IndexStore, LoadError, PeriodKey};

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a dataset keys its levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyKind {
    /// ISO calendar dates
    Daily,
    /// Month-year tokens ("feb-24")
    Monthly,
}

/// One published dataset in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Series {
    /// BNA active-rate accumulated level
    Activa,
    /// BCRA passive-rate accumulated level
    Pasiva,
    /// RIPTE wage index, canonical publication
    Ripte,
    /// RIPTE as available one month after publication lag
    RipteLag1,
    /// RIPTE as available two months after publication lag
    RipteLag2,
    /// Statutory minimum wage (SMVM)
    Smvm,
    /// Consumer price level (IPC)
    Ipc,
    /// Daily CER coefficient
    Cer,
}

impl Series {
    pub const ALL: [Series; 8] = [
        Series::Activa,
        Series::Pasiva,
        Series::Ripte,
        Series::RipteLag1,
        Series::RipteLag2,
        Series::Smvm,
        Series::Ipc,
        Series::Cer,
    ];

    pub fn key_kind(&self) -> KeyKind {
        match self {
            Series::Activa | Series::Pasiva | Series::Cer => KeyKind::Daily,
            Series::Ripte
            | Series::RipteLag1
            | Series::RipteLag2
            | Series::Smvm
            | Series::Ipc => KeyKind::Monthly,
        }
    }

    /// CSV file holding this dataset inside the indices directory
    pub fn file_name(&self) -> &'static str {
        match self {
            Series::Activa => "activa.csv",
            Series::Pasiva => "pasiva.csv",
            Series::Ripte => "ripte.csv",
            Series::RipteLag1 => "ripte_t1.csv",
            Series::RipteLag2 => "ripte_t2.csv",
            Series::Smvm => "smvm.csv",
            Series::Ipc => "ipc.csv",
            Series::Cer => "cer.csv",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Series::Activa => "activa",
            Series::Pasiva => "pasiva",
            Series::Ripte => "ripte",
            Series::RipteLag1 => "ripte_t1",
            Series::RipteLag2 => "ripte_t2",
            Series::Smvm => "smvm",
            Series::Ipc => "ipc",
            Series::Cer => "cer",
        }
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
