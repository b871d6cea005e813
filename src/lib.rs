//! Indexed Settlement - interest accrual and payment settlement for indexed claims
//!
//! This library provides:
//! - Index datasets (BNA activa, BCRA pasiva, RIPTE, SMVM, IPC, CER) loaded from CSV
//! - Interval variation per index, including the daily-weighted RIPTE method
//! - A settlement engine: capital tranches, payments, capitalizations and an audit trail
//! - Statutory minimums by resolution period, with index adjustment
//! - Parallel batch runs over a shared index snapshot

pub mod indices;
pub mod rates;
pub mod settlement;
pub mod resolutions;
pub mod adjustment;
pub mod scenario;

// Re-export commonly used types
pub use indices::{IndexStore, LoadError, Series, loader::DEFAULT_INDICES_PATH};
pub use rates::{resolve, IndexKind, RateError, RateResolver, RipteDataset, Variation};
pub use settlement::{
    simulate, CapitalTranche, Event, GapPolicy, SettlementConfig, SettlementEngine, SettlementError, SettlementResult,
    SettlementState,
};
pub use resolutions::{loader::DEFAULT_RESOLUTIONS_PATH, MinimumCategory, MinimumLookup, ResolutionStore};
pub use adjustment::{adjust_amount, AdjustedAmount};
pub use scenario::{load_scenarios, Scenario, ScenarioError, ScenarioRunner};
