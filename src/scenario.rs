//! Scenario runner for batch settlements
//!
//! Loads the index snapshot once, then runs many claims against it without
//! re-reading CSV files. Each run owns its own state, so batches run in
//! parallel over a shared, immutable store.

use crate::indices::{IndexStore, LoadError};
use crate::settlement::{CapitalTranche, Event, SettlementConfig, SettlementEngine, SettlementError, SettlementResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// One claim to settle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub config: SettlementConfig,
    pub tranches: Vec<CapitalTranche>,
    pub events: Vec<Event>,
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("scenario '{0}' has no capital tranches")]
    NoTranches(String),

    #[error("scenario '{name}': {source}")]
    Settlement {
        name: String,
        #[source]
        source: SettlementError,
    },

    #[error("cannot read scenarios: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed scenario JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A scenario file holds a single scenario or a list of them
#[derive(Deserialize)]
#[serde(untagged)]
enum ScenarioFile {
    Many(Vec<Scenario>),
    One(Scenario),
}

/// Parse scenarios from JSON, accepting an object or an array
pub fn load_scenarios_from_reader<R: Read>(reader: R) -> Result<Vec<Scenario>, ScenarioError> {
    Ok(match serde_json::from_reader(reader)? {
        ScenarioFile::Many(scenarios) => scenarios,
        ScenarioFile::One(scenario) => vec![scenario],
    })
}

pub fn load_scenarios(path: &Path) -> Result<Vec<Scenario>, ScenarioError> {
    load_scenarios_from_reader(std::fs::File::open(path)?)
}

/// Pre-loaded scenario runner
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::from_csv()?;
/// let results = runner.run_batch(&scenarios);
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    store: IndexStore,
}

impl ScenarioRunner {
    /// Create runner by loading the bundled index files
    pub fn from_csv() -> Result<Self, LoadError> {
        Ok(Self {
            store: IndexStore::load_default()?,
        })
    }

    /// Create runner from a specific indices directory
    pub fn from_csv_path(path: &Path) -> Result<Self, LoadError> {
        Ok(Self {
            store: IndexStore::load_from(path)?,
        })
    }

    /// Create runner with a pre-built snapshot
    pub fn with_store(store: IndexStore) -> Self {
        Self { store }
    }

    /// Run a single scenario
    pub fn run(&self, scenario: &Scenario) -> Result<SettlementResult, ScenarioError> {
        if scenario.tranches.is_empty() {
            return Err(ScenarioError::NoTranches(scenario.name.clone()));
        }
        let engine = SettlementEngine::new(&self.store, scenario.config.clone());
        engine
            .simulate(&scenario.tranches, &scenario.events)
            .map_err(|source| ScenarioError::Settlement {
                name: scenario.name.clone(),
                source,
            })
    }

    /// Run scenarios in parallel; results keep the input order
    pub fn run_batch(&self, scenarios: &[Scenario]) -> Vec<Result<SettlementResult, ScenarioError>> {
        scenarios.par_iter().map(|s| self.run(s)).collect()
    }

    /// Get reference to the index snapshot
    pub fn store(&self) -> &IndexStore {
        &self.store
    }
}
