//! Settlement engine: capital evolution with indexed accrual and payment waterfall

mod event;
mod state;
mod history;
mod engine;

pub use event::{sort_events, CapitalTranche, Event};
pub use state::SettlementState;
pub use history::{
    HistoryEntry, HistoryEvent, InterestSegment, SettlementResult, SettlementSummary, TrancheActivation,
};
pub use engine::{simulate, GapPolicy, SettlementConfig, SettlementEngine, SettlementError};
