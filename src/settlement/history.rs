//! Audit trail and result structures for a settlement run

use super::state::SettlementState;
use crate::rates::{IndexKind, RipteDataset};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Interest accrued over one interval between processing points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestSegment {
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Index variation over the interval, in percent
    pub rate: Decimal,
    /// Principal the rate was applied to
    pub base: Decimal,
    pub interest: Decimal,
    /// RIPTE publication used, for weighted RIPTE only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset: Option<RipteDataset>,
}

/// What changed the balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryEvent {
    InterestAccrued {
        from: NaiveDate,
        rate: Decimal,
        base: Decimal,
        amount: Decimal,
    },
    TrancheIncorporated {
        sequence_id: u32,
        capital: Decimal,
        initial_interest: Decimal,
    },
    OverdueInterestCapitalized {
        amount: Decimal,
    },
    AccruedInterestCapitalized {
        amount: Decimal,
    },
    PaymentToOverdueInterest {
        amount: Decimal,
        remaining: Decimal,
    },
    PaymentToAccruedInterest {
        amount: Decimal,
        remaining: Decimal,
    },
    PaymentToPrincipal {
        amount: Decimal,
        remaining: Decimal,
    },
    /// Part of a payment left after every bucket was cleared
    PaymentLeftover {
        amount: Decimal,
    },
}

impl HistoryEvent {
    pub fn label(&self) -> &'static str {
        match self {
            HistoryEvent::InterestAccrued { .. } => "interest-accrued",
            HistoryEvent::TrancheIncorporated { .. } => "tranche-incorporated",
            HistoryEvent::OverdueInterestCapitalized { .. } => "overdue-interest-capitalized",
            HistoryEvent::AccruedInterestCapitalized { .. } => "accrued-interest-capitalized",
            HistoryEvent::PaymentToOverdueInterest { .. } => "payment-overdue-interest",
            HistoryEvent::PaymentToAccruedInterest { .. } => "payment-accrued-interest",
            HistoryEvent::PaymentToPrincipal { .. } => "payment-principal",
            HistoryEvent::PaymentLeftover { .. } => "payment-leftover",
        }
    }

    /// Money amount carried by the entry
    pub fn amount(&self) -> Decimal {
        match self {
            HistoryEvent::InterestAccrued { amount, .. }
            | HistoryEvent::OverdueInterestCapitalized { amount }
            | HistoryEvent::AccruedInterestCapitalized { amount }
            | HistoryEvent::PaymentToOverdueInterest { amount, .. }
            | HistoryEvent::PaymentToAccruedInterest { amount, .. }
            | HistoryEvent::PaymentToPrincipal { amount, .. }
            | HistoryEvent::PaymentLeftover { amount } => *amount,
            HistoryEvent::TrancheIncorporated { capital, .. } => *capital,
        }
    }
}

/// One append-only audit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub event: HistoryEvent,
    /// Balance right after this entry was applied
    pub balance: SettlementState,
}

/// Activation outcome of one input tranche
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrancheActivation {
    pub sequence_id: u32,
    pub start_date: NaiveDate,
    /// None when the tranche starts after the valuation date
    pub activated_on: Option<NaiveDate>,
}

/// Complete result of a settlement run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementResult {
    pub index: IndexKind,
    /// Valuation date (the end event)
    pub horizon: NaiveDate,
    pub final_state: SettlementState,
    pub segments: Vec<InterestSegment>,
    pub history: Vec<HistoryEntry>,
    pub tranches: Vec<TrancheActivation>,
}

impl SettlementResult {
    pub fn new(index: IndexKind, horizon: NaiveDate) -> Self {
        Self {
            index,
            horizon,
            final_state: SettlementState::default(),
            segments: Vec::new(),
            history: Vec::new(),
            tranches: Vec::new(),
        }
    }

    /// Append an audit entry
    pub fn record(&mut self, date: NaiveDate, event: HistoryEvent, balance: SettlementState) {
        self.history.push(HistoryEntry { date, event, balance });
    }

    /// Amount owed at the valuation date
    pub fn total(&self) -> Decimal {
        self.final_state.total()
    }

    /// Get summary statistics
    pub fn summary(&self) -> SettlementSummary {
        let mut summary = SettlementSummary {
            segments: self.segments.len(),
            entries: self.history.len(),
            total_interest_accrued: self.segments.iter().map(|s| s.interest).sum(),
            final_principal: self.final_state.principal,
            final_accrued_interest: self.final_state.accrued_interest,
            final_overdue_interest: self.final_state.overdue_interest,
            final_total: self.total(),
            ..Default::default()
        };

        for entry in &self.history {
            match &entry.event {
                HistoryEvent::TrancheIncorporated { capital, .. } => summary.total_capital_incorporated += *capital,
                HistoryEvent::OverdueInterestCapitalized { amount }
                | HistoryEvent::AccruedInterestCapitalized { amount } => summary.total_capitalized += *amount,
                HistoryEvent::PaymentToOverdueInterest { amount, .. } => summary.paid_overdue_interest += *amount,
                HistoryEvent::PaymentToAccruedInterest { amount, .. } => summary.paid_accrued_interest += *amount,
                HistoryEvent::PaymentToPrincipal { amount, .. } => summary.paid_principal += *amount,
                HistoryEvent::PaymentLeftover { amount } => summary.leftover += *amount,
                HistoryEvent::InterestAccrued { .. } => {}
            }
        }

        summary
    }
}

/// Summary statistics for a settlement run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementSummary {
    pub segments: usize,
    pub entries: usize,
    pub total_interest_accrued: Decimal,
    pub total_capital_incorporated: Decimal,
    pub total_capitalized: Decimal,
    pub paid_overdue_interest: Decimal,
    pub paid_accrued_interest: Decimal,
    pub paid_principal: Decimal,
    pub leftover: Decimal,
    pub final_principal: Decimal,
    pub final_accrued_interest: Decimal,
    pub final_overdue_interest: Decimal,
    pub final_total: Decimal,
}
