//! Capital evolution: index accrual between events and waterfall settlement of payments

use super::event::{sort_events, CapitalTranche, Event};
use super::history::{HistoryEvent, InterestSegment, SettlementResult, TrancheActivation};
use super::state::SettlementState;
use crate::indices::IndexStore;
use crate::rates::{IndexKind, RateError, RateResolver, Variation};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What to do when the interval before a tranche start has no index data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    /// Skip the accrual with a warning and still incorporate the tranche
    #[default]
    Tolerant,
    /// Abort the run, as for any other required interval
    Strict,
}

/// Configuration for a settlement run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementConfig {
    /// Index used to accrue interest on principal
    #[serde(default)]
    pub index: IndexKind,

    #[serde(default)]
    pub tranche_gap_policy: GapPolicy,
}

impl SettlementConfig {
    pub fn with_index(index: IndexKind) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }
}

/// Why a settlement run could not complete
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    #[error("no {index} rate for {from} -> {to}: {source}")]
    NoRateData {
        index: IndexKind,
        from: NaiveDate,
        to: NaiveDate,
        #[source]
        source: RateError,
    },

    #[error("payment on {date} must be positive, got {amount}")]
    NonPositivePayment { date: NaiveDate, amount: Decimal },

    #[error("tranche {sequence_id} has a negative capital or initial interest")]
    NegativeTranche { sequence_id: u32 },

    #[error("balance on {date} exceeds the decimal range")]
    Overflow { date: NaiveDate },

    #[error("event list has no end event marking the valuation date")]
    MissingHorizon,

    #[error("event list has {count} end events, expected exactly one")]
    MultipleHorizons { count: usize },
}

/// Settlement engine bound to an index snapshot
pub struct SettlementEngine<'a> {
    resolver: RateResolver<'a>,
    config: SettlementConfig,
}

impl<'a> SettlementEngine<'a> {
    /// Create a new settlement engine over `store` with the given config
    pub fn new(store: &'a IndexStore, config: SettlementConfig) -> Self {
        Self {
            resolver: RateResolver::new(store),
            config,
        }
    }

    pub fn config(&self) -> &SettlementConfig {
        &self.config
    }

    /// Run the claim from its earliest tranche through the end event.
    ///
    /// Events may be given in any order; they are sorted by date with
    /// payments before capitalizations before the end marker on the same day.
    ///
    /// # Panics
    ///
    /// Panics if `tranches` is empty.
    pub fn simulate(&self, tranches: &[CapitalTranche], events: &[Event]) -> Result<SettlementResult, SettlementError> {
        assert!(!tranches.is_empty(), "settlement requires at least one capital tranche");

        validate_tranches(tranches)?;
        let events = validate_events(events)?;
        let horizon = events
            .iter()
            .find(|e| e.is_end())
            .map(Event::date)
            .ok_or(SettlementError::MissingHorizon)?;

        let mut order: Vec<&CapitalTranche> = tranches.iter().collect();
        order.sort_by_key(|t| (t.start_date, t.sequence_id));

        let first = order[0];
        let mut state = SettlementState::from_tranche(first);
        state
            .checked_total()
            .ok_or(SettlementError::Overflow { date: first.start_date })?;
        let mut last_date = first.start_date;
        let mut result = SettlementResult::new(self.config.index, horizon);
        result.tranches = order
            .iter()
            .map(|t| TrancheActivation {
                sequence_id: t.sequence_id,
                start_date: t.start_date,
                activated_on: None,
            })
            .collect();
        result.tranches[0].activated_on = Some(first.start_date);

        log::debug!(
            "Settlement start {} with tranche {}: principal {}, overdue interest {}",
            first.start_date,
            first.sequence_id,
            state.principal,
            state.overdue_interest
        );

        for event in &events {
            let date = event.date();

            // Tranches that started on or before this event
            for (idx, tranche) in order.iter().enumerate() {
                if result.tranches[idx].activated_on.is_some() || tranche.start_date > date {
                    continue;
                }
                self.activate_tranche(tranche, &mut state, &mut result, last_date)?;
                result.tranches[idx].activated_on = Some(tranche.start_date);
                last_date = last_date.max(tranche.start_date);
            }

            if date > last_date {
                let variation = self.required_rate(last_date, date)?;
                self.accrue(&mut state, &mut result, last_date, date, variation)?;
            }

            // Events dated before the first tranche never move the clock back
            last_date = last_date.max(date);

            match event {
                Event::Capitalization { .. } => capitalize(date, &mut state, &mut result)?,
                Event::Payment { amount, .. } => apply_payment(date, *amount, &mut state, &mut result),
                Event::End { .. } => break,
            }
        }

        log::debug!(
            "Settlement closed at {}: principal {}, accrued {}, overdue {}",
            last_date,
            state.principal,
            state.accrued_interest,
            state.overdue_interest
        );

        result.final_state = state;
        Ok(result)
    }

    fn required_rate(&self, from: NaiveDate, to: NaiveDate) -> Result<Variation, SettlementError> {
        let index = self.config.index;
        self.resolver
            .resolve(index, from, to)
            .map_err(|source| SettlementError::NoRateData { index, from, to, source })
    }

    fn activate_tranche(
        &self,
        tranche: &CapitalTranche,
        state: &mut SettlementState,
        result: &mut SettlementResult,
        last_date: NaiveDate,
    ) -> Result<(), SettlementError> {
        if last_date < tranche.start_date {
            match self.config.tranche_gap_policy {
                GapPolicy::Strict => {
                    let variation = self.required_rate(last_date, tranche.start_date)?;
                    self.accrue(state, result, last_date, tranche.start_date, variation)?;
                }
                GapPolicy::Tolerant => match self.resolver.resolve(self.config.index, last_date, tranche.start_date) {
                    Ok(variation) => self.accrue(state, result, last_date, tranche.start_date, variation)?,
                    Err(err) => log::warn!(
                        "Skipping accrual {} -> {} before tranche {}: {}",
                        last_date,
                        tranche.start_date,
                        tranche.sequence_id,
                        err
                    ),
                },
            }
        }

        state
            .incorporate(tranche)
            .ok_or(SettlementError::Overflow { date: tranche.start_date })?;
        result.record(
            tranche.start_date,
            HistoryEvent::TrancheIncorporated {
                sequence_id: tranche.sequence_id,
                capital: tranche.capital,
                initial_interest: tranche.initial_interest,
            },
            *state,
        );
        log::debug!(
            "Tranche {} incorporated on {}: capital {}, interest {}",
            tranche.sequence_id,
            tranche.start_date,
            tranche.capital,
            tranche.initial_interest
        );

        Ok(())
    }

    fn accrue(
        &self,
        state: &mut SettlementState,
        result: &mut SettlementResult,
        from: NaiveDate,
        to: NaiveDate,
        variation: Variation,
    ) -> Result<(), SettlementError> {
        let base = state.principal;
        let interest = state
            .accrue(variation.percent)
            .ok_or(SettlementError::Overflow { date: to })?;

        result.segments.push(InterestSegment {
            from,
            to,
            rate: variation.percent,
            base,
            interest,
            dataset: variation.dataset,
        });
        result.record(
            to,
            HistoryEvent::InterestAccrued {
                from,
                rate: variation.percent,
                base,
                amount: interest,
            },
            *state,
        );
        log::debug!("Accrued {} on {} at {}% for {} -> {}", interest, base, variation.percent, from, to);
        Ok(())
    }
}

/// Capital and initial interest must both be non-negative
fn validate_tranches(tranches: &[CapitalTranche]) -> Result<(), SettlementError> {
    match tranches
        .iter()
        .find(|t| t.capital < Decimal::ZERO || t.initial_interest < Decimal::ZERO)
    {
        Some(t) => Err(SettlementError::NegativeTranche {
            sequence_id: t.sequence_id,
        }),
        None => Ok(()),
    }
}

/// Sort events and check there is exactly one end and no non-positive payment
fn validate_events(events: &[Event]) -> Result<Vec<Event>, SettlementError> {
    for event in events {
        if let Event::Payment { date, amount } = event {
            if *amount <= Decimal::ZERO {
                return Err(SettlementError::NonPositivePayment {
                    date: *date,
                    amount: *amount,
                });
            }
        }
    }

    match events.iter().filter(|e| e.is_end()).count() {
        0 => Err(SettlementError::MissingHorizon),
        1 => Ok(sort_events(events)),
        count => Err(SettlementError::MultipleHorizons { count }),
    }
}

fn capitalize(date: NaiveDate, state: &mut SettlementState, result: &mut SettlementResult) -> Result<(), SettlementError> {
    if state.overdue_interest > Decimal::ZERO {
        let amount = state
            .capitalize_overdue_interest()
            .ok_or(SettlementError::Overflow { date })?;
        result.record(date, HistoryEvent::OverdueInterestCapitalized { amount }, *state);
    }
    if state.accrued_interest > Decimal::ZERO {
        let amount = state
            .capitalize_accrued_interest()
            .ok_or(SettlementError::Overflow { date })?;
        result.record(date, HistoryEvent::AccruedInterestCapitalized { amount }, *state);
    }
    Ok(())
}

/// Waterfall: overdue interest, then accrued interest, then principal, then leftover
fn apply_payment(date: NaiveDate, amount: Decimal, state: &mut SettlementState, result: &mut SettlementResult) {
    let mut remaining = amount;

    let paid = state.pay_overdue_interest(remaining);
    if paid > Decimal::ZERO {
        remaining -= paid;
        result.record(date, HistoryEvent::PaymentToOverdueInterest { amount: paid, remaining }, *state);
    }

    let paid = state.pay_accrued_interest(remaining);
    if paid > Decimal::ZERO {
        remaining -= paid;
        result.record(date, HistoryEvent::PaymentToAccruedInterest { amount: paid, remaining }, *state);
    }

    let paid = state.pay_principal(remaining);
    if paid > Decimal::ZERO {
        remaining -= paid;
        result.record(date, HistoryEvent::PaymentToPrincipal { amount: paid, remaining }, *state);
    }

    if remaining > Decimal::ZERO {
        result.record(date, HistoryEvent::PaymentLeftover { amount: remaining }, *state);
    }
}

/// Run a settlement with default configuration for `index`
pub fn simulate(
    store: &IndexStore,
    tranches: &[CapitalTranche],
    events: &[Event],
    index: IndexKind,
) -> Result<SettlementResult, SettlementError> {
    SettlementEngine::new(store, SettlementConfig::with_index(index)).simulate(tranches, events)
}
