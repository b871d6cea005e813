//! Running balance of a claim during settlement

use super::event::CapitalTranche;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Balance of a claim at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementState {
    /// Principal, including any capitalized interest
    pub principal: Decimal,

    /// Interest accrued by the index since the last capitalization
    pub accrued_interest: Decimal,

    /// Interest already owed when tranches entered, not yet capitalized
    pub overdue_interest: Decimal,
}

impl SettlementState {
    /// Initial balance from the first tranche
    pub fn from_tranche(tranche: &CapitalTranche) -> Self {
        Self {
            principal: tranche.capital,
            accrued_interest: Decimal::ZERO,
            overdue_interest: tranche.initial_interest,
        }
    }

    /// Amount owed: principal plus both interest buckets.
    ///
    /// Every mutator below keeps this sum inside the decimal range; use
    /// [`SettlementState::checked_total`] for a state built by hand.
    pub fn total(&self) -> Decimal {
        self.principal + self.accrued_interest + self.overdue_interest
    }

    pub fn checked_total(&self) -> Option<Decimal> {
        self.principal
            .checked_add(self.accrued_interest)?
            .checked_add(self.overdue_interest)
    }

    /// Replace the balance if its total is representable
    fn commit(&mut self, next: SettlementState) -> Option<()> {
        next.checked_total()?;
        *self = next;
        Some(())
    }

    /// Accrue interest on the current principal for a variation in percent.
    /// None, with the balance untouched, when the result leaves the decimal range.
    pub fn accrue(&mut self, percent: Decimal) -> Option<Decimal> {
        let interest = self.principal.checked_mul(percent)? / Decimal::ONE_HUNDRED;
        self.commit(SettlementState {
            accrued_interest: self.accrued_interest.checked_add(interest)?,
            ..*self
        })?;
        Some(interest)
    }

    /// Fold a newly active tranche into the balance
    pub fn incorporate(&mut self, tranche: &CapitalTranche) -> Option<()> {
        self.commit(SettlementState {
            principal: self.principal.checked_add(tranche.capital)?,
            overdue_interest: self.overdue_interest.checked_add(tranche.initial_interest)?,
            ..*self
        })
    }

    /// Move overdue interest into principal, returning the amount moved
    pub fn capitalize_overdue_interest(&mut self) -> Option<Decimal> {
        let amount = self.overdue_interest.max(Decimal::ZERO);
        self.commit(SettlementState {
            principal: self.principal.checked_add(amount)?,
            overdue_interest: Decimal::ZERO,
            ..*self
        })?;
        Some(amount)
    }

    /// Move accrued interest into principal, returning the amount moved
    pub fn capitalize_accrued_interest(&mut self) -> Option<Decimal> {
        let amount = self.accrued_interest.max(Decimal::ZERO);
        self.commit(SettlementState {
            principal: self.principal.checked_add(amount)?,
            accrued_interest: Decimal::ZERO,
            ..*self
        })?;
        Some(amount)
    }

    pub fn pay_overdue_interest(&mut self, available: Decimal) -> Decimal {
        take(&mut self.overdue_interest, available)
    }

    pub fn pay_accrued_interest(&mut self, available: Decimal) -> Decimal {
        take(&mut self.accrued_interest, available)
    }

    pub fn pay_principal(&mut self, available: Decimal) -> Decimal {
        take(&mut self.principal, available)
    }
}

/// Reduce `bucket` by up to `available`, never below zero
fn take(bucket: &mut Decimal, available: Decimal) -> Decimal {
    if *bucket <= Decimal::ZERO || available <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let paid = available.min(*bucket);
    *bucket = (*bucket - paid).max(Decimal::ZERO);
    paid
}
