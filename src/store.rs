use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::BillingConfig;
use crate::errors::{LedgerError, Result};
use crate::ledger::{CreditLedger, CreditLedgerEntry};
use crate::money::Money;
use crate::summary::AggregatedSummary;
use crate::types::{AllocationResult, PaidStatus, PaymentId, PeriodIndex, UnitId, Year};

/// a billable unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub config: BillingConfig,
    pub created_at: DateTime<Utc>,
}

/// one charge cycle for one unit in one fiscal year
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPeriod {
    pub index: PeriodIndex,
    pub amount_due: Money,
    pub amount_paid: Money,
    pub payment_ref: Option<PaymentId>,
}

impl BillingPeriod {
    pub fn open(index: PeriodIndex, amount_due: Money) -> Self {
        Self {
            index,
            amount_due,
            amount_paid: Money::ZERO,
            payment_ref: None,
        }
    }

    /// derived paid-status, never stored
    pub fn status(&self) -> PaidStatus {
        if self.amount_paid >= self.amount_due {
            PaidStatus::Paid
        } else if self.amount_paid.is_zero() {
            PaidStatus::Unpaid
        } else {
            PaidStatus::Partial
        }
    }

    /// amount still needed to fully fund this period
    pub fn shortfall(&self) -> Money {
        (self.amount_due - self.amount_paid).max(Money::ZERO)
    }
}

/// an inbound payment, immutable once recorded
///
/// Corrections are made by reversing and re-recording, never by editing in
/// place. The reversal marker is the one field the reversal engine may set,
/// exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub unit_id: UnitId,
    pub year: Year,
    pub amount: Money,
    pub date: NaiveDate,
    pub note: String,
    pub reference: String,
    pub allocation: AllocationResult,
    /// period-set version this payment was allocated against
    pub structure_version: u64,
    pub reversed: bool,
    pub reversed_at: Option<DateTime<Utc>>,
}

/// canonical per-year state for one unit: the billing periods plus the
/// credit ledger, versioned for stale-allocation detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearState {
    pub periods: Vec<BillingPeriod>,
    pub ledger: CreditLedger,
    /// bumped only by (re)initialization and bulk period seeding, not by
    /// ordinary paid-amount writes
    pub structure_version: u64,
}

impl YearState {
    fn empty() -> Self {
        Self {
            periods: Vec::new(),
            ledger: CreditLedger::new(),
            structure_version: 0,
        }
    }

    pub fn is_initialized(&self) -> bool {
        !self.periods.is_empty()
    }

    pub fn period_mut(&mut self, index: PeriodIndex) -> Option<&mut BillingPeriod> {
        self.periods.iter_mut().find(|p| p.index == index)
    }

    pub fn total_paid(&self) -> Money {
        self.periods.iter().map(|p| p.amount_paid).sum()
    }

    pub fn total_due(&self) -> Money {
        self.periods.iter().map(|p| p.amount_due).sum()
    }
}

/// in-memory document store standing in for the backing document database
///
/// Offers the two primitives the engine relies on: per-document atomic
/// writes (trivially true in memory) and a scoped snapshot/restore used as
/// the compensating-rollback path when a transaction cannot complete.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DocumentStore {
    units: HashMap<UnitId, Unit>,
    years: HashMap<UnitId, BTreeMap<Year, YearState>>,
    payments: HashMap<PaymentId, PaymentRecord>,
    summaries: HashMap<UnitId, BTreeMap<Year, AggregatedSummary>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- units ----

    pub fn register_unit(&mut self, unit: Unit) -> Result<()> {
        unit.config.validate()?;
        if self.units.contains_key(&unit.id) {
            return Err(LedgerError::InvalidConfiguration {
                message: format!("unit already registered: {}", unit.id),
            });
        }
        self.units.insert(unit.id, unit);
        Ok(())
    }

    pub fn unit(&self, unit_id: UnitId) -> Result<&Unit> {
        self.units
            .get(&unit_id)
            .ok_or(LedgerError::UnitNotFound { unit_id })
    }

    // ---- year state ----

    /// create the billing periods for a unit/year, all starting unpaid
    ///
    /// Re-initializing replaces the period set and bumps the structure
    /// version, invalidating reversals of payments allocated before. The
    /// credit ledger is preserved.
    pub fn init_year(&mut self, unit_id: UnitId, year: Year) -> Result<()> {
        let config = self.unit(unit_id)?.config.clone();

        let state = self
            .years
            .entry(unit_id)
            .or_default()
            .entry(year)
            .or_insert_with(YearState::empty);

        state.periods = (1..=config.periods_per_year)
            .map(|index| BillingPeriod::open(index, config.scheduled_amount))
            .collect();
        state.structure_version += 1;

        Ok(())
    }

    pub fn year(&self, unit_id: UnitId, year: Year) -> Option<&YearState> {
        self.years.get(&unit_id).and_then(|by_year| by_year.get(&year))
    }

    pub fn year_mut(&mut self, unit_id: UnitId, year: Year) -> Option<&mut YearState> {
        self.years
            .get_mut(&unit_id)
            .and_then(|by_year| by_year.get_mut(&year))
    }

    /// full-year purge: the only way periods are ever deleted
    pub fn purge_year(&mut self, unit_id: UnitId, year: Year) {
        if let Some(by_year) = self.years.get_mut(&unit_id) {
            by_year.remove(&year);
        }
        if let Some(by_year) = self.summaries.get_mut(&unit_id) {
            by_year.remove(&year);
        }
    }

    // ---- bulk seeding (historical migration) ----

    /// bulk-load a period set, replacing whatever exists for the year
    pub fn seed_periods(
        &mut self,
        unit_id: UnitId,
        year: Year,
        mut periods: Vec<BillingPeriod>,
    ) -> Result<()> {
        self.unit(unit_id)?;

        periods.sort_by_key(|p| p.index);
        let mut last: Option<PeriodIndex> = None;
        for period in &periods {
            if period.amount_due.is_negative() || period.amount_paid.is_negative() {
                return Err(LedgerError::InvalidAmount {
                    amount: period.amount_due.min(period.amount_paid),
                });
            }
            if last == Some(period.index) {
                return Err(LedgerError::InvalidConfiguration {
                    message: format!("duplicate period index {} in seed", period.index),
                });
            }
            last = Some(period.index);
        }

        let state = self
            .years
            .entry(unit_id)
            .or_default()
            .entry(year)
            .or_insert_with(YearState::empty);
        state.periods = periods;
        state.structure_version += 1;

        Ok(())
    }

    /// bulk-load historical credit-ledger entries
    pub fn seed_ledger_entries(
        &mut self,
        unit_id: UnitId,
        year: Year,
        entries: Vec<CreditLedgerEntry>,
    ) -> Result<()> {
        self.unit(unit_id)?;

        let state = self
            .years
            .entry(unit_id)
            .or_default()
            .entry(year)
            .or_insert_with(YearState::empty);
        for entry in entries {
            state.ledger.append(entry);
        }

        Ok(())
    }

    // ---- payments ----

    pub fn insert_payment(&mut self, payment: PaymentRecord) -> Result<()> {
        if self.payments.contains_key(&payment.id) {
            return Err(LedgerError::StorageFailure {
                message: format!("duplicate payment id: {}", payment.id),
            });
        }
        self.payments.insert(payment.id, payment);
        Ok(())
    }

    pub fn payment(&self, payment_id: PaymentId) -> Result<&PaymentRecord> {
        self.payments
            .get(&payment_id)
            .ok_or(LedgerError::PaymentNotFound { payment_id })
    }

    pub fn payment_mut(&mut self, payment_id: PaymentId) -> Result<&mut PaymentRecord> {
        self.payments
            .get_mut(&payment_id)
            .ok_or(LedgerError::PaymentNotFound { payment_id })
    }

    pub fn remove_payment(&mut self, payment_id: PaymentId) -> Option<PaymentRecord> {
        self.payments.remove(&payment_id)
    }

    // ---- summaries ----

    pub fn set_summary(&mut self, summary: AggregatedSummary) {
        self.summaries
            .entry(summary.unit_id)
            .or_default()
            .insert(summary.year, summary);
    }

    pub fn summary(&self, unit_id: UnitId, year: Year) -> Option<&AggregatedSummary> {
        self.summaries
            .get(&unit_id)
            .and_then(|by_year| by_year.get(&year))
    }

    // ---- transaction scope ----

    /// snapshot the documents a unit/year transaction may touch
    pub fn capture_scope(&self, unit_id: UnitId, year: Year) -> ScopeSnapshot {
        ScopeSnapshot {
            unit_id,
            year,
            year_state: self.year(unit_id, year).cloned(),
            summary: self.summary(unit_id, year).cloned(),
        }
    }

    /// restore a previously captured scope wholesale
    pub fn restore_scope(&mut self, snapshot: ScopeSnapshot) {
        let ScopeSnapshot {
            unit_id,
            year,
            year_state,
            summary,
        } = snapshot;

        let by_year = self.years.entry(unit_id).or_default();
        match year_state {
            Some(state) => {
                by_year.insert(year, state);
            }
            None => {
                by_year.remove(&year);
            }
        }

        let summaries = self.summaries.entry(unit_id).or_default();
        match summary {
            Some(s) => {
                summaries.insert(year, s);
            }
            None => {
                summaries.remove(&year);
            }
        }
    }

    // ---- state snapshot (export / debugging) ----

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| LedgerError::StorageFailure {
            message: format!("state serialization failed: {}", e),
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| LedgerError::StorageFailure {
            message: format!("state deserialization failed: {}", e),
        })
    }
}

/// captured pre-write state of one unit/year scope
#[derive(Debug, Clone)]
pub struct ScopeSnapshot {
    unit_id: UnitId,
    year: Year,
    year_state: Option<YearState>,
    summary: Option<AggregatedSummary>,
}
