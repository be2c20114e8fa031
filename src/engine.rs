use std::collections::HashSet;

use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use uuid::Uuid;

use crate::allocation::plan_allocation;
use crate::config::BillingConfig;
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::ledger::CreditLedgerEntry;
use crate::money::Money;
use crate::reversal::plan_reversal;
use crate::store::{DocumentStore, PaymentRecord, Unit};
use crate::summary::{build_summary, AggregatedSummary};
use crate::types::{CreditSource, PaymentId, ReversalOutcome, UnitId, Year};

/// payment allocation and credit-balance reconciliation engine
///
/// Owns the document store and enforces single-writer semantics per
/// (unit, year): a second operation entering a unit-year already in flight
/// fails with `TransactionConflict`. Every mutating operation computes a
/// complete plan first, then applies all writes inside a snapshot-guarded
/// scope whose final step is always the summary resync.
pub struct DuesEngine {
    store: DocumentStore,
    events: EventStore,
    in_flight: HashSet<(UnitId, Year)>,
}

impl DuesEngine {
    pub fn new() -> Self {
        Self {
            store: DocumentStore::new(),
            events: EventStore::new(),
            in_flight: HashSet::new(),
        }
    }

    pub fn with_store(store: DocumentStore) -> Self {
        Self {
            store,
            events: EventStore::new(),
            in_flight: HashSet::new(),
        }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    // ---- setup ----

    pub fn register_unit(
        &mut self,
        name: &str,
        config: BillingConfig,
        time_provider: &SafeTimeProvider,
    ) -> Result<UnitId> {
        let unit_id = Uuid::new_v4();
        self.store.register_unit(Unit {
            id: unit_id,
            name: name.to_string(),
            config,
            created_at: time_provider.now(),
        })?;

        self.events.emit(Event::UnitRegistered {
            unit_id,
            name: name.to_string(),
        });

        Ok(unit_id)
    }

    pub fn init_year(&mut self, unit_id: UnitId, year: Year) -> Result<()> {
        self.begin(unit_id, year)?;
        let result = self.init_year_locked(unit_id, year);
        self.end(unit_id, year);
        result
    }

    fn init_year_locked(&mut self, unit_id: UnitId, year: Year) -> Result<()> {
        let config = self.store.unit(unit_id)?.config.clone();
        self.store.init_year(unit_id, year)?;
        self.resync_locked(unit_id, year);

        self.events.emit(Event::YearInitialized {
            unit_id,
            year,
            periods: config.periods_per_year,
            scheduled_amount: config.scheduled_amount,
        });

        Ok(())
    }

    // ---- allocation ----

    /// allocate one inbound payment across the unit/year's outstanding
    /// periods and the credit ledger, atomically
    pub fn allocate(
        &mut self,
        unit_id: UnitId,
        year: Year,
        amount: Money,
        date: NaiveDate,
        note: &str,
        reference: &str,
        time_provider: &SafeTimeProvider,
    ) -> Result<PaymentRecord> {
        self.begin(unit_id, year)?;
        let result =
            self.allocate_locked(unit_id, year, amount, date, note, reference, time_provider);
        self.end(unit_id, year);
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn allocate_locked(
        &mut self,
        unit_id: UnitId,
        year: Year,
        amount: Money,
        date: NaiveDate,
        note: &str,
        reference: &str,
        time_provider: &SafeTimeProvider,
    ) -> Result<PaymentRecord> {
        self.store.unit(unit_id)?;
        let state = self
            .store
            .year(unit_id, year)
            .filter(|s| s.is_initialized())
            .ok_or(LedgerError::YearNotInitialized { unit_id, year })?;

        // pure planning phase: any rejection here has no side effects
        let balance = state.ledger.balance();
        let plan = plan_allocation(&state.periods, balance, amount)?;
        let allocation = plan.clone().into_result()?;
        let structure_version = state.structure_version;

        let payment_id = Uuid::new_v4();
        let payment = PaymentRecord {
            id: payment_id,
            unit_id,
            year,
            amount,
            date,
            note: note.to_string(),
            reference: reference.to_string(),
            allocation,
            structure_version,
            reversed: false,
            reversed_at: None,
        };

        // transactional apply: all writes or none
        let snapshot = self.store.capture_scope(unit_id, year);
        let applied: Result<()> = (|| {
            let state = self
                .store
                .year_mut(unit_id, year)
                .ok_or_else(|| LedgerError::StorageFailure {
                    message: "year state vanished mid-transaction".to_string(),
                })?;

            for application in payment.allocation.periods() {
                let period = state.period_mut(application.period).ok_or_else(|| {
                    LedgerError::StorageFailure {
                        message: format!("period {} vanished mid-transaction", application.period),
                    }
                })?;
                period.amount_paid += application.amount;
                period.payment_ref = Some(payment_id);
            }

            if !plan.credit_delta.is_zero() {
                state.ledger.append(CreditLedgerEntry {
                    delta: plan.credit_delta,
                    date,
                    source: CreditSource::Payment,
                    note: format!("payment {}", reference),
                    actor: "allocation-engine".to_string(),
                    recorded_at: time_provider.now(),
                });
            }

            self.store.insert_payment(payment.clone())?;
            Ok(())
        })();

        if let Err(error) = applied {
            self.store.remove_payment(payment_id);
            self.store.restore_scope(snapshot);
            return Err(error);
        }

        self.resync_locked(unit_id, year);

        tracing::info!(
            payment_id = %payment_id,
            unit_id = %unit_id,
            year,
            amount = %amount,
            periods_touched = payment.allocation.periods().len(),
            credit_delta = %payment.allocation.credit_delta(),
            "payment allocated"
        );
        self.events.emit(Event::PaymentAllocated {
            payment_id,
            unit_id,
            year,
            amount,
            payment_date: date,
            periods_touched: payment.allocation.periods().len() as u32,
            credit_delta: payment.allocation.credit_delta(),
            timestamp: time_provider.now(),
        });

        Ok(payment)
    }

    // ---- reversal ----

    /// apply the exact inverse of a previously-applied allocation
    pub fn reverse(
        &mut self,
        payment_id: PaymentId,
        time_provider: &SafeTimeProvider,
    ) -> Result<ReversalOutcome> {
        let payment = self.store.payment(payment_id)?.clone();
        let (unit_id, year) = (payment.unit_id, payment.year);

        self.begin(unit_id, year)?;
        let result = self.reverse_locked(payment, time_provider);
        self.end(unit_id, year);
        result
    }

    fn reverse_locked(
        &mut self,
        payment: PaymentRecord,
        time_provider: &SafeTimeProvider,
    ) -> Result<ReversalOutcome> {
        let (unit_id, year, payment_id) = (payment.unit_id, payment.year, payment.id);

        if payment.reversed {
            return Err(LedgerError::AlreadyReversed { payment_id });
        }

        let state = self.store.year(unit_id, year);
        let current_version = state.map(|s| s.structure_version).unwrap_or(0);
        if current_version != payment.structure_version {
            return Err(LedgerError::StaleAllocationState {
                payment_id,
                allocated_version: payment.structure_version,
                current_version,
            });
        }
        let state = state.ok_or(LedgerError::YearNotInitialized { unit_id, year })?;

        let plan = plan_reversal(&state.periods, &payment.allocation)?;
        let reversal_date = time_provider.now().date_naive();

        let snapshot = self.store.capture_scope(unit_id, year);
        let applied: Result<()> = (|| {
            let state = self
                .store
                .year_mut(unit_id, year)
                .ok_or_else(|| LedgerError::StorageFailure {
                    message: "year state vanished mid-transaction".to_string(),
                })?;

            for subtraction in &plan.subtractions {
                let period = state.period_mut(subtraction.period).ok_or_else(|| {
                    LedgerError::StorageFailure {
                        message: format!("period {} vanished mid-transaction", subtraction.period),
                    }
                })?;
                period.amount_paid -= subtraction.amount;
                if period.payment_ref == Some(payment_id) {
                    period.payment_ref = None;
                }
            }

            if !plan.ledger_delta.is_zero() {
                state.ledger.append(CreditLedgerEntry {
                    delta: plan.ledger_delta,
                    date: reversal_date,
                    source: CreditSource::Reversal,
                    note: format!("reversal of payment {}", payment_id),
                    actor: "reversal-engine".to_string(),
                    recorded_at: time_provider.now(),
                });
            }

            let record = self.store.payment_mut(payment_id)?;
            record.reversed = true;
            record.reversed_at = Some(time_provider.now());
            Ok(())
        })();

        if let Err(error) = applied {
            self.store.restore_scope(snapshot);
            return Err(error);
        }

        self.resync_locked(unit_id, year);

        tracing::info!(
            payment_id = %payment_id,
            unit_id = %unit_id,
            year,
            ledger_delta = %plan.ledger_delta,
            "payment reversed"
        );
        self.events.emit(Event::PaymentReversed {
            payment_id,
            unit_id,
            year,
            ledger_delta: plan.ledger_delta,
            timestamp: time_provider.now(),
        });

        if let ReversalOutcome::PartialReversalAdjusted { redirected } = plan.outcome {
            tracing::warn!(
                payment_id = %payment_id,
                unit_id = %unit_id,
                year,
                redirected = %redirected,
                "reversal clamped: redirected un-subtractable amount to credit ledger"
            );
            self.events.emit(Event::ReversalAdjusted {
                payment_id,
                unit_id,
                year,
                redirected,
                timestamp: time_provider.now(),
            });
        }

        Ok(plan.outcome)
    }

    // ---- credit ledger ----

    /// record a manual admin credit adjustment; returns the new balance
    pub fn append_admin_adjustment(
        &mut self,
        unit_id: UnitId,
        year: Year,
        delta: Money,
        date: NaiveDate,
        note: &str,
        actor: &str,
        time_provider: &SafeTimeProvider,
    ) -> Result<Money> {
        self.begin(unit_id, year)?;
        let result =
            self.append_admin_adjustment_locked(unit_id, year, delta, date, note, actor, time_provider);
        self.end(unit_id, year);
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn append_admin_adjustment_locked(
        &mut self,
        unit_id: UnitId,
        year: Year,
        delta: Money,
        date: NaiveDate,
        note: &str,
        actor: &str,
        time_provider: &SafeTimeProvider,
    ) -> Result<Money> {
        self.store.unit(unit_id)?;
        if delta.is_zero() {
            return Err(LedgerError::InvalidAmount { amount: delta });
        }
        if note.trim().is_empty() {
            return Err(LedgerError::InvalidConfiguration {
                message: "admin adjustment requires a note".to_string(),
            });
        }

        let state = self
            .store
            .year_mut(unit_id, year)
            .ok_or(LedgerError::YearNotInitialized { unit_id, year })?;

        let new_balance = state.ledger.append(CreditLedgerEntry {
            delta,
            date,
            source: CreditSource::AdminAdjustment,
            note: note.to_string(),
            actor: actor.to_string(),
            recorded_at: time_provider.now(),
        });

        self.resync_locked(unit_id, year);

        tracing::info!(
            unit_id = %unit_id,
            year,
            delta = %delta,
            actor,
            new_balance = %new_balance,
            "admin credit adjustment recorded"
        );
        self.events.emit(Event::AdminAdjustmentRecorded {
            unit_id,
            year,
            delta,
            actor: actor.to_string(),
            new_balance,
            timestamp: time_provider.now(),
        });

        Ok(new_balance)
    }

    /// current credit balance: the running sum of all ledger entries
    pub fn current_balance(&self, unit_id: UnitId, year: Year) -> Money {
        self.store
            .year(unit_id, year)
            .map(|s| s.ledger.balance())
            .unwrap_or(Money::ZERO)
    }

    // ---- aggregation ----

    /// regenerate the unit/year summary wholesale from authoritative state
    ///
    /// Idempotent: with no intervening writes, consecutive calls produce
    /// byte-identical summaries. Import tooling must call this for every
    /// unit/year it bulk-seeded.
    pub fn resync(&mut self, unit_id: UnitId, year: Year) -> AggregatedSummary {
        let summary = self.resync_locked(unit_id, year);
        self.events.emit(Event::SummaryResynced {
            unit_id,
            year,
            total_paid: summary.total_paid,
            outstanding: summary.outstanding,
            credit_balance: summary.credit_balance,
        });
        summary
    }

    fn resync_locked(&mut self, unit_id: UnitId, year: Year) -> AggregatedSummary {
        let summary = build_summary(unit_id, year, self.store.year(unit_id, year));
        if self.store.year(unit_id, year).is_some() {
            self.store.set_summary(summary.clone());
        }
        summary
    }

    // ---- single-writer guard ----

    fn begin(&mut self, unit_id: UnitId, year: Year) -> Result<()> {
        if !self.in_flight.insert((unit_id, year)) {
            return Err(LedgerError::TransactionConflict { unit_id, year });
        }
        Ok(())
    }

    fn end(&mut self, unit_id: UnitId, year: Year) {
        self.in_flight.remove(&(unit_id, year));
    }
}

impl Default for DuesEngine {
    fn default() -> Self {
        Self::new()
    }
}
