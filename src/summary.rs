use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::store::YearState;
use crate::types::{PaidStatus, PeriodIndex, UnitId, Year};

/// per-period slice of the denormalized summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub index: PeriodIndex,
    pub amount_due: Money,
    pub amount_paid: Money,
    pub status: PaidStatus,
}

/// overall standing of a unit/year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum YearStatus {
    /// no billing periods exist yet
    NotBilled,
    /// at least one period is unpaid or partial
    Outstanding,
    /// every period fully paid
    PaidUp,
    /// every period fully paid and surplus credit is held
    InCredit,
}

/// denormalized per-unit-per-year snapshot for fast reads
///
/// Entirely derived: regenerated wholesale by [`build_summary`], never
/// patched incrementally. Deliberately carries no generation timestamp so
/// that two consecutive rebuilds with no intervening writes are
/// byte-identical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedSummary {
    pub unit_id: UnitId,
    pub year: Year,
    pub periods: Vec<PeriodSummary>,
    pub total_due: Money,
    pub total_paid: Money,
    pub outstanding: Money,
    pub credit_balance: Money,
    pub year_status: YearStatus,
}

/// rebuild the summary from the authoritative period set and ledger
///
/// A missing/uninitialized year yields an empty zeroed summary rather than
/// an error, so the read path never breaks on a not-yet-billed unit/year.
pub fn build_summary(unit_id: UnitId, year: Year, state: Option<&YearState>) -> AggregatedSummary {
    let Some(state) = state.filter(|s| s.is_initialized()) else {
        let credit_balance = state.map(|s| s.ledger.balance()).unwrap_or(Money::ZERO);
        return AggregatedSummary {
            unit_id,
            year,
            periods: Vec::new(),
            total_due: Money::ZERO,
            total_paid: Money::ZERO,
            outstanding: Money::ZERO,
            credit_balance,
            year_status: YearStatus::NotBilled,
        };
    };

    let periods: Vec<PeriodSummary> = state
        .periods
        .iter()
        .map(|p| PeriodSummary {
            index: p.index,
            amount_due: p.amount_due,
            amount_paid: p.amount_paid,
            status: p.status(),
        })
        .collect();

    let total_due = state.total_due();
    let total_paid = state.total_paid();
    let outstanding: Money = state.periods.iter().map(|p| p.shortfall()).sum();
    let credit_balance = state.ledger.balance();

    let year_status = if outstanding.is_positive() {
        YearStatus::Outstanding
    } else if credit_balance.is_positive() {
        YearStatus::InCredit
    } else {
        YearStatus::PaidUp
    };

    AggregatedSummary {
        unit_id,
        year,
        periods,
        total_due,
        total_paid,
        outstanding,
        credit_balance,
        year_status,
    }
}
