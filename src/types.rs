use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{LedgerError, Result};
use crate::money::Money;

/// unique identifier for a billable unit
pub type UnitId = Uuid;

/// unique identifier for an inbound payment
pub type PaymentId = Uuid;

/// fiscal year
pub type Year = i32;

/// one-based billing period index within a fiscal year
pub type PeriodIndex = u32;

/// derived paid-status of a billing period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaidStatus {
    /// nothing applied yet
    Unpaid,
    /// some but not all of the amount due is covered
    Partial,
    /// amount due fully covered
    Paid,
}

/// origin of a credit-ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CreditSource {
    /// overflow or draw-down produced by the allocation engine
    Payment,
    /// manual admin credit adjustment
    AdminAdjustment,
    /// offsetting entry produced by the reversal engine
    Reversal,
}

/// money applied to one billing period by one payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodApplication {
    pub period: PeriodIndex,
    pub amount: Money,
}

/// the complete outcome of allocating one payment
///
/// `periods` lists only periods that received money, in the chronological
/// order they were touched. `credit_delta` is the single net change to the
/// stored credit balance (negative: existing credit consumed, positive:
/// overpayment banked). Validated at construction so ad hoc inconsistent
/// results cannot exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationResult {
    periods: Vec<PeriodApplication>,
    credit_delta: Money,
    remaining_credit: Money,
}

impl AllocationResult {
    pub fn new(
        periods: Vec<PeriodApplication>,
        credit_delta: Money,
        remaining_credit: Money,
    ) -> Result<Self> {
        let mut last_index: Option<PeriodIndex> = None;
        for application in &periods {
            if !application.amount.is_positive() {
                return Err(LedgerError::InvalidAmount {
                    amount: application.amount,
                });
            }
            if let Some(last) = last_index {
                if application.period <= last {
                    return Err(LedgerError::InvalidConfiguration {
                        message: format!(
                            "allocation periods out of order: {} after {}",
                            application.period, last
                        ),
                    });
                }
            }
            last_index = Some(application.period);
        }

        Ok(Self {
            periods,
            credit_delta,
            remaining_credit,
        })
    }

    /// periods touched, in the order they were filled
    pub fn periods(&self) -> &[PeriodApplication] {
        &self.periods
    }

    /// net signed change to the stored credit balance
    pub fn credit_delta(&self) -> Money {
        self.credit_delta
    }

    /// credit balance after the payment was applied
    pub fn remaining_credit(&self) -> Money {
        self.remaining_credit
    }

    /// total applied across billing periods
    pub fn total_applied(&self) -> Money {
        self.periods.iter().map(|a| a.amount).sum()
    }
}

/// outcome of reversing a payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReversalOutcome {
    /// every period application was fully backed out
    Clean,
    /// some applied amount could not be subtracted (period already drained by
    /// a later edit); the remainder was redirected to the credit ledger
    PartialReversalAdjusted {
        redirected: Money,
    },
}

impl ReversalOutcome {
    pub fn is_adjusted(&self) -> bool {
        matches!(self, ReversalOutcome::PartialReversalAdjusted { .. })
    }
}
