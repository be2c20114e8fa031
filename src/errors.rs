use thiserror::Error;

use crate::money::Money;
use crate::types::{PaymentId, UnitId, Year};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("invalid amount: {amount}")]
    InvalidAmount {
        amount: Money,
    },

    #[error("unit not found: {unit_id}")]
    UnitNotFound {
        unit_id: UnitId,
    },

    #[error("year {year} not initialized for unit {unit_id}")]
    YearNotInitialized {
        unit_id: UnitId,
        year: Year,
    },

    #[error("payment not found: {payment_id}")]
    PaymentNotFound {
        payment_id: PaymentId,
    },

    #[error("payment already reversed: {payment_id}")]
    AlreadyReversed {
        payment_id: PaymentId,
    },

    #[error("stale allocation state for payment {payment_id}: allocated against period-set version {allocated_version}, current version {current_version}")]
    StaleAllocationState {
        payment_id: PaymentId,
        allocated_version: u64,
        current_version: u64,
    },

    #[error("concurrent operation in flight for unit {unit_id} year {year}")]
    TransactionConflict {
        unit_id: UnitId,
        year: Year,
    },

    #[error("storage failure: {message}")]
    StorageFailure {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, LedgerError>;
