use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, Result};
use crate::money::Money;

/// billing configuration for one unit
///
/// `scheduled_amount` is the amount due per period; `fiscal_start_month`
/// maps period index 1 to a calendar month for display purposes only.
/// Ordering inside a year is always by period index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingConfig {
    pub periods_per_year: u32,
    pub fiscal_start_month: u32,
    pub scheduled_amount: Money,
}

impl BillingConfig {
    /// standard monthly dues cycle starting in january
    pub fn monthly(scheduled_amount: Money) -> Self {
        Self {
            periods_per_year: 12,
            fiscal_start_month: 1,
            scheduled_amount,
        }
    }

    /// metered-utility style cycle with a custom number of reading periods
    pub fn cycles(periods_per_year: u32, scheduled_amount: Money) -> Self {
        Self {
            periods_per_year,
            fiscal_start_month: 1,
            scheduled_amount,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.periods_per_year == 0 {
            return Err(LedgerError::InvalidConfiguration {
                message: "periods_per_year must be at least 1".to_string(),
            });
        }
        if !(1..=12).contains(&self.fiscal_start_month) {
            return Err(LedgerError::InvalidConfiguration {
                message: format!("fiscal_start_month out of range: {}", self.fiscal_start_month),
            });
        }
        if !self.scheduled_amount.is_positive() {
            return Err(LedgerError::InvalidAmount {
                amount: self.scheduled_amount,
            });
        }
        Ok(())
    }
}
