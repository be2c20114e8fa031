use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::CreditSource;

/// one row in the append-only credit history
///
/// `date` orders the ledger for display; the balance itself is a pure sum
/// and does not depend on entry order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditLedgerEntry {
    pub delta: Money,
    pub date: NaiveDate,
    pub source: CreditSource,
    pub note: String,
    pub actor: String,
    pub recorded_at: DateTime<Utc>,
}

/// append-only credit history for one unit/year
///
/// The current balance is never stored as a mutable scalar; it is re-derived
/// by folding the entries every time it is read. Corrections are new
/// offsetting entries, never edits or deletions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreditLedger {
    entries: Vec<CreditLedgerEntry>,
}

impl CreditLedger {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// append one entry and return the new balance
    pub fn append(&mut self, entry: CreditLedgerEntry) -> Money {
        self.entries.push(entry);
        self.balance()
    }

    /// current balance: the running sum of all entries
    pub fn balance(&self) -> Money {
        self.entries.iter().map(|e| e.delta).sum()
    }

    /// full history, in insertion order
    pub fn entries(&self) -> &[CreditLedgerEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
