use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{PaymentId, UnitId, Year};

/// all audit events emitted by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // setup events
    UnitRegistered {
        unit_id: UnitId,
        name: String,
    },
    YearInitialized {
        unit_id: UnitId,
        year: Year,
        periods: u32,
        scheduled_amount: Money,
    },

    // allocation events
    PaymentAllocated {
        payment_id: PaymentId,
        unit_id: UnitId,
        year: Year,
        amount: Money,
        payment_date: NaiveDate,
        periods_touched: u32,
        credit_delta: Money,
        timestamp: DateTime<Utc>,
    },

    // reversal events
    PaymentReversed {
        payment_id: PaymentId,
        unit_id: UnitId,
        year: Year,
        ledger_delta: Money,
        timestamp: DateTime<Utc>,
    },
    ReversalAdjusted {
        payment_id: PaymentId,
        unit_id: UnitId,
        year: Year,
        redirected: Money,
        timestamp: DateTime<Utc>,
    },

    // credit-ledger events
    AdminAdjustmentRecorded {
        unit_id: UnitId,
        year: Year,
        delta: Money,
        actor: String,
        new_balance: Money,
        timestamp: DateTime<Utc>,
    },

    // aggregation events
    SummaryResynced {
        unit_id: UnitId,
        year: Year,
        total_paid: Money,
        outstanding: Money,
        credit_balance: Money,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
