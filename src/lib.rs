pub mod allocation;
pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod money;
pub mod reversal;
pub mod store;
pub mod summary;
pub mod types;

// re-export key types
pub use allocation::{plan_allocation, AllocationPlan};
pub use config::BillingConfig;
pub use engine::DuesEngine;
pub use errors::{LedgerError, Result};
pub use events::{Event, EventStore};
pub use ledger::{CreditLedger, CreditLedgerEntry};
pub use money::Money;
pub use reversal::{plan_reversal, ReversalPlan};
pub use store::{BillingPeriod, DocumentStore, PaymentRecord, Unit, YearState};
pub use summary::{build_summary, AggregatedSummary, PeriodSummary, YearStatus};
pub use types::{
    AllocationResult, CreditSource, PaidStatus, PaymentId, PeriodApplication, PeriodIndex,
    ReversalOutcome, UnitId, Year,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use uuid::Uuid;
