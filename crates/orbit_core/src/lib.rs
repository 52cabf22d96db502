//! Core domain logic for the Orbit monthly-expense ledger.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod stats;
pub mod watch;
pub mod work;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::cycle::{month_abbrev, month_name, Cycle, CycleId, CycleValidationError};
pub use model::digest::CycleDigest;
pub use model::entry::{EntryId, ExpenseEntry, FALLBACK_CATEGORY};
pub use repo::cycle_repo::{CycleRepository, RepoError, RepoResult, SqliteCycleRepository};
pub use repo::entry_repo::{ExpenseRepository, SqliteExpenseRepository};
pub use service::ledger_service::{CycleDraft, ExpenseDraft, LedgerService, ServiceError};
pub use stats::{
    average_spend, axis_scale, balance, category_spread, chart_series, total_spent, ChartPoint,
    ChartWindow, CHART_WINDOW_SIZE,
};
pub use watch::{StoreChange, Watch};
pub use work::{Completion, StoreWorker, WorkerError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
