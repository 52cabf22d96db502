//! Ledger command and observation surface.
//!
//! # Responsibility
//! - Normalize user-supplied values before they reach storage.
//! - Dispatch every command to the single serialized store worker.
//! - Publish store changes so live queries re-emit.
//!
//! # Invariants
//! - Titles and categories are trimmed before persistence.
//! - Unsupplied year/month default to the current calendar month
//!   (1-indexed); unsupplied income defaults to 0.
//! - Changes are published only after the write succeeded.
//! - Callers observe new state via live queries; commands return only the
//!   completion signal and, at creation time, the new id.

use chrono::{Datelike, Local, Utc};
use log::{info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::cycle::{Cycle, CycleId};
use crate::model::digest::CycleDigest;
use crate::model::entry::{EntryId, ExpenseEntry};
use crate::repo::cycle_repo::{CycleRepository, RepoError, RepoResult, SqliteCycleRepository};
use crate::repo::entry_repo::{ExpenseRepository, SqliteExpenseRepository};
use crate::watch::{StoreChange, Watch, WatchHub};
use crate::work::{Completion, StoreWorker};

const WORKER_THREAD_NAME: &str = "orbit-store";

/// Failures while bringing the service up.
#[derive(Debug)]
pub enum ServiceError {
    Db(DbError),
    WorkerSpawn(std::io::Error),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::WorkerSpawn(err) => write!(f, "failed to spawn store worker: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::WorkerSpawn(err) => Some(err),
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// Input for creating a cycle. Unset fields take defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleDraft {
    pub title: String,
    /// Defaults to the current calendar year.
    pub year: Option<i32>,
    /// Defaults to the current calendar month, 1-indexed.
    pub month: Option<u32>,
    /// Defaults to 0.
    pub income: Option<f64>,
}

/// Input for logging an expense under a cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseDraft {
    pub cycle_id: CycleId,
    pub title: String,
    /// Accepted as entered; no sign or range validation.
    pub amount: f64,
    pub category: String,
    /// Defaults to now. Past or future values are accepted unchecked.
    pub spent_at: Option<i64>,
}

/// State owned by the store worker: the connection plus the watch hub.
struct LedgerState {
    conn: Connection,
    hub: WatchHub,
}

/// Command and observation surface over one ledger database.
///
/// All mutating commands execute on a single serialized background worker;
/// the caller observes results through the live-query mechanism rather than
/// through returned state (ids at creation time excepted).
pub struct LedgerService {
    worker: StoreWorker<LedgerState>,
}

impl LedgerService {
    /// Opens (and migrates) the database file and starts the store worker.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ServiceError> {
        Self::with_connection(open_db(path)?)
    }

    /// In-memory variant for tests and smoke probes.
    pub fn open_in_memory() -> Result<Self, ServiceError> {
        Self::with_connection(open_db_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, ServiceError> {
        let state = LedgerState {
            conn,
            hub: WatchHub::new(),
        };
        let worker =
            StoreWorker::spawn(WORKER_THREAD_NAME, state).map_err(ServiceError::WorkerSpawn)?;
        Ok(Self { worker })
    }

    /// Creates a cycle from draft input and returns the new id.
    ///
    /// A duplicate `(year, month)` pair fails with the storage layer's
    /// constraint error; no second row is created.
    pub fn create_cycle(&self, draft: CycleDraft) -> Completion<RepoResult<CycleId>> {
        self.worker.submit(move |state| {
            let outcome = create_cycle_job(&state.conn, &draft);
            finish_write(state, "cycle_create", &StoreChange::Cycles, &outcome);
            outcome
        })
    }

    /// Replaces the full cycle record. The title is trimmed.
    pub fn update_cycle(&self, mut cycle: Cycle) -> Completion<RepoResult<()>> {
        self.worker.submit(move |state| {
            cycle.title = cycle.title.trim().to_string();
            let outcome = SqliteCycleRepository::try_new(&state.conn)
                .and_then(|repo| repo.update_cycle(&cycle));
            finish_write(state, "cycle_update", &StoreChange::Cycles, &outcome);
            outcome
        })
    }

    /// Replaces title/year/month of an existing cycle, leaving income alone.
    pub fn update_cycle_meta(
        &self,
        id: CycleId,
        title: String,
        year: i32,
        month: u32,
    ) -> Completion<RepoResult<()>> {
        self.worker.submit(move |state| {
            let outcome = update_meta_job(&state.conn, id, &title, year, month);
            finish_write(state, "cycle_update_meta", &StoreChange::Cycles, &outcome);
            outcome
        })
    }

    /// Income-only adjustment for the lighter "just change the number" edit.
    pub fn adjust_income(&self, id: CycleId, income: f64) -> Completion<RepoResult<()>> {
        self.worker.submit(move |state| {
            let outcome = adjust_income_job(&state.conn, id, income);
            finish_write(state, "cycle_adjust_income", &StoreChange::Cycles, &outcome);
            outcome
        })
    }

    /// Deletes a cycle; the storage cascade removes all owned entries.
    ///
    /// Irreversible. Explicit user confirmation is a presentation concern.
    pub fn delete_cycle(&self, id: CycleId) -> Completion<RepoResult<()>> {
        self.worker.submit(move |state| {
            let outcome = SqliteCycleRepository::try_new(&state.conn)
                .and_then(|repo| repo.delete_cycle(id));
            finish_write(state, "cycle_delete", &StoreChange::Cycles, &outcome);
            outcome
        })
    }

    /// Logs an expense under a cycle and returns the new id.
    pub fn add_expense(&self, draft: ExpenseDraft) -> Completion<RepoResult<EntryId>> {
        self.worker.submit(move |state| {
            let change = StoreChange::Entries {
                cycle_id: draft.cycle_id,
            };
            let outcome = add_expense_job(&state.conn, &draft);
            finish_write(state, "expense_add", &change, &outcome);
            outcome
        })
    }

    /// Replaces the full entry record. Title and category are trimmed.
    pub fn update_expense(&self, mut entry: ExpenseEntry) -> Completion<RepoResult<()>> {
        self.worker.submit(move |state| {
            entry.title = entry.title.trim().to_string();
            entry.category = entry.category.trim().to_string();
            let change = StoreChange::Entries {
                cycle_id: entry.cycle_id,
            };
            let outcome = SqliteExpenseRepository::try_new(&state.conn)
                .and_then(|repo| repo.update_entry(&entry));
            finish_write(state, "expense_update", &change, &outcome);
            outcome
        })
    }

    /// Deletes a single entry. Irreversible.
    pub fn delete_expense(&self, entry: ExpenseEntry) -> Completion<RepoResult<()>> {
        self.worker.submit(move |state| {
            let change = StoreChange::Entries {
                cycle_id: entry.cycle_id,
            };
            let outcome = SqliteExpenseRepository::try_new(&state.conn)
                .and_then(|repo| repo.delete_entry(entry.id));
            finish_write(state, "expense_delete", &change, &outcome);
            outcome
        })
    }

    /// One-shot fetch of a single cycle.
    pub fn get_cycle(&self, id: CycleId) -> Completion<RepoResult<Option<Cycle>>> {
        self.worker.submit(move |state| {
            SqliteCycleRepository::try_new(&state.conn).and_then(|repo| repo.get_cycle(id))
        })
    }

    /// One-shot fetch of a single entry.
    pub fn get_expense(&self, id: EntryId) -> Completion<RepoResult<Option<ExpenseEntry>>> {
        self.worker.submit(move |state| {
            SqliteExpenseRepository::try_new(&state.conn).and_then(|repo| repo.get_entry(id))
        })
    }

    /// Live list of all cycles, ordered by `(year DESC, month DESC)`.
    pub fn observe_cycles(&self) -> Completion<Watch<Vec<Cycle>>> {
        self.worker
            .submit(|state| state.hub.watch_cycles(&state.conn))
    }

    /// Live digest for one cycle. `None` once deleted or never existing.
    pub fn observe_digest(&self, id: CycleId) -> Completion<Watch<Option<CycleDigest>>> {
        self.worker
            .submit(move |state| state.hub.watch_digest(&state.conn, id))
    }

    /// One-shot snapshot of all cycles paired with their totals, used to
    /// seed the chart without holding a subscription.
    pub fn load_snapshot(&self) -> Completion<RepoResult<Vec<(Cycle, f64)>>> {
        self.worker.submit(|state| snapshot_job(&state.conn))
    }
}

fn finish_write<T>(
    state: &mut LedgerState,
    event: &str,
    change: &StoreChange,
    outcome: &RepoResult<T>,
) {
    match outcome {
        Ok(_) => {
            info!("event={event} module=service status=ok");
            state.hub.publish(&state.conn, change);
        }
        Err(err) => {
            warn!("event={event} module=service status=error error={err}");
        }
    }
}

fn create_cycle_job(conn: &Connection, draft: &CycleDraft) -> RepoResult<CycleId> {
    let now = Local::now();
    let year = draft.year.unwrap_or_else(|| now.year());
    let month = draft.month.unwrap_or_else(|| now.month());
    let income = draft.income.unwrap_or(0.0);

    let cycle = Cycle::new(draft.title.trim(), year, month, income);
    SqliteCycleRepository::try_new(conn)?.create_cycle(&cycle)
}

fn update_meta_job(
    conn: &Connection,
    id: CycleId,
    title: &str,
    year: i32,
    month: u32,
) -> RepoResult<()> {
    let repo = SqliteCycleRepository::try_new(conn)?;
    let mut cycle = repo.get_cycle(id)?.ok_or(RepoError::CycleNotFound(id))?;
    cycle.title = title.trim().to_string();
    cycle.year = year;
    cycle.month = month;
    repo.update_cycle(&cycle)
}

fn adjust_income_job(conn: &Connection, id: CycleId, income: f64) -> RepoResult<()> {
    let repo = SqliteCycleRepository::try_new(conn)?;
    let mut cycle = repo.get_cycle(id)?.ok_or(RepoError::CycleNotFound(id))?;
    cycle.income = income;
    repo.update_cycle(&cycle)
}

fn add_expense_job(conn: &Connection, draft: &ExpenseDraft) -> RepoResult<EntryId> {
    let entry = ExpenseEntry {
        id: 0,
        cycle_id: draft.cycle_id,
        title: draft.title.trim().to_string(),
        amount: draft.amount,
        category: draft.category.trim().to_string(),
        spent_at: draft
            .spent_at
            .unwrap_or_else(|| Utc::now().timestamp_millis()),
    };
    SqliteExpenseRepository::try_new(conn)?.create_entry(&entry)
}

fn snapshot_job(conn: &Connection) -> RepoResult<Vec<(Cycle, f64)>> {
    let cycles = SqliteCycleRepository::try_new(conn)?.list_cycles()?;
    let entry_repo = SqliteExpenseRepository::try_new(conn)?;

    cycles
        .into_iter()
        .map(|cycle| {
            let total = entry_repo.total_for_cycle(cycle.id)?;
            Ok((cycle, total))
        })
        .collect()
}
