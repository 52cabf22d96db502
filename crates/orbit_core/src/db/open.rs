//! Connection bootstrap for the ledger store.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by core behavior.
//! - Trigger schema migrations before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`, so cycle deletes cascade
//!   to owned ledger entries.
//! - Returned connections have migrations fully applied.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the ledger store lives for one connection.
enum StoreLocation<'a> {
    File(&'a Path),
    Memory,
}

impl StoreLocation<'_> {
    fn label(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }

    fn connect(&self) -> rusqlite::Result<Connection> {
        match self {
            Self::File(path) => Connection::open(path),
            Self::Memory => Connection::open_in_memory(),
        }
    }
}

/// Opens a ledger database file and applies all pending migrations.
///
/// # Side effects
/// - Performs connection bootstrap and migration checks.
/// - Emits `ledger_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_ledger_store(&StoreLocation::File(path.as_ref()))
}

/// Opens an in-memory ledger database and applies all pending migrations.
///
/// Used by tests and the CLI smoke probe.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_ledger_store(&StoreLocation::Memory)
}

fn open_ledger_store(location: &StoreLocation<'_>) -> DbResult<Connection> {
    let started_at = Instant::now();
    let store = location.label();
    info!("event=ledger_open module=db db=ledger store={store} status=start");

    let mut conn = location.connect().map_err(|err| {
        error!(
            "event=ledger_open module=db db=ledger store={store} status=error duration_ms={} error_code=connect_failed error={err}",
            started_at.elapsed().as_millis()
        );
        DbError::from(err)
    })?;

    if let Err(err) = prepare_ledger_connection(&mut conn) {
        error!(
            "event=ledger_open module=db db=ledger store={store} status=error duration_ms={} error_code=bootstrap_failed error={err}",
            started_at.elapsed().as_millis()
        );
        return Err(err);
    }

    info!(
        "event=ledger_open module=db db=ledger store={store} status=ok duration_ms={}",
        started_at.elapsed().as_millis()
    );
    Ok(conn)
}

fn prepare_ledger_connection(conn: &mut Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(conn)
}
