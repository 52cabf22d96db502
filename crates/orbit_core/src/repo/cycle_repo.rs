//! Cycle repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over the canonical `cycles` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths must call `Cycle::validate()` before SQL mutations.
//! - Read paths must reject invalid persisted state instead of masking it.
//! - A duplicate `(year, month)` insert surfaces as the storage layer's
//!   constraint error, not a distinct variant.

use crate::db::DbError;
use crate::model::cycle::{Cycle, CycleId, CycleValidationError};
use crate::model::entry::EntryId;
use rusqlite::{params, Connection, Row};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

const CYCLE_SELECT_SQL: &str = "SELECT
    id,
    title,
    year,
    month,
    income,
    created_at
FROM cycles";

const CYCLES_REQUIRED_COLUMNS: &[&str] =
    &["id", "title", "year", "month", "income", "created_at"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for ledger persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(CycleValidationError),
    Db(DbError),
    CycleNotFound(CycleId),
    EntryNotFound(EntryId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::CycleNotFound(id) => write!(f, "cycle not found: {id}"),
            Self::EntryNotFound(id) => write!(f, "ledger entry not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted ledger data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; run migrations first"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table is missing: {table}")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column is missing: {table}.{column}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CycleValidationError> for RepoError {
    fn from(value: CycleValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Storage(value))
    }
}

/// Repository interface for cycle CRUD operations.
pub trait CycleRepository {
    /// Persists one cycle and returns the storage-assigned id.
    fn create_cycle(&self, cycle: &Cycle) -> RepoResult<CycleId>;
    /// Replaces title/year/month/income of an existing cycle.
    fn update_cycle(&self, cycle: &Cycle) -> RepoResult<()>;
    /// Gets one cycle by id.
    fn get_cycle(&self, id: CycleId) -> RepoResult<Option<Cycle>>;
    /// Lists all cycles ordered by `(year DESC, month DESC)`.
    fn list_cycles(&self) -> RepoResult<Vec<Cycle>>;
    /// Hard-deletes one cycle; owned entries cascade at the storage layer.
    fn delete_cycle(&self, id: CycleId) -> RepoResult<()>;
}

/// SQLite-backed cycle repository.
pub struct SqliteCycleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCycleRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CycleRepository for SqliteCycleRepository<'_> {
    fn create_cycle(&self, cycle: &Cycle) -> RepoResult<CycleId> {
        cycle.validate()?;

        self.conn.execute(
            "INSERT INTO cycles (title, year, month, income, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                cycle.title.as_str(),
                cycle.year,
                cycle.month,
                cycle.income,
                cycle.created_at,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_cycle(&self, cycle: &Cycle) -> RepoResult<()> {
        cycle.validate()?;

        let changed = self.conn.execute(
            "UPDATE cycles
             SET
                title = ?1,
                year = ?2,
                month = ?3,
                income = ?4
             WHERE id = ?5;",
            params![
                cycle.title.as_str(),
                cycle.year,
                cycle.month,
                cycle.income,
                cycle.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::CycleNotFound(cycle.id));
        }

        Ok(())
    }

    fn get_cycle(&self, id: CycleId) -> RepoResult<Option<Cycle>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CYCLE_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_cycle_row(row)?));
        }

        Ok(None)
    }

    fn list_cycles(&self) -> RepoResult<Vec<Cycle>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CYCLE_SELECT_SQL} ORDER BY year DESC, month DESC;"))?;

        let mut rows = stmt.query([])?;
        let mut cycles = Vec::new();

        while let Some(row) = rows.next()? {
            cycles.push(parse_cycle_row(row)?);
        }

        Ok(cycles)
    }

    fn delete_cycle(&self, id: CycleId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM cycles WHERE id = ?1;", params![id])?;

        if changed == 0 {
            return Err(RepoError::CycleNotFound(id));
        }

        Ok(())
    }
}

fn parse_cycle_row(row: &Row<'_>) -> RepoResult<Cycle> {
    let month_raw: i64 = row.get("month")?;
    let month = u32::try_from(month_raw).map_err(|_| {
        RepoError::InvalidData(format!("invalid month value `{month_raw}` in cycles.month"))
    })?;

    let cycle = Cycle {
        id: row.get("id")?,
        title: row.get("title")?,
        year: row.get("year")?,
        month,
        income: row.get("income")?,
        created_at: row.get("created_at")?,
    };
    cycle.validate()?;
    Ok(cycle)
}

/// Checks schema version and `cycles` shape before handing out a repository.
pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = crate::db::migrations::latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    ensure_table_shape(conn, "cycles", CYCLES_REQUIRED_COLUMNS)
}

/// Checks that `table` exists with at least the required columns.
pub(crate) fn ensure_table_shape(
    conn: &Connection,
    table: &'static str,
    required_columns: &'static [&'static str],
) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    if exists == 0 {
        return Err(RepoError::MissingRequiredTable(table));
    }

    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut present = BTreeSet::new();
    while let Some(row) = rows.next()? {
        present.insert(row.get::<_, String>("name")?);
    }

    for &column in required_columns {
        if !present.contains(column) {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }

    Ok(())
}
