//! Expense entry repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide per-cycle persistence APIs over the `ledger_entries` table.
//! - Own the aggregate total query used by digests and chart snapshots.
//!
//! # Invariants
//! - Per-cycle listings are ordered by `(spent_at DESC, id DESC)`.
//! - `total_for_cycle` is 0 for a cycle without entries, never NULL.
//! - Inserting against a missing cycle id fails at the foreign key, the
//!   repository does not pre-check ownership.

use crate::model::cycle::CycleId;
use crate::model::entry::{EntryId, ExpenseEntry};
use crate::repo::cycle_repo::{ensure_connection_ready, ensure_table_shape, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const ENTRY_SELECT_SQL: &str = "SELECT
    id,
    cycle_id,
    title,
    amount,
    category,
    spent_at
FROM ledger_entries";

const ENTRIES_REQUIRED_COLUMNS: &[&str] =
    &["id", "cycle_id", "title", "amount", "category", "spent_at"];

/// Repository interface for expense entry operations.
pub trait ExpenseRepository {
    /// Persists one entry and returns the storage-assigned id.
    fn create_entry(&self, entry: &ExpenseEntry) -> RepoResult<EntryId>;
    /// Replaces all mutable fields of an existing entry.
    fn update_entry(&self, entry: &ExpenseEntry) -> RepoResult<()>;
    /// Gets one entry by id.
    fn get_entry(&self, id: EntryId) -> RepoResult<Option<ExpenseEntry>>;
    /// Lists entries for one cycle, most recent first.
    fn list_for_cycle(&self, cycle_id: CycleId) -> RepoResult<Vec<ExpenseEntry>>;
    /// Sums entry amounts for one cycle.
    fn total_for_cycle(&self, cycle_id: CycleId) -> RepoResult<f64>;
    /// Hard-deletes one entry.
    fn delete_entry(&self, id: EntryId) -> RepoResult<()>;
}

/// SQLite-backed expense entry repository.
pub struct SqliteExpenseRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteExpenseRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        ensure_table_shape(conn, "ledger_entries", ENTRIES_REQUIRED_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl ExpenseRepository for SqliteExpenseRepository<'_> {
    fn create_entry(&self, entry: &ExpenseEntry) -> RepoResult<EntryId> {
        self.conn.execute(
            "INSERT INTO ledger_entries (cycle_id, title, amount, category, spent_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                entry.cycle_id,
                entry.title.as_str(),
                entry.amount,
                entry.category.as_str(),
                entry.spent_at,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_entry(&self, entry: &ExpenseEntry) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE ledger_entries
             SET
                cycle_id = ?1,
                title = ?2,
                amount = ?3,
                category = ?4,
                spent_at = ?5
             WHERE id = ?6;",
            params![
                entry.cycle_id,
                entry.title.as_str(),
                entry.amount,
                entry.category.as_str(),
                entry.spent_at,
                entry.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::EntryNotFound(entry.id));
        }

        Ok(())
    }

    fn get_entry(&self, id: EntryId) -> RepoResult<Option<ExpenseEntry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ENTRY_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_entry_row(row)?));
        }

        Ok(None)
    }

    fn list_for_cycle(&self, cycle_id: CycleId) -> RepoResult<Vec<ExpenseEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ENTRY_SELECT_SQL}
             WHERE cycle_id = ?1
             ORDER BY spent_at DESC, id DESC;"
        ))?;

        let mut rows = stmt.query(params![cycle_id])?;
        let mut entries = Vec::new();

        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }

        Ok(entries)
    }

    fn total_for_cycle(&self, cycle_id: CycleId) -> RepoResult<f64> {
        let total: Option<f64> = self.conn.query_row(
            "SELECT SUM(amount) FROM ledger_entries WHERE cycle_id = ?1;",
            params![cycle_id],
            |row| row.get(0),
        )?;

        Ok(total.unwrap_or(0.0))
    }

    fn delete_entry(&self, id: EntryId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM ledger_entries WHERE id = ?1;", params![id])?;

        if changed == 0 {
            return Err(RepoError::EntryNotFound(id));
        }

        Ok(())
    }
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<ExpenseEntry> {
    Ok(ExpenseEntry {
        id: row.get("id")?,
        cycle_id: row.get("cycle_id")?,
        title: row.get("title")?,
        amount: row.get("amount")?,
        category: row.get("category")?,
        spent_at: row.get("spent_at")?,
    })
}
