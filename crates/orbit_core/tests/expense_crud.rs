use orbit_core::db::migrations::latest_version;
use orbit_core::db::open_db_in_memory;
use orbit_core::{
    Cycle, CycleId, CycleRepository, ExpenseEntry, ExpenseRepository, RepoError,
    SqliteCycleRepository, SqliteExpenseRepository,
};
use rusqlite::Connection;

fn seeded_cycle(conn: &Connection) -> CycleId {
    let repo = SqliteCycleRepository::try_new(conn).unwrap();
    repo.create_cycle(&Cycle::new("", 2024, 3, 1000.0)).unwrap()
}

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let cycle_id = seeded_cycle(&conn);
    let repo = SqliteExpenseRepository::try_new(&conn).unwrap();

    let entry = ExpenseEntry::new(cycle_id, "Rent", 800.0, "Housing");
    let id = repo.create_entry(&entry).unwrap();
    assert!(id > 0);

    let loaded = repo.get_entry(id).unwrap().unwrap();
    assert_eq!(loaded.id, id);
    assert_eq!(loaded.cycle_id, cycle_id);
    assert_eq!(loaded.title, "Rent");
    assert_eq!(loaded.amount, 800.0);
    assert_eq!(loaded.category, "Housing");
    assert_eq!(loaded.spent_at, entry.spent_at);
}

#[test]
fn list_orders_by_spent_at_then_id_descending() {
    let conn = open_db_in_memory().unwrap();
    let cycle_id = seeded_cycle(&conn);
    let repo = SqliteExpenseRepository::try_new(&conn).unwrap();

    let mut older = ExpenseEntry::new(cycle_id, "older", 1.0, "");
    older.spent_at = 1_000;
    let mut tied_a = ExpenseEntry::new(cycle_id, "tied-a", 2.0, "");
    tied_a.spent_at = 2_000;
    let mut tied_b = ExpenseEntry::new(cycle_id, "tied-b", 3.0, "");
    tied_b.spent_at = 2_000;

    repo.create_entry(&older).unwrap();
    let tied_a_id = repo.create_entry(&tied_a).unwrap();
    let tied_b_id = repo.create_entry(&tied_b).unwrap();
    assert!(tied_b_id > tied_a_id);

    let listed = repo.list_for_cycle(cycle_id).unwrap();
    let titles: Vec<&str> = listed.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["tied-b", "tied-a", "older"]);
}

#[test]
fn total_sums_amounts_and_is_zero_when_empty() {
    let conn = open_db_in_memory().unwrap();
    let cycle_id = seeded_cycle(&conn);
    let repo = SqliteExpenseRepository::try_new(&conn).unwrap();

    assert_eq!(repo.total_for_cycle(cycle_id).unwrap(), 0.0);

    repo.create_entry(&ExpenseEntry::new(cycle_id, "a", 800.0, ""))
        .unwrap();
    repo.create_entry(&ExpenseEntry::new(cycle_id, "b", 150.0, ""))
        .unwrap();
    assert_eq!(repo.total_for_cycle(cycle_id).unwrap(), 950.0);
}

#[test]
fn negative_amounts_are_accepted_and_summed() {
    let conn = open_db_in_memory().unwrap();
    let cycle_id = seeded_cycle(&conn);
    let repo = SqliteExpenseRepository::try_new(&conn).unwrap();

    repo.create_entry(&ExpenseEntry::new(cycle_id, "buy", 100.0, ""))
        .unwrap();
    repo.create_entry(&ExpenseEntry::new(cycle_id, "refund", -40.0, ""))
        .unwrap();

    assert_eq!(repo.total_for_cycle(cycle_id).unwrap(), 60.0);
}

#[test]
fn update_replaces_all_mutable_fields() {
    let conn = open_db_in_memory().unwrap();
    let cycle_id = seeded_cycle(&conn);
    let repo = SqliteExpenseRepository::try_new(&conn).unwrap();

    let mut entry = ExpenseEntry::new(cycle_id, "draft", 10.0, "");
    entry.id = repo.create_entry(&entry).unwrap();

    entry.title = "final".to_string();
    entry.amount = 25.0;
    entry.category = "Food".to_string();
    entry.spent_at = 123_456;
    repo.update_entry(&entry).unwrap();

    let loaded = repo.get_entry(entry.id).unwrap().unwrap();
    assert_eq!(loaded.title, "final");
    assert_eq!(loaded.amount, 25.0);
    assert_eq!(loaded.category, "Food");
    assert_eq!(loaded.spent_at, 123_456);
}

#[test]
fn update_not_found_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let cycle_id = seeded_cycle(&conn);
    let repo = SqliteExpenseRepository::try_new(&conn).unwrap();

    let mut missing = ExpenseEntry::new(cycle_id, "ghost", 1.0, "");
    missing.id = 999;
    let err = repo.update_entry(&missing).unwrap_err();
    assert!(matches!(err, RepoError::EntryNotFound(999)));
}

#[test]
fn delete_removes_a_single_entry() {
    let conn = open_db_in_memory().unwrap();
    let cycle_id = seeded_cycle(&conn);
    let repo = SqliteExpenseRepository::try_new(&conn).unwrap();

    let keep_id = repo
        .create_entry(&ExpenseEntry::new(cycle_id, "keep", 1.0, ""))
        .unwrap();
    let drop_id = repo
        .create_entry(&ExpenseEntry::new(cycle_id, "drop", 2.0, ""))
        .unwrap();

    repo.delete_entry(drop_id).unwrap();

    assert!(repo.get_entry(drop_id).unwrap().is_none());
    assert!(repo.get_entry(keep_id).unwrap().is_some());

    let err = repo.delete_entry(drop_id).unwrap_err();
    assert!(matches!(err, RepoError::EntryNotFound(_)));
}

#[test]
fn insert_against_missing_cycle_fails_at_the_foreign_key() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteExpenseRepository::try_new(&conn).unwrap();

    let orphan = ExpenseEntry::new(404, "orphan", 5.0, "");
    let err = repo.create_entry(&orphan).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
}

#[test]
fn repository_rejects_connection_without_entries_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE cycles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL DEFAULT '',
            year INTEGER NOT NULL,
            month INTEGER NOT NULL,
            income REAL NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteExpenseRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("ledger_entries"))
    ));
}
