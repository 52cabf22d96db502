use chrono::{Datelike, Local};
use orbit_core::{
    chart_series, ChartWindow, CycleDraft, ExpenseDraft, LedgerService, RepoError,
};

fn draft(title: &str, year: i32, month: u32, income: f64) -> CycleDraft {
    CycleDraft {
        title: title.to_string(),
        year: Some(year),
        month: Some(month),
        income: Some(income),
    }
}

fn expense(cycle_id: i64, title: &str, amount: f64, category: &str) -> ExpenseDraft {
    ExpenseDraft {
        cycle_id,
        title: title.to_string(),
        amount,
        category: category.to_string(),
        spent_at: None,
    }
}

#[test]
fn groceries_plan_scenario_digest_totals() {
    let service = LedgerService::open_in_memory().unwrap();

    let id = service
        .create_cycle(draft("Groceries Plan", 2024, 3, 2000.0))
        .wait()
        .unwrap()
        .unwrap();
    service
        .add_expense(expense(id, "Rent", 800.0, "Housing"))
        .wait()
        .unwrap()
        .unwrap();
    service
        .add_expense(expense(id, "Food", 150.0, "Food"))
        .wait()
        .unwrap()
        .unwrap();

    let watch = service.observe_digest(id).wait().unwrap();
    let digest = watch.next().unwrap().unwrap();

    assert_eq!(digest.total_spent, 950.0);
    assert_eq!(digest.balance, 1050.0);
    assert_eq!(digest.category_spread(), 2);
    assert_eq!(digest.average_spend(), 475.0);
    assert_eq!(digest.expenses.len(), 2);
}

#[test]
fn create_without_year_month_income_uses_current_month_defaults() {
    let service = LedgerService::open_in_memory().unwrap();

    let id = service
        .create_cycle(CycleDraft::default())
        .wait()
        .unwrap()
        .unwrap();
    let cycle = service.get_cycle(id).wait().unwrap().unwrap().unwrap();

    let now = Local::now();
    assert_eq!(cycle.year, now.year());
    assert_eq!(cycle.month, now.month());
    assert_eq!(cycle.income, 0.0);
    assert_eq!(cycle.title, "");
}

#[test]
fn titles_and_categories_are_trimmed_before_persistence() {
    let service = LedgerService::open_in_memory().unwrap();

    let id = service
        .create_cycle(draft("  March Budget  ", 2024, 3, 100.0))
        .wait()
        .unwrap()
        .unwrap();
    let cycle = service.get_cycle(id).wait().unwrap().unwrap().unwrap();
    assert_eq!(cycle.title, "March Budget");

    let entry_id = service
        .add_expense(expense(id, "  Rent  ", 40.0, "  Housing  "))
        .wait()
        .unwrap()
        .unwrap();
    let entry = service
        .get_expense(entry_id)
        .wait()
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(entry.title, "Rent");
    assert_eq!(entry.category, "Housing");
}

#[test]
fn duplicate_year_month_create_fails_without_a_second_row() {
    let service = LedgerService::open_in_memory().unwrap();

    service
        .create_cycle(draft("first", 2024, 3, 0.0))
        .wait()
        .unwrap()
        .unwrap();
    let second = service
        .create_cycle(draft("second", 2024, 3, 0.0))
        .wait()
        .unwrap();
    assert!(matches!(second, Err(RepoError::Db(_))));

    let watch = service.observe_cycles().wait().unwrap();
    let cycles = watch.next().unwrap();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].title, "first");
}

#[test]
fn observe_cycles_re_emits_after_create_edit_and_delete() {
    let service = LedgerService::open_in_memory().unwrap();

    let watch = service.observe_cycles().wait().unwrap();
    assert!(watch.next().unwrap().is_empty());

    let id = service
        .create_cycle(draft("March", 2024, 3, 100.0))
        .wait()
        .unwrap()
        .unwrap();
    let after_create = watch.next().unwrap();
    assert_eq!(after_create.len(), 1);

    service
        .update_cycle_meta(id, "Renamed".to_string(), 2024, 3)
        .wait()
        .unwrap()
        .unwrap();
    let after_edit = watch.next().unwrap();
    assert_eq!(after_edit[0].title, "Renamed");
    assert_eq!(after_edit[0].income, 100.0);

    service.delete_cycle(id).wait().unwrap().unwrap();
    assert!(watch.next().unwrap().is_empty());
}

#[test]
fn adjust_income_only_touches_the_income_field() {
    let service = LedgerService::open_in_memory().unwrap();

    let id = service
        .create_cycle(draft("March", 2024, 3, 100.0))
        .wait()
        .unwrap()
        .unwrap();
    service.adjust_income(id, 750.0).wait().unwrap().unwrap();

    let cycle = service.get_cycle(id).wait().unwrap().unwrap().unwrap();
    assert_eq!(cycle.income, 750.0);
    assert_eq!(cycle.title, "March");
    assert_eq!(cycle.month, 3);
}

#[test]
fn adjust_income_for_unknown_cycle_reports_not_found() {
    let service = LedgerService::open_in_memory().unwrap();

    let outcome = service.adjust_income(404, 10.0).wait().unwrap();
    assert!(matches!(outcome, Err(RepoError::CycleNotFound(404))));
}

#[test]
fn digest_goes_absent_after_cycle_delete() {
    let service = LedgerService::open_in_memory().unwrap();

    let id = service
        .create_cycle(draft("March", 2024, 3, 500.0))
        .wait()
        .unwrap()
        .unwrap();
    service
        .add_expense(expense(id, "Rent", 200.0, "Housing"))
        .wait()
        .unwrap()
        .unwrap();

    let watch = service.observe_digest(id).wait().unwrap();
    assert!(watch.next().unwrap().is_some());

    service.delete_cycle(id).wait().unwrap().unwrap();
    assert!(watch.next().unwrap().is_none());

    // Cascade: no orphaned entries remain.
    let snapshot = service.load_snapshot().wait().unwrap().unwrap();
    assert!(snapshot.is_empty());
}

#[test]
fn digest_for_a_cycle_that_never_existed_is_absent() {
    let service = LedgerService::open_in_memory().unwrap();

    let watch = service.observe_digest(404).wait().unwrap();
    assert!(watch.next().unwrap().is_none());
}

#[test]
fn update_and_delete_expense_flow_through_the_digest() {
    let service = LedgerService::open_in_memory().unwrap();

    let id = service
        .create_cycle(draft("March", 2024, 3, 1000.0))
        .wait()
        .unwrap()
        .unwrap();
    let entry_id = service
        .add_expense(expense(id, "Rent", 800.0, "Housing"))
        .wait()
        .unwrap()
        .unwrap();

    let watch = service.observe_digest(id).wait().unwrap();
    assert_eq!(watch.next().unwrap().unwrap().total_spent, 800.0);

    let mut entry = service
        .get_expense(entry_id)
        .wait()
        .unwrap()
        .unwrap()
        .unwrap();
    entry.amount = 600.0;
    service.update_expense(entry.clone()).wait().unwrap().unwrap();
    assert_eq!(watch.next().unwrap().unwrap().total_spent, 600.0);

    service.delete_expense(entry).wait().unwrap().unwrap();
    let after_delete = watch.next().unwrap().unwrap();
    assert_eq!(after_delete.total_spent, 0.0);
    assert_eq!(after_delete.balance, 1000.0);
}

#[test]
fn expense_timestamps_accept_caller_supplied_values() {
    let service = LedgerService::open_in_memory().unwrap();

    let id = service
        .create_cycle(draft("March", 2024, 3, 0.0))
        .wait()
        .unwrap()
        .unwrap();
    let entry_id = service
        .add_expense(ExpenseDraft {
            cycle_id: id,
            title: "Backdated".to_string(),
            amount: 5.0,
            category: String::new(),
            spent_at: Some(42),
        })
        .wait()
        .unwrap()
        .unwrap();

    let entry = service
        .get_expense(entry_id)
        .wait()
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(entry.spent_at, 42);
}

#[test]
fn snapshot_seeds_the_chart_series_and_window() {
    let service = LedgerService::open_in_memory().unwrap();

    for month in 1..=5u32 {
        let id = service
            .create_cycle(draft("", 2024, month, 1000.0))
            .wait()
            .unwrap()
            .unwrap();
        service
            .add_expense(expense(id, "spend", f64::from(month) * 10.0, ""))
            .wait()
            .unwrap()
            .unwrap();
    }

    let snapshot = service.load_snapshot().wait().unwrap().unwrap();
    assert_eq!(snapshot.len(), 5);

    let series = chart_series(&snapshot);
    let mut window = ChartWindow::new();

    let visible: Vec<&str> = window
        .slice(&series)
        .iter()
        .map(|p| p.label.as_str())
        .collect();
    assert_eq!(visible, vec!["May 24", "Apr 24", "Mar 24", "Feb 24"]);
    assert_eq!(window.slice(&series)[0].expenses, 50.0);

    assert!(window.shift_older(series.len()));
    let shifted: Vec<&str> = window
        .slice(&series)
        .iter()
        .map(|p| p.label.as_str())
        .collect();
    assert_eq!(shifted, vec!["Apr 24", "Mar 24", "Feb 24", "Jan 24"]);
}
