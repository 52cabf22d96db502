//! Derived cycle digest.
//!
//! # Responsibility
//! - Combine one cycle, its ordered expenses and the computed totals into
//!   the read-only composite consumed by detail views.
//!
//! # Invariants
//! - Never persisted; recomputed on every observed change.
//! - `expenses` are ordered most recent first, ties broken by descending id.
//! - `balance` is `income - total_spent` and may be negative.

use serde::{Deserialize, Serialize};

use crate::model::cycle::Cycle;
use crate::model::entry::ExpenseEntry;
use crate::stats;

/// Read-only composite of a cycle, its expenses and derived totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleDigest {
    pub cycle: Cycle,
    pub expenses: Vec<ExpenseEntry>,
    pub total_spent: f64,
    /// Income minus total spent. Negative means over budget; displayed as-is.
    pub balance: f64,
}

impl CycleDigest {
    /// Assembles the digest from a cycle and its already-ordered expenses.
    pub fn assemble(cycle: Cycle, expenses: Vec<ExpenseEntry>) -> Self {
        let total_spent = stats::total_spent(&expenses);
        let balance = stats::balance(&cycle, total_spent);
        Self {
            cycle,
            expenses,
            total_spent,
            balance,
        }
    }

    /// Average amount per entry, 0 for an empty cycle.
    pub fn average_spend(&self) -> f64 {
        stats::average_spend(&self.expenses, self.total_spent)
    }

    /// Count of distinct display categories.
    pub fn category_spread(&self) -> usize {
        stats::category_spread(&self.expenses)
    }
}
