//! Expense entry domain model.
//!
//! # Responsibility
//! - Define a single outgoing transaction owned by one cycle.
//!
//! # Invariants
//! - `cycle_id` references an existing cycle; storage cascades the delete.
//! - `amount` is accepted as entered, any sign is allowed.
//! - `spent_at` defaults to creation time and is independently editable.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::model::cycle::CycleId;

/// Stable identifier for a persisted expense entry.
pub type EntryId = i64;

/// Category label shown when the stored category is blank.
pub const FALLBACK_CATEGORY: &str = "General";

/// A single outgoing transaction logged against a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseEntry {
    /// Storage-assigned row id. Zero until the record is persisted.
    pub id: EntryId,
    /// Owning cycle.
    pub cycle_id: CycleId,
    pub title: String,
    /// No sign or range restriction; refunds may be negative.
    pub amount: f64,
    /// Free text. May be blank; display falls back to "General".
    pub category: String,
    /// When the expense occurred, in epoch milliseconds.
    pub spent_at: i64,
}

impl ExpenseEntry {
    /// Creates an unpersisted entry with `spent_at` stamped to now.
    pub fn new(
        cycle_id: CycleId,
        title: impl Into<String>,
        amount: f64,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            cycle_id,
            title: title.into(),
            amount,
            category: category.into(),
            spent_at: Utc::now().timestamp_millis(),
        }
    }

    /// Returns the category, falling back to "General" when blank.
    pub fn display_category(&self) -> &str {
        if self.category.trim().is_empty() {
            FALLBACK_CATEGORY
        } else {
            &self.category
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ExpenseEntry;

    #[test]
    fn display_category_falls_back_when_blank() {
        let blank = ExpenseEntry::new(1, "Rent", 800.0, "  ");
        assert_eq!(blank.display_category(), "General");

        let labeled = ExpenseEntry::new(1, "Rent", 800.0, "Housing");
        assert_eq!(labeled.display_category(), "Housing");
    }

    #[test]
    fn negative_amounts_are_representable() {
        let refund = ExpenseEntry::new(1, "Return", -25.0, "Shopping");
        assert_eq!(refund.amount, -25.0);
    }
}
