//! Cycle domain model.
//!
//! # Responsibility
//! - Define the monthly budgeting period record.
//! - Provide display helpers for blank-title fallback and month labels.
//!
//! # Invariants
//! - `id` is assigned by storage and stable once persisted.
//! - `month` is 1-indexed and must stay within 1..=12.
//! - `income` is a non-negative goal amount.
//! - `created_at` is set once at construction and never rewritten.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable identifier for a persisted cycle.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type CycleId = i64;

/// A user-defined monthly budgeting period with an income goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cycle {
    /// Storage-assigned row id. Zero until the record is persisted.
    pub id: CycleId,
    /// Free text. May be blank; display falls back to the month name.
    pub title: String,
    pub year: i32,
    /// 1-indexed calendar month.
    pub month: u32,
    /// Income goal for the period. Non-negative, mutable.
    pub income: f64,
    /// Creation timestamp in epoch milliseconds. Immutable after creation.
    pub created_at: i64,
}

/// Validation failures for cycle writes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleValidationError {
    MonthOutOfRange(u32),
    NegativeIncome(f64),
}

impl Display for CycleValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MonthOutOfRange(month) => {
                write!(f, "month must be within 1..=12, got {month}")
            }
            Self::NegativeIncome(income) => {
                write!(f, "income must be non-negative, got {income}")
            }
        }
    }
}

impl Error for CycleValidationError {}

impl Cycle {
    /// Creates an unpersisted cycle with `created_at` stamped to now.
    pub fn new(title: impl Into<String>, year: i32, month: u32, income: f64) -> Self {
        Self {
            id: 0,
            title: title.into(),
            year,
            month,
            income,
            created_at: Utc::now().timestamp_millis(),
        }
    }

    /// Checks the record invariants enforced before any SQL write.
    pub fn validate(&self) -> Result<(), CycleValidationError> {
        if !(1..=12).contains(&self.month) {
            return Err(CycleValidationError::MonthOutOfRange(self.month));
        }
        if self.income < 0.0 {
            return Err(CycleValidationError::NegativeIncome(self.income));
        }
        Ok(())
    }

    /// Returns the title, falling back to the month name when blank.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            month_name(self.month)
        } else {
            &self.title
        }
    }

    /// Short chart label: abbreviated month plus two-digit year, e.g. `Mar 24`.
    pub fn chart_label(&self) -> String {
        format!("{} {:02}", month_abbrev(self.month), self.year.rem_euclid(100))
    }
}

/// Full English month name for a 1-indexed month.
pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Cycle",
    }
}

/// Three-letter month abbreviation for a 1-indexed month.
pub fn month_abbrev(month: u32) -> &'static str {
    match month {
        1 => "Jan",
        2 => "Feb",
        3 => "Mar",
        4 => "Apr",
        5 => "May",
        6 => "Jun",
        7 => "Jul",
        8 => "Aug",
        9 => "Sep",
        10 => "Oct",
        11 => "Nov",
        12 => "Dec",
        _ => "???",
    }
}
