//! Derived-aggregate arithmetic for ledger display values.
//!
//! # Responsibility
//! - Compute totals, balances, averages and category spreads from in-memory
//!   records.
//! - Build the income-vs-expenses chart series and its sliding window.
//!
//! # Invariants
//! - Pure functions only: no side effects, no I/O.
//! - Balance carries no floor; over-budget cycles go negative and are
//!   displayed as-is.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::model::cycle::Cycle;
use crate::model::entry::ExpenseEntry;

/// Number of cycles visible in the chart at once.
pub const CHART_WINDOW_SIZE: usize = 4;

/// Headroom factor applied above the tallest visible chart value.
const AXIS_HEADROOM: f64 = 1.1;

/// Sums entry amounts. 0 for an empty set.
pub fn total_spent(entries: &[ExpenseEntry]) -> f64 {
    entries.iter().map(|entry| entry.amount).sum()
}

/// Income minus total spent. May be negative.
pub fn balance(cycle: &Cycle, total: f64) -> f64 {
    cycle.income - total
}

/// Average amount per entry. 0 when there are no entries.
pub fn average_spend(entries: &[ExpenseEntry], total: f64) -> f64 {
    if entries.is_empty() {
        0.0
    } else {
        total / entries.len() as f64
    }
}

/// Counts distinct display categories, mapping blank to "General".
pub fn category_spread(entries: &[ExpenseEntry]) -> usize {
    entries
        .iter()
        .map(|entry| entry.display_category())
        .collect::<BTreeSet<_>>()
        .len()
}

/// One plotted cycle: label plus the two compared values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Abbreviated month plus two-digit year, e.g. `Mar 24`.
    pub label: String,
    pub income: f64,
    pub expenses: f64,
}

/// Maps a cycles-with-totals snapshot to chart points, most recent first.
pub fn chart_series(snapshot: &[(Cycle, f64)]) -> Vec<ChartPoint> {
    let mut ordered: Vec<&(Cycle, f64)> = snapshot.iter().collect();
    ordered.sort_by(|a, b| (b.0.year, b.0.month).cmp(&(a.0.year, a.0.month)));
    ordered
        .into_iter()
        .map(|(cycle, spent)| ChartPoint {
            label: cycle.chart_label(),
            income: cycle.income,
            expenses: *spent,
        })
        .collect()
}

/// Sliding window over a most-recent-first chart series.
///
/// `start = 0` shows the newest cycles; shifting older moves the window
/// toward the past one step at a time, clamped at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartWindow {
    start: usize,
    size: usize,
}

impl Default for ChartWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartWindow {
    /// Window of the fixed display size, anchored at the newest cycle.
    pub fn new() -> Self {
        Self {
            start: 0,
            size: CHART_WINDOW_SIZE,
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    /// Moves one step toward the past. Returns whether the window moved.
    pub fn shift_older(&mut self, total: usize) -> bool {
        if self.start + self.size < total {
            self.start += 1;
            true
        } else {
            false
        }
    }

    /// Moves one step toward the present. Returns whether the window moved.
    pub fn shift_newer(&mut self) -> bool {
        if self.start > 0 {
            self.start -= 1;
            true
        } else {
            false
        }
    }

    /// The visible slice of the series. Empty series yields an empty slice.
    pub fn slice<'a>(&self, points: &'a [ChartPoint]) -> &'a [ChartPoint] {
        let start = self.start.min(points.len());
        let end = (start + self.size).min(points.len());
        &points[start..end]
    }
}

/// Vertical axis scale for the visible window.
///
/// Tallest visible value with headroom, floored at 1.0 so an all-zero
/// window still draws a non-degenerate axis.
pub fn axis_scale(points: &[ChartPoint]) -> f64 {
    let tallest = points
        .iter()
        .map(|point| point.income.max(point.expenses))
        .fold(0.0_f64, f64::max);
    (tallest * AXIS_HEADROOM).max(1.0)
}
