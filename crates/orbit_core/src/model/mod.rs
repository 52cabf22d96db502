//! Domain model for the monthly ledger.
//!
//! # Responsibility
//! - Define the canonical records persisted by the storage layer.
//! - Define the derived digest shape consumed by observation surfaces.
//!
//! # Invariants
//! - Every persisted record is identified by a stable storage-assigned id.
//! - A `(year, month)` pair identifies at most one cycle.
//! - Expense entries are exclusively owned by exactly one cycle.

pub mod cycle;
pub mod digest;
pub mod entry;
