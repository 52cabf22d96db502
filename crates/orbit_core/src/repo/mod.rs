//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for cycles and entries.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes must enforce model validation before persistence.
//! - Repository APIs return semantic errors (`CycleNotFound`,
//!   `EntryNotFound`) in addition to DB transport errors.

pub mod cycle_repo;
pub mod entry_repo;
