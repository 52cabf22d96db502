//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level commands.
//! - Keep UI layers decoupled from storage and threading details.

pub mod ledger_service;
