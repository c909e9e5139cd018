//! SQLite-backed implementations of local storage contracts.
//!
//! # Invariants
//! - Read paths reject invalid persisted state instead of masking it.

pub mod flag_repo;
