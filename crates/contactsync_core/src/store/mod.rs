//! Remote record store boundary.
//!
//! # Responsibility
//! - Define the async capability trait the core consumes.
//! - Classify store failures as retryable or fatal.
//! - Ship an in-process reference store for tests and demos.
//!
//! # Invariants
//! - The core never retries a failed store call on its own.
//! - Partial batch failure is an `Ok` outcome, not an error.

pub mod client;
pub mod error;
pub mod memory;
