//! Sync use-case services.
//!
//! # Responsibility
//! - Orchestrate remote store calls into use-case level APIs.
//! - Classify store failures into `SyncError`.
//! - Keep the state machine decoupled from store details.

pub mod contact_service;
pub mod error;
pub mod zone_service;
