//! Domain model for contacts and generic remote records.
//!
//! # Responsibility
//! - Define the client-side `Contact` entity.
//! - Define the store-agnostic record shape exchanged with the remote store.
//!
//! # Invariants
//! - Record identity is assigned by the remote store, never by the client.
//! - Decoding a malformed record yields `None`, never an error.

pub mod contact;
pub mod record;
