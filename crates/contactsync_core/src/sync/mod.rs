//! Observable synchronization state machine.
//!
//! # Responsibility
//! - Drive initialize → refresh → loaded/errored for the UI layer.
//! - Publish every state transition on a watch channel.
//!
//! # Invariants
//! - `SyncState` is written only by `ContactSync`.
//! - Changing the filter prefix never transitions state by itself.

pub mod machine;
pub mod state;
