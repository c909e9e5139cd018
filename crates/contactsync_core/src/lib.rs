//! Client-side synchronization core for contacts kept in a managed record store.
//! Durability, indexing and replication stay with the store behind `RemoteStore`.

pub mod config;
pub mod db;
pub mod flags;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;
pub mod sync;

pub use config::{ConfigError, SyncConfig, DEFAULT_ZONE_FLAG_KEY, DEFAULT_ZONE_ID};
pub use flags::{FlagError, FlagResult, FlagStore, MemoryFlagStore};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::contact::{Contact, CONTACT_NAME_FIELD, CONTACT_RECORD_TYPE};
pub use model::record::{ChangeToken, RecordId, RemoteRecord, ZoneId};
pub use repo::flag_repo::SqliteFlagStore;
pub use service::contact_service::{ContactService, SaveOutcome};
pub use service::error::{SyncError, SyncResult, SyncStage};
pub use service::zone_service::ZoneProvisioner;
pub use store::client::{BatchOutcome, ChangePage, RecordFailure, RecordPredicate, RemoteStore};
pub use store::error::{StoreError, StoreErrorKind, StoreOperation, StoreResult};
pub use store::memory::InMemoryRemoteStore;
pub use sync::machine::ContactSync;
pub use sync::state::SyncState;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
