//! Async remote store capability trait.
//!
//! # Invariants
//! - `ensure_zone` is idempotent on the store side.
//! - `fetch_zone_changes` tokens are only valid as a continuation of the page
//!   that returned them.

use crate::model::record::{ChangeToken, RemoteRecord, ZoneId};
use crate::store::error::{StoreErrorKind, StoreResult};
use async_trait::async_trait;

/// Record filter understood by `RemoteStore::query_records`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordPredicate {
    /// Case-sensitive, prefix-anchored match on a string field.
    FieldStartsWith { field: String, prefix: String },
}

impl RecordPredicate {
    pub fn field_starts_with(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::FieldStartsWith {
            field: field.into(),
            prefix: prefix.into(),
        }
    }

    /// Evaluates the predicate locally against one record.
    pub fn matches(&self, record: &RemoteRecord) -> bool {
        match self {
            Self::FieldStartsWith { field, prefix } => record
                .string_field(field)
                .is_some_and(|value| value.starts_with(prefix.as_str())),
        }
    }
}

/// One record rejected inside an otherwise completed batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFailure {
    /// Position of the record in the submitted batch.
    pub index: usize,
    pub record: RemoteRecord,
    pub kind: StoreErrorKind,
    pub message: String,
}

/// Result of a best-effort batch save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    /// Persisted records, carrying store-assigned ids.
    pub saved: Vec<RemoteRecord>,
    pub failed: Vec<RecordFailure>,
}

impl BatchOutcome {
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// One page of a zone's change feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangePage {
    pub records: Vec<RemoteRecord>,
    pub next_token: ChangeToken,
    pub has_more: bool,
}

/// Capability interface of the managed record store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Creates `zone` if absent; succeeds without change if present.
    async fn ensure_zone(&self, zone: &ZoneId) -> StoreResult<()>;

    /// Saves records independently; `Err` only on total failure.
    async fn save_records(
        &self,
        zone: &ZoneId,
        records: Vec<RemoteRecord>,
    ) -> StoreResult<BatchOutcome>;

    /// Returns all records of `record_type` in `zone` matching `predicate`.
    async fn query_records(
        &self,
        zone: &ZoneId,
        record_type: &str,
        predicate: &RecordPredicate,
    ) -> StoreResult<Vec<RemoteRecord>>;

    /// Returns the page following `since`, or the first page when `None`.
    async fn fetch_zone_changes(
        &self,
        zone: &ZoneId,
        since: Option<&ChangeToken>,
    ) -> StoreResult<ChangePage>;
}
