//! In-process reference implementation of `RemoteStore`.
//!
//! # Responsibility
//! - Emulate zone creation, best-effort batch saves, prefix queries and a
//!   paginated change feed without any network.
//! - Expose controls for tests: page size, per-record rejection, one-shot
//!   failure injection, indexing lag and call accounting.
//!
//! # Invariants
//! - Every zone operation other than `ensure_zone` fails with
//!   `ZoneNotFound` until the zone exists.
//! - Change tokens encode the issuing zone and are rejected elsewhere.
//! - Records only become visible to reads once `index_lag` has elapsed.

use crate::model::record::{ChangeToken, RecordId, RemoteRecord, ZoneId};
use crate::store::client::{BatchOutcome, ChangePage, RecordFailure, RecordPredicate, RemoteStore};
use crate::store::error::{StoreError, StoreErrorKind, StoreOperation, StoreResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use uuid::Uuid;

const DEFAULT_PAGE_SIZE: usize = 100;

type RejectionRule = Arc<dyn Fn(&RemoteRecord) -> Option<StoreErrorKind> + Send + Sync>;

struct StoredRecord {
    record: RemoteRecord,
    saved_at: Instant,
}

#[derive(Default)]
struct StoreInner {
    zones: BTreeMap<ZoneId, Vec<StoredRecord>>,
    injected_failures: HashMap<StoreOperation, StoreErrorKind>,
    call_counts: HashMap<StoreOperation, usize>,
    presented_tokens: Vec<Option<ChangeToken>>,
}

/// Thread-safe in-memory record store.
pub struct InMemoryRemoteStore {
    page_size: usize,
    index_lag: Duration,
    rejection_rule: Option<RejectionRule>,
    inner: Mutex<StoreInner>,
}

impl Default for InMemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            index_lag: Duration::ZERO,
            rejection_rule: None,
            inner: Mutex::new(StoreInner::default()),
        }
    }

    /// Sets the change-feed page size. Zero is clamped to one.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Delays read visibility of saved records, like asynchronous indexing.
    pub fn with_index_lag(mut self, lag: Duration) -> Self {
        self.index_lag = lag;
        self
    }

    /// Rejects individual records inside a batch when `rule` returns a kind.
    pub fn with_rejection_rule<F>(mut self, rule: F) -> Self
    where
        F: Fn(&RemoteRecord) -> Option<StoreErrorKind> + Send + Sync + 'static,
    {
        self.rejection_rule = Some(Arc::new(rule));
        self
    }

    /// Makes the next call of `operation` fail with `kind`.
    pub fn fail_next(&self, operation: StoreOperation, kind: StoreErrorKind) {
        self.lock().injected_failures.insert(operation, kind);
    }

    /// Number of calls received for `operation`, failed ones included.
    pub fn call_count(&self, operation: StoreOperation) -> usize {
        self.lock()
            .call_counts
            .get(&operation)
            .copied()
            .unwrap_or(0)
    }

    /// Tokens presented to `fetch_zone_changes`, in call order.
    pub fn presented_tokens(&self) -> Vec<Option<ChangeToken>> {
        self.lock().presented_tokens.clone()
    }

    pub fn has_zone(&self, zone: &ZoneId) -> bool {
        self.lock().zones.contains_key(zone)
    }

    /// Number of stored records in `zone`, visible or not.
    pub fn record_count(&self, zone: &ZoneId) -> usize {
        self.lock().zones.get(zone).map_or(0, Vec::len)
    }

    /// Stores `record` as-is, bypassing rejection rules, and returns its id.
    ///
    /// Used to seed foreign or malformed records.
    pub fn insert_raw(&self, zone: &ZoneId, mut record: RemoteRecord) -> StoreResult<RecordId> {
        let mut inner = self.lock();
        let records = inner
            .zones
            .get_mut(zone)
            .ok_or_else(|| zone_not_found(StoreOperation::SaveRecords, zone))?;
        let id = record.id.clone().unwrap_or_else(new_record_id);
        record.id = Some(id.clone());
        records.push(StoredRecord {
            record,
            saved_at: Instant::now(),
        });
        Ok(id)
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_call(&self, operation: StoreOperation) -> StoreResult<MutexGuard<'_, StoreInner>> {
        let mut inner = self.lock();
        *inner.call_counts.entry(operation).or_insert(0) += 1;
        if let Some(kind) = inner.injected_failures.remove(&operation) {
            return Err(StoreError::new(kind, operation, "injected failure"));
        }
        Ok(inner)
    }

    fn visible<'a>(&self, records: &'a [StoredRecord]) -> impl Iterator<Item = &'a RemoteRecord> {
        let lag = self.index_lag;
        records
            .iter()
            .filter(move |stored| stored.saved_at.elapsed() >= lag)
            .map(|stored| &stored.record)
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn ensure_zone(&self, zone: &ZoneId) -> StoreResult<()> {
        let mut inner = self.begin_call(StoreOperation::EnsureZone)?;
        inner.zones.entry(zone.clone()).or_default();
        Ok(())
    }

    async fn save_records(
        &self,
        zone: &ZoneId,
        records: Vec<RemoteRecord>,
    ) -> StoreResult<BatchOutcome> {
        let mut inner = self.begin_call(StoreOperation::SaveRecords)?;
        let stored = inner
            .zones
            .get_mut(zone)
            .ok_or_else(|| zone_not_found(StoreOperation::SaveRecords, zone))?;

        let mut outcome = BatchOutcome::default();
        for (index, mut record) in records.into_iter().enumerate() {
            let rejected = self
                .rejection_rule
                .as_ref()
                .and_then(|rule| rule(&record));
            if let Some(kind) = rejected {
                outcome.failed.push(RecordFailure {
                    index,
                    record,
                    kind,
                    message: "record rejected by store".to_string(),
                });
                continue;
            }

            record.id = Some(new_record_id());
            stored.push(StoredRecord {
                record: record.clone(),
                saved_at: Instant::now(),
            });
            outcome.saved.push(record);
        }

        Ok(outcome)
    }

    async fn query_records(
        &self,
        zone: &ZoneId,
        record_type: &str,
        predicate: &RecordPredicate,
    ) -> StoreResult<Vec<RemoteRecord>> {
        let inner = self.begin_call(StoreOperation::QueryRecords)?;
        let stored = inner
            .zones
            .get(zone)
            .ok_or_else(|| zone_not_found(StoreOperation::QueryRecords, zone))?;

        Ok(self
            .visible(stored)
            .filter(|record| record.is_type(record_type) && predicate.matches(record))
            .cloned()
            .collect())
    }

    async fn fetch_zone_changes(
        &self,
        zone: &ZoneId,
        since: Option<&ChangeToken>,
    ) -> StoreResult<ChangePage> {
        let mut inner = self.begin_call(StoreOperation::FetchZoneChanges)?;
        inner.presented_tokens.push(since.cloned());

        let start = match since {
            Some(token) => decode_token(zone, token)?,
            None => 0,
        };
        let stored = inner
            .zones
            .get(zone)
            .ok_or_else(|| zone_not_found(StoreOperation::FetchZoneChanges, zone))?;

        let visible = self.visible(stored).collect::<Vec<_>>();
        let start = start.min(visible.len());
        let end = start.saturating_add(self.page_size).min(visible.len());

        Ok(ChangePage {
            records: visible[start..end].iter().map(|record| (*record).clone()).collect(),
            next_token: encode_token(zone, end),
            has_more: end < visible.len(),
        })
    }
}

fn new_record_id() -> RecordId {
    RecordId::new(Uuid::new_v4().to_string())
}

fn zone_not_found(operation: StoreOperation, zone: &ZoneId) -> StoreError {
    StoreError::new(
        StoreErrorKind::ZoneNotFound,
        operation,
        format!("zone `{zone}` does not exist"),
    )
}

fn encode_token(zone: &ZoneId, offset: usize) -> ChangeToken {
    ChangeToken::new(format!("{zone}:{offset}"))
}

fn decode_token(zone: &ZoneId, token: &ChangeToken) -> StoreResult<usize> {
    let invalid = || {
        StoreError::new(
            StoreErrorKind::UnknownItem,
            StoreOperation::FetchZoneChanges,
            format!("change token not valid for zone `{zone}`"),
        )
    };

    let (token_zone, offset) = token.as_str().rsplit_once(':').ok_or_else(invalid)?;
    if token_zone != zone.as_str() {
        return Err(invalid());
    }
    offset.parse::<usize>().map_err(|_| invalid())
}
