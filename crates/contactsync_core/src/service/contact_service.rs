//! Contact write and query use-cases.
//!
//! # Responsibility
//! - Encode names into records and submit them as one best-effort batch.
//! - Read names back either by prefix query or by paging the change feed.
//!
//! # Invariants
//! - One record per input name; duplicates are saved as distinct records.
//! - Partial batch failure is reported in `SaveOutcome`, never as an error.
//! - Change-feed pages are consumed strictly in order; page N+1 is never
//!   requested before page N has been decoded.
//! - A full read never presents the same change token twice.
//! - Undecodable records are skipped, not fatal.

use crate::config::SyncConfig;
use crate::model::contact::{Contact, CONTACT_NAME_FIELD, CONTACT_RECORD_TYPE};
use crate::model::record::{ChangeToken, RecordId, RemoteRecord, ZoneId};
use crate::service::error::{SyncError, SyncResult, SyncStage};
use crate::store::client::{RecordFailure, RecordPredicate, RemoteStore};
use crate::store::error::{StoreError, StoreErrorKind, StoreOperation};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// Result of `ContactService::save_contacts`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveOutcome {
    /// Ids of records the store actually persisted.
    pub record_ids: Vec<RecordId>,
    /// Records rejected inside the batch.
    pub failures: Vec<RecordFailure>,
}

impl SaveOutcome {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Contact use-cases over one remote zone.
pub struct ContactService {
    store: Arc<dyn RemoteStore>,
    zone_id: ZoneId,
}

impl ContactService {
    pub fn new(store: Arc<dyn RemoteStore>, config: &SyncConfig) -> Self {
        Self {
            store,
            zone_id: config.zone_id.clone(),
        }
    }

    /// Saves one contact record per name in a single batch.
    ///
    /// # Contract
    /// - Returns ids of persisted records only (a subset on partial failure).
    /// - Total batch failure propagates and returns no ids.
    /// - Does not touch any local cache; callers refresh to observe writes.
    pub async fn save_contacts(&self, names: &[String]) -> SyncResult<SaveOutcome> {
        let records = names
            .iter()
            .map(|name| Contact::new(name.as_str()).to_record())
            .collect::<Vec<_>>();
        let submitted = records.len();
        let started_at = Instant::now();

        let batch = match self.store.save_records(&self.zone_id, records).await {
            Ok(batch) => batch,
            Err(err) => {
                error!(
                    "event=contacts_save module=contacts status=error zone={} submitted={} duration_ms={} error_code={} retryable={}",
                    self.zone_id,
                    submitted,
                    started_at.elapsed().as_millis(),
                    err.kind.as_str(),
                    err.is_retryable()
                );
                return Err(SyncError::from_store(SyncStage::Save, err));
            }
        };

        let mut record_ids = Vec::with_capacity(batch.saved.len());
        for record in batch.saved {
            match record.id {
                Some(id) => record_ids.push(id),
                None => warn!(
                    "event=contacts_save module=contacts status=warn zone={} reason=saved_record_without_id",
                    self.zone_id
                ),
            }
        }

        let status = if batch.failed.is_empty() { "ok" } else { "partial" };
        info!(
            "event=contacts_save module=contacts status={status} zone={} submitted={} saved={} failed={} duration_ms={}",
            self.zone_id,
            submitted,
            record_ids.len(),
            batch.failed.len(),
            started_at.elapsed().as_millis()
        );

        Ok(SaveOutcome {
            record_ids,
            failures: batch.failed,
        })
    }

    /// Returns contact names, filtered by `prefix` when one is given.
    ///
    /// An absent or empty prefix reads the whole zone through the change feed.
    pub async fn get_contact_names(&self, prefix: Option<&str>) -> SyncResult<Vec<String>> {
        match prefix {
            Some(prefix) if !prefix.is_empty() => self.query_contact_names(prefix).await,
            _ => self.get_all_contact_names().await,
        }
    }

    /// Returns names starting with `prefix` (case-sensitive) in one query.
    pub async fn query_contact_names(&self, prefix: &str) -> SyncResult<Vec<String>> {
        let started_at = Instant::now();
        let predicate = RecordPredicate::field_starts_with(CONTACT_NAME_FIELD, prefix);

        let records = self
            .store
            .query_records(&self.zone_id, CONTACT_RECORD_TYPE, &predicate)
            .await
            .map_err(|err| self.query_failed("contacts_query", err, started_at))?;

        let names = decode_names(&records);
        info!(
            "event=contacts_query module=contacts status=ok zone={} prefix_len={} returned={} decoded={} duration_ms={}",
            self.zone_id,
            prefix.chars().count(),
            records.len(),
            names.len(),
            started_at.elapsed().as_millis()
        );
        Ok(names)
    }

    /// Returns every contact name in the zone by paging the change feed.
    ///
    /// # Contract
    /// - Starts without a token and follows `next_token` while `has_more`.
    /// - Fails instead of looping when a page claims more data but hands
    ///   back any token this read already presented.
    pub async fn get_all_contact_names(&self) -> SyncResult<Vec<String>> {
        let started_at = Instant::now();
        let mut names = Vec::new();
        let mut token: Option<ChangeToken> = None;
        let mut pages = 0usize;
        let mut presented = HashSet::new();

        loop {
            let page = self
                .store
                .fetch_zone_changes(&self.zone_id, token.as_ref())
                .await
                .map_err(|err| self.query_failed("contacts_fetch_all", err, started_at))?;
            pages += 1;
            names.extend(decode_names(&page.records));

            if !page.has_more {
                break;
            }
            if !presented.insert(page.next_token.clone()) {
                let err = StoreError::new(
                    StoreErrorKind::Other,
                    StoreOperation::FetchZoneChanges,
                    format!(
                        "change feed handed back an already presented token after {pages} pages"
                    ),
                );
                return Err(self.query_failed("contacts_fetch_all", err, started_at));
            }
            token = Some(page.next_token);
        }

        info!(
            "event=contacts_fetch_all module=contacts status=ok zone={} pages={} decoded={} duration_ms={}",
            self.zone_id,
            pages,
            names.len(),
            started_at.elapsed().as_millis()
        );
        Ok(names)
    }

    fn query_failed(&self, event: &str, err: StoreError, started_at: Instant) -> SyncError {
        error!(
            "event={event} module=contacts status=error zone={} duration_ms={} error_code={} retryable={}",
            self.zone_id,
            started_at.elapsed().as_millis(),
            err.kind.as_str(),
            err.is_retryable()
        );
        SyncError::from_store(SyncStage::Query, err)
    }
}

fn decode_names(records: &[RemoteRecord]) -> Vec<String> {
    records
        .iter()
        .filter_map(|record| {
            let decoded = Contact::from_record(record);
            if decoded.is_none() {
                debug!(
                    "event=record_decode module=contacts status=skipped record_type={} has_id={}",
                    record.record_type,
                    record.id.is_some()
                );
            }
            decoded
        })
        .map(|contact| contact.name)
        .collect()
}
