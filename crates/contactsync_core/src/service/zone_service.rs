//! Once-per-device zone provisioning.
//!
//! # Invariants
//! - The local flag is set only after the store confirmed the zone.
//! - A failed attempt leaves the flag unset so the next call retries.
//! - No mutual exclusion around the flag check; concurrent first calls may
//!   both reach the store, which treats zone creation as idempotent.

use crate::config::SyncConfig;
use crate::flags::FlagStore;
use crate::model::record::ZoneId;
use crate::service::error::{SyncError, SyncResult, SyncStage};
use crate::store::client::RemoteStore;
use log::{debug, error, info};
use std::sync::Arc;
use std::time::Instant;

/// Ensures the contacts zone exists before any read or write touches it.
pub struct ZoneProvisioner {
    store: Arc<dyn RemoteStore>,
    flags: Arc<dyn FlagStore>,
    zone_id: ZoneId,
    flag_key: String,
}

impl ZoneProvisioner {
    pub fn new(store: Arc<dyn RemoteStore>, flags: Arc<dyn FlagStore>, config: &SyncConfig) -> Self {
        Self {
            store,
            flags,
            zone_id: config.zone_id.clone(),
            flag_key: config.zone_flag_key.clone(),
        }
    }

    pub fn zone_id(&self) -> &ZoneId {
        &self.zone_id
    }

    /// Creates the zone unless this device already did.
    ///
    /// # Errors
    /// - Local flag storage failures map to `SyncError::Unclassified`.
    /// - Store failures are classified with `SyncStage::ZoneProvisioning`.
    pub async fn ensure_contacts_zone_once(&self) -> SyncResult<()> {
        if self.flags.get_flag(&self.flag_key)? {
            debug!(
                "event=zone_ensure module=zone status=skipped zone={} reason=flag_set",
                self.zone_id
            );
            return Ok(());
        }

        let started_at = Instant::now();
        if let Err(err) = self.store.ensure_zone(&self.zone_id).await {
            error!(
                "event=zone_ensure module=zone status=error zone={} duration_ms={} error_code={} retryable={}",
                self.zone_id,
                started_at.elapsed().as_millis(),
                err.kind.as_str(),
                err.is_retryable()
            );
            return Err(SyncError::from_store(SyncStage::ZoneProvisioning, err));
        }

        self.flags.set_flag(&self.flag_key, true)?;
        info!(
            "event=zone_ensure module=zone status=ok zone={} duration_ms={}",
            self.zone_id,
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}
