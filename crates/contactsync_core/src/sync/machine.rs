//! `ContactSync`: the surface exposed to the presentation layer.
//!
//! # Invariants
//! - `initialize` must succeed before the first `refresh`; calling `refresh`
//!   earlier surfaces the store's zone error as `Errored`.
//! - Any failed `initialize`, `refresh` or total `save_contacts` failure ends
//!   in `Errored(cause)`. Partial saves leave the state untouched.
//! - A successful `initialize` clears a previous `Errored` back to `Idle`.
//! - A refresh publishes its result only if no newer refresh started after
//!   it; stale completions are discarded.

use crate::config::{ConfigError, SyncConfig};
use crate::flags::FlagStore;
use crate::service::contact_service::{ContactService, SaveOutcome};
use crate::service::error::SyncResult;
use crate::service::zone_service::ZoneProvisioner;
use crate::store::client::RemoteStore;
use crate::sync::state::SyncState;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

/// Contact synchronization state machine.
pub struct ContactSync {
    zone: ZoneProvisioner,
    contacts: ContactService,
    state_tx: watch::Sender<SyncState>,
    filter_prefix: Mutex<Option<String>>,
    refresh_generation: AtomicU64,
}

impl ContactSync {
    /// Builds a state machine over the default `Contacts` zone.
    pub fn new(store: Arc<dyn RemoteStore>, flags: Arc<dyn FlagStore>) -> Self {
        Self::build(store, flags, &SyncConfig::default())
    }

    /// Builds a state machine with a validated custom configuration.
    pub fn with_config(
        store: Arc<dyn RemoteStore>,
        flags: Arc<dyn FlagStore>,
        config: &SyncConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(store, flags, config))
    }

    fn build(store: Arc<dyn RemoteStore>, flags: Arc<dyn FlagStore>, config: &SyncConfig) -> Self {
        let (state_tx, _) = watch::channel(SyncState::Idle);
        Self {
            zone: ZoneProvisioner::new(Arc::clone(&store), flags, config),
            contacts: ContactService::new(store, config),
            state_tx,
            filter_prefix: Mutex::new(None),
            refresh_generation: AtomicU64::new(0),
        }
    }

    /// Subscribes to state transitions. The receiver starts at the current state.
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state_tx.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SyncState {
        self.state_tx.borrow().clone()
    }

    /// Sets the prefix used by the next `refresh`. Empty means no filter.
    pub fn set_filter_prefix(&self, prefix: Option<String>) {
        let normalized = prefix.filter(|value| !value.is_empty());
        *self
            .filter_prefix
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = normalized;
    }

    pub fn filter_prefix(&self) -> Option<String> {
        self.filter_prefix
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Provisions the contacts zone. Does not load any data.
    pub async fn initialize(&self) -> SyncResult<()> {
        match self.zone.ensure_contacts_zone_once().await {
            Ok(()) => {
                info!(
                    "event=sync_initialize module=sync status=ok zone={}",
                    self.zone.zone_id()
                );
                let recovering = self.state_tx.borrow().is_errored();
                if recovering {
                    self.publish(SyncState::Idle);
                }
                Ok(())
            }
            Err(err) => {
                self.publish(SyncState::Errored(err.clone()));
                Err(err)
            }
        }
    }

    /// Reloads names using the active filter prefix and returns the outcome.
    ///
    /// The returned state is what this refresh computed; it is only published
    /// when no newer refresh has started in the meantime.
    pub async fn refresh(&self) -> SyncState {
        let generation = self.refresh_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let prefix = self.filter_prefix();
        self.publish(SyncState::Loading);

        let next = match self.contacts.get_contact_names(prefix.as_deref()).await {
            Ok(names) => SyncState::Loaded {
                names,
                active_prefix: prefix,
            },
            Err(err) => SyncState::Errored(err),
        };

        // Generation check and send happen under the channel's write lock.
        let mut previous = None;
        self.state_tx.send_if_modified(|current| {
            if self.refresh_generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            previous = Some(std::mem::replace(current, next.clone()));
            true
        });

        match previous {
            Some(previous) => self.log_transition(&previous, &next),
            None => debug!(
                "event=sync_refresh module=sync status=stale generation={generation} latest={} outcome={}",
                self.refresh_generation.load(Ordering::SeqCst),
                next.as_str()
            ),
        }
        next
    }

    /// Saves one contact per name. The displayed list is not refreshed.
    pub async fn save_contacts(&self, names: &[String]) -> SyncResult<SaveOutcome> {
        match self.contacts.save_contacts(names).await {
            Ok(outcome) => {
                if outcome.is_partial() {
                    warn!(
                        "event=sync_save module=sync status=partial saved={} failed={}",
                        outcome.record_ids.len(),
                        outcome.failures.len()
                    );
                }
                Ok(outcome)
            }
            Err(err) => {
                self.publish(SyncState::Errored(err.clone()));
                Err(err)
            }
        }
    }

    fn publish(&self, next: SyncState) {
        let previous = self.state_tx.send_replace(next);
        self.log_transition(&previous, &self.state_tx.borrow());
    }

    fn log_transition(&self, previous: &SyncState, next: &SyncState) {
        if let SyncState::Errored(err) = next {
            warn!(
                "event=sync_state module=sync status=errored error_code={} retryable={}",
                err.code(),
                err.is_retryable()
            );
        }
        debug!(
            "event=sync_state module=sync from={} to={}",
            previous.as_str(),
            next.as_str()
        );
    }
}
