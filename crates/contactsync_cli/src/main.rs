//! Demo entry point for the contact sync core.
//!
//! # Responsibility
//! - Run the save → filter → list scenario against the in-memory store.
//! - Print each resulting state so the flow can be checked by eye.
//!
//! Environment:
//! - `CONTACTSYNC_LOG_LEVEL`: log level, defaults to the build-mode default.
//! - `CONTACTSYNC_LOG_DIR`: absolute directory for rolling logs; unset disables file logging.
//! - `CONTACTSYNC_FLAG_DB`: SQLite file for local flags; unset keeps flags in memory.
//!   The demo remote store lives only for one process, so the persisted
//!   zone-created flag is reset on every start.

use contactsync_core::{
    core_version, default_log_level, init_logging, ContactSync, FlagStore, InMemoryRemoteStore,
    MemoryFlagStore, SqliteFlagStore, SyncState, DEFAULT_ZONE_FLAG_KEY,
};
use std::env;
use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

const DEMO_NAMES: &[&str] = &["Madi", "Simon", "Bob"];

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("contactsync: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    if let Ok(log_dir) = env::var("CONTACTSYNC_LOG_DIR") {
        let level =
            env::var("CONTACTSYNC_LOG_LEVEL").unwrap_or_else(|_| default_log_level().to_string());
        init_logging(&level, &log_dir)?;
    }

    let flags = open_flag_store(env::var("CONTACTSYNC_FLAG_DB").ok())?;
    println!("contactsync version={}", core_version());
    run_demo(flags).await
}

fn open_flag_store(path: Option<String>) -> Result<Arc<dyn FlagStore>, Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(Arc::new(MemoryFlagStore::new()));
    };
    let flags = SqliteFlagStore::open(path)?;
    // A fresh in-memory store has no zones; a stale marker would skip provisioning.
    flags.set_flag(DEFAULT_ZONE_FLAG_KEY, false)?;
    Ok(Arc::new(flags))
}

async fn run_demo(flags: Arc<dyn FlagStore>) -> Result<(), Box<dyn Error>> {
    let sync = ContactSync::new(Arc::new(InMemoryRemoteStore::new()), flags);
    sync.initialize().await?;

    let names = DEMO_NAMES.iter().map(|name| name.to_string()).collect::<Vec<_>>();
    let saved = sync.save_contacts(&names).await?;
    println!(
        "saved={} rejected={}",
        saved.record_ids.len(),
        saved.failures.len()
    );

    sync.set_filter_prefix(Some("M".to_string()));
    print_state("prefix=M", &sync.refresh().await);

    sync.set_filter_prefix(None);
    print_state("prefix=<none>", &sync.refresh().await);

    match sync.state() {
        SyncState::Errored(err) => Err(err.into()),
        _ => Ok(()),
    }
}

fn print_state(label: &str, state: &SyncState) {
    match state {
        SyncState::Loaded { names, .. } => println!("{label} names={}", names.join(",")),
        SyncState::Errored(err) => println!("{label} error={err}"),
        other => println!("{label} state={}", other.as_str()),
    }
}
