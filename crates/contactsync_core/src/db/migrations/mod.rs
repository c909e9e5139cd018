//! Local state schema history.
//!
//! # Invariants
//! - Versions are strictly increasing and start at 1.
//! - `PRAGMA user_version` always names the last fully applied step.
//! - A failing step rolls back every step of the same run.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, TransactionBehavior};

/// One forward-only schema step.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SchemaStep {
    pub(crate) version: u32,
    pub(crate) name: &'static str,
    pub(crate) sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[SchemaStep {
    version: 1,
    name: "local_flags",
    sql: include_str!("0001_local_flags.sql"),
}];

/// Returns the schema version this build writes.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Brings `conn` up to `latest_version()`.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file is ahead of this build.
/// - `Migration` naming the step whose SQL failed; nothing is committed.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    run_steps(conn, SCHEMA_STEPS)
}

pub(crate) fn run_steps(conn: &mut Connection, steps: &[SchemaStep]) -> DbResult<()> {
    let on_disk = schema_version(conn)?;
    let latest = steps.last().map_or(0, |step| step.version);
    if on_disk > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: on_disk,
            latest_supported: latest,
        });
    }

    let pending = steps
        .iter()
        .skip_while(|step| step.version <= on_disk)
        .collect::<Vec<_>>();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    for step in &pending {
        tx.execute_batch(step.sql)
            .and_then(|()| tx.pragma_update(None, "user_version", step.version))
            .map_err(|source| DbError::Migration {
                version: step.version,
                name: step.name,
                source,
            })?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={on_disk} to_version={latest} steps={}",
        pending.len()
    );
    Ok(())
}

fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}
