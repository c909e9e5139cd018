//! SQLite implementation of `FlagStore`.
//!
//! # Responsibility
//! - Persist device-scoped flags across process restarts.
//! - Keep SQL details inside the local persistence boundary.

use crate::db::{open_db, open_db_in_memory};
use crate::flags::{FlagError, FlagResult, FlagStore};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// Flag store over the `local_flags` table.
///
/// The connection is guarded by a mutex so the store can be shared behind
/// `Arc<dyn FlagStore>`.
pub struct SqliteFlagStore {
    conn: Mutex<Connection>,
}

impl SqliteFlagStore {
    /// Opens (or creates) the flag database at `path`.
    pub fn open(path: impl AsRef<Path>) -> FlagResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    pub fn open_in_memory() -> FlagResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps a connection that already has migrations applied.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl FlagStore for SqliteFlagStore {
    fn get_flag(&self, key: &str) -> FlagResult<bool> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let stored = conn
            .query_row(
                "SELECT value FROM local_flags WHERE key = ?1;",
                [key],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        match stored {
            None | Some(0) => Ok(false),
            Some(1) => Ok(true),
            Some(other) => Err(FlagError::InvalidData(format!(
                "invalid value `{other}` for flag `{key}` in local_flags.value"
            ))),
        }
    }

    fn set_flag(&self, key: &str, value: bool) -> FlagResult<()> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute(
            "INSERT INTO local_flags (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, i64::from(value)],
        )?;
        debug!("event=flag_set module=flags status=ok key={key} value={value}");
        Ok(())
    }
}
