//! Local boolean flag storage boundary.
//!
//! # Responsibility
//! - Define the small key-value contract used for device-scoped markers
//!   such as "zone already created".
//! - Provide an in-memory implementation for tests and ephemeral runs.
//!
//! # Invariants
//! - A key that was never set reads as `false`.
//! - Flags never expire.

use crate::db::DbError;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, PoisonError};

pub type FlagResult<T> = Result<T, FlagError>;

/// Flag storage failure.
#[derive(Debug)]
pub enum FlagError {
    Db(DbError),
    InvalidData(String),
}

impl Display for FlagError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted flag data: {message}"),
        }
    }
}

impl Error for FlagError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for FlagError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for FlagError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistent boolean flags keyed by fixed names.
pub trait FlagStore: Send + Sync {
    fn get_flag(&self, key: &str) -> FlagResult<bool>;
    fn set_flag(&self, key: &str, value: bool) -> FlagResult<()>;
}

/// Process-local flag store. Values are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    flags: Mutex<HashMap<String, bool>>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlagStore for MemoryFlagStore {
    fn get_flag(&self, key: &str) -> FlagResult<bool> {
        let flags = self.flags.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(flags.get(key).copied().unwrap_or(false))
    }

    fn set_flag(&self, key: &str, value: bool) -> FlagResult<()> {
        let mut flags = self.flags.lock().unwrap_or_else(PoisonError::into_inner);
        flags.insert(key.to_string(), value);
        Ok(())
    }
}
