//! Store failure envelope and classification.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure classes reported by the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
    NetworkUnavailable,
    NotAuthenticated,
    PermissionDenied,
    UnknownItem,
    ZoneNotFound,
    PartialFailure,
    Other,
}

impl StoreErrorKind {
    /// Stable code used in log events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NetworkUnavailable => "network_unavailable",
            Self::NotAuthenticated => "not_authenticated",
            Self::PermissionDenied => "permission_denied",
            Self::UnknownItem => "unknown_item",
            Self::ZoneNotFound => "zone_not_found",
            Self::PartialFailure => "partial_failure",
            Self::Other => "other",
        }
    }

    /// Whether the same call may succeed if repeated later.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::NetworkUnavailable)
    }
}

/// Store boundary operation that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    EnsureZone,
    SaveRecords,
    QueryRecords,
    FetchZoneChanges,
}

impl StoreOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EnsureZone => "ensure_zone",
            Self::SaveRecords => "save_records",
            Self::QueryRecords => "query_records",
            Self::FetchZoneChanges => "fetch_zone_changes",
        }
    }
}

/// Error envelope returned by every `RemoteStore` operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub operation: StoreOperation,
    pub message: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, operation: StoreOperation, message: impl Into<String>) -> Self {
        Self {
            kind,
            operation,
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} failed ({}): {}",
            self.operation.as_str(),
            self.kind.as_str(),
            self.message
        )
    }
}

impl Error for StoreError {}
