//! Error taxonomy surfaced by zone, write and query use-cases.

use crate::flags::FlagError;
use crate::store::error::{StoreError, StoreErrorKind};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SyncResult<T> = Result<T, SyncError>;

/// Use-case stage a store failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    ZoneProvisioning,
    Save,
    Query,
}

/// Classified failure of a sync use-case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Zone creation failed.
    Zone(StoreError),
    /// Batch save failed as a whole.
    Batch(StoreError),
    /// Record query or change-feed page fetch failed.
    Query(StoreError),
    /// Not authenticated or permission denied.
    Auth(StoreError),
    /// Store unreachable.
    Network(StoreError),
    /// Local failure outside the store boundary.
    Unclassified(String),
}

impl SyncError {
    /// Classifies a store failure. Auth and network kinds win over the stage.
    pub fn from_store(stage: SyncStage, err: StoreError) -> Self {
        match err.kind {
            StoreErrorKind::NotAuthenticated | StoreErrorKind::PermissionDenied => Self::Auth(err),
            StoreErrorKind::NetworkUnavailable => Self::Network(err),
            _ => match stage {
                SyncStage::ZoneProvisioning => Self::Zone(err),
                SyncStage::Save => Self::Batch(err),
                SyncStage::Query => Self::Query(err),
            },
        }
    }

    /// Underlying store error, if any.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Zone(err)
            | Self::Batch(err)
            | Self::Query(err)
            | Self::Auth(err)
            | Self::Network(err) => Some(err),
            Self::Unclassified(_) => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.store_error().is_some_and(StoreError::is_retryable)
    }

    /// Stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Zone(_) => "zone_error",
            Self::Batch(_) => "batch_error",
            Self::Query(_) => "query_error",
            Self::Auth(_) => "auth_error",
            Self::Network(_) => "network_error",
            Self::Unclassified(_) => "unclassified",
        }
    }
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Zone(err) => write!(f, "zone provisioning failed: {err}"),
            Self::Batch(err) => write!(f, "contact save failed: {err}"),
            Self::Query(err) => write!(f, "contact query failed: {err}"),
            Self::Auth(err) => write!(f, "not authorized: {err}"),
            Self::Network(err) => write!(f, "store unavailable: {err}"),
            Self::Unclassified(message) => write!(f, "{message}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.store_error().map(|err| err as &(dyn Error + 'static))
    }
}

impl From<FlagError> for SyncError {
    fn from(value: FlagError) -> Self {
        Self::Unclassified(format!("local flag storage failed: {value}"))
    }
}
