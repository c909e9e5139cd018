//! Sync state observed by the UI.

use crate::service::error::SyncError;

/// Current view of the contact list as seen by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncState {
    /// Nothing loaded yet. Also the state after a successful initialize.
    #[default]
    Idle,
    /// A refresh is in flight.
    Loading,
    /// Names in store order; duplicates are kept.
    Loaded {
        names: Vec<String>,
        active_prefix: Option<String>,
    },
    Errored(SyncError),
}

impl SyncState {
    /// Stable label used in log events.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Loaded { .. } => "loaded",
            Self::Errored(_) => "errored",
        }
    }

    pub fn names(&self) -> Option<&[String]> {
        match self {
            Self::Loaded { names, .. } => Some(names),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&SyncError> {
        match self {
            Self::Errored(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_errored(&self) -> bool {
        matches!(self, Self::Errored(_))
    }
}
