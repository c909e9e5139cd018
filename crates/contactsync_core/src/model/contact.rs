//! Contact entity and its remote record codec.
//!
//! # Invariants
//! - Encoded records carry type `Contact` and a single string field `name`.
//! - Decoding never fails loudly: malformed records are skipped by callers.

use crate::model::record::RemoteRecord;
use serde::{Deserialize, Serialize};

/// Record type name used for contacts in the remote store.
pub const CONTACT_RECORD_TYPE: &str = "Contact";
/// Field carrying the contact display name.
pub const CONTACT_NAME_FIELD: &str = "name";

/// Client-side contact value. Identity lives on the stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
}

impl Contact {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Encodes this contact as an unsaved remote record.
    pub fn to_record(&self) -> RemoteRecord {
        RemoteRecord::new(CONTACT_RECORD_TYPE).with_field(CONTACT_NAME_FIELD, self.name.as_str())
    }

    /// Decodes a contact from a remote record.
    ///
    /// Returns `None` when the record is not a contact or its `name` field is
    /// missing or not a string.
    pub fn from_record(record: &RemoteRecord) -> Option<Self> {
        if !record.is_type(CONTACT_RECORD_TYPE) {
            return None;
        }
        record.string_field(CONTACT_NAME_FIELD).map(Self::new)
    }
}
