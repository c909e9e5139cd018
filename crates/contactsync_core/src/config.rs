//! Sync core configuration.
//!
//! # Invariants
//! - Zone ids and flag keys are plain identifiers
//!   (`[A-Za-z][A-Za-z0-9_]*`).

use crate::model::record::ZoneId;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Well-known zone holding every contact record.
pub const DEFAULT_ZONE_ID: &str = "Contacts";
/// Local flag set once the zone has been provisioned on this device.
pub const DEFAULT_ZONE_FLAG_KEY: &str = "contactZoneCreated";

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("valid identifier regex"));

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidIdentifier { field: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidIdentifier { field, value } => {
                write!(f, "{field} must be a plain identifier, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

/// Names the core uses when talking to the store and the flag storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub zone_id: ZoneId,
    pub zone_flag_key: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            zone_id: ZoneId::new(DEFAULT_ZONE_ID),
            zone_flag_key: DEFAULT_ZONE_FLAG_KEY.to_string(),
        }
    }
}

impl SyncConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_identifier("zone_id", self.zone_id.as_str())?;
        check_identifier("zone_flag_key", &self.zone_flag_key)?;
        Ok(())
    }
}

fn check_identifier(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if IDENTIFIER_RE.is_match(value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier {
            field,
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, SyncConfig};
    use crate::model::record::ZoneId;

    #[test]
    fn default_config_is_valid() {
        let config = SyncConfig::default();
        config.validate().expect("defaults should validate");
        assert_eq!(config.zone_id.as_str(), "Contacts");
        assert_eq!(config.zone_flag_key, "contactZoneCreated");
    }

    #[test]
    fn rejects_blank_or_punctuated_identifiers() {
        let blank = SyncConfig {
            zone_id: ZoneId::new(""),
            ..SyncConfig::default()
        };
        assert!(matches!(
            blank.validate(),
            Err(ConfigError::InvalidIdentifier { field: "zone_id", .. })
        ));

        let spaced = SyncConfig {
            zone_flag_key: "zone created".to_string(),
            ..SyncConfig::default()
        };
        assert!(matches!(
            spaced.validate(),
            Err(ConfigError::InvalidIdentifier {
                field: "zone_flag_key",
                ..
            })
        ));
    }
}
