//! Store configuration

use crate::error::{Result, StoreError};
use crate::fingerprint::FingerprintConfig;
use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Default storage key of the durable key half
pub const DEFAULT_DURABLE_KEY_NAME: &str = "carevault.key.durable";

/// Default storage key of the session key half
pub const DEFAULT_SESSION_KEY_NAME: &str = "carevault.key.session";

/// Default storage key of the ciphertext record
pub const DEFAULT_RECORD_KEY_NAME: &str = "carevault.credentials";

/// Default look-ahead before expiry that triggers a refresh (5 minutes)
pub const DEFAULT_REFRESH_WINDOW_SECS: u64 = 300;

/// Secure credential store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Storage key for the key half kept in the durable scope
    #[serde(default = "default_durable_key_name")]
    pub durable_key_name: String,

    /// Storage key for the key half kept in the session scope
    #[serde(default = "default_session_key_name")]
    pub session_key_name: String,

    /// Storage key for the ciphertext record (durable scope)
    #[serde(default = "default_record_key_name")]
    pub record_key_name: String,

    /// Seconds before expiry at which `needs_refresh` turns true
    #[serde(default = "default_refresh_window_secs")]
    pub refresh_window_secs: u64,

    /// Signals bound into the device fingerprint
    #[serde(default)]
    pub fingerprint: FingerprintConfig,
}

fn default_durable_key_name() -> String {
    DEFAULT_DURABLE_KEY_NAME.to_string()
}

fn default_session_key_name() -> String {
    DEFAULT_SESSION_KEY_NAME.to_string()
}

fn default_record_key_name() -> String {
    DEFAULT_RECORD_KEY_NAME.to_string()
}

fn default_refresh_window_secs() -> u64 {
    DEFAULT_REFRESH_WINDOW_SECS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            durable_key_name: default_durable_key_name(),
            session_key_name: default_session_key_name(),
            record_key_name: default_record_key_name(),
            refresh_window_secs: default_refresh_window_secs(),
            fingerprint: FingerprintConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Reject configurations the store cannot operate under.
    ///
    /// The durable half and the record share a scope, so their names must
    /// differ; all three names must be non-empty.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("durable_key_name", &self.durable_key_name),
            ("session_key_name", &self.session_key_name),
            ("record_key_name", &self.record_key_name),
        ] {
            if value.trim().is_empty() {
                return Err(StoreError::Configuration(format!("{} is empty", field)));
            }
        }

        if self.durable_key_name == self.record_key_name {
            return Err(StoreError::Configuration(
                "durable_key_name and record_key_name must differ".to_string(),
            ));
        }

        if self.refresh_window_secs == 0 {
            return Err(StoreError::Configuration(
                "refresh_window_secs must be positive".to_string(),
            ));
        }

        if self.fingerprint.signals.is_empty() {
            return Err(StoreError::Configuration(
                "fingerprint.signals must name at least one signal".to_string(),
            ));
        }

        Ok(())
    }

    /// Refresh look-ahead as a chrono duration
    #[must_use]
    pub fn refresh_window(&self) -> chrono::Duration {
        i64::try_from(self.refresh_window_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::Signal;

    #[test]
    fn test_defaults_are_valid() {
        let config = StoreConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.refresh_window(), chrono::Duration::minutes(5));
        assert_eq!(config.fingerprint.signals, Signal::ALL.to_vec());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"refresh_window_secs": 120}"#).unwrap();
        assert_eq!(config.refresh_window_secs, 120);
        assert_eq!(config.record_key_name, DEFAULT_RECORD_KEY_NAME);
    }

    #[test]
    fn test_rejects_empty_key_name() {
        let config = StoreConfig {
            session_key_name: "  ".to_string(),
            ..StoreConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(StoreError::Configuration(msg)) if msg.contains("session_key_name")
        ));
    }

    #[test]
    fn test_rejects_colliding_durable_names() {
        let config = StoreConfig {
            record_key_name: DEFAULT_DURABLE_KEY_NAME.to_string(),
            ..StoreConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_window_and_empty_signals() {
        let config = StoreConfig {
            refresh_window_secs: 0,
            ..StoreConfig::default()
        };
        assert!(config.validate().is_err());

        let mut config = StoreConfig::default();
        config.fingerprint.signals.clear();
        assert!(config.validate().is_err());
    }
}
