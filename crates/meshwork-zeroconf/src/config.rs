//! Zero-configuration protocol settings.

use meshwork_serial::{ConfigError, DEFAULT_TIMEOUT_MS};
use serde::{Deserialize, Serialize};

/// Settings for [`crate::ZeroConfSerial`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ZeroConfConfig {
    /// Bound on each wait for header, payload or discarded bytes.
    pub timeout_ms: u64,
    /// Report a zero-length key instead of the stored network key.
    pub withhold_network_key: bool,
    /// Allow replacing a serial number that is already set.
    pub allow_serial_change: bool,
}

impl Default for ZeroConfConfig {
    fn default() -> Self {
        ZeroConfConfig {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            withhold_network_key: true,
            allow_serial_change: false,
        }
    }
}

impl ZeroConfConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_withhold_key_and_lock_serial() {
        let config = ZeroConfConfig::default();
        assert_eq!(config.timeout_ms, 1000);
        assert!(config.withhold_network_key);
        assert!(!config.allow_serial_change);
    }

    #[test]
    fn test_partial_yaml() {
        let config = ZeroConfConfig::from_yaml_str("withhold_network_key: false\ntimeout_ms: 50\n").unwrap();
        assert!(!config.withhold_network_key);
        assert!(!config.allow_serial_change);
        assert_eq!(config.timeout_ms, 50);
    }

    #[test]
    fn test_rejects_zero_timeout() {
        assert!(ZeroConfConfig::from_yaml_str("timeout_ms: 0").is_err());
    }

    #[test]
    fn test_rejects_unknown_fields() {
        assert!(ZeroConfConfig::from_yaml_str("report_key: true").is_err());
    }
}
