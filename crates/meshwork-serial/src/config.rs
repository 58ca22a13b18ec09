//! Operational protocol configuration.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, DEFAULT_TIMEOUT_MS};

/// Settings for [`crate::OperationalSerial`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OperationalConfig {
    /// How long the receive bridge waits for the host's acknowledgement.
    ///
    /// Independent of the receive timeout the host supplies with each
    /// start-receive request.
    pub response_timeout_ms: u64,
}

impl Default for OperationalConfig {
    fn default() -> Self {
        OperationalConfig {
            response_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl OperationalConfig {
    /// Parse from YAML; absent fields keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.response_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "response_timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
