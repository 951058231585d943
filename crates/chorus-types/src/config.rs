//! Configuration for the Chorus session core.
//!
//! Loaded from `config.toml` by `chorus-infra`. All fields have defaults
//! so an empty or missing file is valid.

use serde::{Deserialize, Serialize};

/// Tunables for the registry cache and quota gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChorusConfig {
    /// How long a fetched model list stays fresh, in seconds.
    #[serde(default = "default_registry_ttl_secs")]
    pub registry_ttl_secs: u64,

    /// Standard-tier remaining count that triggers a low-quota notice.
    #[serde(default = "default_quota_alert_threshold")]
    pub quota_alert_threshold: u32,

    /// Pro-tier remaining count that triggers a low-quota notice.
    #[serde(default = "default_quota_alert_threshold_pro")]
    pub quota_alert_threshold_pro: u32,
}

fn default_registry_ttl_secs() -> u64 {
    300
}

fn default_quota_alert_threshold() -> u32 {
    5
}

fn default_quota_alert_threshold_pro() -> u32 {
    2
}

impl Default for ChorusConfig {
    fn default() -> Self {
        Self {
            registry_ttl_secs: default_registry_ttl_secs(),
            quota_alert_threshold: default_quota_alert_threshold(),
            quota_alert_threshold_pro: default_quota_alert_threshold_pro(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ChorusConfig::default();
        assert_eq!(config.registry_ttl_secs, 300);
        assert_eq!(config.quota_alert_threshold, 5);
        assert_eq!(config.quota_alert_threshold_pro, 2);
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config: ChorusConfig = toml::from_str("").unwrap();
        assert_eq!(config.registry_ttl_secs, 300);
    }

    #[test]
    fn partial_toml_overrides_one_field() {
        let config: ChorusConfig = toml::from_str("registry_ttl_secs = 60").unwrap();
        assert_eq!(config.registry_ttl_secs, 60);
        assert_eq!(config.quota_alert_threshold, 5);
    }
}
