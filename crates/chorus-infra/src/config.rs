//! Configuration loader for Chorus.
//!
//! Reads `config.toml` from the data directory (`~/.chorus/` in production)
//! and deserializes it into [`ChorusConfig`]. Falls back to defaults when
//! the file is missing or malformed.

use std::path::Path;

use chorus_types::config::ChorusConfig;

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`ChorusConfig::default()`].
/// - If the file exists but fails to read or parse, logs a warning and
///   returns the default.
pub async fn load_config(data_dir: &Path) -> ChorusConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(
                "No config.toml found at {}, using defaults",
                config_path.display()
            );
            return ChorusConfig::default();
        }
        Err(err) => {
            tracing::warn!(
                "Failed to read {}: {err}, using defaults",
                config_path.display()
            );
            return ChorusConfig::default();
        }
    };

    match toml::from_str::<ChorusConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ChorusConfig::default()
        }
    }
}

/// Default data directory: `~/.chorus`, or the current directory when the
/// home directory cannot be resolved.
pub fn default_data_dir() -> std::path::PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".chorus"))
        .unwrap_or_else(|| std::path::PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config.registry_ttl_secs, 300);
        assert_eq!(config.quota_alert_threshold, 5);
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(
            &config_path,
            r#"
registry_ttl_secs = 120
quota_alert_threshold = 10
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.registry_ttl_secs, 120);
        assert_eq!(config.quota_alert_threshold, 10);
        assert_eq!(config.quota_alert_threshold_pro, 2);
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(&config_path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.registry_ttl_secs, 300);
    }
}
