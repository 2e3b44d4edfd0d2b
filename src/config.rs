//! Inbox synchronization configuration stored in ~/.propdesk/config.json.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    /// Base URL of the inbox endpoint.
    #[serde(default)]
    pub endpoint: String,
    /// Minimum time between two fetch attempts.
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    /// Total attempts per fetch, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_true")]
    pub fetch_on_mount: bool,
    #[serde(default = "default_true")]
    pub revalidate_on_focus: bool,
    /// Timer-driven forced refresh. Disabled when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_interval_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
    #[serde(default = "default_tracked_statuses")]
    pub tracked_statuses: Vec<String>,
}

fn default_min_interval_ms() -> u64 {
    5_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1_000
}

fn default_true() -> bool {
    true
}

fn default_tracked_statuses() -> Vec<String> {
    vec!["needsAttention".to_string(), "info".to_string(), "done".to_string()]
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            min_interval_ms: default_min_interval_ms(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            fetch_on_mount: true,
            revalidate_on_focus: true,
            refresh_interval_ms: None,
            request_timeout_ms: None,
            tracked_statuses: default_tracked_statuses(),
        }
    }
}

impl SyncConfig {
    pub fn with_endpoint(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            ..Self::default()
        }
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_interval_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        if self.endpoint.trim().is_empty() {
            return Err(SyncError::Config("endpoint is not set".to_string()));
        }
        url::Url::parse(&self.endpoint)?;
        if self.min_interval_ms == 0 {
            return Err(SyncError::Config(
                "minIntervalMs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default config location: ~/.propdesk/config.json
pub fn default_config_path() -> Result<PathBuf, SyncError> {
    let home = dirs::home_dir()
        .ok_or_else(|| SyncError::Config("Could not find home directory".to_string()))?;
    Ok(home.join(".propdesk").join("config.json"))
}

pub fn load_config(path: &Path) -> Result<SyncConfig, SyncError> {
    if !path.exists() {
        return Err(SyncError::Config(format!(
            "Config file not found at {}. Create it with: {{ \"endpoint\": \"https://host/api/emails\" }}",
            path.display()
        )));
    }

    let content = fs::read_to_string(path)?;
    let config: SyncConfig = serde_json::from_str(&content)
        .map_err(|e| SyncError::Config(format!("Failed to parse config: {}", e)))?;

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_inbox_behaviour() {
        let config: SyncConfig =
            serde_json::from_str(r#"{"endpoint":"http://localhost/api/emails"}"#).unwrap();
        assert_eq!(config.min_interval(), Duration::from_secs(5));
        assert_eq!(config.max_attempts, 3);
        assert!(config.fetch_on_mount);
        assert!(config.revalidate_on_focus);
        assert_eq!(config.refresh_interval(), None);
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.tracked_statuses, vec!["needsAttention", "info", "done"]);
    }

    #[test]
    fn test_zero_refresh_interval_is_disabled() {
        let config = SyncConfig {
            refresh_interval_ms: Some(0),
            ..SyncConfig::with_endpoint("http://localhost/api/emails")
        };
        assert_eq!(config.refresh_interval(), None);
    }

    #[test]
    fn test_validate_rejects_missing_and_bad_endpoint() {
        assert!(matches!(
            SyncConfig::default().validate(),
            Err(SyncError::Config(_))
        ));
        assert!(matches!(
            SyncConfig::with_endpoint("not a url").validate(),
            Err(SyncError::InvalidEndpoint(_))
        ));
        let zero = SyncConfig {
            min_interval_ms: 0,
            ..SyncConfig::with_endpoint("http://localhost/api/emails")
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(
            &path,
            r#"{"endpoint":"https://ops.example.com/api/emails","refreshIntervalMs":60000,"fetchOnMount":false}"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.endpoint, "https://ops.example.com/api/emails");
        assert_eq!(config.refresh_interval(), Some(Duration::from_secs(60)));
        assert!(!config.fetch_on_mount);
    }

    #[test]
    fn test_load_config_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = load_config(&temp.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_load_config_invalid_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, "{ endpoint: ").unwrap();
        assert!(matches!(load_config(&path), Err(SyncError::Config(_))));
    }
}
