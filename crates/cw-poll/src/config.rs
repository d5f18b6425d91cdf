use crate::error::PollError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_PATH: &str = ".callwatch/watch.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    pub base_url: String,
    pub poll_interval_secs: u64,
    pub probe_interval_secs: u64,
    pub cache_path: PathBuf,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:4720".to_string(),
            poll_interval_secs: 10,
            probe_interval_secs: 30,
            cache_path: PathBuf::from(".callwatch/cache.json"),
        }
    }
}

impl WatchConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, PollError> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
        let mut config = if path.exists() {
            let data = std::fs::read_to_string(path).map_err(|err| PollError::Config {
                message: err.to_string(),
            })?;
            toml::from_str(&data).map_err(|err| PollError::Config {
                message: err.to_string(),
            })?
        } else {
            Self::default()
        };

        if let Ok(url) = std::env::var("CALLWATCH_BASE_URL") {
            config.base_url = url;
        }
        if config.poll_interval_secs == 0 || config.probe_interval_secs == 0 {
            return Err(PollError::Config {
                message: "intervals must be at least one second".to_string(),
            });
        }
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(config)
    }

    pub fn events_url(&self) -> String {
        format!("{}/api/events", self.base_url)
    }

    pub fn health_url(&self) -> String {
        format!("{}/api/health", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_toml_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watch.toml");
        std::fs::write(&path, "base_url = \"http://dash.example:9000/\"\n").unwrap();

        let config = WatchConfig::load(Some(&path)).unwrap();
        assert_eq!(config.base_url, "http://dash.example:9000");
        assert_eq!(config.poll_interval_secs, 10);
        assert_eq!(config.events_url(), "http://dash.example:9000/api/events");
    }

    #[test]
    fn rejects_zero_intervals() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watch.toml");
        std::fs::write(&path, "poll_interval_secs = 0\n").unwrap();
        let err = WatchConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, PollError::Config { .. }));
    }

    #[test]
    fn rejects_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watch.toml");
        std::fs::write(&path, "bass_url = \"oops\"\n").unwrap();
        let err = WatchConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, PollError::Config { .. }));
    }

    #[test]
    fn missing_file_uses_defaults() {
        let config = WatchConfig::load(Some(Path::new("/nonexistent/watch.toml"))).unwrap();
        assert_eq!(config.poll_interval_secs, 10);
        assert_eq!(config.probe_interval_secs, 30);
    }
}
