use crate::error::GatewayError;
use crate::security::BuildMode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use url::Url;

/// Cosmetic window options a caller may request.
///
/// `web_preferences` is accepted so legacy configs still parse, but the window
/// factory never lets it reach the content view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowOptions {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub min_width: u32,
    pub min_height: u32,
    pub background_color: String,
    pub web_preferences: BTreeMap<String, serde_json::Value>,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            title: "Portcullis".to_string(),
            width: 1280,
            height: 800,
            min_width: 960,
            min_height: 600,
            background_color: "#000000".to_string(),
            web_preferences: BTreeMap::new(),
        }
    }
}

/// Serialized settings from ~/.portcullis/config.json
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build mode override; the compiled-in mode is used when absent.
    pub mode: Option<BuildMode>,
    /// Development server origin.
    pub dev_origin: Option<String>,
    /// Packaged output root override (skips layout detection).
    pub output_root: Option<PathBuf>,
    /// Directory for the observability log sink.
    pub log_dir: Option<PathBuf>,
    pub window: WindowOptions,
}

impl Config {
    /// Parse the configured development origin, if any.
    pub fn dev_origin_url(&self) -> Result<Option<Url>, GatewayError> {
        self.dev_origin
            .as_deref()
            .map(parse_dev_origin)
            .transpose()
    }

    /// Log directory in effect, defaulting to `<data dir>/portcullis/logs`.
    pub fn effective_log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("portcullis")
                .join("logs")
        })
    }
}

/// Parse and validate a development origin: http(s) with a host, nothing past the origin.
pub fn parse_dev_origin(raw: &str) -> Result<Url, GatewayError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| GatewayError::InvalidDevOrigin(format!("{raw}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host().is_none() {
        return Err(GatewayError::InvalidDevOrigin(format!(
            "{raw}: expected an http(s) origin"
        )));
    }
    Ok(url)
}

/// Helper struct for storing the location to read/write global settings
pub struct ConfigStore {
    path: PathBuf,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    pub fn new() -> Self {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".portcullis");
        path.push("config.json");
        Self { path }
    }

    /// Use a specific config file (for testing).
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the user's saved config, or fallback to Default
    pub fn load(&self) -> Config {
        if let Ok(content) = fs::read_to_string(&self.path) {
            match serde_json::from_str(&content) {
                Ok(config) => return config,
                Err(err) => {
                    tracing::warn!(path = %self.path.display(), error = %err, "ignoring unreadable config");
                }
            }
        }
        Config::default()
    }

    /// Save the config back to disk
    pub fn save(&self, config: &Config) -> Result<(), GatewayError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_partial_defaults() {
        let legacy = r#"{
            "dev_origin": "http://localhost:3000",
            "window": {"title": "Game", "web_preferences": {"nodeIntegration": true}}
        }"#;

        let parsed: Config = serde_json::from_str(legacy).unwrap();
        assert_eq!(parsed.window.title, "Game");
        assert_eq!(parsed.window.width, 1280);
        assert!(parsed.mode.is_none());
        assert_eq!(
            parsed.dev_origin_url().unwrap().unwrap().as_str(),
            "http://localhost:3000/"
        );
    }

    #[test]
    fn test_dev_origin_rejects_non_http() {
        assert!(parse_dev_origin("file:///tmp/index.html").is_err());
        assert!(parse_dev_origin("not a url").is_err());
        assert!(parse_dev_origin("https://dev.example.test:8443").is_ok());
    }

    #[test]
    fn test_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::with_path(dir.path().join("nested").join("config.json"));
        let cfg = Config {
            mode: Some(BuildMode::Development),
            log_dir: Some(PathBuf::from("/var/log/portcullis")),
            ..Default::default()
        };
        store.save(&cfg).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.mode, Some(BuildMode::Development));
        assert_eq!(loaded.effective_log_dir(), PathBuf::from("/var/log/portcullis"));
    }

    #[test]
    fn test_store_missing_file_defaults() {
        let store = ConfigStore::with_path("/nonexistent/portcullis/config.json");
        let cfg = store.load();
        assert!(cfg.dev_origin.is_none());
        assert_eq!(cfg.window, WindowOptions::default());
    }
}
