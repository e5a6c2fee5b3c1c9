use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

/// Environment variable overriding the configured backend host.
pub const API_URL_ENV: &str = "PFT_API_URL";

fn default_currency() -> String {
    "INR".to_string()
}

fn default_concurrency() -> usize {
    6
}

fn default_debounce_ms() -> u64 {
    250
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Backend base URL, e.g. "http://localhost:5000".
    pub base_url: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Upper bound on in-flight transaction fetches per entity group.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Coalescing window for repeated dashboard refreshes.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    pub data_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "codito", "pft")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let mut config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        if let Ok(url) = std::env::var(API_URL_ENV) {
            debug!("Overriding base_url from {API_URL_ENV}");
            config.base_url = url;
        }
        debug!("Successfully loaded config");
        Ok(config)
    }

    fn data_dir(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("in", "codito", "pft")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    /// Where the bearer token lives between sessions.
    pub fn token_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("token"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization_with_defaults() {
        let yaml_str = r#"
base_url: "http://localhost:5000"
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.currency, "INR");
        assert_eq!(config.concurrency, 6);
        assert_eq!(config.debounce_ms, 250);
        assert!(config.data_path.is_none());
    }

    #[test]
    fn test_config_deserialization_explicit_values() {
        let yaml_str = r#"
base_url: "https://ppa-backend.example.com"
currency: "USD"
concurrency: 3
debounce_ms: 100
data_path: "/tmp/pft-data"
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).unwrap();
        assert_eq!(config.base_url, "https://ppa-backend.example.com");
        assert_eq!(config.currency, "USD");
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.debounce_ms, 100);
        assert_eq!(
            config.token_path().unwrap(),
            PathBuf::from("/tmp/pft-data/token")
        );
    }

    #[test]
    fn test_load_from_missing_path_fails_with_context() {
        let result = AppConfig::load_from_path("/definitely/not/here.yaml");
        assert!(result.is_err());
        assert!(format!("{:#}", result.unwrap_err()).contains("Failed to read config file"));
    }
}
