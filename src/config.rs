use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid config {}: {source}", .path.display())]
pub struct ConfigError {
    pub path: PathBuf,
    #[source]
    pub source: toml::de::Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_tick_rate")]
    pub tick_rate_fps: f64,
    /// Quiet period after the last keystroke before a search is sent.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_locale")]
    pub locale: String,
    /// chrono format string; `{Do}` expands to the ordinal day ("3rd").
    #[serde(default = "default_time_format")]
    pub time_format: String,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_tick_rate() -> f64 {
    30.0
}

fn default_debounce_ms() -> u64 {
    1000
}

fn default_page_size() -> u32 {
    20
}

fn default_request_timeout() -> u64 {
    30
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_time_format() -> String {
    "%B {Do} %Y, %-I:%M:%S %P".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tick_rate_fps: default_tick_rate(),
            debounce_ms: default_debounce_ms(),
            page_size: default_page_size(),
            request_timeout_secs: default_request_timeout(),
            locale: default_locale(),
            time_format: default_time_format(),
            log_file: None,
        }
    }
}

impl AppConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config/rcsearch"))
}

fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Load the config file. A missing file yields the defaults; a malformed one
/// is an error so the caller can report it once logging is up.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let Some(path) = config_path() else {
        return Ok(AppConfig::default());
    };

    let Ok(contents) = fs::read_to_string(&path) else {
        return Ok(AppConfig::default());
    };

    parse_config(&contents).map_err(|source| ConfigError { path, source })
}

fn parse_config(contents: &str) -> Result<AppConfig, toml::de::Error> {
    toml::from_str(contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.debounce_ms, 1000);
        assert_eq!(config.page_size, 20);
        assert_eq!(config.locale, "en");
        assert!(config.log_file.is_none());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = parse_config("debounce_ms = 250\nlocale = \"pt-BR\"\n").unwrap();
        assert_eq!(config.debounce(), Duration::from_millis(250));
        assert_eq!(config.locale, "pt-BR");
        assert_eq!(config.page_size, 20);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn invalid_file_is_reported_with_its_path() {
        let source = parse_config("page_size = \"many\"").unwrap_err();
        let err = ConfigError {
            path: PathBuf::from("/tmp/rcsearch/config.toml"),
            source,
        };
        assert!(err.to_string().starts_with("invalid config /tmp/rcsearch/config.toml:"));
    }
}
