//! Application configuration. Backend location, timeouts, demo mode.

use crate::adapters::http::{DEFAULT_TIMEOUT, resolve_base_url};
use serde::Deserialize;
use std::time::Duration;

/// Origin used to resolve relative request URLs when none is configured.
pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";

#[derive(Debug, Deserialize, Default, Clone)]
pub struct AppConfig {
    /// Backend base URL. Empty or unset means same origin. Read from EXPENSE_SPLITTER_API_BASE_URL.
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Origin for relative URLs. Read from EXPENSE_SPLITTER_ORIGIN.
    #[serde(default)]
    pub origin: Option<String>,

    /// Per-request timeout in ms (default 15000). Read from EXPENSE_SPLITTER_REQUEST_TIMEOUT_MS.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,

    /// Use the in-memory backend instead of HTTP. Read from EXPENSE_SPLITTER_OFFLINE.
    #[serde(default)]
    pub offline: Option<bool>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        if let Ok(path) = std::env::var("EXPENSE_SPLITTER_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        // Environment wins over the file.
        c = c.add_source(config::Environment::with_prefix("EXPENSE_SPLITTER").try_parsing(true));
        c.build()?.try_deserialize()
    }

    /// Normalized base URL; "" means same origin.
    pub fn api_base_url(&self) -> String {
        resolve_base_url(self.api_base_url.as_deref())
    }

    pub fn origin_or_default(&self) -> String {
        self.origin
            .as_deref()
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(|o| o.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_ORIGIN.to_string())
    }

    /// Returns the request timeout. Zero or unset falls back to the default.
    pub fn request_timeout(&self) -> Duration {
        match self.request_timeout_ms {
            Some(ms) if ms > 0 => Duration::from_millis(ms),
            _ => DEFAULT_TIMEOUT,
        }
    }

    pub fn is_offline(&self) -> bool {
        self.offline.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{Config, File, FileFormat};

    fn from_toml(toml: &str) -> AppConfig {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.api_base_url(), "");
        assert_eq!(cfg.origin_or_default(), DEFAULT_ORIGIN);
        assert_eq!(cfg.request_timeout(), Duration::from_millis(15_000));
        assert!(!cfg.is_offline());
    }

    #[test]
    fn test_file_values() {
        let cfg = from_toml(
            r#"
            api_base_url = "https://api.example.com/v1/"
            origin = "https://app.example.com/"
            request_timeout_ms = 2500
            offline = true
            "#,
        );
        assert_eq!(cfg.api_base_url(), "https://api.example.com/v1");
        assert_eq!(cfg.origin_or_default(), "https://app.example.com");
        assert_eq!(cfg.request_timeout(), Duration::from_millis(2500));
        assert!(cfg.is_offline());
    }

    #[test]
    fn test_blank_values_fall_back() {
        let cfg = from_toml(
            r#"
            api_base_url = "   "
            origin = ""
            request_timeout_ms = 0
            "#,
        );
        assert_eq!(cfg.api_base_url(), "");
        assert_eq!(cfg.origin_or_default(), DEFAULT_ORIGIN);
        assert_eq!(cfg.request_timeout(), DEFAULT_TIMEOUT);
    }
}
