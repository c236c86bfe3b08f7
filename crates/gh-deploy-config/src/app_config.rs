//! Application configuration
//!
//! Configuration loaded from `.gh-deploy-board.toml`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application configuration loaded from `.gh-deploy-board.toml`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// GitHub host for Enterprise installations (None = github.com)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// How long fetched results stay valid, in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Page size for paginated API requests (GitHub caps this at 100)
    #[serde(default = "default_page_size")]
    pub page_size: u8,

    /// Session identifier used when none is given on the command line
    #[serde(default = "default_session")]
    pub session: String,
}

fn default_cache_ttl_secs() -> u64 {
    5 * 60
}

fn default_page_size() -> u8 {
    100
}

fn default_session() -> String {
    "default".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: None,
            cache_ttl_secs: default_cache_ttl_secs(),
            page_size: default_page_size(),
            session: default_session(),
        }
    }
}

impl AppConfig {
    /// Load config from CWD first, then home directory, or use defaults
    pub fn load() -> Self {
        if let Some(content) = crate::load_config_file() {
            match toml::from_str(&content) {
                Ok(config) => {
                    log::info!("Loaded app config from file");
                    return config;
                }
                Err(e) => {
                    log::warn!("Failed to parse config file: {}", e);
                }
            }
        }

        log::debug!("Using default app config");
        Self::default()
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Page size clamped to the range GitHub accepts
    pub fn effective_page_size(&self) -> u8 {
        self.page_size.clamp(1, 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.host.is_none());
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.page_size, 100);
        assert_eq!(config.session, "default");
    }

    #[test]
    fn test_config_deserialize_partial() {
        let toml = r#"
            host = "ghe.example.com"
            cache_ttl_secs = 60
        "#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.host.as_deref(), Some("ghe.example.com"));
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
        // Other fields should use defaults
        assert_eq!(config.page_size, 100);
        assert_eq!(config.session, "default");
    }

    #[test]
    fn test_page_size_is_clamped() {
        let config = AppConfig {
            page_size: 0,
            ..AppConfig::default()
        };
        assert_eq!(config.effective_page_size(), 1);

        let config = AppConfig {
            page_size: 250,
            ..AppConfig::default()
        };
        assert_eq!(config.effective_page_size(), 100);
    }
}
