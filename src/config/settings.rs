//! Settings structures for the search client

use crate::error::{MarError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Main settings structure matching `mar-search.yml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub client: ClientSettings,
    pub gateway: GatewaySettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| MarError::Settings(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&content)
    }

    /// Parse settings from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| MarError::Settings(e.to_string()))
    }

    /// Merge with environment variables (MAR_* prefix)
    pub fn merge_env(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    fn merge_vars<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = var("MAR_GATEWAY_URL") {
            self.gateway.url = val;
        }
        if let Some(val) = var("MAR_TOPIC") {
            self.client.topic = val;
        }
        if let Some(val) = var("MAR_POLL_INTERVAL") {
            if let Ok(secs) = val.parse() {
                self.client.poll_interval_secs = secs;
            }
        }
        if let Some(val) = var("MAR_MAX_WAIT") {
            self.client.max_wait_secs = val.parse().ok();
        }
        if let Some(val) = var("MAR_LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    /// Check values the client cannot work with
    pub fn validate(&self) -> Result<()> {
        let requested = std::time::Duration::from_secs(self.client.poll_interval_secs);
        if requested < crate::MIN_POLL_INTERVAL {
            return Err(MarError::InvalidPollInterval {
                requested,
                minimum: crate::MIN_POLL_INTERVAL,
            });
        }
        if self.client.page_size == 0 {
            return Err(MarError::Settings("client.page_size must be positive".to_string()));
        }
        if self.gateway.request_timeout <= 0.0 {
            return Err(MarError::Settings(
                "gateway.request_timeout must be positive".to_string(),
            ));
        }
        url::Url::parse(&self.gateway.url)
            .map_err(|e| MarError::Settings(format!("gateway.url: {}", e)))?;
        Ok(())
    }
}

/// Search client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Fabric topic of the search service
    pub topic: String,
    /// Seconds between status checks (minimum 5)
    pub poll_interval_secs: u64,
    /// Give up on a search that has not finished after this many seconds
    pub max_wait_secs: Option<u64>,
    /// Give up after this many unfinished status checks
    pub max_polls: Option<u32>,
    /// Items per page when listing results
    pub page_size: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            topic: crate::DEFAULT_TOPIC.to_string(),
            poll_interval_secs: crate::DEFAULT_POLL_INTERVAL.as_secs(),
            max_wait_secs: None,
            max_polls: None,
            page_size: crate::results::DEFAULT_LIMIT,
        }
    }
}

/// HTTP gateway in front of the message fabric
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    /// Base URL; the topic is appended as the path
    pub url: String,
    /// Request timeout in seconds
    pub request_timeout: f64,
    /// Pool max idle connections per host
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy for all gateway traffic
    pub proxy: Option<String>,
    /// Extra headers to send (e.g. authorization)
    pub extra_headers: HashMap<String, String>,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8080/fabric".to_string(),
            request_timeout: 30.0,
            pool_maxsize: 20,
            verify_ssl: true,
            proxy: None,
            extra_headers: HashMap::new(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
