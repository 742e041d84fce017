//! Document store configuration.
//!
//! The configuration can be built programmatically, deserialized, or read from
//! environment variables.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TSD_SEARCH_ES_HOST` | http://localhost:9200 | Store base address |
//! | `TSD_SEARCH_ES_TSMETA_TYPE` | tsmeta | Document type for TSMeta records |
//! | `TSD_SEARCH_ES_ASYNC_REPLICATION` | false | Append `replication=async` to writes |
//! | `TSD_SEARCH_ES_REQUEST_TIMEOUT_MS` | 30000 | Per-request timeout (milliseconds) |

use clap::Parser;
use serde::{Deserialize, Serialize};

/// Setting key for the TSMeta document type.
pub const TSMETA_TYPE_KEY: &str = "tsd.search.elasticsearch.tsmeta_type";

/// Setting key for the store base address.
pub const HOST_KEY: &str = "tsd.search.elasticsearch.host";

/// Configuration for the document store.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "tsmeta-search")]
#[command(about = "TSMeta document store settings")]
pub struct StoreConfig {
    /// Store base address (e.g., `http://localhost:9200`).
    #[arg(long, env = "TSD_SEARCH_ES_HOST", default_value = "http://localhost:9200")]
    #[serde(default = "default_host")]
    pub host: String,

    /// Document type (collection) TSMeta records are written to.
    /// An empty value is treated as missing.
    #[arg(long, env = "TSD_SEARCH_ES_TSMETA_TYPE", default_value = "tsmeta")]
    #[serde(default = "default_tsmeta_type")]
    pub tsmeta_type: Option<String>,

    /// Whether writes are acknowledged before replicas confirm.
    #[arg(long, env = "TSD_SEARCH_ES_ASYNC_REPLICATION", default_value = "false")]
    #[serde(default)]
    pub async_replication: bool,

    /// Request timeout in milliseconds.
    #[arg(long, env = "TSD_SEARCH_ES_REQUEST_TIMEOUT_MS", default_value = "30000")]
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_host() -> String {
    "http://localhost:9200".to_string()
}

fn default_tsmeta_type() -> Option<String> {
    Some("tsmeta".to_string())
}

fn default_request_timeout_ms() -> u64 {
    30000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            tsmeta_type: default_tsmeta_type(),
            async_replication: false,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl StoreConfig {
    /// Creates a new StoreConfig from environment variables, falling back to
    /// defaults when they cannot be parsed.
    pub fn from_env() -> Self {
        Self::try_parse_from(["tsmeta-search"]).unwrap_or_default()
    }

    /// Returns the configured TSMeta document type, or `None` when it is
    /// unset or empty.
    pub fn tsmeta_type(&self) -> Option<&str> {
        self.tsmeta_type.as_deref().filter(|t| !t.is_empty())
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.host.is_empty() {
            errors.push(format!("Missing config '{}'", HOST_KEY));
        }

        if self.tsmeta_type().is_none() {
            errors.push(format!("Missing config '{}'", TSMETA_TYPE_KEY));
        }

        if self.request_timeout_ms == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.host, "http://localhost:9200");
        assert_eq!(config.tsmeta_type(), Some("tsmeta"));
        assert!(!config.async_replication);
        assert_eq!(config.request_timeout_ms, 30000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_type_is_missing() {
        let config = StoreConfig {
            tsmeta_type: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(config.tsmeta_type(), None);

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains(TSMETA_TYPE_KEY));
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let config = StoreConfig {
            host: String::new(),
            tsmeta_type: None,
            async_replication: true,
            request_timeout_ms: 0,
        };
        assert_eq!(config.validate().unwrap_err().len(), 3);
    }

    #[test]
    fn test_parse_from_args() {
        let config = StoreConfig::try_parse_from([
            "tsmeta-search",
            "--host",
            "http://es01:9200",
            "--tsmeta-type",
            "ts_meta",
            "--request-timeout-ms",
            "500",
        ])
        .unwrap();
        assert_eq!(config.host, "http://es01:9200");
        assert_eq!(config.tsmeta_type(), Some("ts_meta"));
        assert_eq!(config.request_timeout_ms, 500);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"host": "http://es02:9200", "async_replication": true}"#)
                .unwrap();
        assert_eq!(config.host, "http://es02:9200");
        assert_eq!(config.tsmeta_type(), Some("tsmeta"));
        assert!(config.async_replication);
        assert_eq!(config.request_timeout_ms, 30000);
    }
}
