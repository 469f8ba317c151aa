//! Connection settings for the MongoDB client.
//!
//! [`ClientConfig`] can be built in code, deserialized from JSON (missing keys take their
//! defaults) or read from the `MONGOLAYER_URI` and `MONGOLAYER_DATABASE` environment
//! variables.

use std::{env, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::{DocumentStoreError, DocumentStoreResult};

pub const DEFAULT_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_DATABASE: &str = "test";
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_MAX_POOL_SIZE: u32 = 100;
pub const DEFAULT_MIN_POOL_SIZE: u32 = 5;

pub const URI_ENV: &str = "MONGOLAYER_URI";
pub const DATABASE_ENV: &str = "MONGOLAYER_DATABASE";

/// MongoDB connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub uri: String,
    pub database: String,
    pub connect_timeout_ms: u64,
    pub max_pool_size: u32,
    pub min_pool_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            max_pool_size: DEFAULT_MAX_POOL_SIZE,
            min_pool_size: DEFAULT_MIN_POOL_SIZE,
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Defaults overridden by `MONGOLAYER_URI` and `MONGOLAYER_DATABASE` when set.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            uri: env::var(URI_ENV).unwrap_or(defaults.uri),
            database: env::var(DATABASE_ENV).unwrap_or(defaults.database),
            ..defaults
        }
    }

    /// Parses a JSON configuration object.
    pub fn from_json(json: &str) -> DocumentStoreResult<Self> {
        serde_json::from_str(json).map_err(|e| DocumentStoreError::Initialization(e.to_string()))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Builder for [`ClientConfig`]. Unset values keep their defaults.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.config.uri = uri.into();
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.config.database = database.into();
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn max_pool_size(mut self, size: u32) -> Self {
        self.config.max_pool_size = size;
        self
    }

    pub fn min_pool_size(mut self, size: u32) -> Self {
        self.config.min_pool_size = size;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();

        assert_eq!(config.uri, "mongodb://localhost:27017");
        assert_eq!(config.database, "test");
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.max_pool_size, 100);
        assert_eq!(config.min_pool_size, 5);
    }

    #[test]
    fn builder_overrides() {
        let config = ClientConfig::builder()
            .uri("mongodb://db:27017")
            .database("blog")
            .connect_timeout(Duration::from_secs(3))
            .max_pool_size(20)
            .min_pool_size(1)
            .build();

        assert_eq!(
            config,
            ClientConfig {
                uri: "mongodb://db:27017".into(),
                database: "blog".into(),
                connect_timeout_ms: 3_000,
                max_pool_size: 20,
                min_pool_size: 1,
            },
        );
    }

    #[test]
    fn json_fills_missing_keys_with_defaults() {
        let config = ClientConfig::from_json(r#"{ "database": "blog", "max_pool_size": 10 }"#).unwrap();

        assert_eq!(config.database, "blog");
        assert_eq!(config.max_pool_size, 10);
        assert_eq!(config.uri, DEFAULT_URI);
        assert_eq!(config.min_pool_size, DEFAULT_MIN_POOL_SIZE);
    }

    #[test]
    fn invalid_json_is_an_initialization_error() {
        let err = ClientConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, DocumentStoreError::Initialization(_)));
    }
}
