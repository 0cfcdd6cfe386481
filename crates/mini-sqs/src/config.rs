//! Client configuration.
//!
//! A client is bound to exactly one region and endpoint for its lifetime.
//! Configuration can be built in code or loaded from a file plus environment
//! variables:
//!
//! - optional file (format picked from the extension: `.yaml`, `.toml`, `.json`)
//! - environment variables prefixed `MINI_SQS__` with `__` as the separator,
//!   e.g. `MINI_SQS__POOL__MAX_IDLE_PER_HOST=16` sets `pool.max_idle_per_host`

use crate::arn::Endpoint;
use crate::error::SqsError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Environment variable prefix for [`ClientConfig::load`]
pub const ENV_PREFIX: &str = "MINI_SQS";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Region every queue ARN must belong to
    pub region: String,

    /// Endpoint override; defaults to `https://sqs.{region}.amazonaws.com`
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Passed through to the HTTP transport
    #[serde(default)]
    pub pool: PoolOptions,
}

impl ClientConfig {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            endpoint: None,
            pool: PoolOptions::default(),
        }
    }

    /// Set the endpoint URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the connection pool options.
    pub fn with_pool_options(mut self, pool: PoolOptions) -> Self {
        self.pool = pool;
        self
    }

    /// Endpoint URL the client will talk to.
    pub fn resolved_endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| Endpoint::default_for_region(&self.region))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), SqsError> {
        if self.region.trim().is_empty() {
            return Err(SqsError::Configuration {
                message: "Region cannot be empty".to_string(),
            });
        }

        Endpoint::parse(&self.resolved_endpoint())?;
        self.pool.validate()
    }

    /// Load configuration from an optional file and `MINI_SQS__*` environment
    /// variables. Environment values override the file.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if a source cannot be read or deserialized, or the
    /// result fails [`ClientConfig::validate`].
    pub fn load(path: Option<&Path>) -> Result<Self, SqsError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let loaded = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| SqsError::Configuration {
                message: format!("Failed to build configuration: {}", e),
            })?;

        let client_config: ClientConfig =
            loaded
                .try_deserialize()
                .map_err(|e| SqsError::Configuration {
                    message: format!("Failed to deserialize configuration: {}", e),
                })?;

        client_config.validate()?;
        Ok(client_config)
    }
}

/// Connection pool settings for the shared transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolOptions {
    /// Maximum idle connections kept per host
    pub max_idle_per_host: usize,

    /// How long an idle connection is kept, in milliseconds
    pub idle_timeout_ms: u64,

    /// TCP connect timeout, in milliseconds
    pub connect_timeout_ms: u64,

    /// Whole-request timeout for pooled calls, in milliseconds
    pub request_timeout_ms: u64,
}

impl PoolOptions {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    fn validate(&self) -> Result<(), SqsError> {
        if self.connect_timeout_ms == 0 || self.request_timeout_ms == 0 {
            return Err(SqsError::Configuration {
                message: "Pool timeouts must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_idle_per_host: 32,
            idle_timeout_ms: 4_000,
            connect_timeout_ms: 10_000,
            request_timeout_ms: 30_000,
        }
    }
}
