//! Tests for client configuration.

use super::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

// ============================================================================
// Construction Tests
// ============================================================================

mod construction {
    use super::*;

    /// Verify defaults derive the public endpoint from the region.
    #[test]
    fn test_default_endpoint() {
        let config = ClientConfig::new("eu-central-1");

        assert_eq!(
            config.resolved_endpoint(),
            "https://sqs.eu-central-1.amazonaws.com"
        );
        assert_eq!(config.pool, PoolOptions::default());
        assert!(config.validate().is_ok());
    }

    /// Verify an explicit endpoint wins over the default.
    #[test]
    fn test_endpoint_override() {
        let config = ClientConfig::new("eu-central-1").with_endpoint("http://localhost:4566");

        assert_eq!(config.resolved_endpoint(), "http://localhost:4566");
    }

    /// Verify pool durations are derived from the millisecond fields.
    #[test]
    fn test_pool_durations() {
        let pool = PoolOptions {
            max_idle_per_host: 4,
            idle_timeout_ms: 1_500,
            connect_timeout_ms: 250,
            request_timeout_ms: 5_000,
        };

        assert_eq!(pool.idle_timeout(), Duration::from_millis(1_500));
        assert_eq!(pool.connect_timeout(), Duration::from_millis(250));
        assert_eq!(pool.request_timeout(), Duration::from_secs(5));
    }
}

// ============================================================================
// Validation Tests
// ============================================================================

mod validation {
    use super::*;

    /// Verify an empty region is rejected.
    #[test]
    fn test_empty_region() {
        let result = ClientConfig::new("  ").validate();

        assert!(matches!(result, Err(SqsError::Configuration { .. })));
    }

    /// Verify an unparseable endpoint is rejected.
    #[test]
    fn test_invalid_endpoint() {
        let result = ClientConfig::new("eu-central-1")
            .with_endpoint("localhost without scheme")
            .validate();

        assert!(matches!(result, Err(SqsError::Configuration { .. })));
    }

    /// Verify zero timeouts are rejected.
    #[test]
    fn test_zero_timeout() {
        let pool = PoolOptions {
            request_timeout_ms: 0,
            ..PoolOptions::default()
        };

        let result = ClientConfig::new("eu-central-1")
            .with_pool_options(pool)
            .validate();

        assert!(matches!(result, Err(SqsError::Configuration { .. })));
    }
}

// ============================================================================
// Loading Tests
// ============================================================================

mod loading {
    use super::*;

    /// Verify a YAML file is loaded with pool defaults filled in.
    #[test]
    fn test_load_yaml_file() {
        let file = write_config(
            ".yaml",
            "region: eu-central-1\nendpoint: http://localhost:4566\npool:\n  connect_timeout_ms: 500\n",
        );

        let config = ClientConfig::load(Some(file.path())).unwrap();

        assert_eq!(config.region, "eu-central-1");
        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:4566"));
        assert_eq!(config.pool.connect_timeout_ms, 500);
        assert_eq!(config.pool.request_timeout_ms, 30_000);
    }

    /// Verify a TOML file is accepted.
    #[test]
    fn test_load_toml_file() {
        let file = write_config(".toml", "region = \"us-west-2\"\n");

        let config = ClientConfig::load(Some(file.path())).unwrap();

        assert_eq!(config.region, "us-west-2");
        assert_eq!(config.endpoint, None);
    }

    /// Verify environment variables override nested file values.
    #[test]
    fn test_environment_overrides_file() {
        let file = write_config(
            ".json",
            r#"{ "region": "eu-west-1", "pool": { "max_idle_per_host": 2 } }"#,
        );
        std::env::set_var("MINI_SQS__POOL__MAX_IDLE_PER_HOST", "16");

        let result = ClientConfig::load(Some(file.path()));
        std::env::remove_var("MINI_SQS__POOL__MAX_IDLE_PER_HOST");

        let config = result.unwrap();
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.pool.max_idle_per_host, 16);
    }

    /// Verify a missing file is a configuration error.
    #[test]
    fn test_missing_file() {
        let result = ClientConfig::load(Some(Path::new("/nonexistent/mini-sqs.yaml")));

        assert!(matches!(result, Err(SqsError::Configuration { .. })));
    }

    /// Verify a file that fails validation is rejected.
    #[test]
    fn test_invalid_values_rejected() {
        let file = write_config(".yaml", "region: eu-central-1\nendpoint: not-a-url\n");

        let result = ClientConfig::load(Some(file.path()));

        assert!(matches!(result, Err(SqsError::Configuration { .. })));
    }
}
