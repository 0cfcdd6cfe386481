//! Queue address resolution.
//!
//! A queue is named by its ARN, `arn:aws:sqs:<region>:<account-id>:<queue-name>`.
//! The client reads the trailing three components in reverse order, so any
//! prefix shape is accepted. A queue name that itself contains `:` cannot be
//! told apart from extra ARN segments and is not supported.
//!
//! The network address never comes from the ARN: host and endpoint are taken
//! from the client's configured [`Endpoint`], so every queue in the client's
//! region shares one connection pool.

use crate::error::SqsError;
use std::fmt;
use std::str::FromStr;
use url::Url;

#[cfg(test)]
#[path = "arn_tests.rs"]
mod tests;

/// Parsed endpoint URL the client sends every request to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: String,
    host: String,
}

impl Endpoint {
    /// Default public endpoint for a region
    pub fn default_for_region(region: &str) -> String {
        format!("https://sqs.{}.amazonaws.com", region)
    }

    /// Parse an endpoint URL such as `https://sqs.eu-central-1.amazonaws.com`
    /// or `http://localhost:4566`.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the URL cannot be parsed or has no host.
    pub fn parse(endpoint: &str) -> Result<Self, SqsError> {
        let parsed = Url::parse(endpoint).map_err(|e| SqsError::Configuration {
            message: format!("Invalid endpoint URL '{}': {}", endpoint, e),
        })?;

        let host_name = parsed.host_str().ok_or_else(|| SqsError::Configuration {
            message: format!("Endpoint URL '{}' has no host", endpoint),
        })?;

        // The Host header carries the port only when it is not the scheme default.
        let host = match parsed.port() {
            Some(port) => format!("{}:{}", host_name, port),
            None => host_name.to_string(),
        };

        Ok(Self {
            url: endpoint.trim_end_matches('/').to_string(),
            host,
        })
    }

    /// Endpoint URL without a trailing slash
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Value for the `Host` header
    pub fn host(&self) -> &str {
        &self.host
    }
}

/// The routable parts of a queue ARN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueArn {
    pub region: String,
    pub account_id: String,
    pub queue_name: String,
}

impl FromStr for QueueArn {
    type Err = SqsError;

    fn from_str(arn: &str) -> Result<Self, Self::Err> {
        let mut parts = arn.rsplit(':');
        let (queue_name, account_id, region) = match (parts.next(), parts.next(), parts.next()) {
            (Some(queue_name), Some(account_id), Some(region)) => (queue_name, account_id, region),
            _ => {
                return Err(SqsError::InvalidQueueArn {
                    arn: arn.to_string(),
                    message: "expected <prefix>:<region>:<account-id>:<queue-name>".to_string(),
                })
            }
        };

        for (component, value) in [
            ("region", region),
            ("account id", account_id),
            ("queue name", queue_name),
        ] {
            if value.is_empty() {
                return Err(SqsError::InvalidQueueArn {
                    arn: arn.to_string(),
                    message: format!("{} is empty", component),
                });
            }
        }

        Ok(Self {
            region: region.to_string(),
            account_id: account_id.to_string(),
            queue_name: queue_name.to_string(),
        })
    }
}

/// Everything needed to address one queue through the client's endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueCoordinates {
    pub region: String,
    pub account_id: String,
    pub queue_name: String,
    pub host: String,
    pub endpoint: String,
}

impl QueueCoordinates {
    /// Request path, `/{account_id}/{queue_name}/`
    pub fn path(&self) -> String {
        format!("/{}/{}/", self.account_id, self.queue_name)
    }
}

impl fmt::Display for QueueCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.endpoint, self.path())
    }
}

/// Resolve a queue ARN against the client's region and endpoint.
///
/// Pure; called on every operation before any I/O.
///
/// # Errors
///
/// - `InvalidQueueArn` if the ARN has fewer than three components
/// - `RegionMismatch` if the ARN's region is not `client_region`
pub fn resolve(
    queue_arn: &str,
    client_region: &str,
    endpoint: &Endpoint,
) -> Result<QueueCoordinates, SqsError> {
    let arn: QueueArn = queue_arn.parse()?;

    if arn.region != client_region {
        return Err(SqsError::RegionMismatch {
            queue_region: arn.region,
            client_region: client_region.to_string(),
        });
    }

    Ok(QueueCoordinates {
        region: arn.region,
        account_id: arn.account_id,
        queue_name: arn.queue_name,
        host: endpoint.host().to_string(),
        endpoint: endpoint.url().to_string(),
    })
}
