//! Request signing.
//!
//! The signing algorithm lives behind [`RequestSigner`]; [`crate::sigv4::AwsV4Signer`]
//! is the implementation shipped with this crate. [`SigningAdapter`] assembles the
//! canonical request the signer expects and merges the signer's headers with the
//! content headers the JSON protocol requires.

use crate::arn::QueueCoordinates;
use crate::error::SqsError;
use crate::model::Target;
use crate::sigv4::{AwsV4Signer, SignerOptions};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

#[cfg(test)]
#[path = "signer_tests.rs"]
mod tests;

/// Service name used in the credential scope
pub const SERVICE_NAME: &str = "sqs";

/// Content type of every request body
pub const CONTENT_TYPE: &str = "application/x-amz-json-1.0";

/// Errors raised by a [`RequestSigner`]
#[derive(Debug, Error)]
pub enum SigningError {
    #[error("No credentials available: {message}")]
    MissingCredentials { message: String },

    #[error("Signer has been destroyed")]
    Destroyed,

    #[error("Invalid signed request: {message}")]
    InvalidRequest { message: String },
}

/// A request in the shape the signer consumes and produces.
///
/// Header names are lower-case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignableRequest {
    pub method: String,
    pub path: String,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

/// Signed request ready for the transport.
///
/// `body` is the exact byte sequence that was signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestEnvelope {
    pub method: String,
    pub path: String,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

/// Produces authenticated headers for a request.
///
/// Implementations must be safe to share between clients and to call
/// concurrently.
#[async_trait]
pub trait RequestSigner: Send + Sync {
    /// Return `request` with authentication headers added.
    async fn sign(
        &self,
        request: SignableRequest,
        service: &str,
        region: &str,
    ) -> Result<SignableRequest, SigningError>;

    /// Release resources held by the signer.
    async fn destroy(&self) -> Result<(), SigningError>;
}

/// Accessor for a signer shared by every client in the process.
pub trait SharedSignerProvider: Send + Sync {
    fn shared_signer(&self) -> Result<Arc<dyn RequestSigner>, SqsError>;
}

/// Lazily builds one [`AwsV4Signer`] from the environment and hands out clones.
#[derive(Default)]
pub struct EnvironmentSignerProvider {
    signer: OnceLock<Arc<AwsV4Signer>>,
}

impl EnvironmentSignerProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide provider [`crate::MiniSqsClient::new`] signs with.
    pub fn global() -> Arc<EnvironmentSignerProvider> {
        static GLOBAL: OnceLock<Arc<EnvironmentSignerProvider>> = OnceLock::new();
        GLOBAL
            .get_or_init(|| Arc::new(EnvironmentSignerProvider::new()))
            .clone()
    }
}

impl SharedSignerProvider for EnvironmentSignerProvider {
    fn shared_signer(&self) -> Result<Arc<dyn RequestSigner>, SqsError> {
        if let Some(signer) = self.signer.get() {
            return Ok(signer.clone());
        }

        let signer = Arc::new(AwsV4Signer::from_env()?);
        Ok(self.signer.get_or_init(|| signer).clone())
    }
}

impl fmt::Debug for EnvironmentSignerProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentSignerProvider")
            .field("initialized", &self.signer.get().is_some())
            .finish()
    }
}

/// Where a client gets its signer from, and whether it owns it.
pub enum SignerSource {
    /// Caller-supplied signer. Never destroyed by the client.
    Instance(Arc<dyn RequestSigner>),
    /// Built by the client from options. Destroyed with the client.
    Options(SignerOptions),
    /// Process-wide signer from the provider. Never destroyed by the client
    /// unless teardown explicitly asks for it.
    Shared(Arc<dyn SharedSignerProvider>),
}

impl SignerSource {
    /// Resolve the source into a signer and its ownership flag.
    pub(crate) fn resolve(self) -> Result<(Arc<dyn RequestSigner>, bool), SqsError> {
        match self {
            Self::Instance(signer) => Ok((signer, false)),
            Self::Options(options) => Ok((Arc::new(AwsV4Signer::new(options)?), true)),
            Self::Shared(provider) => Ok((provider.shared_signer()?, false)),
        }
    }
}

impl fmt::Debug for SignerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(_) => f.write_str("SignerSource::Instance"),
            Self::Options(options) => f.debug_tuple("SignerSource::Options").field(options).finish(),
            Self::Shared(_) => f.write_str("SignerSource::Shared"),
        }
    }
}

/// Stateless glue between the executor and the signer.
#[derive(Clone)]
pub(crate) struct SigningAdapter {
    signer: Arc<dyn RequestSigner>,
}

impl SigningAdapter {
    pub(crate) fn new(signer: Arc<dyn RequestSigner>) -> Self {
        Self { signer }
    }

    /// Sign a POST of `body` for `target` against `coordinates`.
    pub(crate) async fn sign(
        &self,
        target: Target,
        coordinates: &QueueCoordinates,
        body: Bytes,
    ) -> Result<RequestEnvelope, SqsError> {
        let path = coordinates.path();

        let mut headers = BTreeMap::new();
        headers.insert("x-amz-target".to_string(), target.header_value());
        headers.insert("host".to_string(), coordinates.host.clone());

        let request = SignableRequest {
            method: "POST".to_string(),
            path: path.clone(),
            headers,
            body: body.clone(),
        };

        let signed = self
            .signer
            .sign(request, SERVICE_NAME, &coordinates.region)
            .await?;

        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), CONTENT_TYPE.to_string());
        headers.insert("content-length".to_string(), body.len().to_string());
        headers.extend(
            signed
                .headers
                .into_iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), value)),
        );

        for required in ["authorization", "host"] {
            if !headers.contains_key(required) {
                return Err(SigningError::InvalidRequest {
                    message: format!("signer did not produce a '{}' header", required),
                }
                .into());
            }
        }

        Ok(RequestEnvelope {
            method: signed.method,
            path,
            headers,
            body,
        })
    }
}
