//! AWS Signature Version 4 request signer.
//!
//! Implements the signing process over HMAC-SHA256:
//! 1. Create canonical request (method, URI, query, headers, payload hash)
//! 2. Create string to sign (algorithm, timestamp, scope, request hash)
//! 3. Derive signing key (4-level HMAC chain)
//! 4. Calculate signature and build Authorization header
//!
//! ## References
//!
//! - [AWS Signature V4](https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html)

use crate::signer::{RequestSigner, SignableRequest, SigningError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(test)]
#[path = "sigv4_tests.rs"]
mod tests;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Credentials for building an [`AwsV4Signer`].
///
/// Missing values fall back to `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and
/// `AWS_SESSION_TOKEN`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SignerOptions {
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
}

impl SignerOptions {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: Some(access_key_id.into()),
            secret_access_key: Some(secret_access_key.into()),
            session_token: None,
        }
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }
}

impl fmt::Debug for SignerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerOptions")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// AWS Signature V4 signer for request authentication
pub struct AwsV4Signer {
    access_key: String,
    secret_key: String,
    session_token: Option<String>,
    destroyed: AtomicBool,
}

impl AwsV4Signer {
    /// Create a signer from explicit options, falling back to the environment.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredentials` if no access key or secret key is available.
    pub fn new(options: SignerOptions) -> Result<Self, SigningError> {
        let access_key = options
            .access_key_id
            .or_else(|| env_var("AWS_ACCESS_KEY_ID"))
            .ok_or_else(|| SigningError::MissingCredentials {
                message: "access key id not configured and AWS_ACCESS_KEY_ID not set".to_string(),
            })?;
        let secret_key = options
            .secret_access_key
            .or_else(|| env_var("AWS_SECRET_ACCESS_KEY"))
            .ok_or_else(|| SigningError::MissingCredentials {
                message: "secret access key not configured and AWS_SECRET_ACCESS_KEY not set"
                    .to_string(),
            })?;
        let session_token = options
            .session_token
            .or_else(|| env_var("AWS_SESSION_TOKEN"));

        Ok(Self {
            access_key,
            secret_key,
            session_token,
            destroyed: AtomicBool::new(false),
        })
    }

    /// Create a signer purely from environment credentials.
    pub fn from_env() -> Result<Self, SigningError> {
        Self::new(SignerOptions::default())
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Sign `request` as of `timestamp`.
    ///
    /// Every header already on the request is signed. `x-amz-date`,
    /// `x-amz-security-token` (when a session token is set) and `authorization`
    /// are added.
    pub fn sign_at(
        &self,
        mut request: SignableRequest,
        service: &str,
        region: &str,
        timestamp: &DateTime<Utc>,
    ) -> SignableRequest {
        let date_stamp = timestamp.format("%Y%m%d").to_string();
        let amz_date = timestamp.format("%Y%m%dT%H%M%SZ").to_string();

        request.headers = request
            .headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.trim().to_string()))
            .collect();
        request
            .headers
            .insert("x-amz-date".to_string(), amz_date.clone());
        if let Some(token) = &self.session_token {
            request
                .headers
                .insert("x-amz-security-token".to_string(), token.clone());
        }

        // Task 1: Create canonical request. BTreeMap iteration is already sorted.
        let canonical_headers: String = request
            .headers
            .iter()
            .map(|(name, value)| format!("{}:{}\n", name, value))
            .collect();
        let signed_headers = request
            .headers
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(";");
        let payload_hash = hex::encode(Sha256::digest(&request.body));

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            request.method, request.path, "", canonical_headers, signed_headers, payload_hash
        );

        // Task 2: Create string to sign
        let credential_scope = format!("{}/{}/{}/aws4_request", date_stamp, region, service);
        let canonical_request_hash = hex::encode(Sha256::digest(canonical_request.as_bytes()));
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM, amz_date, credential_scope, canonical_request_hash
        );

        // Task 3: Calculate signature
        let signature = self.calculate_signature(&string_to_sign, &date_stamp, region, service);

        // Task 4: Build authorization header
        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, self.access_key, credential_scope, signed_headers, signature
        );
        request
            .headers
            .insert("authorization".to_string(), authorization);

        request
    }

    /// kSecret -> kDate -> kRegion -> kService -> kSigning -> signature
    fn calculate_signature(
        &self,
        string_to_sign: &str,
        date_stamp: &str,
        region: &str,
        service: &str,
    ) -> String {
        let k_secret = format!("AWS4{}", self.secret_key);
        let k_date = hmac_sha256(k_secret.as_bytes(), date_stamp.as_bytes());
        let k_region = hmac_sha256(&k_date, region.as_bytes());
        let k_service = hmac_sha256(&k_region, service.as_bytes());
        let k_signing = hmac_sha256(&k_service, b"aws4_request");
        let signature = hmac_sha256(&k_signing, string_to_sign.as_bytes());

        hex::encode(signature)
    }
}

#[async_trait]
impl RequestSigner for AwsV4Signer {
    async fn sign(
        &self,
        request: SignableRequest,
        service: &str,
        region: &str,
    ) -> Result<SignableRequest, SigningError> {
        if self.is_destroyed() {
            return Err(SigningError::Destroyed);
        }
        Ok(self.sign_at(request, service, region, &Utc::now()))
    }

    async fn destroy(&self) -> Result<(), SigningError> {
        self.destroyed.store(true, Ordering::Release);
        Ok(())
    }
}

impl fmt::Debug for AwsV4Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsV4Signer")
            .field("access_key", &self.access_key)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}
