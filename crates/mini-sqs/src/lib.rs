//! # Mini SQS
//!
//! Lightweight client for Amazon SQS over the signed HTTP/JSON protocol.
//!
//! This library provides:
//! - Region-bound client with per-call queue ARN resolution
//! - Transparent splitting of batch operations into chunks of ten
//! - Long-poll receives on a short-lived connection sized to the wait time
//! - AWS Signature Version 4 signing with owned or shared signers
//! - A single error type for protocol and transport failures
//!
//! No operation is retried. [`SqsError::is_transient`] helps callers decide.
//!
//! ## Module Organization
//!
//! - [`arn`] - Queue ARN parsing and region validation
//! - [`batch`] - Batch chunking and entry identifiers
//! - [`client`] - The client and its builder
//! - [`config`] - Client and connection pool configuration
//! - [`error`] - Error types for all operations
//! - [`model`] - Request and response shapes
//! - [`receive`] - Long-poll wait and timeout rules
//! - [`signer`] - Signer trait, ownership and the signing adapter
//! - [`sigv4`] - AWS Signature Version 4 signer
//! - [`transport`] - HTTP transport traits and `reqwest` implementations

// Module declarations
pub mod arn;
pub mod batch;
pub mod client;
pub mod config;
pub mod error;
mod executor;
pub mod model;
pub mod receive;
pub mod signer;
pub mod sigv4;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types at crate root for convenience
pub use arn::{Endpoint, QueueArn, QueueCoordinates};
pub use batch::{split_into_chunks, BatchEntry, MAX_BATCH_ENTRIES};
pub use client::{MiniSqsClient, MiniSqsClientBuilder};
pub use config::{ClientConfig, PoolOptions};
pub use error::SqsError;
pub use model::{
    BatchResult, BatchResultEntry, BatchResultErrorEntry, ChangeMessageVisibilityBatchEntry,
    ChangeMessageVisibilityBatchResult, DeleteMessageBatchEntry, DeleteMessageBatchResult,
    Message, MessageAttributeValue, MessageSystemAttributeValue, ReceiveMessage,
    ReceiveMessageResult, SendMessage, SendMessageBatchItem, SendMessageBatchResult,
    SendMessageBatchResultEntry, SendMessageResult, Target,
};
pub use signer::{
    EnvironmentSignerProvider, RequestSigner, SharedSignerProvider, SignableRequest,
    SignerSource, SigningError,
};
pub use sigv4::{AwsV4Signer, SignerOptions};
pub use transport::{
    ClientSettings, HttpResponse, HttpTransport, LongPollOptions, ReqwestPool,
    ReqwestTransportFactory, TransientTransport, TransportFactory,
};
