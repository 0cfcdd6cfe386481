//! The region-bound SQS client.
//!
//! A [`MiniSqsClient`] owns one connection pool for its configured endpoint and
//! accepts the queue ARN on every call. Each call resolves the ARN against the
//! client's region first, so a queue in another region fails before any I/O.
//!
//! # Example
//!
//! ```no_run
//! use mini_sqs::{ClientConfig, MiniSqsClient, SendMessage};
//!
//! # async fn example() -> Result<(), mini_sqs::SqsError> {
//! let client = MiniSqsClient::new(ClientConfig::new("eu-central-1"))?;
//! let queue = "arn:aws:sqs:eu-central-1:000000000000:orders";
//!
//! let sent = client
//!     .send_message(queue, SendMessage::new("Hello World!"))
//!     .await?;
//! println!("{:?}", sent.message_id);
//!
//! client.destroy(None).await?;
//! # Ok(())
//! # }
//! ```

use crate::arn::{self, Endpoint, QueueCoordinates};
use crate::batch::split_into_chunks;
use crate::config::ClientConfig;
use crate::error::SqsError;
use crate::executor::RequestExecutor;
use crate::model::{
    BatchRequest, BatchResultEntry, ChangeMessageVisibilityBatchEntry,
    ChangeMessageVisibilityBatchResult, DeleteMessageBatchEntry, DeleteMessageBatchResult,
    ReceiveMessage, ReceiveMessageResult, SendMessage, SendMessageBatchItem,
    SendMessageBatchResult, SendMessageResult, Target,
};
use crate::receive::LongPollReceiver;
use crate::signer::{EnvironmentSignerProvider, RequestSigner, SignerSource, SigningAdapter};
use crate::transport::{
    HttpTransport, ReqwestPool, ReqwestTransportFactory, TransportFactory,
};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ReceiptRequest<'a> {
    receipt_handle: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    visibility_timeout: Option<u32>,
}

/// Lightweight client for one region and endpoint
pub struct MiniSqsClient {
    config: ClientConfig,
    endpoint: Endpoint,
    pool: Arc<dyn HttpTransport>,
    signer: Arc<dyn RequestSigner>,
    owns_signer: bool,
    executor: RequestExecutor,
    receiver: LongPollReceiver,
}

impl MiniSqsClient {
    /// Create a client with `reqwest` transports that signs with the
    /// process-wide [`EnvironmentSignerProvider::global`] signer.
    ///
    /// The shared signer is not destroyed with the client. Use
    /// [`MiniSqsClient::builder`] to supply a signer instead.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid, no credentials are
    /// available, or the connection pool cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, SqsError> {
        Self::builder(config)
            .signer(SignerSource::Shared(EnvironmentSignerProvider::global()))
            .build()
    }

    pub fn builder(config: ClientConfig) -> MiniSqsClientBuilder {
        MiniSqsClientBuilder::new(config)
    }

    pub fn region(&self) -> &str {
        &self.config.region
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.url()
    }

    /// Whether [`MiniSqsClient::destroy`] tears down the signer by default
    pub fn owns_signer(&self) -> bool {
        self.owns_signer
    }

    fn coordinates(&self, queue_arn: &str) -> Result<QueueCoordinates, SqsError> {
        arn::resolve(queue_arn, &self.config.region, &self.endpoint)
    }

    /// Send a single message.
    #[instrument(skip(self, message), fields(queue = %queue_arn))]
    pub async fn send_message(
        &self,
        queue_arn: &str,
        message: SendMessage,
    ) -> Result<SendMessageResult, SqsError> {
        let coordinates = self.coordinates(queue_arn)?;
        self.executor
            .execute(Target::SendMessage, &message, &coordinates)
            .await
    }

    /// Send any number of messages, ten per request.
    ///
    /// Chunks are sent one after the other. Entries without an `Id` get a
    /// generated one; `Successful` and `Failed` are concatenated in chunk order.
    #[instrument(skip(self, messages), fields(queue = %queue_arn))]
    pub async fn send_message_batch<I>(
        &self,
        queue_arn: &str,
        messages: I,
    ) -> Result<SendMessageBatchResult, SqsError>
    where
        I: IntoIterator<Item = SendMessageBatchItem>,
    {
        let coordinates = self.coordinates(queue_arn)?;
        let chunks = split_into_chunks(messages);

        let mut result = SendMessageBatchResult::default();
        for (index, chunk) in chunks.iter().enumerate() {
            debug!(chunk = index, entries = chunk.len(), "Sending message batch chunk");
            let response: SendMessageBatchResult = self
                .executor
                .execute(
                    Target::SendMessageBatch,
                    &BatchRequest { entries: chunk },
                    &coordinates,
                )
                .await?;
            result.merge(response);
        }

        Ok(result)
    }

    /// Delete a message by receipt handle.
    #[instrument(skip(self, receipt_handle), fields(queue = %queue_arn))]
    pub async fn delete_message(
        &self,
        queue_arn: &str,
        receipt_handle: &str,
    ) -> Result<bool, SqsError> {
        let coordinates = self.coordinates(queue_arn)?;
        let body = ReceiptRequest {
            receipt_handle,
            visibility_timeout: None,
        };
        self.executor
            .execute_ack(Target::DeleteMessage, &body, &coordinates)
            .await
    }

    /// Delete any number of messages, ten per request.
    ///
    /// # Errors
    ///
    /// A chunk that fails outright yields `BatchPartialFailure` carrying the
    /// entries of that chunk. Earlier chunks have already been applied and the
    /// failing one may have been applied in part.
    #[instrument(skip(self, entries), fields(queue = %queue_arn))]
    pub async fn delete_message_batch<I>(
        &self,
        queue_arn: &str,
        entries: I,
    ) -> Result<DeleteMessageBatchResult, SqsError>
    where
        I: IntoIterator<Item = DeleteMessageBatchEntry>,
    {
        let coordinates = self.coordinates(queue_arn)?;
        let chunks = split_into_chunks(entries);

        let mut result = DeleteMessageBatchResult::default();
        for (index, chunk) in chunks.into_iter().enumerate() {
            debug!(chunk = index, entries = chunk.len(), "Deleting message batch chunk");
            let response = self
                .executor
                .execute::<_, DeleteMessageBatchResult>(
                    Target::DeleteMessageBatch,
                    &BatchRequest { entries: &chunk },
                    &coordinates,
                )
                .await;

            match response {
                Ok(response) => result.merge(response),
                Err(e) => {
                    warn!(
                        chunk = index,
                        entries = chunk.len(),
                        error = %e,
                        "Delete batch chunk failed"
                    );
                    return Err(SqsError::BatchPartialFailure {
                        source: Box::new(e),
                        entries: chunk,
                    });
                }
            }
        }

        Ok(result)
    }

    /// Long-poll for messages.
    ///
    /// `wait_time_seconds` is clamped to 20 and defaults to 20.
    #[instrument(skip(self, request), fields(queue = %queue_arn))]
    pub async fn receive_message(
        &self,
        queue_arn: &str,
        request: ReceiveMessage,
    ) -> Result<ReceiveMessageResult, SqsError> {
        let coordinates = self.coordinates(queue_arn)?;
        self.receiver.receive(&coordinates, request).await
    }

    /// Change the visibility timeout of a received message.
    #[instrument(skip(self, receipt_handle), fields(queue = %queue_arn))]
    pub async fn change_message_visibility(
        &self,
        queue_arn: &str,
        receipt_handle: &str,
        visibility_timeout: u32,
    ) -> Result<bool, SqsError> {
        let coordinates = self.coordinates(queue_arn)?;
        let body = ReceiptRequest {
            receipt_handle,
            visibility_timeout: Some(visibility_timeout),
        };
        self.executor
            .execute_ack(Target::ChangeMessageVisibility, &body, &coordinates)
            .await
    }

    /// Change the visibility timeout of any number of messages, ten per request.
    #[instrument(skip(self, entries), fields(queue = %queue_arn))]
    pub async fn change_message_visibility_batch<I>(
        &self,
        queue_arn: &str,
        entries: I,
    ) -> Result<ChangeMessageVisibilityBatchResult, SqsError>
    where
        I: IntoIterator<Item = ChangeMessageVisibilityBatchEntry>,
    {
        let coordinates = self.coordinates(queue_arn)?;
        let chunks = split_into_chunks(entries);

        let mut result = ChangeMessageVisibilityBatchResult::default();
        for (index, chunk) in chunks.iter().enumerate() {
            debug!(
                chunk = index,
                entries = chunk.len(),
                "Changing visibility batch chunk"
            );
            let response: ChangeMessageVisibilityBatchResult = self
                .executor
                .execute(
                    Target::ChangeMessageVisibilityBatch,
                    &BatchRequest { entries: chunk },
                    &coordinates,
                )
                .await?;
            result.merge(response);
        }

        Ok(result)
    }

    /// Tear the client down.
    ///
    /// The pool is always destroyed. The signer is destroyed when the client owns
    /// it, unless `destroy_signer` says otherwise. Both run concurrently and both
    /// are attempted; the first failure is returned.
    pub async fn destroy(self, destroy_signer: Option<bool>) -> Result<(), SqsError> {
        let destroy_signer = destroy_signer.unwrap_or(self.owns_signer);

        debug!(
            endpoint = %self.endpoint.url(),
            destroy_signer,
            "Destroying client"
        );

        let signer = self.signer.clone();
        let (pool_result, signer_result) = tokio::join!(self.pool.destroy(), async move {
            if destroy_signer {
                signer.destroy().await.map_err(SqsError::from)
            } else {
                Ok(())
            }
        });

        if let Err(e) = &pool_result {
            warn!(error = %e, "Failed to destroy connection pool");
        }
        if let Err(e) = &signer_result {
            warn!(error = %e, "Failed to destroy signer");
        }

        pool_result.and(signer_result)
    }
}

impl fmt::Debug for MiniSqsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiniSqsClient")
            .field("region", &self.config.region)
            .field("endpoint", &self.endpoint.url())
            .field("owns_signer", &self.owns_signer)
            .finish()
    }
}

/// Builder for [`MiniSqsClient`] with substitutable collaborators
pub struct MiniSqsClientBuilder {
    config: ClientConfig,
    signer: Option<SignerSource>,
    transport: Option<Arc<dyn HttpTransport>>,
    transport_factory: Option<Arc<dyn TransportFactory>>,
}

impl MiniSqsClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            signer: None,
            transport: None,
            transport_factory: None,
        }
    }

    /// Where to get the signer from. Required.
    pub fn signer(mut self, signer: SignerSource) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Replace the pooled transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the factory that builds long-poll transports.
    pub fn transport_factory(mut self, factory: Arc<dyn TransportFactory>) -> Self {
        self.transport_factory = Some(factory);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// - `Configuration` if the configuration does not validate or no signer
    ///   source was given
    /// - `Signing` if the signer cannot be created
    /// - `Transport` if the connection pool cannot be built
    pub fn build(self) -> Result<MiniSqsClient, SqsError> {
        self.config.validate()?;
        let endpoint = Endpoint::parse(&self.config.resolved_endpoint())?;

        let source = self.signer.ok_or_else(|| SqsError::Configuration {
            message: "No signer source configured".to_string(),
        })?;
        let (signer, owns_signer) = source.resolve()?;

        let pool: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestPool::new(endpoint.url(), &self.config.pool)?),
        };
        let factory: Arc<dyn TransportFactory> = match self.transport_factory {
            Some(factory) => factory,
            None => Arc::new(ReqwestTransportFactory),
        };

        let signing = SigningAdapter::new(signer.clone());
        let executor = RequestExecutor::new(pool.clone(), signing.clone());
        let receiver = LongPollReceiver::new(factory, signing, self.config.pool.clone());

        debug!(
            region = %self.config.region,
            endpoint = %endpoint.url(),
            owns_signer,
            "Created SQS client"
        );

        Ok(MiniSqsClient {
            config: self.config,
            endpoint,
            pool,
            signer,
            owns_signer,
            executor,
            receiver,
        })
    }
}
