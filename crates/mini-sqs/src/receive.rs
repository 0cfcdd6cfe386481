//! Long-poll receive.
//!
//! A receive may legitimately hold the connection for its whole wait time, which
//! is longer than the shared pool's request timeout allows. Each receive therefore
//! gets its own short-lived transport from a [`TransportFactory`], sized to the
//! requested wait and closed as soon as the call is over.

use crate::arn::QueueCoordinates;
use crate::config::PoolOptions;
use crate::error::SqsError;
use crate::model::{ReceiveMessage, ReceiveMessageResult, Target};
use crate::signer::SigningAdapter;
use crate::transport::{LongPollOptions, TransportFactory, LONG_POLL_KEEP_ALIVE};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[cfg(test)]
#[path = "receive_tests.rs"]
mod tests;

/// Longest wait the service accepts for a single receive
pub const MAX_WAIT_TIME_SECONDS: u32 = 20;

/// Clamp a requested wait to the service maximum; absent means the maximum.
pub fn clamp_wait_time(requested: Option<u32>) -> u32 {
    requested.map_or(MAX_WAIT_TIME_SECONDS, |seconds| {
        seconds.min(MAX_WAIT_TIME_SECONDS)
    })
}

/// Connect and body timeout for a long poll of `wait_time_seconds`.
pub fn long_poll_timeout(wait_time_seconds: u32) -> Duration {
    Duration::from_millis(u64::from(wait_time_seconds) * 1000 + 1000)
}

pub(crate) struct LongPollReceiver {
    factory: Arc<dyn TransportFactory>,
    signing: SigningAdapter,
    pool_options: PoolOptions,
}

impl LongPollReceiver {
    pub(crate) fn new(
        factory: Arc<dyn TransportFactory>,
        signing: SigningAdapter,
        pool_options: PoolOptions,
    ) -> Self {
        Self {
            factory,
            signing,
            pool_options,
        }
    }

    pub(crate) async fn receive(
        &self,
        coordinates: &QueueCoordinates,
        mut request: ReceiveMessage,
    ) -> Result<ReceiveMessageResult, SqsError> {
        let wait_time_seconds = clamp_wait_time(request.wait_time_seconds);
        request.wait_time_seconds = Some(wait_time_seconds);

        let payload = Bytes::from(serde_json::to_vec(&request)?);
        let envelope = self
            .signing
            .sign(Target::ReceiveMessage, coordinates, payload)
            .await?;

        let options = LongPollOptions {
            timeout: long_poll_timeout(wait_time_seconds),
            keep_alive: LONG_POLL_KEEP_ALIVE,
            pool: self.pool_options.clone(),
        };

        debug!(
            queue = %coordinates.queue_name,
            wait_time_seconds,
            timeout_ms = options.timeout.as_millis() as u64,
            "Starting long poll"
        );

        let client = self.factory.connect(&coordinates.endpoint, &options)?;

        let outcome = match client.request(&envelope).await {
            Ok(response) if response.status() == 200 => response.json::<ReceiveMessageResult>(),
            Ok(response) => {
                warn!(
                    queue = %coordinates.queue_name,
                    status = response.status(),
                    "Receive rejected by service"
                );
                Err(SqsError::Protocol {
                    status: response.status(),
                    message: response.text(),
                })
            }
            Err(e) => Err(e),
        };

        // The client is closed on every path; a close failure never masks the
        // outcome of the receive itself.
        if let Err(e) = client.close().await {
            warn!(
                queue = %coordinates.queue_name,
                error = %e,
                "Failed to close long-poll client"
            );
        }

        if let Ok(result) = &outcome {
            debug!(
                queue = %coordinates.queue_name,
                messages = result.messages.len(),
                "Long poll completed"
            );
        }

        outcome
    }
}
