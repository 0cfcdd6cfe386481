//! Request execution over the shared connection pool.

use crate::arn::QueueCoordinates;
use crate::error::SqsError;
use crate::model::Target;
use crate::signer::SigningAdapter;
use crate::transport::{HttpResponse, HttpTransport};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;

/// Serializes, signs and sends one request, then classifies the response.
#[derive(Clone)]
pub(crate) struct RequestExecutor {
    pool: Arc<dyn HttpTransport>,
    signing: SigningAdapter,
}

impl RequestExecutor {
    pub(crate) fn new(pool: Arc<dyn HttpTransport>, signing: SigningAdapter) -> Self {
        Self { pool, signing }
    }

    /// Execute an operation whose 200 response carries a JSON result.
    pub(crate) async fn execute<B, R>(
        &self,
        target: Target,
        body: &B,
        coordinates: &QueueCoordinates,
    ) -> Result<R, SqsError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self.send(target, body, coordinates).await?;
        response.json()
    }

    /// Execute an operation whose only outcome is success or failure.
    pub(crate) async fn execute_ack<B>(
        &self,
        target: Target,
        body: &B,
        coordinates: &QueueCoordinates,
    ) -> Result<bool, SqsError>
    where
        B: Serialize + ?Sized,
    {
        self.send(target, body, coordinates).await?;
        Ok(true)
    }

    async fn send<B>(
        &self,
        target: Target,
        body: &B,
        coordinates: &QueueCoordinates,
    ) -> Result<HttpResponse, SqsError>
    where
        B: Serialize + ?Sized,
    {
        let payload = Bytes::from(serde_json::to_vec(body)?);

        debug!(
            operation = %target,
            queue = %coordinates.queue_name,
            bytes = payload.len(),
            "Sending request"
        );

        let envelope = self.signing.sign(target, coordinates, payload).await?;
        let response = self.pool.request(&envelope).await?;

        if response.status() != 200 {
            let message = protocol_error_message(&response.text());
            warn!(
                operation = %target,
                queue = %coordinates.queue_name,
                status = response.status(),
                error = %message,
                "Request rejected by service"
            );
            return Err(SqsError::Protocol {
                status: response.status(),
                message,
            });
        }

        debug!(
            operation = %target,
            queue = %coordinates.queue_name,
            status = response.status(),
            "Request completed"
        );

        Ok(response)
    }
}

/// Extract the error text from a non-200 body.
///
/// A JSON object whose `message` is a non-empty string, a non-zero number or
/// `true` yields that value as text; anything else yields the body verbatim.
pub(crate) fn protocol_error_message(body: &str) -> String {
    let fields = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(fields)) => fields,
        _ => return body.to_string(),
    };

    match fields.get("message") {
        Some(Value::String(message)) if !message.is_empty() => message.clone(),
        Some(Value::Number(number)) if number.as_f64() != Some(0.0) => number.to_string(),
        Some(Value::Bool(true)) => "true".to_string(),
        _ => body.to_string(),
    }
}
