//! Tests for long-poll receive.

use super::*;
use crate::arn::{resolve, Endpoint};
use crate::test_support::{
    ScriptedTransport, ScriptedTransportFactory, TestSigner, TEST_QUEUE_ARN, TEST_REGION,
};
use serde_json::json;
use std::sync::atomic::Ordering;

fn coordinates() -> QueueCoordinates {
    let endpoint = Endpoint::parse("http://localhost:4566").unwrap();
    resolve(TEST_QUEUE_ARN, TEST_REGION, &endpoint).unwrap()
}

fn receiver(factory: Arc<ScriptedTransportFactory>) -> LongPollReceiver {
    LongPollReceiver::new(
        factory,
        SigningAdapter::new(TestSigner::new()),
        PoolOptions::default(),
    )
}

fn sent_body(factory: &ScriptedTransportFactory) -> serde_json::Value {
    let requests = factory.transport.requests.lock().unwrap();
    serde_json::from_slice(&requests[0].body).unwrap()
}

// ============================================================================
// Wait Time Tests
// ============================================================================

mod wait_time {
    use super::*;

    /// Verify waits above the maximum are clamped and absent waits default to it.
    #[test]
    fn test_clamp_wait_time() {
        assert_eq!(clamp_wait_time(Some(50)), 20);
        assert_eq!(clamp_wait_time(Some(20)), 20);
        assert_eq!(clamp_wait_time(Some(5)), 5);
        assert_eq!(clamp_wait_time(Some(0)), 0);
        assert_eq!(clamp_wait_time(None), 20);
    }

    /// Verify the timeout is one second past the wait.
    #[test]
    fn test_long_poll_timeout() {
        assert_eq!(long_poll_timeout(20), Duration::from_millis(21_000));
        assert_eq!(long_poll_timeout(0), Duration::from_millis(1_000));
    }

    /// Verify a 50 second wait is sent as 20 with a 21000 ms client timeout.
    #[tokio::test]
    async fn test_receive_clamps_request_and_sizes_client() {
        let factory = ScriptedTransportFactory::new(
            ScriptedTransport::new().respond(200, r#"{"Messages":[]}"#),
        );

        receiver(factory.clone())
            .receive(
                &coordinates(),
                ReceiveMessage::new()
                    .with_wait_time_seconds(50)
                    .with_max_number_of_messages(10),
            )
            .await
            .unwrap();

        assert_eq!(
            sent_body(&factory),
            json!({ "MaxNumberOfMessages": 10, "WaitTimeSeconds": 20 })
        );
        let connections = factory.connections();
        assert_eq!(connections.len(), 1);
        let (endpoint, options) = &connections[0];
        assert_eq!(endpoint, "http://localhost:4566");
        assert_eq!(options.timeout, Duration::from_millis(21_000));
        assert_eq!(options.keep_alive, Duration::from_millis(21_000));
    }

    /// Verify a short wait sizes the client to match.
    #[tokio::test]
    async fn test_receive_short_wait() {
        let factory = ScriptedTransportFactory::new(ScriptedTransport::new().respond(200, "{}"));

        receiver(factory.clone())
            .receive(&coordinates(), ReceiveMessage::new().with_wait_time_seconds(2))
            .await
            .unwrap();

        assert_eq!(sent_body(&factory), json!({ "WaitTimeSeconds": 2 }));
        assert_eq!(factory.connections()[0].1.timeout, Duration::from_millis(3_000));
    }
}

// ============================================================================
// Client Lifetime Tests
// ============================================================================

mod client_lifetime {
    use super::*;

    /// Verify the client is closed after a successful receive.
    #[tokio::test]
    async fn test_closed_after_success() {
        let factory = ScriptedTransportFactory::new(ScriptedTransport::new().respond(
            200,
            r#"{"Messages":[{"MessageId":"m-1","ReceiptHandle":"rh-1","Body":"Hello"}]}"#,
        ));

        let result = receiver(factory.clone())
            .receive(&coordinates(), ReceiveMessage::new())
            .await
            .unwrap();

        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.messages[0].body.as_deref(), Some("Hello"));
        assert_eq!(factory.transport.closed.load(Ordering::SeqCst), 1);
    }

    /// Verify a non-200 body is surfaced verbatim, without message extraction.
    #[tokio::test]
    async fn test_error_body_is_verbatim_and_client_closed() {
        let factory = ScriptedTransportFactory::new(
            ScriptedTransport::new().respond(400, r#"{"message":"X"}"#),
        );

        let error = receiver(factory.clone())
            .receive(&coordinates(), ReceiveMessage::new())
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), r#"{"message":"X"}"#);
        assert_eq!(error.status(), Some(400));
        assert_eq!(factory.transport.closed.load(Ordering::SeqCst), 1);
    }

    /// Verify the client is closed when the transport fails.
    #[tokio::test]
    async fn test_closed_after_transport_failure() {
        let factory = ScriptedTransportFactory::new(ScriptedTransport::new().fail("timed out"));

        let error = receiver(factory.clone())
            .receive(&coordinates(), ReceiveMessage::new())
            .await
            .unwrap_err();

        assert!(matches!(error, SqsError::Transport { .. }));
        assert_eq!(factory.transport.closed.load(Ordering::SeqCst), 1);
    }

    /// Verify the client is closed when the body cannot be decoded.
    #[tokio::test]
    async fn test_closed_after_decode_failure() {
        let factory = ScriptedTransportFactory::new(ScriptedTransport::new().respond(200, "nope"));

        let error = receiver(factory.clone())
            .receive(&coordinates(), ReceiveMessage::new())
            .await
            .unwrap_err();

        assert!(matches!(error, SqsError::Serialization(_)));
        assert_eq!(factory.transport.closed.load(Ordering::SeqCst), 1);
    }

    /// Verify a close failure does not replace a successful result.
    #[tokio::test]
    async fn test_close_failure_does_not_mask_result() {
        let factory = ScriptedTransportFactory::new(
            ScriptedTransport::new().respond(200, "{}").failing_close(),
        );

        let result = receiver(factory.clone())
            .receive(&coordinates(), ReceiveMessage::new())
            .await;

        assert!(result.is_ok());
        assert_eq!(factory.transport.closed.load(Ordering::SeqCst), 1);
    }
}
