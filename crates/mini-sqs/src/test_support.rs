//! Test doubles shared by the unit tests.

use crate::error::SqsError;
use crate::signer::{RequestEnvelope, RequestSigner, SignableRequest, SigningError};
use crate::transport::{
    HttpResponse, HttpTransport, LongPollOptions, ReqwestTransportFactory, TransientTransport,
    TransportFactory,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub(crate) const TEST_REGION: &str = "eu-central-1";
pub(crate) const TEST_QUEUE_ARN: &str = "arn:aws:sqs:eu-central-1:000000000000:test";
pub(crate) const TEST_QUEUE_PATH: &str = "/000000000000/test/";

/// Signer that adds a fixed authorization header and counts its calls.
#[derive(Default)]
pub(crate) struct TestSigner {
    pub sign_calls: AtomicUsize,
    pub destroyed: AtomicBool,
    pub seen: Mutex<Vec<(SignableRequest, String, String)>>,
}

impl TestSigner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RequestSigner for TestSigner {
    async fn sign(
        &self,
        mut request: SignableRequest,
        service: &str,
        region: &str,
    ) -> Result<SignableRequest, SigningError> {
        if self.is_destroyed() {
            return Err(SigningError::Destroyed);
        }
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((request.clone(), service.to_string(), region.to_string()));

        request
            .headers
            .insert("authorization".to_string(), "test-signature".to_string());
        Ok(request)
    }

    async fn destroy(&self) -> Result<(), SigningError> {
        self.destroyed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Transport that replays scripted responses and records every request.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, SqsError>>>,
    pub requests: Mutex<Vec<RequestEnvelope>>,
    pub destroyed: AtomicBool,
    pub closed: AtomicUsize,
    pub fail_close: bool,
    pub fail_destroy: bool,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(HttpResponse::new(status, body.to_string())));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(SqsError::Transport {
                message: message.to_string(),
                source: None,
            }));
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn failing_destroy(mut self) -> Self {
        self.fail_destroy = true;
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn next(&self, request: &RequestEnvelope) -> Result<HttpResponse, SqsError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(HttpResponse::new(200, "{}")))
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn request(&self, request: &RequestEnvelope) -> Result<HttpResponse, SqsError> {
        self.next(request)
    }

    async fn destroy(&self) -> Result<(), SqsError> {
        self.destroyed.store(true, Ordering::SeqCst);
        if self.fail_destroy {
            return Err(SqsError::Transport {
                message: "destroy failed".to_string(),
                source: None,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TransientTransport for Arc<ScriptedTransport> {
    async fn request(&self, request: &RequestEnvelope) -> Result<HttpResponse, SqsError> {
        self.next(request)
    }

    async fn close(&self) -> Result<(), SqsError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(SqsError::Transport {
                message: "close failed".to_string(),
                source: None,
            });
        }
        Ok(())
    }
}

/// Long-poll factory that hands out one scripted transport and records the
/// options each connection was built with.
pub(crate) struct ScriptedTransportFactory {
    pub transport: Arc<ScriptedTransport>,
    pub connections: Mutex<Vec<(String, LongPollOptions)>>,
}

impl ScriptedTransportFactory {
    pub fn new(transport: ScriptedTransport) -> Arc<Self> {
        Arc::new(Self {
            transport: Arc::new(transport),
            connections: Mutex::new(Vec::new()),
        })
    }

    pub fn connections(&self) -> Vec<(String, LongPollOptions)> {
        self.connections.lock().unwrap().clone()
    }
}

impl TransportFactory for ScriptedTransportFactory {
    fn connect(
        &self,
        endpoint: &str,
        options: &LongPollOptions,
    ) -> Result<Box<dyn TransientTransport>, SqsError> {
        self.connections
            .lock()
            .unwrap()
            .push((endpoint.to_string(), options.clone()));
        Ok(Box::new(self.transport.clone()))
    }
}

/// Real `reqwest` long-poll factory that records connection options.
#[derive(Default)]
pub(crate) struct RecordingTransportFactory {
    inner: ReqwestTransportFactory,
    pub connections: Mutex<Vec<(String, LongPollOptions)>>,
}

impl RecordingTransportFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn connections(&self) -> Vec<(String, LongPollOptions)> {
        self.connections.lock().unwrap().clone()
    }
}

impl TransportFactory for RecordingTransportFactory {
    fn connect(
        &self,
        endpoint: &str,
        options: &LongPollOptions,
    ) -> Result<Box<dyn TransientTransport>, SqsError> {
        self.connections
            .lock()
            .unwrap()
            .push((endpoint.to_string(), options.clone()));
        self.inner.connect(endpoint, options)
    }
}
