//! Mock transport for testing.
//!
//! Allows queueing replies and capturing posted payloads for verification.

use super::{Transport, TransportError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

type Reply = Result<Value, TransportError>;

/// Mock transport for testing.
///
/// Replies are consumed in FIFO order, one per `post()`. When the queue is
/// empty the fallback set with [`MockTransport::always`] is used, and
/// without a fallback the call fails with a network error.
#[derive(Debug, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    requests: Vec<(String, Value)>,
    replies: VecDeque<Scripted>,
    fallback: Option<Reply>,
}

#[derive(Debug)]
enum Scripted {
    Ready(Reply),
    Gated(oneshot::Receiver<()>, Reply),
}

/// Holds back a gated reply until opened.
///
/// Dropping the gate without opening it releases the reply as well.
#[derive(Debug)]
pub struct Gate {
    tx: oneshot::Sender<()>,
}

impl Gate {
    /// Let the gated reply through.
    pub fn open(self) {
        let _ = self.tx.send(());
    }
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON body for a later `post()` call.
    pub fn queue_reply(&self, body: Value) {
        let mut inner = self.inner.lock().unwrap();
        inner.replies.push_back(Scripted::Ready(Ok(body)));
    }

    /// Queue a failure for a later `post()` call.
    pub fn queue_failure(&self, error: TransportError) {
        let mut inner = self.inner.lock().unwrap();
        inner.replies.push_back(Scripted::Ready(Err(error)));
    }

    /// Queue a reply that is only returned once the gate is opened.
    ///
    /// The request is recorded immediately; the caller's future stays
    /// pending until [`Gate::open`].
    pub fn queue_gated(&self, body: Value) -> Gate {
        let (tx, rx) = oneshot::channel();
        let mut inner = self.inner.lock().unwrap();
        inner.replies.push_back(Scripted::Gated(rx, Ok(body)));
        Gate { tx }
    }

    /// Reply used whenever the queue is empty.
    pub fn always(&self, reply: Result<Value, TransportError>) {
        let mut inner = self.inner.lock().unwrap();
        inner.fallback = Some(reply);
    }

    /// Every `(path, payload)` posted so far, oldest first.
    pub fn requests(&self) -> Vec<(String, Value)> {
        let inner = self.inner.lock().unwrap();
        inner.requests.clone()
    }

    /// Number of requests posted so far.
    pub fn request_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.requests.len()
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<(String, Value)> {
        let inner = self.inner.lock().unwrap();
        inner.requests.last().cloned()
    }

    /// Number of requests posted to `path`.
    pub fn count_for(&self, path: &str) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.requests.iter().filter(|(p, _)| p == path).count()
    }

    /// Clear all state (requests, queue, fallback).
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MockTransportInner::default();
    }
}

impl Clone for MockTransport {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post(&self, path: &str, payload: &Value) -> Result<Value, TransportError> {
        // Never hold the lock across the gate await
        let scripted = {
            let mut inner = self.inner.lock().unwrap();
            inner.requests.push((path.to_string(), payload.clone()));
            match inner.replies.pop_front() {
                Some(scripted) => scripted,
                None => Scripted::Ready(inner.fallback.clone().unwrap_or_else(|| {
                    Err(TransportError::Network("no scripted reply".to_string()))
                })),
            }
        };

        match scripted {
            Scripted::Ready(reply) => reply,
            Scripted::Gated(rx, reply) => {
                let _ = rx.await;
                reply
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn replies_in_order() {
        let transport = MockTransport::new();
        transport.queue_reply(json!({ "success": true }));
        transport.queue_failure(TransportError::HttpStatus(500));

        let first = transport.post("/a", &json!({})).await;
        let second = transport.post("/b", &json!({})).await;

        assert_eq!(first.unwrap(), json!({ "success": true }));
        assert_eq!(second.unwrap_err(), TransportError::HttpStatus(500));
    }

    #[tokio::test]
    async fn records_requests() {
        let transport = MockTransport::new();
        transport.queue_reply(json!({}));

        let _ = transport.post("/api/v2/contest/success", &json!({ "bib": "12" })).await;

        assert_eq!(transport.request_count(), 1);
        assert_eq!(
            transport.last_request(),
            Some(("/api/v2/contest/success".to_string(), json!({ "bib": "12" })))
        );
        assert_eq!(transport.count_for("/api/v2/contest/success"), 1);
    }

    #[tokio::test]
    async fn empty_queue_without_fallback_fails() {
        let transport = MockTransport::new();
        let result = transport.post("/x", &json!({})).await;
        assert!(matches!(result, Err(TransportError::Network(_))));
    }

    #[tokio::test]
    async fn fallback_used_after_queue() {
        let transport = MockTransport::new();
        transport.queue_reply(json!({ "success": true }));
        transport.always(Err(TransportError::EmptyBody));

        assert!(transport.post("/x", &json!({})).await.is_ok());
        assert_eq!(
            transport.post("/x", &json!({})).await,
            Err(TransportError::EmptyBody)
        );
        assert_eq!(
            transport.post("/x", &json!({})).await,
            Err(TransportError::EmptyBody)
        );
    }

    #[tokio::test]
    async fn gated_reply_waits_for_open() {
        let transport = MockTransport::new();
        let gate = transport.queue_gated(json!({ "success": true }));

        let pending = {
            let transport = transport.clone();
            tokio::spawn(async move { transport.post("/x", &json!({})).await })
        };

        tokio::task::yield_now().await;
        assert!(!pending.is_finished());

        gate.open();
        let reply = pending.await.unwrap();
        assert_eq!(reply.unwrap(), json!({ "success": true }));
    }

    #[tokio::test]
    async fn reset_clears_everything() {
        let transport = MockTransport::new();
        transport.queue_reply(json!({}));
        let _ = transport.post("/x", &json!({})).await;

        transport.reset();
        assert_eq!(transport.request_count(), 0);
        assert!(transport.post("/x", &json!({})).await.is_err());
    }
}
