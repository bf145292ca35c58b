//! Scripted transport for tests.
//!
//! Replies are replayed in order; every request and the (tokio) instant it
//! arrived at are recorded so tests can assert on headers and backoff timing.

use crate::error::{ClientError, Result};
use crate::transport::{HttpRequest, HttpResponse, Transport};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use tokio::time::Instant;

/// One scripted outcome.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Return this response
    Response(HttpResponse),
    /// Fail with a transport error carrying this message
    TransportFailure(String),
}

impl ScriptedReply {
    /// 200 response with the given body.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::Response(HttpResponse::new(200, body))
    }

    /// Response with an arbitrary status.
    pub fn status(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::Response(HttpResponse::new(status, body))
    }

    /// Transport-level failure.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransportFailure(message.into())
    }
}

#[derive(Debug, Default)]
struct Recorded {
    replies: VecDeque<ScriptedReply>,
    requests: Vec<HttpRequest>,
    instants: Vec<Instant>,
}

/// [`Transport`] that replays a fixed script.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    state: Mutex<Recorded>,
}

impl ScriptedTransport {
    /// Create a transport that answers with `replies` in order.
    #[must_use]
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self {
            state: Mutex::new(Recorded {
                replies: replies.into(),
                ..Recorded::default()
            }),
        }
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.lock().requests.clone()
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.lock().requests.len()
    }

    /// Instants at which each request arrived.
    #[must_use]
    pub fn instants(&self) -> Vec<Instant> {
        self.lock().instants.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let reply = {
            let mut state = self.lock();
            state.requests.push(request);
            state.instants.push(Instant::now());
            state.replies.pop_front()
        };

        match reply {
            Some(ScriptedReply::Response(response)) => Ok(response),
            Some(ScriptedReply::TransportFailure(message)) => Err(ClientError::Transport(message)),
            None => Err(ClientError::Internal("scripted transport exhausted".to_string())),
        }
    }
}
