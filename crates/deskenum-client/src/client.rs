//! Retrying request client.
//!
//! [`ResilientClient`] wraps a base origin, an optional session credential
//! and a [`Transport`]. Transport failures and 5xx responses are retried up
//! to `max_retries` times with exponential backoff (1s, 2s, 4s by default);
//! any response below 500 is returned to the caller untouched.

use crate::error::{ClientError, Result};
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use deskenum_core::SessionCookie;
use reqwest::Method;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default number of retries beyond the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Retry budget and backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    pub max_retries: u32,
    /// Delay before retry 1; retry `k` waits `base_delay * 2^(k-1)`
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy.
    #[must_use]
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay before retry number `retry` (1-based). No jitter.
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    /// Total attempts including the first.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_BACKOFF_BASE)
    }
}

#[derive(Debug, Clone)]
struct Credential {
    cookie: SessionCookie,
    value: String,
}

/// HTTP client with bounded retry and cookie authentication.
///
/// The client holds only immutable configuration plus the transport's own
/// connection pool, so a single instance is shared by every worker.
#[derive(Clone)]
pub struct ResilientClient {
    base_url: String,
    credential: Option<Credential>,
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    cancel: Option<CancellationToken>,
}

impl std::fmt::Debug for ResilientClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientClient")
            .field("base_url", &self.base_url)
            .field(
                "cookie",
                &self.credential.as_ref().map(|c| c.cookie.name()),
            )
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ResilientClient {
    /// Create a client backed by [`ReqwestTransport`].
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let transport = ReqwestTransport::new(timeout)?;
        Ok(Self::with_transport(base_url, Arc::new(transport)))
    }

    /// Create a client over an arbitrary transport.
    pub fn with_transport(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credential: None,
            transport,
            policy: RetryPolicy::default(),
            cancel: None,
        }
    }

    /// Attach a session cookie to every request.
    #[must_use]
    pub fn with_credential(mut self, cookie: SessionCookie, value: impl Into<String>) -> Self {
        let value = value.into();
        self.credential = if value.is_empty() {
            None
        } else {
            Some(Credential { cookie, value })
        };
        self
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Abort backoff waits when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Base origin without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Active retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        self.policy
    }

    /// `GET` a path relative to the base origin.
    pub async fn get(&self, path: &str) -> Result<HttpResponse> {
        self.execute(Method::GET, path, None).await
    }

    /// `GET` whose backoff waits also stop when `cancel` fires.
    pub async fn get_with_cancel(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse> {
        self.execute_with_cancel(Method::GET, path, None, Some(cancel))
            .await
    }

    /// `POST` a JSON body to a path relative to the base origin.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<HttpResponse> {
        let body = serde_json::to_vec(body)?;
        self.execute(Method::POST, path, Some(body)).await
    }

    /// `POST` whose backoff waits also stop when `cancel` fires.
    pub async fn post_json_with_cancel<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse> {
        let body = serde_json::to_vec(body)?;
        self.execute_with_cancel(Method::POST, path, Some(body), Some(cancel))
            .await
    }

    /// Issue a request, retrying transport failures and 5xx responses.
    ///
    /// Statuses below 500 (4xx included) are returned immediately. After the
    /// retry budget is spent the last failure is wrapped in
    /// [`ClientError::RetriesExhausted`].
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<HttpResponse> {
        self.execute_with_cancel(method, path, body, None).await
    }

    /// Like [`execute`](Self::execute), but no retry is attempted once
    /// `cancel` (or the client's own token) fires. A request already on the
    /// wire is left to finish.
    pub async fn execute_with_cancel(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        cancel: Option<&CancellationToken>,
    ) -> Result<HttpResponse> {
        let url = format!("{}{}", self.base_url, path);
        let attempts = self.policy.max_attempts();
        let mut last_error = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = self.policy.delay_for(attempt);
                tracing::warn!(
                    "Request {} {} failed (attempt {}/{}), retrying in {:?}...",
                    method,
                    path,
                    attempt,
                    attempts,
                    delay
                );
                self.backoff(delay, cancel).await?;
            }

            let request = self.build_request(method.clone(), &url, body.clone());
            match self.transport.send(request).await {
                Ok(response) if response.status < 500 => return Ok(response),
                Ok(response) => {
                    last_error = Some(ClientError::ServerStatus {
                        status: response.status,
                    });
                }
                Err(e) if e.is_retryable() => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        let source = last_error
            .unwrap_or_else(|| ClientError::Internal("no request attempt was made".to_string()));
        Err(ClientError::RetriesExhausted {
            attempts,
            source: Box::new(source),
        })
    }

    fn build_request(&self, method: Method, url: &str, body: Option<Vec<u8>>) -> HttpRequest {
        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
        if body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        if let Some(credential) = &self.credential {
            headers.push((
                "Cookie".to_string(),
                format!("{}={}", credential.cookie.name(), credential.value),
            ));
        }

        HttpRequest {
            method,
            url: url.to_string(),
            headers,
            body,
        }
    }

    async fn backoff(&self, delay: Duration, cancel: Option<&CancellationToken>) -> Result<()> {
        let own = self.cancel.as_ref();
        if own.is_some_and(CancellationToken::is_cancelled)
            || cancel.is_some_and(CancellationToken::is_cancelled)
        {
            return Err(ClientError::Cancelled);
        }

        tokio::select! {
            biased;
            () = wait_cancelled(own) => Err(ClientError::Cancelled),
            () = wait_cancelled(cancel) => Err(ClientError::Cancelled),
            () = tokio::time::sleep(delay) => Ok(()),
        }
    }
}

/// Resolves when `token` fires; never resolves without a token.
async fn wait_cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

/// Percent-encode a free-text query for use in a URL.
#[must_use]
pub fn encode_query(query: &str) -> String {
    urlencoding::encode(query).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{ScriptedReply, ScriptedTransport};

    fn client(transport: &Arc<ScriptedTransport>) -> ResilientClient {
        ResilientClient::with_transport("https://jira.example.test/", transport.clone())
    }

    #[test]
    fn test_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    }

    #[test]
    fn test_encode_query() {
        assert_eq!(encode_query("ab"), "ab");
        assert_eq!(encode_query("a b&c"), "a%20b%26c");
    }

    #[tokio::test]
    async fn test_cookie_and_headers_attached() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedReply::ok("[]")]));
        let client = client(&transport).with_credential(SessionCookie::Tenant, "tok");

        client
            .post_json("/gateway", &serde_json::json!({"a": 1}))
            .await
            .expect("request succeeds");

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.url, "https://jira.example.test/gateway");
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.header("cookie"), Some("tenant.session.token=tok"));
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.body.as_deref(), Some(br#"{"a":1}"#.as_slice()));
    }

    #[tokio::test]
    async fn test_get_without_credential_has_no_cookie() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedReply::ok("{}")]));
        client(&transport).get("/x").await.expect("request succeeds");

        let request = &transport.requests()[0];
        assert_eq!(request.header("cookie"), None);
        assert_eq!(request.header("content-type"), None);
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            ScriptedReply::status(401, "unauthorized"),
            ScriptedReply::ok("{}"),
        ]));

        let response = client(&transport).get("/x").await.expect("4xx is returned");
        assert_eq!(response.status, 401);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_backoff_then_success() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            ScriptedReply::transport("connection reset"),
            ScriptedReply::status(502, "bad gateway"),
            ScriptedReply::ok("[]"),
        ]));

        let response = client(&transport).get("/x").await.expect("third attempt succeeds");
        assert_eq!(response.status, 200);

        let instants = transport.instants();
        assert_eq!(instants.len(), 3);
        assert_eq!(instants[1] - instants[0], Duration::from_secs(1));
        assert_eq!(instants[2] - instants[1], Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted_after_four_attempts() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            ScriptedReply::status(500, ""),
            ScriptedReply::status(500, ""),
            ScriptedReply::status(500, ""),
            ScriptedReply::status(500, ""),
            ScriptedReply::ok("never reached"),
        ]));

        let err = client(&transport)
            .with_retry_policy(RetryPolicy::new(3, Duration::from_secs(1)))
            .get("/x")
            .await
            .unwrap_err();

        assert_eq!(transport.calls(), 4);
        match err {
            ClientError::RetriesExhausted { attempts, source } => {
                assert_eq!(attempts, 4);
                assert!(matches!(*source, ClientError::ServerStatus { status: 500 }));
            }
            other => panic!("expected exhausted retries, got {other:?}"),
        }

        let instants = transport.instants();
        assert_eq!(instants[3] - instants[0], Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_backoff() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            ScriptedReply::status(503, ""),
            ScriptedReply::ok("{}"),
        ]));
        let token = CancellationToken::new();
        let client = client(&transport).with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            token.cancel();
        });

        let err = client.get("/x").await.unwrap_err();
        assert!(matches!(err, ClientError::Cancelled));
        assert_eq!(transport.calls(), 1);
        canceller.await.expect("canceller finishes");
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_call_token_stops_retries() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            ScriptedReply::status(500, ""),
            ScriptedReply::status(500, ""),
            ScriptedReply::ok("{}"),
        ]));
        let run = CancellationToken::new();
        let client = client(&transport);

        let stopper = {
            let run = run.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(500)).await;
                run.cancel();
            })
        };

        let started = tokio::time::Instant::now();
        let err = client.get_with_cancel("/x", &run).await.unwrap_err();
        assert!(matches!(err, ClientError::Cancelled));
        assert_eq!(transport.calls(), 1);
        assert!(started.elapsed() < Duration::from_secs(1));
        stopper.await.expect("stopper finishes");
    }

    #[tokio::test]
    async fn test_already_cancelled_token_skips_retry() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            ScriptedReply::transport("refused"),
            ScriptedReply::ok("{}"),
        ]));
        let run = CancellationToken::new();
        run.cancel();

        let err = client(&transport)
            .get_with_cancel("/x", &run)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Cancelled));
        assert_eq!(transport.calls(), 1);
    }
}
