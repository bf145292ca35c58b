//! Transport seam between the retry loop and the network.

use crate::error::{ClientError, Result};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Longest body prefix kept in a [`ClientError::Status`] message.
const ERROR_BODY_LIMIT: usize = 200;

/// A fully-formed request handed to a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL
    pub url: String,
    /// Header name/value pairs
    pub headers: Vec<(String, String)>,
    /// Request body, if any
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Look up a header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A response whose body has already been read to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Complete response body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a response from a status and body.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// True for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as lossy UTF-8 text.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode a JSON body.
    ///
    /// Non-2xx statuses become [`ClientError::Status`] and malformed bodies
    /// become [`ClientError::Decode`]; neither is retried.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        if !self.is_success() {
            let mut body = self.text();
            if body.len() > ERROR_BODY_LIMIT {
                let mut cut = ERROR_BODY_LIMIT;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
                body.push_str("...");
            }
            return Err(ClientError::Status {
                status: self.status,
                body,
            });
        }

        serde_json::from_slice(&self.body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// Sends one request and returns the fully-read response.
///
/// Implementations must not retry; that is the [`ResilientClient`]'s job.
///
/// [`ResilientClient`]: crate::ResilientClient
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a single HTTP exchange.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// [`Transport`] backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with a per-request timeout.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("deskenum/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self.client.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status().as_u16();

        // Reading the whole body hands the connection back to the pool,
        // including for 5xx responses that are about to be retried.
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(format!("read response body: {e}")))?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Tenant {
        #[serde(rename = "cloudId")]
        cloud_id: String,
    }

    #[test]
    fn test_json_success() {
        let response = HttpResponse::new(200, r#"{"cloudId":"abc"}"#);
        let tenant: Tenant = response.json().expect("decode tenant");
        assert_eq!(tenant.cloud_id, "abc");
    }

    #[test]
    fn test_json_client_error_status() {
        let response = HttpResponse::new(403, "Forbidden");
        let err = response.json::<Tenant>().unwrap_err();
        match err {
            ClientError::Status { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "Forbidden");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn test_json_truncates_long_error_body() {
        let response = HttpResponse::new(400, "x".repeat(1000));
        let err = response.json::<Tenant>().unwrap_err();
        let ClientError::Status { body, .. } = err else {
            panic!("expected status error");
        };
        assert_eq!(body.len(), ERROR_BODY_LIMIT + 3);
    }

    #[test]
    fn test_json_decode_error() {
        let response = HttpResponse::new(200, "<html>login</html>");
        assert!(matches!(
            response.json::<Tenant>(),
            Err(ClientError::Decode(_))
        ));
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let request = HttpRequest {
            method: Method::GET,
            url: "https://example.test/".to_string(),
            headers: vec![("Cookie".to_string(), "a=b".to_string())],
            body: None,
        };
        assert_eq!(request.header("cookie"), Some("a=b"));
        assert_eq!(request.header("accept"), None);
    }

    #[test]
    fn test_reqwest_transport_creation() {
        assert!(ReqwestTransport::new(Duration::from_secs(5)).is_ok());
    }
}
