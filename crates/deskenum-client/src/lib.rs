//! Deskenum Client - Resilient HTTP request client.
//!
//! Every call the scanner makes against the target instance goes through
//! [`ResilientClient`], which attaches the session cookie, retries transport
//! failures and 5xx responses with exponential backoff, and always reads the
//! response body to completion so connections are released before a retry.
//!
//! The network itself sits behind the [`Transport`] trait. Production code
//! uses [`ReqwestTransport`]; tests replay scripted responses instead.
//!
//! # Example
//!
//! ```rust,ignore
//! use deskenum_client::ResilientClient;
//! use deskenum_core::SessionCookie;
//! use std::time::Duration;
//!
//! let client = ResilientClient::new("https://example.atlassian.net", Duration::from_secs(10))?
//!     .with_credential(SessionCookie::Customer, cookie);
//!
//! let response = client.get("/rest/servicedeskapi/servicedesk").await?;
//! let desks: DeskList = response.json()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod client;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod transport;

// Re-export commonly used types
pub use client::{encode_query, ResilientClient, RetryPolicy};
pub use error::{ClientError, Result};
#[cfg(any(test, feature = "test-util"))]
pub use mock::{ScriptedReply, ScriptedTransport};
pub use reqwest::Method;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
