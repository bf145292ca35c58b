//! Deskenum Scanner - adaptive prefix-expansion enumeration.
//!
//! Search endpoints cap how many matches a single query returns. This crate
//! recovers the full record set behind such an endpoint by narrowing
//! truncated queries one character at a time, spreading searches over a
//! bounded worker pool and deduplicating everything it sees.
//!
//! # Features
//!
//! - Concurrent searches with a configurable worker count
//! - Per-endpoint truncation detection (reported total or full page)
//! - First-seen deduplication, record cap and expected-total early exit
//! - Cooperative cancellation that keeps everything found so far
//! - Service desk user and help center document endpoints
//!
//! # Example
//!
//! ```rust,ignore
//! use deskenum_scanner::{DeskFilter, EnumerationOptions, Orchestrator};
//!
//! let options = EnumerationOptions::from_config(&config.enumeration)?.with_cap(50);
//! let orchestrator = Orchestrator::new(client, options);
//! let users = orchestrator.enumerate_users(&DeskFilter::All, &cancel).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod endpoint;
#[allow(missing_docs)]
pub mod endpoints;
pub mod engine;
#[allow(missing_docs)]
pub mod error;
#[allow(missing_docs)]
pub mod filter;
pub mod orchestrator;
#[allow(missing_docs)]
pub mod parser;
pub mod processor;
pub mod queue;
pub mod record;
pub mod task;
#[allow(missing_docs)]
pub mod url_builder;
mod worker;

// Re-export commonly used types
pub use endpoint::SearchEndpoint;
pub use endpoints::{fetch_cloud_id, list_service_desks, DocumentSearch, UserSearch};
pub use engine::{EnumerationOptions, EnumerationReport, Enumerator};
pub use error::{Result, ScanError};
pub use filter::DeskFilter;
pub use orchestrator::{DeskScanResult, Orchestrator, UserEnumeration};
pub use parser::{Document, ServiceDesk, User, DEFAULT_AVATAR};
pub use processor::{PendingCounter, Termination};
pub use queue::{EnqueueAborted, TaskQueue};
pub use record::{DedupSet, Insertion, Record};
pub use task::{SearchPage, SearchResult, SearchTask, TruncationPolicy};
