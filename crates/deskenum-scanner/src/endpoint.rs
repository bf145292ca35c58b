//! The capped search primitive the engine expands over.

use crate::error::Result;
use crate::record::Record;
use crate::task::{SearchPage, TruncationPolicy};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// A paginated, query-limited search call.
///
/// Implementations perform exactly one logical search per call and never
/// branch themselves; expansion is the engine's job.
#[async_trait]
pub trait SearchEndpoint: Send + Sync + 'static {
    /// Kind of record this endpoint returns.
    type Record: Record;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// How a page from this endpoint signals hidden matches.
    fn truncation_policy(&self) -> TruncationPolicy;

    /// Run one search. Retry waits must give up once `cancel` fires.
    async fn search(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<SearchPage<Self::Record>>;
}
