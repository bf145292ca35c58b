//! Help center article search.

use crate::endpoint::SearchEndpoint;
use crate::error::{Result, ScanError};
use crate::parser::{parse_documents, ArticleSearchRequest, Document, TenantInfo};
use crate::task::{SearchPage, TruncationPolicy};
use crate::url_builder::{article_search_path, TENANT_INFO_PATH};
use async_trait::async_trait;
use deskenum_client::ResilientClient;
use deskenum_core::CloudId;
use tokio_util::sync::CancellationToken;

/// Resolve the tenant's cloud id, needed by every article search.
pub async fn fetch_cloud_id(client: &ResilientClient) -> Result<CloudId> {
    let response = client
        .get(TENANT_INFO_PATH)
        .await
        .map_err(|e| ScanError::Initialization(format!("get tenant info: {e}")))?;
    let info: TenantInfo = response
        .json()
        .map_err(|e| ScanError::Initialization(format!("parse tenant info: {e}")))?;

    let cloud_id = CloudId::new(info.cloud_id.unwrap_or_default())
        .map_err(|e| ScanError::Initialization(format!("tenant info: {e}")))?;
    tracing::info!("Extracted cloud ID: {}", cloud_id);
    Ok(cloud_id)
}

/// Article search over the tenant's knowledge base.
///
/// Responses carry an authoritative `totalCount`, which drives truncation.
pub struct DocumentSearch {
    client: ResilientClient,
    cloud_id: CloudId,
    limit: usize,
}

impl DocumentSearch {
    pub fn new(client: ResilientClient, cloud_id: CloudId, limit: usize) -> Self {
        Self {
            client,
            cloud_id,
            limit,
        }
    }
}

#[async_trait]
impl SearchEndpoint for DocumentSearch {
    type Record = Document;

    fn name(&self) -> &'static str {
        "docs"
    }

    fn truncation_policy(&self) -> TruncationPolicy {
        TruncationPolicy::TotalCount
    }

    async fn search(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<SearchPage<Document>> {
        let request = ArticleSearchRequest::new(self.cloud_id.as_str(), query, self.limit);
        let response = self
            .client
            .post_json_with_cancel(&article_search_path(), &request, cancel)
            .await?;
        if !response.is_success() {
            response.json::<serde_json::Value>()?;
        }
        parse_documents(&response.body, self.client.base_url())
    }
}
