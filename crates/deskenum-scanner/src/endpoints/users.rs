//! Service desk user search.

use crate::endpoint::SearchEndpoint;
use crate::error::{Result, ScanError};
use crate::parser::{parse_users, ServiceDesk, ServiceDeskList, User};
use crate::task::{SearchPage, TruncationPolicy};
use crate::url_builder::{user_search_path, SERVICE_DESKS_PATH};
use async_trait::async_trait;
use deskenum_client::ResilientClient;
use deskenum_core::DeskId;
use tokio_util::sync::CancellationToken;

/// List every service desk visible to the session.
///
/// Any failure here is an initialization error: no desk, no search.
pub async fn list_service_desks(client: &ResilientClient) -> Result<Vec<ServiceDesk>> {
    let response = client
        .get(SERVICE_DESKS_PATH)
        .await
        .map_err(|e| ScanError::Initialization(format!("get service desks: {e}")))?;
    let list: ServiceDeskList = response
        .json()
        .map_err(|e| ScanError::Initialization(format!("parse service desks: {e}")))?;

    tracing::info!("Found {} service desk(s)", list.values.len());
    Ok(list.values)
}

/// User search scoped to one service desk.
///
/// The endpoint reports no total and silently stops at a fixed page size,
/// so a full page that still yields new accounts is taken as truncated.
pub struct UserSearch {
    client: ResilientClient,
    desk: DeskId,
    page_size: usize,
}

impl UserSearch {
    pub fn new(client: ResilientClient, desk: DeskId, page_size: usize) -> Self {
        Self {
            client,
            desk,
            page_size,
        }
    }

    #[must_use]
    pub fn desk(&self) -> &DeskId {
        &self.desk
    }
}

#[async_trait]
impl SearchEndpoint for UserSearch {
    type Record = User;

    fn name(&self) -> &'static str {
        "users"
    }

    fn truncation_policy(&self) -> TruncationPolicy {
        TruncationPolicy::PageCeiling(self.page_size)
    }

    async fn search(&self, query: &str, cancel: &CancellationToken) -> Result<SearchPage<User>> {
        let response = self
            .client
            .get_with_cancel(&user_search_path(&self.desk, query), cancel)
            .await?;
        if !response.is_success() {
            // Surfaces the status as a task-level client error.
            response.json::<serde_json::Value>()?;
        }
        parse_users(&response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskenum_client::{ClientError, ScriptedReply, ScriptedTransport};
    use std::sync::Arc;

    fn client(replies: Vec<ScriptedReply>) -> (Arc<ScriptedTransport>, ResilientClient) {
        let transport = Arc::new(ScriptedTransport::new(replies));
        let client = ResilientClient::with_transport("https://acme.atlassian.net", transport.clone());
        (transport, client)
    }

    #[tokio::test]
    async fn test_search_builds_desk_path() {
        let (transport, client) = client(vec![ScriptedReply::ok(
            r#"[{"accountId":"qm:1","displayName":"Ada"}]"#,
        )]);
        let search = UserSearch::new(client, DeskId::new("5").expect("valid id"), 50);

        let page = search
            .search("ad", &CancellationToken::new())
            .await.expect("search succeeds");
        assert_eq!(page.items.len(), 1);
        assert_eq!(
            transport.requests()[0].url,
            "https://acme.atlassian.net/rest/servicedesk/1/customer/portal/5/user-search/proforma?query=ad"
        );
        assert_eq!(search.truncation_policy(), TruncationPolicy::PageCeiling(50));
    }

    #[tokio::test]
    async fn test_search_client_error_is_task_failure() {
        let (_, client) = client(vec![ScriptedReply::status(403, "forbidden")]);
        let search = UserSearch::new(client, DeskId::new("5").expect("valid id"), 50);

        let err = search
            .search("", &CancellationToken::new())
            .await.unwrap_err();
        assert!(matches!(
            err,
            ScanError::Client(ClientError::Status { status: 403, .. })
        ));
    }

    #[tokio::test]
    async fn test_list_service_desks() {
        let (_, client) = client(vec![ScriptedReply::ok(
            r#"{"size":2,"values":[{"id":"1","projectId":"10000","projectName":"IT","projectKey":"IT"},{"id":"2"}]}"#,
        )]);

        let desks = list_service_desks(&client).await.expect("list desks");
        assert_eq!(desks.len(), 2);
        assert_eq!(desks[0].project_key.as_deref(), Some("IT"));
    }

    #[tokio::test]
    async fn test_list_service_desks_failure_is_initialization_error() {
        let (_, client) = client(vec![ScriptedReply::status(401, "")]);
        let err = list_service_desks(&client).await.unwrap_err();
        assert!(matches!(err, ScanError::Initialization(_)));
    }
}
