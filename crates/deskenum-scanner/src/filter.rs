#![allow(clippy::must_use_candidate)]

use crate::endpoints::users::list_service_desks;
use crate::error::Result;
use crate::parser::ServiceDesk;
use deskenum_client::ResilientClient;
use deskenum_core::DeskId;

/// Which service desks a user enumeration covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeskFilter {
    /// Every desk the listing endpoint returns
    All,
    /// A single desk, skipping the listing call
    Single(DeskId),
}

impl DeskFilter {
    pub fn from_option(desk: Option<DeskId>) -> Self {
        desk.map_or(Self::All, Self::Single)
    }

    /// Desks to enumerate. Listing failures are initialization errors.
    pub async fn resolve(&self, client: &ResilientClient) -> Result<Vec<ServiceDesk>> {
        match self {
            DeskFilter::Single(id) => Ok(vec![ServiceDesk::with_id(id.as_str())]),
            DeskFilter::All => list_service_desks(client).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskenum_client::{ScriptedReply, ScriptedTransport};
    use std::sync::Arc;

    fn client(replies: Vec<ScriptedReply>) -> (Arc<ScriptedTransport>, ResilientClient) {
        let transport = Arc::new(ScriptedTransport::new(replies));
        let client = ResilientClient::with_transport("https://acme.atlassian.net", transport.clone());
        (transport, client)
    }

    #[tokio::test]
    async fn test_single_desk_skips_listing() {
        let (transport, client) = client(Vec::new());
        let filter = DeskFilter::Single(DeskId::new("7").expect("valid id"));

        let desks = filter.resolve(&client).await.expect("resolve desk");
        assert_eq!(desks.len(), 1);
        assert_eq!(desks[0].id, "7");
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_all_desks_uses_listing() {
        let (transport, client) = client(vec![ScriptedReply::ok(
            r#"{"size":2,"values":[{"id":"1","projectName":"IT","projectKey":"IT"},{"id":"2"}]}"#,
        )]);

        let desks = DeskFilter::All.resolve(&client).await.expect("resolve desks");
        let ids: Vec<_> = desks.iter().map(|desk| desk.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn test_from_option() {
        assert_eq!(DeskFilter::from_option(None), DeskFilter::All);
        let id = DeskId::new("2").expect("valid id");
        assert_eq!(DeskFilter::from_option(Some(id.clone())), DeskFilter::Single(id));
    }
}
