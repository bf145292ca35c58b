//! Runs the enumerator against the concrete endpoints.
//!
//! User enumeration walks service desks one after another. Each desk gets a
//! fresh run (its own dedup set, pending counter and cap) and its records
//! are folded into one global first-seen set. Document enumeration is a
//! single run once the tenant's cloud id is known.

use crate::endpoints::{fetch_cloud_id, DocumentSearch, UserSearch};
use crate::engine::{EnumerationOptions, EnumerationReport, Enumerator};
use crate::error::{Result, ScanError};
use crate::filter::DeskFilter;
use crate::parser::{Document, ServiceDesk, User};
use crate::record::DedupSet;
use deskenum_client::ResilientClient;
use deskenum_core::DeskId;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Outcome of enumerating one service desk.
#[derive(Debug, Clone)]
pub struct DeskScanResult {
    /// Desk that was enumerated
    pub desk: ServiceDesk,
    /// Unique users found in this desk
    pub unique: usize,
    /// Users not already found in an earlier desk
    pub new_globally: usize,
    /// Searches performed
    pub searches: usize,
    /// Searches that failed
    pub failed_branches: usize,
    /// The per-desk cap stopped the run
    pub capped: bool,
    /// Time spent on this desk's run
    pub elapsed: Duration,
    /// Error message if the desk could not be enumerated at all
    pub error: Option<String>,
}

/// Users merged across every enumerated desk.
#[derive(Debug)]
pub struct UserEnumeration {
    /// Unique users ordered by account id
    pub records: Vec<User>,
    /// One entry per desk attempted
    pub desks: Vec<DeskScanResult>,
    /// Ctrl-C (or the caller's token) stopped the desk loop
    pub interrupted: bool,
}

impl UserEnumeration {
    /// Searches across all desks.
    #[must_use]
    pub fn searches(&self) -> usize {
        self.desks.iter().map(|d| d.searches).sum()
    }

    /// Failed searches across all desks.
    #[must_use]
    pub fn failed_branches(&self) -> usize {
        self.desks.iter().map(|d| d.failed_branches).sum()
    }

    /// Whether any desk hit its cap.
    #[must_use]
    pub fn capped(&self) -> bool {
        self.desks.iter().any(|d| d.capped)
    }

    /// Run time summed over all desks.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.desks.iter().map(|d| d.elapsed).sum()
    }
}

/// Drives enumerations against one target.
pub struct Orchestrator {
    client: ResilientClient,
    options: EnumerationOptions,
    user_page_size: usize,
    docs_limit: usize,
}

impl Orchestrator {
    /// Create an orchestrator. `options` is the template for every run.
    #[must_use]
    pub fn new(client: ResilientClient, options: EnumerationOptions) -> Self {
        Self {
            client,
            options,
            user_page_size: 50,
            docs_limit: 50,
        }
    }

    /// Page size at which the user search stops returning matches.
    #[must_use]
    pub fn with_user_page_size(mut self, size: usize) -> Self {
        self.user_page_size = size;
        self
    }

    /// Result limit sent with each document search.
    #[must_use]
    pub fn with_docs_limit(mut self, limit: usize) -> Self {
        self.docs_limit = limit;
        self
    }

    /// Enumerate portal users across the desks selected by `filter`.
    ///
    /// A failed desk run is recorded and the loop moves on; a failed desk
    /// listing aborts before any search.
    pub async fn enumerate_users(
        &self,
        filter: &DeskFilter,
        cancel: &CancellationToken,
    ) -> Result<UserEnumeration> {
        let desks = initialize(filter.resolve(&self.client), cancel).await?;
        let total = desks.len();

        let mut global = DedupSet::new();
        let mut results = Vec::with_capacity(total);
        let mut interrupted = false;

        for (index, desk) in desks.into_iter().enumerate() {
            if cancel.is_cancelled() {
                interrupted = true;
                break;
            }

            tracing::info!(
                "Enumerating desk {}/{}: {}",
                index + 1,
                total,
                desk.label()
            );

            let report = match self.run_desk(&desk, cancel).await {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!("Desk {} failed: {}", desk.label(), e);
                    results.push(DeskScanResult {
                        desk,
                        unique: 0,
                        new_globally: 0,
                        searches: 0,
                        failed_branches: 0,
                        capped: false,
                        elapsed: Duration::ZERO,
                        error: Some(e.to_string()),
                    });
                    continue;
                }
            };

            let unique = report.records.len();
            let elapsed = report.elapsed();
            let new_globally = global.absorb(report.records.into_iter().collect());
            tracing::info!(
                unique,
                new = new_globally,
                global = global.len(),
                "Desk {} done",
                desk.label()
            );

            results.push(DeskScanResult {
                desk,
                unique,
                new_globally,
                searches: report.searches,
                failed_branches: report.failed_branches,
                capped: report.capped,
                elapsed,
                error: None,
            });

            if report.interrupted {
                interrupted = true;
                break;
            }
        }

        Ok(UserEnumeration {
            records: global.into_sorted(),
            desks: results,
            interrupted,
        })
    }

    /// Enumerate help center documents.
    pub async fn enumerate_documents(
        &self,
        cancel: &CancellationToken,
    ) -> Result<EnumerationReport<Document>> {
        let cloud_id = initialize(fetch_cloud_id(&self.client), cancel).await?;
        let endpoint = DocumentSearch::new(self.client.clone(), cloud_id, self.docs_limit);
        Enumerator::new(Arc::new(endpoint), self.options.clone())
            .run(cancel)
            .await
    }

    async fn run_desk(
        &self,
        desk: &ServiceDesk,
        cancel: &CancellationToken,
    ) -> Result<EnumerationReport<User>> {
        let desk_id = DeskId::new(desk.id.as_str())
            .map_err(|e| ScanError::Initialization(format!("service desk id: {e}")))?;
        let endpoint = UserSearch::new(self.client.clone(), desk_id, self.user_page_size);
        Enumerator::new(Arc::new(endpoint), self.options.clone())
            .run(cancel)
            .await
    }
}

/// An initialization call cut short by the caller reads as cancellation.
async fn initialize<T>(
    call: impl std::future::Future<Output = Result<T>>,
    cancel: &CancellationToken,
) -> Result<T> {
    match call.await {
        Err(_) if cancel.is_cancelled() => Err(ScanError::Cancelled),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskenum_client::{ScriptedReply, ScriptedTransport};
    use deskenum_core::AlphabetPair;

    fn orchestrator(replies: Vec<ScriptedReply>) -> (Arc<ScriptedTransport>, Orchestrator) {
        let transport = Arc::new(ScriptedTransport::new(replies));
        let client = ResilientClient::with_transport("https://acme.atlassian.net", transport.clone());
        let options = EnumerationOptions::new(AlphabetPair::new("ab", "ab").expect("alphabets"))
            .with_workers(1);
        (transport, Orchestrator::new(client, options))
    }

    #[tokio::test]
    async fn test_users_merge_across_desks() {
        let (transport, orchestrator) = orchestrator(vec![
            ScriptedReply::ok(r#"{"values":[{"id":"1","projectName":"IT","projectKey":"IT"},{"id":"2"}]}"#),
            ScriptedReply::ok(r#"[{"accountId":"a","displayName":"Desk one"},{"accountId":"b"}]"#),
            ScriptedReply::ok(r#"[{"accountId":"a","displayName":"Desk two"},{"accountId":"c"}]"#),
        ]);

        let outcome = orchestrator
            .enumerate_users(&DeskFilter::All, &CancellationToken::new())
            .await
            .expect("enumeration succeeds");

        let keys: Vec<_> = outcome.records.iter().map(|u| u.account_id.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(outcome.records[0].display_name, "Desk one");
        assert_eq!(outcome.desks.len(), 2);
        assert_eq!(outcome.desks[1].unique, 2);
        assert_eq!(outcome.desks[1].new_globally, 1);
        assert_eq!(outcome.searches(), 2);
        assert_eq!(
            outcome.elapsed(),
            outcome.desks[0].elapsed + outcome.desks[1].elapsed
        );
        assert!(!outcome.interrupted);
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_single_desk_skips_listing() {
        let (transport, orchestrator) = orchestrator(vec![ScriptedReply::ok(
            r#"[{"accountId":"x"}]"#,
        )]);
        let filter = DeskFilter::Single(DeskId::new("9").expect("valid id"));

        let outcome = orchestrator
            .enumerate_users(&filter, &CancellationToken::new())
            .await
            .expect("enumeration succeeds");

        assert_eq!(outcome.records.len(), 1);
        assert!(transport.requests()[0].url.contains("/portal/9/user-search"));
    }

    #[tokio::test]
    async fn test_listing_failure_aborts() {
        let (_, orchestrator) = orchestrator(vec![ScriptedReply::status(401, "")]);
        let err = orchestrator
            .enumerate_users(&DeskFilter::All, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::Initialization(_)));
    }

    #[tokio::test]
    async fn test_cancelled_before_start_runs_no_desk() {
        let (transport, orchestrator) = orchestrator(vec![ScriptedReply::ok(
            r#"{"values":[{"id":"1"}]}"#,
        )]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = orchestrator
            .enumerate_users(&DeskFilter::All, &cancel)
            .await
            .expect("listing still answered");
        assert!(outcome.interrupted);
        assert!(outcome.desks.is_empty());
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_documents_resolve_cloud_id_first() {
        let (transport, orchestrator) = orchestrator(vec![
            ScriptedReply::ok(r#"{"cloudId":"c-1"}"#),
            ScriptedReply::ok(
                r#"{"data":{"helpObjectStore_searchArticles":{"results":[
                    {"ari":"ari:1","title":"One","displayLink":"/kb/1","metadata":{"isExternal":false},"sourceSystem":"CONFLUENCE"}
                ],"totalCount":1}}}"#,
            ),
        ]);

        let report = orchestrator
            .enumerate_documents(&CancellationToken::new())
            .await
            .expect("enumeration succeeds");

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].full_url, "https://acme.atlassian.net/kb/1");
        assert_eq!(report.expected_total, Some(1));
        assert_eq!(transport.calls(), 2);
    }
}
