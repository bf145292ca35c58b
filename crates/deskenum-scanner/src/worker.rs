//! Fixed-size pool of search executors.
//!
//! Workers hold no enumeration state: each pops a task, runs one search and
//! forwards the result to the expansion processor.

use crate::endpoint::SearchEndpoint;
use crate::queue::TaskQueue;
use crate::task::SearchResult;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Handles to the running workers.
pub(crate) struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `count` workers draining `queue` into `results`.
    pub(crate) fn spawn<E: SearchEndpoint>(
        count: usize,
        endpoint: &Arc<E>,
        queue: &TaskQueue,
        results: &mpsc::UnboundedSender<SearchResult<E::Record>>,
        cancel: &CancellationToken,
    ) -> Self {
        let handles = (0..count.max(1))
            .map(|id| {
                tokio::spawn(run_worker(
                    id,
                    endpoint.clone(),
                    queue.clone(),
                    results.clone(),
                    cancel.clone(),
                ))
            })
            .collect();

        Self { handles }
    }

    /// Wait for every worker to exit.
    pub(crate) async fn join(self) {
        for outcome in futures::future::join_all(self.handles).await {
            if let Err(e) = outcome {
                tracing::error!("Search worker terminated abnormally: {}", e);
            }
        }
    }
}

async fn run_worker<E: SearchEndpoint>(
    id: usize,
    endpoint: Arc<E>,
    queue: TaskQueue,
    results: mpsc::UnboundedSender<SearchResult<E::Record>>,
    cancel: CancellationToken,
) {
    while let Some(task) = queue.dequeue().await {
        // In-flight requests are left to finish or hit their own timeout;
        // only retry backoff observes the run token.
        let outcome = endpoint.search(&task.query, &cancel).await;

        if cancel.is_cancelled() {
            break;
        }
        if results.send(SearchResult { task, outcome }).is_err() {
            break;
        }
    }

    tracing::debug!(worker = id, "Search worker exiting");
}
