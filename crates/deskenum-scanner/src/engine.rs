//! Adaptive prefix-expansion enumerator.
//!
//! [`Enumerator`] turns a capped search endpoint into a complete
//! enumeration: it seeds one task, runs a [`WorkerPool`] over the shared
//! [`TaskQueue`], and feeds every result to the single expansion processor
//! until the pending counter reaches zero, the cap is hit, the expected
//! total is reached, or the caller cancels.

use crate::endpoint::SearchEndpoint;
use crate::error::Result;
use crate::processor::{ExpansionProcessor, ExpansionRules, PendingCounter, Termination};
use crate::queue::TaskQueue;
use crate::task::SearchTask;
use crate::worker::WorkerPool;
use chrono::{DateTime, Utc};
use deskenum_core::{AlphabetPair, DeskEnumError, EnumerationConfig, RunId};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Knobs for one enumeration run.
#[derive(Debug, Clone)]
pub struct EnumerationOptions {
    /// Concurrent search workers
    pub workers: usize,
    /// Task queue capacity
    pub queue_capacity: usize,
    /// Branching alphabets
    pub alphabets: AlphabetPair,
    /// Maximum records to collect (0 = unlimited)
    pub cap: usize,
    /// Run this single query with no branching
    pub custom_query: Option<String>,
    /// Keys that are never collected
    pub excluded_keys: HashSet<String>,
}

impl EnumerationOptions {
    /// Options with default sizing and the given alphabets.
    #[must_use]
    pub fn new(alphabets: AlphabetPair) -> Self {
        let defaults = EnumerationConfig::default();
        Self {
            workers: defaults.workers,
            queue_capacity: defaults.queue_capacity,
            alphabets,
            cap: 0,
            custom_query: None,
            excluded_keys: HashSet::new(),
        }
    }

    /// Options from the `[enumeration]` config section. No cap is applied.
    pub fn from_config(config: &EnumerationConfig) -> std::result::Result<Self, DeskEnumError> {
        let alphabets = AlphabetPair::new(&config.alphabet, &config.alphabet2)?;
        Ok(Self::new(alphabets)
            .with_workers(config.workers)
            .with_queue_capacity(config.queue_capacity))
    }

    /// Set the worker count.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the task queue capacity.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the record cap (0 = unlimited).
    #[must_use]
    pub fn with_cap(mut self, cap: usize) -> Self {
        self.cap = cap;
        self
    }

    /// Run a single query instead of expanding from the empty query.
    ///
    /// An empty string means no override.
    #[must_use]
    pub fn with_custom_query(mut self, query: Option<String>) -> Self {
        self.custom_query = query.filter(|q| !q.is_empty());
        self
    }

    /// Never collect a record with this key.
    #[must_use]
    pub fn exclude_key(mut self, key: impl Into<String>) -> Self {
        self.excluded_keys.insert(key.into());
        self
    }
}

/// What a run recovered and how it ended.
#[derive(Debug)]
pub struct EnumerationReport<R> {
    /// Unique records ordered by key
    pub records: Vec<R>,
    /// The record cap stopped the run
    pub capped: bool,
    /// The caller's token ended the run
    pub interrupted: bool,
    /// Why the processor stopped
    pub termination: Termination,
    /// Results whose search failed
    pub failed_branches: usize,
    /// Results consumed
    pub searches: usize,
    /// Total reported by the first result, if any
    pub expected_total: Option<u64>,
    /// Tasks still outstanding when the run stopped
    pub pending: u64,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
}

impl<R> EnumerationReport<R> {
    /// True when nothing was skipped: the search space was exhausted (or the
    /// expected total met) with no failed branch, cap or interruption.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.interrupted
            && !self.capped
            && self.failed_branches == 0
            && matches!(
                self.termination,
                Termination::Exhausted | Termination::ExpectedTotalReached
            )
    }

    /// Wall-clock run time.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }
}

/// Enumerates every record behind a [`SearchEndpoint`].
pub struct Enumerator<E: SearchEndpoint> {
    endpoint: Arc<E>,
    options: EnumerationOptions,
}

impl<E: SearchEndpoint> Enumerator<E> {
    /// Create an enumerator.
    pub fn new(endpoint: Arc<E>, options: EnumerationOptions) -> Self {
        Self { endpoint, options }
    }

    /// Options in effect.
    #[must_use]
    pub fn options(&self) -> &EnumerationOptions {
        &self.options
    }

    /// Run to completion or until `cancel` fires.
    ///
    /// Cancelling `cancel` drains the run and still returns the records
    /// merged so far, with `interrupted` set.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<EnumerationReport<E::Record>> {
        let run_id = RunId::generate();
        let span = tracing::info_span!(
            "enumeration",
            run = %run_id,
            endpoint = self.endpoint.name()
        );
        self.run_inner(cancel).instrument(span).await
    }

    async fn run_inner(&self, cancel: &CancellationToken) -> Result<EnumerationReport<E::Record>> {
        let started_at = Utc::now();
        let run_token = cancel.child_token();
        let queue = TaskQueue::new(self.options.queue_capacity, &run_token);
        let (results_tx, results_rx) = mpsc::unbounded_channel();

        let pool = WorkerPool::spawn(
            self.options.workers,
            &self.endpoint,
            &queue,
            &results_tx,
            &run_token,
        );
        // Only workers hold senders now.
        drop(results_tx);

        let seed = self
            .options
            .custom_query
            .as_ref()
            .map_or_else(SearchTask::root, |query| SearchTask::custom(query.clone()));
        tracing::debug!(
            workers = self.options.workers,
            query = seed.display_query(),
            "Starting enumeration"
        );
        let pending = match queue.enqueue(seed).await {
            Ok(()) => PendingCounter::new(1),
            Err(_) => PendingCounter::new(0),
        };

        let rules = ExpansionRules {
            policy: self.endpoint.truncation_policy(),
            alphabets: self.options.alphabets.clone(),
            cap: self.options.cap,
            branching_enabled: self.options.custom_query.is_none(),
            excluded_keys: self.options.excluded_keys.clone(),
        };
        let processor = ExpansionProcessor::new(rules, queue.clone(), run_token.clone(), pending);
        let outcome = processor.run(results_rx).await;

        run_token.cancel();
        queue.close();
        pool.join().await;

        let outcome = outcome?;
        let interrupted = cancel.is_cancelled();
        let report = EnumerationReport {
            records: outcome.records.into_sorted(),
            capped: outcome.capped,
            interrupted,
            termination: outcome.termination,
            failed_branches: outcome.failed_branches,
            searches: outcome.searches,
            expected_total: outcome.expected_total,
            pending: outcome.pending,
            started_at,
            finished_at: Utc::now(),
        };

        tracing::info!(
            unique = report.records.len(),
            searches = report.searches,
            failed = report.failed_branches,
            capped = report.capped,
            interrupted = report.interrupted,
            pending = report.pending,
            elapsed_ms = report.elapsed().as_millis(),
            "Enumeration finished"
        );
        Ok(report)
    }
}
