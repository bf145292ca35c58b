//! Expansion processor: the single consumer of search results.
//!
//! All enumeration state (dedup set, pending counter, cap tracking) lives
//! here and is only touched from this one task, so no locking is needed.
//! For each result the processor merges new records, decides whether the
//! page hid further matches, and if so pushes one child task per alphabet
//! character back onto the queue.

use crate::error::{Result, ScanError};
use crate::queue::TaskQueue;
use crate::record::{DedupSet, Insertion, Record};
use crate::task::{SearchPage, SearchResult, SearchTask, TruncationPolicy};
use deskenum_core::AlphabetPair;
use std::collections::HashSet;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Outstanding-task count; the termination oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCounter(u64);

impl PendingCounter {
    /// Counter accounting for `initial` already-enqueued tasks.
    #[must_use]
    pub fn new(initial: u64) -> Self {
        Self(initial)
    }

    /// Record one more enqueued task.
    pub fn increment(&mut self) {
        self.0 += 1;
    }

    /// Record one consumed result.
    ///
    /// # Errors
    /// Returns [`ScanError::Internal`] instead of going below zero.
    pub fn decrement(&mut self) -> Result<()> {
        self.0 = self.0.checked_sub(1).ok_or_else(|| {
            ScanError::Internal("result received with no pending task".to_string())
        })?;
        Ok(())
    }

    /// Tasks still outstanding.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }

    /// No outstanding work remains.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

/// Static inputs to the processor.
#[derive(Debug, Clone)]
pub(crate) struct ExpansionRules {
    pub(crate) policy: TruncationPolicy,
    pub(crate) alphabets: AlphabetPair,
    pub(crate) cap: usize,
    pub(crate) branching_enabled: bool,
    pub(crate) excluded_keys: HashSet<String>,
}

/// Why the processor stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Pending counter reached zero
    Exhausted,
    /// Record cap satisfied
    Capped,
    /// Unique records reached the expected-total hint
    ExpectedTotalReached,
    /// The run token was cancelled from outside
    Cancelled,
}

/// State handed back once processing stops.
#[derive(Debug)]
pub(crate) struct ProcessorOutcome<R> {
    pub(crate) records: DedupSet<R>,
    pub(crate) termination: Termination,
    pub(crate) capped: bool,
    pub(crate) expected_total: Option<u64>,
    pub(crate) searches: usize,
    pub(crate) failed_branches: usize,
    pub(crate) pending: u64,
}

enum Step {
    Continue,
    Stop(Termination),
}

pub(crate) struct ExpansionProcessor<R> {
    rules: ExpansionRules,
    queue: TaskQueue,
    cancel: CancellationToken,
    records: DedupSet<R>,
    pending: PendingCounter,
    capped: bool,
    expected_total: Option<u64>,
    searches: usize,
    failed_branches: usize,
}

impl<R: Record> ExpansionProcessor<R> {
    /// `pending` must already count every task enqueued before the processor starts.
    pub(crate) fn new(
        rules: ExpansionRules,
        queue: TaskQueue,
        cancel: CancellationToken,
        pending: PendingCounter,
    ) -> Self {
        Self {
            rules,
            queue,
            cancel,
            records: DedupSet::new(),
            pending,
            capped: false,
            expected_total: None,
            searches: 0,
            failed_branches: 0,
        }
    }

    /// Consume results until completion or cancellation.
    ///
    /// On natural completion the run token is cancelled so workers and the
    /// queue drain.
    pub(crate) async fn run(
        mut self,
        mut results: mpsc::UnboundedReceiver<SearchResult<R>>,
    ) -> Result<ProcessorOutcome<R>> {
        let termination = if self.pending.is_zero() {
            Termination::Exhausted
        } else {
            loop {
                let result = tokio::select! {
                    biased;
                    () = self.cancel.cancelled() => break Termination::Cancelled,
                    received = results.recv() => match received {
                        Some(result) => result,
                        None => break Termination::Cancelled,
                    },
                };

                match self.process(result).await {
                    Ok(Step::Continue) => {}
                    Ok(Step::Stop(termination)) => break termination,
                    Err(e) => {
                        self.cancel.cancel();
                        return Err(e);
                    }
                }
            }
        };

        self.cancel.cancel();

        Ok(ProcessorOutcome {
            records: self.records,
            termination,
            capped: self.capped,
            expected_total: self.expected_total,
            searches: self.searches,
            failed_branches: self.failed_branches,
            pending: self.pending.get(),
        })
    }

    async fn process(&mut self, result: SearchResult<R>) -> Result<Step> {
        self.pending.decrement()?;
        self.searches += 1;

        let SearchResult { task, outcome } = result;
        let page = match outcome {
            Ok(page) => page,
            Err(e) => {
                self.failed_branches += 1;
                tracing::warn!(
                    query = task.display_query(),
                    pending = self.pending.get(),
                    "Search failed: {}",
                    e
                );
                return Ok(if self.pending.is_zero() {
                    Step::Stop(Termination::Exhausted)
                } else {
                    Step::Continue
                });
            }
        };

        if self.searches == 1 {
            self.expected_total = page.total_count.filter(|total| *total > 0);
        }

        let returned = page.items.len();
        let total_count = page.total_count;
        let new_records = self.merge(page);
        let truncated = self
            .rules
            .policy
            .is_truncated(returned, total_count, new_records);

        self.report(&task, returned, new_records, truncated);

        if truncated && !self.capped && self.rules.branching_enabled {
            if let Step::Stop(termination) = self.branch(&task).await {
                return Ok(Step::Stop(termination));
            }
        }

        Ok(self.termination_check())
    }

    /// Merge a page into the dedup set, returning how many records were new.
    ///
    /// `capped` is only set when an unseen record is refused; filling the
    /// set exactly to the cap is not a cap hit.
    fn merge(&mut self, page: SearchPage<R>) -> usize {
        let mut new_records = 0;

        for item in page.items {
            if self.rules.excluded_keys.contains(item.key()) || self.records.contains(item.key()) {
                continue;
            }
            if self.cap_satisfied() {
                self.capped = true;
                break;
            }
            if self.records.insert(item) == Insertion::New {
                new_records += 1;
            }
        }

        new_records
    }

    async fn branch(&mut self, task: &SearchTask) -> Step {
        let alphabet = self.rules.alphabets.for_depth(task.depth).clone();

        for c in alphabet.chars() {
            // The counter is only bumped once the task is actually queued,
            // so an aborted enqueue leaves it exact.
            if self.queue.enqueue(task.child(*c)).await.is_err() {
                return Step::Stop(Termination::Cancelled);
            }
            self.pending.increment();
        }

        Step::Continue
    }

    fn termination_check(&self) -> Step {
        if self.pending.is_zero() {
            Step::Stop(Termination::Exhausted)
        } else if self.capped {
            Step::Stop(Termination::Capped)
        } else if self
            .expected_total
            .is_some_and(|expected| self.records.len() as u64 >= expected)
        {
            Step::Stop(Termination::ExpectedTotalReached)
        } else {
            Step::Continue
        }
    }

    fn cap_satisfied(&self) -> bool {
        self.rules.cap > 0 && self.records.len() >= self.rules.cap
    }

    fn report(&self, task: &SearchTask, returned: usize, new_records: usize, truncated: bool) {
        let status = if self.capped {
            "capped"
        } else if truncated {
            "truncated"
        } else {
            "complete"
        };

        let cap = (self.rules.cap > 0).then_some(self.rules.cap);
        tracing::info!(
            search = self.searches,
            status,
            query = task.display_query(),
            depth = task.depth,
            returned,
            new = new_records,
            total = self.records.len(),
            cap,
            pending = self.pending.get(),
            "Search processed"
        );
    }
}
