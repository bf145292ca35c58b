//! Bounded, cancellation-aware task queue shared by all workers.
//!
//! The queue is a tokio `mpsc` channel whose receiving half is shared behind
//! an async mutex, giving many-producer/many-consumer semantics. Every
//! blocking operation also waits on the queue's cancellation token.

use crate::task::SearchTask;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// Enqueue was abandoned because the run was cancelled or the queue closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnqueueAborted(pub SearchTask);

/// Pending search tasks.
#[derive(Debug, Clone)]
pub struct TaskQueue {
    tx: mpsc::Sender<SearchTask>,
    rx: Arc<Mutex<mpsc::Receiver<SearchTask>>>,
    closed: CancellationToken,
}

impl TaskQueue {
    /// Create a queue holding at most `capacity` tasks, closed when `cancel` fires.
    #[must_use]
    pub fn new(capacity: usize, cancel: &CancellationToken) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
            closed: cancel.child_token(),
        }
    }

    /// Push a task, waiting for space.
    ///
    /// Returns the task back if cancellation or close happens first; in that
    /// case nothing was enqueued.
    pub async fn enqueue(&self, task: SearchTask) -> Result<(), EnqueueAborted> {
        if self.closed.is_cancelled() {
            return Err(EnqueueAborted(task));
        }

        tokio::select! {
            biased;
            () = self.closed.cancelled() => Err(EnqueueAborted(task)),
            permit = self.tx.reserve() => match permit {
                Ok(permit) => {
                    permit.send(task);
                    Ok(())
                }
                Err(_) => Err(EnqueueAborted(task)),
            },
        }
    }

    /// Pop the next task.
    ///
    /// Returns `None` once the queue is closed or cancelled.
    pub async fn dequeue(&self) -> Option<SearchTask> {
        if self.closed.is_cancelled() {
            return None;
        }

        tokio::select! {
            biased;
            () = self.closed.cancelled() => None,
            task = async { self.rx.lock().await.recv().await } => task,
        }
    }

    /// Stop handing out tasks and wake every idle worker. Idempotent.
    pub fn close(&self) {
        self.closed.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fifo_order() {
        let cancel = CancellationToken::new();
        let queue = TaskQueue::new(4, &cancel);

        queue.enqueue(SearchTask::custom("a")).await.expect("enqueue a");
        queue.enqueue(SearchTask::custom("b")).await.expect("enqueue b");

        assert_eq!(queue.dequeue().await.map(|t| t.query), Some("a".to_string()));
        assert_eq!(queue.dequeue().await.map(|t| t.query), Some("b".to_string()));
    }

    #[tokio::test]
    async fn test_close_wakes_idle_consumer() {
        let cancel = CancellationToken::new();
        let queue = TaskQueue::new(4, &cancel);

        let consumer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.dequeue().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.close();

        let popped = tokio::time::timeout(Duration::from_secs(1), consumer)
            .await
            .expect("consumer woke up")
            .expect("consumer task ran");
        assert!(popped.is_none());
        assert!(queue.dequeue().await.is_none());
        assert!(queue.enqueue(SearchTask::root()).await.is_err());
    }

    #[tokio::test]
    async fn test_full_queue_enqueue_aborts_on_cancel() {
        let cancel = CancellationToken::new();
        let queue = TaskQueue::new(1, &cancel);
        queue.enqueue(SearchTask::custom("a")).await.expect("first fits");

        let blocked = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.enqueue(SearchTask::custom("b")).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(1), blocked)
            .await
            .expect("enqueue returned")
            .expect("producer task ran");
        assert_eq!(result, Err(EnqueueAborted(SearchTask::custom("b"))));
    }

    #[tokio::test]
    async fn test_dequeue_after_cancel_returns_none() {
        let cancel = CancellationToken::new();
        let queue = TaskQueue::new(2, &cancel);
        queue.enqueue(SearchTask::root()).await.expect("enqueue root");

        cancel.cancel();
        assert!(queue.dequeue().await.is_none());
    }
}
