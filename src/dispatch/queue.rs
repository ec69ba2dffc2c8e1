//! Shared FIFO work queues and the result events that flow through them.
//!
//! A run uses four independent queues: proxies, account chunks, data chunks,
//! and results. Handles are cheap to clone and safe to push/pop from the
//! dispatcher and every worker slot concurrently. Popping is non-blocking:
//! an empty queue yields `None`, which callers treat as a normal stopping
//! condition rather than an error.
//!
//! # Recycling rules
//!
//! A worker that completes its unit of work pushes its proxy back onto the
//! proxy queue always, and its account chunk back onto the account queue in
//! data-centric modes only. A data chunk, once popped, is never returned;
//! each data chunk is consumed exactly once.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// A process-wide FIFO queue with non-blocking pop.
///
/// Cloning produces another handle to the same underlying queue.
pub struct WorkQueue<T> {
    inner: Arc<Mutex<VecDeque<T>>>,
}

impl<T> Clone for WorkQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WorkQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Appends an item at the back of the queue.
    pub fn push(&self, item: T) {
        self.inner.lock().push_back(item);
    }

    /// Pushes every item of an iterator, preserving order.
    pub fn extend(&self, items: impl IntoIterator<Item = T>) {
        self.inner.lock().extend(items);
    }

    /// Removes and returns the front item, or `None` if the queue is empty.
    ///
    /// Never blocks; exhaustion is the caller's stop signal.
    pub fn try_pop(&self) -> Option<T> {
        self.inner.lock().pop_front()
    }

    /// Returns the number of queued items.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns whether the queue holds no items.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// The four queues shared between the dispatcher and all worker slots.
///
/// Created fresh for every run and discarded when the run ends.
#[derive(Clone, Default)]
pub struct WorkQueues {
    /// Proxy addresses; an empty string means "no proxy".
    pub proxies: WorkQueue<String>,
    /// Account chunks.
    pub accounts: WorkQueue<Vec<String>>,
    /// Data chunks. Only filled in data-centric modes.
    pub data: WorkQueue<Vec<String>>,
    /// Completion events pushed by workers, drained by the dispatcher.
    pub results: WorkQueue<SlotEvent>,
}

impl WorkQueues {
    /// Creates four empty queues.
    pub fn new() -> Self {
        Self::default()
    }
}

/// The payload a worker attaches to a completion event.
///
/// The payload's item count is what the result aggregator adds to the
/// running counters: one for a scalar, the sequence length for a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultPayload {
    /// A single work item.
    Item(String),
    /// A batch of work items processed as one unit.
    Batch(Vec<String>),
}

impl ResultPayload {
    /// Number of work items this payload accounts for.
    pub fn count(&self) -> u64 {
        match self {
            ResultPayload::Item(_) => 1,
            ResultPayload::Batch(items) => items.len() as u64,
        }
    }
}

impl fmt::Display for ResultPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultPayload::Item(item) => write!(f, "{item}"),
            ResultPayload::Batch(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

/// A completion event pushed by a worker onto the result queue.
///
/// Workers push exactly one event per completed unit of work; on an
/// unrecoverable error they still push a failed event rather than vanish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotEvent {
    /// A unit of work finished, successfully or not.
    Completed {
        /// The work items the unit covered.
        payload: ResultPayload,
        /// Whether the unit succeeded.
        success: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let queue = WorkQueue::new();
        queue.push("a".to_string());
        queue.push("b".to_string());
        queue.push("c".to_string());

        assert_eq!(queue.try_pop().as_deref(), Some("a"));
        assert_eq!(queue.try_pop().as_deref(), Some("b"));
        assert_eq!(queue.try_pop().as_deref(), Some("c"));
        assert_eq!(queue.try_pop(), None);
    }

    #[test]
    fn test_empty_pop_is_none_not_error() {
        let queue: WorkQueue<String> = WorkQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.try_pop(), None);
        // Popping an empty queue repeatedly stays a no-op.
        assert_eq!(queue.try_pop(), None);
    }

    #[test]
    fn test_clone_shares_storage() {
        let queue = WorkQueue::new();
        let handle = queue.clone();

        queue.push(1);
        handle.push(2);

        assert_eq!(queue.len(), 2);
        assert_eq!(handle.try_pop(), Some(1));
        assert_eq!(queue.try_pop(), Some(2));
    }

    #[test]
    fn test_extend_preserves_order() {
        let queue = WorkQueue::new();
        queue.extend(vec![1, 2, 3]);
        assert_eq!(queue.try_pop(), Some(1));
        assert_eq!(queue.try_pop(), Some(2));
        assert_eq!(queue.try_pop(), Some(3));
    }

    #[tokio::test]
    async fn test_concurrent_push_pop() {
        let queue = WorkQueue::new();

        let mut handles = Vec::new();
        for i in 0..8 {
            let q = queue.clone();
            handles.push(tokio::spawn(async move {
                for j in 0..100 {
                    q.push(i * 100 + j);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut drained = 0;
        while queue.try_pop().is_some() {
            drained += 1;
        }
        assert_eq!(drained, 800);
    }

    #[test]
    fn test_payload_count() {
        assert_eq!(ResultPayload::Item("x".to_string()).count(), 1);
        assert_eq!(ResultPayload::Batch(vec![]).count(), 0);
        let batch = ResultPayload::Batch(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(batch.count(), 2);
    }

    #[test]
    fn test_payload_display() {
        let item = ResultPayload::Item("4111".to_string());
        assert_eq!(item.to_string(), "4111");

        let batch = ResultPayload::Batch(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(batch.to_string(), "[a, b]");
    }
}
