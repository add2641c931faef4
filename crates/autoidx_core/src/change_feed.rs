//! Index change notifications.
//!
//! The lifecycle manager reports every index it registers or removes
//! through an [`IndexNotifier`]. Notification is fire-and-forget: a
//! notifier cannot fail the operation that triggered it.
//!
//! [`IndexChangeFeed`] is the default notifier. It numbers events, keeps a
//! bounded history for catch-up polling and fans events out to channel
//! subscribers:
//!
//! ```rust
//! use autoidx_core::{IndexChangeFeed, IndexChangeType, IndexNotifier};
//!
//! let feed = IndexChangeFeed::new();
//! let rx = feed.subscribe();
//!
//! feed.notify("Auto/Users/ByName", IndexChangeType::Added);
//!
//! let event = rx.recv().unwrap();
//! assert_eq!(event.sequence, 1);
//! assert_eq!(event.index_name, "Auto/Users/ByName");
//! ```

use parking_lot::RwLock;
use std::sync::mpsc::{self, Receiver, Sender};

/// Kind of change to the set of indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexChangeType {
    /// An index was registered.
    Added,
    /// An index was removed.
    Removed,
}

/// Receiver of index change notifications.
pub trait IndexNotifier: Send + Sync {
    /// Reports that `index_name` was added or removed.
    fn notify(&self, index_name: &str, change: IndexChangeType);
}

/// A numbered change event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexChangeEvent {
    /// Position in the feed, starting at 1.
    pub sequence: u64,
    /// Name of the affected index.
    pub index_name: String,
    /// What happened.
    pub change: IndexChangeType,
}

struct History {
    events: Vec<IndexChangeEvent>,
    last_sequence: u64,
}

/// Default notifier: subscribers plus a bounded, pollable history.
pub struct IndexChangeFeed {
    subscribers: RwLock<Vec<Sender<IndexChangeEvent>>>,
    history: RwLock<History>,
    max_history: usize,
}

impl IndexChangeFeed {
    /// Creates a feed keeping the last 1024 events.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_history(1024)
    }

    /// Creates a feed with a specific history limit.
    #[must_use]
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            history: RwLock::new(History {
                events: Vec::new(),
                last_sequence: 0,
            }),
            max_history,
        }
    }

    /// Subscribes to future events.
    pub fn subscribe(&self) -> Receiver<IndexChangeEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Returns events with a sequence greater than `cursor`, up to `limit`.
    #[must_use]
    pub fn poll(&self, cursor: u64, limit: usize) -> Vec<IndexChangeEvent> {
        self.history
            .read()
            .events
            .iter()
            .filter(|e| e.sequence > cursor)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Returns the sequence of the latest event, 0 if none.
    #[must_use]
    pub fn latest_sequence(&self) -> u64 {
        self.history.read().last_sequence
    }

    /// Returns the number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    fn emit(&self, index_name: &str, change: IndexChangeType) {
        // Sequence assignment and send happen under the history lock so
        // subscribers observe events in sequence order.
        let mut history = self.history.write();
        history.last_sequence += 1;
        let event = IndexChangeEvent {
            sequence: history.last_sequence,
            index_name: index_name.to_string(),
            change,
        };

        history.events.push(event.clone());
        if history.events.len() > self.max_history {
            let excess = history.events.len() - self.max_history;
            history.events.drain(0..excess);
        }

        self.subscribers
            .write()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl Default for IndexChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexNotifier for IndexChangeFeed {
    fn notify(&self, index_name: &str, change: IndexChangeType) {
        self.emit(index_name, change);
    }
}

impl std::fmt::Debug for IndexChangeFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexChangeFeed")
            .field("latest_sequence", &self.latest_sequence())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn multiple_subscribers() {
        let feed = IndexChangeFeed::new();
        let rx1 = feed.subscribe();
        let rx2 = feed.subscribe();

        feed.notify("Auto/Users/ByName", IndexChangeType::Added);

        assert_eq!(rx1.recv().unwrap().change, IndexChangeType::Added);
        assert_eq!(rx2.recv().unwrap().index_name, "Auto/Users/ByName");
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let feed = IndexChangeFeed::new();
        let rx = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 1);

        drop(rx);
        feed.notify("A", IndexChangeType::Removed);
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[test]
    fn poll_from_cursor() {
        let feed = IndexChangeFeed::new();
        for name in ["A", "B", "C", "D"] {
            feed.notify(name, IndexChangeType::Added);
        }

        let events = feed.poll(2, 10);
        let names: Vec<_> = events.iter().map(|e| e.index_name.as_str()).collect();
        assert_eq!(names, ["C", "D"]);
        assert_eq!(feed.poll(0, 1).len(), 1);
        assert_eq!(feed.latest_sequence(), 4);
    }

    #[test]
    fn history_is_bounded() {
        let feed = IndexChangeFeed::with_max_history(3);
        for i in 0..10 {
            feed.notify(&format!("I{i}"), IndexChangeType::Added);
        }

        let events = feed.poll(0, 100);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].sequence, 8);
        assert_eq!(feed.latest_sequence(), 10);
    }

    #[test]
    fn threaded_notify() {
        let feed = Arc::new(IndexChangeFeed::new());
        let rx = feed.subscribe();

        let writer = Arc::clone(&feed);
        let handle = thread::spawn(move || {
            writer.notify("Auto/Users/ByName", IndexChangeType::Removed);
        });

        let event = rx.recv_timeout(Duration::from_millis(500)).unwrap();
        assert_eq!(event.change, IndexChangeType::Removed);
        handle.join().unwrap();
    }
}
