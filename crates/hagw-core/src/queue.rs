//! Outbound message queue with a priority tier, coalescing and expiry
//!
//! Entries live in one deque. The first `first_non_priority` entries form
//! the priority tier; the rest are normal entries. Both tiers are FIFO.
//!
//! ```text
//!  front                                                   back
//!  ┌────────┬────────┬────────┬────────┬────────┬────────┐
//!  │ prio 1 │ prio 2 │ norm 1 │ norm 2 │ norm 3 │ norm 4 │
//!  └────────┴────────┴────────┴────────┴────────┴────────┘
//!                    ▲
//!           first_non_priority
//! ```
//!
//! Expiry is checked when an entry is dequeued: an entry whose age exceeds
//! the queue-wide TTL or its own TTL is dropped.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::debug;

/// Decides whether a newly added message replaces a pending one
pub trait Coalescable {
    /// True when `self` (pending) is made redundant by `newer`
    fn coalesces_with(&self, newer: &Self) -> bool;
}

struct Entry<T> {
    message: T,
    enqueued_at: Instant,
    ttl: Option<Duration>,
}

struct QueueState<T> {
    entries: VecDeque<Entry<T>>,
    first_non_priority: usize,
}

/// Thread-safe queue with a single async consumer
pub struct MessageQueue<T> {
    state: Mutex<QueueState<T>>,
    available: Notify,
    default_ttl: Option<Duration>,
}

impl<T: Coalescable> MessageQueue<T> {
    /// Queue whose entries never expire unless given their own TTL
    pub fn new() -> Self {
        Self::with_ttl(None)
    }

    /// Queue with a TTL applied to every entry
    pub fn with_ttl(default_ttl: Option<Duration>) -> Self {
        Self {
            state: Mutex::new(QueueState {
                entries: VecDeque::new(),
                first_non_priority: 0,
            }),
            available: Notify::new(),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    /// Append a normal entry, replacing the first pending entry it coalesces with
    pub fn add(&self, message: T) {
        self.push(message, None);
    }

    pub fn add_with_ttl(&self, message: T, ttl: Duration) {
        self.push(message, Some(ttl));
    }

    /// Insert after all pending priority entries and before every normal one
    pub fn priority_add(&self, message: T) {
        self.push_priority(message, None);
    }

    pub fn priority_add_with_ttl(&self, message: T, ttl: Duration) {
        self.push_priority(message, Some(ttl));
    }

    fn push(&self, message: T, ttl: Option<Duration>) {
        {
            let mut state = self.state.lock();
            let pending = state
                .entries
                .iter()
                .position(|entry| entry.message.coalesces_with(&message));
            if let Some(index) = pending {
                state.entries.remove(index);
                if index < state.first_non_priority {
                    state.first_non_priority -= 1;
                }
                debug!(index, "Coalesced pending message");
            }
            state.entries.push_back(Entry {
                message,
                enqueued_at: Instant::now(),
                ttl,
            });
        }
        self.available.notify_one();
    }

    fn push_priority(&self, message: T, ttl: Option<Duration>) {
        {
            let mut state = self.state.lock();
            let index = state.first_non_priority;
            state.entries.insert(
                index,
                Entry {
                    message,
                    enqueued_at: Instant::now(),
                    ttl,
                },
            );
            state.first_non_priority += 1;
        }
        self.available.notify_one();
    }

    /// Take the next live entry without waiting
    pub fn poll(&self) -> Option<T> {
        let mut state = self.state.lock();
        while let Some(entry) = state.entries.pop_front() {
            if state.first_non_priority > 0 {
                state.first_non_priority -= 1;
            }
            let age = entry.enqueued_at.elapsed();
            let expired = [self.default_ttl, entry.ttl]
                .into_iter()
                .flatten()
                .find(|ttl| age > *ttl);
            match expired {
                Some(ttl) => debug!(
                    age_ms = age.as_millis() as u64,
                    ttl_ms = ttl.as_millis() as u64,
                    "Dropping expired message"
                ),
                None => return Some(entry.message),
            }
        }
        None
    }

    /// Wait until a live entry is available and take it
    ///
    /// Cancel safe: dropping the future never loses an entry.
    pub async fn blocking_poll(&self) -> T {
        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(message) = self.poll() {
                return message;
            }
            notified.await;
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.first_non_priority = 0;
    }
}

impl<T: Coalescable> Default for MessageQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    struct Msg {
        verb: &'static str,
        target: u8,
        merge: bool,
    }

    fn msg(verb: &'static str, target: u8) -> Msg {
        Msg {
            verb,
            target,
            merge: true,
        }
    }

    fn plain(verb: &'static str, target: u8) -> Msg {
        Msg {
            verb,
            target,
            merge: false,
        }
    }

    impl Coalescable for Msg {
        fn coalesces_with(&self, newer: &Self) -> bool {
            self.merge && newer.merge && self.verb == newer.verb && self.target == newer.target
        }
    }

    fn drain(queue: &MessageQueue<Msg>) -> Vec<(&'static str, u8)> {
        std::iter::from_fn(|| queue.poll())
            .map(|m| (m.verb, m.target))
            .collect()
    }

    #[test]
    fn test_fifo_within_normal_tier() {
        let queue = MessageQueue::new();
        queue.add(msg("A", 1));
        queue.add(msg("B", 1));
        queue.add(msg("C", 1));
        assert_eq!(drain(&queue), vec![("A", 1), ("B", 1), ("C", 1)]);
        assert!(queue.poll().is_none());
    }

    #[test]
    fn test_priority_entries_precede_normal_entries() {
        let queue = MessageQueue::new();
        queue.add(msg("USER1", 1));
        queue.add(msg("USER2", 2));
        queue.priority_add(msg("SETUP1", 0));
        queue.add(msg("USER3", 3));
        queue.priority_add(msg("SETUP2", 0));

        assert_eq!(
            drain(&queue),
            vec![
                ("SETUP1", 0),
                ("SETUP2", 0),
                ("USER1", 1),
                ("USER2", 2),
                ("USER3", 3)
            ]
        );
    }

    #[test]
    fn test_priority_boundary_tracks_polls() {
        let queue = MessageQueue::new();
        queue.priority_add(msg("P1", 0));
        queue.priority_add(msg("P2", 0));
        queue.add(msg("N1", 1));
        assert_eq!(queue.poll().map(|m| m.verb), Some("P1"));

        queue.priority_add(msg("P3", 0));
        assert_eq!(drain(&queue), vec![("P2", 0), ("P3", 0), ("N1", 1)]);
    }

    #[test]
    fn test_coalescing_keeps_one_entry() {
        let queue = MessageQueue::new();
        queue.add(msg("FADE", 7));
        queue.add(msg("RAISE", 7));
        queue.add(msg("FADE", 7));
        assert_eq!(queue.len(), 2);
        assert_eq!(drain(&queue), vec![("RAISE", 7), ("FADE", 7)]);
    }

    #[test]
    fn test_no_coalescing_when_disabled() {
        let queue = MessageQueue::new();
        queue.add(plain("ON", 1));
        queue.add(plain("ON", 1));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_coalescing_out_of_priority_tier_moves_boundary() {
        let queue = MessageQueue::new();
        queue.priority_add(msg("DLMON", 0));
        queue.priority_add(msg("GSMON", 0));
        queue.add(msg("USER", 1));
        // replaces the pending priority GSMON with a normal one at the tail
        queue.add(msg("GSMON", 0));
        queue.priority_add(msg("KLMON", 0));

        assert_eq!(
            drain(&queue),
            vec![("DLMON", 0), ("KLMON", 0), ("USER", 1), ("GSMON", 0)]
        );
    }

    #[test]
    fn test_expired_entries_are_dropped_on_poll() {
        let queue = MessageQueue::new();
        queue.add_with_ttl(msg("STALE", 1), Duration::from_millis(10));
        queue.add(msg("FRESH", 2));
        std::thread::sleep(Duration::from_millis(30));

        assert_eq!(drain(&queue), vec![("FRESH", 2)]);
    }

    #[test]
    fn test_queue_wide_ttl() {
        let queue = MessageQueue::with_ttl(Some(Duration::from_millis(10)));
        queue.priority_add(msg("OLD", 0));
        queue.add(msg("OLD", 1));
        std::thread::sleep(Duration::from_millis(30));
        queue.add_with_ttl(msg("OWN_TTL", 2), Duration::from_secs(60));
        queue.add(msg("NEW", 3));

        assert_eq!(drain(&queue), vec![("OWN_TTL", 2), ("NEW", 3)]);
    }

    #[test]
    fn test_entry_ttl_does_not_extend_queue_ttl() {
        let queue = MessageQueue::with_ttl(Some(Duration::from_millis(10)));
        queue.add_with_ttl(msg("LONG", 1), Duration::from_secs(60));
        queue.priority_add_with_ttl(msg("LONG", 0), Duration::from_secs(60));
        std::thread::sleep(Duration::from_millis(30));

        assert!(queue.poll().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_shorter_entry_ttl_wins_over_queue_ttl() {
        let queue = MessageQueue::with_ttl(Some(Duration::from_secs(60)));
        queue.add_with_ttl(msg("SHORT", 1), Duration::from_millis(10));
        queue.add(msg("KEPT", 2));
        std::thread::sleep(Duration::from_millis(30));

        assert_eq!(drain(&queue), vec![("KEPT", 2)]);
    }

    #[test]
    fn test_clear() {
        let queue = MessageQueue::new();
        queue.priority_add(msg("P", 0));
        queue.add(msg("N", 1));
        queue.clear();
        assert!(queue.is_empty());
        queue.add(msg("N", 2));
        queue.priority_add(msg("P", 3));
        assert_eq!(drain(&queue), vec![("P", 3), ("N", 2)]);
    }

    #[tokio::test]
    async fn test_blocking_poll_waits_for_entry() {
        let queue = Arc::new(MessageQueue::new());
        let consumer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.blocking_poll().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!consumer.is_finished());

        queue.add(msg("WAKE", 1));
        let received = tokio::time::timeout(Duration::from_secs(1), consumer)
            .await
            .expect("consumer timed out")
            .unwrap();
        assert_eq!(received, msg("WAKE", 1));
    }

    #[tokio::test]
    async fn test_blocking_poll_cancel_does_not_lose_entries() {
        let queue = MessageQueue::new();
        let cancelled =
            tokio::time::timeout(Duration::from_millis(10), queue.blocking_poll()).await;
        assert!(cancelled.is_err());

        queue.add(msg("KEPT", 1));
        assert_eq!(queue.blocking_poll().await, msg("KEPT", 1));
    }
}
