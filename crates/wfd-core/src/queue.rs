//! `BufferQueue` (spec §3, §4.5, component C5): a thread-safe FIFO with
//! an optional capacity. Two policies are used elsewhere in this crate
//! family: `BufferQueue::bounded(2)` for the capture→encode handoff, and
//! `BufferQueue::unbounded()` for the RTP sender's input, which the
//! reference implementation drains quickly enough that backpressure
//! there would only add latency.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

struct State<T> {
    items: VecDeque<T>,
    capacity: Option<usize>,
}

/// A bounded (or unbounded) FIFO safe for concurrent single-producer,
/// single-consumer use. Ordering is strict FIFO; `push` blocks while full,
/// `pop` blocks while empty.
pub struct BufferQueue<T> {
    state: Mutex<State<T>>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T> BufferQueue<T> {
    #[must_use]
    pub fn bounded(capacity: usize) -> Self {
        Self {
            state: Mutex::new(State {
                items: VecDeque::new(),
                capacity: Some(capacity),
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            state: Mutex::new(State {
                items: VecDeque::new(),
                capacity: None,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    /// Blocks while the queue is full, then appends `item`.
    pub fn push(&self, item: T) {
        let mut state = self.state.lock().expect("queue mutex poisoned");
        state = self
            .not_full
            .wait_while(state, |s| matches!(s.capacity, Some(cap) if s.items.len() >= cap))
            .expect("queue mutex poisoned");
        state.items.push_back(item);
        drop(state);
        self.not_empty.notify_one();
    }

    /// Blocks while the queue is empty, then removes and returns the
    /// front item.
    pub fn pop(&self) -> T {
        let mut state = self.state.lock().expect("queue mutex poisoned");
        state = self
            .not_empty
            .wait_while(state, |s| s.items.is_empty())
            .expect("queue mutex poisoned");
        let item = state.items.pop_front().expect("non-empty by wait_while");
        drop(state);
        self.not_full.notify_one();
        item
    }

    /// Blocks until the queue is non-empty, without consuming anything.
    pub fn wait_to_be_filled(&self) {
        let state = self.state.lock().expect("queue mutex poisoned");
        let _ = self
            .not_empty
            .wait_while(state, |s| s.items.is_empty())
            .expect("queue mutex poisoned");
    }

    /// Blocks until there is room for another item (always returns
    /// immediately on an unbounded queue).
    pub fn wait_for_slots(&self) {
        let state = self.state.lock().expect("queue mutex poisoned");
        let _ = self
            .not_full
            .wait_while(state, |s| matches!(s.capacity, Some(cap) if s.items.len() >= cap))
            .expect("queue mutex poisoned");
    }

    /// Drains every currently queued item under a single lock
    /// acquisition, for batching consumers (the sender path, spec §4.5).
    pub fn drain(&self) -> Vec<T> {
        let mut state = self.state.lock().expect("queue mutex poisoned");
        let drained: Vec<T> = state.items.drain(..).collect();
        drop(state);
        self.not_full.notify_all();
        drained
    }

    /// Waits up to `timeout` for the queue to become non-empty, then
    /// drains it. Returns an empty `Vec` on timeout rather than blocking
    /// forever, so a worker loop can still observe an external stop
    /// signal between iterations.
    pub fn drain_wait_timeout(&self, timeout: std::time::Duration) -> Vec<T> {
        let mut state = self.state.lock().expect("queue mutex poisoned");
        if state.items.is_empty() {
            let (guard, _) = self
                .not_empty
                .wait_timeout_while(state, timeout, |s| s.items.is_empty())
                .expect("queue mutex poisoned");
            state = guard;
        }
        let drained: Vec<T> = state.items.drain(..).collect();
        drop(state);
        self.not_full.notify_all();
        drained
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.state.lock().expect("queue mutex poisoned").items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn fifo_ordering_is_preserved() {
        let queue: BufferQueue<u32> = BufferQueue::unbounded();
        queue.push(1);
        queue.push(2);
        queue.push(3);
        assert_eq!(queue.pop(), 1);
        assert_eq!(queue.pop(), 2);
        assert_eq!(queue.pop(), 3);
    }

    #[test]
    fn bounded_push_blocks_until_slot_frees() {
        let queue = Arc::new(BufferQueue::bounded(1));
        queue.push(1);
        assert_eq!(queue.size(), 1);

        let q2 = Arc::clone(&queue);
        let handle = thread::spawn(move || {
            q2.push(2);
        });

        thread::sleep(std::time::Duration::from_millis(20));
        assert_eq!(queue.size(), 1); // second push still blocked

        assert_eq!(queue.pop(), 1);
        handle.join().unwrap();
        assert_eq!(queue.size(), 1);
    }

    #[test]
    fn drain_empties_queue_in_one_shot() {
        let queue: BufferQueue<u32> = BufferQueue::unbounded();
        queue.push(1);
        queue.push(2);
        let drained = queue.drain();
        assert_eq!(drained, vec![1, 2]);
        assert_eq!(queue.size(), 0);
    }
}
