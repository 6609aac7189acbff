//! One-shot session timers, expressed as cancellable values rather than
//! raw callbacks (REDESIGN FLAG).
//!
//! Each `TimerHandle` owns the `JoinHandle` of the task that will, after
//! its delay, push a [`TimerFired`] onto the session's event channel.
//! Dropping (or explicitly releasing) the handle cancels the task before
//! it fires, so a session that moves on from a state has no way to be
//! surprised by a stale timer later.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone, Copy)]
pub struct TimerFired(pub TimerId);

pub struct TimerHandle {
    id: TimerId,
    task: JoinHandle<()>,
}

impl TimerHandle {
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Cancels the underlying task. Equivalent to dropping the handle,
    /// spelled out for callers that want to release a timer explicitly
    /// without ending its scope.
    pub fn release(self) {
        self.task.abort();
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Creates timers that report back on a shared channel. One `TimerSet`
/// per session; each `create_timer` call hands back an owned
/// [`TimerHandle`] the caller is responsible for holding onto (or
/// releasing) as the session's state dictates.
pub struct TimerSet {
    next_id: u64,
    fired_tx: mpsc::UnboundedSender<TimerFired>,
}

impl TimerSet {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerFired>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        (
            Self {
                next_id: 0,
                fired_tx,
            },
            fired_rx,
        )
    }

    pub fn create_timer(&mut self, delay: Duration) -> TimerHandle {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        let tx = self.fired_tx.clone();

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(TimerFired(id));
        });

        TimerHandle { id, task }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn timer_fires_after_delay() {
        let (mut timers, mut fired) = TimerSet::new();
        let handle = timers.create_timer(Duration::from_millis(10));
        let expected = handle.id();
        // keep handle alive until it fires
        let got = fired.recv().await.unwrap();
        assert_eq!(got.0, expected);
        drop(handle);
    }

    #[tokio::test]
    async fn released_timer_never_fires() {
        let (mut timers, mut fired) = TimerSet::new();
        let handle = timers.create_timer(Duration::from_millis(20));
        handle.release();

        let result = tokio::time::timeout(Duration::from_millis(60), fired.recv()).await;
        assert!(result.is_err(), "released timer must not fire");
    }

    #[tokio::test]
    async fn dropping_handle_cancels_timer() {
        let (mut timers, mut fired) = TimerSet::new();
        {
            let _handle = timers.create_timer(Duration::from_millis(20));
        }
        let result = tokio::time::timeout(Duration::from_millis(60), fired.recv()).await;
        assert!(result.is_err(), "dropped timer must not fire");
    }
}
