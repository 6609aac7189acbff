//! The `Executable`/worker abstraction (spec §4.6, component C6).
//!
//! Each stage of the streaming pipeline (capture, encode, send) is an
//! `Executable` bound to its own OS thread; the thread loops `execute()`
//! until it returns `false` or the worker is told to stop. This mirrors
//! the teacher's dedicated-thread capture pattern, generalized from one
//! fixed stream to an arbitrary bound executable.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One pipeline stage. `execute()` performs a single unit of work and
/// reports whether the worker should keep looping.
pub trait Executable: Send {
    fn name(&self) -> &str;
    fn start(&mut self) -> bool;
    fn stop(&mut self) -> bool;
    fn execute(&mut self) -> bool;
}

/// Binds an [`Executable`] to a dedicated OS thread.
pub struct Worker {
    name: String,
    running: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl Worker {
    /// Starts the executable's thread. Returns `false` (without spawning)
    /// if `executable.start()` itself reports failure.
    pub fn start(mut executable: Box<dyn Executable>) -> Option<Self> {
        let name = executable.name().to_string();
        if !executable.start() {
            tracing::warn!(worker = %name, "executable failed to start");
            return None;
        }

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = Arc::clone(&running);
        let thread_name = name.clone();

        let thread = std::thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                while running_clone.load(Ordering::SeqCst) {
                    if !executable.execute() {
                        break;
                    }
                }
                executable.stop();
            })
            .expect("failed to spawn pipeline worker thread");

        Some(Self {
            name,
            running,
            thread: Some(thread),
        })
    }

    /// Signals the worker to stop and joins its thread. Returns `true`
    /// once the thread has actually exited.
    pub fn stop(&mut self) -> bool {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            handle.join().is_ok()
        } else {
            true
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.thread.is_some() && self.running.load(Ordering::SeqCst)
    }

    /// Whether the worker's thread is still executing. Unlike
    /// `is_running`, this reflects a stage that stopped itself by
    /// returning `false` from `execute()` (a capture or encode failure),
    /// not just whether `stop()` has been requested.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.thread.as_ref().is_some_and(|h| !h.is_finished())
    }
}
