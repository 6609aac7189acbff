//! The Pipeline Scheduler (spec §4.6, component C6): binds each
//! executable to an isolated worker and manages lifecycle atomically.

use crate::worker::{Executable, Worker};

const MAX_WORKERS: usize = 3; // capture, encode, send

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Stopped,
    Running,
}

pub struct Scheduler {
    pending: Vec<Box<dyn Executable>>,
    workers: Vec<Worker>,
    state: State,
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            workers: Vec::new(),
            state: State::Stopped,
        }
    }

    /// Registers an executable to be bound to a worker on the next
    /// `start()`. Refuses once the pool is at capacity.
    pub fn add(&mut self, executable: Box<dyn Executable>) -> bool {
        if self.pending.len() + self.workers.len() >= MAX_WORKERS {
            return false;
        }
        self.pending.push(executable);
        true
    }

    /// Starts every pending executable. If any fails, workers already
    /// started in this call are stopped and the pool rolls back to
    /// `stopped`. Invalid (returns `false`) if the pool is already
    /// running.
    pub fn start(&mut self) -> bool {
        if self.state == State::Running {
            return false;
        }

        let mut started = Vec::new();
        let mut ok = true;

        for executable in self.pending.drain(..) {
            let name = executable.name().to_string();
            match Worker::start(executable) {
                Some(worker) => started.push(worker),
                None => {
                    tracing::error!(worker = %name, "pipeline stage failed to start, rolling back");
                    ok = false;
                    break;
                }
            }
        }

        if !ok {
            for mut worker in started {
                worker.stop();
            }
            self.state = State::Stopped;
            return false;
        }

        self.workers = started;
        self.state = State::Running;
        true
    }

    /// Stops every worker. Invalid (returns `false`) if the pool isn't
    /// running. Returns `false` without clearing state if any worker
    /// failed to confirm it stopped.
    pub fn stop(&mut self) -> bool {
        if self.state != State::Running {
            return false;
        }

        let all_stopped = self.workers.iter_mut().fold(true, |acc, w| acc & w.stop());

        if all_stopped {
            self.workers.clear();
            self.state = State::Stopped;
        }
        all_stopped
    }

    #[must_use]
    pub fn running(&self) -> bool {
        self.state == State::Running
    }

    /// `true` while running and every worker's thread is still alive.
    /// A stage that stopped itself (e.g. a capture or encode failure)
    /// flips this to `false` without waiting for an explicit `stop()`.
    #[must_use]
    pub fn healthy(&self) -> bool {
        self.state == State::Running && self.workers.iter().all(Worker::is_alive)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeExecutable {
        name: &'static str,
        fail_start: bool,
        iterations: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    }

    impl Executable for FakeExecutable {
        fn name(&self) -> &str {
            self.name
        }
        fn start(&mut self) -> bool {
            !self.fail_start
        }
        fn stop(&mut self) -> bool {
            true
        }
        fn execute(&mut self) -> bool {
            self.iterations
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(1));
            true
        }
    }

    #[test]
    fn add_refuses_past_capacity() {
        let mut scheduler = Scheduler::new();
        let counter = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        for i in 0..MAX_WORKERS {
            assert!(scheduler.add(Box::new(FakeExecutable {
                name: "stage",
                fail_start: false,
                iterations: counter.clone(),
            })), "stage {i} should be accepted");
        }
        assert!(!scheduler.add(Box::new(FakeExecutable {
            name: "overflow",
            fail_start: false,
            iterations: counter,
        })));
    }

    #[test]
    fn start_rolls_back_on_partial_failure() {
        let mut scheduler = Scheduler::new();
        let counter = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        scheduler.add(Box::new(FakeExecutable {
            name: "good",
            fail_start: false,
            iterations: counter.clone(),
        }));
        scheduler.add(Box::new(FakeExecutable {
            name: "bad",
            fail_start: true,
            iterations: counter,
        }));

        assert!(!scheduler.start());
        assert!(!scheduler.running());
    }

    #[test]
    fn double_start_is_rejected() {
        let mut scheduler = Scheduler::new();
        let counter = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        scheduler.add(Box::new(FakeExecutable {
            name: "stage",
            fail_start: false,
            iterations: counter,
        }));
        assert!(scheduler.start());
        assert!(!scheduler.start());
        scheduler.stop();
    }

    #[test]
    fn stop_without_start_is_rejected() {
        let mut scheduler = Scheduler::new();
        assert!(!scheduler.stop());
    }

    struct DyingExecutable {
        iterations_left: usize,
    }

    impl Executable for DyingExecutable {
        fn name(&self) -> &str {
            "dying"
        }
        fn start(&mut self) -> bool {
            true
        }
        fn stop(&mut self) -> bool {
            true
        }
        fn execute(&mut self) -> bool {
            if self.iterations_left == 0 {
                return false;
            }
            self.iterations_left -= 1;
            std::thread::sleep(std::time::Duration::from_millis(1));
            true
        }
    }

    #[test]
    fn healthy_goes_false_once_a_stage_stops_itself() {
        let mut scheduler = Scheduler::new();
        scheduler.add(Box::new(DyingExecutable { iterations_left: 0 }));
        assert!(scheduler.start());

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(1);
        while scheduler.healthy() && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert!(!scheduler.healthy());
    }
}
