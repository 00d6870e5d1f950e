use parking_lot::{Condvar, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GuardState {
    Pending,
    Running,
    Done,
}

/// The result of asking a [TeardownGuard] to run a teardown routine.
#[derive(Debug, PartialEq, Eq)]
pub enum TeardownOutcome<T> {
    /// This caller ran the routine and this is what it returned.
    Ran(T),
    /// The routine had already been run by another caller. If it was still in progress when this
    /// caller arrived, then this caller waited for it to finish.
    AlreadyDone,
}

/// Runs a teardown routine exactly once, no matter how many callers race to run it.
///
/// The first caller runs the routine. Any caller that arrives while the routine is in progress
/// blocks until it has finished and then gets [TeardownOutcome::AlreadyDone]. This allows the
/// normal completion path and a signal handler to both request teardown without destroying
/// anything twice, and without the signal handler exiting the process half way through a
/// teardown started elsewhere.
#[derive(Debug)]
pub struct TeardownGuard {
    state: Mutex<GuardState>,
    finished: Condvar,
}

impl Default for TeardownGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl TeardownGuard {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GuardState::Pending),
            finished: Condvar::new(),
        }
    }

    pub fn run<T>(&self, teardown: impl FnOnce() -> T) -> TeardownOutcome<T> {
        {
            let mut state = self.state.lock();
            loop {
                match *state {
                    GuardState::Pending => {
                        *state = GuardState::Running;
                        break;
                    }
                    GuardState::Running => self.finished.wait(&mut state),
                    GuardState::Done => return TeardownOutcome::AlreadyDone,
                }
            }
        }

        // Release waiters even if the routine panics.
        let _finish = FinishOnDrop(self);

        TeardownOutcome::Ran(teardown())
    }

    /// Whether the teardown routine has completed.
    pub fn is_done(&self) -> bool {
        *self.state.lock() == GuardState::Done
    }
}

struct FinishOnDrop<'a>(&'a TeardownGuard);

impl Drop for FinishOnDrop<'_> {
    fn drop(&mut self) {
        *self.0.state.lock() = GuardState::Done;
        self.0.finished.notify_all();
    }
}
