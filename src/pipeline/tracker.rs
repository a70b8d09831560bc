use std::{
    collections::BTreeMap,
    path::PathBuf,
    sync::{
        Condvar, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

/// Shared registry of output paths currently being written, plus the completed-task counter.
///
/// Owned by the scheduler and handed to workers and the cancellation controller by reference.
/// The lock is held only while the registry is mutated, never across disk IO.
#[derive(Debug, Default)]
pub struct FileTracker {
    state: Mutex<TrackerState>,
    idle: Condvar,
    completed: AtomicU64,
}

#[derive(Debug, Default)]
struct TrackerState {
    // Registrations per path; a path stays in flight until every writer has released it.
    in_flight: BTreeMap<PathBuf, usize>,
    cancelled: bool,
}

impl TrackerState {
    fn release(&mut self, paths: &[PathBuf]) {
        for p in paths {
            if let Some(count) = self.in_flight.get_mut(p) {
                *count -= 1;
                if *count == 0 {
                    self.in_flight.remove(p);
                }
            }
        }
    }

    fn paths(&self) -> Vec<PathBuf> {
        self.in_flight.keys().cloned().collect()
    }
}

/// Point-in-time view of a [`FileTracker`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackerSnapshot {
    /// Paths that may be incomplete on disk.
    pub in_flight: Vec<PathBuf>,
    /// Tasks whose artifacts were fully written.
    pub completed: u64,
}

impl FileTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // Poisoned locks are recovered: no critical section below can leave the state half-updated.
    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `paths` before any byte is written.
    ///
    /// Returns `false`, registering nothing, once the tracker has been cancelled.
    pub fn begin_write(&self, paths: &[PathBuf]) -> bool {
        let mut state = self.lock();
        if state.cancelled {
            return false;
        }
        for p in paths {
            *state.in_flight.entry(p.clone()).or_insert(0) += 1;
        }
        true
    }

    /// Deregister `paths` after a successful write and count the task once.
    ///
    /// Returns `false` when the tracker was cancelled meanwhile: the paths stay registered and the
    /// caller must remove its files, then call [`FileTracker::abort_write`].
    pub fn end_write(&self, paths: &[PathBuf]) -> bool {
        let mut state = self.lock();
        if state.cancelled {
            return false;
        }
        state.release(paths);
        self.completed.fetch_add(1, Ordering::SeqCst);
        if state.in_flight.is_empty() {
            self.idle.notify_all();
        }
        true
    }

    /// Deregister `paths` without counting. Callers remove their files first.
    pub fn abort_write(&self, paths: &[PathBuf]) {
        let mut state = self.lock();
        state.release(paths);
        if state.in_flight.is_empty() {
            self.idle.notify_all();
        }
    }

    /// Current in-flight paths and completed count.
    pub fn snapshot(&self) -> TrackerSnapshot {
        let state = self.lock();
        TrackerSnapshot {
            in_flight: state.paths(),
            completed: self.completed.load(Ordering::SeqCst),
        }
    }

    /// Stop accepting and committing writes; return the state at the moment of cancellation.
    ///
    /// Idempotent. After this call the completed count no longer changes.
    pub fn cancel(&self) -> TrackerSnapshot {
        let mut state = self.lock();
        state.cancelled = true;
        TrackerSnapshot {
            in_flight: state.paths(),
            completed: self.completed.load(Ordering::SeqCst),
        }
    }

    /// Whether [`FileTracker::cancel`] has been called.
    pub fn is_cancelled(&self) -> bool {
        self.lock().cancelled
    }

    /// Tasks whose artifacts were fully written.
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    /// Block until no path is in flight or `grace` elapses. Returns whether the registry drained.
    pub fn wait_idle(&self, grace: Duration) -> bool {
        let deadline = Instant::now() + grace;
        let mut state = self.lock();
        while !state.in_flight.is_empty() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            state = match self.idle.wait_timeout(state, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/tracker.rs"]
mod tests;
