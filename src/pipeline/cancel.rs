use std::{
    io::ErrorKind,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use anyhow::Context as _;

use crate::{foundation::error::PerfgraphResult, pipeline::tracker::FileTracker};

/// How long an interrupt waits for workers to clean up their own in-flight files.
pub const INTERRUPT_GRACE: Duration = Duration::from_secs(10);

/// Cooperative stop flag polled by workers before they pick up a task.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// A token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What an interrupt found and cleaned up.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InterruptReport {
    /// Tasks fully written before the interrupt. Frozen from this point on.
    pub completed: u64,
    /// Partial files deleted.
    pub removed: Vec<PathBuf>,
    /// Partial files that could not be deleted.
    pub failed: Vec<PathBuf>,
}

impl InterruptReport {
    /// Line printed when a run stops on interrupt.
    pub fn summary_line(&self) -> String {
        format!(
            "interrupted: {} chart(s) completed before interruption",
            self.completed
        )
    }
}

/// Reacts to an external interrupt: stops new work and removes partially written artifacts.
#[derive(Clone, Debug)]
pub struct CancellationController {
    tracker: Arc<FileTracker>,
    token: CancellationToken,
    grace: Duration,
}

impl CancellationController {
    /// Controller over the run's tracker and stop flag.
    pub fn new(tracker: Arc<FileTracker>, token: CancellationToken) -> Self {
        Self {
            tracker,
            token,
            grace: INTERRUPT_GRACE,
        }
    }

    /// Override how long [`CancellationController::interrupt`] waits for workers.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Cancel the run and delete every file that was mid-write.
    ///
    /// Safe to call from a signal-handler thread and more than once. After it returns, no
    /// partial artifact remains on disk and no more tasks will be counted.
    pub fn interrupt(&self) -> InterruptReport {
        self.token.cancel();
        let snapshot = self.tracker.cancel();

        let mut report = InterruptReport {
            completed: snapshot.completed,
            ..InterruptReport::default()
        };
        for path in snapshot.in_flight {
            match std::fs::remove_file(&path) {
                Ok(()) => report.removed.push(path),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to remove partial chart"
                    );
                    report.failed.push(path);
                }
            }
        }

        // Workers still holding paths delete their own files once they observe the cancel.
        if !self.tracker.wait_idle(self.grace) {
            tracing::warn!(
                pending = self.tracker.snapshot().in_flight.len(),
                "workers did not finish cleanup before the grace period ended"
            );
        }
        tracing::info!(
            completed = report.completed,
            removed = report.removed.len(),
            "interrupt handled"
        );
        report
    }

    /// Route SIGINT/SIGTERM to [`CancellationController::interrupt`], then exit with status 0.
    pub fn install(self) -> PerfgraphResult<()> {
        ctrlc::set_handler(move || {
            let report = self.interrupt();
            println!("{}", report.summary_line());
            std::process::exit(0);
        })
        .context("install interrupt handler")?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/cancel.rs"]
mod tests;
