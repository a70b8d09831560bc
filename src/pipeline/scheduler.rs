use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    path::{Path, PathBuf},
    sync::Arc,
};

use rayon::prelude::*;

use crate::{
    config::RenderConfig,
    fit::regression::fit_frame,
    foundation::core::{Percentile, format_value},
    foundation::error::{PerfgraphError, PerfgraphResult},
    frame::builder::{Frame, build_frame, missing_percentile_columns},
    measure::select::{MeasureKeys, select_measure},
    pipeline::{
        cancel::{CancellationController, CancellationToken},
        plan::{Task, check_file_names, plan_tasks},
        tracker::FileTracker,
    },
    render::{
        artifact::{Artifact, WriteOutcome},
        chart::{ChartInput, ChartRenderer},
        raster::Rasterizer,
    },
    table::model::{LATENCY_AVG_ERROR, LATENCY_AVG_VALUE, ResultTable, TEST_CASE},
};

/// Why a task ended without output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AbortReason {
    /// The run was interrupted before the task's write committed.
    Cancelled,
    /// Rendering failed; the message carries the error or panic text.
    Failed(String),
}

/// Lifecycle of one task: `Pending -> InProgress -> Completed | Aborted`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskState {
    /// Not picked up by a worker yet.
    Pending,
    /// A worker is building, rendering or writing it.
    InProgress,
    /// Every artifact was written and counted.
    Completed,
    /// Ended without artifacts.
    Aborted(AbortReason),
}

impl TaskState {
    /// Whether the task can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted(_))
    }
}

/// Final record of one task, handed to the progress observer.
#[derive(Clone, Debug)]
pub struct TaskReport {
    /// The task.
    pub task: Task,
    /// Terminal state.
    pub state: TaskState,
    /// Files written, empty unless completed.
    pub artifacts: Vec<Artifact>,
    /// Non-fatal issues, e.g. regression fits that failed.
    pub warnings: Vec<String>,
}

/// Totals of a finished (or interrupted) run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Tasks planned from the table.
    pub tasks_total: usize,
    /// Tasks whose artifacts were fully written.
    pub completed: u64,
    /// Tasks skipped or rolled back because of an interrupt.
    pub aborted: usize,
    /// Tasks that failed to render.
    pub failed: usize,
    /// Paths of every artifact written.
    pub artifacts: Vec<PathBuf>,
    /// Whether the run was interrupted.
    pub interrupted: bool,
    /// Percentile overlays were requested but the table lacks their columns.
    pub percentiles_disabled: bool,
    /// Regression fits that failed across all tasks.
    pub fit_warnings: usize,
}

impl RunSummary {
    /// The line printed at the end of a run.
    pub fn summary_line(&self, output_dir: &Path) -> String {
        if self.interrupted {
            format!(
                "interrupted: {} chart(s) completed before interruption",
                self.completed
            )
        } else {
            format!(
                "{} chart(s) completed, {} file(s) written to {}",
                self.completed,
                self.artifacts.len(),
                output_dir.display()
            )
        }
    }

    /// The line the binary prints when the run ends on its own.
    ///
    /// `None` for interrupted runs: the interrupt handler prints its own line and exits.
    pub fn completion_line(&self, output_dir: &Path) -> Option<String> {
        (!self.interrupted).then(|| self.summary_line(output_dir))
    }
}

type Observer<'a> = Box<dyn Fn(&TaskReport) + Send + Sync + 'a>;

/// Fans tasks out over a worker pool and owns the run's shared state.
///
/// The [`FileTracker`] and [`CancellationToken`] are created here and handed to workers and to
/// the [`CancellationController`]; nothing is process-global.
pub struct Scheduler<'a> {
    config: &'a RenderConfig,
    tracker: Arc<FileTracker>,
    token: CancellationToken,
    rasterizer: Rasterizer,
    observer: Option<Observer<'a>>,
}

impl<'a> Scheduler<'a> {
    /// Validate `config` and set up a fresh tracker and token.
    pub fn new(config: &'a RenderConfig) -> PerfgraphResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            tracker: Arc::new(FileTracker::new()),
            token: CancellationToken::new(),
            rasterizer: Rasterizer::default(),
            observer: None,
        })
    }

    /// Use a preloaded rasterizer (shares its font database).
    pub fn with_rasterizer(mut self, rasterizer: Rasterizer) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    /// Call `f` from the worker thread each time a task reaches a terminal state.
    pub fn on_task(mut self, f: impl Fn(&TaskReport) + Send + Sync + 'a) -> Self {
        self.observer = Some(Box::new(f));
        self
    }

    /// Shared in-flight registry of this run.
    pub fn tracker(&self) -> &Arc<FileTracker> {
        &self.tracker
    }

    /// Stop flag of this run.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Controller that can interrupt this run from another thread.
    pub fn controller(&self) -> CancellationController {
        CancellationController::new(Arc::clone(&self.tracker), self.token.clone())
    }

    /// Render every task planned from `table` and block until each one is terminal.
    ///
    /// Only schema errors (and pool construction failures) are returned; per-task failures are
    /// logged and counted in the summary.
    pub fn run(
        &self,
        table: &ResultTable,
        comparison: Option<&ResultTable>,
    ) -> PerfgraphResult<RunSummary> {
        let mode = self.config.mode;
        let comparison = match (self.config.comparison_enabled(), comparison) {
            (true, None) => {
                tracing::warn!("comparison mode enabled without a comparison table");
                None
            }
            (false, Some(_)) => {
                tracing::warn!("comparison table ignored: comparison mode is disabled");
                None
            }
            (_, cmp) => cmp,
        };

        preflight(table, self.config, "primary table")?;
        if let Some(cmp) = comparison {
            preflight(cmp, self.config, "comparison table")?;
        }
        let tasks = plan_tasks(table, mode)?;
        check_file_names(&tasks, mode)?;

        let requested = self.config.percentiles.requested();
        let missing = missing_percentile_columns(table, &requested);
        let percentiles_disabled = !requested.is_empty() && !missing.is_empty();
        let percentiles = if percentiles_disabled {
            tracing::warn!(
                missing = ?missing,
                "percentile columns unavailable, percentile overlays disabled for this run"
            );
            Vec::new()
        } else {
            requested
        };

        tracing::info!(
            tasks = tasks.len(),
            workers = self.config.workers,
            mode = ?mode,
            "rendering charts"
        );
        let job = Job {
            table,
            comparison,
            percentiles: &percentiles,
        };
        let reports: Vec<TaskReport> = if self.config.workers == 1 {
            tasks.iter().map(|t| self.run_task(t, &job)).collect()
        } else {
            let pool = build_thread_pool(self.config.workers)?;
            pool.install(|| tasks.par_iter().map(|t| self.run_task(t, &job)).collect())
        };

        let mut summary = RunSummary {
            tasks_total: tasks.len(),
            percentiles_disabled,
            ..RunSummary::default()
        };
        for report in reports {
            summary.fit_warnings += report.warnings.len();
            match report.state {
                TaskState::Completed => summary
                    .artifacts
                    .extend(report.artifacts.into_iter().map(|a| a.path)),
                TaskState::Aborted(AbortReason::Failed(_)) => summary.failed += 1,
                _ => summary.aborted += 1,
            }
        }
        summary.completed = self.tracker.completed();
        summary.interrupted = self.token.is_cancelled() || self.tracker.is_cancelled();
        Ok(summary)
    }

    fn run_task(&self, task: &Task, job: &Job<'_>) -> TaskReport {
        let mut report = TaskReport {
            task: task.clone(),
            state: TaskState::Pending,
            artifacts: Vec::new(),
            warnings: Vec::new(),
        };
        if self.token.is_cancelled() || self.tracker.is_cancelled() {
            report.state = TaskState::Aborted(AbortReason::Cancelled);
            return self.finish(report);
        }

        report.state = TaskState::InProgress;
        let describe = task.describe(self.config.mode);
        tracing::debug!(task = %describe, "drawing chart");

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.render_task(task, job, &mut report.warnings)
        }));
        report.state = match outcome {
            Ok(Ok(WriteOutcome::Completed(artifacts))) => {
                tracing::info!(
                    test_case = %task.test_case,
                    value = %format_value(task.value),
                    files = artifacts.len(),
                    "drew chart"
                );
                report.artifacts = artifacts;
                TaskState::Completed
            }
            Ok(Ok(WriteOutcome::Cancelled)) => TaskState::Aborted(AbortReason::Cancelled),
            Ok(Err(e)) => {
                tracing::warn!(task = %describe, error = %e, "chart failed");
                TaskState::Aborted(AbortReason::Failed(e.to_string()))
            }
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                tracing::warn!(task = %describe, panic = %msg, "chart panicked");
                TaskState::Aborted(AbortReason::Failed(msg))
            }
        };
        self.finish(report)
    }

    fn render_task(
        &self,
        task: &Task,
        job: &Job<'_>,
        warnings: &mut Vec<String>,
    ) -> PerfgraphResult<WriteOutcome> {
        let mode = self.config.mode;
        let selection = select_measure(&task.test_case);
        let frame = build_frame(job.table, task, mode, &selection.keys, job.percentiles)?;

        let comparison = match job.comparison {
            Some(cmp) => comparison_frame(cmp, task, self.config, &selection.keys)?,
            None => None,
        };

        let overlay = if self.config.regression {
            let report = fit_frame(&frame);
            for failure in &report.failures {
                tracing::warn!(
                    task = %task.describe(mode),
                    error = %failure,
                    "regression fit failed, drawing chart without it"
                );
                warnings.push(failure.to_string());
            }
            let fitted = report.overlay.throughput.is_some() || report.overlay.latency.is_some();
            fitted.then_some(report.overlay)
        } else {
            None
        };

        let input = ChartInput {
            frame: &frame,
            selection: &selection,
            comparison: comparison.as_ref(),
            regression: overlay.as_ref(),
        };
        ChartRenderer::new(self.config, &self.rasterizer).render(&input, &self.tracker)
    }

    fn finish(&self, report: TaskReport) -> TaskReport {
        if let Some(observer) = &self.observer {
            observer(&report);
        }
        report
    }
}

struct Job<'t> {
    table: &'t ResultTable,
    comparison: Option<&'t ResultTable>,
    percentiles: &'t [Percentile],
}

// Tasks absent from the comparison table are drawn without an overlay.
fn comparison_frame(
    cmp: &ResultTable,
    task: &Task,
    config: &RenderConfig,
    keys: &MeasureKeys,
) -> PerfgraphResult<Option<Frame>> {
    if !cmp.text(TEST_CASE)?.iter().any(|n| *n == task.test_case) {
        return Ok(None);
    }
    let frame = build_frame(cmp, task, config.mode, keys, &[])?;
    Ok((!frame.is_empty()).then_some(frame))
}

/// Check every column each test case will read, before any worker starts.
fn preflight(table: &ResultTable, config: &RenderConfig, role: &str) -> PerfgraphResult<()> {
    let mode = config.mode;
    table.require(&[TEST_CASE], role)?;
    for test_case in table.test_cases()? {
        let keys = select_measure(&test_case).keys;
        table.require(
            &[
                mode.x_column(),
                mode.task_column(),
                LATENCY_AVG_VALUE,
                LATENCY_AVG_ERROR,
                keys.global_value,
                keys.global_error,
            ],
            &format!("{role}, test case '{test_case}'"),
        )?;
    }
    Ok(())
}

fn build_thread_pool(workers: usize) -> PerfgraphResult<rayon::ThreadPool> {
    if workers == 0 {
        return Err(PerfgraphError::validation("worker count must be >= 1"));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("perfgraph-worker-{i}"))
        .build()
        .map_err(|e| PerfgraphError::render(format!("failed to build rayon thread pool: {e}")))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/scheduler.rs"]
mod tests;
