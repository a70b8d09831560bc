//! perfgraph renders benchmark result tables into two-panel charts.
//!
//! One chart is drawn per test case and task value, in SVG, PNG or both. Rendering runs on a
//! worker pool, and an interrupted run never leaves a half-written chart on disk:
//!
//! - Load a [`ResultTable`] (or build one in memory)
//! - Describe the run with a [`RenderConfig`]
//! - Hand both to a [`Scheduler`] and read the [`RunSummary`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Run configuration.
pub mod config;
/// Regression overlays.
pub mod fit;
/// Per-task frames.
pub mod frame;
/// Measure selection.
pub mod measure;
/// Task planning, scheduling, file tracking and cancellation.
pub mod pipeline;
/// Chart composition and output.
pub mod render;
/// Result tables and loaders.
pub mod table;

pub use crate::foundation::core::{OutputFormat, Percentile, VariableMode, format_value};
pub use crate::foundation::error::{PerfgraphError, PerfgraphResult};

pub use crate::config::{ComparisonLabels, FormatSelection, PercentileSelection, RenderConfig};
pub use crate::measure::select::{Measure, MeasureSelection, select_measure};
pub use crate::pipeline::cancel::{CancellationController, CancellationToken, InterruptReport};
pub use crate::pipeline::plan::{Task, plan_tasks};
pub use crate::pipeline::scheduler::{AbortReason, RunSummary, Scheduler, TaskReport, TaskState};
pub use crate::pipeline::tracker::{FileTracker, TrackerSnapshot};
pub use crate::table::load::load_table;
pub use crate::table::model::{Column, ResultTable};
