use std::path::PathBuf;

use crate::foundation::core::{OutputFormat, Percentile, VariableMode};
use crate::foundation::error::{PerfgraphError, PerfgraphResult};

/// Which artifact formats to write per task.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatSelection {
    /// SVG only.
    Svg,
    /// PNG only.
    Png,
    /// SVG and PNG.
    #[default]
    Both,
}

impl FormatSelection {
    /// Formats to emit, in write order.
    pub fn formats(self) -> &'static [OutputFormat] {
        match self {
            Self::Svg => &[OutputFormat::Svg],
            Self::Png => &[OutputFormat::Png],
            Self::Both => &[OutputFormat::Svg, OutputFormat::Png],
        }
    }
}

/// Requested latency percentile overlays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PercentileSelection {
    /// Overlay the 95th percentile.
    pub p95: bool,
    /// Overlay the 98th percentile.
    pub p98: bool,
    /// Overlay the 99th percentile.
    pub p99: bool,
}

impl PercentileSelection {
    /// Every percentile.
    pub fn all() -> Self {
        Self {
            p95: true,
            p98: true,
            p99: true,
        }
    }

    /// Requested percentiles, ascending.
    pub fn requested(self) -> Vec<Percentile> {
        Percentile::ALL
            .into_iter()
            .filter(|p| match p {
                Percentile::P95 => self.p95,
                Percentile::P98 => self.p98,
                Percentile::P99 => self.p99,
            })
            .collect()
    }

    /// Whether no percentile is requested.
    pub fn is_empty(self) -> bool {
        !(self.p95 || self.p98 || self.p99)
    }
}

/// Legend labels distinguishing the primary and comparison data sets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComparisonLabels {
    /// Label of the primary table.
    pub primary: String,
    /// Label of the comparison table.
    pub secondary: String,
}

impl Default for ComparisonLabels {
    fn default() -> Self {
        Self {
            primary: "data set 1".to_string(),
            secondary: "data set 2".to_string(),
        }
    }
}

/// Resolved, read-only configuration of one rendering run.
///
/// Built once and shared by reference with every worker. Call [`RenderConfig::validate`] (the
/// scheduler does) before rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderConfig {
    /// Which column is on the x-axis.
    pub mode: VariableMode,
    /// Artifact formats per task.
    pub formats: FormatSelection,
    /// Latency percentile overlays.
    pub percentiles: PercentileSelection,
    /// Draw shaded error regions around measure, latency and rate series.
    pub error_regions: bool,
    /// Comparison mode labels; `Some` enables comparison overlays.
    pub comparison: Option<ComparisonLabels>,
    /// Overlay fitted regression curves (size mode only).
    pub regression: bool,
    /// Existing, writable directory receiving the artifacts.
    pub output_dir: PathBuf,
    /// Worker count; `1` renders serially on the calling thread.
    pub workers: usize,
}

impl RenderConfig {
    /// Configuration with defaults for everything but the output directory.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            mode: VariableMode::default(),
            formats: FormatSelection::default(),
            percentiles: PercentileSelection::default(),
            error_regions: true,
            comparison: None,
            regression: false,
            output_dir: output_dir.into(),
            workers: default_workers(),
        }
    }

    /// Check cross-field rules.
    pub fn validate(&self) -> PerfgraphResult<()> {
        if self.workers == 0 {
            return Err(PerfgraphError::validation("worker count must be >= 1"));
        }
        if self.regression && self.mode != VariableMode::Size {
            return Err(PerfgraphError::validation(
                "regression overlay requires size mode (vector size on the x-axis)",
            ));
        }
        Ok(())
    }

    /// Whether comparison overlays are enabled.
    pub fn comparison_enabled(&self) -> bool {
        self.comparison.is_some()
    }
}

/// Worker count used when none is configured: the host's available parallelism.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
