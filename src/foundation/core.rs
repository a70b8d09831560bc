use crate::table::model::{THREADS, VECTOR_SIZE};

/// Which column drives the x-axis of every chart in a run.
///
/// The other column becomes the task variable: each chart is drawn for one fixed value of it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VariableMode {
    /// Thread count on the x-axis, one chart per vector size.
    #[default]
    Threads,
    /// Vector size on the x-axis, one chart per thread count.
    Size,
}

impl VariableMode {
    /// Column plotted on the x-axis.
    pub fn x_column(self) -> &'static str {
        match self {
            Self::Threads => THREADS,
            Self::Size => VECTOR_SIZE,
        }
    }

    /// Column whose distinct values define tasks.
    pub fn task_column(self) -> &'static str {
        match self {
            Self::Threads => VECTOR_SIZE,
            Self::Size => THREADS,
        }
    }

    /// Filename prefix placed before the task value.
    pub fn file_prefix(self) -> &'static str {
        match self {
            Self::Threads => "vec",
            Self::Size => "threads",
        }
    }

    /// Human-readable x-axis label.
    pub fn x_label(self) -> &'static str {
        match self {
            Self::Threads => "# of Threads",
            Self::Size => "Vector Size (Bytes)",
        }
    }

    /// Legend label of the per-item rate series.
    pub fn rate_label(self, measure: &str) -> String {
        format!("{measure}/{}", self.x_column())
    }
}

/// Encoded artifact format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OutputFormat {
    /// Scalable vector graphics, written as generated.
    Svg,
    /// Raster PNG, rasterized from the SVG document.
    Png,
}

impl OutputFormat {
    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }
}

/// Latency percentile series that can be overlaid on the top panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Percentile {
    /// 95th percentile.
    P95,
    /// 98th percentile.
    P98,
    /// 99th percentile.
    P99,
}

impl Percentile {
    /// All percentiles, in ascending order.
    pub const ALL: [Percentile; 3] = [Self::P95, Self::P98, Self::P99];

    /// Source column holding this percentile's latency value.
    pub fn column(self) -> &'static str {
        match self {
            Self::P95 => "latency p95 value",
            Self::P98 => "latency p98 value",
            Self::P99 => "latency p99 value",
        }
    }

    /// Short legend label.
    pub fn label(self) -> &'static str {
        match self {
            Self::P95 => "p95",
            Self::P98 => "p98",
            Self::P99 => "p99",
        }
    }
}

/// Format a table value for titles and filenames: integral values drop the fractional part.
pub fn format_value(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
