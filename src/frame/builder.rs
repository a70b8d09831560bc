use crate::{
    foundation::core::{Percentile, VariableMode},
    foundation::error::PerfgraphResult,
    measure::select::MeasureKeys,
    pipeline::plan::Task,
    table::model::{LATENCY_AVG_ERROR, LATENCY_AVG_VALUE, ResultTable, TEST_CASE},
};

/// A series with its error-derived bounds. `lower` is never negative.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Band {
    /// Central values.
    pub value: Vec<f64>,
    /// `value - error`, clamped at zero.
    pub lower: Vec<f64>,
    /// `value + error`.
    pub upper: Vec<f64>,
}

impl Band {
    /// Bounds of `value ± error`.
    pub fn from_error(value: Vec<f64>, error: &[f64]) -> Self {
        let lower = value
            .iter()
            .zip(error)
            .map(|(v, e)| clamp_lower(v - e))
            .collect();
        let upper = value.iter().zip(error).map(|(v, e)| v + e).collect();
        Self {
            value,
            lower,
            upper,
        }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.value.len()
    }

    /// Whether the band has no points.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// Task-scoped data slice with derived bounds and rates, sorted by x.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Task this frame was built for.
    pub task: Task,
    /// X-axis values (thread count or vector size).
    pub x: Vec<f64>,
    /// Average latency and its bounds.
    pub latency: Band,
    /// Global measure (tps or throughput) and its bounds.
    pub global: Band,
    /// Global measure divided by x, with bounds derived the same way.
    pub rate: Band,
    /// Requested latency percentiles, present only when the table carries them.
    pub percentiles: Vec<(Percentile, Vec<f64>)>,
}

impl Frame {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether the task matched no rows.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Percentile columns from `requested` that `table` lacks or holds as text.
pub fn missing_percentile_columns(
    table: &ResultTable,
    requested: &[Percentile],
) -> Vec<&'static str> {
    requested
        .iter()
        .map(|p| p.column())
        .filter(|c| table.numbers(c).is_err())
        .collect()
}

/// Derive the frame for `task`. The table is never modified.
///
/// Fails with [`crate::PerfgraphError::MissingColumn`] when a base column is absent. Percentiles
/// are all or nothing: if any requested column is unusable (see [`missing_percentile_columns`])
/// the frame comes back without percentiles.
pub fn build_frame(
    table: &ResultTable,
    task: &Task,
    mode: VariableMode,
    keys: &MeasureKeys,
    percentiles: &[Percentile],
) -> PerfgraphResult<Frame> {
    table.require(
        &[
            TEST_CASE,
            mode.x_column(),
            mode.task_column(),
            LATENCY_AVG_VALUE,
            LATENCY_AVG_ERROR,
            keys.global_value,
            keys.global_error,
        ],
        &format!("test case '{}'", task.test_case),
    )?;

    let names = table.text(TEST_CASE)?;
    let task_values = table.numbers(mode.task_column())?;
    let xs = table.numbers(mode.x_column())?;

    let mut rows: Vec<usize> = (0..table.len())
        .filter(|&i| names[i] == task.test_case && task_values[i] == task.value)
        .filter(|&i| xs[i].is_finite())
        .collect();
    rows.sort_by(|&a, &b| xs[a].total_cmp(&xs[b]));

    let pick = |column: &str| -> PerfgraphResult<Vec<f64>> {
        let src = table.numbers(column)?;
        Ok(rows.iter().map(|&i| src[i]).collect())
    };

    let x = pick(mode.x_column())?;
    let latency = Band::from_error(pick(LATENCY_AVG_VALUE)?, &pick(LATENCY_AVG_ERROR)?);
    let global_error = pick(keys.global_error)?;
    let global = Band::from_error(pick(keys.global_value)?, &global_error);

    let rate_value: Vec<f64> = global.value.iter().zip(&x).map(|(g, x)| g / x).collect();
    let rate_error: Vec<f64> = global_error.iter().zip(&x).map(|(e, x)| e / x).collect();
    let rate = Band::from_error(rate_value, &rate_error);

    let percentiles = if !missing_percentile_columns(table, percentiles).is_empty() {
        Vec::new()
    } else {
        percentiles
            .iter()
            .map(|p| Ok((*p, pick(p.column())?)))
            .collect::<PerfgraphResult<Vec<_>>>()?
    };

    Ok(Frame {
        task: task.clone(),
        x,
        latency,
        global,
        rate,
        percentiles,
    })
}

// NaN passes through so that gaps stay gaps when plotted.
fn clamp_lower(v: f64) -> f64 {
    if v < 0.0 { 0.0 } else { v }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/builder.rs"]
mod tests;
