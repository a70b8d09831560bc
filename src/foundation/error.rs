/// Convenience result type used across perfgraph.
pub type PerfgraphResult<T> = Result<T, PerfgraphError>;

/// Top-level error taxonomy used by the rendering pipeline.
///
/// Only [`PerfgraphError::MissingColumn`] and [`PerfgraphError::Validation`] abort a run. Fit and
/// render errors are scoped to a single task and are reported, never propagated to the pool.
#[derive(thiserror::Error, Debug)]
pub enum PerfgraphError {
    /// A required column is absent from a result table.
    #[error("schema error: missing column '{column}' ({context})")]
    MissingColumn {
        /// Name of the absent column.
        column: String,
        /// Where the column was needed (table role, test case).
        context: String,
    },

    /// Invalid configuration or table shape.
    #[error("validation error: {0}")]
    Validation(String),

    /// Regression optimizer failed for one task.
    #[error("fit error: {0}")]
    Fit(String),

    /// Failure while composing, encoding or writing one task's chart.
    #[error("render error: {0}")]
    Render(String),

    /// Failure while reading a result table from disk.
    #[error("load error: {0}")]
    Load(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PerfgraphError {
    /// Build a [`PerfgraphError::MissingColumn`] value.
    pub fn missing_column(column: impl Into<String>, context: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
            context: context.into(),
        }
    }

    /// Build a [`PerfgraphError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PerfgraphError::Fit`] value.
    pub fn fit(msg: impl Into<String>) -> Self {
        Self::Fit(msg.into())
    }

    /// Build a [`PerfgraphError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`PerfgraphError::Load`] value.
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
