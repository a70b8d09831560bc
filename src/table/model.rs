use std::collections::BTreeMap;

use crate::foundation::error::{PerfgraphError, PerfgraphResult};

/// Test case name column (text).
pub const TEST_CASE: &str = "test case";
/// Thread count column.
pub const THREADS: &str = "threads";
/// Vector size column, in bytes.
pub const VECTOR_SIZE: &str = "vector size";
/// Average latency column, in milliseconds.
pub const LATENCY_AVG_VALUE: &str = "latency average value";
/// Error bound of the average latency.
pub const LATENCY_AVG_ERROR: &str = "latency average error";

/// One named column of a [`ResultTable`].
#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    /// Free-form text cells.
    Text(Vec<String>),
    /// Numeric cells; missing values are `NaN`.
    Number(Vec<f64>),
}

impl Column {
    /// Number of cells.
    pub fn len(&self) -> usize {
        match self {
            Self::Text(v) => v.len(),
            Self::Number(v) => v.len(),
        }
    }

    /// Whether the column has no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Immutable, column-oriented table of benchmark measurements.
///
/// One row per test case and parameter combination. Every column has the same length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultTable {
    columns: BTreeMap<String, Column>,
    rows: usize,
}

impl ResultTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(name, column)` pairs.
    pub fn from_columns<I, S>(columns: I) -> PerfgraphResult<Self>
    where
        I: IntoIterator<Item = (S, Column)>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (name, column) in columns {
            table.insert_column(name, column)?;
        }
        Ok(table)
    }

    /// Add or replace a column. Its length must match the existing columns.
    pub fn insert_column(
        &mut self,
        name: impl Into<String>,
        column: Column,
    ) -> PerfgraphResult<()> {
        let name = name.into();
        let replacing_only = self.columns.len() == 1 && self.columns.contains_key(&name);
        if !self.columns.is_empty() && !replacing_only && column.len() != self.rows {
            return Err(PerfgraphError::validation(format!(
                "column '{name}' has {} rows, table has {}",
                column.len(),
                self.rows
            )));
        }
        self.rows = column.len();
        self.columns.insert(name, column);
        Ok(())
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Whether a column with this exact name exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Column names in sorted order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Borrow a text column.
    pub fn text(&self, name: &str) -> PerfgraphResult<&[String]> {
        match self.columns.get(name) {
            Some(Column::Text(v)) => Ok(v),
            Some(Column::Number(_)) => Err(PerfgraphError::validation(format!(
                "column '{name}' is numeric, expected text"
            ))),
            None => Err(PerfgraphError::missing_column(name, "result table")),
        }
    }

    /// Borrow a numeric column.
    pub fn numbers(&self, name: &str) -> PerfgraphResult<&[f64]> {
        match self.columns.get(name) {
            Some(Column::Number(v)) => Ok(v),
            Some(Column::Text(_)) => Err(PerfgraphError::validation(format!(
                "column '{name}' is not numeric"
            ))),
            None => Err(PerfgraphError::missing_column(name, "result table")),
        }
    }

    /// Distinct test case names in order of first appearance.
    pub fn test_cases(&self) -> PerfgraphResult<Vec<String>> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for tc in self.text(TEST_CASE)? {
            if seen.insert(tc.as_str()) {
                out.push(tc.clone());
            }
        }
        Ok(out)
    }

    /// Fail with [`PerfgraphError::MissingColumn`] on the first absent column.
    pub fn require(&self, columns: &[&str], context: &str) -> PerfgraphResult<()> {
        match columns.iter().find(|c| !self.has_column(c)) {
            Some(missing) => Err(PerfgraphError::missing_column(*missing, context)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/table/model.rs"]
mod tests;
