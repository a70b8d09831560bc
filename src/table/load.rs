//! Readers turning on-disk result tables into a [`ResultTable`].
//!
//! Two formats are understood: CSV with a header row, and JSON holding an array of row objects.
//! Column names are taken verbatim. A column is numeric when every non-empty cell parses as a
//! number; the test case column is always text.

use std::{collections::BTreeMap, fs::File, io::Read, path::Path};

use anyhow::Context as _;

use crate::{
    foundation::core::format_value,
    foundation::error::{PerfgraphError, PerfgraphResult},
    table::model::{Column, ResultTable, TEST_CASE},
};

/// Load a table, choosing the reader from the file extension (`.csv` or `.json`).
pub fn load_table(path: &Path) -> PerfgraphResult<ResultTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("csv") => load_csv(path),
        Some("json") => load_json(path),
        _ => Err(PerfgraphError::load(format!(
            "unsupported table format '{}' (expected .csv or .json)",
            path.display()
        ))),
    }
}

/// Load a CSV table with a header row.
pub fn load_csv(path: &Path) -> PerfgraphResult<ResultTable> {
    let f = File::open(path).with_context(|| format!("open table '{}'", path.display()))?;
    read_csv(f)
}

/// Read a CSV table with a header row from any reader.
pub fn read_csv<R: Read>(reader: R) -> PerfgraphResult<ResultTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| PerfgraphError::load(format!("csv header: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut cells = vec![Vec::<String>::new(); headers.len()];
    for (row, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| PerfgraphError::load(format!("csv row {}: {e}", row + 1)))?;
        for (idx, col) in cells.iter_mut().enumerate() {
            col.push(record.get(idx).unwrap_or("").to_string());
        }
    }

    let mut table = ResultTable::new();
    for (name, raw) in headers.into_iter().zip(cells) {
        let column = infer_column(&name, raw);
        table.insert_column(name, column)?;
    }
    Ok(table)
}

/// Load a JSON table: an array of objects mapping column names to numbers, strings or null.
pub fn load_json(path: &Path) -> PerfgraphResult<ResultTable> {
    let f = File::open(path).with_context(|| format!("open table '{}'", path.display()))?;
    read_json(f)
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum Cell {
    Number(f64),
    Text(String),
    Null,
}

/// Read a JSON table from any reader.
pub fn read_json<R: Read>(reader: R) -> PerfgraphResult<ResultTable> {
    let rows: Vec<BTreeMap<String, Cell>> = serde_json::from_reader(reader)
        .map_err(|e| PerfgraphError::load(format!("parse table JSON: {e}")))?;

    let mut names = Vec::<String>::new();
    for row in &rows {
        for key in row.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }

    let mut table = ResultTable::new();
    for name in names {
        let raw: Vec<String> = rows
            .iter()
            .map(|row| match row.get(&name) {
                Some(Cell::Number(v)) => format_value(*v),
                Some(Cell::Text(s)) => s.clone(),
                Some(Cell::Null) | None => String::new(),
            })
            .collect();
        let column = infer_column(&name, raw);
        table.insert_column(name, column)?;
    }
    Ok(table)
}

fn infer_column(name: &str, raw: Vec<String>) -> Column {
    if name == TEST_CASE {
        return Column::Text(raw);
    }
    let parsed: Option<Vec<f64>> = raw
        .iter()
        .map(|cell| {
            if cell.is_empty() {
                Some(f64::NAN)
            } else {
                cell.parse::<f64>().ok()
            }
        })
        .collect();
    match parsed {
        Some(values) => Column::Number(values),
        None => Column::Text(raw),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/table/load.rs"]
mod tests;
