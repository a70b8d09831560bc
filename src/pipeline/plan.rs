use std::collections::BTreeMap;

use crate::{
    foundation::core::{OutputFormat, VariableMode, format_value},
    foundation::error::{PerfgraphError, PerfgraphResult},
    render::artifact::file_name,
    table::model::{ResultTable, TEST_CASE},
};

/// One unit of rendering work: a test case at one value of the task variable.
#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    /// Test case name, as found in the table.
    pub test_case: String,
    /// Value of the task variable (vector size or thread count, per mode).
    pub value: f64,
}

impl Task {
    /// Identity used in logs, e.g. `AES Encrypt and threads 4`.
    pub fn describe(&self, mode: VariableMode) -> String {
        format!(
            "{} and {} {}",
            self.test_case,
            mode.task_column(),
            format_value(self.value)
        )
    }
}

/// Enumerate every (test case, task value) pair present in `table`.
///
/// Test cases keep their order of first appearance; each test case's values are its own
/// observed set, sorted ascending. Non-finite values are skipped.
pub fn plan_tasks(table: &ResultTable, mode: VariableMode) -> PerfgraphResult<Vec<Task>> {
    let names = table.text(TEST_CASE)?;
    let values = table.numbers(mode.task_column())?;

    let mut tasks = Vec::new();
    for test_case in table.test_cases()? {
        let mut observed: Vec<f64> = names
            .iter()
            .zip(values)
            .filter(|(name, v)| **name == test_case && v.is_finite())
            .map(|(_, v)| *v)
            .collect();
        observed.sort_by(f64::total_cmp);
        observed.dedup();

        tracing::debug!(test_case = %test_case, values = observed.len(), "planned test case");
        tasks.extend(observed.into_iter().map(|value| Task {
            test_case: test_case.clone(),
            value,
        }));
    }
    Ok(tasks)
}

/// Reject plans where two distinct test cases would write the same file.
///
/// Filenames lowercase the test case and replace spaces, so e.g. `AES Encrypt` and `aes encrypt`
/// collide.
pub fn check_file_names(tasks: &[Task], mode: VariableMode) -> PerfgraphResult<()> {
    let mut seen: BTreeMap<String, &Task> = BTreeMap::new();
    for task in tasks {
        let name = file_name(&task.test_case, mode, task.value, OutputFormat::Svg);
        if let Some(first) = seen.insert(name.clone(), task) {
            return Err(PerfgraphError::validation(format!(
                "test cases '{}' and '{}' both write {name}",
                first.test_case, task.test_case
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/plan.rs"]
mod tests;
