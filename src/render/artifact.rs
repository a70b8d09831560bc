use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    foundation::core::{OutputFormat, VariableMode, format_value},
    foundation::error::PerfgraphResult,
    pipeline::plan::Task,
    pipeline::tracker::FileTracker,
};

/// One output file of a task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    /// Destination path inside the output directory.
    pub path: PathBuf,
    /// Encoding of the file.
    pub format: OutputFormat,
}

impl Artifact {
    /// Deterministic artifact location for `task` in `dir`.
    pub fn for_task(dir: &Path, task: &Task, mode: VariableMode, format: OutputFormat) -> Self {
        Self {
            path: dir.join(file_name(&task.test_case, mode, task.value, format)),
            format,
        }
    }
}

/// `<lowercased test case, spaces as underscores>-<prefix><value>.<ext>`.
pub fn file_name(test_case: &str, mode: VariableMode, value: f64, format: OutputFormat) -> String {
    format!(
        "{}-{}{}.{}",
        test_case.to_lowercase().replace(' ', "_"),
        mode.file_prefix(),
        format_value(value),
        format.extension()
    )
}

/// Result of a tracked write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Every file was written and the task was counted.
    Completed(Vec<Artifact>),
    /// The run was cancelled before the write could be committed; nothing is left on disk.
    Cancelled,
}

/// Write already-encoded artifacts, keeping `tracker` aware of every path while it is mid-write.
///
/// Paths are registered before the first byte is written and deregistered (counting the task
/// once) after the last file is complete. On IO failure, panic or cancellation the files of this
/// task are removed before their paths leave the registry.
pub fn write_tracked(
    tracker: &FileTracker,
    payloads: Vec<(Artifact, Vec<u8>)>,
) -> PerfgraphResult<WriteOutcome> {
    let paths: Vec<PathBuf> = payloads.iter().map(|(a, _)| a.path.clone()).collect();
    if !tracker.begin_write(&paths) {
        return Ok(WriteOutcome::Cancelled);
    }
    let mut guard = InFlight {
        tracker,
        paths,
        armed: true,
    };

    for (artifact, bytes) in &payloads {
        std::fs::write(&artifact.path, bytes)
            .with_context(|| format!("write chart '{}'", artifact.path.display()))?;
    }

    if !tracker.end_write(&guard.paths) {
        return Ok(WriteOutcome::Cancelled);
    }
    guard.armed = false;
    Ok(WriteOutcome::Completed(
        payloads.into_iter().map(|(a, _)| a).collect(),
    ))
}

struct InFlight<'t> {
    tracker: &'t FileTracker,
    paths: Vec<PathBuf>,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        for path in &self.paths {
            let _ = std::fs::remove_file(path);
        }
        self.tracker.abort_write(&self.paths);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/artifact.rs"]
mod tests;
