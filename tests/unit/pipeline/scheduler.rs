use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::{
    config::{FormatSelection, PercentileSelection},
    foundation::core::VariableMode,
    table::model::{Column, THREADS, VECTOR_SIZE},
};

fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("unit_scheduler").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

// One test case, thread counts 1 and 2, vector sizes given per row.
fn table_without(sizes: &[f64], dropped: Option<&str>) -> ResultTable {
    let n = sizes.len() * 2;
    let threads: Vec<f64> = [1.0, 2.0]
        .iter()
        .flat_map(|t| std::iter::repeat_n(*t, sizes.len()))
        .collect();
    let vector: Vec<f64> = sizes.iter().chain(sizes).copied().collect();
    let throughput: Vec<f64> = threads
        .iter()
        .zip(&vector)
        .map(|(t, v)| t * 1e6 * v / (v + 64.0))
        .collect();
    let latency: Vec<f64> = vector.iter().map(|v| 1.0 + v / 100.0).collect();
    let columns = [
        (TEST_CASE, Column::Text(vec!["AES Encrypt".to_string(); n])),
        (THREADS, Column::Number(threads)),
        (VECTOR_SIZE, Column::Number(vector)),
        (LATENCY_AVG_VALUE, Column::Number(latency)),
        (LATENCY_AVG_ERROR, Column::Number(vec![0.1; n])),
        ("throughput global value", Column::Number(throughput)),
        ("throughput global error", Column::Number(vec![100.0; n])),
    ];
    ResultTable::from_columns(columns.into_iter().filter(|(name, _)| Some(*name) != dropped))
        .unwrap()
}

fn table(sizes: &[f64]) -> ResultTable {
    table_without(sizes, None)
}

fn config(dir: PathBuf) -> RenderConfig {
    RenderConfig {
        mode: VariableMode::Size,
        formats: FormatSelection::Svg,
        workers: 1,
        ..RenderConfig::new(dir)
    }
}

#[test]
fn states_are_terminal_only_when_finished() {
    assert!(!TaskState::Pending.is_terminal());
    assert!(!TaskState::InProgress.is_terminal());
    assert!(TaskState::Completed.is_terminal());
    assert!(TaskState::Aborted(AbortReason::Cancelled).is_terminal());
}

#[test]
fn summary_line_reports_counts() {
    let summary = RunSummary {
        completed: 6,
        artifacts: vec![PathBuf::from("a"); 12],
        ..RunSummary::default()
    };
    assert_eq!(
        summary.summary_line(Path::new("out")),
        "6 chart(s) completed, 12 file(s) written to out"
    );
    let interrupted = RunSummary {
        completed: 2,
        interrupted: true,
        ..summary
    };
    assert_eq!(
        interrupted.summary_line(Path::new("out")),
        "interrupted: 2 chart(s) completed before interruption"
    );
}

#[test]
fn interrupted_runs_leave_the_final_line_to_the_interrupt_handler() {
    let summary = RunSummary {
        completed: 3,
        artifacts: vec![PathBuf::from("a"); 3],
        ..RunSummary::default()
    };
    assert_eq!(
        summary.completion_line(Path::new("out")).as_deref(),
        Some("3 chart(s) completed, 3 file(s) written to out")
    );
    let interrupted = RunSummary {
        interrupted: true,
        ..summary
    };
    assert_eq!(interrupted.completion_line(Path::new("out")), None);
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let cfg = RenderConfig {
        workers: 0,
        ..config(PathBuf::from("unused"))
    };
    assert!(matches!(
        Scheduler::new(&cfg),
        Err(PerfgraphError::Validation(_))
    ));
}

#[test]
fn missing_measure_column_is_fatal_before_rendering() {
    let dir = scratch("schema");
    let t = table_without(&[8.0, 64.0], Some("throughput global error"));

    let cfg = config(dir.clone());
    let err = Scheduler::new(&cfg).unwrap().run(&t, None).unwrap_err();
    assert!(matches!(err, PerfgraphError::MissingColumn { .. }));
    assert!(err.to_string().contains("throughput global error"));
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
}

#[test]
fn colliding_file_names_are_fatal_before_rendering() {
    let dir = scratch("collision");
    let number = |v: f64| Column::Number(vec![v; 2]);
    let t = ResultTable::from_columns([
        (
            TEST_CASE,
            Column::Text(vec!["AES Encrypt".to_string(), "aes encrypt".to_string()]),
        ),
        (THREADS, number(1.0)),
        (VECTOR_SIZE, number(8.0)),
        (LATENCY_AVG_VALUE, number(1.0)),
        (LATENCY_AVG_ERROR, number(0.1)),
        ("throughput global value", number(1e6)),
        ("throughput global error", number(100.0)),
    ])
    .unwrap();

    let cfg = config(dir.clone());
    let scheduler = Scheduler::new(&cfg).unwrap();
    let err = scheduler.run(&t, None).unwrap_err();
    assert!(matches!(err, PerfgraphError::Validation(_)));
    assert!(err.to_string().contains("aes_encrypt-threads1.svg"));
    assert_eq!(scheduler.tracker().completed(), 0);
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
}

#[test]
fn text_percentile_column_disables_percentiles_for_the_run() {
    let dir = scratch("percentiles");
    let mut t = table(&[8.0, 64.0]);
    t.insert_column(
        Percentile::P95.column(),
        Column::Text(vec!["-".to_string(); 4]),
    )
    .unwrap();
    let cfg = RenderConfig {
        percentiles: PercentileSelection {
            p95: true,
            ..PercentileSelection::default()
        },
        ..config(dir)
    };
    let summary = Scheduler::new(&cfg).unwrap().run(&t, None).unwrap();
    assert!(summary.percentiles_disabled);
    assert_eq!(summary.completed, 2);
    assert_eq!(summary.failed, 0);
}

#[test]
fn write_failures_are_counted_not_propagated() {
    let dir = PathBuf::from("target")
        .join("unit_scheduler")
        .join("does-not-exist");
    let _ = std::fs::remove_dir_all(&dir);
    let cfg = config(dir);
    let summary = Scheduler::new(&cfg)
        .unwrap()
        .run(&table(&[8.0, 64.0]), None)
        .unwrap();
    assert_eq!(summary.tasks_total, 2);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.completed, 0);
    assert!(!summary.interrupted);
}

#[test]
fn failed_regression_fit_still_draws_the_chart() {
    let dir = scratch("fit");
    let cfg = RenderConfig {
        regression: true,
        ..config(dir.clone())
    };
    // A single vector size gives each model one distinct x value.
    let summary = Scheduler::new(&cfg)
        .unwrap()
        .run(&table(&[64.0]), None)
        .unwrap();
    assert_eq!(summary.completed, 2);
    assert_eq!(summary.fit_warnings, 4);
    assert!(dir.join("aes_encrypt-threads1.svg").exists());
}

#[test]
fn observer_sees_every_task_once() {
    let dir = scratch("observer");
    let cfg = RenderConfig {
        workers: 3,
        ..config(dir)
    };
    let seen = AtomicUsize::new(0);
    let summary = Scheduler::new(&cfg)
        .unwrap()
        .on_task(|r| {
            assert_eq!(r.state, TaskState::Completed);
            seen.fetch_add(1, Ordering::SeqCst);
        })
        .run(&table(&[8.0, 64.0, 512.0]), None)
        .unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 2);
    assert_eq!(summary.completed, 2);
    assert_eq!(summary.artifacts.len(), 2);
}

#[test]
fn cancelled_run_aborts_remaining_tasks() {
    let dir = scratch("cancelled");
    let cfg = config(dir.clone());
    let scheduler = Scheduler::new(&cfg).unwrap();
    scheduler.token().cancel();
    let summary = scheduler.run(&table(&[8.0, 64.0]), None).unwrap();
    assert!(summary.interrupted);
    assert_eq!(summary.aborted, 2);
    assert_eq!(summary.completed, 0);
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
}

#[test]
fn panic_payloads_become_messages() {
    fn formatted() {
        panic!("boom {}", 1);
    }
    fn opaque() {
        std::panic::panic_any(7u8);
    }
    let caught = std::panic::catch_unwind(formatted).unwrap_err();
    assert_eq!(panic_message(caught.as_ref()), "boom 1");
    let caught = std::panic::catch_unwind(opaque).unwrap_err();
    assert_eq!(panic_message(caught.as_ref()), "worker panicked");
}
