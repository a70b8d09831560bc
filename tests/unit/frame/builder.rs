use super::*;
use crate::measure::select::select_measure;
use crate::table::model::{Column, THREADS, VECTOR_SIZE};
use crate::PerfgraphError;

fn aes_table() -> ResultTable {
    ResultTable::from_columns([
        (
            TEST_CASE,
            Column::Text(vec!["AES Encrypt".to_string(); 4]),
        ),
        (THREADS, Column::Number(vec![1.0, 1.0, 1.0, 2.0])),
        (VECTOR_SIZE, Column::Number(vec![64.0, 8.0, 256.0, 8.0])),
        (LATENCY_AVG_VALUE, Column::Number(vec![3.0, 2.0, 4.0, 2.5])),
        (LATENCY_AVG_ERROR, Column::Number(vec![0.5, 5.0, 0.5, 0.1])),
        (
            "throughput global value",
            Column::Number(vec![6400.0, 800.0, 12800.0, 1600.0]),
        ),
        (
            "throughput global error",
            Column::Number(vec![64.0, 1000.0, 128.0, 16.0]),
        ),
    ])
    .unwrap()
}

fn task(value: f64) -> Task {
    Task {
        test_case: "AES Encrypt".to_string(),
        value,
    }
}

#[test]
fn frame_selects_task_rows_sorted_by_x() {
    let keys = select_measure("AES Encrypt").keys;
    let frame = build_frame(&aes_table(), &task(1.0), VariableMode::Size, &keys, &[]).unwrap();
    assert_eq!(frame.x, vec![8.0, 64.0, 256.0]);
    assert_eq!(frame.latency.value, vec![2.0, 3.0, 4.0]);
    assert_eq!(frame.global.value, vec![800.0, 6400.0, 12800.0]);
    assert!(frame.percentiles.is_empty());
}

#[test]
fn lower_bounds_are_clamped_at_zero() {
    let keys = select_measure("AES Encrypt").keys;
    let frame = build_frame(&aes_table(), &task(1.0), VariableMode::Size, &keys, &[]).unwrap();
    // latency 2 ± 5 and throughput 800 ± 1000 would go negative
    assert_eq!(frame.latency.lower[0], 0.0);
    assert_eq!(frame.latency.upper[0], 7.0);
    assert_eq!(frame.global.lower[0], 0.0);
    assert_eq!(frame.rate.lower[0], 0.0);
    for band in [&frame.latency, &frame.global, &frame.rate] {
        assert!(band.lower.iter().all(|v| *v >= 0.0));
    }
}

#[test]
fn rate_is_measure_over_x_with_bounds() {
    let keys = select_measure("AES Encrypt").keys;
    let frame = build_frame(&aes_table(), &task(1.0), VariableMode::Size, &keys, &[]).unwrap();
    assert_eq!(frame.rate.value, vec![100.0, 100.0, 50.0]);
    assert_eq!(frame.rate.upper[1], (6400.0 + 64.0) / 64.0);
    assert_eq!(frame.rate.lower[1], (6400.0 - 64.0) / 64.0);
}

#[test]
fn missing_percentiles_degrade_without_failing() {
    let keys = select_measure("AES Encrypt").keys;
    let frame = build_frame(
        &aes_table(),
        &task(1.0),
        VariableMode::Size,
        &keys,
        &[Percentile::P95, Percentile::P99],
    )
    .unwrap();
    assert!(frame.percentiles.is_empty());
}

#[test]
fn text_percentile_column_counts_as_missing() {
    let mut table = aes_table();
    table
        .insert_column(
            Percentile::P95.column(),
            Column::Text(vec!["n/a".to_string(); 4]),
        )
        .unwrap();
    assert_eq!(
        missing_percentile_columns(&table, &[Percentile::P95]),
        vec![Percentile::P95.column()]
    );

    let keys = select_measure("AES Encrypt").keys;
    let frame = build_frame(&table, &task(1.0), VariableMode::Size, &keys, &[Percentile::P95])
        .unwrap();
    assert!(frame.percentiles.is_empty());
    assert_eq!(frame.x, vec![8.0, 64.0, 256.0]);
}

#[test]
fn present_percentiles_are_carried() {
    let mut table = aes_table();
    table
        .insert_column(
            Percentile::P95.column(),
            Column::Number(vec![3.5, 2.5, 4.5, 3.0]),
        )
        .unwrap();
    let keys = select_measure("AES Encrypt").keys;
    let frame = build_frame(&table, &task(1.0), VariableMode::Size, &keys, &[Percentile::P95])
        .unwrap();
    assert_eq!(
        frame.percentiles,
        vec![(Percentile::P95, vec![2.5, 3.5, 4.5])]
    );
}

#[test]
fn missing_measure_column_is_a_schema_error() {
    let keys = select_measure("RSA Signature").keys;
    let err = build_frame(&aes_table(), &task(1.0), VariableMode::Size, &keys, &[]).unwrap_err();
    match err {
        PerfgraphError::MissingColumn { column, .. } => assert_eq!(column, "tps global value"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn input_table_is_unchanged() {
    let table = aes_table();
    let before = table.clone();
    let keys = select_measure("AES Encrypt").keys;
    build_frame(&table, &task(8.0), VariableMode::Threads, &keys, &[]).unwrap();
    assert_eq!(table, before);
}
