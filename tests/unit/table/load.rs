use std::path::Path;

use super::*;
use crate::table::model::{LATENCY_AVG_VALUE, THREADS};

#[test]
fn csv_infers_numeric_and_text_columns() {
    let csv = "test case,threads,latency average value,note\n\
               AES Encrypt,1,0.5,fast\n\
               AES Encrypt,2,,slow\n";
    let table = read_csv(csv.as_bytes()).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.numbers(THREADS).unwrap(), &[1.0, 2.0]);
    let lat = table.numbers(LATENCY_AVG_VALUE).unwrap();
    assert_eq!(lat[0], 0.5);
    assert!(lat[1].is_nan());
    assert_eq!(table.text("note").unwrap()[1], "slow");
}

#[test]
fn test_case_column_stays_text_even_when_numeric() {
    let csv = "test case,threads\n42,1\n";
    let table = read_csv(csv.as_bytes()).unwrap();
    assert_eq!(table.text(TEST_CASE).unwrap(), &["42".to_string()]);
}

#[test]
fn json_rows_fill_missing_cells_with_nan() {
    let json = r#"[
        {"test case": "RSA Signature", "threads": 1, "tps global value": 10.5},
        {"test case": "RSA Signature", "threads": 2}
    ]"#;
    let table = read_json(json.as_bytes()).unwrap();
    assert_eq!(table.len(), 2);
    let tps = table.numbers("tps global value").unwrap();
    assert_eq!(tps[0], 10.5);
    assert!(tps[1].is_nan());
}

#[test]
fn unknown_extension_is_a_load_error() {
    let err = load_table(Path::new("results.xlsx")).unwrap_err();
    assert!(matches!(err, PerfgraphError::Load(_)));
}

#[test]
fn malformed_json_is_a_load_error() {
    assert!(matches!(
        read_json("{".as_bytes()).unwrap_err(),
        PerfgraphError::Load(_)
    ));
}
