use super::*;
use crate::frame::builder::Band;
use crate::pipeline::plan::Task;

const SIZES: [f64; 6] = [8.0, 64.0, 256.0, 1024.0, 4096.0, 16384.0];

fn frame_from(x: &[f64], global: Vec<f64>, latency: Vec<f64>) -> Frame {
    let zeros = vec![0.0; x.len()];
    Frame {
        task: Task {
            test_case: "AES Encrypt".to_string(),
            value: 1.0,
        },
        x: x.to_vec(),
        latency: Band::from_error(latency, &zeros),
        global: Band::from_error(global.clone(), &zeros),
        rate: Band::from_error(global, &zeros),
        percentiles: vec![],
    }
}

#[test]
fn saturation_fit_recovers_known_parameters() {
    let truth = SaturationFit { a: 480.0, b: 300.0 };
    let y: Vec<f64> = SIZES.iter().map(|&x| truth.eval(x)).collect();
    let fit = fit_saturation(&SIZES, &y).unwrap();
    assert!((fit.a - truth.a).abs() / truth.a < 1e-4, "a = {}", fit.a);
    assert!((fit.b - truth.b).abs() / truth.b < 1e-4, "b = {}", fit.b);
}

#[test]
fn linear_fit_is_exact_on_a_line() {
    let y: Vec<f64> = SIZES.iter().map(|x| 0.25 + 0.001 * x).collect();
    let fit = fit_linear(&SIZES, &y).unwrap();
    assert!((fit.intercept - 0.25).abs() < 1e-9);
    assert!((fit.slope - 0.001).abs() < 1e-12);
}

#[test]
fn single_distinct_x_fails_both_models() {
    assert!(matches!(
        fit_saturation(&[8.0, 8.0], &[1.0, 2.0]).unwrap_err(),
        PerfgraphError::Fit(_)
    ));
    assert!(matches!(
        fit_linear(&[8.0], &[1.0]).unwrap_err(),
        PerfgraphError::Fit(_)
    ));
}

#[test]
fn fit_frame_rescales_throughput_curve() {
    let truth = SaturationFit { a: 480.0, b: 300.0 };
    let global: Vec<f64> = SIZES
        .iter()
        .map(|&x| truth.eval(x) / THROUGHPUT_SCALE)
        .collect();
    let latency: Vec<f64> = SIZES.iter().map(|x| 0.1 + 0.002 * x).collect();
    let report = fit_frame(&frame_from(&SIZES, global.clone(), latency));

    assert!(report.failures.is_empty(), "{:?}", report.failures);
    let curve = report.overlay.throughput.unwrap();
    assert_eq!(curve.x.len(), 100);
    assert_eq!(curve.x[0], 8.0);
    assert_eq!(curve.x[99], 16384.0);
    let last = curve.y[99];
    assert!((last - global[5]).abs() / global[5] < 1e-3);
    assert!(report.overlay.latency.is_some());
}

#[test]
fn failed_fit_is_reported_not_raised() {
    let report = fit_frame(&frame_from(&[64.0], vec![100.0], vec![1.0]));
    assert_eq!(report.overlay, RegressionOverlay::default());
    assert_eq!(report.failures.len(), 2);
}
