//! Least-squares regression curves overlaid on size-mode charts.
//!
//! Two fixed models are fit per frame:
//!
//! - throughput saturation, `y = a·x / (x + b)`, solved with Levenberg–Marquardt
//! - latency growth, `y = a + b·x`, solved in closed form
//!
//! Each model fails independently; a failure only removes that model's overlay.

use crate::{
    foundation::error::{PerfgraphError, PerfgraphResult},
    frame::builder::Frame,
};

/// Factor applied to measure values before fitting, undone when sampling the curve.
pub const THROUGHPUT_SCALE: f64 = 1e-6;

const CURVE_SAMPLES: usize = 100;
const MAX_ITERATIONS: usize = 200;
const MAX_DAMPING: f64 = 1e12;
const TOLERANCE: f64 = 1e-10;

/// Fitted `y = a·x / (x + b)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SaturationFit {
    /// Asymptotic value.
    pub a: f64,
    /// Half-saturation point.
    pub b: f64,
}

impl SaturationFit {
    /// Evaluate the model at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        self.a * x / (x + self.b)
    }
}

/// Fitted `y = intercept + slope·x`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearFit {
    /// Value at `x = 0`.
    pub intercept: f64,
    /// Growth per unit of x.
    pub slope: f64,
}

impl LinearFit {
    /// Evaluate the model at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Sampled model curve, ready to plot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Curve {
    /// Sample positions, ascending.
    pub x: Vec<f64>,
    /// Model values.
    pub y: Vec<f64>,
}

impl Curve {
    fn sample(lo: f64, hi: f64, f: impl Fn(f64) -> f64) -> Self {
        let n = CURVE_SAMPLES;
        let x: Vec<f64> = (0..n)
            .map(|i| lo + (hi - lo) * (i as f64) / ((n - 1) as f64))
            .collect();
        let y = x.iter().map(|&v| f(v)).collect();
        Self { x, y }
    }
}

/// Curves to overlay on one chart. Either may be missing if its fit failed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegressionOverlay {
    /// Saturation curve over the global measure, in measure units.
    pub throughput: Option<Curve>,
    /// Linear curve over average latency.
    pub latency: Option<Curve>,
}

/// Overlay plus the fit failures that shaped it.
#[derive(Debug, Default)]
pub struct FitReport {
    /// Curves that could be fitted.
    pub overlay: RegressionOverlay,
    /// One [`PerfgraphError::Fit`] per model that failed.
    pub failures: Vec<PerfgraphError>,
}

/// Fit both models against a frame's series.
pub fn fit_frame(frame: &Frame) -> FitReport {
    let mut report = FitReport::default();
    let Some((lo, hi)) = finite_range(&frame.x) else {
        report
            .failures
            .push(PerfgraphError::fit("frame has no finite x values"));
        return report;
    };

    let scaled: Vec<f64> = frame
        .global
        .value
        .iter()
        .map(|v| v * THROUGHPUT_SCALE)
        .collect();
    match fit_saturation(&frame.x, &scaled) {
        Ok(fit) => {
            report.overlay.throughput =
                Some(Curve::sample(lo, hi, |x| fit.eval(x) / THROUGHPUT_SCALE));
        }
        Err(e) => report.failures.push(e),
    }

    match fit_linear(&frame.x, &frame.latency.value) {
        Ok(fit) => report.overlay.latency = Some(Curve::sample(lo, hi, |x| fit.eval(x))),
        Err(e) => report.failures.push(e),
    }

    report
}

/// Least-squares fit of `y = a·x / (x + b)` (Levenberg–Marquardt).
pub fn fit_saturation(x: &[f64], y: &[f64]) -> PerfgraphResult<SaturationFit> {
    let (xs, ys) = finite_pairs(x, y);
    require_distinct(&xs, "throughput model")?;

    let y_max = ys.iter().copied().fold(f64::MIN, f64::max);
    let half = y_max / 2.0;
    let b0 = xs
        .iter()
        .zip(&ys)
        .min_by(|(_, a), (_, b)| (*a - half).abs().total_cmp(&(*b - half).abs()))
        .map(|(x, _)| *x)
        .unwrap_or(1.0);
    let mut p = [y_max, if b0 > 0.0 { b0 } else { 1.0 }];

    let sse = |p: &[f64; 2]| -> f64 {
        xs.iter()
            .zip(&ys)
            .map(|(x, y)| {
                let r = y - p[0] * x / (x + p[1]);
                r * r
            })
            .sum()
    };

    let mut cost = sse(&p);
    let mut lambda = 1e-3;
    for _ in 0..MAX_ITERATIONS {
        let mut jtj = [[0.0f64; 2]; 2];
        let mut jtr = [0.0f64; 2];
        for (x, y) in xs.iter().zip(&ys) {
            let d = x + p[1];
            let j = [x / d, -p[0] * x / (d * d)];
            let r = y - p[0] * x / d;
            for row in 0..2 {
                jtr[row] += j[row] * r;
                for col in 0..2 {
                    jtj[row][col] += j[row] * j[col];
                }
            }
        }

        loop {
            let a11 = jtj[0][0] + lambda * jtj[0][0].max(1e-12);
            let a22 = jtj[1][1] + lambda * jtj[1][1].max(1e-12);
            let a12 = jtj[0][1];
            let det = a11 * a22 - a12 * a12;
            if det.is_finite() && det.abs() > f64::MIN_POSITIVE {
                let step = [
                    (jtr[0] * a22 - a12 * jtr[1]) / det,
                    (a11 * jtr[1] - a12 * jtr[0]) / det,
                ];
                let candidate = [p[0] + step[0], p[1] + step[1]];
                let candidate_cost = sse(&candidate);
                if candidate_cost.is_finite() && candidate_cost <= cost {
                    let small_step = step
                        .iter()
                        .zip(&candidate)
                        .all(|(s, c)| s.abs() <= TOLERANCE * c.abs().max(1.0));
                    let converged = candidate_cost == 0.0 || (small_step && lambda <= 1.0);
                    p = candidate;
                    cost = candidate_cost;
                    lambda = (lambda / 10.0).max(1e-12);
                    if converged {
                        return checked_saturation(p, &xs);
                    }
                    break;
                }
            }
            lambda *= 10.0;
            if lambda > MAX_DAMPING {
                // No step improves the residual: we are sitting on a minimum.
                return checked_saturation(p, &xs);
            }
        }
    }

    Err(PerfgraphError::fit(format!(
        "throughput model did not converge after {MAX_ITERATIONS} iterations"
    )))
}

/// Ordinary least-squares fit of `y = a + b·x`.
pub fn fit_linear(x: &[f64], y: &[f64]) -> PerfgraphResult<LinearFit> {
    let (xs, ys) = finite_pairs(x, y);
    require_distinct(&xs, "latency model")?;

    let n = xs.len() as f64;
    let mx = xs.iter().sum::<f64>() / n;
    let my = ys.iter().sum::<f64>() / n;
    let sxx: f64 = xs.iter().map(|x| (x - mx) * (x - mx)).sum();
    let sxy: f64 = xs.iter().zip(&ys).map(|(x, y)| (x - mx) * (y - my)).sum();
    let slope = sxy / sxx;
    let intercept = my - slope * mx;
    if !slope.is_finite() || !intercept.is_finite() {
        return Err(PerfgraphError::fit("latency model produced non-finite coefficients"));
    }
    Ok(LinearFit { intercept, slope })
}

fn checked_saturation(p: [f64; 2], xs: &[f64]) -> PerfgraphResult<SaturationFit> {
    let fit = SaturationFit { a: p[0], b: p[1] };
    if !fit.a.is_finite() || !fit.b.is_finite() {
        return Err(PerfgraphError::fit("throughput model produced non-finite coefficients"));
    }
    let (lo, hi) = finite_range(xs).unwrap_or((0.0, 0.0));
    if -fit.b >= lo && -fit.b <= hi {
        return Err(PerfgraphError::fit(
            "throughput model has a pole inside the fitted range",
        ));
    }
    Ok(fit)
}

fn finite_pairs(x: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>) {
    x.iter()
        .zip(y)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(x, y)| (*x, *y))
        .unzip()
}

fn require_distinct(xs: &[f64], model: &str) -> PerfgraphResult<()> {
    let mut sorted = xs.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    if sorted.len() < 2 {
        return Err(PerfgraphError::fit(format!(
            "{model} needs at least 2 distinct x values, got {}",
            sorted.len()
        )));
    }
    Ok(())
}

fn finite_range(xs: &[f64]) -> Option<(f64, f64)> {
    xs.iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[cfg(test)]
#[path = "../../tests/unit/fit/regression.rs"]
mod tests;
