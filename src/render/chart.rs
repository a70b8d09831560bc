//! Two-panel benchmark chart composition.
//!
//! The top panel carries the global measure on the left axis and average latency on the right
//! axis, plus optional latency percentiles on a third axis further right. The bottom panel
//! carries the per-item rate. Both panels share the x-axis range and plotting width.

use std::ops::Range;

use plotters::chart::DualCoordChartContext;
use plotters::coord::{Shift, cartesian::Cartesian2d, types::RangedCoordf64};
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::{
    config::RenderConfig,
    fit::regression::RegressionOverlay,
    foundation::core::OutputFormat,
    foundation::error::{PerfgraphError, PerfgraphResult},
    frame::builder::{Band, Frame},
    measure::select::{Measure, MeasureSelection},
    pipeline::tracker::FileTracker,
    render::{
        artifact::{Artifact, WriteOutcome, write_tracked},
        raster::Rasterizer,
        title::{chart_title, split_half},
    },
};

/// Chart width in pixels.
pub const WIDTH: u32 = 1600;
/// Chart height in pixels.
pub const HEIGHT: u32 = 1200;

const TITLE_HEIGHT: u32 = 110;
const UPPER_HEIGHT: u32 = 640;
const PERCENTILE_STRIP: u32 = 150;
const MARGIN: u32 = 20;
const X_LABEL_AREA: u32 = 50;
const Y_LABEL_AREA: u32 = 120;

const TITLE_FONT_SIZE: u32 = 32;
const AXIS_LABEL_FONT_SIZE: u32 = 22;
const TICK_LABEL_FONT_SIZE: u32 = 16;
const LEGEND_FONT_SIZE: u32 = 16;

const MEASURE_COLOR: RGBColor = RGBColor(0x1f, 0x77, 0xb4);
const LATENCY_COLOR: RGBColor = RGBColor(0xd6, 0x27, 0x28);
const RATE_COLOR: RGBColor = RGBColor(0x2c, 0xa0, 0x2c);
const PERCENTILE_COLORS: [RGBColor; 3] = [
    RGBColor(0x94, 0x67, 0xbd),
    RGBColor(0x8c, 0x56, 0x4b),
    RGBColor(0xe3, 0x77, 0xc2),
];
const THROUGHPUT_FIT_COLOR: RGBColor = RGBColor(0xff, 0x7f, 0x0e);
const LATENCY_FIT_COLOR: RGBColor = RGBColor(0x7f, 0x7f, 0x7f);

// (dash, gap) in pixels.
const COMPARISON_DASH: (u32, u32) = (8, 4);
const FIT_DASH: (u32, u32) = (2, 4);

type Panel<'a, 'b> = DualCoordChartContext<
    'a,
    SVGBackend<'b>,
    Cartesian2d<RangedCoordf64, RangedCoordf64>,
    Cartesian2d<RangedCoordf64, RangedCoordf64>,
>;

/// Everything one chart is drawn from.
#[derive(Clone, Copy, Debug)]
pub struct ChartInput<'a> {
    /// Primary data.
    pub frame: &'a Frame,
    /// Measure plotted for the task's test case.
    pub selection: &'a MeasureSelection,
    /// Same task from the comparison table, if any.
    pub comparison: Option<&'a Frame>,
    /// Fitted curves, if regression is enabled and any fit succeeded.
    pub regression: Option<&'a RegressionOverlay>,
}

/// Compose the chart as an SVG document.
pub fn compose_chart(input: &ChartInput<'_>, config: &RenderConfig) -> PerfgraphResult<String> {
    let mut svg = String::new();
    draw_chart(&mut svg, input, config)
        .map_err(|e| PerfgraphError::render(format!("compose chart: {e:#}")))?;
    Ok(svg)
}

/// Composes, encodes and writes the charts of one task.
#[derive(Clone, Copy, Debug)]
pub struct ChartRenderer<'a> {
    config: &'a RenderConfig,
    rasterizer: &'a Rasterizer,
}

impl<'a> ChartRenderer<'a> {
    /// Renderer for one run.
    pub fn new(config: &'a RenderConfig, rasterizer: &'a Rasterizer) -> Self {
        Self { config, rasterizer }
    }

    /// Draw the chart and write one artifact per configured format.
    ///
    /// Every format is encoded in memory first, so the tracked window only covers disk writes.
    pub fn render(
        &self,
        input: &ChartInput<'_>,
        tracker: &FileTracker,
    ) -> PerfgraphResult<WriteOutcome> {
        let svg = compose_chart(input, self.config)?;
        let task = &input.frame.task;

        let mut payloads = Vec::new();
        for &format in self.config.formats.formats() {
            let bytes = match format {
                OutputFormat::Svg => svg.as_bytes().to_vec(),
                OutputFormat::Png => self.rasterizer.png_bytes(&svg)?,
            };
            let artifact =
                Artifact::for_task(&self.config.output_dir, task, self.config.mode, format);
            payloads.push((artifact, bytes));
        }
        write_tracked(tracker, payloads)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Axis {
    Left,
    Right,
}

/// One plotted line with its legend entry.
struct Trace<'t> {
    xs: &'t [f64],
    ys: Vec<f64>,
    label: String,
    color: RGBColor,
    width: u32,
    dash: Option<(u32, u32)>,
    markers: bool,
}

impl<'t> Trace<'t> {
    fn solid(xs: &'t [f64], ys: &[f64], label: String, color: RGBColor) -> Self {
        Self {
            xs,
            ys: ys.to_vec(),
            label,
            color,
            width: 3,
            dash: None,
            markers: true,
        }
    }

    fn dashed(self, dash: (u32, u32)) -> Self {
        Self {
            width: 2,
            dash: Some(dash),
            ..self
        }
    }

    fn without_markers(self) -> Self {
        Self {
            markers: false,
            ..self
        }
    }
}

fn draw_chart(
    svg: &mut String,
    input: &ChartInput<'_>,
    config: &RenderConfig,
) -> anyhow::Result<()> {
    let frame = input.frame;
    let root = SVGBackend::with_string(svg, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let (title_area, body) = root.split_vertically(TITLE_HEIGHT);
    draw_title(&title_area, input, config)?;
    let (upper, lower) = body.split_vertically(UPPER_HEIGHT);

    let labels = config.comparison.as_ref();
    let comparison = input.comparison.filter(|_| labels.is_some());
    let tag = |base: &str, secondary: bool| match labels {
        Some(l) if secondary => format!("{base} ({})", l.secondary),
        Some(l) => format!("{base} ({})", l.primary),
        None => base.to_string(),
    };

    let xs = std::iter::once(frame.x.as_slice()).chain(comparison.map(|c| c.x.as_slice()));
    let x_range = padded_range(xs);
    let has_percentiles = !frame.percentiles.is_empty();

    // Top panel: measure (left), latency (right), percentiles (far right).
    let fit = input.regression;
    let measure_range = value_range(
        band_series(&frame.global, config.error_regions)
            .chain(comparison.map(|c| c.global.value.as_slice()))
            .chain(fit.and_then(|f| f.throughput.as_ref()).map(|c| c.y.as_slice())),
    );
    let latency_range = value_range(
        band_series(&frame.latency, config.error_regions)
            .chain(comparison.map(|c| c.latency.value.as_slice()))
            .chain(fit.and_then(|f| f.latency.as_ref()).map(|c| c.y.as_slice())),
    );

    let (upper_main, upper_strip) = split_strip(&upper, has_percentiles);
    let mut chart = panel(&upper_main, &x_range, &measure_range, &latency_range)?;
    chart
        .configure_mesh()
        .light_line_style(WHITE)
        .x_labels(10)
        .y_labels(6)
        .y_desc(measure_axis_label(input.selection))
        .y_label_formatter(&|v| tick_label(*v))
        .label_style(("sans-serif", TICK_LABEL_FONT_SIZE))
        .axis_desc_style(("sans-serif", AXIS_LABEL_FONT_SIZE))
        .draw()?;
    chart
        .configure_secondary_axes()
        .y_labels(6)
        .y_desc("Latency (ms)")
        .y_label_formatter(&|v| tick_label(*v))
        .label_style(("sans-serif", TICK_LABEL_FONT_SIZE))
        .axis_desc_style(("sans-serif", AXIS_LABEL_FONT_SIZE))
        .draw()?;

    let measure_name = measure_label(input.selection.measure);
    if config.error_regions {
        draw_band(&mut chart, Axis::Left, &frame.x, &frame.global, MEASURE_COLOR)?;
        draw_band(&mut chart, Axis::Right, &frame.x, &frame.latency, LATENCY_COLOR)?;
    }
    let mut traces = vec![
        (
            Axis::Left,
            Trace::solid(&frame.x, &frame.global.value, tag(measure_name, false), MEASURE_COLOR),
        ),
        (
            Axis::Right,
            Trace::solid(&frame.x, &frame.latency.value, tag("Latency", false), LATENCY_COLOR),
        ),
    ];
    if let Some(c) = comparison {
        traces.push((
            Axis::Left,
            Trace::solid(&c.x, &c.global.value, tag(measure_name, true), MEASURE_COLOR)
                .dashed(COMPARISON_DASH),
        ));
        traces.push((
            Axis::Right,
            Trace::solid(&c.x, &c.latency.value, tag("Latency", true), LATENCY_COLOR)
                .dashed(COMPARISON_DASH),
        ));
    }

    if let Some(strip) = upper_strip {
        let series = frame.percentiles.iter().map(|(_, v)| v.as_slice());
        let percentile_range = value_range(series);
        draw_percentile_axis(&strip, &percentile_range)?;
        for ((p, values), color) in frame.percentiles.iter().zip(PERCENTILE_COLORS) {
            // Drawn in measure coordinates, read against the percentile axis.
            let ys: Vec<f64> = values
                .iter()
                .map(|&v| rescale(v, &percentile_range, &measure_range))
                .collect();
            let label = tag(&format!("Latency {}", p.label()), false);
            let mut trace = Trace::solid(&frame.x, &ys, label, color);
            trace.width = 2;
            traces.push((Axis::Left, trace));
        }
    }

    if let Some(fit) = fit {
        if let Some(curve) = &fit.throughput {
            let label = format!("{measure_name} fit");
            let trace = Trace::solid(&curve.x, &curve.y, label, THROUGHPUT_FIT_COLOR);
            traces.push((Axis::Left, trace.dashed(FIT_DASH).without_markers()));
        }
        if let Some(curve) = &fit.latency {
            let label = "Latency fit".to_string();
            let trace = Trace::solid(&curve.x, &curve.y, label, LATENCY_FIT_COLOR);
            traces.push((Axis::Right, trace.dashed(FIT_DASH).without_markers()));
        }
    }
    for (axis, trace) in traces {
        draw_trace(&mut chart, axis, trace)?;
    }
    draw_legend(&mut chart)?;

    // Bottom panel: per-item rate, laid out like the top panel so x positions line up.
    let rate_range = value_range(
        band_series(&frame.rate, config.error_regions)
            .chain(comparison.map(|c| c.rate.value.as_slice())),
    );
    let rate_name = config.mode.rate_label(input.selection.measure.name());

    let (lower_main, _) = split_strip(&lower, has_percentiles);
    let mut chart = panel(&lower_main, &x_range, &rate_range, &rate_range)?;
    chart
        .configure_mesh()
        .light_line_style(WHITE)
        .x_labels(10)
        .y_labels(6)
        .x_desc(config.mode.x_label())
        .y_desc(rate_name.as_str())
        .y_label_formatter(&|v| tick_label(*v))
        .label_style(("sans-serif", TICK_LABEL_FONT_SIZE))
        .axis_desc_style(("sans-serif", AXIS_LABEL_FONT_SIZE))
        .draw()?;

    if config.error_regions {
        draw_band(&mut chart, Axis::Left, &frame.x, &frame.rate, RATE_COLOR)?;
    }
    let trace = Trace::solid(&frame.x, &frame.rate.value, tag(&rate_name, false), RATE_COLOR);
    draw_trace(&mut chart, Axis::Left, trace)?;
    if let Some(c) = comparison {
        let trace = Trace::solid(&c.x, &c.rate.value, tag(&rate_name, true), RATE_COLOR);
        draw_trace(&mut chart, Axis::Left, trace.dashed(COMPARISON_DASH))?;
    }
    draw_legend(&mut chart)?;

    root.present()?;
    Ok(())
}

type Area<'b> = DrawingArea<SVGBackend<'b>, Shift>;

fn split_strip<'b>(area: &Area<'b>, strip: bool) -> (Area<'b>, Option<Area<'b>>) {
    if strip {
        let (main, strip) = area.split_horizontally(WIDTH - PERCENTILE_STRIP);
        (main, Some(strip))
    } else {
        (area.clone(), None)
    }
}

fn panel<'a, 'b>(
    area: &'a Area<'b>,
    x: &Range<f64>,
    left: &Range<f64>,
    right: &Range<f64>,
) -> anyhow::Result<Panel<'a, 'b>> {
    let chart = ChartBuilder::on(area)
        .margin(MARGIN)
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA)
        .right_y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(x.clone(), left.clone())?
        .set_secondary_coord(x.clone(), right.clone());
    Ok(chart)
}

fn draw_title(
    area: &Area<'_>,
    input: &ChartInput<'_>,
    config: &RenderConfig,
) -> anyhow::Result<()> {
    let task = &input.frame.task;
    let title = chart_title(&task.test_case, config.mode, task.value);
    let (head, tail) = split_half(&title);
    let style = ("sans-serif", TITLE_FONT_SIZE)
        .into_font()
        .style(FontStyle::Bold)
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    let cx = WIDTH as i32 / 2;
    area.draw(&Text::new(head.to_string(), (cx, 38), style.clone()))?;
    if !tail.is_empty() {
        area.draw(&Text::new(tail.to_string(), (cx, 76), style))?;
    }
    Ok(())
}

// A right-hand axis with an empty plotting strip; the series live on the main panel.
fn draw_percentile_axis(area: &Area<'_>, range: &Range<f64>) -> anyhow::Result<()> {
    let mut axis = ChartBuilder::on(area)
        .margin_top(MARGIN)
        .margin_bottom(MARGIN)
        .margin_right(MARGIN)
        .x_label_area_size(X_LABEL_AREA)
        .right_y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(0f64..1f64, range.clone())?
        .set_secondary_coord(0f64..1f64, range.clone());
    axis
        .configure_secondary_axes()
        .y_labels(6)
        .y_desc("Latency percentiles (ms)")
        .y_label_formatter(&|v| tick_label(*v))
        .label_style(("sans-serif", TICK_LABEL_FONT_SIZE))
        .axis_desc_style(("sans-serif", AXIS_LABEL_FONT_SIZE))
        .draw()?;
    Ok(())
}

fn draw_band(
    chart: &mut Panel<'_, '_>,
    axis: Axis,
    xs: &[f64],
    band: &Band,
    color: RGBColor,
) -> anyhow::Result<()> {
    for points in band_polygons(xs, &band.lower, &band.upper) {
        let polygon = std::iter::once(Polygon::new(points, color.mix(0.2).filled()));
        match axis {
            Axis::Left => chart.draw_series(polygon)?,
            Axis::Right => chart.draw_secondary_series(polygon)?,
        };
    }
    Ok(())
}

fn draw_trace(chart: &mut Panel<'_, '_>, axis: Axis, trace: Trace<'_>) -> anyhow::Result<()> {
    let style = trace.color.stroke_width(trace.width);
    for run in finite_runs(trace.xs, &trace.ys) {
        match (axis, trace.dash) {
            (Axis::Left, None) => chart.draw_series(LineSeries::new(run, style))?,
            (Axis::Right, None) => chart.draw_secondary_series(LineSeries::new(run, style))?,
            (Axis::Left, Some((dash, gap))) => {
                chart.draw_series(DashedLineSeries::new(run, dash, gap, style))?
            }
            (Axis::Right, Some((dash, gap))) => {
                chart.draw_secondary_series(DashedLineSeries::new(run, dash, gap, style))?
            }
        };
    }

    let markers = finite_runs(trace.xs, &trace.ys)
        .into_iter()
        .flatten()
        .filter(|_| trace.markers)
        .map(|p| Circle::new(p, 4, trace.color.filled()));
    let anno = match axis {
        Axis::Left => chart.draw_series(markers)?,
        Axis::Right => chart.draw_secondary_series(markers)?,
    };
    anno.label(trace.label)
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 24, y)], style));
    Ok(())
}

fn draw_legend<'a, 'b: 'a>(chart: &mut Panel<'a, 'b>) -> anyhow::Result<()> {
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .label_font(("sans-serif", LEGEND_FONT_SIZE))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

fn measure_label(measure: Measure) -> &'static str {
    match measure {
        Measure::Tps => "Transactions per second",
        Measure::Throughput => "Throughput",
    }
}

fn measure_axis_label(selection: &MeasureSelection) -> String {
    format!("{} ({})", measure_label(selection.measure), selection.unit())
}

fn band_series(band: &Band, with_bounds: bool) -> impl Iterator<Item = &[f64]> {
    let bounds = with_bounds.then_some([band.lower.as_slice(), band.upper.as_slice()]);
    std::iter::once(band.value.as_slice()).chain(bounds.into_iter().flatten())
}

fn extent<'a>(series: impl IntoIterator<Item = &'a [f64]>) -> Option<(f64, f64)> {
    series
        .into_iter()
        .flat_map(|s| s.iter().copied())
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Value-axis range: starts at zero for non-negative data, with headroom above the maximum.
fn value_range<'a>(series: impl IntoIterator<Item = &'a [f64]>) -> Range<f64> {
    let (lo, hi) = extent(series).unwrap_or((0.0, 1.0));
    let lo = lo.min(0.0);
    let hi = if hi > lo { hi } else { lo + 1.0 };
    lo..hi + (hi - lo) * 0.08
}

/// X range with a 5% margin on both sides; a single point gets a unit-wide window.
fn padded_range<'a>(series: impl IntoIterator<Item = &'a [f64]>) -> Range<f64> {
    match extent(series) {
        None => 0.0..1.0,
        Some((lo, hi)) if hi > lo => {
            let pad = (hi - lo) * 0.05;
            lo - pad..hi + pad
        }
        Some((v, _)) => {
            let pad = if v == 0.0 { 1.0 } else { v.abs() * 0.5 };
            v - pad..v + pad
        }
    }
}

fn rescale(v: f64, from: &Range<f64>, to: &Range<f64>) -> f64 {
    to.start + (v - from.start) / (from.end - from.start) * (to.end - to.start)
}

/// Compact tick label with SI suffixes above a thousand.
fn tick_label(v: f64) -> String {
    let a = v.abs();
    let (scaled, suffix) = if a >= 1e9 {
        (v / 1e9, "G")
    } else if a >= 1e6 {
        (v / 1e6, "M")
    } else if a >= 1e3 {
        (v / 1e3, "k")
    } else {
        (v, "")
    };
    let text = format!("{scaled:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    let text = if text == "-0" { "0" } else { text };
    format!("{text}{suffix}")
}

/// Runs of consecutive finite points; a non-finite value breaks the line.
fn finite_runs(xs: &[f64], ys: &[f64]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut run = Vec::new();
    for (&x, &y) in xs.iter().zip(ys) {
        if x.is_finite() && y.is_finite() {
            run.push((x, y));
        } else if !run.is_empty() {
            runs.push(std::mem::take(&mut run));
        }
    }
    if !run.is_empty() {
        runs.push(run);
    }
    runs
}

/// Closed region between `lower` and `upper`, one polygon per run of finite points.
fn band_polygons(xs: &[f64], lower: &[f64], upper: &[f64]) -> Vec<Vec<(f64, f64)>> {
    let finite = |i: usize| xs[i].is_finite() && lower[i].is_finite() && upper[i].is_finite();
    let n = xs.len().min(lower.len()).min(upper.len());

    let mut polygons = Vec::new();
    let mut i = 0;
    while i < n {
        if !finite(i) {
            i += 1;
            continue;
        }
        let start = i;
        while i < n && finite(i) {
            i += 1;
        }
        let run = start..i;
        let mut points: Vec<(f64, f64)> = run.clone().map(|j| (xs[j], upper[j])).collect();
        points.extend(run.rev().map(|j| (xs[j], lower[j])));
        polygons.push(points);
    }
    polygons
}

#[cfg(test)]
#[path = "../../tests/unit/render/chart.rs"]
mod tests;
