//! Chart drawing and artifact output.
//!
//! Charts are drawn with plotters onto an SVG document and rasterized to PNG on demand. Writing
//! goes through [`artifact::write_tracked`] so the in-flight registry always knows which files
//! may be partial.

/// Deterministic filenames and tracked writes.
pub mod artifact;
/// Two-panel chart composition and the per-task renderer.
pub mod chart;
/// SVG to PNG rasterization.
pub mod raster;
/// Chart titles.
pub mod title;
