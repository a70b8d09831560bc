/// Measure selection by test-case name.
pub mod select;
