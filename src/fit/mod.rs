/// Saturation and linear regression fits.
pub mod regression;
