//! Time axis handling for Strata: tick-to-calendar mapping, dense cumulative
//! matrices and calendar resampling with granularity fallback.

pub mod calendar;
pub mod matrix;
pub mod resample;
