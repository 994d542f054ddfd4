//! Pressure classification and interpolation engine.
//!
//! This crate turns station readings and calibration tables into band
//! classifications, monthly fault tallies and pressure surfaces.

pub mod classify;
pub mod idw;
pub mod operation;
pub mod resample;
pub mod threshold;

#[cfg(test)]
mod properties;
