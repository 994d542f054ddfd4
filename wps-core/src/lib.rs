pub mod band;
pub mod calibration;
pub mod error;
pub mod hour_range;
pub mod reading;
pub mod regime;
pub mod station;
pub mod store;
