//! Fire behaviour physics: Rothermel surface spread and ember spotting

pub mod rothermel;
pub mod spotting;

pub use rothermel::{rothermel_spread_rate, FuelBed, SpreadComponents, SpreadLimits};
pub use spotting::{lofting_height, maximum_spotting_distance, SpotFireModel, SpottingConfig};
