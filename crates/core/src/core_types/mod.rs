//! Core types: fuel models and units

pub mod fuel;
pub mod units;

pub use fuel::{FuelModel, FuelParameters, DEFAULT_HEAT_CONTENT};
pub use units::*;
