//! Error types for the spread engine
//!
//! Per-cell fuel problems are absorbed (the cell becomes unburnable and the
//! anomaly is reported in run metadata). Configuration problems refuse to
//! start a run. Environment problems halt a run at the last completed tick.

use std::error::Error;
use std::fmt;

/// A cell's static fuel properties cannot drive the Rothermel model.
#[derive(Debug, Clone, PartialEq)]
pub enum FuelParameterError {
    /// A required property is zero or negative
    NonPositive {
        /// Property name (e.g. `"fuel_load"`)
        parameter: &'static str,
        /// Offending value
        value: f64,
    },
    /// A required property is NaN or infinite
    NonFinite {
        /// Property name
        parameter: &'static str,
        /// Offending value
        value: f64,
    },
}

impl fmt::Display for FuelParameterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositive { parameter, value } => {
                write!(f, "invalid fuel parameters: {parameter} must be positive, got {value}")
            }
            Self::NonFinite { parameter, value } => {
                write!(f, "invalid fuel parameters: {parameter} must be finite, got {value}")
            }
        }
    }
}

impl Error for FuelParameterError {}

/// The run configuration or its input layers are inconsistent.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A scalar option is out of its valid range
    InvalidValue {
        /// Option name
        name: &'static str,
        /// What is wrong with it
        reason: String,
    },
    /// A layer does not have `rows * cols` entries
    DimensionMismatch {
        /// Layer name (e.g. `"elevation"`)
        layer: &'static str,
        /// Expected number of cells
        expected: usize,
        /// Actual number of cells
        actual: usize,
    },
    /// No ignition point was given
    NoIgnitionPoints,
    /// An ignition point lies outside the grid
    IgnitionOutOfBounds {
        /// Row of the ignition point
        row: usize,
        /// Column of the ignition point
        col: usize,
        /// Grid rows
        rows: usize,
        /// Grid columns
        cols: usize,
    },
    /// An ignition point lies on a cell that cannot burn
    IgnitionOnUnburnable {
        /// Row of the ignition point
        row: usize,
        /// Column of the ignition point
        col: usize,
    },
    /// A human-readable runtime string could not be parsed
    InvalidRuntime {
        /// The input string
        input: String,
        /// Parser message
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            name,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { name, reason } => write!(f, "invalid {name}: {reason}"),
            Self::DimensionMismatch {
                layer,
                expected,
                actual,
            } => write!(
                f,
                "layer '{layer}' has {actual} cells, expected {expected}"
            ),
            Self::NoIgnitionPoints => write!(f, "at least one ignition point is required"),
            Self::IgnitionOutOfBounds {
                row,
                col,
                rows,
                cols,
            } => write!(
                f,
                "ignition point ({row}, {col}) is outside the {rows}x{cols} grid"
            ),
            Self::IgnitionOnUnburnable { row, col } => {
                write!(f, "ignition point ({row}, {col}) is on an unburnable cell")
            }
            Self::InvalidRuntime { input, reason } => {
                write!(f, "invalid runtime '{input}': {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// The environment provider could not supply a usable field for a tick.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvironmentError {
    /// A finite sequence ran out of samples
    Exhausted {
        /// Tick that was requested
        tick: u64,
        /// Number of fields the sequence holds
        available: usize,
    },
    /// A per-cell field does not cover the grid
    SizeMismatch {
        /// Tick that was requested
        tick: u64,
        /// Expected number of samples
        expected: usize,
        /// Actual number of samples
        actual: usize,
    },
    /// A sample contains NaN/infinite or negative values
    InvalidSample {
        /// Tick that was requested
        tick: u64,
        /// Row-major cell index of the sample
        cell: usize,
        /// What is wrong with it
        reason: &'static str,
    },
    /// Provider-specific failure
    ProviderFailed {
        /// Tick that was requested
        tick: u64,
        /// Provider message
        reason: String,
    },
}

impl fmt::Display for EnvironmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted { tick, available } => write!(
                f,
                "no environment sample for tick {tick} ({available} available)"
            ),
            Self::SizeMismatch {
                tick,
                expected,
                actual,
            } => write!(
                f,
                "environment field for tick {tick} has {actual} samples, expected {expected}"
            ),
            Self::InvalidSample { tick, cell, reason } => {
                write!(f, "environment sample for tick {tick} at cell {cell}: {reason}")
            }
            Self::ProviderFailed { tick, reason } => {
                write!(f, "environment provider failed at tick {tick}: {reason}")
            }
        }
    }
}

impl Error for EnvironmentError {}

/// A static layer provider could not produce layers for a region.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerError {
    /// The requested region is empty or has a non-positive cell size
    InvalidRegion {
        /// What is wrong with it
        reason: String,
    },
    /// The provider's data does not cover the requested region
    RegionMismatch {
        /// Requested (rows, cols)
        requested: (usize, usize),
        /// Available (rows, cols)
        available: (usize, usize),
    },
    /// A raster array has the wrong length
    DimensionMismatch {
        /// Layer name
        layer: &'static str,
        /// Expected number of cells
        expected: usize,
        /// Actual number of cells
        actual: usize,
    },
}

impl fmt::Display for LayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRegion { reason } => write!(f, "invalid region: {reason}"),
            Self::RegionMismatch {
                requested,
                available,
            } => write!(
                f,
                "requested {}x{} region but provider covers {}x{}",
                requested.0, requested.1, available.0, available.1
            ),
            Self::DimensionMismatch {
                layer,
                expected,
                actual,
            } => write!(
                f,
                "raster layer '{layer}' has {actual} cells, expected {expected}"
            ),
        }
    }
}

impl Error for LayerError {}

/// Top-level error returned by the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// The run refused to start (`InvalidConfiguration`)
    InvalidConfiguration(ConfigError),
    /// Static layers could not be produced
    LayerUnavailable(LayerError),
    /// The environment failed mid-run (`EnvironmentUnavailable`); every
    /// snapshot up to `last_completed_tick` remains valid
    EnvironmentUnavailable {
        /// Last tick whose snapshot was emitted
        last_completed_tick: u64,
        /// Underlying provider error
        source: EnvironmentError,
    },
    /// `step` was called after the run reached a terminal state
    AlreadyTerminated,
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfiguration(e) => write!(f, "invalid configuration: {e}"),
            Self::LayerUnavailable(e) => write!(f, "static layers unavailable: {e}"),
            Self::EnvironmentUnavailable {
                last_completed_tick,
                source,
            } => write!(
                f,
                "environment unavailable after tick {last_completed_tick}: {source}"
            ),
            Self::AlreadyTerminated => write!(f, "simulation has already terminated"),
        }
    }
}

impl Error for SimulationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidConfiguration(e) => Some(e),
            Self::LayerUnavailable(e) => Some(e),
            Self::EnvironmentUnavailable { source, .. } => Some(source),
            Self::AlreadyTerminated => None,
        }
    }
}

impl From<ConfigError> for SimulationError {
    fn from(e: ConfigError) -> Self {
        Self::InvalidConfiguration(e)
    }
}

impl From<LayerError> for SimulationError {
    fn from(e: LayerError) -> Self {
        Self::LayerUnavailable(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_error_is_chained() {
        let err = SimulationError::EnvironmentUnavailable {
            last_completed_tick: 4,
            source: EnvironmentError::Exhausted {
                tick: 4,
                available: 4,
            },
        };
        assert!(err.source().is_some());
        assert_eq!(
            err.to_string(),
            "environment unavailable after tick 4: no environment sample for tick 4 (4 available)"
        );
    }

    #[test]
    fn config_error_converts() {
        let err: SimulationError = ConfigError::NoIgnitionPoints.into();
        assert!(matches!(
            err,
            SimulationError::InvalidConfiguration(ConfigError::NoIgnitionPoints)
        ));
    }
}
