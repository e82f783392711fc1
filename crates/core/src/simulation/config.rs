//! Run configuration

use crate::core_types::fuel::FuelParameters;
use crate::core_types::units::Seconds;
use crate::environment::EnvironmentOverrides;
use crate::error::ConfigError;
use crate::grid::{Connectivity, GridCoord, Region};
use crate::physics::{FuelBed, SpottingConfig, SpreadLimits};
use serde::{Deserialize, Serialize};

/// How long a cell burns once ignited
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum BurnoutPolicy {
    /// Same duration for every cell
    Fixed {
        /// Burn duration (s)
        seconds: f64,
    },
    /// Proportional to fuel load: `w_0 × seconds_per_kg_m2`
    FuelLoad {
        /// Seconds of burning per kg/m² of fuel
        seconds_per_kg_m2: f64,
    },
    /// Multiple of the Rothermel flame residence time
    ResidenceTime {
        /// Residence time multiplier
        multiplier: f64,
    },
}

impl Default for BurnoutPolicy {
    fn default() -> Self {
        BurnoutPolicy::Fixed { seconds: 1800.0 }
    }
}

impl BurnoutPolicy {
    /// Burn duration for one cell (s)
    #[must_use]
    pub fn duration(&self, fuel: &FuelParameters, bed: &FuelBed) -> f64 {
        match *self {
            BurnoutPolicy::Fixed { seconds } => seconds,
            BurnoutPolicy::FuelLoad { seconds_per_kg_m2 } => fuel.fuel_load * seconds_per_kg_m2,
            BurnoutPolicy::ResidenceTime { multiplier } => bed.residence_time() * multiplier,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let (name, value) = match *self {
            BurnoutPolicy::Fixed { seconds } => ("burnout.seconds", seconds),
            BurnoutPolicy::FuelLoad { seconds_per_kg_m2 } => {
                ("burnout.seconds_per_kg_m2", seconds_per_kg_m2)
            }
            BurnoutPolicy::ResidenceTime { multiplier } => ("burnout.multiplier", multiplier),
        };
        positive(name, value)
    }
}

/// Optional per-tick arrays included in snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotOptions {
    /// Include ignition times (`-1` for never ignited)
    pub ignition_times: bool,
    /// Include peak fireline intensity per cell
    pub intensity: bool,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            ignition_times: true,
            intensity: false,
        }
    }
}

/// Everything needed to start a run, apart from layers and environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Grid rows
    pub rows: usize,
    /// Grid columns
    pub cols: usize,
    /// Cell edge length (m)
    pub cell_size: f64,
    /// Tick length (s)
    pub time_step: f64,
    /// Cells burning at time 0
    pub ignition_points: Vec<GridCoord>,
    /// Applied on top of every environment field
    pub overrides: EnvironmentOverrides,
    /// Stop after this many ticks
    pub max_steps: Option<u64>,
    /// Stop once this much simulated time has elapsed (s)
    pub max_duration: Option<f64>,
    /// Spread neighbourhood
    pub connectivity: Connectivity,
    /// Accumulated pressure needed to ignite a cell
    pub ignition_threshold: f64,
    /// Burn duration rule
    pub burnout: BurnoutPolicy,
    /// Spread rate bounds
    pub spread_limits: SpreadLimits,
    /// Snapshot contents
    pub snapshots: SnapshotOptions,
    /// Ember spotting, off when `None`
    pub spotting: Option<SpottingConfig>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rows: 100,
            cols: 100,
            cell_size: 30.0,
            time_step: 60.0,
            ignition_points: Vec::new(),
            overrides: EnvironmentOverrides::default(),
            max_steps: None,
            max_duration: None,
            connectivity: Connectivity::default(),
            ignition_threshold: 1.0,
            burnout: BurnoutPolicy::default(),
            spread_limits: SpreadLimits::default(),
            snapshots: SnapshotOptions::default(),
            spotting: None,
        }
    }
}

impl SimulationConfig {
    /// Grid shape and timing; everything else defaulted
    #[must_use]
    pub fn new(rows: usize, cols: usize, cell_size: f64, time_step: f64) -> Self {
        Self {
            rows,
            cols,
            cell_size,
            time_step,
            ..Self::default()
        }
    }

    /// Add an ignition point
    pub fn with_ignition(mut self, row: usize, col: usize) -> Self {
        self.ignition_points.push(GridCoord::new(row, col));
        self
    }

    /// Replace the ignition set
    pub fn with_ignitions(mut self, points: impl IntoIterator<Item = GridCoord>) -> Self {
        self.ignition_points = points.into_iter().collect();
        self
    }

    /// Limit the number of ticks
    pub fn with_max_steps(mut self, steps: u64) -> Self {
        self.max_steps = Some(steps);
        self
    }

    /// Limit simulated time
    pub fn with_max_duration(mut self, duration: Seconds) -> Self {
        self.max_duration = Some(duration.value());
        self
    }

    /// Limit simulated time from a human-readable string such as `"2h"`
    ///
    /// # Errors
    /// `ConfigError::InvalidRuntime` if the string does not parse.
    pub fn with_runtime(self, runtime: &str) -> Result<Self, ConfigError> {
        Ok(self.with_max_duration(parse_runtime(runtime)?))
    }

    /// Set the neighbourhood
    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Set the burnout rule
    pub fn with_burnout(mut self, burnout: BurnoutPolicy) -> Self {
        self.burnout = burnout;
        self
    }

    /// Set global environment overrides
    pub fn with_overrides(mut self, overrides: EnvironmentOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Enable ember spotting
    pub fn with_spotting(mut self, spotting: SpottingConfig) -> Self {
        self.spotting = Some(spotting);
        self
    }

    /// Choose snapshot contents
    pub fn with_snapshots(mut self, snapshots: SnapshotOptions) -> Self {
        self.snapshots = snapshots;
        self
    }

    /// Region requested from a layer provider
    #[must_use]
    pub fn region(&self) -> Region {
        Region::new(self.rows, self.cols, self.cell_size)
    }

    /// Tick limit implied by `max_steps` and `max_duration`, whichever is
    /// reached first. Durations round up to whole ticks, so a run may end
    /// up to one tick past `max_duration`.
    #[must_use]
    pub fn step_limit(&self) -> Option<u64> {
        let by_duration = self
            .max_duration
            .map(|d| (d / self.time_step).ceil().max(0.0) as u64);
        match (self.max_steps, by_duration) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Check every scalar option and the ignition set against the grid
    ///
    /// # Errors
    /// The first `ConfigError` found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::invalid(
                "grid dimensions",
                format!("{}x{} grid has no cells", self.rows, self.cols),
            ));
        }
        positive("cell_size", self.cell_size)?;
        positive("time_step", self.time_step)?;
        positive("ignition_threshold", self.ignition_threshold)?;
        if self.max_steps == Some(0) {
            return Err(ConfigError::invalid("max_steps", "must be at least 1"));
        }
        if let Some(d) = self.max_duration {
            positive("max_duration", d)?;
        }
        positive("spread_limits.max_rate", self.spread_limits.max_rate)?;
        non_negative(
            "spread_limits.min_multiplier",
            self.spread_limits.min_multiplier,
        )?;
        if let Some(v) = self.overrides.wind_speed {
            non_negative("overrides.wind_speed", v)?;
        }
        if let Some(v) = self.overrides.wind_direction {
            if !v.is_finite() {
                return Err(ConfigError::invalid(
                    "overrides.wind_direction",
                    "must be finite",
                ));
            }
        }
        if let Some(v) = self.overrides.moisture {
            non_negative("overrides.moisture", v)?;
        }
        self.burnout.validate()?;
        if let Some(spotting) = &self.spotting {
            spotting.validate()?;
        }

        if self.ignition_points.is_empty() {
            return Err(ConfigError::NoIgnitionPoints);
        }
        for p in &self.ignition_points {
            if p.row >= self.rows || p.col >= self.cols {
                return Err(ConfigError::IgnitionOutOfBounds {
                    row: p.row,
                    col: p.col,
                    rows: self.rows,
                    cols: self.cols,
                });
            }
        }
        Ok(())
    }
}

/// Parse a runtime such as `"2h"`, `"90min"` or `"1h 30m"`
///
/// # Errors
/// `ConfigError::InvalidRuntime` with the parser message.
pub fn parse_runtime(input: &str) -> Result<Seconds, ConfigError> {
    humantime::parse_duration(input.trim())
        .map(Seconds::from)
        .map_err(|e| ConfigError::InvalidRuntime {
            input: input.to_string(),
            reason: e.to_string(),
        })
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            name,
            format!("{value} must be finite and positive"),
        ))
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            name,
            format!("{value} must be finite and non-negative"),
        ))
    }
}
