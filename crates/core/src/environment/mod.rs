//! Per-tick environment input (wind and fuel moisture)
//!
//! The engine never produces weather. An [`EnvironmentProvider`] hands it one
//! fully materialized [`EnvironmentField`] per tick before the tick starts,
//! and the scheduler only reads it.
//!
//! Wind direction follows the meteorological convention: the bearing the wind
//! blows *from*, clockwise from north. Grid rows grow southward and columns
//! grow eastward.

mod providers;

pub use providers::{ConstantEnvironment, EnvironmentProvider, SequenceEnvironment};

use crate::core_types::units::{Degrees, Fraction, MetersPerSecond};
use crate::error::EnvironmentError;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Horizontal vector in (east, north) components
pub type Vec2 = Vector2<f64>;

/// Unit vector pointing along a compass bearing
#[inline]
#[must_use]
pub fn bearing_unit(bearing_deg: f64) -> Vec2 {
    let rad = bearing_deg.to_radians();
    Vec2::new(rad.sin(), rad.cos())
}

/// Wind and moisture at one cell for one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSample {
    /// Midflame wind speed (m/s)
    pub wind_speed: f64,
    /// Bearing the wind blows from (degrees, 0 = north)
    pub wind_direction: f64,
    /// Dead fine fuel moisture (fraction of dry mass)
    pub moisture: f64,
}

impl Default for EnvironmentSample {
    fn default() -> Self {
        Self::calm(0.06)
    }
}

impl EnvironmentSample {
    /// Create a sample from typed quantities
    #[must_use]
    pub fn new(wind_speed: MetersPerSecond, wind_from: Degrees, moisture: Fraction) -> Self {
        Self {
            wind_speed: *wind_speed,
            wind_direction: *wind_from,
            moisture: *moisture,
        }
    }

    /// No wind, given moisture
    #[must_use]
    pub fn calm(moisture: f64) -> Self {
        Self {
            wind_speed: 0.0,
            wind_direction: 0.0,
            moisture,
        }
    }

    /// Wind velocity vector (where the air is going), m/s
    #[must_use]
    pub fn wind_vector(&self) -> Vec2 {
        bearing_unit(self.wind_direction + 180.0) * self.wind_speed
    }

    /// Wind component along `bearing_deg`, clamped at zero against the wind
    #[must_use]
    pub fn aligned_wind(&self, bearing_deg: f64) -> f64 {
        if self.wind_speed <= 0.0 {
            return 0.0;
        }
        self.wind_vector().dot(&bearing_unit(bearing_deg)).max(0.0)
    }

    /// Bearing the wind blows toward (degrees)
    #[must_use]
    pub fn downwind_bearing(&self) -> f64 {
        Degrees::new(self.wind_direction).reversed().value()
    }

    fn check(&self, tick: u64, cell: usize) -> Result<(), EnvironmentError> {
        let invalid = |reason| EnvironmentError::InvalidSample { tick, cell, reason };
        if !self.wind_speed.is_finite() || !self.wind_direction.is_finite() {
            return Err(invalid("wind is not finite"));
        }
        if self.wind_speed < 0.0 {
            return Err(invalid("wind speed is negative"));
        }
        if !self.moisture.is_finite() || self.moisture < 0.0 {
            return Err(invalid("moisture must be finite and non-negative"));
        }
        Ok(())
    }
}

/// Global overrides applied on top of whatever the provider supplies
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentOverrides {
    /// Replace wind speed everywhere (m/s)
    pub wind_speed: Option<f64>,
    /// Replace wind direction everywhere (degrees from)
    pub wind_direction: Option<f64>,
    /// Replace moisture everywhere (fraction)
    pub moisture: Option<f64>,
}

impl EnvironmentOverrides {
    /// Whether any override is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.wind_speed.is_none() && self.wind_direction.is_none() && self.moisture.is_none()
    }

    fn apply(&self, sample: &mut EnvironmentSample) {
        if let Some(speed) = self.wind_speed {
            sample.wind_speed = speed;
        }
        if let Some(direction) = self.wind_direction {
            sample.wind_direction = direction;
        }
        if let Some(moisture) = self.moisture {
            sample.moisture = moisture;
        }
    }
}

/// Environment samples covering the whole grid for one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "samples", rename_all = "snake_case")]
pub enum EnvironmentField {
    /// Same sample everywhere
    Uniform(EnvironmentSample),
    /// One sample per cell, row-major
    PerCell(Vec<EnvironmentSample>),
}

impl EnvironmentField {
    /// Sample at a row-major cell index
    #[inline]
    #[must_use]
    pub fn sample(&self, index: usize) -> &EnvironmentSample {
        match self {
            EnvironmentField::Uniform(s) => s,
            EnvironmentField::PerCell(samples) => &samples[index],
        }
    }

    /// Check size and value sanity against a grid of `cells` cells
    ///
    /// # Errors
    /// `SizeMismatch` for a per-cell field of the wrong length,
    /// `InvalidSample` for the first non-finite or negative sample.
    pub fn validate(&self, cells: usize, tick: u64) -> Result<(), EnvironmentError> {
        match self {
            EnvironmentField::Uniform(s) => s.check(tick, 0),
            EnvironmentField::PerCell(samples) => {
                if samples.len() != cells {
                    return Err(EnvironmentError::SizeMismatch {
                        tick,
                        expected: cells,
                        actual: samples.len(),
                    });
                }
                samples
                    .iter()
                    .enumerate()
                    .try_for_each(|(i, s)| s.check(tick, i))
            }
        }
    }

    /// Apply global overrides, returning the adjusted field
    #[must_use]
    pub fn with_overrides(mut self, overrides: &EnvironmentOverrides) -> Self {
        if overrides.is_empty() {
            return self;
        }
        match &mut self {
            EnvironmentField::Uniform(s) => overrides.apply(s),
            EnvironmentField::PerCell(samples) => {
                for s in samples.iter_mut() {
                    overrides.apply(s);
                }
            }
        }
        self
    }

    /// Wind speed per cell (m/s), row-major
    #[must_use]
    pub fn wind_speed_array(&self, cells: usize) -> Vec<f64> {
        (0..cells).map(|i| self.sample(i).wind_speed).collect()
    }

    /// Wind direction per cell (degrees from), row-major
    #[must_use]
    pub fn wind_direction_array(&self, cells: usize) -> Vec<f64> {
        (0..cells).map(|i| self.sample(i).wind_direction).collect()
    }
}
