//! Ember spotting (Albini 1979, 1983)
//!
//! Burning cells whose fireline intensity exceeds a threshold may loft a
//! firebrand downwind. The maximum carry distance follows the simplified
//! Albini lofting model; the actual distance and the ignition outcome are
//! drawn from a seeded `ChaCha8Rng`, so a run with the same seed reproduces
//! the same spot fires.
//!
//! # References
//! - Albini, F.A. (1979). "Spot fire distance from burning trees: a predictive model"
//!   USDA Forest Service Research Paper INT-56
//! - Albini, F.A. (1983). "Transport of firebrands by line thermals"
//!   Combustion Science and Technology, 32(5-6), 277-288

use crate::environment::{bearing_unit, EnvironmentSample};
use crate::error::ConfigError;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Ember lofting height (m) from Byram fireline intensity (kW/m)
///
/// `H = 12.2 × I^0.4`
#[must_use]
pub fn lofting_height(fireline_intensity: f64) -> f64 {
    if fireline_intensity <= 0.0 {
        return 0.0;
    }
    12.2 * fireline_intensity.powf(0.4)
}

/// Wind speed at `height` from the 10 m reference wind (power law)
pub(crate) fn wind_speed_at_height(wind_speed_10m: f64, height: f64) -> f64 {
    const WIND_SHEAR_EXPONENT: f64 = 0.15;
    const REFERENCE_HEIGHT: f64 = 10.0;

    if height <= 0.0 {
        return 0.0;
    }
    wind_speed_10m * (height / REFERENCE_HEIGHT).powf(WIND_SHEAR_EXPONENT)
}

/// Terminal fall velocity of a spherical firebrand (m/s)
pub(crate) fn terminal_velocity(ember_mass: f64, ember_diameter: f64) -> f64 {
    const AIR_DENSITY: f64 = 1.225;
    const DRAG_COEFFICIENT: f64 = 0.4;
    const GRAVITY: f64 = 9.81;

    if ember_mass <= 0.0 || ember_diameter <= 0.0 {
        return 0.0;
    }
    let cross_section = std::f64::consts::PI * (ember_diameter / 2.0).powi(2);
    ((2.0 * ember_mass * GRAVITY) / (AIR_DENSITY * DRAG_COEFFICIENT * cross_section)).sqrt()
}

/// Maximum spotting distance (m): `H × u_H / w_f`
#[must_use]
pub fn maximum_spotting_distance(
    fireline_intensity: f64,
    wind_speed: f64,
    ember_mass: f64,
    ember_diameter: f64,
) -> f64 {
    let height = lofting_height(fireline_intensity);
    let fall = terminal_velocity(ember_mass, ember_diameter);
    if height <= 0.0 || fall <= 0.0 {
        return 0.0;
    }
    height * wind_speed_at_height(wind_speed, height) / fall
}

/// Ember spotting options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpottingConfig {
    /// RNG seed
    pub seed: u64,
    /// Minimum fireline intensity that can loft embers (kW/m)
    pub intensity_threshold: f64,
    /// Chance that an eligible burning cell launches an ember each tick
    pub launch_probability: f64,
    /// Chance that an ember landing on receptive fuel ignites it
    pub ignition_probability: f64,
    /// Hard cap on carry distance, in cells
    pub max_distance_cells: usize,
    /// Firebrand mass (kg)
    pub ember_mass: f64,
    /// Firebrand diameter (m)
    pub ember_diameter: f64,
}

impl Default for SpottingConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            intensity_threshold: 500.0,
            launch_probability: 0.05,
            ignition_probability: 0.5,
            max_distance_cells: 10,
            ember_mass: 0.0005,
            ember_diameter: 0.01,
        }
    }
}

impl SpottingConfig {
    /// Check ranges
    ///
    /// # Errors
    /// `ConfigError::InvalidValue` for the first out-of-range option.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let probability = |name, p: f64| {
            if (0.0..=1.0).contains(&p) {
                Ok(())
            } else {
                Err(ConfigError::invalid(name, format!("{p} is not in [0, 1]")))
            }
        };
        probability("spotting.launch_probability", self.launch_probability)?;
        probability("spotting.ignition_probability", self.ignition_probability)?;
        if !self.intensity_threshold.is_finite() || self.intensity_threshold < 0.0 {
            return Err(ConfigError::invalid(
                "spotting.intensity_threshold",
                "must be finite and non-negative",
            ));
        }
        if !(self.ember_mass.is_finite() && self.ember_mass > 0.0)
            || !(self.ember_diameter.is_finite() && self.ember_diameter > 0.0)
        {
            return Err(ConfigError::invalid(
                "spotting.ember",
                "mass and diameter must be positive",
            ));
        }
        Ok(())
    }
}

/// Seeded firebrand generator
#[derive(Debug, Clone)]
pub struct SpotFireModel {
    config: SpottingConfig,
    rng: ChaCha8Rng,
}

impl SpotFireModel {
    /// Create a generator seeded from `config.seed`
    #[must_use]
    pub fn new(config: SpottingConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
        }
    }

    /// Options in use
    #[must_use]
    pub fn config(&self) -> &SpottingConfig {
        &self.config
    }

    /// Try to launch an ember from a burning cell
    ///
    /// Returns the landing offset `(d_row, d_col)` in cells, or `None` if no
    /// ember leaves the cell. Rows grow southward, so a northward carry has a
    /// negative row offset.
    pub fn launch(
        &mut self,
        fireline_intensity: f64,
        wind: &EnvironmentSample,
        cell_size: f64,
    ) -> Option<(isize, isize)> {
        if fireline_intensity < self.config.intensity_threshold || wind.wind_speed <= 0.0 {
            return None;
        }
        if self.rng.random::<f64>() >= self.config.launch_probability {
            return None;
        }

        let reach = maximum_spotting_distance(
            fireline_intensity,
            wind.wind_speed,
            self.config.ember_mass,
            self.config.ember_diameter,
        );
        let cap = self.config.max_distance_cells as f64 * cell_size;
        let distance = (self.rng.random::<f64>() * reach).min(cap);

        let heading = bearing_unit(wind.downwind_bearing()) * (distance / cell_size);
        let d_col = heading.x.round() as isize;
        let d_row = -(heading.y.round() as isize);
        if d_row == 0 && d_col == 0 {
            return None;
        }
        Some((d_row, d_col))
    }

    /// Whether a landed ember ignites receptive fuel
    pub fn catches(&mut self) -> bool {
        self.rng.random::<f64>() < self.config.ignition_probability
    }
}
