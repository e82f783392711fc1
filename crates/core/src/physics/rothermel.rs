//! Rothermel Fire Spread Model (1972)
//!
//! Surface rate of spread in the metric form used throughout the engine
//! (kg, m, s, kJ). The empirical correlations were fitted in imperial units;
//! their coefficients below are the equivalent metric constants so that no
//! conversion happens inside the formula.
//!
//! # References
//! - Rothermel, R.C. (1972). "A mathematical model for predicting fire spread in wildland fuels."
//!   USDA Forest Service Research Paper INT-115.
//! - Albini, F.A. (1976). "Estimating wildfire behavior and effects."
//!   USDA Forest Service General Technical Report INT-30.
//! - Wilson, R.A. (1980). "Reformulation of forest fire spread equations in SI units."
//!   USDA Forest Service Research Note INT-292.

use crate::core_types::fuel::FuelParameters;
use crate::error::FuelParameterError;
use serde::{Deserialize, Serialize};

/// Oven-dry particle density `rho_p` (kg/m³, 32 lb/ft³)
const PARTICLE_DENSITY: f64 = 512.0;

/// Total mineral content `S_T` (fraction)
const TOTAL_MINERAL_CONTENT: f64 = 0.0555;

/// Effective (silica-free) mineral content `S_e` (fraction)
const EFFECTIVE_MINERAL_CONTENT: f64 = 0.010;

/// Wind limit: maximum effective midflame wind per unit reaction intensity,
/// m/s per kW/m²
const WIND_LIMIT_PER_INTENSITY: f64 = 0.024_155;

/// Flame residence time numerator: `t_r = K / sigma` seconds
const RESIDENCE_TIME_COEFF: f64 = 75_590.55;

/// Bounds applied to every directional rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadLimits {
    /// Upper bound on any spread rate (m/s)
    pub max_rate: f64,
    /// Lower bound on the combined `1 + phi_w + phi_s` multiplier
    pub min_multiplier: f64,
}

impl Default for SpreadLimits {
    fn default() -> Self {
        Self {
            max_rate: 10.0,
            min_multiplier: 0.25,
        }
    }
}

/// Moisture-independent Rothermel terms for one fuel bed
///
/// Computed once per cell when the grid is built; only moisture damping and
/// heat of pre-ignition change from tick to tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuelBed {
    /// Moisture of extinction (fraction)
    extinction_moisture: f64,
    /// Bulk density `rho_b` (kg/m³)
    bulk_density: f64,
    /// `Gamma' * w_n * h * eta_s` (kW/m² before moisture damping)
    dry_reaction_intensity: f64,
    /// Propagating flux ratio `xi`
    propagating_flux: f64,
    /// Effective heating number `epsilon`
    effective_heating: f64,
    /// Wind factor coefficient, metric form (wind in m/s)
    wind_c: f64,
    /// Wind factor exponent `B`
    wind_b: f64,
    /// `(beta / beta_op)^-E`
    wind_packing: f64,
    /// `5.275 * beta^-0.3`
    slope_coeff: f64,
    /// Flame residence time (s)
    residence_time: f64,
}

/// Result of one directional evaluation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpreadComponents {
    /// Rate of spread (m/s), bounded by the limits
    pub rate: f64,
    /// Reaction intensity `I_R` (kW/m²)
    pub reaction_intensity: f64,
    /// Wind factor used
    pub phi_wind: f64,
    /// Slope factor used (negative downslope)
    pub phi_slope: f64,
}

impl SpreadComponents {
    /// Byram fireline intensity `I_R * t_r * R` (kW/m)
    #[must_use]
    pub fn fireline_intensity(&self, bed: &FuelBed) -> f64 {
        self.reaction_intensity * bed.residence_time * self.rate
    }
}

impl FuelBed {
    /// Precompute the moisture-independent terms
    ///
    /// # Errors
    /// `FuelParameterError` if any property is non-positive or non-finite.
    pub fn new(fuel: &FuelParameters) -> Result<Self, FuelParameterError> {
        fuel.validate()?;

        let sigma = fuel.surface_area_to_volume;
        let bulk_density = fuel.bulk_density();
        let beta = bulk_density / PARTICLE_DENSITY;

        // Optimum packing ratio and reaction velocity
        let beta_op = 8.858 * sigma.powf(-0.8189);
        let beta_ratio = beta / beta_op;
        let sigma_15 = sigma.powf(1.5);
        let gamma_max = sigma_15 / (176_496.0 + 3.564 * sigma_15);
        let a = 340.53 * sigma.powf(-0.7913);
        let gamma = gamma_max * beta_ratio.powf(a) * (a * (1.0 - beta_ratio)).exp();

        let net_load = fuel.fuel_load * (1.0 - TOTAL_MINERAL_CONTENT);
        let mineral_damping = (0.174 * EFFECTIVE_MINERAL_CONTENT.powf(-0.19)).min(1.0);
        let dry_reaction_intensity = gamma * net_load * fuel.heat_content * mineral_damping;

        let propagating_flux = ((0.792 + 0.375_97 * sigma.sqrt()) * (beta + 0.1)).exp()
            / (192.0 + 0.079_096 * sigma);

        let effective_heating = (-452.76 / sigma).exp();

        let wind_b = 0.013_298 * sigma.powf(0.54);
        // 196.85 folds the ft/min wind of the original correlation into C
        let wind_c = 7.47 * (-0.069_191 * sigma.powf(0.55)).exp() * 196.85_f64.powf(wind_b);
        let wind_e = 0.715 * (-1.0942e-4 * sigma).exp();
        let wind_packing = beta_ratio.powf(-wind_e);

        let slope_coeff = 5.275 * beta.powf(-0.3);

        Ok(Self {
            extinction_moisture: fuel.extinction_moisture,
            bulk_density,
            dry_reaction_intensity,
            propagating_flux,
            effective_heating,
            wind_c,
            wind_b,
            wind_packing,
            slope_coeff,
            residence_time: RESIDENCE_TIME_COEFF / sigma,
        })
    }

    /// Moisture of extinction (fraction)
    #[must_use]
    pub fn extinction_moisture(&self) -> f64 {
        self.extinction_moisture
    }

    /// Flame residence time (s)
    #[must_use]
    pub fn residence_time(&self) -> f64 {
        self.residence_time
    }

    /// Whether fuel at `moisture` can sustain combustion
    #[inline]
    #[must_use]
    pub fn sustains_combustion(&self, moisture: f64) -> bool {
        moisture < self.extinction_moisture
    }

    /// Reaction intensity `I_R` at the given moisture (kW/m²)
    #[must_use]
    pub fn reaction_intensity(&self, moisture: f64) -> f64 {
        self.dry_reaction_intensity * moisture_damping(moisture, self.extinction_moisture)
    }

    /// Wind factor `phi_w` for a wind component aligned with the spread
    /// direction (m/s), capped at the Rothermel wind limit
    #[must_use]
    pub fn wind_factor(&self, aligned_wind: f64, reaction_intensity: f64) -> f64 {
        if aligned_wind <= 0.0 {
            return 0.0;
        }
        let wind = aligned_wind.min(WIND_LIMIT_PER_INTENSITY * reaction_intensity);
        if wind <= 0.0 {
            return 0.0;
        }
        self.wind_c * wind.powf(self.wind_b) * self.wind_packing
    }

    /// Slope factor `phi_s` for a signed slope (rise over run);
    /// negative downslope
    #[must_use]
    pub fn slope_factor(&self, slope_tan: f64) -> f64 {
        let magnitude = self.slope_coeff * slope_tan * slope_tan;
        if slope_tan < 0.0 {
            -magnitude
        } else {
            magnitude
        }
    }

    /// Rate of spread in one direction
    ///
    /// Fuel at or above its extinction moisture yields exactly zero.
    #[must_use]
    pub fn spread(
        &self,
        moisture: f64,
        aligned_wind: f64,
        slope_tan: f64,
        limits: &SpreadLimits,
    ) -> SpreadComponents {
        if !self.sustains_combustion(moisture) {
            return SpreadComponents::default();
        }

        let reaction_intensity = self.reaction_intensity(moisture);
        let phi_wind = self.wind_factor(aligned_wind, reaction_intensity);
        let phi_slope = self.slope_factor(slope_tan);
        let multiplier = (1.0 + phi_wind + phi_slope).max(limits.min_multiplier.max(0.0));

        let heat_preignition = 581.5 + 2_595.8 * moisture;
        let heat_sink = self.bulk_density * self.effective_heating * heat_preignition;

        let rate = reaction_intensity * self.propagating_flux * multiplier / heat_sink;
        let rate = if rate.is_finite() {
            rate.clamp(0.0, limits.max_rate.max(0.0))
        } else {
            0.0
        };

        SpreadComponents {
            rate,
            reaction_intensity,
            phi_wind,
            phi_slope,
        }
    }
}

/// Moisture damping coefficient `eta_M`
///
/// ```text
/// eta_M = 1 - 2.59 r + 5.11 r² - 3.52 r³,  r = M_f / M_x
/// ```
fn moisture_damping(moisture: f64, extinction_moisture: f64) -> f64 {
    let ratio = (moisture / extinction_moisture).clamp(0.0, 1.0);
    let damping = 1.0 - 2.59 * ratio + 5.11 * ratio.powi(2) - 3.52 * ratio.powi(3);
    damping.clamp(0.0, 1.0)
}

/// Rothermel rate of spread (m/s) for a single direction
///
/// # Formula
/// ```text
/// R = I_R × ξ × (1 + Φ_w + Φ_s) / (ρ_b × ε × Q_ig)
/// ```
///
/// # Arguments
/// * `fuel` - Static fuel properties of the bed being burned into
/// * `moisture` - Dead fine fuel moisture (fraction)
/// * `aligned_wind` - Wind component along the spread direction (m/s, clamped at 0)
/// * `slope_tan` - Rise over run toward the spread direction (negative downslope)
/// * `limits` - Rate cap and minimum multiplier
///
/// # Errors
/// `FuelParameterError` if the fuel has a non-positive or non-finite property.
///
/// # Example
/// ```
/// use fire_spread_core::physics::{rothermel_spread_rate, SpreadLimits};
/// use fire_spread_core::FuelModel;
///
/// let fuel = FuelModel::ShortGrass.parameters();
/// let rate = rothermel_spread_rate(&fuel, 0.05, 0.0, 0.0, &SpreadLimits::default()).unwrap();
/// assert!(rate > 0.0);
/// let wet = rothermel_spread_rate(&fuel, 0.12, 10.0, 0.5, &SpreadLimits::default()).unwrap();
/// assert_eq!(wet, 0.0);
/// ```
pub fn rothermel_spread_rate(
    fuel: &FuelParameters,
    moisture: f64,
    aligned_wind: f64,
    slope_tan: f64,
    limits: &SpreadLimits,
) -> Result<f64, FuelParameterError> {
    let bed = FuelBed::new(fuel)?;
    Ok(bed.spread(moisture, aligned_wind, slope_tan, limits).rate)
}
