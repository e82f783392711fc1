//! Fuel bed parameter bundles
//!
//! A [`FuelModel`] is a closed set of standard surface fuel models
//! (Anderson 1982, the 13 NFFL models) plus a `Custom` escape hatch carrying
//! raw parameters. Every variant resolves to a [`FuelParameters`] bundle in
//! metric units, which is all the Rothermel calculator ever sees.
//!
//! Loads use the fine (1-hour) dead class that drives surface spread.
//!
//! # References
//! - Anderson, H.E. (1982). "Aids to determining fuel models for estimating fire behavior."
//!   USDA Forest Service General Technical Report INT-122.

use crate::error::FuelParameterError;
use serde::{Deserialize, Serialize};

/// Default low heat content of wildland fuels, kJ/kg (8000 Btu/lb)
pub const DEFAULT_HEAT_CONTENT: f64 = 18_608.0;

/// Static physical properties of one cell's fuel bed (metric)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuelParameters {
    /// Oven-dry fuel load `w_0` (kg/m²)
    pub fuel_load: f64,
    /// Surface-area-to-volume ratio `sigma` (1/m)
    pub surface_area_to_volume: f64,
    /// Fuel bed depth `delta` (m)
    pub fuel_bed_depth: f64,
    /// Moisture of extinction `M_x` (fraction)
    pub extinction_moisture: f64,
    /// Low heat content `h` (kJ/kg)
    #[serde(default = "default_heat_content")]
    pub heat_content: f64,
}

fn default_heat_content() -> f64 {
    DEFAULT_HEAT_CONTENT
}

impl FuelParameters {
    /// Create a parameter bundle with the default heat content
    #[must_use]
    pub fn new(
        fuel_load: f64,
        surface_area_to_volume: f64,
        fuel_bed_depth: f64,
        extinction_moisture: f64,
    ) -> Self {
        Self {
            fuel_load,
            surface_area_to_volume,
            fuel_bed_depth,
            extinction_moisture,
            heat_content: DEFAULT_HEAT_CONTENT,
        }
    }

    /// Check that every property is finite and strictly positive
    ///
    /// # Errors
    /// Returns the first offending property.
    pub fn validate(&self) -> Result<(), FuelParameterError> {
        let checks = [
            ("fuel_load", self.fuel_load),
            ("surface_area_to_volume", self.surface_area_to_volume),
            ("fuel_bed_depth", self.fuel_bed_depth),
            ("extinction_moisture", self.extinction_moisture),
            ("heat_content", self.heat_content),
        ];
        for (parameter, value) in checks {
            if !value.is_finite() {
                return Err(FuelParameterError::NonFinite { parameter, value });
            }
            if value <= 0.0 {
                return Err(FuelParameterError::NonPositive { parameter, value });
            }
        }
        Ok(())
    }

    /// Bulk density `rho_b = w_0 / delta` (kg/m³)
    #[must_use]
    pub fn bulk_density(&self) -> f64 {
        self.fuel_load / self.fuel_bed_depth
    }
}

/// Standard surface fuel models
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelModel {
    /// FM1: short grass (1 ft)
    ShortGrass,
    /// FM2: timber with grass and understory
    TimberGrass,
    /// FM3: tall grass (2.5 ft)
    TallGrass,
    /// FM4: chaparral (6 ft)
    Chaparral,
    /// FM5: brush (2 ft)
    Brush,
    /// FM6: dormant brush, hardwood slash
    DormantBrush,
    /// FM7: southern rough
    SouthernRough,
    /// FM8: closed timber litter
    ClosedTimberLitter,
    /// FM9: hardwood litter
    HardwoodLitter,
    /// FM10: timber litter and understory
    TimberLitterUnderstory,
    /// FM11: light logging slash
    LightSlash,
    /// FM12: medium logging slash
    MediumSlash,
    /// FM13: heavy logging slash
    HeavySlash,
    /// Caller-supplied parameters
    Custom(FuelParameters),
}

impl FuelModel {
    /// All standard models in code order (1..=13)
    pub const STANDARD: [FuelModel; 13] = [
        FuelModel::ShortGrass,
        FuelModel::TimberGrass,
        FuelModel::TallGrass,
        FuelModel::Chaparral,
        FuelModel::Brush,
        FuelModel::DormantBrush,
        FuelModel::SouthernRough,
        FuelModel::ClosedTimberLitter,
        FuelModel::HardwoodLitter,
        FuelModel::TimberLitterUnderstory,
        FuelModel::LightSlash,
        FuelModel::MediumSlash,
        FuelModel::HeavySlash,
    ];

    /// Metric parameter bundle for this model
    #[must_use]
    pub fn parameters(&self) -> FuelParameters {
        match self {
            FuelModel::ShortGrass => FuelParameters::new(0.1659, 11_483.0, 0.3048, 0.12),
            FuelModel::TimberGrass => FuelParameters::new(0.4483, 9_843.0, 0.3048, 0.15),
            FuelModel::TallGrass => FuelParameters::new(0.6748, 4_921.0, 0.7620, 0.25),
            FuelModel::Chaparral => FuelParameters::new(1.1231, 6_562.0, 1.8288, 0.20),
            FuelModel::Brush => FuelParameters::new(0.2242, 6_562.0, 0.6096, 0.20),
            FuelModel::DormantBrush => FuelParameters::new(0.3363, 5_741.0, 0.7620, 0.25),
            FuelModel::SouthernRough => FuelParameters::new(0.2533, 5_741.0, 0.7620, 0.40),
            FuelModel::ClosedTimberLitter => FuelParameters::new(0.3363, 6_562.0, 0.0610, 0.30),
            FuelModel::HardwoodLitter => FuelParameters::new(0.6546, 8_202.0, 0.0610, 0.25),
            FuelModel::TimberLitterUnderstory => {
                FuelParameters::new(0.6748, 6_562.0, 0.3048, 0.25)
            }
            FuelModel::LightSlash => FuelParameters::new(0.3363, 4_921.0, 0.3048, 0.15),
            FuelModel::MediumSlash => FuelParameters::new(0.8989, 4_921.0, 0.7010, 0.20),
            FuelModel::HeavySlash => FuelParameters::new(1.5714, 4_921.0, 0.9144, 0.25),
            FuelModel::Custom(params) => *params,
        }
    }

    /// NFFL code (1..=13), or `None` for custom parameters
    #[must_use]
    pub fn code(&self) -> Option<u8> {
        Self::STANDARD
            .iter()
            .position(|m| m == self)
            .map(|i| i as u8 + 1)
    }

    /// Resolve an NFFL raster code
    ///
    /// Returns `None` for non-burnable codes (0 and 91-99: urban, snow,
    /// agriculture, water, barren) and for unknown codes.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1..=13 => Some(Self::STANDARD[usize::from(code) - 1]),
            _ => None,
        }
    }

    /// Whether `code` is one of the documented non-burnable codes
    #[must_use]
    pub fn is_nonburnable_code(code: u8) -> bool {
        code == 0 || (91..=99).contains(&code)
    }

    /// Display name
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            FuelModel::ShortGrass => "Short grass",
            FuelModel::TimberGrass => "Timber (grass and understory)",
            FuelModel::TallGrass => "Tall grass",
            FuelModel::Chaparral => "Chaparral",
            FuelModel::Brush => "Brush",
            FuelModel::DormantBrush => "Dormant brush",
            FuelModel::SouthernRough => "Southern rough",
            FuelModel::ClosedTimberLitter => "Closed timber litter",
            FuelModel::HardwoodLitter => "Hardwood litter",
            FuelModel::TimberLitterUnderstory => "Timber litter and understory",
            FuelModel::LightSlash => "Light logging slash",
            FuelModel::MediumSlash => "Medium logging slash",
            FuelModel::HeavySlash => "Heavy logging slash",
            FuelModel::Custom(_) => "Custom",
        }
    }
}
