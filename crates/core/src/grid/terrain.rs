//! Static layer providers
//!
//! A [`LayerProvider`] turns a requested [`Region`] into [`StaticLayers`].
//! Two implementations exist: [`SyntheticTerrain`] builds seeded noise
//! terrain and fuel, [`RasterAdapter`] wraps pre-loaded raster arrays (fuel
//! model codes plus elevation) and converts their units once, here.
//! [`LayerSource`] selects between them from configuration.

use super::layers::StaticLayers;
use super::noise::NoiseGenerator;
use crate::core_types::fuel::FuelModel;
use crate::core_types::units::{Elevation, Feet};
use crate::error::LayerError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Grid extent requested from a provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Number of rows
    pub rows: usize,
    /// Number of columns
    pub cols: usize,
    /// Cell edge length (m)
    pub cell_size: f64,
}

impl Region {
    /// Create a region
    #[must_use]
    pub fn new(rows: usize, cols: usize, cell_size: f64) -> Self {
        Self {
            rows,
            cols,
            cell_size,
        }
    }

    /// Number of cells
    #[must_use]
    pub fn cells(&self) -> usize {
        self.rows * self.cols
    }

    /// Reject empty regions and non-positive cell sizes
    ///
    /// # Errors
    /// `LayerError::InvalidRegion` describing the problem.
    pub fn validate(&self) -> Result<(), LayerError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(LayerError::InvalidRegion {
                reason: format!("{}x{} region has no cells", self.rows, self.cols),
            });
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(LayerError::InvalidRegion {
                reason: format!("cell size {} must be positive", self.cell_size),
            });
        }
        Ok(())
    }
}

/// Supplies static layer arrays for a region
pub trait LayerProvider {
    /// Produce layers covering `region`
    ///
    /// # Errors
    /// `LayerError` if the provider cannot cover the region.
    fn static_layers(&self, region: &Region) -> Result<StaticLayers, LayerError>;
}

/// Seeded noise terrain with heterogeneous fuel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticTerrain {
    /// Noise seed
    pub seed: u64,
    /// Base fuel model
    pub fuel: FuelModel,
    /// Mean elevation (m)
    pub base_elevation: f64,
    /// Peak deviation from the mean elevation (m)
    pub relief: f64,
    /// Size of the largest terrain features (m)
    pub feature_size: f64,
    /// Relative fuel load variation, in `[0, 1)`
    pub fuel_load_variation: f64,
    /// Noise level below which cells are unburnable (lakes, rock)
    pub unburnable_below: Option<f64>,
}

impl Default for SyntheticTerrain {
    fn default() -> Self {
        Self {
            seed: 0,
            fuel: FuelModel::ShortGrass,
            base_elevation: 0.0,
            relief: 50.0,
            feature_size: 500.0,
            fuel_load_variation: 0.2,
            unburnable_below: None,
        }
    }
}

impl SyntheticTerrain {
    /// Seeded terrain with default relief and fuel variation
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Flat, homogeneous terrain covered by one fuel model
    #[must_use]
    pub fn flat(fuel: FuelModel) -> Self {
        Self {
            fuel,
            relief: 0.0,
            fuel_load_variation: 0.0,
            ..Self::default()
        }
    }

    /// Use a different base fuel
    pub fn with_fuel(mut self, fuel: FuelModel) -> Self {
        self.fuel = fuel;
        self
    }

    /// Set terrain relief (m)
    pub fn with_relief(mut self, relief: f64) -> Self {
        self.relief = relief;
        self
    }
}

impl LayerProvider for SyntheticTerrain {
    fn static_layers(&self, region: &Region) -> Result<StaticLayers, LayerError> {
        region.validate()?;
        if !(0.0..1.0).contains(&self.fuel_load_variation) {
            return Err(LayerError::InvalidRegion {
                reason: format!(
                    "fuel load variation {} must be in [0, 1)",
                    self.fuel_load_variation
                ),
            });
        }

        let (rows, cols, size) = (region.rows, region.cols, region.cell_size);
        let mut layers = StaticLayers::uniform(rows, cols, self.fuel);

        let terrain = NoiseGenerator::new(self.seed, self.feature_size).field(rows, cols, size);
        layers.elevation = terrain
            .iter()
            .map(|n| self.base_elevation + self.relief * n)
            .collect();

        if self.fuel_load_variation > 0.0 {
            let load = NoiseGenerator::new(self.seed.wrapping_add(1), self.feature_size / 4.0)
                .field(rows, cols, size);
            for (w, n) in layers.fuel_load.iter_mut().zip(&load) {
                *w *= 1.0 + self.fuel_load_variation * n;
            }
        }

        if let Some(level) = self.unburnable_below {
            let mask = NoiseGenerator::new(self.seed.wrapping_add(2), self.feature_size)
                .field(rows, cols, size);
            for (flammable, n) in layers.flammable.iter_mut().zip(&mask) {
                if *n < level {
                    *flammable = false;
                }
            }
        }

        debug!(rows, cols, seed = self.seed, "generated synthetic layers");
        Ok(layers)
    }
}

/// Length unit of raster values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    /// Metres
    #[default]
    Meters,
    /// International feet
    Feet,
}

/// Pre-loaded raster arrays (fuel model codes and elevation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterAdapter {
    /// Raster rows
    pub rows: usize,
    /// Raster columns
    pub cols: usize,
    /// NFFL fuel model code per cell, row-major
    pub fuel_codes: Vec<u8>,
    /// Elevation per cell, row-major
    pub elevation: Vec<f64>,
    /// Unit of `elevation`
    #[serde(default)]
    pub elevation_unit: LengthUnit,
    /// Pixel edge length
    pub pixel_scale: f64,
    /// Unit of `pixel_scale`
    #[serde(default)]
    pub pixel_unit: LengthUnit,
}

impl RasterAdapter {
    /// Pixel edge length in metres
    ///
    /// # Errors
    /// `LayerError::InvalidRegion` if the pixel scale is not positive.
    pub fn cell_size(&self) -> Result<f64, LayerError> {
        if !(self.pixel_scale.is_finite() && self.pixel_scale > 0.0) {
            return Err(LayerError::InvalidRegion {
                reason: format!("pixel scale {} must be positive", self.pixel_scale),
            });
        }
        Ok(match self.pixel_unit {
            LengthUnit::Meters => self.pixel_scale,
            LengthUnit::Feet => Feet::new(self.pixel_scale).to_meters().value(),
        })
    }

    /// The region this raster covers
    ///
    /// # Errors
    /// See [`RasterAdapter::cell_size`].
    pub fn region(&self) -> Result<Region, LayerError> {
        Ok(Region::new(self.rows, self.cols, self.cell_size()?))
    }
}

impl LayerProvider for RasterAdapter {
    fn static_layers(&self, region: &Region) -> Result<StaticLayers, LayerError> {
        region.validate()?;
        if (region.rows, region.cols) != (self.rows, self.cols) {
            return Err(LayerError::RegionMismatch {
                requested: (region.rows, region.cols),
                available: (self.rows, self.cols),
            });
        }
        let native = self.cell_size()?;
        if (native - region.cell_size).abs() > 1e-6 * native {
            return Err(LayerError::InvalidRegion {
                reason: format!(
                    "requested cell size {} m but raster pixels are {native} m",
                    region.cell_size
                ),
            });
        }
        let cells = region.cells();
        for (layer, actual) in [
            ("fuel_codes", self.fuel_codes.len()),
            ("elevation", self.elevation.len()),
        ] {
            if actual != cells {
                return Err(LayerError::DimensionMismatch {
                    layer,
                    expected: cells,
                    actual,
                });
            }
        }

        let elevation = self
            .elevation
            .iter()
            .map(|&z| match self.elevation_unit {
                LengthUnit::Meters => z,
                LengthUnit::Feet => Elevation::feet(z).value(),
            })
            .collect();

        let mut unknown = 0usize;
        let models: Vec<Option<FuelModel>> = self
            .fuel_codes
            .iter()
            .map(|&code| {
                let model = FuelModel::from_code(code);
                if model.is_none() && !FuelModel::is_nonburnable_code(code) {
                    unknown += 1;
                }
                model
            })
            .collect();
        if unknown > 0 {
            warn!(cells = unknown, "unknown fuel codes treated as unburnable");
        }

        StaticLayers::from_fuel_models(self.rows, self.cols, &models, elevation).map_err(|_| {
            LayerError::DimensionMismatch {
                layer: "fuel_codes",
                expected: cells,
                actual: self.fuel_codes.len(),
            }
        })
    }
}

/// Provider chosen by configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerSource {
    /// Seeded noise terrain
    Synthetic(SyntheticTerrain),
    /// Pre-loaded raster arrays
    Raster(RasterAdapter),
}

impl LayerProvider for LayerSource {
    fn static_layers(&self, region: &Region) -> Result<StaticLayers, LayerError> {
        match self {
            LayerSource::Synthetic(p) => p.static_layers(region),
            LayerSource::Raster(p) => p.static_layers(region),
        }
    }
}
