//! Static per-cell input layers

use crate::core_types::fuel::{FuelModel, FuelParameters};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Row-major static arrays describing terrain and fuel
///
/// Every array holds `rows * cols` entries. Fuel arrays are ignored where
/// `flammable` is false.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StaticLayers {
    /// Number of rows
    pub rows: usize,
    /// Number of columns
    pub cols: usize,
    /// Elevation (m)
    pub elevation: Vec<f64>,
    /// Fuel load `w_0` (kg/m²)
    pub fuel_load: Vec<f64>,
    /// Surface-area-to-volume ratio (1/m)
    pub surface_area_to_volume: Vec<f64>,
    /// Fuel bed depth (m)
    pub fuel_bed_depth: Vec<f64>,
    /// Moisture of extinction (fraction)
    pub extinction_moisture: Vec<f64>,
    /// Heat content (kJ/kg)
    pub heat_content: Vec<f64>,
    /// Flammability mask
    pub flammable: Vec<bool>,
}

impl StaticLayers {
    /// Flat ground at elevation 0 covered by one fuel model
    #[must_use]
    pub fn uniform(rows: usize, cols: usize, model: FuelModel) -> Self {
        let cells = rows * cols;
        let p = model.parameters();
        Self {
            rows,
            cols,
            elevation: vec![0.0; cells],
            fuel_load: vec![p.fuel_load; cells],
            surface_area_to_volume: vec![p.surface_area_to_volume; cells],
            fuel_bed_depth: vec![p.fuel_bed_depth; cells],
            extinction_moisture: vec![p.extinction_moisture; cells],
            heat_content: vec![p.heat_content; cells],
            flammable: vec![true; cells],
        }
    }

    /// Layers from a per-cell fuel model map (`None` is unburnable)
    ///
    /// # Errors
    /// `ConfigError::DimensionMismatch` if either array does not hold
    /// `rows * cols` entries.
    pub fn from_fuel_models(
        rows: usize,
        cols: usize,
        models: &[Option<FuelModel>],
        elevation: Vec<f64>,
    ) -> Result<Self, ConfigError> {
        let cells = rows * cols;
        check_len("fuel_model", cells, models.len())?;
        check_len("elevation", cells, elevation.len())?;

        let mut layers = Self::uniform(rows, cols, FuelModel::ShortGrass);
        layers.elevation = elevation;
        for (idx, model) in models.iter().enumerate() {
            match model {
                Some(m) => layers.set_parameters(idx, &m.parameters()),
                None => layers.flammable[idx] = false,
            }
        }
        Ok(layers)
    }

    /// Replace the elevation layer
    pub fn with_elevation(mut self, elevation: Vec<f64>) -> Self {
        self.elevation = elevation;
        self
    }

    /// Number of cells
    #[must_use]
    pub fn cells(&self) -> usize {
        self.rows * self.cols
    }

    /// Set one cell's fuel to a model
    ///
    /// Out-of-range coordinates are ignored.
    pub fn set_fuel(&mut self, row: usize, col: usize, model: FuelModel) {
        if let Some(idx) = self.index(row, col) {
            self.set_parameters(idx, &model.parameters());
            self.flammable[idx] = true;
        }
    }

    /// Mark one cell unburnable (water, road, rock)
    pub fn set_unburnable(&mut self, row: usize, col: usize) {
        if let Some(idx) = self.index(row, col) {
            self.flammable[idx] = false;
        }
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row * self.cols + col)
    }

    pub(crate) fn set_parameters(&mut self, idx: usize, p: &FuelParameters) {
        self.fuel_load[idx] = p.fuel_load;
        self.surface_area_to_volume[idx] = p.surface_area_to_volume;
        self.fuel_bed_depth[idx] = p.fuel_bed_depth;
        self.extinction_moisture[idx] = p.extinction_moisture;
        self.heat_content[idx] = p.heat_content;
    }

    /// Fuel parameters at a row-major index, `None` if not flammable
    #[must_use]
    pub fn fuel_at(&self, idx: usize) -> Option<FuelParameters> {
        if !self.flammable[idx] {
            return None;
        }
        Some(FuelParameters {
            fuel_load: self.fuel_load[idx],
            surface_area_to_volume: self.surface_area_to_volume[idx],
            fuel_bed_depth: self.fuel_bed_depth[idx],
            extinction_moisture: self.extinction_moisture[idx],
            heat_content: self.heat_content[idx],
        })
    }

    /// Check that every layer covers the grid and elevation is finite
    ///
    /// # Errors
    /// `ConfigError::DimensionMismatch` for the first short or long layer,
    /// `ConfigError::InvalidValue` for empty dimensions or bad elevation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::invalid(
                "grid dimensions",
                format!("{}x{} grid has no cells", self.rows, self.cols),
            ));
        }
        let cells = self.cells();
        check_len("elevation", cells, self.elevation.len())?;
        check_len("fuel_load", cells, self.fuel_load.len())?;
        check_len(
            "surface_area_to_volume",
            cells,
            self.surface_area_to_volume.len(),
        )?;
        check_len("fuel_bed_depth", cells, self.fuel_bed_depth.len())?;
        check_len("extinction_moisture", cells, self.extinction_moisture.len())?;
        check_len("heat_content", cells, self.heat_content.len())?;
        check_len("flammable", cells, self.flammable.len())?;
        if let Some(i) = self.elevation.iter().position(|z| !z.is_finite()) {
            return Err(ConfigError::invalid(
                "elevation",
                format!("cell {i} is not finite"),
            ));
        }
        Ok(())
    }
}

fn check_len(layer: &'static str, expected: usize, actual: usize) -> Result<(), ConfigError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ConfigError::DimensionMismatch {
            layer,
            expected,
            actual,
        })
    }
}
