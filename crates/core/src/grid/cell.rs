//! Grid cell state

use crate::core_types::fuel::FuelParameters;
use crate::physics::FuelBed;
use serde::{Deserialize, Serialize};

/// Fixed-point scale for spread pressure (units per 1.0 of pressure)
///
/// Integer accumulation keeps the sum independent of the order in which
/// burning neighbours contribute.
pub const PRESSURE_SCALE: f64 = 4_294_967_296.0;

/// Convert a pressure increment to fixed point, saturating
#[inline]
#[must_use]
pub fn pressure_to_fixed(pressure: f64) -> u64 {
    if pressure.is_nan() || pressure <= 0.0 {
        return 0;
    }
    let scaled = (pressure * PRESSURE_SCALE).round();
    if scaled >= u64::MAX as f64 {
        u64::MAX
    } else {
        scaled as u64
    }
}

/// Convert fixed-point pressure back to a real value
#[inline]
#[must_use]
pub fn pressure_from_fixed(fixed: u64) -> f64 {
    fixed as f64 / PRESSURE_SCALE
}

/// Burn state of a cell
///
/// Transitions only move forward: `Unburned -> Burning -> Burned`.
/// `Unburnable` is assigned at initialization and never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStatus {
    /// Non-flammable (water, road, rock, invalid fuel)
    Unburnable,
    /// Flammable and not yet ignited
    Unburned,
    /// Currently burning
    Burning,
    /// Fuel consumed
    Burned,
}

impl CellStatus {
    /// Numeric code used in snapshots
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            CellStatus::Unburned => 0,
            CellStatus::Burning => 1,
            CellStatus::Burned => 2,
            CellStatus::Unburnable => 3,
        }
    }

    /// Inverse of [`CellStatus::code`]
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(CellStatus::Unburned),
            1 => Some(CellStatus::Burning),
            2 => Some(CellStatus::Burned),
            3 => Some(CellStatus::Unburnable),
            _ => None,
        }
    }

    /// Burning or burned
    #[inline]
    #[must_use]
    pub const fn is_affected(self) -> bool {
        matches!(self, CellStatus::Burning | CellStatus::Burned)
    }
}

/// Row/column address on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    /// Row (grows southward)
    pub row: usize,
    /// Column (grows eastward)
    pub col: usize,
}

impl GridCoord {
    /// Create a coordinate
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl From<(usize, usize)> for GridCoord {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

/// One grid location
#[derive(Debug, Clone)]
pub struct Cell {
    pub(crate) coord: GridCoord,
    pub(crate) fuel: Option<FuelParameters>,
    pub(crate) bed: Option<FuelBed>,
    pub(crate) elevation: f64,
    pub(crate) burnout_duration: f64,
    pub(crate) status: CellStatus,
    pub(crate) ignition_time: Option<f64>,
    pub(crate) pressure: u64,
    pub(crate) peak_intensity: f64,
}

impl Cell {
    pub(crate) fn unburnable(coord: GridCoord, elevation: f64) -> Self {
        Self {
            coord,
            fuel: None,
            bed: None,
            elevation,
            burnout_duration: 0.0,
            status: CellStatus::Unburnable,
            ignition_time: None,
            pressure: 0,
            peak_intensity: 0.0,
        }
    }

    pub(crate) fn flammable(
        coord: GridCoord,
        fuel: FuelParameters,
        bed: FuelBed,
        elevation: f64,
        burnout_duration: f64,
    ) -> Self {
        Self {
            coord,
            fuel: Some(fuel),
            bed: Some(bed),
            elevation,
            burnout_duration,
            status: CellStatus::Unburned,
            ignition_time: None,
            pressure: 0,
            peak_intensity: 0.0,
        }
    }

    /// Grid address
    #[must_use]
    pub fn coord(&self) -> GridCoord {
        self.coord
    }

    /// Current burn state
    #[must_use]
    pub fn status(&self) -> CellStatus {
        self.status
    }

    /// Static fuel properties (`None` when unburnable)
    #[must_use]
    pub fn fuel(&self) -> Option<&FuelParameters> {
        self.fuel.as_ref()
    }

    /// Elevation (m)
    #[must_use]
    pub fn elevation(&self) -> f64 {
        self.elevation
    }

    /// Simulation time of ignition (s)
    #[must_use]
    pub fn ignition_time(&self) -> Option<f64> {
        self.ignition_time
    }

    /// Seconds burning at `now`, or `None` if never ignited
    #[must_use]
    pub fn time_since_ignition(&self, now: f64) -> Option<f64> {
        self.ignition_time.map(|t| now - t)
    }

    /// Burn duration before burnout (s)
    #[must_use]
    pub fn burnout_duration(&self) -> f64 {
        self.burnout_duration
    }

    /// Accumulated spread pressure (meaningful while unburned)
    #[must_use]
    pub fn accumulated_pressure(&self) -> f64 {
        pressure_from_fixed(self.pressure)
    }

    /// Highest fireline intensity observed while burning (kW/m)
    #[must_use]
    pub fn peak_intensity(&self) -> f64 {
        self.peak_intensity
    }
}
