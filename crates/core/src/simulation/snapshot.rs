//! Output types: per-tick snapshots and run metadata

use crate::grid::{CellAnomaly, CellStatus, Connectivity, GridCoord};
use serde::{Deserialize, Serialize};

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// No cell is burning
    Extinguished,
    /// Tick or duration limit reached
    MaxStepsReached,
    /// Cancellation requested
    Cancelled,
}

/// Grid state after one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Completed tick count (0 for the initial state)
    pub tick: u64,
    /// Simulation time (s)
    pub time: f64,
    /// Status code per cell, row-major
    pub status: Vec<u8>,
    /// Ignition time per cell (s), `-1` for never ignited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignition_time: Option<Vec<f64>>,
    /// Peak fireline intensity per cell (kW/m)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<Vec<f64>>,
    /// Cells burning after this tick
    pub burning: usize,
    /// Cells burned out after this tick
    pub burned: usize,
    /// Cells ignited during this tick
    pub newly_ignited: usize,
    /// Cells that burned out during this tick
    pub newly_burned: usize,
}

impl Snapshot {
    /// Status of the cell at a row-major index
    #[must_use]
    pub fn status_at(&self, idx: usize) -> Option<CellStatus> {
        self.status.get(idx).copied().and_then(CellStatus::from_code)
    }

    /// Burning plus burned cells
    #[must_use]
    pub fn affected(&self) -> usize {
        self.burning + self.burned
    }
}

/// Static facts about a run, known before the first tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunHeader {
    /// Grid rows
    pub rows: usize,
    /// Grid columns
    pub cols: usize,
    /// Cell edge length (m)
    pub cell_size: f64,
    /// Tick length (s)
    pub time_step: f64,
    /// Neighbourhood
    pub connectivity: Connectivity,
    /// Ignition set (deduplicated, in input order)
    pub ignition_points: Vec<GridCoord>,
    /// Number of flammable cells after anomaly demotion
    pub flammable_cells: usize,
}

/// Summary statistics of the current grid
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Cells currently burning
    pub burning_cells: usize,
    /// Cells burned out
    pub burned_cells: usize,
    /// Burned cells over flammable cells
    pub burned_fraction: f64,
    /// Burned-out area (ha)
    pub burned_area_ha: f64,
    /// Burning plus burned area (ha)
    pub affected_area_ha: f64,
    /// Cells ignited by embers
    pub spot_ignitions: usize,
}

/// Run metadata, available at any point of the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Static run facts
    pub header: RunHeader,
    /// Why the run stopped, `None` while running or after an environment
    /// failure
    pub termination: Option<TerminationReason>,
    /// Number of ticks completed
    pub completed_ticks: u64,
    /// Simulation time of the last completed tick (s)
    pub final_time: f64,
    /// Cells demoted to unburnable at build time
    pub anomalies: Vec<CellAnomaly>,
    /// Environment failure that halted the run, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    /// Grid statistics
    pub stats: RunStats,
}
