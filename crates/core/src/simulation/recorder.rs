//! Output recording
//!
//! The scheduler keeps only the current grid. Everything it emits goes
//! through an [`OutputRecorder`]: the run header and elevation, then one
//! snapshot per tick together with the environment field that drove it, and
//! finally the run metadata.

use super::snapshot::{RunHeader, RunMetadata, Snapshot};
use crate::environment::EnvironmentField;
use crate::grid::CellStatus;
use serde::{Deserialize, Serialize};

/// Consumer of simulation output
pub trait OutputRecorder {
    /// Called at the start of every run phase, before the initial snapshot
    /// of a fresh run
    fn begin(&mut self, _header: &RunHeader, _elevation: &[f64]) {}

    /// Called for every snapshot; `environment` is `None` for the initial
    /// state and the field used by the tick otherwise
    fn record(&mut self, snapshot: &Snapshot, environment: Option<&EnvironmentField>);

    /// Called whenever a run phase stops, including after a failure
    fn finish(&mut self, _metadata: &RunMetadata) {}
}

impl OutputRecorder for Vec<Snapshot> {
    fn record(&mut self, snapshot: &Snapshot, _environment: Option<&EnvironmentField>) {
        self.push(snapshot.clone());
    }
}

/// One point of the spread curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadPoint {
    /// Tick
    pub tick: u64,
    /// Simulation time (s)
    pub time: f64,
    /// Cells burning
    pub burning: usize,
    /// Cells burned out
    pub burned: usize,
    /// Burning plus burned area (m²)
    pub affected_area: f64,
}

/// In-memory recorder keeping the full history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationHistory {
    header: Option<RunHeader>,
    elevation: Vec<f64>,
    snapshots: Vec<Snapshot>,
    wind_speed: Vec<Vec<f64>>,
    wind_direction: Vec<Vec<f64>>,
    metadata: Option<RunMetadata>,
}

impl SimulationHistory {
    /// Empty history
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run header, once the run has begun
    #[must_use]
    pub fn header(&self) -> Option<&RunHeader> {
        self.header.as_ref()
    }

    /// Elevation array (m)
    #[must_use]
    pub fn elevation(&self) -> &[f64] {
        &self.elevation
    }

    /// All snapshots in tick order
    #[must_use]
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Most recent snapshot
    #[must_use]
    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    /// Number of snapshots
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Wind speed arrays; entry `k` drove tick `k + 1`
    #[must_use]
    pub fn wind_speeds(&self) -> &[Vec<f64>] {
        &self.wind_speed
    }

    /// Wind direction arrays; entry `k` drove tick `k + 1`
    #[must_use]
    pub fn wind_directions(&self) -> &[Vec<f64>] {
        &self.wind_direction
    }

    /// Final metadata, once the run has stopped
    #[must_use]
    pub fn metadata(&self) -> Option<&RunMetadata> {
        self.metadata.as_ref()
    }

    /// First tick at which each cell was burning or burned, `-1` if never
    #[must_use]
    pub fn burn_time_matrix(&self) -> Vec<i64> {
        let cells = self.snapshots.first().map_or(0, |s| s.status.len());
        let mut first = vec![-1i64; cells];
        for snapshot in &self.snapshots {
            for (slot, &code) in first.iter_mut().zip(&snapshot.status) {
                let affected = CellStatus::from_code(code).is_some_and(CellStatus::is_affected);
                if *slot < 0 && affected {
                    *slot = snapshot.tick as i64;
                }
            }
        }
        first
    }

    /// Burning, burned and affected area per tick
    #[must_use]
    pub fn spread_curve(&self) -> Vec<SpreadPoint> {
        let cell_area = self.header.as_ref().map_or(0.0, |h| h.cell_size * h.cell_size);
        self.snapshots
            .iter()
            .map(|s| SpreadPoint {
                tick: s.tick,
                time: s.time,
                burning: s.burning,
                burned: s.burned,
                affected_area: s.affected() as f64 * cell_area,
            })
            .collect()
    }
}

impl OutputRecorder for SimulationHistory {
    fn begin(&mut self, header: &RunHeader, elevation: &[f64]) {
        self.header = Some(header.clone());
        self.elevation = elevation.to_vec();
    }

    fn record(&mut self, snapshot: &Snapshot, environment: Option<&EnvironmentField>) {
        if let Some(field) = environment {
            let cells = snapshot.status.len();
            self.wind_speed.push(field.wind_speed_array(cells));
            self.wind_direction.push(field.wind_direction_array(cells));
        }
        self.snapshots.push(snapshot.clone());
    }

    fn finish(&mut self, metadata: &RunMetadata) {
        self.metadata = Some(metadata.clone());
    }
}
