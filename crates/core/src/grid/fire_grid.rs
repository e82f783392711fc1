//! The fire state grid
//!
//! Owns every [`Cell`] in row-major order. Only the scheduler mutates it, and
//! only through the guarded transitions below, so a cell's status can never
//! move backwards.

use super::cell::{Cell, CellStatus, GridCoord};
use super::layers::StaticLayers;
use crate::error::ConfigError;
use crate::physics::FuelBed;
use crate::simulation::BurnoutPolicy;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Neighbour directions, in the fixed iteration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// North (row - 1)
    N,
    /// North-east
    NE,
    /// East (col + 1)
    E,
    /// South-east
    SE,
    /// South (row + 1)
    S,
    /// South-west
    SW,
    /// West (col - 1)
    W,
    /// North-west
    NW,
}

impl Direction {
    /// All eight directions: N, NE, E, SE, S, SW, W, NW
    pub const ALL: [Direction; 8] = [
        Direction::N,
        Direction::NE,
        Direction::E,
        Direction::SE,
        Direction::S,
        Direction::SW,
        Direction::W,
        Direction::NW,
    ];

    /// The four cardinal directions in the same relative order
    pub const CARDINAL: [Direction; 4] = [Direction::N, Direction::E, Direction::S, Direction::W];

    /// `(d_row, d_col)` step
    #[must_use]
    pub const fn offset(self) -> (isize, isize) {
        match self {
            Direction::N => (-1, 0),
            Direction::NE => (-1, 1),
            Direction::E => (0, 1),
            Direction::SE => (1, 1),
            Direction::S => (1, 0),
            Direction::SW => (1, -1),
            Direction::W => (0, -1),
            Direction::NW => (-1, -1),
        }
    }

    /// Compass bearing of the step (degrees clockwise from north)
    #[must_use]
    pub const fn bearing(self) -> f64 {
        match self {
            Direction::N => 0.0,
            Direction::NE => 45.0,
            Direction::E => 90.0,
            Direction::SE => 135.0,
            Direction::S => 180.0,
            Direction::SW => 225.0,
            Direction::W => 270.0,
            Direction::NW => 315.0,
        }
    }

    /// Whether the step is diagonal
    #[must_use]
    pub const fn is_diagonal(self) -> bool {
        matches!(
            self,
            Direction::NE | Direction::SE | Direction::SW | Direction::NW
        )
    }

    /// Centre-to-centre distance for a given cell size (m)
    #[inline]
    #[must_use]
    pub fn distance(self, cell_size: f64) -> f64 {
        if self.is_diagonal() {
            cell_size * std::f64::consts::SQRT_2
        } else {
            cell_size
        }
    }
}

/// Neighbourhood used for spread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// Von Neumann (N, E, S, W)
    Four,
    /// Moore (all eight)
    #[default]
    Eight,
}

impl Connectivity {
    /// Directions visited, in iteration order
    #[must_use]
    pub fn directions(self) -> &'static [Direction] {
        match self {
            Connectivity::Four => &Direction::CARDINAL,
            Connectivity::Eight => &Direction::ALL,
        }
    }
}

/// A cell whose fuel could not drive the spread model and was made unburnable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellAnomaly {
    /// Row of the cell
    pub row: usize,
    /// Column of the cell
    pub col: usize,
    /// Why it was demoted
    pub reason: String,
}

/// Row-major grid of cells
#[derive(Debug, Clone)]
pub struct FireGrid {
    rows: usize,
    cols: usize,
    cell_size: f64,
    connectivity: Connectivity,
    cells: Vec<Cell>,
    anomalies: Vec<CellAnomaly>,
}

impl FireGrid {
    /// Build the grid from validated static layers
    ///
    /// Cells with invalid fuel parameters are demoted to unburnable and listed
    /// in [`FireGrid::anomalies`].
    ///
    /// # Errors
    /// `ConfigError::DimensionMismatch` if any layer does not cover
    /// `rows * cols` cells.
    pub fn build(
        layers: &StaticLayers,
        cell_size: f64,
        connectivity: Connectivity,
        burnout: &BurnoutPolicy,
    ) -> Result<Self, ConfigError> {
        layers.validate()?;
        let (rows, cols) = (layers.rows, layers.cols);

        let mut anomalies = Vec::new();
        let mut cells = Vec::with_capacity(rows * cols);
        for idx in 0..rows * cols {
            let coord = GridCoord::new(idx / cols, idx % cols);
            let elevation = layers.elevation[idx];
            let cell = match layers.fuel_at(idx) {
                None => Cell::unburnable(coord, elevation),
                Some(fuel) => match FuelBed::new(&fuel) {
                    Ok(bed) => {
                        let duration = burnout.duration(&fuel, &bed);
                        Cell::flammable(coord, fuel, bed, elevation, duration)
                    }
                    Err(e) => {
                        warn!(row = coord.row, col = coord.col, error = %e, "demoting cell to unburnable");
                        anomalies.push(CellAnomaly {
                            row: coord.row,
                            col: coord.col,
                            reason: e.to_string(),
                        });
                        Cell::unburnable(coord, elevation)
                    }
                },
            };
            cells.push(cell);
        }

        Ok(Self {
            rows,
            cols,
            cell_size,
            connectivity,
            cells,
            anomalies,
        })
    }

    /// Number of rows
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Cell edge length (m)
    #[must_use]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Neighbourhood in use
    #[must_use]
    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    /// Total number of cells
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the grid has no cells
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Row-major index of `(row, col)`, or `None` outside the grid
    #[inline]
    #[must_use]
    pub fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row * self.cols + col)
    }

    /// Index after applying a signed offset, clipped at the edges
    #[inline]
    #[must_use]
    pub fn offset_index(&self, idx: usize, d_row: isize, d_col: isize) -> Option<usize> {
        let row = (idx / self.cols).checked_add_signed(d_row)?;
        let col = (idx % self.cols).checked_add_signed(d_col)?;
        self.index(row, col)
    }

    /// Cell at `(row, col)`
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.index(row, col).map(|i| &self.cells[i])
    }

    /// Cell at a row-major index
    #[inline]
    #[must_use]
    pub fn cell_at(&self, idx: usize) -> &Cell {
        &self.cells[idx]
    }

    /// All cells, row-major
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cells demoted at build time
    #[must_use]
    pub fn anomalies(&self) -> &[CellAnomaly] {
        &self.anomalies
    }

    /// In-bounds neighbours of `idx` in the fixed direction order
    pub fn neighbors(&self, idx: usize) -> impl Iterator<Item = (Direction, usize)> + '_ {
        self.connectivity
            .directions()
            .iter()
            .filter_map(move |&dir| {
                let (d_row, d_col) = dir.offset();
                self.offset_index(idx, d_row, d_col).map(|n| (dir, n))
            })
    }

    /// Indices of burning cells, row-major
    #[must_use]
    pub fn burning_indices(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.status == CellStatus::Burning)
            .map(|(i, _)| i)
            .collect()
    }

    /// Count cells in a given state
    #[must_use]
    pub fn count(&self, status: CellStatus) -> usize {
        self.cells.iter().filter(|c| c.status == status).count()
    }

    /// Add fixed-point pressure to an unburned cell; ignored otherwise
    pub(crate) fn add_pressure(&mut self, idx: usize, fixed: u64) {
        let cell = &mut self.cells[idx];
        if cell.status == CellStatus::Unburned {
            cell.pressure = cell.pressure.saturating_add(fixed);
        }
    }

    /// `Unburned -> Burning`; returns whether the transition happened
    pub(crate) fn ignite(&mut self, idx: usize, time: f64) -> bool {
        let cell = &mut self.cells[idx];
        if cell.status != CellStatus::Unburned {
            return false;
        }
        cell.status = CellStatus::Burning;
        cell.ignition_time = Some(time);
        cell.pressure = 0;
        true
    }

    /// `Burning -> Burned`; returns whether the transition happened
    pub(crate) fn burn_out(&mut self, idx: usize) -> bool {
        let cell = &mut self.cells[idx];
        if cell.status != CellStatus::Burning {
            return false;
        }
        cell.status = CellStatus::Burned;
        true
    }

    pub(crate) fn record_intensity(&mut self, idx: usize, intensity: f64) {
        let cell = &mut self.cells[idx];
        if intensity > cell.peak_intensity {
            cell.peak_intensity = intensity;
        }
    }

    /// Status codes, row-major (see [`CellStatus::code`])
    #[must_use]
    pub fn status_codes(&self) -> Vec<u8> {
        self.cells.iter().map(|c| c.status.code()).collect()
    }

    /// Ignition times (s), `-1.0` for never ignited
    #[must_use]
    pub fn ignition_times(&self) -> Vec<f64> {
        self.cells
            .iter()
            .map(|c| c.ignition_time.unwrap_or(-1.0))
            .collect()
    }

    /// Peak fireline intensity per cell (kW/m)
    #[must_use]
    pub fn intensities(&self) -> Vec<f64> {
        self.cells.iter().map(|c| c.peak_intensity).collect()
    }

    /// Elevation per cell (m)
    #[must_use]
    pub fn elevations(&self) -> Vec<f64> {
        self.cells.iter().map(|c| c.elevation).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::fuel::FuelModel;

    fn grid(rows: usize, cols: usize, connectivity: Connectivity) -> FireGrid {
        let layers = StaticLayers::uniform(rows, cols, FuelModel::ShortGrass);
        FireGrid::build(
            &layers,
            10.0,
            connectivity,
            &BurnoutPolicy::Fixed { seconds: 600.0 },
        )
        .unwrap()
    }

    #[test]
    fn corner_neighbors_are_clipped() {
        let g = grid(3, 3, Connectivity::Eight);
        let dirs: Vec<_> = g.neighbors(0).map(|(d, _)| d).collect();
        assert_eq!(dirs, vec![Direction::E, Direction::SE, Direction::S]);

        let last = g.index(2, 2).unwrap();
        let dirs: Vec<_> = g.neighbors(last).map(|(d, _)| d).collect();
        assert_eq!(dirs, vec![Direction::N, Direction::W, Direction::NW]);
    }

    #[test]
    fn center_neighbors_in_fixed_order() {
        let g = grid(3, 3, Connectivity::Eight);
        let center = g.index(1, 1).unwrap();
        let got: Vec<_> = g.neighbors(center).collect();
        assert_eq!(
            got,
            vec![
                (Direction::N, 1),
                (Direction::NE, 2),
                (Direction::E, 5),
                (Direction::SE, 8),
                (Direction::S, 7),
                (Direction::SW, 6),
                (Direction::W, 3),
                (Direction::NW, 0),
            ]
        );

        let g4 = grid(3, 3, Connectivity::Four);
        let got: Vec<_> = g4.neighbors(center).map(|(_, n)| n).collect();
        assert_eq!(got, vec![1, 5, 7, 3]);
    }

    #[test]
    fn transitions_only_move_forward() {
        let mut g = grid(2, 2, Connectivity::Eight);
        assert!(!g.burn_out(0), "unburned cell cannot burn out");
        assert!(g.ignite(0, 60.0));
        assert!(!g.ignite(0, 120.0), "burning cell cannot re-ignite");
        assert_eq!(g.cell_at(0).ignition_time(), Some(60.0));
        assert!(g.burn_out(0));
        assert!(!g.ignite(0, 180.0));
        assert_eq!(g.cell_at(0).status(), CellStatus::Burned);
    }

    #[test]
    fn pressure_only_accumulates_on_unburned() {
        let mut g = grid(1, 2, Connectivity::Four);
        g.add_pressure(0, 5);
        g.add_pressure(0, 7);
        assert_eq!(g.cell_at(0).pressure, 12);
        g.ignite(0, 0.0);
        assert_eq!(g.cell_at(0).pressure, 0);
        g.add_pressure(0, 7);
        assert_eq!(g.cell_at(0).pressure, 0);
    }

    #[test]
    fn invalid_fuel_is_demoted() {
        let mut layers = StaticLayers::uniform(2, 2, FuelModel::ShortGrass);
        layers.fuel_bed_depth[3] = 0.0;
        let g = FireGrid::build(
            &layers,
            10.0,
            Connectivity::Eight,
            &BurnoutPolicy::default(),
        )
        .unwrap();
        assert_eq!(g.cell_at(3).status(), CellStatus::Unburnable);
        assert_eq!(g.anomalies().len(), 1);
        assert_eq!((g.anomalies()[0].row, g.anomalies()[0].col), (1, 1));
    }

    #[test]
    fn diagonal_distance() {
        assert_eq!(Direction::E.distance(10.0), 10.0);
        assert!((Direction::NE.distance(10.0) - 14.142_135_623_730_951).abs() < 1e-12);
    }
}
