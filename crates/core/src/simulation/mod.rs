//! Spread scheduler
//!
//! [`Simulation`] owns the [`FireGrid`] and advances it one tick at a time:
//!
//! 1. Fetch the environment field for the tick and apply global overrides
//! 2. For every burning cell (in parallel), compute the Rothermel rate toward
//!    each unburned neighbour and convert it to fixed-point pressure
//! 3. Accumulate pressure, launch embers (if enabled)
//! 4. Ignite every cell at or over the threshold, all at once
//! 5. Burn out cells that were burning at the start of the tick and have
//!    reached their burnout duration
//! 6. Emit a snapshot and check for termination
//!
//! Pressure is integer fixed point, so the parallel rate computation cannot
//! change the outcome: identical inputs give bit-identical snapshots.

mod cancel;
mod config;
mod recorder;
mod snapshot;

pub use cancel::CancelToken;
pub use config::{parse_runtime, BurnoutPolicy, SimulationConfig, SnapshotOptions};
pub use recorder::{OutputRecorder, SimulationHistory, SpreadPoint};
pub use snapshot::{RunHeader, RunMetadata, RunStats, Snapshot, TerminationReason};

use crate::core_types::units::Seconds;
use crate::environment::{EnvironmentField, EnvironmentProvider};
use crate::error::{ConfigError, SimulationError};
use crate::grid::cell::pressure_to_fixed;
use crate::grid::{CellStatus, FireGrid, LayerProvider, StaticLayers};
use crate::physics::SpotFireModel;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use tracing::{debug, info, warn};

/// Tolerance when comparing elapsed burn time against burnout duration
const BURNOUT_EPSILON: f64 = 1e-9;

/// Pressure one burning cell sends to its neighbours in one tick
struct SourceContribution {
    source: usize,
    targets: Vec<(usize, u64)>,
    head_intensity: f64,
}

/// A running (or finished) fire spread simulation
pub struct Simulation<E> {
    config: SimulationConfig,
    grid: FireGrid,
    environment: E,
    spotting: Option<SpotFireModel>,
    cancel: CancelToken,
    header: RunHeader,
    threshold: u64,
    step_limit: Option<u64>,
    tick: u64,
    time: f64,
    termination: Option<TerminationReason>,
    failure: Option<String>,
    spot_ignitions: usize,
}

impl<E: EnvironmentProvider> Simulation<E> {
    /// Build a simulation from configuration, static layers and an
    /// environment provider
    ///
    /// Ignition points are burning at time 0.
    ///
    /// # Errors
    /// `InvalidConfiguration` if the configuration is out of range, the
    /// layers do not match the grid, or an ignition point is outside the grid
    /// or on an unburnable cell.
    pub fn new(
        config: SimulationConfig,
        layers: &StaticLayers,
        environment: E,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        if (layers.rows, layers.cols) != (config.rows, config.cols) {
            return Err(ConfigError::DimensionMismatch {
                layer: "static layers",
                expected: config.rows * config.cols,
                actual: layers.rows * layers.cols,
            }
            .into());
        }

        let mut grid = FireGrid::build(
            layers,
            config.cell_size,
            config.connectivity,
            &config.burnout,
        )?;

        let mut seen = FxHashSet::default();
        let mut ignition_points = Vec::with_capacity(config.ignition_points.len());
        for &p in &config.ignition_points {
            if !seen.insert(p) {
                continue;
            }
            let idx = grid
                .index(p.row, p.col)
                .ok_or(ConfigError::IgnitionOutOfBounds {
                    row: p.row,
                    col: p.col,
                    rows: config.rows,
                    cols: config.cols,
                })?;
            if !grid.ignite(idx, 0.0) {
                return Err(ConfigError::IgnitionOnUnburnable {
                    row: p.row,
                    col: p.col,
                }
                .into());
            }
            ignition_points.push(p);
        }

        let header = RunHeader {
            rows: config.rows,
            cols: config.cols,
            cell_size: config.cell_size,
            time_step: config.time_step,
            connectivity: config.connectivity,
            ignition_points,
            flammable_cells: grid.len() - grid.count(CellStatus::Unburnable),
        };

        info!(
            rows = config.rows,
            cols = config.cols,
            cell_size = config.cell_size,
            time_step = config.time_step,
            ignitions = header.ignition_points.len(),
            anomalies = grid.anomalies().len(),
            "fire spread simulation initialized"
        );

        Ok(Self {
            threshold: pressure_to_fixed(config.ignition_threshold).max(1),
            step_limit: config.step_limit(),
            spotting: config.spotting.map(SpotFireModel::new),
            config,
            grid,
            environment,
            cancel: CancelToken::new(),
            header,
            tick: 0,
            time: 0.0,
            termination: None,
            failure: None,
            spot_ignitions: 0,
        })
    }

    /// Build a simulation with layers requested from a provider
    ///
    /// # Errors
    /// `LayerUnavailable` if the provider cannot cover the configured region,
    /// otherwise as [`Simulation::new`].
    pub fn from_provider(
        config: SimulationConfig,
        layers: &impl LayerProvider,
        environment: E,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        let layers = layers.static_layers(&config.region())?;
        Self::new(config, &layers, environment)
    }

    /// Use an externally created cancellation token
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels this run when triggered
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Current grid
    #[must_use]
    pub fn grid(&self) -> &FireGrid {
        &self.grid
    }

    /// Completed tick count
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Current simulation time (s)
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Why the run stopped, if it has
    #[must_use]
    pub fn termination(&self) -> Option<TerminationReason> {
        self.termination
    }

    /// Whether further ticks are refused
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.termination.is_some() || self.failure.is_some()
    }

    /// Snapshot of the current state
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_with(0, 0)
    }

    fn snapshot_with(&self, newly_ignited: usize, newly_burned: usize) -> Snapshot {
        let options = self.config.snapshots;
        Snapshot {
            tick: self.tick,
            time: self.time,
            status: self.grid.status_codes(),
            ignition_time: options
                .ignition_times
                .then(|| self.grid.ignition_times()),
            intensity: options.intensity.then(|| self.grid.intensities()),
            burning: self.grid.count(CellStatus::Burning),
            burned: self.grid.count(CellStatus::Burned),
            newly_ignited,
            newly_burned,
        }
    }

    /// Metadata for the run so far
    #[must_use]
    pub fn metadata(&self) -> RunMetadata {
        let burning = self.grid.count(CellStatus::Burning);
        let burned = self.grid.count(CellStatus::Burned);
        let flammable = self.header.flammable_cells;
        let cell_area = self.config.cell_size * self.config.cell_size;
        RunMetadata {
            header: self.header.clone(),
            termination: self.termination,
            completed_ticks: self.tick,
            final_time: self.time,
            anomalies: self.grid.anomalies().to_vec(),
            failure: self.failure.clone(),
            stats: RunStats {
                burning_cells: burning,
                burned_cells: burned,
                burned_fraction: if flammable == 0 {
                    0.0
                } else {
                    burned as f64 / flammable as f64
                },
                burned_area_ha: burned as f64 * cell_area / 10_000.0,
                affected_area_ha: (burning + burned) as f64 * cell_area / 10_000.0,
                spot_ignitions: self.spot_ignitions,
            },
        }
    }

    /// Advance one tick
    ///
    /// Returns `Ok(None)` without advancing if cancellation was requested;
    /// the run is then terminated as `Cancelled`.
    ///
    /// # Errors
    /// `AlreadyTerminated` once the run has stopped, `EnvironmentUnavailable`
    /// if the provider fails (the current state remains the last valid one).
    pub fn step(&mut self) -> Result<Option<Snapshot>, SimulationError> {
        Ok(self.advance()?.map(|(snapshot, _)| snapshot))
    }

    /// Run to termination, streaming every snapshot to `recorder`
    ///
    /// The initial state is recorded as tick 0 before the first tick runs.
    ///
    /// # Errors
    /// `AlreadyTerminated` if called on a finished run (a run stopped by its
    /// step or duration limit can be extended with [`Simulation::run_for`]),
    /// `EnvironmentUnavailable` if the provider fails mid-run; the recorder
    /// has received every snapshot up to the last completed tick and its
    /// `finish` hook has run.
    pub fn run(&mut self, recorder: &mut impl OutputRecorder) -> Result<RunMetadata, SimulationError> {
        if self.is_finished() {
            return Err(SimulationError::AlreadyTerminated);
        }
        recorder.begin(&self.header, &self.grid.elevations());
        if self.tick == 0 {
            recorder.record(&self.snapshot(), None);
        }

        while !self.is_finished() {
            match self.advance() {
                Ok(Some((snapshot, field))) => recorder.record(&snapshot, Some(&field)),
                Ok(None) => break,
                Err(e) => {
                    recorder.finish(&self.metadata());
                    return Err(e);
                }
            }
        }

        let metadata = self.metadata();
        recorder.finish(&metadata);
        Ok(metadata)
    }

    /// Run for `duration` more simulated time, streaming to `recorder`
    ///
    /// The new limit is `duration` past the current time, rounded up to whole
    /// ticks, and replaces any configured limit. A run stopped by its limit
    /// resumes where it stopped. Extinguished, cancelled or failed runs stay
    /// final.
    ///
    /// # Errors
    /// `InvalidConfiguration` if `duration` is not positive, otherwise as
    /// [`Simulation::run`].
    pub fn run_for(
        &mut self,
        duration: Seconds,
        recorder: &mut impl OutputRecorder,
    ) -> Result<RunMetadata, SimulationError> {
        let seconds = duration.value();
        if !(seconds.is_finite() && seconds > 0.0) {
            return Err(
                ConfigError::invalid("run duration", format!("{seconds} s must be positive")).into(),
            );
        }
        if self.failure.is_none() && self.termination == Some(TerminationReason::MaxStepsReached) {
            self.termination = None;
        }
        if self.is_finished() {
            return Err(SimulationError::AlreadyTerminated);
        }

        let ticks = ((seconds / self.config.time_step).ceil() as u64).max(1);
        self.step_limit = Some(self.tick + ticks);
        info!(
            from_tick = self.tick,
            until_tick = self.tick + ticks,
            "running simulation phase"
        );
        self.run(recorder)
    }

    /// [`Simulation::run_for`] with a human-readable duration such as `"2h"`
    ///
    /// # Errors
    /// `InvalidConfiguration` if the string does not parse, otherwise as
    /// [`Simulation::run_for`].
    pub fn run_for_runtime(
        &mut self,
        runtime: &str,
        recorder: &mut impl OutputRecorder,
    ) -> Result<RunMetadata, SimulationError> {
        self.run_for(parse_runtime(runtime)?, recorder)
    }

    fn advance(&mut self) -> Result<Option<(Snapshot, EnvironmentField)>, SimulationError> {
        if self.is_finished() {
            return Err(SimulationError::AlreadyTerminated);
        }
        if self.cancel.is_cancelled() {
            info!(tick = self.tick, "simulation cancelled");
            self.termination = Some(TerminationReason::Cancelled);
            return Ok(None);
        }

        let n = self.tick;
        let start = n as f64 * self.config.time_step;
        let field = match self.fetch_environment(n, start) {
            Ok(field) => field,
            Err(source) => {
                warn!(tick = n, error = %source, "environment unavailable, halting run");
                self.failure = Some(source.to_string());
                return Err(SimulationError::EnvironmentUnavailable {
                    last_completed_tick: n,
                    source,
                });
            }
        };
        let end = (n + 1) as f64 * self.config.time_step;

        let burning = self.grid.burning_indices();
        let contributions: Vec<SourceContribution> = burning
            .par_iter()
            .map(|&source| contribution(&self.grid, &self.config, source, &field))
            .collect();

        for c in &contributions {
            self.grid.record_intensity(c.source, c.head_intensity);
            for &(target, fixed) in &c.targets {
                self.grid.add_pressure(target, fixed);
            }
        }

        let spots = self.launch_embers(&contributions, &field);

        let mut to_ignite: Vec<usize> = self
            .grid
            .cells()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.status() == CellStatus::Unburned && c.pressure >= self.threshold)
            .map(|(i, _)| i)
            .collect();
        to_ignite.extend(&spots);

        let mut newly_ignited = 0;
        for idx in to_ignite {
            if self.grid.ignite(idx, end) {
                newly_ignited += 1;
            }
        }

        let mut newly_burned = 0;
        for &idx in &burning {
            let cell = self.grid.cell_at(idx);
            let elapsed = cell.time_since_ignition(end).unwrap_or(0.0);
            if elapsed + BURNOUT_EPSILON >= cell.burnout_duration() && self.grid.burn_out(idx) {
                newly_burned += 1;
            }
        }

        self.tick = n + 1;
        self.time = end;

        let snapshot = self.snapshot_with(newly_ignited, newly_burned);
        debug!(
            tick = self.tick,
            burning = snapshot.burning,
            burned = snapshot.burned,
            ignited = newly_ignited,
            burned_out = newly_burned,
            spots = spots.len(),
            "tick complete"
        );

        if snapshot.burning == 0 {
            self.termination = Some(TerminationReason::Extinguished);
        } else if self.step_limit.is_some_and(|limit| self.tick >= limit) {
            self.termination = Some(TerminationReason::MaxStepsReached);
        }
        if let Some(reason) = self.termination {
            info!(
                tick = self.tick,
                time = self.time,
                burned = snapshot.burned,
                ?reason,
                "simulation terminated"
            );
        }

        Ok(Some((snapshot, field)))
    }

    fn fetch_environment(
        &mut self,
        tick: u64,
        start: f64,
    ) -> Result<EnvironmentField, crate::error::EnvironmentError> {
        let field = self
            .environment
            .field(tick, Seconds::new(start))?
            .with_overrides(&self.config.overrides);
        field.validate(self.grid.len(), tick)?;
        Ok(field)
    }

    /// Ember landings that catch, processed in row-major source order
    fn launch_embers(
        &mut self,
        contributions: &[SourceContribution],
        field: &EnvironmentField,
    ) -> Vec<usize> {
        let Some(model) = self.spotting.as_mut() else {
            return Vec::new();
        };
        let mut landed = Vec::new();
        for c in contributions {
            let Some((d_row, d_col)) =
                model.launch(c.head_intensity, field.sample(c.source), self.grid.cell_size())
            else {
                continue;
            };
            let Some(target) = self.grid.offset_index(c.source, d_row, d_col) else {
                continue;
            };
            let cell = self.grid.cell_at(target);
            let receptive = cell.status() == CellStatus::Unburned
                && cell
                    .bed
                    .as_ref()
                    .is_some_and(|b| b.sustains_combustion(field.sample(target).moisture));
            if receptive && model.catches() {
                landed.push(target);
            }
        }
        landed.sort_unstable();
        landed.dedup();
        self.spot_ignitions += landed
            .iter()
            .filter(|&&i| self.grid.cell_at(i).pressure < self.threshold)
            .count();
        landed
    }
}

impl<E> std::fmt::Debug for Simulation<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("rows", &self.config.rows)
            .field("cols", &self.config.cols)
            .field("tick", &self.tick)
            .field("time", &self.time)
            .field("termination", &self.termination)
            .finish_non_exhaustive()
    }
}

/// Rates from one burning cell toward its unburned neighbours
///
/// The front burns into the target's fuel at the target's moisture, pushed by
/// the source's wind, over the slope between the two.
fn contribution(
    grid: &FireGrid,
    config: &SimulationConfig,
    source: usize,
    field: &EnvironmentField,
) -> SourceContribution {
    let limits = &config.spread_limits;
    let dt = config.time_step;
    let cell = grid.cell_at(source);
    let wind = field.sample(source);

    let mut out = SourceContribution {
        source,
        targets: Vec::new(),
        head_intensity: 0.0,
    };
    let Some(bed) = cell.bed.as_ref() else {
        return out;
    };
    if !bed.sustains_combustion(wind.moisture) {
        return out;
    }

    let head = bed.spread(wind.moisture, wind.wind_speed, 0.0, limits);
    out.head_intensity = head.fireline_intensity(bed);

    for (dir, target) in grid.neighbors(source) {
        let neighbour = grid.cell_at(target);
        if neighbour.status() != CellStatus::Unburned {
            continue;
        }
        let Some(target_bed) = neighbour.bed.as_ref() else {
            continue;
        };
        let distance = dir.distance(grid.cell_size());
        let slope = (neighbour.elevation() - cell.elevation()) / distance;
        let rate = target_bed
            .spread(
                field.sample(target).moisture,
                wind.aligned_wind(dir.bearing()),
                slope,
                limits,
            )
            .rate;
        let fixed = pressure_to_fixed(rate * dt / distance);
        if fixed > 0 {
            out.targets.push((target, fixed));
        }
    }
    out
}
