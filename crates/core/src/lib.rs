//! Fire Spread Core Library
//!
//! A deterministic cellular-automaton wildfire spread engine. Each burning
//! cell pushes spread pressure onto its neighbours at the Rothermel (1972)
//! rate of spread for the neighbour's fuel, the local wind and the slope
//! between them; a neighbour ignites once its accumulated pressure crosses a
//! threshold and burns out after a policy-defined duration.
//!
//! ## Pieces
//! - [`physics`]: Rothermel surface spread (metric) and optional ember spotting
//! - [`grid`]: the fire state grid, static layers, and layer providers
//!   (seeded synthetic terrain or pre-loaded rasters)
//! - [`environment`]: per-tick wind and moisture input
//! - [`simulation`]: the scheduler, snapshots, recorders and run metadata
//!
//! ## Example
//! ```
//! use fire_spread_core::{
//!     ConstantEnvironment, EnvironmentSample, FuelModel, Simulation, SimulationConfig,
//!     SimulationHistory, StaticLayers, BurnoutPolicy, TerminationReason,
//! };
//!
//! let config = SimulationConfig::new(21, 21, 10.0, 60.0)
//!     .with_ignition(10, 10)
//!     .with_burnout(BurnoutPolicy::Fixed { seconds: 900.0 })
//!     .with_max_steps(30);
//! let layers = StaticLayers::uniform(21, 21, FuelModel::ShortGrass);
//! let env = ConstantEnvironment::uniform(EnvironmentSample::calm(0.05));
//!
//! let mut sim = Simulation::new(config, &layers, env).unwrap();
//! let mut history = SimulationHistory::new();
//! let meta = sim.run(&mut history).unwrap();
//!
//! assert_eq!(history.snapshots()[0].tick, 0);
//! assert!(meta.termination.is_some());
//! assert!(meta.stats.burned_cells + meta.stats.burning_cells > 1);
//! # let _ = TerminationReason::Extinguished;
//! ```

// Core types and utilities
pub mod core_types;
pub mod error;

pub mod environment;
pub mod grid;
pub mod physics;
pub mod simulation;

// Re-export core types
pub use core_types::{FuelModel, FuelParameters};
pub use error::{ConfigError, EnvironmentError, FuelParameterError, LayerError, SimulationError};

pub use environment::{
    ConstantEnvironment, EnvironmentField, EnvironmentOverrides, EnvironmentProvider,
    EnvironmentSample, SequenceEnvironment,
};
pub use grid::{
    CellStatus, Connectivity, FireGrid, GridCoord, LayerProvider, LayerSource, RasterAdapter,
    Region, StaticLayers, SyntheticTerrain,
};
pub use physics::{rothermel_spread_rate, SpottingConfig, SpreadLimits};
pub use simulation::{
    BurnoutPolicy, CancelToken, OutputRecorder, RunMetadata, Simulation, SimulationConfig,
    SimulationHistory, Snapshot, TerminationReason,
};
