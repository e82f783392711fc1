//! Shared helpers for integration tests

#![allow(dead_code)]

use ctor::ctor;
use fire_spread_core::{
    BurnoutPolicy, ConstantEnvironment, EnvironmentSample, FuelModel, GridCoord, Simulation,
    SimulationConfig, SimulationHistory, Snapshot, StaticLayers,
};

pub const CELL: f64 = 10.0;
pub const STEP: f64 = 60.0;

#[ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Short grass, 10 m cells, one-minute ticks, 20-minute burnout
pub fn grass_config(rows: usize, cols: usize, ignition: (usize, usize)) -> SimulationConfig {
    SimulationConfig::new(rows, cols, CELL, STEP)
        .with_ignition(ignition.0, ignition.1)
        .with_burnout(BurnoutPolicy::Fixed { seconds: 1200.0 })
}

pub fn grass(rows: usize, cols: usize) -> StaticLayers {
    StaticLayers::uniform(rows, cols, FuelModel::ShortGrass)
}

pub fn wind(speed: f64, from: f64, moisture: f64) -> ConstantEnvironment {
    ConstantEnvironment::uniform(EnvironmentSample {
        wind_speed: speed,
        wind_direction: from,
        moisture,
    })
}

/// Run to termination and return the recorded history
pub fn run_to_end(
    config: SimulationConfig,
    layers: &StaticLayers,
    env: ConstantEnvironment,
) -> SimulationHistory {
    let mut sim = Simulation::new(config, layers, env).expect("valid scenario");
    let mut history = SimulationHistory::new();
    sim.run(&mut history).expect("run completes");
    history
}

/// First tick at which `(row, col)` was affected, from the burn-time matrix
pub fn first_affected(history: &SimulationHistory, cols: usize, cell: (usize, usize)) -> Option<i64> {
    let t = history.burn_time_matrix()[cell.0 * cols + cell.1];
    (t >= 0).then_some(t)
}

/// Farthest contiguous affected distance (m) from `origin` along a step
pub fn reach(snapshot: &Snapshot, cols: usize, origin: GridCoord, step: (isize, isize)) -> f64 {
    let rows = snapshot.status.len() / cols;
    let mut k = 0usize;
    loop {
        let r = origin.row as isize + step.0 * (k as isize + 1);
        let c = origin.col as isize + step.1 * (k as isize + 1);
        if r < 0 || c < 0 || r as usize >= rows || c as usize >= cols {
            break;
        }
        let code = snapshot.status[r as usize * cols + c as usize];
        if code != 1 && code != 2 {
            break;
        }
        k += 1;
    }
    let unit = if step.0 != 0 && step.1 != 0 {
        CELL * std::f64::consts::SQRT_2
    } else {
        CELL
    };
    k as f64 * unit
}
