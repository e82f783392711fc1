//! Run lifecycle: termination, failure, cancellation and configuration errors

mod common;

use approx::assert_relative_eq;
use common::{grass, grass_config, run_to_end, wind, STEP};
use fire_spread_core::core_types::Seconds;
use fire_spread_core::error::{ConfigError, EnvironmentError, LayerError};
use fire_spread_core::grid::LengthUnit;
use fire_spread_core::{
    BurnoutPolicy, CancelToken, CellStatus, Connectivity, EnvironmentField, EnvironmentOverrides,
    EnvironmentSample, FuelModel, LayerSource, RasterAdapter, RunMetadata, SequenceEnvironment,
    Simulation, SimulationConfig, SimulationError, SimulationHistory, Snapshot, SpottingConfig,
    StaticLayers, SyntheticTerrain, TerminationReason,
};

fn calm() -> EnvironmentField {
    EnvironmentField::Uniform(EnvironmentSample::calm(0.05))
}

/// 5x5 grid where only the centre can burn
fn isolated() -> StaticLayers {
    let mut layers = grass(5, 5);
    for row in 0..5 {
        for col in 0..5 {
            if (row, col) != (2, 2) {
                layers.set_unburnable(row, col);
            }
        }
    }
    layers
}

#[test]
fn isolated_cell_burns_out_and_run_extinguishes() {
    let config = grass_config(5, 5, (2, 2)).with_burnout(BurnoutPolicy::Fixed { seconds: 600.0 });
    let history = run_to_end(config, &isolated(), wind(10.0, 0.0, 0.05));

    let meta = history.metadata().unwrap();
    assert_eq!(meta.termination, Some(TerminationReason::Extinguished));
    assert_eq!(meta.completed_ticks, 10);
    assert_eq!(meta.final_time, 600.0);
    assert_eq!(meta.stats.burned_cells, 1);
    assert_eq!(meta.header.flammable_cells, 1);
    assert_eq!(history.len(), 11);

    let first = &history.snapshots()[0];
    assert_eq!(first.tick, 0);
    assert_eq!(first.status_at(12), Some(CellStatus::Burning));
    assert_eq!(first.ignition_time.as_ref().unwrap()[12], 0.0);
    assert_eq!(first.ignition_time.as_ref().unwrap()[0], -1.0);
    assert_eq!(history.last().unwrap().newly_burned, 1);
}

#[test]
fn corner_fire_consumes_whole_grid() {
    for connectivity in [Connectivity::Four, Connectivity::Eight] {
        let config = grass_config(10, 10, (0, 0)).with_connectivity(connectivity);
        let history = run_to_end(config, &grass(10, 10), wind(0.0, 0.0, 0.05));

        let meta = history.metadata().unwrap();
        assert_eq!(meta.termination, Some(TerminationReason::Extinguished));
        assert_eq!(meta.stats.burned_cells, 100, "{connectivity:?}");
        assert_eq!(meta.stats.burned_fraction, 1.0);
        assert_eq!(meta.stats.affected_area_ha, 1.0);
        assert_eq!(meta.stats.burned_area_ha, 1.0);
    }
}

#[test]
fn burned_area_excludes_cells_still_burning() {
    let config = grass_config(21, 21, (10, 10)).with_max_steps(10);
    let history = run_to_end(config, &grass(21, 21), wind(0.0, 0.0, 0.05));

    let stats = history.metadata().unwrap().stats;
    assert!(stats.burning_cells > 1);
    assert_eq!(stats.burned_cells, 0);
    assert_eq!(stats.burned_area_ha, 0.0);
    assert_relative_eq!(
        stats.affected_area_ha,
        stats.burning_cells as f64 * 0.01,
        epsilon = 1e-12
    );
}

#[test]
fn two_ignitions_meet() {
    let config = grass_config(10, 10, (0, 0)).with_ignition(9, 9).with_ignition(0, 0);
    let mut sim = Simulation::new(config, &grass(10, 10), wind(0.0, 0.0, 0.05)).unwrap();
    assert_eq!(sim.metadata().header.ignition_points.len(), 2);
    assert_eq!(sim.snapshot().burning, 2);

    let meta = sim.run(&mut SimulationHistory::new()).unwrap();
    assert_eq!(meta.stats.burned_cells, 100);
}

#[test]
fn environment_failure_keeps_completed_ticks() {
    let env = SequenceEnvironment::new(vec![calm(), calm(), calm()]);
    let mut sim = Simulation::new(grass_config(11, 11, (5, 5)), &grass(11, 11), env).unwrap();
    let mut history = SimulationHistory::new();

    let err = sim.run(&mut history).unwrap_err();
    assert_eq!(
        err,
        SimulationError::EnvironmentUnavailable {
            last_completed_tick: 3,
            source: EnvironmentError::Exhausted {
                tick: 3,
                available: 3
            },
        }
    );
    assert_eq!(history.len(), 4);
    assert_eq!(sim.tick(), 3);
    assert_eq!(sim.time(), 3.0 * STEP);

    let meta = history.metadata().expect("finish runs after failure");
    assert_eq!(meta.termination, None);
    assert_eq!(meta.completed_ticks, 3);
    assert!(meta.failure.is_some());

    assert_eq!(sim.step(), Err(SimulationError::AlreadyTerminated));
}

#[test]
fn per_cell_field_of_wrong_size_fails_first_tick() {
    let short = EnvironmentField::PerCell(vec![EnvironmentSample::calm(0.05); 5]);
    let env = SequenceEnvironment::new(vec![short]).holding_last();
    let mut sim = Simulation::new(grass_config(11, 11, (5, 5)), &grass(11, 11), env).unwrap();
    let mut history = SimulationHistory::new();

    let err = sim.run(&mut history).unwrap_err();
    assert!(matches!(
        err,
        SimulationError::EnvironmentUnavailable {
            last_completed_tick: 0,
            source: EnvironmentError::SizeMismatch {
                expected: 121,
                actual: 5,
                ..
            },
        }
    ));
    assert_eq!(history.len(), 1);
}

#[test]
fn cancellation_stops_before_next_tick() {
    let token = CancelToken::new();
    let trigger = token.clone();
    let env = move |tick: u64, _start: Seconds| {
        if tick == 5 {
            trigger.cancel();
        }
        Ok::<_, EnvironmentError>(calm())
    };
    let mut sim = Simulation::new(grass_config(21, 21, (10, 10)), &grass(21, 21), env)
        .unwrap()
        .with_cancel_token(token);
    let mut history = SimulationHistory::new();

    let meta = sim.run(&mut history).unwrap();
    assert_eq!(meta.termination, Some(TerminationReason::Cancelled));
    assert_eq!(meta.completed_ticks, 6);
    assert_eq!(history.len(), 7);
    assert!(sim.cancel_token().is_cancelled());
}

#[test]
fn runtime_limit_sets_step_count() {
    let config = grass_config(21, 21, (10, 10)).with_runtime("10min").unwrap();
    let history = run_to_end(config, &grass(21, 21), wind(0.0, 0.0, 0.05));

    let meta = history.metadata().unwrap();
    assert_eq!(meta.termination, Some(TerminationReason::MaxStepsReached));
    assert_eq!(meta.completed_ticks, 10);
    assert_eq!(meta.final_time, 600.0);

    assert!(matches!(
        grass_config(3, 3, (1, 1)).with_runtime("soon"),
        Err(ConfigError::InvalidRuntime { .. })
    ));
}

#[test]
fn limited_run_resumes_in_phases() {
    let config = grass_config(21, 21, (10, 10)).with_runtime("10min").unwrap();
    let mut sim = Simulation::new(config.clone(), &grass(21, 21), wind(0.0, 0.0, 0.05)).unwrap();
    let mut history = SimulationHistory::new();

    let first = sim.run(&mut history).unwrap();
    assert_eq!(first.termination, Some(TerminationReason::MaxStepsReached));
    assert_eq!(first.completed_ticks, 10);
    assert_eq!(sim.run(&mut history).unwrap_err(), SimulationError::AlreadyTerminated);

    let second = sim.run_for_runtime("20min", &mut history).unwrap();
    assert_eq!(second.termination, Some(TerminationReason::MaxStepsReached));
    assert_eq!(second.completed_ticks, 30);
    assert_eq!(second.final_time, 1800.0);
    assert_eq!(history.metadata(), Some(&second));

    // Same history as one uninterrupted 30-tick run
    let straight = run_to_end(
        config.with_runtime("30min").unwrap(),
        &grass(21, 21),
        wind(0.0, 0.0, 0.05),
    );
    assert_eq!(history.snapshots(), straight.snapshots());
    assert_eq!(history.wind_speeds().len(), 30);
}

#[test]
fn finished_runs_cannot_be_extended() {
    let config = grass_config(5, 5, (2, 2)).with_burnout(BurnoutPolicy::Fixed { seconds: 120.0 });
    let mut sim = Simulation::new(config.clone(), &isolated(), wind(0.0, 0.0, 0.05)).unwrap();
    let meta = sim.run(&mut SimulationHistory::new()).unwrap();
    assert_eq!(meta.termination, Some(TerminationReason::Extinguished));
    assert_eq!(
        sim.run_for(Seconds::new(600.0), &mut SimulationHistory::new()),
        Err(SimulationError::AlreadyTerminated)
    );

    let mut sim = Simulation::new(config, &grass(5, 5), wind(0.0, 0.0, 0.05)).unwrap();
    sim.cancel_token().cancel();
    let meta = sim.run(&mut SimulationHistory::new()).unwrap();
    assert_eq!(meta.termination, Some(TerminationReason::Cancelled));
    assert_eq!(
        sim.run_for(Seconds::new(600.0), &mut SimulationHistory::new()),
        Err(SimulationError::AlreadyTerminated)
    );

    let mut sim = Simulation::new(grass_config(5, 5, (2, 2)), &grass(5, 5), wind(0.0, 0.0, 0.05)).unwrap();
    assert!(matches!(
        sim.run_for(Seconds::new(0.0), &mut SimulationHistory::new()),
        Err(SimulationError::InvalidConfiguration(ConfigError::InvalidValue { .. }))
    ));
    assert!(matches!(
        sim.run_for_runtime("later", &mut SimulationHistory::new()),
        Err(SimulationError::InvalidConfiguration(ConfigError::InvalidRuntime { .. }))
    ));
}

#[test]
fn extinction_wins_over_step_limit() {
    let config = grass_config(5, 5, (2, 2))
        .with_burnout(BurnoutPolicy::Fixed { seconds: 600.0 })
        .with_max_steps(10);
    let history = run_to_end(config, &isolated(), wind(0.0, 0.0, 0.05));
    assert_eq!(
        history.metadata().unwrap().termination,
        Some(TerminationReason::Extinguished)
    );
}

#[test]
fn stepping_by_hand() {
    let config = grass_config(5, 5, (2, 2)).with_burnout(BurnoutPolicy::Fixed { seconds: 120.0 });
    let mut sim = Simulation::new(config, &isolated(), wind(0.0, 0.0, 0.05)).unwrap();

    let first = sim.step().unwrap().unwrap();
    assert_eq!(first.tick, 1);
    assert_eq!(first.time, STEP);
    assert!(!sim.is_finished());

    let second = sim.step().unwrap().unwrap();
    assert_eq!(second.burned, 1);
    assert!(sim.is_finished());
    assert_eq!(sim.step(), Err(SimulationError::AlreadyTerminated));
    assert_eq!(
        sim.run(&mut SimulationHistory::new()).unwrap_err(),
        SimulationError::AlreadyTerminated
    );
}

#[test]
fn invalid_setups_are_refused() {
    let mut layers = grass(5, 5);
    layers.set_unburnable(2, 2);
    let err = Simulation::new(grass_config(5, 5, (2, 2)), &layers, wind(0.0, 0.0, 0.05)).unwrap_err();
    assert_eq!(
        err,
        SimulationError::InvalidConfiguration(ConfigError::IgnitionOnUnburnable { row: 2, col: 2 })
    );

    let err = Simulation::new(grass_config(5, 5, (5, 0)), &grass(5, 5), wind(0.0, 0.0, 0.05)).unwrap_err();
    assert!(matches!(
        err,
        SimulationError::InvalidConfiguration(ConfigError::IgnitionOutOfBounds { row: 5, .. })
    ));

    let err = Simulation::new(grass_config(5, 5, (2, 2)), &grass(4, 5), wind(0.0, 0.0, 0.05)).unwrap_err();
    assert!(matches!(
        err,
        SimulationError::InvalidConfiguration(ConfigError::DimensionMismatch { .. })
    ));

    let mut short = grass(5, 5);
    short.elevation.pop();
    let err = Simulation::new(grass_config(5, 5, (2, 2)), &short, wind(0.0, 0.0, 0.05)).unwrap_err();
    assert_eq!(
        err,
        SimulationError::InvalidConfiguration(ConfigError::DimensionMismatch {
            layer: "elevation",
            expected: 25,
            actual: 24,
        })
    );

    let no_ignition = SimulationConfig::new(5, 5, 10.0, 60.0);
    let err = Simulation::new(no_ignition, &grass(5, 5), wind(0.0, 0.0, 0.05)).unwrap_err();
    assert_eq!(
        err,
        SimulationError::InvalidConfiguration(ConfigError::NoIgnitionPoints)
    );
}

#[test]
fn invalid_fuel_is_demoted_and_reported() {
    let mut layers = grass(5, 5);
    layers.fuel_load[7] = -1.0;
    let history = run_to_end(grass_config(5, 5, (2, 2)), &layers, wind(0.0, 0.0, 0.05));

    let meta = history.metadata().unwrap();
    assert_eq!(meta.anomalies.len(), 1);
    assert_eq!((meta.anomalies[0].row, meta.anomalies[0].col), (1, 2));
    assert_eq!(meta.header.flammable_cells, 24);
    assert_eq!(history.last().unwrap().status_at(7), Some(CellStatus::Unburnable));
    assert_eq!(meta.stats.burned_cells, 24);
}

#[test]
fn global_overrides_replace_provider_values() {
    let config = grass_config(9, 9, (4, 4)).with_overrides(EnvironmentOverrides {
        moisture: Some(0.2),
        ..EnvironmentOverrides::default()
    });
    let history = run_to_end(config, &grass(9, 9), wind(0.0, 0.0, 0.05));

    let meta = history.metadata().unwrap();
    assert_eq!(meta.termination, Some(TerminationReason::Extinguished));
    assert_eq!(meta.stats.burned_cells, 1);
}

fn spotting_run(seed: u64) -> (SimulationHistory, RunMetadata) {
    let config = grass_config(21, 81, (10, 70))
        .with_max_steps(20)
        .with_spotting(SpottingConfig {
            seed,
            intensity_threshold: 100.0,
            launch_probability: 1.0,
            ignition_probability: 1.0,
            ..SpottingConfig::default()
        });
    let mut sim = Simulation::new(config, &grass(21, 81), wind(15.0, 90.0, 0.05)).unwrap();
    let mut history = SimulationHistory::new();
    let meta = sim.run(&mut history).unwrap();
    (history, meta)
}

#[test]
fn embers_start_spot_fires_downwind() {
    let (history, meta) = spotting_run(3);
    assert!(meta.stats.spot_ignitions > 0);

    // Nothing ignites upwind of the origin faster than surface spread allows
    let last = history.last().unwrap();
    assert_eq!(last.status_at(10 * 81 + 80), Some(CellStatus::Unburned));
}

#[test]
fn identical_inputs_give_identical_runs() {
    let (a, meta_a) = spotting_run(42);
    let (b, meta_b) = spotting_run(42);
    assert_eq!(a.snapshots(), b.snapshots());
    assert_eq!(meta_a, meta_b);

    let terrain = SyntheticTerrain::new(5).with_fuel(FuelModel::TallGrass);
    let run = || {
        let config = grass_config(30, 30, (15, 15)).with_max_steps(30);
        let mut sim = Simulation::from_provider(config, &terrain, wind(6.0, 300.0, 0.07)).unwrap();
        let mut history = SimulationHistory::new();
        sim.run(&mut history).unwrap();
        history
    };
    assert_eq!(run().snapshots(), run().snapshots());
}

#[test]
fn outputs_serialize_to_json() {
    let config = grass_config(5, 5, (2, 2)).with_burnout(BurnoutPolicy::Fixed { seconds: 600.0 });
    let json = serde_json::to_string(&config).unwrap();
    let back: SimulationConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);

    let history = run_to_end(config, &isolated(), wind(0.0, 0.0, 0.05));
    let meta = history.metadata().unwrap();
    let json = serde_json::to_string(meta).unwrap();
    assert!(json.contains("\"termination\":\"extinguished\""));
    let back: RunMetadata = serde_json::from_str(&json).unwrap();
    assert_eq!(back.termination, meta.termination);
    assert_eq!(back.completed_ticks, meta.completed_ticks);

    let json = serde_json::to_string(history.last().unwrap()).unwrap();
    assert!(json.contains("\"status\":[3,3,3"));
}

fn raster(rows: usize, cols: usize) -> RasterAdapter {
    RasterAdapter {
        rows,
        cols,
        fuel_codes: vec![1; rows * cols],
        elevation: vec![0.0; rows * cols],
        elevation_unit: LengthUnit::Meters,
        pixel_scale: 10.0,
        pixel_unit: LengthUnit::Meters,
    }
}

#[test]
fn layers_from_configured_source() {
    let source = LayerSource::Raster(raster(3, 3));
    let err = Simulation::from_provider(grass_config(5, 5, (2, 2)), &source, wind(0.0, 0.0, 0.05))
        .unwrap_err();
    assert_eq!(
        err,
        SimulationError::LayerUnavailable(LayerError::RegionMismatch {
            requested: (5, 5),
            available: (3, 3),
        })
    );

    let source = LayerSource::Raster(raster(5, 5));
    let mut sim =
        Simulation::from_provider(grass_config(5, 5, (2, 2)), &source, wind(0.0, 0.0, 0.05)).unwrap();
    let meta = sim.run(&mut Vec::<Snapshot>::new()).unwrap();
    assert_eq!(meta.stats.burned_cells, 25);

    let source = LayerSource::Synthetic(SyntheticTerrain::flat(FuelModel::ShortGrass));
    assert!(Simulation::from_provider(grass_config(5, 5, (2, 2)), &source, wind(0.0, 0.0, 0.05)).is_ok());
}
