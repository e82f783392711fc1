//! Fire spread behaviour on controlled landscapes
//!
//! These scenarios check the qualitative behaviour of the spread engine: the
//! shape of a calm fire, the effect of wind and slope, barriers, and the
//! state-machine invariants over a whole history.

mod common;

use common::{first_affected, grass, grass_config, reach, run_to_end, wind};
use fire_spread_core::{
    CellStatus, ConstantEnvironment, EnvironmentField, EnvironmentSample, FuelModel, GridCoord,
    SequenceEnvironment, Simulation, SimulationHistory, SyntheticTerrain, TerminationReason,
};

#[test]
fn calm_fire_spreads_evenly_in_all_directions() {
    let (rows, cols) = (41, 41);
    let config = grass_config(rows, cols, (20, 20)).with_max_steps(40);
    let history = run_to_end(config, &grass(rows, cols), wind(0.0, 0.0, 0.05));

    let last = history.last().unwrap();
    let origin = GridCoord::new(20, 20);
    let steps = [
        (-1, 0),
        (-1, 1),
        (0, 1),
        (1, 1),
        (1, 0),
        (1, -1),
        (0, -1),
        (-1, -1),
    ];
    let reaches: Vec<f64> = steps.iter().map(|&s| reach(last, cols, origin, s)).collect();
    let max = reaches.iter().copied().fold(0.0, f64::max);
    let min = reaches.iter().copied().fold(f64::INFINITY, f64::min);

    assert!(min > 0.0, "fire did not spread in every direction: {reaches:?}");
    assert!(
        max <= 2.0 * min,
        "calm spread is too anisotropic: {reaches:?}"
    );
}

#[test]
fn east_wind_drives_fire_west() {
    let (rows, cols) = (21, 81);
    let config = grass_config(rows, cols, (10, 40)).with_max_steps(60);
    let history = run_to_end(config, &grass(rows, cols), wind(15.0, 90.0, 0.05));

    let west = first_affected(&history, cols, (10, 35)).expect("westward front arrives");
    if let Some(east) = first_affected(&history, cols, (10, 45)) {
        assert!(west < east, "west {west} should beat east {east}");
    }
}

#[test]
fn fire_runs_upslope_faster() {
    let (rows, cols) = (41, 41);
    let mut layers = grass(rows, cols);
    // Ground rises to the north (towards row 0) at 36%
    layers.elevation = (0..rows * cols)
        .map(|i| (rows - 1 - i / cols) as f64 * 3.6)
        .collect();
    let config = grass_config(rows, cols, (20, 20)).with_max_steps(25);
    let history = run_to_end(config, &layers, wind(0.0, 0.0, 0.05));

    let up = first_affected(&history, cols, (12, 20)).expect("upslope front arrives");
    if let Some(down) = first_affected(&history, cols, (28, 20)) {
        assert!(up < down, "upslope {up} should beat downslope {down}");
    }
}

#[test]
fn unburnable_strip_stops_the_fire() {
    let (rows, cols) = (20, 21);
    let mut layers = grass(rows, cols);
    for row in 0..rows {
        layers.set_unburnable(row, 10);
    }
    let config = grass_config(rows, cols, (10, 3));
    let history = run_to_end(config, &layers, wind(0.0, 0.0, 0.05));

    let last = history.last().unwrap();
    assert_eq!(
        history.metadata().unwrap().termination,
        Some(TerminationReason::Extinguished)
    );
    for row in 0..rows {
        assert_eq!(last.status[row * cols + 10], CellStatus::Unburnable.code());
        for col in 11..cols {
            assert_eq!(
                last.status[row * cols + col],
                CellStatus::Unburned.code(),
                "fire jumped the break at ({row}, {col})"
            );
        }
    }
    assert!(last.status[10 * cols + 9] == CellStatus::Burned.code());
}

#[test]
fn fuel_above_extinction_moisture_does_not_spread() {
    let config = grass_config(9, 9, (4, 4));
    let history = run_to_end(config, &grass(9, 9), wind(20.0, 45.0, 0.2));

    let meta = history.metadata().unwrap();
    assert_eq!(meta.termination, Some(TerminationReason::Extinguished));
    assert_eq!(meta.stats.burned_cells, 1);
    assert_eq!(meta.completed_ticks, 20);
}

#[test]
fn statuses_only_move_forward_and_fire_never_shrinks() {
    let config = grass_config(40, 40, (20, 20)).with_max_steps(80);
    let terrain = SyntheticTerrain {
        relief: 30.0,
        feature_size: 200.0,
        ..SyntheticTerrain::new(11)
    };
    let mut sim = Simulation::from_provider(config, &terrain, wind(4.0, 200.0, 0.06)).unwrap();
    let mut history = SimulationHistory::new();
    sim.run(&mut history).unwrap();

    let snapshots = history.snapshots();
    assert!(snapshots.len() > 2);
    for pair in snapshots.windows(2) {
        let (before, after) = (&pair[0], &pair[1]);
        assert!(after.affected() >= before.affected());
        for (i, (&a, &b)) in before.status.iter().zip(&after.status).enumerate() {
            let allowed = matches!((a, b), (0, 0 | 1) | (1, 1 | 2) | (2, 2) | (3, 3));
            assert!(allowed, "cell {i} moved from {a} to {b} at tick {}", after.tick);
        }
    }
}

#[test]
fn per_cell_environment_is_used_per_target() {
    // Left half soaked, right half dry; fire started on the dry side stays there
    let (rows, cols) = (11, 20);
    let samples: Vec<EnvironmentSample> = (0..rows * cols)
        .map(|i| EnvironmentSample::calm(if i % cols < 10 { 0.3 } else { 0.04 }))
        .collect();
    let env = SequenceEnvironment::new(vec![EnvironmentField::PerCell(samples)]).holding_last();
    let config = grass_config(rows, cols, (5, 15));
    let mut sim = Simulation::new(config, &grass(rows, cols), env).unwrap();
    let mut history = SimulationHistory::new();
    sim.run(&mut history).unwrap();

    let last = history.last().unwrap();
    for row in 0..rows {
        for col in 0..10 {
            assert_eq!(last.status[row * cols + col], 0, "wet cell ({row}, {col}) burned");
        }
    }
    assert!(last.status[5 * cols + 10] == 2, "dry side should have burned");
    assert_eq!(history.wind_speeds().len() as u64, last.tick);
}

#[test]
fn front_runs_along_faster_fuel() {
    let (rows, cols) = (15, 15);
    let mut mixed = grass(rows, cols);
    for col in 0..cols {
        mixed.set_fuel(7, col, FuelModel::Chaparral);
    }
    let env = || ConstantEnvironment::uniform(EnvironmentSample::calm(0.05));
    let config = grass_config(rows, cols, (7, 0)).with_max_steps(80);

    let with_chaparral = run_to_end(config.clone(), &mixed, env());
    let grass_only = run_to_end(config, &grass(rows, cols), env());

    let fast = first_affected(&with_chaparral, cols, (7, 14)).expect("chaparral front arrives");
    if let Some(slow) = first_affected(&grass_only, cols, (7, 14)) {
        assert!(fast < slow, "chaparral {fast} should beat grass {slow}");
    }
}
