use clap::Parser;
use fire_spread_core::simulation::RunHeader;
use fire_spread_core::{
    BurnoutPolicy, ConstantEnvironment, EnvironmentField, EnvironmentSample, FuelModel,
    OutputRecorder, RunMetadata, Simulation, SimulationConfig, SimulationHistory, Snapshot,
    SpottingConfig, SyntheticTerrain,
};
use tracing_subscriber::EnvFilter;

/// Fire spread demo on seeded synthetic terrain
#[derive(Parser, Debug)]
#[command(name = "fire-spread-demo")]
#[command(about = "Cellular-automaton wildfire spread demo", long_about = None)]
struct Args {
    /// Grid rows
    #[arg(long, default_value_t = 100)]
    rows: usize,

    /// Grid columns
    #[arg(long, default_value_t = 100)]
    cols: usize,

    /// Cell edge length in metres
    #[arg(long, default_value_t = 30.0)]
    cell_size: f64,

    /// Tick length in seconds
    #[arg(long, default_value_t = 60.0)]
    time_step: f64,

    /// Terrain seed
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// NFFL fuel model code (1-13)
    #[arg(short, long, default_value_t = 1)]
    fuel: u8,

    /// Terrain relief in metres
    #[arg(long, default_value_t = 50.0)]
    relief: f64,

    /// Wind speed in m/s
    #[arg(short, long, default_value_t = 5.0)]
    wind_speed: f64,

    /// Direction the wind blows from, degrees (0=North, 90=East)
    #[arg(long, default_value_t = 270.0)]
    wind_direction: f64,

    /// Dead fuel moisture as a fraction
    #[arg(short, long, default_value_t = 0.06)]
    moisture: f64,

    /// Simulated time limit, e.g. "2h" or "90min"
    #[arg(short, long, default_value = "3h")]
    runtime: String,

    /// Fixed burnout duration in seconds
    #[arg(short, long, default_value_t = 1800.0)]
    burnout: f64,

    /// Enable ember spotting
    #[arg(long)]
    spotting: bool,

    /// Report every N ticks
    #[arg(long, default_value_t = 10)]
    report_every: u64,

    /// Print run metadata as JSON instead of the progress table
    #[arg(long)]
    json: bool,
}

/// Prints a progress row every `every` ticks
struct ProgressTable {
    every: u64,
    cell_area_ha: f64,
    quiet: bool,
}

impl OutputRecorder for ProgressTable {
    fn begin(&mut self, header: &RunHeader, elevation: &[f64]) {
        self.cell_area_ha = header.cell_size * header.cell_size / 10_000.0;
        if self.quiet {
            return;
        }
        let (lo, hi) = elevation
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &z| {
                (lo.min(z), hi.max(z))
            });
        println!(
            "Grid {}x{} @ {:.0}m, {} flammable cells, elevation {:.0}-{:.0}m\n",
            header.rows, header.cols, header.cell_size, header.flammable_cells, lo, hi
        );
        println!("  Tick |  Time(min) | Burning | Burned | Ignited | Area(ha)");
        println!("-------|------------|---------|--------|---------|---------");
    }

    fn record(&mut self, snapshot: &Snapshot, _environment: Option<&EnvironmentField>) {
        if self.quiet || snapshot.tick % self.every.max(1) != 0 {
            return;
        }
        println!(
            "{:6} | {:10.1} | {:7} | {:6} | {:7} | {:8.2}",
            snapshot.tick,
            snapshot.time / 60.0,
            snapshot.burning,
            snapshot.burned,
            snapshot.newly_ignited,
            snapshot.affected() as f64 * self.cell_area_ha
        );
    }
}

/// Fans snapshots out to the progress table and the history
struct Tee<'a> {
    table: ProgressTable,
    history: &'a mut SimulationHistory,
}

impl OutputRecorder for Tee<'_> {
    fn begin(&mut self, header: &RunHeader, elevation: &[f64]) {
        self.table.begin(header, elevation);
        self.history.begin(header, elevation);
    }

    fn record(&mut self, snapshot: &Snapshot, environment: Option<&EnvironmentField>) {
        self.table.record(snapshot, environment);
        self.history.record(snapshot, environment);
    }

    fn finish(&mut self, metadata: &RunMetadata) {
        self.history.finish(metadata);
    }
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&args) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let fuel = FuelModel::from_code(args.fuel)
        .ok_or_else(|| format!("fuel code {} is not a burnable NFFL model", args.fuel))?;

    let mut config = SimulationConfig::new(args.rows, args.cols, args.cell_size, args.time_step)
        .with_ignition(args.rows / 2, args.cols / 2)
        .with_burnout(BurnoutPolicy::Fixed {
            seconds: args.burnout,
        })
        .with_runtime(&args.runtime)?;
    if args.spotting {
        config = config.with_spotting(SpottingConfig {
            seed: args.seed,
            ..SpottingConfig::default()
        });
    }

    let terrain = SyntheticTerrain::new(args.seed)
        .with_fuel(fuel)
        .with_relief(args.relief);
    let environment = ConstantEnvironment::uniform(EnvironmentSample {
        wind_speed: args.wind_speed,
        wind_direction: args.wind_direction,
        moisture: args.moisture,
    });

    if !args.json {
        println!("=== Fire Spread Demo ===\n");
        println!(
            "Fuel: {}, Wind: {:.1} m/s from {:.0}°, Moisture: {:.0}%",
            fuel.name(),
            args.wind_speed,
            args.wind_direction,
            args.moisture * 100.0
        );
    }

    let mut sim = Simulation::from_provider(config, &terrain, environment)?;
    let mut history = SimulationHistory::new();
    let mut recorder = Tee {
        table: ProgressTable {
            every: args.report_every,
            cell_area_ha: 0.0,
            quiet: args.json,
        },
        history: &mut history,
    };
    let metadata = sim.run(&mut recorder)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
        return Ok(());
    }

    println!("\n=== Simulation Complete ===");
    println!("Termination: {:?}", metadata.termination);
    println!(
        "Ticks: {} ({:.1} min)",
        metadata.completed_ticks,
        metadata.final_time / 60.0
    );
    println!(
        "Burned: {} cells ({:.1}% of flammable)",
        metadata.stats.burned_cells,
        metadata.stats.burned_fraction * 100.0
    );
    println!("Burned area: {:.2} ha", metadata.stats.burned_area_ha);
    println!("Affected area: {:.2} ha", metadata.stats.affected_area_ha);
    if metadata.stats.spot_ignitions > 0 {
        println!("Spot fires: {}", metadata.stats.spot_ignitions);
    }
    if !metadata.anomalies.is_empty() {
        println!("Cells demoted to unburnable: {}", metadata.anomalies.len());
    }

    let peak = history
        .spread_curve()
        .iter()
        .map(|p| p.burning)
        .max()
        .unwrap_or(0);
    println!("Peak burning cells: {peak}");
    Ok(())
}
