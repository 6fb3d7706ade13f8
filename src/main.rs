use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use citysim::{
    draw::{draw_grid, AtlasManifest},
    engine::{EngineBuilder, EngineSettings},
    scenario::ScenarioLoader,
    world::WorldSummary,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "City grid simulation runner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/river_town.yaml")]
    scenario: PathBuf,

    /// Override tick count (uses scenario default when omitted)
    #[arg(long)]
    ticks: Option<u64>,

    /// Print the final summary as JSON
    #[arg(long)]
    json: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Serialize)]
struct RunOutput {
    scenario: String,
    ticks: u64,
    clicks: usize,
    presses: usize,
    sprites: usize,
    skipped_tiles: usize,
    world: WorldSummary,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("Invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&cli.scenario)?;
    let mut world = scenario.build_world()?;
    let script = scenario.input_script();
    let ticks = scenario.ticks(cli.ticks);

    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
    };
    let mut engine = EngineBuilder::new(settings)
        .with_default_systems()
        .with_camera(scenario.camera)
        .with_hud(scenario.hud_layout())
        .build();

    let mut clicks = 0;
    let mut presses = 0;
    engine.run_with_input(
        &mut world,
        ticks,
        |tick| script.frame(tick),
        |report| {
            clicks += report.events.clicked.len();
            presses += report.events.pressed.len();
        },
    )?;

    let atlas = AtlasManifest::for_catalog(world.catalog());
    let frame = draw_grid(world.grid(), world.catalog(), &atlas);
    let output = RunOutput {
        scenario: scenario.name.clone(),
        ticks,
        clicks,
        presses,
        sprites: frame.commands.len(),
        skipped_tiles: frame.skipped_tiles.len(),
        world: world.summary(),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        info!(sprites = output.sprites, "final frame drawn");
        println!(
            "Scenario '{}' completed for {} ticks. Cycles applied: {}, clicks: {}",
            output.scenario, output.ticks, output.world.cycles_applied, output.clicks
        );
        for line in &output.world.stockpile {
            println!("  {:<8} {}", line.resource, line.amount);
        }
    }
    Ok(())
}
