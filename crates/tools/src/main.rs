use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dig_core::sim::random_world;
use dig_core::world::EconomyQuery;
use dig_core::{Planner, PlannerConfig, PlayerId, SimWorld};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// World fixture JSON to load; a random map is generated when omitted
    #[arg(short, long)]
    world: Option<PathBuf>,
    /// Planner config JSON; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    #[arg(short, long, default_value_t = 100)]
    ticks: u32,
    /// Keeper slot the planner plays for
    #[arg(short, long, default_value_t = 0)]
    agent: u8,
    /// Also run claim and door assault drops every tick
    #[arg(long)]
    drops: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr).init();
    let args = Args::parse();

    let mut world = match &args.world {
        Some(path) => SimWorld::from_file(path)
            .with_context(|| format!("Failed to load world fixture: {}", path.display()))?,
        None => random_world(args.seed, 32, 32),
    };
    let config = match &args.config {
        Some(path) => PlannerConfig::from_file(path)
            .with_context(|| format!("Failed to load planner config: {}", path.display()))?,
        None => PlannerConfig::default(),
    };

    let agent = PlayerId(args.agent);
    let mut planner = Planner::new(config, args.seed);
    planner.setup_agent(agent, &world);
    tracing::info!(%agent, seed = args.seed, ticks = args.ticks, "simulation started");

    for _ in 0..args.ticks {
        let issued_before = world.commands().len();
        let report = planner.tick(agent, &mut world).context("Planning tick failed")?;
        if args.drops {
            match planner.check_claims(agent, &mut world) {
                Ok(Some(at)) => tracing::info!(%agent, %at, "claim drop"),
                Ok(None) => {}
                Err(err) => tracing::warn!(%agent, error = %err, "claim drop refused"),
            }
            match planner.check_door_assaults(agent, &mut world) {
                Ok(Some(at)) => tracing::info!(%agent, %at, "door assault drop"),
                Ok(None) => {}
                Err(err) => tracing::warn!(%agent, error = %err, "door assault drop refused"),
            }
        }
        let line = json!({ "report": report, "commands": &world.commands()[issued_before..] });
        println!("{line}");
        world.resolve_orders();
    }

    let state = planner.agent_state(agent).context("Agent state vanished")?;
    println!("Simulation complete.");
    println!("Final Turn: {}", world.turn());
    println!("Money: {}", world.money(agent));
    println!("Gold Digs: {}", state.gold_digs.len());
    println!("Pending Bridges: {}", state.bridges.len());
    println!("State Digest: {:016x}", planner.state_digest(agent).unwrap_or_default());
    Ok(())
}
