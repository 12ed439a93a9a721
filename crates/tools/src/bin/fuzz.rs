use anyhow::{Result, bail};
use clap::Parser;
use dig_core::sim::random_world;
use dig_core::world::GridQuery;
use dig_core::{Planner, PlannerConfig, PlayerId, SimWorld, TileCoord};
use rand_chacha::{
    ChaCha8Rng,
    rand_core::{Rng, SeedableRng},
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    #[arg(short, long, default_value_t = 200)]
    ticks: u32,
    /// Number of generated maps, seeded consecutively from `seed`
    #[arg(short, long, default_value_t = 16)]
    worlds: u64,
}

#[derive(Clone, Copy, Debug)]
enum ExtraDrop {
    None,
    Claim,
    DoorAssault,
}

fn choose<T: Clone>(rng: &mut ChaCha8Rng, slice: &[T]) -> T {
    let p = rng.next_u64() as usize % slice.len();
    slice[p].clone()
}

/// Two planners on two copies of the same map, driven in lockstep.
struct Twin {
    world: SimWorld,
    planner: Planner,
}

impl Twin {
    fn new(seed: u64) -> Self {
        let world = random_world(seed, 32, 32);
        let mut planner = Planner::new(PlannerConfig::default(), seed);
        planner.setup_agent(PlayerId(0), &world);
        Self { world, planner }
    }

    fn step(&mut self, drop: ExtraDrop) -> Result<()> {
        let agent = PlayerId(0);
        self.planner.tick(agent, &mut self.world)?;
        let dropped = match drop {
            ExtraDrop::None => Ok(None),
            ExtraDrop::Claim => self.planner.check_claims(agent, &mut self.world),
            ExtraDrop::DoorAssault => self.planner.check_door_assaults(agent, &mut self.world),
        };
        // A refused drop is a normal outcome, not a fuzz failure.
        if let Err(err) = dropped {
            tracing::debug!(?drop, error = %err, "drop refused");
        }
        self.world.resolve_orders();
        Ok(())
    }
}

fn check_invariants(twin: &Twin, tick: u32) -> Result<()> {
    let agent = PlayerId(0);
    let Some(state) = twin.planner.agent_state(agent) else { bail!("agent state lost at tick {tick}") };
    let cap = twin.planner.config().gold.max_concurrent_digs;
    if state.gold_digs.len() > cap {
        bail!("Invariant failed: {} gold digs over the cap of {cap}", state.gold_digs.len());
    }
    if let Some(room) = &state.expand_room {
        let pos = room.pos;
        if pos.min_x > pos.max_x || pos.min_y > pos.max_y {
            bail!("Invariant failed: inverted room rectangle {pos:?}");
        }
        let corners = [TileCoord::new(pos.min_x, pos.min_y), TileCoord::new(pos.max_x, pos.max_y)];
        if corners.iter().any(|at| !twin.world.in_bounds(*at)) {
            bail!("Invariant failed: room rectangle {pos:?} leaves the map");
        }
    }
    if let Some(at) = state.bridges.iter().find(|at| !twin.world.in_bounds(**at)) {
        bail!("Invariant failed: bridge queued off the map at {at}");
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    println!(
        "Starting planner fuzz on {} worlds from seed {} for {} ticks each...",
        args.worlds, args.seed, args.ticks
    );
    for seed in args.seed..args.seed.saturating_add(args.worlds) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut first = Twin::new(seed);
        let mut second = Twin::new(seed);
        for tick in 0..args.ticks {
            // Bias towards plain ticks
            let drop = choose(&mut rng, &[ExtraDrop::None, ExtraDrop::None, ExtraDrop::Claim, ExtraDrop::DoorAssault]);
            first.step(drop)?;
            second.step(drop)?;
            check_invariants(&first, tick)?;

            let agent = PlayerId(0);
            if first.planner.state_digest(agent) != second.planner.state_digest(agent) {
                bail!("Invariant failed: replay diverged on seed {seed} at tick {tick}");
            }
        }
        println!("Seed {seed} ok after {} turns", first.world.turn());
    }

    println!("Fuzzing completed successfully.");
    Ok(())
}
