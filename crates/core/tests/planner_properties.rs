use std::collections::BTreeSet;

use dig_core::sim::{SimCommand, random_world};
use dig_core::world::{GridQuery, InfluenceProvider};
use dig_core::{Planner, PlannerConfig, PlayerId, RoomKind, SimWorld, SlabKind, TileCoord};
use proptest::prelude::*;

const AGENT: PlayerId = PlayerId(0);

/// Gem faces are never treated as dangerous.
fn is_dangerous(world: &SimWorld, planner: &Planner, at: TileCoord) -> bool {
    let danger = &planner.agent_state(AGENT).expect("agent was set up").danger;
    danger.is_flagged(at) && world.slab_kind(at) != SlabKind::Gems
}

fn setup(seed: u64) -> (SimWorld, Planner) {
    let world = random_world(seed, 28, 28);
    let mut planner = Planner::new(PlannerConfig::default(), seed);
    planner.setup_agent(AGENT, &world);
    planner.refresh_danger(AGENT, &world).expect("agent was set up");
    (world, planner)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn backtrack_walks_strictly_downhill_to_territory(seed in any::<u64>(), x in 1..27i32, y in 1..27i32) {
        let (mut world, mut planner) = setup(seed);
        let start = TileCoord::new(x, y);
        if let Ok(path) = planner.backtrack(AGENT, &mut world, start, true, false) {
            prop_assert_eq!(path.first(), Some(&start));
            let distances: Vec<i32> = path.iter().map(|at| world.dig_distance(*at, AGENT)).collect();
            prop_assert!(distances.windows(2).all(|pair| pair[1] < pair[0]));
            prop_assert_eq!(distances.last(), Some(&0));

            prop_assert!(path[1..].iter().all(|at| !is_dangerous(&world, &planner, *at)));
        }
        prop_assert!(world.commands().is_empty());
    }

    #[test]
    fn room_candidates_are_aligned_inside_the_map_and_safe(seed in any::<u64>(), preferred in 4..25i32) {
        let (world, planner) = setup(seed);
        let found = planner.find_best_room(AGENT, &world, RoomKind::Treasure, preferred).unwrap();
        if let Some(candidate) = found {
            let pos = candidate.pos;
            prop_assert!(pos.access_is_aligned());
            prop_assert!(pos.min_x >= 1 && pos.min_y >= 1);
            prop_assert!(pos.max_x <= 26 && pos.max_y <= 26);
            prop_assert!(pos.tiles().all(|at| !is_dangerous(&world, &planner, at)));
            prop_assert!(candidate.score >= 0);
        }
    }

    #[test]
    fn claim_and_door_picks_depend_only_on_the_salt(seed in any::<u64>(), salt in any::<u64>()) {
        let (world, planner) = setup(seed);
        let claim = planner.pick_claim_target(AGENT, &world, salt).unwrap();
        prop_assert_eq!(claim, planner.pick_claim_target(AGENT, &world, salt).unwrap());
        if let Some(choice) = claim {
            prop_assert!(choice.score > 0);
            prop_assert!(!is_dangerous(&world, &planner, choice.at));
        }
        let door = planner.pick_door_target(AGENT, &world, salt).unwrap();
        prop_assert_eq!(door, planner.pick_door_target(AGENT, &world, salt).unwrap());
    }

    #[test]
    fn ticking_keeps_gold_digs_capped_and_marks_on_the_map(seed in any::<u64>()) {
        let (mut world, mut planner) = setup(seed);
        for _ in 0..12 {
            planner.tick(AGENT, &mut world).unwrap();
            let state = planner.agent_state(AGENT).unwrap();
            prop_assert!(state.gold_digs.len() <= planner.config().gold.max_concurrent_digs);
            for at in state.ledger.marked_tiles() {
                prop_assert!(world.in_bounds(at));
            }
            world.resolve_orders();
        }
    }

    #[test]
    fn ticking_never_orders_the_same_excavation_twice(seed in any::<u64>()) {
        let (mut world, mut planner) = setup(seed);
        for _ in 0..20 {
            planner.tick(AGENT, &mut world).unwrap();
        }
        let dug: Vec<TileCoord> = world
            .commands()
            .iter()
            .filter_map(|command| match command {
                SimCommand::Excavate { player, at } if *player == AGENT => Some(*at),
                _ => None,
            })
            .collect();
        let distinct: BTreeSet<TileCoord> = dug.iter().copied().collect();
        prop_assert_eq!(distinct.len(), dug.len());
    }
}
