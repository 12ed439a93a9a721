use std::collections::BTreeSet;
use std::fs;

use dig_core::world::{CommandSink, EconomyQuery, GridQuery};
use dig_core::{PlanError, Planner, PlannerConfig, PlayerId, SimWorld, SlabKind, TaskKind, TaskOutcome, TileCoord};

const AGENT: PlayerId = PlayerId(0);

/// Claimed floor on the left, a gold seam at (6, 3) behind two tiles of earth.
const GOLD_SEAM: &str = r##########"{
    "rows": [
        "#########",
        "#000#####",
        "#000#####",
        "#000..$##",
        "#000#####",
        "#000#####",
        "#########"
    ],
    "players": [
        { "id": 0, "money": 10000, "available_rooms": ["Treasure"], "stronghold": { "x": 2, "y": 3 } }
    ]
}"##########;

fn gold_seam() -> SimWorld {
    SimWorld::from_json_str(GOLD_SEAM).expect("fixture is well formed")
}

fn planner_for(world: &SimWorld) -> Planner {
    let mut planner = Planner::new(PlannerConfig::default(), 11);
    planner.setup_agent(AGENT, world);
    planner
}

#[test]
fn gold_seam_is_tunnelled_to_and_mined_out() {
    let mut world = gold_seam();
    let mut planner = planner_for(&world);
    let money = world.money(AGENT);

    let report = planner.tick(AGENT, &mut world).unwrap();
    assert_eq!(report.count(TaskKind::GoldDig, TaskOutcome::Started), 1);
    let dug: BTreeSet<TileCoord> = world.excavations(AGENT).into_iter().collect();
    assert!(dug.contains(&TileCoord::new(4, 3)));
    assert!(dug.contains(&TileCoord::new(5, 3)));
    assert!(dug.contains(&TileCoord::new(6, 3)));

    world.resolve_orders();
    assert_ne!(world.slab_kind(TileCoord::new(6, 3)), SlabKind::Gold);
    assert!(world.money(AGENT) > money);
    let report = planner.tick(AGENT, &mut world).unwrap();
    assert_eq!(report.count(TaskKind::GoldDig, TaskOutcome::Completed), 1);
}

#[test]
fn fake_backtrack_leaves_the_world_untouched() {
    let mut world = gold_seam();
    let mut planner = planner_for(&world);
    let path = planner.backtrack(AGENT, &mut world, TileCoord::new(6, 3), true, true).unwrap();
    assert_eq!(path.first(), Some(&TileCoord::new(6, 3)));
    assert_eq!(path.last().map(|at| world.slab_owner(*at)), Some(AGENT));
    assert!(world.commands().is_empty());
    assert!(world.outstanding_orders(AGENT).is_empty());
}

#[test]
fn unknown_agents_are_refused() {
    let mut world = gold_seam();
    let mut planner = Planner::new(PlannerConfig::default(), 11);
    assert_eq!(planner.tick(AGENT, &mut world), Err(PlanError::AgentNotInitialized));
    assert_eq!(planner.check_claims(AGENT, &mut world), Err(PlanError::AgentNotInitialized));
    assert_eq!(planner.pick_gold_target(AGENT, &world), Err(PlanError::AgentNotInitialized));
}

#[test]
fn teardown_forgets_the_agent() {
    let world = gold_seam();
    let mut planner = planner_for(&world);
    assert_eq!(planner.agents().collect::<Vec<_>>(), vec![AGENT]);
    assert!(planner.teardown_agent(AGENT).is_some());
    assert!(planner.agent_state(AGENT).is_none());
    assert_eq!(planner.agents().count(), 0);
    assert!(planner.teardown_agent(AGENT).is_none());
}

#[test]
fn reset_rebuilds_the_ledger_from_queued_orders() {
    let mut world = gold_seam();
    let mut planner = planner_for(&world);
    planner.tick(AGENT, &mut world).unwrap();
    assert!(!planner.agent_state(AGENT).unwrap().gold_digs.is_empty());

    planner.reset(&world);
    let state = planner.agent_state(AGENT).unwrap();
    assert!(state.gold_digs.is_empty());
    let marked: BTreeSet<TileCoord> = state.ledger.marked_tiles().collect();
    let queued: BTreeSet<TileCoord> = world.outstanding_orders(AGENT).into_iter().collect();
    assert_eq!(marked, queued);
}

#[test]
fn config_file_overrides_reach_the_planner() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("planner.json");
    fs::write(&path, r#"{ "gold": { "max_concurrent_digs": 3 } }"#).unwrap();
    let config = PlannerConfig::from_file(&path).unwrap();
    let planner = Planner::new(config, 1);
    assert_eq!(planner.config().gold.max_concurrent_digs, 3);
    assert_eq!(planner.config().assault, PlannerConfig::default().assault);
}
