//! Small hand-painted worlds shared by the planner unit tests.

use super::*;
use crate::sim::{SimPlayer, SimWorld};

pub(super) const AGENT: PlayerId = PlayerId(0);
pub(super) const RIVAL: PlayerId = PlayerId(1);

pub(super) fn agent_record() -> SimPlayer {
    SimPlayer {
        money: 10_000,
        strength: 100,
        available_rooms: [RoomKind::Treasure].into(),
        ..SimPlayer::default()
    }
}

/// 9x9: rock border, a lava ring, and a 5x5 block of claimed floor at 2..=6
/// with the stronghold in the middle.
pub(super) fn open_pocket_world() -> SimWorld {
    let mut world = SimWorld::new(9, 9);
    world.fill_rect(TileCoord::new(1, 1), TileCoord::new(7, 7), SlabKind::Lava, PlayerId::NEUTRAL);
    world.fill_rect(TileCoord::new(2, 2), TileCoord::new(6, 6), SlabKind::Claimed, AGENT);
    world.add_player(AGENT, SimPlayer { stronghold: Some(TileCoord::new(4, 4)), ..agent_record() });
    world.set_room_cost(RoomKind::Treasure, 100);
    world.refresh();
    world
}

/// 9x7 rock with claimed floor at x 1..=3, y 1..=5 and a gold seam at (6, 3)
/// reached through earth at (4, 3) and (5, 3).
pub(super) fn gold_corridor_world() -> SimWorld {
    let mut world = SimWorld::new(9, 7);
    world.fill_rect(TileCoord::new(1, 1), TileCoord::new(3, 5), SlabKind::Claimed, AGENT);
    world.set_slab(TileCoord::new(4, 3), SlabKind::Earth, PlayerId::NEUTRAL);
    world.set_slab(TileCoord::new(5, 3), SlabKind::Earth, PlayerId::NEUTRAL);
    world.set_slab(TileCoord::new(6, 3), SlabKind::Gold, PlayerId::NEUTRAL);
    world.add_player(AGENT, SimPlayer { stronghold: Some(TileCoord::new(2, 3)), ..agent_record() });
    world.refresh();
    world
}

/// 14x9 earth with our claimed block at x 2..=4 and a hero outpost at
/// x 9..=12, y 3..=5 guarded by one fighter of the given strength.
pub(super) fn hero_outpost_world(strength: i64) -> SimWorld {
    let mut world = SimWorld::new(14, 9);
    world.fill_rect(TileCoord::new(1, 1), TileCoord::new(12, 7), SlabKind::Earth, PlayerId::NEUTRAL);
    world.fill_rect(TileCoord::new(2, 2), TileCoord::new(4, 6), SlabKind::Claimed, AGENT);
    world.fill_rect(TileCoord::new(9, 3), TileCoord::new(12, 5), SlabKind::Claimed, PlayerId::HEROES);
    world.add_player(AGENT, SimPlayer { stronghold: Some(TileCoord::new(3, 4)), ..agent_record() });
    world.add_player(PlayerId::HEROES, SimPlayer::default());
    world.add_unit(PlayerId::HEROES, UnitRole::Fighter, TileCoord::new(11, 4), strength);
    world.refresh();
    world
}

/// Default tuning, except raw expansion rings start at the stronghold itself.
pub(super) fn pocket_config() -> PlannerConfig {
    let mut cfg = PlannerConfig::default();
    cfg.expansion.ring_start = 0;
    cfg
}

pub(super) fn planner_for(world: &SimWorld) -> Planner {
    planner_for_config(world, PlannerConfig::default())
}

pub(super) fn planner_for_config(world: &SimWorld, cfg: PlannerConfig) -> Planner {
    let mut planner = Planner::new(cfg, 7);
    planner.setup_agent(AGENT, world);
    planner
}
