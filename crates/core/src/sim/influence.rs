//! Breadth-first distance fields and hostile pockets for the sim world.
//! This module exists to derive every influence query from slabs alone.
//! It does not own terrain edits; `SimWorld::refresh` recomputes it wholesale.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use slotmap::SlotMap;

use super::{SimPlayer, SimUnit, Slab};
use crate::grid::Grid;
use crate::types::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Metric {
    Dig,
    Stronghold,
    UnblockedDrop,
    BlockedDrop,
}

/// How a flood treats one tile.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Step {
    Blocked,
    Enter,
    /// Gets a distance but the flood goes no further.
    EnterAndStop,
}

struct PlayerFields {
    dig: Grid<i32>,
    stronghold: Grid<i32>,
    unblocked_drop: Grid<i32>,
    blocked_drop: Grid<i32>,
}

pub(super) struct InfluenceFields {
    players: BTreeMap<PlayerId, PlayerFields>,
    walk_region: Grid<Option<RegionId>>,
    fly_region: Grid<Option<RegionId>>,
    regions: Vec<HostileRegion>,
}

impl InfluenceFields {
    pub(super) fn empty(width: i32, height: i32) -> Self {
        Self {
            players: BTreeMap::new(),
            walk_region: Grid::new(width, height, None),
            fly_region: Grid::new(width, height, None),
            regions: Vec::new(),
        }
    }

    pub(super) fn compute(
        slabs: &Grid<Slab>,
        players: &BTreeMap<PlayerId, SimPlayer>,
        units: &SlotMap<UnitId, SimUnit>,
    ) -> Self {
        let mut fields = Self::empty(slabs.width(), slabs.height());
        for (&player, record) in players.iter().filter(|(id, _)| id.is_keeper()) {
            let bridges = record.available_rooms.contains(&RoomKind::Bridge);
            let territory: Vec<TileCoord> = slabs
                .coords()
                .filter(|at| {
                    let slab = slabs.at(*at);
                    slab.owner == player && slab.kind.is_open_floor()
                })
                .collect();
            let mut hearts: Vec<TileCoord> = slabs
                .coords()
                .filter(|at| slabs.at(*at) == Slab::new(SlabKind::DungeonHeart, player))
                .collect();
            hearts.extend(record.stronghold.filter(|at| slabs.in_bounds(*at)));

            let dig = flood(slabs, &territory, |slab| dig_step(slab, player, bridges));
            let stronghold = flood(slabs, &hearts, walk_step);
            let unblocked_drop = flood(slabs, &territory, |slab| match slab.kind {
                SlabKind::Door(_) => Step::Enter,
                _ => walk_step(slab),
            });
            let blocked_drop = flood(slabs, &territory, |slab| match slab.kind {
                SlabKind::Door(_) if slab.owner == player => Step::Enter,
                _ => walk_step(slab),
            });
            fields.players.insert(player, PlayerFields { dig, stronghold, unblocked_drop, blocked_drop });
        }
        fields.find_regions(slabs, players, units);
        fields
    }

    pub(super) fn distance(&self, metric: Metric, at: TileCoord, player: PlayerId) -> i32 {
        let Some(fields) = self.players.get(&player) else { return -1 };
        let grid = match metric {
            Metric::Dig => &fields.dig,
            Metric::Stronghold => &fields.stronghold,
            Metric::UnblockedDrop => &fields.unblocked_drop,
            Metric::BlockedDrop => &fields.blocked_drop,
        };
        grid.get(at).copied().unwrap_or(-1)
    }

    pub(super) fn walk_region(&self, at: TileCoord) -> Option<RegionId> {
        self.walk_region.at(at)
    }

    pub(super) fn fly_region(&self, at: TileCoord) -> Option<RegionId> {
        self.fly_region.at(at)
    }

    pub(super) fn regions(&self) -> &[HostileRegion] {
        &self.regions
    }

    /// Walk pockets are hero floor and doors plus any heart they touch.
    /// Fly pockets may also cross liquid and are only kept when they do.
    fn find_regions(
        &mut self,
        slabs: &Grid<Slab>,
        players: &BTreeMap<PlayerId, SimPlayer>,
        units: &SlotMap<UnitId, SimUnit>,
    ) {
        let mut unit_strength: BTreeMap<TileCoord, i64> = BTreeMap::new();
        for unit in units.values().filter(|unit| unit.owner == PlayerId::HEROES && !unit.unconscious) {
            *unit_strength.entry(unit.at).or_default() += unit.strength;
        }
        let is_hero_land = |slab: Slab| {
            slab.owner == PlayerId::HEROES && (slab.kind.is_open_floor() || matches!(slab.kind, SlabKind::Door(_)))
        };

        for flying in [false, true] {
            let mut assigned = Grid::new(slabs.width(), slabs.height(), false);
            for start in slabs.coords() {
                if assigned.at(start) || !is_hero_land(slabs.at(start)) {
                    continue;
                }
                let mut tiles = vec![start];
                assigned.set(start, true);
                let mut next = 0;
                while let Some(&at) = tiles.get(next) {
                    next += 1;
                    for n in at.neighbors4() {
                        let slab = slabs.at(n);
                        let passable = is_hero_land(slab)
                            || slab.kind == SlabKind::DungeonHeart
                            || (flying && slab.kind.is_liquid());
                        if passable && slabs.in_bounds(n) && !assigned.at(n) {
                            assigned.set(n, true);
                            tiles.push(n);
                        }
                    }
                }
                if flying && !tiles.iter().any(|at| slabs.at(*at).kind.is_liquid()) {
                    continue;
                }

                let id = self.regions.len();
                let mut strongholds = BTreeSet::new();
                let mut strength = 0;
                for &at in &tiles {
                    let slab = slabs.at(at);
                    if slab.kind == SlabKind::DungeonHeart {
                        strongholds.insert(slab.owner);
                    }
                    if !slab.kind.is_liquid() {
                        strength += unit_strength.get(&at).copied().unwrap_or(0);
                    }
                    let layer = if flying { &mut self.fly_region } else { &mut self.walk_region };
                    layer.set(at, Some(id));
                }
                for (&player, record) in players {
                    if record.stronghold.is_some_and(|at| tiles.contains(&at)) {
                        strongholds.insert(player);
                    }
                }
                self.regions.push(HostileRegion {
                    any_tile: start,
                    strength,
                    continuous_walkable: !flying,
                    strongholds: strongholds.into_iter().collect(),
                });
            }
        }
    }
}

fn walk_step(slab: Slab) -> Step {
    if slab.kind.is_open_floor() || slab.kind == SlabKind::Path { Step::Enter } else { Step::Blocked }
}

fn dig_step(slab: Slab, player: PlayerId, bridges: bool) -> Step {
    match slab.kind {
        SlabKind::Gems => Step::EnterAndStop,
        SlabKind::Earth | SlabKind::TorchDirt | SlabKind::Gold => Step::Enter,
        SlabKind::Wall | SlabKind::Door(_) if slab.owner == player => Step::Enter,
        kind if kind.is_liquid() && bridges => Step::Enter,
        _ => walk_step(slab),
    }
}

/// Multi-source breadth-first flood. Unreached tiles hold -1.
fn flood(slabs: &Grid<Slab>, seeds: &[TileCoord], step: impl Fn(Slab) -> Step) -> Grid<i32> {
    let mut dist = Grid::new(slabs.width(), slabs.height(), -1);
    let mut queue = VecDeque::new();
    for &seed in seeds {
        if slabs.in_bounds(seed) && dist.at(seed) < 0 {
            dist.set(seed, 0);
            queue.push_back(seed);
        }
    }
    while let Some(at) = queue.pop_front() {
        let here = dist.at(at);
        if here > 0 && step(slabs.at(at)) == Step::EnterAndStop {
            continue;
        }
        for n in at.neighbors4() {
            if !slabs.in_bounds(n) || dist.at(n) >= 0 {
                continue;
            }
            if step(slabs.at(n)) != Step::Blocked {
                dist.set(n, here + 1);
                queue.push_back(n);
            }
        }
    }
    dist
}
