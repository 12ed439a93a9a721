//! Deterministic in-memory world for driving the planner in tests and tools.
//! This module exists to give the planner a complete `World` without a game engine behind it.
//! It does not own planning decisions; it only answers queries and executes accepted orders.

use std::collections::{BTreeMap, BTreeSet};
use std::mem;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::error::CommandError;
use crate::grid::Grid;
use crate::types::*;
use crate::world::{CommandSink, EconomyQuery, GridQuery, InfluenceProvider};

mod fixture;
mod generate;
mod influence;

pub use fixture::{PlayerFixture, SlabOverride, UnitFixture, WorldFixture};
pub use generate::random_world;

use influence::{InfluenceFields, Metric};

/// Money an excavated gold tile pays out.
pub const GOLD_YIELD: i64 = 100;
/// Money one excavation of a gem face pays out. Gem faces never run dry.
pub const GEM_YIELD: i64 = 150;
/// Capacity each room tile adds to its room.
pub const CAPACITY_PER_TILE: i64 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slab {
    pub kind: SlabKind,
    pub owner: PlayerId,
}

impl Slab {
    pub const fn new(kind: SlabKind, owner: PlayerId) -> Self {
        Self { kind, owner }
    }

    pub const fn neutral(kind: SlabKind) -> Self {
        Self { kind, owner: PlayerId::NEUTRAL }
    }
}

impl Default for Slab {
    fn default() -> Self {
        Slab::neutral(SlabKind::Rock)
    }
}

/// Per-player economy and diplomacy record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimPlayer {
    pub money: i64,
    pub strength: i64,
    pub stronghold: Option<TileCoord>,
    pub available_rooms: BTreeSet<RoomKind>,
    pub allies: BTreeSet<PlayerId>,
    pub avoids: BTreeSet<PlayerId>,
    pub digger_price: Option<i64>,
    pub imprisons: bool,
    pub creatures: CreatureCounts,
    /// Occupied capacity per room kind.
    pub room_usage: BTreeMap<RoomKind, i64>,
}

impl Default for SimPlayer {
    fn default() -> Self {
        Self {
            money: 0,
            strength: 100,
            stronghold: None,
            available_rooms: BTreeSet::new(),
            allies: BTreeSet::new(),
            avoids: BTreeSet::new(),
            digger_price: None,
            imprisons: false,
            creatures: CreatureCounts::default(),
            room_usage: BTreeMap::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimUnit {
    pub owner: PlayerId,
    pub role: UnitRole,
    pub at: TileCoord,
    pub strength: i64,
    pub unconscious: bool,
    pub task: Option<DropGoal>,
}

/// An order the sim accepted, in acceptance order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum SimCommand {
    Excavate { player: PlayerId, at: TileCoord },
    ConstructRoom { player: PlayerId, at: TileCoord, kind: RoomKind },
    SellTrap { player: PlayerId, at: TileCoord },
    DropUnit { player: PlayerId, unit: UnitId, at: TileCoord, goal: DropGoal },
}

pub struct SimWorld {
    slabs: Grid<Slab>,
    hidden: BTreeSet<(PlayerId, TileCoord)>,
    traps: BTreeMap<TileCoord, PlayerId>,
    units: SlotMap<UnitId, SimUnit>,
    players: BTreeMap<PlayerId, SimPlayer>,
    room_costs: BTreeMap<RoomKind, i64>,
    build_to_broke: BTreeSet<RoomKind>,
    turn: u64,
    orders: Vec<(PlayerId, TileCoord)>,
    commands: Vec<SimCommand>,
    excavations_left: Option<usize>,
    rooms: Vec<RoomSummary>,
    room_index: Grid<Option<usize>>,
    influence: InfluenceFields,
}

impl SimWorld {
    /// A solid rock map with no players. Call `refresh` after painting it.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            slabs: Grid::new(width, height, Slab::default()),
            hidden: BTreeSet::new(),
            traps: BTreeMap::new(),
            units: SlotMap::with_key(),
            players: BTreeMap::new(),
            room_costs: BTreeMap::new(),
            build_to_broke: BTreeSet::new(),
            turn: 0,
            orders: Vec::new(),
            commands: Vec::new(),
            excavations_left: None,
            rooms: Vec::new(),
            room_index: Grid::new(width, height, None),
            influence: InfluenceFields::empty(width, height),
        }
    }

    pub fn slab(&self, at: TileCoord) -> Slab {
        self.slabs.at(at)
    }

    pub fn set_slab(&mut self, at: TileCoord, kind: SlabKind, owner: PlayerId) {
        self.slabs.set(at, Slab::new(kind, owner));
    }

    /// Paints every tile of the inclusive rectangle.
    pub fn fill_rect(&mut self, min: TileCoord, max: TileCoord, kind: SlabKind, owner: PlayerId) {
        for y in min.y..=max.y {
            for x in min.x..=max.x {
                self.set_slab(TileCoord::new(x, y), kind, owner);
            }
        }
    }

    pub fn add_player(&mut self, id: PlayerId, player: SimPlayer) {
        self.players.insert(id, player);
    }

    pub fn player(&self, id: PlayerId) -> Option<&SimPlayer> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut SimPlayer> {
        self.players.get_mut(&id)
    }

    pub fn add_unit(&mut self, owner: PlayerId, role: UnitRole, at: TileCoord, strength: i64) -> UnitId {
        self.units.insert(SimUnit { owner, role, at, strength, unconscious: false, task: None })
    }

    pub fn unit(&self, id: UnitId) -> Option<&SimUnit> {
        self.units.get(id)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut SimUnit> {
        self.units.get_mut(id)
    }

    pub fn place_trap(&mut self, at: TileCoord, owner: PlayerId) {
        self.traps.insert(at, owner);
    }

    pub fn hide_from(&mut self, player: PlayerId, at: TileCoord) {
        self.hidden.insert((player, at));
    }

    pub fn set_room_cost(&mut self, kind: RoomKind, cost: i64) {
        self.room_costs.insert(kind, cost);
    }

    pub fn allow_building_to_broke(&mut self, kind: RoomKind) {
        self.build_to_broke.insert(kind);
    }

    /// Accepts `count` more excavation orders, then declines every further one.
    pub fn fail_excavations_after(&mut self, count: usize) {
        self.excavations_left = Some(count);
    }

    /// Queues an order as if it had been placed before the planner started.
    pub fn queue_order(&mut self, player: PlayerId, at: TileCoord) {
        if !self.orders.contains(&(player, at)) {
            self.orders.push((player, at));
        }
    }

    pub fn commands(&self) -> &[SimCommand] {
        &self.commands
    }

    pub fn excavations(&self, player: PlayerId) -> Vec<TileCoord> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                SimCommand::Excavate { player: p, at } if *p == player => Some(*at),
                _ => None,
            })
            .collect()
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn advance_turns(&mut self, turns: u64) {
        self.turn += turns;
    }

    /// Recomputes room membership and every influence field from the slabs.
    pub fn refresh(&mut self) {
        self.rebuild_rooms();
        self.influence = InfluenceFields::compute(&self.slabs, &self.players, &self.units);
    }

    /// Carries out every queued excavation, claims the dug tiles that touch
    /// their owner's floor, reveals around scouting diggers and advances one turn.
    pub fn resolve_orders(&mut self) {
        let orders = mem::take(&mut self.orders);
        let mut dug = Vec::new();
        for (player, at) in orders {
            let slab = self.slabs.at(at);
            match slab.kind {
                SlabKind::Gems => self.pay(player, GEM_YIELD),
                SlabKind::Gold => {
                    self.pay(player, GOLD_YIELD);
                    self.set_slab(at, SlabKind::Path, PlayerId::NEUTRAL);
                    dug.push((player, at));
                }
                kind if kind.is_excavatable() => {
                    self.set_slab(at, SlabKind::Path, PlayerId::NEUTRAL);
                    dug.push((player, at));
                }
                _ => {}
            }
        }
        loop {
            let mut changed = false;
            for &(player, at) in &dug {
                if self.slabs.at(at).kind != SlabKind::Path {
                    continue;
                }
                let touches_floor = at.neighbors4().into_iter().any(|n| {
                    let slab = self.slabs.at(n);
                    slab.owner == player && slab.kind.is_open_floor()
                });
                if touches_floor {
                    self.set_slab(at, SlabKind::Claimed, player);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        let scouts: Vec<(PlayerId, TileCoord)> = self
            .units
            .values_mut()
            .filter(|unit| unit.task == Some(DropGoal::DigToReveal))
            .map(|unit| {
                unit.task = None;
                (unit.owner, unit.at)
            })
            .collect();
        for (player, at) in scouts {
            for n in at.neighbors4() {
                self.hidden.remove(&(player, n));
            }
        }
        self.turn += 1;
        self.refresh();
    }

    fn pay(&mut self, player: PlayerId, amount: i64) {
        if let Some(record) = self.players.get_mut(&player) {
            record.money += amount;
        }
    }

    fn rebuild_rooms(&mut self) {
        let (width, height) = (self.slabs.width(), self.slabs.height());
        self.rooms.clear();
        self.room_index = Grid::new(width, height, None);
        for start in self.slabs.coords() {
            let slab = self.slabs.at(start);
            let SlabKind::Room(kind) = slab.kind else { continue };
            if self.room_index.at(start).is_some() {
                continue;
            }
            let id = self.rooms.len();
            let mut tiles = vec![start];
            self.room_index.set(start, Some(id));
            let mut next = 0;
            while let Some(&at) = tiles.get(next) {
                next += 1;
                for n in at.neighbors4() {
                    if self.slabs.at(n) == slab && self.room_index.at(n).is_none() && self.slabs.in_bounds(n) {
                        self.room_index.set(n, Some(id));
                        tiles.push(n);
                    }
                }
            }
            let count = tiles.len() as i32;
            let sum = tiles.iter().fold((0, 0), |acc, at| (acc.0 + at.x, acc.1 + at.y));
            let mean = TileCoord::new(sum.0 / count, sum.1 / count);
            tiles.sort();
            let center = tiles.iter().copied().min_by_key(|at| (at.manhattan(mean), at.y, at.x)).unwrap_or(start);
            self.rooms.push(RoomSummary { kind, owner: slab.owner, center, tile_count: count });
        }
    }

    fn next_to_land_of(&self, player: PlayerId, at: TileCoord) -> bool {
        at.neighbors4().into_iter().any(|n| {
            let slab = self.slabs.at(n);
            slab.owner == player && slab.kind.is_open_floor()
        })
    }

    fn conscious_units(&self, player: PlayerId, role: UnitRole) -> impl Iterator<Item = (UnitId, &SimUnit)> {
        self.units
            .iter()
            .filter(move |(_, unit)| unit.owner == player && unit.role == role && !unit.unconscious)
    }
}

impl GridQuery for SimWorld {
    fn dimensions(&self) -> (i32, i32) {
        (self.slabs.width(), self.slabs.height())
    }

    fn slab_kind(&self, at: TileCoord) -> SlabKind {
        self.slabs.at(at).kind
    }

    fn slab_owner(&self, at: TileCoord) -> PlayerId {
        self.slabs.at(at).owner
    }

    fn is_revealed_to(&self, at: TileCoord, player: PlayerId) -> bool {
        !self.hidden.contains(&(player, at))
    }

    fn has_trap(&self, at: TileCoord) -> bool {
        self.traps.contains_key(&at)
    }

    fn has_trap_hostile_to(&self, at: TileCoord, player: PlayerId) -> bool {
        self.traps.get(&at).is_some_and(|owner| self.are_enemies(player, *owner))
    }

    fn room_at(&self, at: TileCoord) -> Option<RoomSummary> {
        self.room_index.at(at).and_then(|id| self.rooms.get(id)).copied()
    }

    fn units_at(&self, at: TileCoord) -> Vec<UnitSnapshot> {
        self.units
            .iter()
            .filter(|(_, unit)| unit.at == at)
            .map(|(id, unit)| UnitSnapshot { id, owner: unit.owner, role: unit.role, unconscious: unit.unconscious })
            .collect()
    }
}

impl InfluenceProvider for SimWorld {
    fn dig_distance(&self, at: TileCoord, player: PlayerId) -> i32 {
        self.influence.distance(Metric::Dig, at, player)
    }

    fn stronghold_distance(&self, at: TileCoord, player: PlayerId) -> i32 {
        self.influence.distance(Metric::Stronghold, at, player)
    }

    fn unblocked_drop_distance(&self, at: TileCoord, player: PlayerId) -> i32 {
        self.influence.distance(Metric::UnblockedDrop, at, player)
    }

    fn blocked_drop_distance(&self, at: TileCoord, player: PlayerId) -> i32 {
        self.influence.distance(Metric::BlockedDrop, at, player)
    }

    fn hostile_walk_region(&self, at: TileCoord) -> Option<RegionId> {
        self.influence.walk_region(at)
    }

    fn hostile_fly_region(&self, at: TileCoord) -> Option<RegionId> {
        self.influence.fly_region(at)
    }

    fn hostile_regions(&self) -> &[HostileRegion] {
        self.influence.regions()
    }

    fn traverse_region(&self, start: TileCoord, visit: &mut dyn FnMut(TileCoord) -> bool) {
        if !self.slabs.in_bounds(start) {
            return;
        }
        let mut seen = Grid::new(self.slabs.width(), self.slabs.height(), false);
        seen.set(start, true);
        if !visit(start) {
            return;
        }
        let mut queue = vec![start];
        let mut next = 0;
        while let Some(&at) = queue.get(next) {
            next += 1;
            for n in at.neighbors4() {
                if !self.slabs.in_bounds(n) || seen.at(n) {
                    continue;
                }
                seen.set(n, true);
                if visit(n) {
                    queue.push(n);
                }
            }
        }
    }
}

impl CommandSink for SimWorld {
    fn request_excavate(&mut self, player: PlayerId, at: TileCoord) -> Result<(), CommandError> {
        let slab = self.slabs.get(at).copied().ok_or(CommandError::InvalidTile(at))?;
        if !slab.kind.is_excavatable() {
            return Err(CommandError::InvalidTile(at));
        }
        if slab.kind == SlabKind::Wall && slab.owner != player && slab.owner != PlayerId::NEUTRAL {
            return Err(CommandError::NotPermitted(at));
        }
        if let Some(left) = self.excavations_left.as_mut() {
            if *left == 0 {
                return Err(CommandError::Rejected(format!("excavation budget spent at {at}")));
            }
            *left -= 1;
        }
        self.queue_order(player, at);
        self.commands.push(SimCommand::Excavate { player, at });
        Ok(())
    }

    fn request_construct_room(&mut self, player: PlayerId, at: TileCoord, kind: RoomKind) -> Result<(), CommandError> {
        if !self.slabs.in_bounds(at) {
            return Err(CommandError::InvalidTile(at));
        }
        if !self.is_room_available(player, kind) {
            return Err(CommandError::NotPermitted(at));
        }
        if !self.can_build_room_at(player, kind, at) {
            return Err(CommandError::InvalidTile(at));
        }
        let cost = self.room_cost(kind);
        let record = self.players.get_mut(&player).ok_or(CommandError::NotPermitted(at))?;
        if record.money < cost {
            return Err(CommandError::Unaffordable);
        }
        record.money -= cost;
        let built = if kind == RoomKind::Bridge { SlabKind::Bridge } else { SlabKind::Room(kind) };
        self.set_slab(at, built, player);
        self.commands.push(SimCommand::ConstructRoom { player, at, kind });
        self.refresh();
        Ok(())
    }

    fn request_sell_trap(&mut self, player: PlayerId, at: TileCoord) -> Result<(), CommandError> {
        match self.traps.get(&at) {
            Some(owner) if *owner == player => {
                self.traps.remove(&at);
                self.commands.push(SimCommand::SellTrap { player, at });
                Ok(())
            }
            Some(_) => Err(CommandError::NotPermitted(at)),
            None => Err(CommandError::InvalidTile(at)),
        }
    }

    fn request_drop_unit(
        &mut self,
        player: PlayerId,
        unit: UnitId,
        at: TileCoord,
        goal: DropGoal,
    ) -> Result<(), CommandError> {
        if !self.can_drop_at(player, at) {
            return Err(CommandError::NotPermitted(at));
        }
        let record = self
            .units
            .get_mut(unit)
            .filter(|record| record.owner == player && !record.unconscious)
            .ok_or_else(|| CommandError::Rejected(format!("unit cannot be dropped at {at}")))?;
        record.at = at;
        record.task = Some(goal);
        self.commands.push(SimCommand::DropUnit { player, unit, at, goal });
        Ok(())
    }

    fn outstanding_orders(&self, player: PlayerId) -> Vec<TileCoord> {
        self.orders.iter().filter(|(p, _)| *p == player).map(|(_, at)| *at).collect()
    }
}

impl EconomyQuery for SimWorld {
    fn money(&self, player: PlayerId) -> i64 {
        self.players.get(&player).map_or(0, |record| record.money)
    }

    fn room_cost(&self, kind: RoomKind) -> i64 {
        self.room_costs.get(&kind).copied().unwrap_or(0)
    }

    fn is_room_available(&self, player: PlayerId, kind: RoomKind) -> bool {
        self.players.get(&player).is_some_and(|record| record.available_rooms.contains(&kind))
    }

    fn builds_to_broke(&self, kind: RoomKind) -> bool {
        self.build_to_broke.contains(&kind)
    }

    fn can_build_room_at(&self, player: PlayerId, kind: RoomKind, at: TileCoord) -> bool {
        let slab = self.slabs.at(at);
        if kind == RoomKind::Bridge {
            return slab.kind.is_liquid() && self.is_revealed_to(at, player) && self.next_to_land_of(player, at);
        }
        slab.kind == SlabKind::Claimed && slab.owner == player && !self.has_trap(at)
    }

    fn room_tile_count(&self, player: PlayerId, kind: RoomKind) -> i32 {
        self.rooms.iter().filter(|room| room.owner == player && room.kind == kind).map(|room| room.tile_count).sum()
    }

    fn room_capacity(&self, player: PlayerId, kind: RoomKind) -> RoomCapacity {
        let total = i64::from(self.room_tile_count(player, kind)) * CAPACITY_PER_TILE;
        let used = self
            .players
            .get(&player)
            .and_then(|record| record.room_usage.get(&kind).copied())
            .unwrap_or(0)
            .clamp(0, total);
        RoomCapacity { total, used }
    }

    fn rooms_of(&self, player: PlayerId) -> Vec<RoomSummary> {
        let mut rooms: Vec<RoomSummary> = self.rooms.iter().filter(|room| room.owner == player).copied().collect();
        rooms.sort_by_key(|room| (room.kind, room.center.y, room.center.x));
        rooms
    }

    fn stronghold(&self, player: PlayerId) -> Option<TileCoord> {
        self.players.get(&player).and_then(|record| record.stronghold).or_else(|| {
            self.slabs.coords().find(|at| {
                let slab = self.slabs.at(*at);
                slab.kind == SlabKind::DungeonHeart && slab.owner == player
            })
        })
    }

    fn strength(&self, player: PlayerId) -> i64 {
        self.players.get(&player).map_or(0, |record| record.strength)
    }

    fn attitude(&self, player: PlayerId, towards: PlayerId) -> Attitude {
        match self.players.get(&player) {
            Some(record) if record.avoids.contains(&towards) => Attitude::Avoid,
            _ if self.are_enemies(player, towards) => Attitude::Aggressive,
            _ => Attitude::Neutral,
        }
    }

    fn are_allies(&self, a: PlayerId, b: PlayerId) -> bool {
        let lists = |x: PlayerId, y: PlayerId| self.players.get(&x).is_some_and(|record| record.allies.contains(&y));
        a == b || lists(a, b) || lists(b, a)
    }

    fn workforce(&self, player: PlayerId) -> i32 {
        self.conscious_units(player, UnitRole::Digger).count() as i32
    }

    fn creature_counts(&self, player: PlayerId) -> CreatureCounts {
        self.players.get(&player).map(|record| record.creatures).unwrap_or_default()
    }

    fn game_turn(&self) -> u64 {
        self.turn
    }

    fn urgent_digger(&self, player: PlayerId) -> Option<UnitId> {
        self.conscious_units(player, UnitRole::Digger).map(|(id, _)| id).next()
    }

    fn claim_digger(&self, player: PlayerId) -> Option<UnitId> {
        let diggers: Vec<(UnitId, &SimUnit)> = self.conscious_units(player, UnitRole::Digger).collect();
        let max_claimers = (diggers.len() as i64 - 1) / 3;
        let claiming = diggers.iter().filter(|(_, unit)| unit.task == Some(DropGoal::ClaimTerritory)).count() as i64;
        if max_claimers <= 0 || claiming >= max_claimers {
            return None;
        }
        diggers.into_iter().find(|(_, unit)| unit.task != Some(DropGoal::ClaimTerritory)).map(|(id, _)| id)
    }

    fn assault_fighter(&self, player: PlayerId, strongest: bool) -> Option<UnitId> {
        let fighters = self.conscious_units(player, UnitRole::Fighter);
        if strongest {
            // max_by_key keeps the last maximum; reverse so the first one wins.
            fighters.collect::<Vec<_>>().into_iter().rev().max_by_key(|(_, unit)| unit.strength).map(|(id, _)| id)
        } else {
            fighters.min_by_key(|(_, unit)| unit.strength).map(|(id, _)| id)
        }
    }

    fn can_drop_at(&self, player: PlayerId, at: TileCoord) -> bool {
        let slab = self.slabs.at(at);
        self.slabs.in_bounds(at) && slab.kind.is_open_floor() && slab.owner == player
    }

    fn digger_price(&self, player: PlayerId) -> Option<i64> {
        self.players.get(&player).and_then(|record| record.digger_price)
    }

    fn tends_to_imprison(&self, player: PlayerId) -> bool {
        self.players.get(&player).is_some_and(|record| record.imprisons)
    }

    fn hostile_fighter_near(&self, player: PlayerId, at: TileCoord, radius: i32) -> bool {
        self.units.values().any(|unit| {
            unit.role == UnitRole::Fighter
                && !unit.unconscious
                && unit.owner != PlayerId::NEUTRAL
                && self.are_enemies(player, unit.owner)
                && (unit.at.x - at.x).abs() <= radius
                && (unit.at.y - at.y).abs() <= radius
        })
    }
}
