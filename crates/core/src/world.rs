//! Read and write seams between the planner and the surrounding simulation.
//! This module exists so the planner can run against any world that answers these queries.
//! It does not own terrain, influence computation or order execution.

use crate::error::CommandError;
use crate::types::*;

/// Terrain and occupancy at slab resolution.
pub trait GridQuery {
    /// Width and height in slabs.
    fn dimensions(&self) -> (i32, i32);

    /// Out-of-bounds tiles read as `Rock`.
    fn slab_kind(&self, at: TileCoord) -> SlabKind;

    /// Out-of-bounds tiles read as neutral.
    fn slab_owner(&self, at: TileCoord) -> PlayerId;

    fn is_revealed_to(&self, at: TileCoord, player: PlayerId) -> bool;

    fn has_trap(&self, at: TileCoord) -> bool;

    fn has_trap_hostile_to(&self, at: TileCoord, player: PlayerId) -> bool;

    fn room_at(&self, at: TileCoord) -> Option<RoomSummary>;

    fn units_at(&self, at: TileCoord) -> Vec<UnitSnapshot>;

    fn in_bounds(&self, at: TileCoord) -> bool {
        let (width, height) = self.dimensions();
        at.x >= 0 && at.y >= 0 && at.x < width && at.y < height
    }

    /// Tiles at least one slab away from the map edge, row-major.
    fn interior_coords(&self) -> Vec<TileCoord> {
        let (width, height) = self.dimensions();
        let mut coords = Vec::new();
        for y in 1..height - 1 {
            for x in 1..width - 1 {
                coords.push(TileCoord::new(x, y));
            }
        }
        coords
    }
}

/// Precomputed per-player distance fields and hostile territory pockets.
///
/// Every distance is negative when the tile cannot be reached.
pub trait InfluenceProvider {
    /// Steps from the player's territory, counting diggable tiles as passable.
    fn dig_distance(&self, at: TileCoord, player: PlayerId) -> i32;

    /// Steps from the player's stronghold across walkable floor.
    fn stronghold_distance(&self, at: TileCoord, player: PlayerId) -> i32;

    /// Steps a dropped unit would walk from owned floor, doors ignored.
    fn unblocked_drop_distance(&self, at: TileCoord, player: PlayerId) -> i32;

    /// Like `unblocked_drop_distance` but foreign doors stop the walk.
    fn blocked_drop_distance(&self, at: TileCoord, player: PlayerId) -> i32;

    fn hostile_walk_region(&self, at: TileCoord) -> Option<RegionId>;

    fn hostile_fly_region(&self, at: TileCoord) -> Option<RegionId>;

    fn hostile_regions(&self) -> &[HostileRegion];

    fn hostile_region(&self, id: RegionId) -> Option<&HostileRegion> {
        self.hostile_regions().get(id)
    }

    /// Floods four-connected tiles from `start`. `visit` sees every tile once
    /// and returns whether the flood may continue through it.
    fn traverse_region(&self, start: TileCoord, visit: &mut dyn FnMut(TileCoord) -> bool);
}

/// Transactional order interface. Every call may be declined.
pub trait CommandSink {
    fn request_excavate(&mut self, player: PlayerId, at: TileCoord) -> Result<(), CommandError>;

    fn request_construct_room(
        &mut self,
        player: PlayerId,
        at: TileCoord,
        kind: RoomKind,
    ) -> Result<(), CommandError>;

    fn request_sell_trap(&mut self, player: PlayerId, at: TileCoord) -> Result<(), CommandError>;

    fn request_drop_unit(
        &mut self,
        player: PlayerId,
        unit: UnitId,
        at: TileCoord,
        goal: DropGoal,
    ) -> Result<(), CommandError>;

    /// Tiles with an excavation or claim order still queued for `player`.
    fn outstanding_orders(&self, player: PlayerId) -> Vec<TileCoord>;
}

/// Economy, diplomacy and workforce facts about each player.
pub trait EconomyQuery {
    fn money(&self, player: PlayerId) -> i64;

    fn room_cost(&self, kind: RoomKind) -> i64;

    fn is_room_available(&self, player: PlayerId, kind: RoomKind) -> bool;

    fn room_buildable_now(&self, player: PlayerId, kind: RoomKind) -> bool {
        self.is_room_available(player, kind) && self.money(player) >= self.room_cost(kind)
    }

    /// Rooms allowed to spend the last of the treasury.
    fn builds_to_broke(&self, kind: RoomKind) -> bool;

    fn can_build_room_at(&self, player: PlayerId, kind: RoomKind, at: TileCoord) -> bool;

    fn room_tile_count(&self, player: PlayerId, kind: RoomKind) -> i32;

    fn room_capacity(&self, player: PlayerId, kind: RoomKind) -> RoomCapacity;

    fn rooms_of(&self, player: PlayerId) -> Vec<RoomSummary>;

    fn stronghold(&self, player: PlayerId) -> Option<TileCoord>;

    fn strength(&self, player: PlayerId) -> i64;

    fn attitude(&self, player: PlayerId, towards: PlayerId) -> Attitude;

    fn are_allies(&self, a: PlayerId, b: PlayerId) -> bool;

    fn are_enemies(&self, a: PlayerId, b: PlayerId) -> bool {
        a != b && !self.are_allies(a, b)
    }

    /// Diggers the player controls and may reassign.
    fn workforce(&self, player: PlayerId) -> i32;

    fn creature_counts(&self, player: PlayerId) -> CreatureCounts;

    fn game_turn(&self) -> u64;

    fn urgent_digger(&self, player: PlayerId) -> Option<UnitId>;

    /// `None` when enough diggers are already claiming.
    fn claim_digger(&self, player: PlayerId) -> Option<UnitId>;

    fn assault_fighter(&self, player: PlayerId, strongest: bool) -> Option<UnitId>;

    fn can_drop_at(&self, player: PlayerId, at: TileCoord) -> bool;

    /// `None` when the player cannot conjure diggers.
    fn digger_price(&self, player: PlayerId) -> Option<i64>;

    fn tends_to_imprison(&self, player: PlayerId) -> bool;

    fn hostile_fighter_near(&self, player: PlayerId, at: TileCoord, radius: i32) -> bool;
}

/// Everything the planner needs from the simulation.
pub trait World: GridQuery + InfluenceProvider + CommandSink + EconomyQuery {}

impl<T: GridQuery + InfluenceProvider + CommandSink + EconomyQuery> World for T {}
