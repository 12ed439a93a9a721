//! Per-agent planning records that survive between ticks.
//! This module exists to keep long-lived task state separate from the code that advances it.
//! It does not own scoring, command issuing or world queries.

use serde::Serialize;

use crate::grid::Grid;
use crate::types::{PlayerId, RoomKind, TileCoord};

/// Tiles with an outstanding excavation or bridge order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DigLedger {
    marked: Grid<bool>,
}

impl DigLedger {
    pub fn new(width: i32, height: i32) -> Self {
        Self { marked: Grid::new(width, height, false) }
    }

    pub fn is_marked(&self, at: TileCoord) -> bool {
        self.marked.at(at)
    }

    pub fn mark(&mut self, at: TileCoord) {
        self.marked.set(at, true);
    }

    pub fn marked_tiles(&self) -> impl Iterator<Item = TileCoord> + '_ {
        self.marked.coords().filter(|at| self.marked.at(*at))
    }

    pub fn marked_count(&self) -> usize {
        self.marked.cells().iter().filter(|cell| **cell).count()
    }

    pub(crate) fn grid(&self) -> &Grid<bool> {
        &self.marked
    }
}

/// Tiles the agent should not dig into or build on this tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DangerMap {
    flagged: Grid<bool>,
}

impl DangerMap {
    pub fn new(width: i32, height: i32) -> Self {
        Self { flagged: Grid::new(width, height, false) }
    }

    pub fn is_flagged(&self, at: TileCoord) -> bool {
        self.flagged.at(at)
    }

    pub fn clear(&mut self) {
        self.flagged.fill(false);
    }

    /// Flags `center` and its eight neighbours.
    pub fn flag_around(&mut self, center: TileCoord) {
        for dy in -1..=1 {
            for dx in -1..=1 {
                self.flagged.set(center.offset(dx, dy), true);
            }
        }
    }

    pub fn flagged_count(&self) -> usize {
        self.flagged.cells().iter().filter(|cell| **cell).count()
    }

    pub(crate) fn grid(&self) -> &Grid<bool> {
        &self.flagged
    }
}

/// A candidate room rectangle plus the tile a tunnel enters it from.
///
/// `access_dx`/`access_dy` point from the access tile towards the rectangle.
/// A zero direction means the room is carved from floor that is already open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RoomExpansionPos {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
    pub access: TileCoord,
    pub access_dx: i32,
    pub access_dy: i32,
}

impl RoomExpansionPos {
    pub fn single(at: TileCoord, access: TileCoord, access_dx: i32, access_dy: i32) -> Self {
        Self { min_x: at.x, min_y: at.y, max_x: at.x, max_y: at.y, access, access_dx, access_dy }
    }

    /// A 3x3 block around `center`, entered from its west column.
    pub fn around(center: TileCoord) -> Self {
        Self {
            min_x: center.x - 1,
            min_y: center.y - 1,
            max_x: center.x + 1,
            max_y: center.y + 1,
            access: TileCoord::new(center.x - 1, center.y),
            access_dx: 0,
            access_dy: 0,
        }
    }

    pub fn width(&self) -> i32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> i32 {
        self.max_y - self.min_y + 1
    }

    pub fn tile_count(&self) -> i32 {
        self.width() * self.height()
    }

    pub fn center(&self) -> TileCoord {
        TileCoord::new((self.min_x + self.max_x) / 2, (self.min_y + self.max_y) / 2)
    }

    pub fn contains(&self, at: TileCoord) -> bool {
        at.x >= self.min_x && at.x <= self.max_x && at.y >= self.min_y && at.y <= self.max_y
    }

    pub fn is_edge(&self, at: TileCoord) -> bool {
        at.x == self.min_x || at.x == self.max_x || at.y == self.min_y || at.y == self.max_y
    }

    /// Interior tiles in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = TileCoord> + use<> {
        let (min_x, max_x) = (self.min_x, self.max_x);
        (self.min_y..=self.max_y)
            .flat_map(move |y| (min_x..=max_x).map(move |x| TileCoord::new(x, y)))
    }

    /// The one-tile ring around the rectangle, columns first.
    pub fn ring(&self) -> Vec<TileCoord> {
        let mut ring = Vec::with_capacity((2 * (self.width() + self.height()) + 4) as usize);
        for y in self.min_y - 1..=self.max_y + 1 {
            ring.push(TileCoord::new(self.min_x - 1, y));
            ring.push(TileCoord::new(self.max_x + 1, y));
        }
        for x in self.min_x..=self.max_x {
            ring.push(TileCoord::new(x, self.min_y - 1));
            ring.push(TileCoord::new(x, self.max_y + 1));
        }
        ring
    }

    pub fn translated(mut self, dx: i32, dy: i32) -> Self {
        self.min_x += dx;
        self.max_x += dx;
        self.min_y += dy;
        self.max_y += dy;
        self
    }

    /// Grows the side that `dx`/`dy` points at by one tile.
    pub fn enlarged(mut self, dx: i32, dy: i32) -> Self {
        if dx < 0 {
            self.min_x += dx;
        }
        if dy < 0 {
            self.min_y += dy;
        }
        if dx > 0 {
            self.max_x += dx;
        }
        if dy > 0 {
            self.max_y += dy;
        }
        self
    }

    /// Swaps width and height around the top-left corner. Square rooms have no rotation.
    pub fn rotated(mut self) -> Option<Self> {
        let w = self.max_x - self.min_x;
        let h = self.max_y - self.min_y;
        if w == h {
            return None;
        }
        self.max_x = self.min_x + h;
        self.max_y = self.min_y + w;
        Some(self)
    }

    /// The access tile must line up with the rectangle and sit on or beyond
    /// the edge the direction vector enters through.
    pub fn access_is_aligned(&self) -> bool {
        let a = self.access;
        if self.access_dx == 0 && (a.x < self.min_x || a.x > self.max_x) {
            return false;
        }
        if self.access_dy == 0 && (a.y < self.min_y || a.y > self.max_y) {
            return false;
        }
        if self.access_dx < 0 && a.x < self.max_x {
            return false;
        }
        if self.access_dx > 0 && a.x > self.min_x {
            return false;
        }
        if self.access_dy < 0 && a.y < self.max_y {
            return false;
        }
        if self.access_dy > 0 && a.y > self.min_y {
            return false;
        }
        true
    }

    /// Tiles from the access point up to, not including, the entered edge.
    pub fn corridor(&self) -> Vec<TileCoord> {
        let mut tiles = Vec::new();
        if !self.access_is_aligned() {
            return tiles;
        }
        let mut at = self.access;
        let stop_x = match self.access_dx.signum() {
            -1 => self.max_x,
            1 => self.min_x,
            _ => at.x,
        };
        while at.x != stop_x {
            tiles.push(at);
            at.x += self.access_dx;
        }
        let stop_y = match self.access_dy.signum() {
            -1 => self.max_y,
            1 => self.min_y,
            _ => at.y,
        };
        while at.y != stop_y {
            tiles.push(at);
            at.y += self.access_dy;
        }
        tiles
    }
}

/// A room being dug out and then built tile by tile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoomExpansion {
    pub kind: RoomKind,
    pub preferred_tiles: i32,
    pub pos: RoomExpansionPos,
    pub score: i64,
    pub drop_attempts: u32,
}

/// A mineral deposit being connected to territory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct GoldDig {
    pub target: TileCoord,
    /// Where the dug path met existing territory.
    pub access: TileCoord,
}

/// A tunnel being dug towards a hostile region for an assault.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AttackDig {
    pub entry: TileCoord,
}

/// Everything one agent's digging planner remembers between ticks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AgentDiggingState {
    pub agent: PlayerId,
    pub ledger: DigLedger,
    pub danger: DangerMap,
    pub expand_room: Option<RoomExpansion>,
    pub gold_digs: Vec<GoldDig>,
    pub attack_dig: Option<AttackDig>,
    /// Liquid tiles waiting for a bridge, oldest first.
    pub bridges: Vec<TileCoord>,
    pub last_garden_turn: Option<u64>,
}

impl AgentDiggingState {
    pub fn new(agent: PlayerId, width: i32, height: i32) -> Self {
        Self {
            agent,
            ledger: DigLedger::new(width, height),
            danger: DangerMap::new(width, height),
            expand_room: None,
            gold_digs: Vec::new(),
            attack_dig: None,
            bridges: Vec::new(),
            last_garden_turn: None,
        }
    }
}
