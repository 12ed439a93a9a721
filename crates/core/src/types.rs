use std::fmt;

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    pub struct UnitId;
}

/// Number of keeper seats. Heroes and neutral units sit above this range.
pub const MAX_KEEPERS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }

    /// West, east, north, south. Every search that walks neighbours uses this order.
    pub const fn neighbors4(self) -> [TileCoord; 4] {
        [self.offset(-1, 0), self.offset(1, 0), self.offset(0, -1), self.offset(0, 1)]
    }

    pub fn manhattan(self, other: TileCoord) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    pub const HEROES: PlayerId = PlayerId(MAX_KEEPERS as u8);
    pub const NEUTRAL: PlayerId = PlayerId(MAX_KEEPERS as u8 + 1);
    pub const COUNT: usize = MAX_KEEPERS + 2;

    pub fn is_keeper(self) -> bool {
        (self.0 as usize) < MAX_KEEPERS
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn keepers() -> impl Iterator<Item = PlayerId> {
        (0..MAX_KEEPERS as u8).map(PlayerId)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            PlayerId::HEROES => f.write_str("heroes"),
            PlayerId::NEUTRAL => f.write_str("neutral"),
            PlayerId(n) => write!(f, "keeper{n}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoomKind {
    Entrance,
    Treasure,
    Lair,
    Garden,
    Library,
    Training,
    Workshop,
    Scavenger,
    Prison,
    Temple,
    Torture,
    Graveyard,
    Barracks,
    GuardPost,
    Bridge,
}

impl RoomKind {
    /// Rooms whose placement benefits from being close to the enemy.
    pub fn is_frontline(self) -> bool {
        matches!(self, RoomKind::GuardPost | RoomKind::Barracks | RoomKind::Graveyard | RoomKind::Prison)
    }

    /// Rooms whose occupants walk to the garden to eat.
    pub fn uses_food(self) -> bool {
        matches!(
            self,
            RoomKind::Workshop | RoomKind::Training | RoomKind::Library | RoomKind::Scavenger
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DoorTier {
    Wood,
    Braced,
    Iron,
    Magic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SlabKind {
    Rock,
    Gold,
    Gems,
    Earth,
    TorchDirt,
    Wall,
    Path,
    Claimed,
    Lava,
    Water,
    Room(RoomKind),
    Bridge,
    DungeonHeart,
    Door(DoorTier),
}

impl SlabKind {
    pub fn is_liquid(self) -> bool {
        matches!(self, SlabKind::Lava | SlabKind::Water)
    }

    pub fn is_mineral(self) -> bool {
        matches!(self, SlabKind::Gold | SlabKind::Gems)
    }

    /// Owned floor a unit can be dropped onto.
    pub fn is_open_floor(self) -> bool {
        matches!(
            self,
            SlabKind::Claimed | SlabKind::Room(_) | SlabKind::Bridge | SlabKind::DungeonHeart
        )
    }

    /// Kinds an excavation order turns into path.
    pub fn is_excavatable(self) -> bool {
        matches!(
            self,
            SlabKind::Earth | SlabKind::Gold | SlabKind::Gems | SlabKind::TorchDirt | SlabKind::Wall
        )
    }

    /// Kinds that still need work while they sit in the dig ledger.
    pub fn is_undug(self) -> bool {
        self.is_excavatable() || self.is_liquid()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitRole {
    Digger,
    Fighter,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitSnapshot {
    pub id: UnitId,
    pub owner: PlayerId,
    pub role: UnitRole,
    pub unconscious: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DropGoal {
    DigToReveal,
    ExcavateAtAccess,
    ClaimTerritory,
    AssaultDoor,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attitude {
    #[default]
    Neutral,
    Aggressive,
    Avoid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub kind: RoomKind,
    pub owner: PlayerId,
    pub center: TileCoord,
    pub tile_count: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomCapacity {
    pub total: i64,
    pub used: i64,
}

impl RoomCapacity {
    pub fn free(self) -> i64 {
        self.total - self.used
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureCounts {
    pub active: i32,
    pub max_attracted: i32,
}

pub type RegionId = usize;

/// A connected pocket of hostile territory as reported by the influence provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostileRegion {
    pub any_tile: TileCoord,
    pub strength: i64,
    pub continuous_walkable: bool,
    pub strongholds: Vec<PlayerId>,
}

impl HostileRegion {
    pub fn contains_stronghold_of(&self, player: PlayerId) -> bool {
        self.strongholds.contains(&player)
    }
}
