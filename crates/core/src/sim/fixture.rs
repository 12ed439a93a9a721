//! JSON world fixtures with an ASCII map.
//!
//! Glyphs: `#` rock, `.` earth, `:` torch dirt, `$` gold, `*` gems, `~` water,
//! `^` lava, `_` path, `=` unowned wall, `0`-`3` floor claimed by that keeper,
//! `H` hero floor, `D` hero wooden door. Anything else goes in `overrides`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{SimPlayer, SimWorld, Slab};
use crate::error::FixtureError;
use crate::types::*;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldFixture {
    pub rows: Vec<String>,
    pub players: Vec<PlayerFixture>,
    pub units: Vec<UnitFixture>,
    pub overrides: Vec<SlabOverride>,
    pub traps: Vec<TrapFixture>,
    pub hidden: Vec<HiddenFixture>,
    pub room_costs: BTreeMap<RoomKind, i64>,
    pub build_to_broke: Vec<RoomKind>,
    pub turn: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerFixture {
    pub id: PlayerId,
    #[serde(flatten)]
    pub record: SimPlayer,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFixture {
    pub owner: PlayerId,
    pub role: UnitRole,
    pub at: TileCoord,
    #[serde(default = "default_unit_strength")]
    pub strength: i64,
    #[serde(default)]
    pub unconscious: bool,
}

fn default_unit_strength() -> i64 {
    10
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlabOverride {
    pub at: TileCoord,
    pub kind: SlabKind,
    pub owner: PlayerId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrapFixture {
    pub at: TileCoord,
    pub owner: PlayerId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiddenFixture {
    pub player: PlayerId,
    pub at: TileCoord,
}

fn glyph_slab(glyph: char) -> Option<Slab> {
    let slab = match glyph {
        '#' => Slab::neutral(SlabKind::Rock),
        '.' => Slab::neutral(SlabKind::Earth),
        ':' => Slab::neutral(SlabKind::TorchDirt),
        '$' => Slab::neutral(SlabKind::Gold),
        '*' => Slab::neutral(SlabKind::Gems),
        '~' => Slab::neutral(SlabKind::Water),
        '^' => Slab::neutral(SlabKind::Lava),
        '_' => Slab::neutral(SlabKind::Path),
        '=' => Slab::neutral(SlabKind::Wall),
        '0'..='3' => {
            let keeper = glyph.to_digit(10)? as u8;
            Slab::new(SlabKind::Claimed, PlayerId(keeper))
        }
        'H' => Slab::new(SlabKind::Claimed, PlayerId::HEROES),
        'D' => Slab::new(SlabKind::Door(DoorTier::Wood), PlayerId::HEROES),
        _ => return None,
    };
    Some(slab)
}

impl SimWorld {
    pub fn from_fixture(fixture: &WorldFixture) -> Result<SimWorld, FixtureError> {
        let height = fixture.rows.len();
        let width = fixture.rows.first().map_or(0, |row| row.chars().count());
        if width == 0 {
            return Err(FixtureError::Ragged { row: 0 });
        }
        let mut world = SimWorld::new(width as i32, height as i32);
        for (y, row) in fixture.rows.iter().enumerate() {
            if row.chars().count() != width {
                return Err(FixtureError::Ragged { row: y });
            }
            for (x, glyph) in row.chars().enumerate() {
                let at = TileCoord::new(x as i32, y as i32);
                let slab = glyph_slab(glyph).ok_or(FixtureError::UnknownGlyph { glyph, at })?;
                world.slabs.set(at, slab);
            }
        }

        let check = |at: TileCoord| {
            if world.slabs.in_bounds(at) { Ok(at) } else { Err(FixtureError::OutOfBounds(at)) }
        };
        for entry in &fixture.overrides {
            check(entry.at)?;
        }
        for unit in &fixture.units {
            check(unit.at)?;
        }
        for trap in &fixture.traps {
            check(trap.at)?;
        }

        for entry in &fixture.overrides {
            world.set_slab(entry.at, entry.kind, entry.owner);
        }
        for player in &fixture.players {
            world.add_player(player.id, player.record.clone());
        }
        for unit in &fixture.units {
            let id = world.add_unit(unit.owner, unit.role, unit.at, unit.strength);
            if let Some(record) = world.unit_mut(id) {
                record.unconscious = unit.unconscious;
            }
        }
        for trap in &fixture.traps {
            world.place_trap(trap.at, trap.owner);
        }
        for hidden in &fixture.hidden {
            world.hide_from(hidden.player, hidden.at);
        }
        for (&kind, &cost) in &fixture.room_costs {
            world.set_room_cost(kind, cost);
        }
        for &kind in &fixture.build_to_broke {
            world.allow_building_to_broke(kind);
        }
        world.turn = fixture.turn;
        world.refresh();
        Ok(world)
    }

    pub fn from_json_str(json: &str) -> Result<SimWorld, FixtureError> {
        let fixture: WorldFixture = serde_json::from_str(json)?;
        SimWorld::from_fixture(&fixture)
    }

    pub fn from_file(path: &Path) -> Result<SimWorld, FixtureError> {
        let contents =
            fs::read_to_string(path).map_err(|source| FixtureError::Read { path: path.to_path_buf(), source })?;
        SimWorld::from_json_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{EconomyQuery, GridQuery};

    #[test]
    fn ascii_rows_and_overrides_build_the_map() {
        let world = SimWorld::from_json_str(
            r######"{
                "rows": ["#####", "#00.#", "#0$H#", "#####"],
                "players": [{ "id": 0, "money": 3000, "available_rooms": ["Lair"] }],
                "overrides": [{ "at": { "x": 1, "y": 1 }, "kind": "DungeonHeart", "owner": 0 }],
                "room_costs": { "Lair": 250 },
                "units": [{ "owner": 0, "role": "Digger", "at": { "x": 2, "y": 1 } }]
            }"######,
        )
        .unwrap();
        assert_eq!(world.dimensions(), (5, 4));
        assert_eq!(world.slab_kind(TileCoord::new(2, 2)), SlabKind::Gold);
        assert_eq!(world.slab_owner(TileCoord::new(3, 2)), PlayerId::HEROES);
        assert_eq!(world.stronghold(PlayerId(0)), Some(TileCoord::new(1, 1)));
        assert_eq!(world.money(PlayerId(0)), 3000);
        assert_eq!(world.strength(PlayerId(0)), 100);
        assert_eq!(world.room_cost(RoomKind::Lair), 250);
        assert_eq!(world.workforce(PlayerId(0)), 1);
    }

    #[test]
    fn ragged_rows_and_unknown_glyphs_are_rejected() {
        let ragged = SimWorld::from_json_str(r####"{ "rows": ["###", "##"] }"####);
        assert!(matches!(ragged, Err(FixtureError::Ragged { row: 1 })));

        let unknown = SimWorld::from_json_str(r####"{ "rows": ["#?#"] }"####);
        assert!(matches!(unknown, Err(FixtureError::UnknownGlyph { glyph: '?', .. })));

        let outside = SimWorld::from_json_str(
            r####"{ "rows": ["###"], "traps": [{ "at": { "x": 9, "y": 0 }, "owner": 4 }] }"####,
        );
        assert!(matches!(outside, Err(FixtureError::OutOfBounds(_))));
    }
}
