//! Seeded random maps for fuzzing the planner.
//! This module exists so tools and property tests can mass-produce plausible dungeons.
//! It does not own balance; the layouts only need to exercise every planner path.

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::{Rng, SeedableRng};

use super::{SimPlayer, SimWorld};
use crate::types::*;

const ROOM_KINDS: [RoomKind; 8] = [
    RoomKind::Treasure,
    RoomKind::Lair,
    RoomKind::Garden,
    RoomKind::Library,
    RoomKind::Training,
    RoomKind::Workshop,
    RoomKind::Temple,
    RoomKind::Bridge,
];

fn roll(rng: &mut ChaCha8Rng, below: u64) -> u64 {
    if below == 0 { 0 } else { rng.next_u64() % below }
}

fn coord_in(rng: &mut ChaCha8Rng, min: i32, max: i32) -> i32 {
    if max <= min { min } else { min + roll(rng, (max - min + 1) as u64) as i32 }
}

/// Builds a map with one keeper base for player 0, an optional rival base for
/// player 1 and a hero outpost, all set in earth with minerals and liquid.
///
/// Maps smaller than 24x24 are grown to that size.
pub fn random_world(seed: u64, width: i32, height: i32) -> SimWorld {
    let (width, height) = (width.max(24), height.max(24));
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut world = SimWorld::new(width, height);
    world.fill_rect(TileCoord::new(1, 1), TileCoord::new(width - 2, height - 2), SlabKind::Earth, PlayerId::NEUTRAL);

    for at in world.slabs.coords().collect::<Vec<_>>() {
        if world.slab(at).kind != SlabKind::Earth {
            continue;
        }
        let kind = match roll(&mut rng, 100) {
            0..=6 => SlabKind::Gold,
            7 => SlabKind::Gems,
            8..=15 => SlabKind::Rock,
            16..=17 => SlabKind::Water,
            18 => SlabKind::Lava,
            _ => continue,
        };
        world.set_slab(at, kind, PlayerId::NEUTRAL);
    }

    let me = PlayerId(0);
    let base = TileCoord::new(coord_in(&mut rng, 4, width / 3), coord_in(&mut rng, 4, height - 5));
    carve_base(&mut world, me, base);
    let mut record = SimPlayer {
        money: 2000 + roll(&mut rng, 20) as i64 * 500,
        strength: 50 + roll(&mut rng, 200) as i64,
        digger_price: Some(100),
        imprisons: roll(&mut rng, 2) == 0,
        creatures: CreatureCounts { active: roll(&mut rng, 12) as i32, max_attracted: 12 },
        ..SimPlayer::default()
    };
    record.available_rooms.extend(ROOM_KINDS.iter().filter(|_| roll(&mut rng, 4) != 0));
    record.available_rooms.insert(RoomKind::Treasure);
    world.add_player(me, record);
    for _ in 0..3 + roll(&mut rng, 8) {
        world.add_unit(me, UnitRole::Digger, base, 5);
    }
    for _ in 0..roll(&mut rng, 4) {
        let strength = 10 + roll(&mut rng, 40) as i64;
        world.add_unit(me, UnitRole::Fighter, base.offset(1, 0), strength);
    }

    if roll(&mut rng, 2) == 0 {
        let rival = PlayerId(1);
        let at = TileCoord::new(coord_in(&mut rng, width * 2 / 3, width - 5), coord_in(&mut rng, 4, height - 5));
        carve_base(&mut world, rival, at);
        let record = SimPlayer { money: 5000, strength: 20 + roll(&mut rng, 200) as i64, ..SimPlayer::default() };
        world.add_player(rival, record);
        world.add_unit(rival, UnitRole::Digger, at, 5);
        world.add_unit(rival, UnitRole::Fighter, at.offset(0, 1), 20);
    }

    let outpost = TileCoord::new(coord_in(&mut rng, width / 3 + 3, width - 6), coord_in(&mut rng, 2, height - 6));
    world.fill_rect(outpost, outpost.offset(3, 3), SlabKind::Claimed, PlayerId::HEROES);
    world.set_slab(outpost.offset(4, 1), SlabKind::Door(DoorTier::Wood), PlayerId::HEROES);
    for _ in 0..1 + roll(&mut rng, 3) {
        let strength = 5 + roll(&mut rng, 60) as i64;
        let at = outpost.offset(coord_in(&mut rng, 0, 3), coord_in(&mut rng, 0, 3));
        world.add_unit(PlayerId::HEROES, UnitRole::Fighter, at, strength);
    }

    for (kind, cost) in [
        (RoomKind::Treasure, 50),
        (RoomKind::Lair, 60),
        (RoomKind::Garden, 60),
        (RoomKind::Library, 70),
        (RoomKind::Training, 80),
        (RoomKind::Workshop, 90),
        (RoomKind::Temple, 120),
        (RoomKind::Bridge, 30),
    ] {
        world.set_room_cost(kind, cost);
    }
    world.refresh();
    world
}

/// A 5x5 claimed square with the heart in the middle.
fn carve_base(world: &mut SimWorld, owner: PlayerId, center: TileCoord) {
    world.fill_rect(center.offset(-2, -2), center.offset(2, 2), SlabKind::Claimed, owner);
    world.set_slab(center, SlabKind::DungeonHeart, owner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{EconomyQuery, GridQuery};

    #[test]
    fn same_seed_gives_the_same_map() {
        let a = random_world(42, 30, 30);
        let b = random_world(42, 30, 30);
        assert!(a.slabs.cells() == b.slabs.cells());
        assert_eq!(a.money(PlayerId(0)), b.money(PlayerId(0)));
    }

    #[test]
    fn keeper_base_has_a_heart() {
        let world = random_world(7, 10, 10);
        assert_eq!(world.dimensions(), (24, 24));
        let heart = world.stronghold(PlayerId(0)).unwrap();
        assert_eq!(world.slab_kind(heart), SlabKind::DungeonHeart);
    }
}
