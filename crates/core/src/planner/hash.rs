//! Stable digests of planner state and the salted tie-break perturbation.
//! This module exists to keep hashing concerns out of the selectors and task code.
//! It does not own what gets picked; it only makes picks reproducible.

use std::hash::Hasher;

use xxhash_rust::xxh3::{Xxh3, xxh3_64_with_seed};

use super::*;
use crate::state::RoomExpansionPos;

impl Planner {
    /// Digest of everything the agent remembers between ticks. Two planners
    /// fed the same world and seed report the same digest after every tick.
    pub fn state_digest(&self, agent: PlayerId) -> Option<u64> {
        self.agents.get(&agent).map(digest_state)
    }
}

fn digest_state(state: &AgentDiggingState) -> u64 {
    let mut hasher = Xxh3::new();
    hasher.write_u8(state.agent.0);
    for marked in state.ledger.grid().cells() {
        hasher.write_u8(u8::from(*marked));
    }
    for flagged in state.danger.grid().cells() {
        hasher.write_u8(u8::from(*flagged));
    }
    match &state.expand_room {
        Some(room) => {
            hasher.write_u8(1);
            hasher.write_u8(room.kind as u8);
            hasher.write_i32(room.preferred_tiles);
            write_pos(&mut hasher, &room.pos);
            hasher.write_i64(room.score);
            hasher.write_u32(room.drop_attempts);
        }
        None => hasher.write_u8(0),
    }
    hasher.write_usize(state.gold_digs.len());
    for dig in &state.gold_digs {
        write_coord(&mut hasher, dig.target);
        write_coord(&mut hasher, dig.access);
    }
    if let Some(dig) = state.attack_dig {
        write_coord(&mut hasher, dig.entry);
    }
    hasher.write_usize(state.bridges.len());
    for at in &state.bridges {
        write_coord(&mut hasher, *at);
    }
    hasher.write_u64(state.last_garden_turn.unwrap_or(u64::MAX));
    hasher.finish()
}

fn write_coord(hasher: &mut Xxh3, at: TileCoord) {
    hasher.write_i32(at.x);
    hasher.write_i32(at.y);
}

fn write_pos(hasher: &mut Xxh3, pos: &RoomExpansionPos) {
    hasher.write_i32(pos.min_x);
    hasher.write_i32(pos.min_y);
    hasher.write_i32(pos.max_x);
    hasher.write_i32(pos.max_y);
    write_coord(hasher, pos.access);
    hasher.write_i32(pos.access_dx);
    hasher.write_i32(pos.access_dy);
}

/// Product of two pseudo-random draws in `0..range`, fixed by `salt` and `at`.
pub(super) fn jitter(salt: u64, at: TileCoord, range: u64) -> i64 {
    if range == 0 {
        return 0;
    }
    let mut bytes = [0_u8; 8];
    bytes[..4].copy_from_slice(&at.x.to_le_bytes());
    bytes[4..].copy_from_slice(&at.y.to_le_bytes());
    let h = xxh3_64_with_seed(&bytes, salt);
    let a = h % range;
    let b = (h / range) % range;
    (a * b) as i64
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn jitter_is_fixed_by_salt_and_tile_and_stays_in_range() {
        let at = TileCoord::new(7, 3);
        assert_eq!(jitter(42, at, 10), jitter(42, at, 10));
        for salt in 0..200 {
            let value = jitter(salt, at, 10);
            assert!((0..=81).contains(&value));
        }
        assert_eq!(jitter(42, at, 0), 0);
        assert_eq!(jitter(42, at, 1), 0);
    }

    #[test]
    fn digest_tracks_ledger_and_queue_changes() {
        let world = open_pocket_world();
        let mut planner = planner_for(&world);
        let before = planner.state_digest(AGENT).unwrap();
        assert_eq!(planner.state_digest(AGENT), Some(before));

        planner.agents.get_mut(&AGENT).unwrap().ledger.mark(TileCoord::new(2, 2));
        let marked = planner.state_digest(AGENT).unwrap();
        assert_ne!(marked, before);

        planner.agents.get_mut(&AGENT).unwrap().bridges.push(TileCoord::new(1, 1));
        assert_ne!(planner.state_digest(AGENT).unwrap(), marked);
        assert_eq!(planner.state_digest(RIVAL), None);
    }
}
