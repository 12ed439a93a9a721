//! Room expansion: rectangle scoring, seed search, hill climbing and the build loop.
//! This module exists to keep the expansion optimizer apart from gold and breach digging.
//! It does not own which tiles get dug; it goes through the shared digging helpers.

use super::*;
use crate::state::RoomExpansionPos;

mod expand;
mod policy;
mod scoring;
mod search;

/// West, east, north, south unit steps.
const DIRECTIONS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// The best rectangle found for a room kind, with its score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RoomCandidate {
    pub kind: RoomKind,
    pub preferred_tiles: i32,
    pub pos: RoomExpansionPos,
    pub score: i64,
}

/// How interior tiles are judged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Carving {
    /// Interior still has to be excavated.
    Dig,
    /// Interior must already be open floor.
    Predug,
}

/// Running best across every seed tried for one room kind.
pub(super) struct RoomSearch {
    kind: RoomKind,
    pub(super) preferred_tiles: i32,
    best: Option<RoomCandidate>,
}

impl RoomSearch {
    pub(super) fn new(kind: RoomKind, preferred_tiles: i32) -> Self {
        Self { kind, preferred_tiles, best: None }
    }

    fn best_score(&self) -> Option<i64> {
        self.best.map(|candidate| candidate.score)
    }

    /// Keeps `pos` only when it strictly beats the current best.
    fn offer(&mut self, pos: RoomExpansionPos, score: Option<i64>) {
        let Some(score) = score else { return };
        if Some(score) > self.best_score() {
            self.best = Some(RoomCandidate { kind: self.kind, preferred_tiles: self.preferred_tiles, pos, score });
        }
    }

    /// The best candidate when it is worth building at all.
    pub(super) fn into_viable(self) -> Option<RoomCandidate> {
        self.best.filter(|candidate| candidate.score >= 0)
    }
}
