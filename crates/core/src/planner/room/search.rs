//! Seed generation and greedy hill climbing over candidate rectangles.
//! This module exists to turn a scoring function into a best rectangle per room kind.
//! It does not own rectangle scoring or the build loop.

use super::*;
use crate::config::Scale;
use crate::grid::Grid;

impl<W: World> AgentView<'_, W> {
    /// Greedy local search: grow a side, rotate or slide, and take the
    /// best-scoring move of each round. Stops once no move beats the current
    /// rectangle; ties keep the earlier move.
    fn climb(
        &self,
        search: &RoomSearch,
        carving: Carving,
        start: RoomExpansionPos,
        allow_translate: bool,
    ) -> (RoomExpansionPos, Option<i64>) {
        let mut best_pos = start;
        let mut best_score = self.evaluate_rectangle(search, carving, &start);
        for _ in 0..self.cfg.expansion.max_iterations {
            let base = best_pos;
            let mut moves: Vec<RoomExpansionPos> = DIRECTIONS.iter().map(|&(dx, dy)| base.enlarged(dx, dy)).collect();
            moves.extend(base.rotated());
            if allow_translate {
                moves.extend(DIRECTIONS.iter().map(|&(dx, dy)| base.translated(dx, dy)));
            }
            let mut improved = false;
            for pos in moves {
                let score = self.evaluate_rectangle(search, carving, &pos);
                if score > best_score {
                    best_score = score;
                    best_pos = pos;
                    improved = true;
                }
            }
            if !improved {
                break;
            }
        }
        (best_pos, best_score)
    }

    /// Walks from `origin` along `direction` over open floor and liquid to the
    /// first tile that still needs digging, then climbs a room from there.
    fn evaluate_from_seed(
        &self,
        search: &mut RoomSearch,
        origin: TileCoord,
        (dx, dy): (i32, i32),
        allow_translate: bool,
        scale: Scale,
    ) -> Option<i64> {
        let mut at = origin;
        if (dx, dy) != (0, 0) {
            loop {
                let kind = self.world.slab_kind(at);
                if kind.is_liquid() {
                    if !self.bridges_available() {
                        return None;
                    }
                } else if !kind.is_open_floor() || kind == SlabKind::Claimed {
                    break;
                }
                at = at.offset(dx, dy);
            }
        }
        let start = RoomExpansionPos::single(at, origin, dx, dy);
        let (pos, score) = self.climb(search, Carving::Dig, start, allow_translate);
        let score = self.adjust_climbed(search, &pos, score.map(|score| scale.apply(score)));
        search.offer(pos, score);
        score
    }

    /// Grows a room out of already open floor around `center`.
    fn evaluate_around(&self, search: &mut RoomSearch, center: TileCoord, visited: &mut Grid<bool>) -> Option<i64> {
        if visited.at(center) || !self.is_floor_for(center) {
            return None;
        }
        if self.world.stronghold_distance(center, self.agent) < 0 {
            return None;
        }
        let start = RoomExpansionPos::around(center);
        if !start.tiles().all(|at| self.is_floor_for(at)) {
            return None;
        }
        let (pos, score) = self.climb(search, Carving::Predug, start, false);
        for at in pos.tiles() {
            visited.set(at, true);
        }
        let score = self.adjust_climbed(search, &pos, score);
        search.offer(pos, score);
        score
    }

    fn neighbour_scale(&self, neighbour: RoomKind, kind: RoomKind) -> Scale {
        let weights = &self.cfg.rooms;
        match neighbour {
            RoomKind::Library => weights.library_scale,
            RoomKind::Garden if kind.uses_food() => weights.garden_food_scale,
            RoomKind::Garden => weights.garden_other_scale,
            _ => Scale::IDENTITY,
        }
    }

    /// Best placement for `kind` across the sides of every owned room and
    /// rings of open floor around the stronghold. `None` unless it scores
    /// at least zero.
    pub(in crate::planner) fn find_expand_location(&self, kind: RoomKind, preferred_tiles: i32) -> Option<RoomCandidate> {
        let stronghold = self.world.stronghold(self.agent)?;
        let mut search = RoomSearch::new(kind, preferred_tiles);

        for room in self.world.rooms_of(self.agent) {
            let scale = self.neighbour_scale(room.kind, kind);
            for direction in DIRECTIONS {
                self.evaluate_from_seed(&mut search, room.center, direction, true, scale);
            }
        }

        let (width, height) = self.world.dimensions();
        let mut visited = Grid::new(width, height, false);
        let (cx, cy) = (stronghold.x, stronghold.y);
        let mut stale_rings: Option<u32> = None;
        for r in self.cfg.expansion.ring_start..width.max(height) {
            let before = search.best_score();
            for x in cx - r..=cx + r {
                self.evaluate_around(&mut search, TileCoord::new(x, cy - r), &mut visited);
                self.evaluate_around(&mut search, TileCoord::new(x, cy + r), &mut visited);
            }
            for y in cy - r - 1..=cy + r + 1 {
                self.evaluate_around(&mut search, TileCoord::new(cx - r, y), &mut visited);
                self.evaluate_around(&mut search, TileCoord::new(cx + r, y), &mut visited);
            }
            stale_rings = match stale_rings {
                Some(_) if search.best_score() > before => Some(0),
                Some(count) if count + 1 >= self.cfg.expansion.ring_patience => break,
                Some(count) => Some(count + 1),
                None if search.best_score() >= Some(0) => Some(0),
                None => None,
            };
        }

        let best = search.into_viable();
        if let Some(candidate) = &best {
            tracing::debug!(
                target: LOG_TARGET,
                agent = %self.agent,
                room = ?kind,
                width = candidate.pos.width(),
                height = candidate.pos.height(),
                score = candidate.score,
                "best room placement"
            );
        }
        best
    }

    /// Single-seed search used by the public planner API and gold digging.
    pub(in crate::planner) fn expand_from_seed(
        &self,
        kind: RoomKind,
        preferred_tiles: i32,
        seed: TileCoord,
        direction: (i32, i32),
        allow_translate: bool,
    ) -> Option<RoomCandidate> {
        let mut search = RoomSearch::new(kind, preferred_tiles);
        self.evaluate_from_seed(&mut search, seed, direction, allow_translate, Scale::IDENTITY);
        search.best
    }

    /// Offers rooms seeded from one tile in all four directions to `search`.
    pub(in crate::planner) fn offer_seeds_around(&self, search: &mut RoomSearch, seed: TileCoord) {
        for direction in DIRECTIONS {
            self.evaluate_from_seed(search, seed, direction, false, Scale::IDENTITY);
        }
    }
}
