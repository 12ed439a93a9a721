//! Rectangle scoring.
//!
//! A rectangle is rejected outright (`None`) when it leaves the map interior,
//! its access corridor is blocked or dangerous, or any interior tile cannot
//! be used. Otherwise the score adds up the interior, the surrounding ring,
//! the shape and the distances to our stronghold and to enemies.

use super::*;

impl<W: World> AgentView<'_, W> {
    pub(super) fn evaluate_rectangle(&self, search: &RoomSearch, carving: Carving, pos: &RoomExpansionPos) -> Option<i64> {
        let weights = &self.cfg.rooms;
        if !pos.access_is_aligned() {
            return None;
        }
        let (width, height) = self.world.dimensions();
        if pos.min_x < 1 || pos.min_y < 1 || pos.max_x >= width - 1 || pos.max_y >= height - 1 {
            return None;
        }

        let mut score = 0;
        for at in pos.corridor() {
            if !self.is_accessible(at) || self.is_dangerous(at) {
                return None;
            }
            if self.world.slab_kind(at) == SlabKind::Gold {
                score -= weights.access_gold_penalty;
            }
        }

        let treasure = search.kind == RoomKind::Treasure;
        let mut tiles = 0;
        for at in pos.tiles() {
            if self.is_dangerous(at) {
                return None;
            }
            match carving {
                Carving::Predug => {
                    if !self.is_floor_for(at) {
                        return None;
                    }
                }
                Carving::Dig => {
                    if self.is_marked_and_undug(at) {
                        return None;
                    }
                    // Treasure rooms may swallow gold, but not on their edge.
                    if (!treasure || pos.is_edge(at)) && !self.is_diggable_or_buildable(at) {
                        return None;
                    }
                }
            }
            tiles += 1;
            if tiles < search.preferred_tiles {
                score += weights.target_tile_bonus;
            }
            score += match self.world.slab_kind(at) {
                SlabKind::Earth => weights.earth_tile,
                SlabKind::Claimed => weights.claimed_tile,
                SlabKind::Gold if treasure => weights.gold_tile_treasure,
                SlabKind::Gold => weights.gold_tile_other,
                SlabKind::Wall => weights.wall_tile,
                _ => 0,
            };
        }

        score += pos.ring().into_iter().map(|at| self.wall_score(at)).sum::<i64>();
        score += self.squareness_penalty(pos);
        score -= i64::from(self.world.stronghold_distance(pos.access, self.agent)) * weights.stronghold_distance_weight;
        score += self.enemy_distance_term(search.kind, pos.center());
        if tiles > search.preferred_tiles {
            score -= i64::from(tiles - search.preferred_tiles) * self.world.room_cost(search.kind);
        }
        Some(score)
    }

    fn wall_score(&self, at: TileCoord) -> i64 {
        let walls = &self.cfg.rooms.walls;
        let marked = self.state.ledger.is_marked(at);
        match self.world.slab_kind(at) {
            SlabKind::Wall if self.is_own(at) => walls.own_wall,
            SlabKind::Wall => walls.foreign_wall,
            SlabKind::Earth | SlabKind::TorchDirt if marked => walls.earth_marked,
            SlabKind::Earth | SlabKind::TorchDirt => walls.earth,
            SlabKind::Rock | SlabKind::Gems => walls.rock_or_gems,
            SlabKind::Claimed => walls.claimed,
            SlabKind::Gold if marked => walls.gold_marked,
            SlabKind::Gold => walls.gold,
            SlabKind::Lava | SlabKind::Water | SlabKind::Path => walls.exposed,
            SlabKind::Door(_) if self.is_own(at) => walls.own_door,
            SlabKind::Door(_) => walls.foreign_door,
            _ => walls.other,
        }
    }

    /// Long thin rooms pay per extra step of aspect; a 2xN strip pays once.
    fn squareness_penalty(&self, pos: &RoomExpansionPos) -> i64 {
        let (w, h) = (pos.width(), pos.height());
        let diff = (w - h).abs();
        let weight = self.cfg.rooms.squareness_weight;
        if diff > 1 {
            -weight * i64::from(diff - 1) * i64::from(w.max(h))
        } else if diff == 1 && w.min(h) <= 2 {
            -weight
        } else {
            0
        }
    }

    /// Distance to the nearest hostile keeper, weighted per room kind.
    fn enemy_distance_term(&self, kind: RoomKind, center: TileCoord) -> i64 {
        let nearest = PlayerId::keepers()
            .filter(|other| *other != self.agent && !self.world.are_allies(self.agent, *other))
            .map(|other| self.world.dig_distance(center, other))
            .filter(|distance| *distance >= 0)
            .min();
        let Some(distance) = nearest else { return 0 };
        let weight = if kind.is_frontline() {
            self.cfg.rooms.frontline_enemy_distance_weight
        } else {
            self.cfg.rooms.enemy_distance_weight
        };
        i64::from(distance) * weight
    }

    /// Final adjustments after climbing: minimum side, garden pasture and
    /// treasure room proximity to minerals.
    pub(super) fn adjust_climbed(&self, search: &RoomSearch, pos: &RoomExpansionPos, score: Option<i64>) -> Option<i64> {
        let score = score?;
        let weights = &self.cfg.rooms;
        if pos.width() < weights.min_side || pos.height() < weights.min_side {
            return None;
        }
        match search.kind {
            RoomKind::Garden => Some(score + self.pasture_bonus(pos)),
            RoomKind::Treasure => Some(score + self.mineral_bonus(pos)),
            _ => Some(score),
        }
    }

    /// Reachable open ground around a garden, worth more in line with its sides.
    fn pasture_bonus(&self, pos: &RoomExpansionPos) -> i64 {
        let weights = &self.cfg.rooms;
        let r = weights.garden_radius;
        let mut bonus = 0;
        for y in pos.min_y - r..=pos.max_y + r {
            for x in pos.min_x - r..=pos.max_x + r {
                let at = TileCoord::new(x, y);
                let open = matches!(
                    self.world.slab_kind(at),
                    SlabKind::Claimed | SlabKind::Earth | SlabKind::Path | SlabKind::Gold
                );
                if !open || self.world.dig_distance(at, self.agent) < 0 {
                    continue;
                }
                let inline = (x >= pos.min_x && x <= pos.max_x) || (y >= pos.min_y && y <= pos.max_y);
                bonus += if inline { weights.garden_inline_bonus } else { weights.garden_diagonal_bonus };
            }
        }
        bonus
    }

    /// Minerals near a treasure room, weighted by closeness to the nearest
    /// edge on each axis.
    fn mineral_bonus(&self, pos: &RoomExpansionPos) -> i64 {
        let weights = &self.cfg.rooms;
        let r = self.cfg.gold.treasure_search_radius;
        let mut bonus = 0;
        for y in pos.min_y - r..=pos.max_y + r {
            for x in pos.min_x - r..=pos.max_x + r {
                if !self.world.slab_kind(TileCoord::new(x, y)).is_mineral() {
                    continue;
                }
                let dx = (x - pos.min_x).abs().min((x - pos.max_x).abs());
                let dy = (y - pos.min_y).abs().min((y - pos.max_y).abs());
                let distance = dx + dy;
                let closeness = i64::from((r - distance).max(0));
                bonus += weights.treasure_mineral_base + weights.treasure_mineral_scale * closeness / i64::from(r.max(1));
            }
        }
        bonus
    }
}
