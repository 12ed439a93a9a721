//! Claim drops: where a spare digger should be put down to convert foreign floor.
//! This module exists to score every standing tile against its four neighbours.
//! It does not own digger bookkeeping; the world decides which digger is spare.

use super::hash::jitter;
use super::*;

/// North, west, south, east.
pub(super) const DROP_NEIGHBOURS: [(i32, i32); 4] = [(0, -1), (-1, 0), (0, 1), (1, 0)];

impl<W: World> AgentView<'_, W> {
    /// The standing tile whose best neighbour is worth most. Nothing scoring
    /// above zero means no drop.
    pub(super) fn pick_claim_target(&self, salt: u64) -> Option<TargetChoice> {
        let cheap_diggers = self.cheap_diggers();
        let mut best: Option<TargetChoice> = None;
        for at in self.world.interior_coords() {
            let Some(score) = self.claim_score(at, salt, cheap_diggers) else { continue };
            if score > best.map_or(0, |choice| choice.score) {
                best = Some(TargetChoice { at, score });
            }
        }
        best
    }

    fn cheap_diggers(&self) -> bool {
        self.world.digger_price(self.agent).is_some_and(|price| {
            self.world.money(self.agent) >= self.cfg.assault.cheap_digger_price_multiple * price
        })
    }

    /// Enemy keepers are fair game only while we are clearly stronger.
    pub(super) fn outmatches(&self, other: PlayerId) -> bool {
        let assault = &self.cfg.assault;
        let mine = self.world.strength(self.agent);
        self.world.strength(other) * assault.advantage_denominator < mine * assault.advantage_numerator
    }

    fn may_claim_from(&self, owner: PlayerId) -> bool {
        if !owner.is_keeper() {
            return true;
        }
        self.world.are_enemies(self.agent, owner) && self.outmatches(owner)
    }

    fn claim_score(&self, at: TileCoord, salt: u64, cheap_diggers: bool) -> Option<i64> {
        if !self.world.can_drop_at(self.agent, at) || self.is_dangerous(at) {
            return None;
        }
        let mut found_unconscious = false;
        if self.claim_blocked_by_units(at, &mut found_unconscious) {
            return None;
        }
        let mut best = 0;
        for (dx, dy) in DROP_NEIGHBOURS {
            let value = self.claim_neighbour_value(at.offset(dx, dy), salt, cheap_diggers, &mut found_unconscious)?;
            best = best.max(value);
        }
        if found_unconscious && self.world.tends_to_imprison(self.agent) {
            best += i64::from(self.cfg.assault.unconscious_bonus);
        }
        if self.world.hostile_fighter_near(self.agent, at, self.cfg.assault.claim_threat_radius) {
            return None;
        }
        Some(best)
    }

    /// Our own digger already here, or anything hostile that fights back.
    /// Knocked out hostiles are noted for the prison bonus.
    fn claim_blocked_by_units(&self, at: TileCoord, found_unconscious: &mut bool) -> bool {
        self.world.units_at(at).into_iter().any(|unit| {
            if unit.unconscious {
                *found_unconscious |= unit.owner != self.agent;
                return false;
            }
            if unit.owner == self.agent {
                return unit.role == UnitRole::Digger;
            }
            match unit.owner {
                PlayerId::HEROES => true,
                PlayerId::NEUTRAL => false,
                _ => unit.role != UnitRole::Digger,
            }
        })
    }

    /// `None` disqualifies the standing tile, zero means nothing to claim.
    fn claim_neighbour_value(
        &self,
        at: TileCoord,
        salt: u64,
        cheap_diggers: bool,
        found_unconscious: &mut bool,
    ) -> Option<i64> {
        let assault = &self.cfg.assault;
        let kind = self.world.slab_kind(at);
        let is_path = kind == SlabKind::Path;
        if !(kind.is_open_floor() || is_path) || kind == SlabKind::DungeonHeart {
            return Some(0);
        }
        let owner = self.world.slab_owner(at);
        if (owner == self.agent && !is_path) || self.state.ledger.is_marked(at) {
            return Some(0);
        }
        if self.is_dangerous(at) || (!is_path && !self.may_claim_from(owner)) {
            return None;
        }
        if self.claim_blocked_by_units(at, found_unconscious) {
            return None;
        }
        if !cheap_diggers && self.world.has_trap_hostile_to(at, self.agent) {
            return None;
        }
        if is_path {
            return Some(i64::from(assault.path_value));
        }
        let value = match self.world.room_at(at) {
            None => assault.claimed_value,
            Some(room) if room.kind == RoomKind::Entrance => assault.entrance_value,
            Some(room) => {
                let cost = i32::try_from(self.world.room_cost(room.kind)).unwrap_or(i32::MAX);
                room.tile_count.saturating_mul(cost) / assault.room_value_divisor.max(1)
            }
        };
        let home = self.world.stronghold(owner).map_or(0, |heart| heart.manhattan(at));
        Some(i64::from(value - home) + jitter(salt, at, assault.jitter_range))
    }
}

impl<W: World> AgentCtx<'_, W> {
    /// Drops a spare digger next to the best claim. `Ok(None)` when there is
    /// no spare digger or nothing worth claiming.
    pub(super) fn drop_for_claim(&mut self, salt: u64) -> Result<Option<TileCoord>, PlanError> {
        let Some(digger) = self.world.claim_digger(self.agent) else { return Ok(None) };
        let Some(target) = self.view().pick_claim_target(salt) else { return Ok(None) };
        self.world.request_drop_unit(self.agent, digger, target.at, DropGoal::ClaimTerritory)?;
        tracing::info!(
            target: LOG_TARGET,
            agent = %self.agent,
            x = target.at.x,
            y = target.at.y,
            score = target.score,
            "dropped digger to claim"
        );
        self.record(TaskKind::Claim, TaskOutcome::Started, target.at);
        Ok(Some(target.at))
    }
}
