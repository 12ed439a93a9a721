//! Gold and gem digging: target choice, the connecting tunnel, and treasure
//! rooms started on the way.
//! This module exists to own every concurrent gold dig task.
//! It does not own room scoring; treasure candidates go through the room search.

use std::mem;

use super::backtrack::DistanceField;
use super::room::RoomSearch;
use super::*;
use crate::state::GoldDig;

impl<W: World> AgentView<'_, W> {
    /// Highest `base / (bias + distance)` over every reachable, unmarked,
    /// undangerous mineral tile. Doubled next to ongoing excavation.
    pub(super) fn pick_gold_target(&self) -> Option<TargetChoice> {
        let gold = &self.cfg.gold;
        let mut best: Option<TargetChoice> = None;
        for at in self.world.interior_coords() {
            if self.state.ledger.is_marked(at) || self.is_dangerous(at) {
                continue;
            }
            let distance = self.world.dig_distance(at, self.agent);
            if distance < 0 {
                continue;
            }
            let base = match self.world.slab_kind(at) {
                SlabKind::Gold => gold.ore_score,
                SlabKind::Gems => gold.gem_score,
                _ => continue,
            };
            let mut score = base / (gold.distance_bias + i64::from(distance)).max(1);
            if self.mining_nearby(at) {
                score *= gold.busy_multiplier;
            }
            if Some(score) > best.map(|choice| choice.score) {
                best = Some(TargetChoice { at, score });
            }
        }
        best
    }

    fn mining_nearby(&self, at: TileCoord) -> bool {
        let r = self.cfg.gold.busy_window;
        (at.y - r..=at.y + r)
            .any(|y| (at.x - r..=at.x + r).any(|x| self.is_marked_and_undug(TileCoord::new(x, y))))
    }

    /// One dig per few diggers, one fewer while a room is being built.
    pub(super) fn max_gold_digs(&self) -> usize {
        let gold = &self.cfg.gold;
        let building = i32::from(self.state.expand_room.is_some());
        let limit = (1 + self.world.workforce(self.agent) / gold.units_per_dig.max(1) - building).max(1);
        usize::try_from(limit).map_or(1, |limit| limit.min(gold.max_concurrent_digs))
    }

    /// A treasure room search around `target`, when no room is under way,
    /// none of ours is in range, and there is enough to store.
    pub(super) fn treasure_search(&self, target: TileCoord) -> Option<RoomSearch> {
        if self.state.expand_room.is_some() {
            return None;
        }
        let gold = &self.cfg.gold;
        let r = gold.treasure_search_radius;
        let (mut ore, mut gems) = (0, 0);
        for y in target.y - r..=target.y + r {
            for x in target.x - r..=target.x + r {
                let at = TileCoord::new(x, y);
                if at.manhattan(target) > r || self.is_dangerous(at) {
                    continue;
                }
                match self.world.slab_kind(at) {
                    SlabKind::Gold => ore += 1,
                    SlabKind::Gems => gems += 1,
                    SlabKind::Room(RoomKind::Treasure) if self.is_own(at) => return None,
                    _ => {}
                }
            }
        }
        if gems == 0 && ore < gold.treasure_min_ore {
            return None;
        }
        let preferred = (ore / 2 + gold.treasure_gem_weight * gems).clamp(gold.treasure_min_size, gold.treasure_max_size);
        Some(RoomSearch::new(RoomKind::Treasure, preferred))
    }

    /// Gem faces never run out, so they stay worked while reachable.
    fn gold_dig_status(&self, target: TileCoord) -> Option<TaskOutcome> {
        let reachable = self.world.dig_distance(target, self.agent) >= 0;
        match self.world.slab_kind(target) {
            SlabKind::Gems | SlabKind::Gold if reachable => None,
            SlabKind::Gems | SlabKind::Gold => Some(TaskOutcome::Aborted),
            _ => Some(TaskOutcome::Completed),
        }
    }
}

impl<W: World> AgentCtx<'_, W> {
    pub(super) fn process_gold_digs(&mut self) {
        let digs = mem::take(&mut self.state.gold_digs);
        for dig in digs {
            match self.view().gold_dig_status(dig.target) {
                None => self.state.gold_digs.push(dig),
                Some(outcome) => {
                    tracing::info!(
                        target: LOG_TARGET,
                        agent = %self.agent,
                        x = dig.target.x,
                        y = dig.target.y,
                        ?outcome,
                        "gold dig finished"
                    );
                    self.record(TaskKind::GoldDig, outcome, dig.target);
                }
            }
        }
    }

    pub(super) fn check_gold_dig(&mut self) {
        if let Some(target) = self.view().pick_gold_target() {
            self.start_gold_dig(target.at);
        }
    }

    fn start_gold_dig(&mut self, target: TileCoord) {
        let mut search = self.view().treasure_search(target);
        match self.dig_gold_path(target, search.as_mut()) {
            Ok(access) => {
                if let Some(candidate) = search.and_then(RoomSearch::into_viable) {
                    self.start_room(candidate);
                }
                tracing::info!(target: LOG_TARGET, agent = %self.agent, x = target.x, y = target.y, "gold dig started");
                self.state.gold_digs.push(GoldDig { target, access });
                self.record(TaskKind::GoldDig, TaskOutcome::Started, target);
            }
            Err(err) => {
                tracing::info!(
                    target: LOG_TARGET,
                    agent = %self.agent,
                    x = target.x,
                    y = target.y,
                    error = %err,
                    "gold dig abandoned"
                );
                self.record(TaskKind::GoldDig, TaskOutcome::Aborted, target);
            }
        }
    }

    /// Digs from `target` back to territory and returns where the tunnel met it.
    ///
    /// With a treasure search running, the first tiles of the walk seed room
    /// candidates before they are dug. Once territory is reached the walk goes
    /// on towards the stronghold, without digging, while seed steps remain.
    fn dig_gold_path(&mut self, target: TileCoord, mut search: Option<&mut RoomSearch>) -> Result<TileCoord, PlanError> {
        let track = self.cfg.gold.treasure_track_steps;
        let mut steps = 0;
        let mut homeward = false;
        let mut access = target;
        let mut at = target;
        loop {
            match search.as_deref_mut() {
                Some(search) if steps < track => {
                    steps += 1;
                    self.view().offer_seeds_around(search, at);
                }
                _ if homeward => break,
                _ => {}
            }
            if !homeward {
                if self.view().is_dangerous(at) {
                    return Err(PlanError::Dangerous(at));
                }
                self.dig_if_needed(at)?;
            }

            if !homeward {
                let distance = self.view().distance(at, DistanceField::Dig);
                if distance < 0 {
                    return Err(PlanError::Unreachable(at));
                }
                if distance == 0 {
                    access = at;
                    if search.is_none() {
                        break;
                    }
                    homeward = true;
                }
            }
            let field = if homeward { DistanceField::Stronghold } else { DistanceField::Dig };
            match self.view().closer_step(at, field) {
                Some(next) => at = next,
                None if homeward => break,
                None => return Err(PlanError::NoPath(at)),
            }
        }
        Ok(access)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::sim::SimWorld;
    use crate::state::{RoomExpansion, RoomExpansionPos};

    fn view_of<'a>(cfg: &'a PlannerConfig, state: &'a AgentDiggingState, world: &'a SimWorld) -> AgentView<'a, SimWorld> {
        AgentView { cfg, agent: AGENT, state, world }
    }

    #[test]
    fn nearest_seam_wins_and_gems_outrank_ore() {
        let mut world = gold_corridor_world();
        let cfg = PlannerConfig::default();
        let state = AgentDiggingState::new(AGENT, 9, 7);
        // 100000 / (5 + 3)
        assert_eq!(
            view_of(&cfg, &state, &world).pick_gold_target(),
            Some(TargetChoice { at: TileCoord::new(6, 3), score: 12_500 })
        );

        world.set_slab(TileCoord::new(4, 2), SlabKind::Gems, PlayerId::NEUTRAL);
        world.refresh();
        // 150000 / (5 + 1)
        assert_eq!(
            view_of(&cfg, &state, &world).pick_gold_target(),
            Some(TargetChoice { at: TileCoord::new(4, 2), score: 25_000 })
        );
    }

    #[test]
    fn marked_dangerous_and_unreachable_minerals_are_skipped() {
        let mut world = gold_corridor_world();
        world.set_slab(TileCoord::new(7, 1), SlabKind::Gold, PlayerId::NEUTRAL);
        world.refresh();
        let cfg = PlannerConfig::default();
        let mut state = AgentDiggingState::new(AGENT, 9, 7);
        state.ledger.mark(TileCoord::new(6, 3));
        assert_eq!(view_of(&cfg, &state, &world).pick_gold_target(), None);

        let mut state = AgentDiggingState::new(AGENT, 9, 7);
        state.danger.flag_around(TileCoord::new(7, 3));
        assert_eq!(view_of(&cfg, &state, &world).pick_gold_target(), None);
    }

    #[test]
    fn ongoing_excavation_nearby_doubles_the_score() {
        let world = gold_corridor_world();
        let cfg = PlannerConfig::default();
        let mut state = AgentDiggingState::new(AGENT, 9, 7);
        state.ledger.mark(TileCoord::new(5, 3));
        let pick = view_of(&cfg, &state, &world).pick_gold_target().unwrap();
        assert_eq!(pick, TargetChoice { at: TileCoord::new(6, 3), score: 25_000 });
    }

    #[test]
    fn concurrency_follows_the_workforce() {
        let mut world = gold_corridor_world();
        let cfg = PlannerConfig::default();
        let mut state = AgentDiggingState::new(AGENT, 9, 7);
        assert_eq!(view_of(&cfg, &state, &world).max_gold_digs(), 1);

        for _ in 0..10 {
            world.add_unit(AGENT, UnitRole::Digger, TileCoord::new(2, 2), 5);
        }
        assert_eq!(view_of(&cfg, &state, &world).max_gold_digs(), 3);

        state.expand_room = Some(RoomExpansion {
            kind: RoomKind::Lair,
            preferred_tiles: 9,
            pos: RoomExpansionPos::around(TileCoord::new(2, 3)),
            score: 0,
            drop_attempts: 0,
        });
        assert_eq!(view_of(&cfg, &state, &world).max_gold_digs(), 2);
    }

    #[test]
    fn starting_a_dig_tunnels_back_to_territory() {
        let mut world = gold_corridor_world();
        let cfg = PlannerConfig::default();
        let mut state = AgentDiggingState::new(AGENT, 9, 7);
        let mut ctx = AgentCtx::new(&cfg, &mut state, &mut world);
        ctx.check_gold_dig();
        assert_eq!(
            ctx.events,
            vec![PlanEvent { task: TaskKind::GoldDig, outcome: TaskOutcome::Started, at: TileCoord::new(6, 3) }]
        );
        assert_eq!(state.gold_digs, vec![GoldDig { target: TileCoord::new(6, 3), access: TileCoord::new(3, 3) }]);
        assert_eq!(
            world.excavations(AGENT),
            vec![TileCoord::new(6, 3), TileCoord::new(5, 3), TileCoord::new(4, 3)]
        );
        assert!(state.expand_room.is_none());
    }

    #[test]
    fn dug_out_ore_completes_and_lost_access_aborts() {
        let mut world = gold_corridor_world();
        let cfg = PlannerConfig::default();
        let mut state = AgentDiggingState::new(AGENT, 9, 7);
        AgentCtx::new(&cfg, &mut state, &mut world).check_gold_dig();
        world.resolve_orders();

        let mut ctx = AgentCtx::new(&cfg, &mut state, &mut world);
        ctx.process_gold_digs();
        assert_eq!(ctx.events[0].outcome, TaskOutcome::Completed);
        assert!(state.gold_digs.is_empty());

        let mut world = gold_corridor_world();
        world.set_slab(TileCoord::new(6, 3), SlabKind::Gems, PlayerId::NEUTRAL);
        world.refresh();
        let mut state = AgentDiggingState::new(AGENT, 9, 7);
        state.gold_digs.push(GoldDig { target: TileCoord::new(6, 3), access: TileCoord::new(3, 3) });
        AgentCtx::new(&cfg, &mut state, &mut world).process_gold_digs();
        assert_eq!(state.gold_digs.len(), 1);

        world.set_slab(TileCoord::new(5, 3), SlabKind::Rock, PlayerId::NEUTRAL);
        world.refresh();
        let mut ctx = AgentCtx::new(&cfg, &mut state, &mut world);
        ctx.process_gold_digs();
        assert_eq!(ctx.events[0].outcome, TaskOutcome::Aborted);
        assert!(state.gold_digs.is_empty());
    }

    #[test]
    fn treasure_search_needs_enough_minerals_and_no_nearby_vault() {
        let mut world = gold_corridor_world();
        let cfg = PlannerConfig::default();
        let state = AgentDiggingState::new(AGENT, 9, 7);
        assert!(view_of(&cfg, &state, &world).treasure_search(TileCoord::new(6, 3)).is_none());

        world.set_slab(TileCoord::new(7, 3), SlabKind::Gems, PlayerId::NEUTRAL);
        let search = view_of(&cfg, &state, &world).treasure_search(TileCoord::new(6, 3)).unwrap();
        assert_eq!(search.preferred_tiles, 12);

        world.set_slab(TileCoord::new(2, 2), SlabKind::Room(RoomKind::Treasure), AGENT);
        assert!(view_of(&cfg, &state, &world).treasure_search(TileCoord::new(6, 3)).is_none());
    }

    #[test]
    fn blocked_tunnels_abort_without_a_task() {
        let mut world = gold_corridor_world();
        world.fail_excavations_after(1);
        let cfg = PlannerConfig::default();
        let mut state = AgentDiggingState::new(AGENT, 9, 7);
        let mut ctx = AgentCtx::new(&cfg, &mut state, &mut world);
        ctx.check_gold_dig();
        assert_eq!(ctx.events[0].outcome, TaskOutcome::Aborted);
        assert!(state.gold_digs.is_empty());
        assert!(state.ledger.is_marked(TileCoord::new(6, 3)));
    }
}
