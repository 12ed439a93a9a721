//! Door assaults: where to put a fighter down to break through a hostile door or heart.
//! This module exists to pick one assault per call while we hold the upper hand.
//! It does not own combat; the dropped fighter finds its own way in.

use super::claims::DROP_NEIGHBOURS;
use super::hash::jitter;
use super::*;

impl<W: World> AgentView<'_, W> {
    pub(super) fn pick_door_target(&self, salt: u64) -> Option<DoorChoice> {
        let mut best: Option<DoorChoice> = None;
        for at in self.world.interior_coords() {
            if !self.world.can_drop_at(self.agent, at)
                || self.world.slab_kind(at) == SlabKind::Room(RoomKind::Prison)
                || self.is_dangerous(at)
                || self.has_own_fighter(at)
            {
                continue;
            }
            let mut trapped = false;
            let mut score = 0;
            let mut disqualified = false;
            for (dx, dy) in DROP_NEIGHBOURS {
                let target = at.offset(dx, dy);
                let beyond = at.offset(2 * dx, 2 * dy);
                match self.door_neighbour_value(target, beyond, salt, &mut trapped) {
                    Some(value) => score = score.max(value),
                    None => {
                        disqualified = true;
                        break;
                    }
                }
            }
            if !disqualified && score > best.map_or(0, |choice| choice.score) {
                best = Some(DoorChoice { at, score, trapped });
            }
        }
        best
    }

    /// Heroes only while every enemy keeper is beatable, so level designers'
    /// blocking doors stay shut early on.
    fn attacks_doors_of(&self, owner: PlayerId) -> bool {
        match owner {
            PlayerId::HEROES => PlayerId::keepers()
                .filter(|keeper| *keeper != self.agent && self.world.are_enemies(self.agent, *keeper))
                .all(|keeper| self.outmatches(keeper)),
            PlayerId::NEUTRAL => true,
            keeper => self.world.are_enemies(self.agent, keeper) && self.outmatches(keeper),
        }
    }

    fn has_own_fighter(&self, at: TileCoord) -> bool {
        self.world
            .units_at(at)
            .iter()
            .any(|unit| unit.owner == self.agent && !unit.unconscious && unit.role != UnitRole::Digger)
    }

    /// `None` disqualifies the standing tile. Softer doors score higher.
    fn door_neighbour_value(&self, at: TileCoord, beyond: TileCoord, salt: u64, trapped: &mut bool) -> Option<i64> {
        let assault = &self.cfg.assault;
        let kind = self.world.slab_kind(at);
        let base = match kind {
            SlabKind::DungeonHeart => i32::MAX,
            SlabKind::Door(DoorTier::Wood) => assault.wood_door,
            SlabKind::Door(DoorTier::Braced) => assault.braced_door,
            SlabKind::Door(DoorTier::Iron) => assault.iron_door,
            SlabKind::Door(DoorTier::Magic) => assault.magic_door,
            _ => return Some(0),
        };
        let owner = self.world.slab_owner(at);
        if owner == self.agent || !self.attacks_doors_of(owner) {
            return Some(0);
        }
        if kind == SlabKind::DungeonHeart {
            // Hero hearts are scripted set pieces.
            return owner
                .is_keeper()
                .then(|| i64::from(base) - assault.heart_strength_weight * self.world.strength(owner));
        }
        if self.has_own_fighter(at) {
            return None;
        }
        let home = self.world.stronghold(owner).map_or(0, |heart| heart.manhattan(at));
        let mut value = i64::from(base - home);
        if self.world.has_trap_hostile_to(beyond, self.agent) {
            value /= i64::from(assault.trapped_divisor.max(1));
            *trapped = true;
        }
        if owner == PlayerId::HEROES {
            value /= i64::from(assault.hero_door_divisor.max(1));
        }
        Some(value + jitter(salt, at, assault.jitter_range))
    }
}

impl<W: World> AgentCtx<'_, W> {
    /// Sends the strongest fighter, or the weakest when traps wait behind the door.
    pub(super) fn drop_for_door_assault(&mut self, salt: u64) -> Result<Option<TileCoord>, PlanError> {
        let Some(strongest) = self.world.assault_fighter(self.agent, true) else { return Ok(None) };
        let Some(target) = self.view().pick_door_target(salt) else { return Ok(None) };
        let fighter = if target.trapped {
            self.world.assault_fighter(self.agent, false).unwrap_or(strongest)
        } else {
            strongest
        };
        self.world.request_drop_unit(self.agent, fighter, target.at, DropGoal::AssaultDoor)?;
        tracing::info!(
            target: LOG_TARGET,
            agent = %self.agent,
            x = target.at.x,
            y = target.at.y,
            score = target.score,
            trapped = target.trapped,
            "dropped fighter to assault door"
        );
        self.record(TaskKind::DoorAssault, TaskOutcome::Started, target.at);
        Ok(Some(target.at))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::sim::{SimCommand, SimPlayer, SimWorld};

    /// Our floor at x 2..=4, a door at (5, 3) owned by `owner`, rival floor beyond.
    fn door_world(owner: PlayerId, tier: DoorTier) -> SimWorld {
        let mut world = SimWorld::new(10, 7);
        world.fill_rect(TileCoord::new(2, 1), TileCoord::new(4, 5), SlabKind::Claimed, AGENT);
        world.set_slab(TileCoord::new(5, 3), SlabKind::Door(tier), owner);
        world.fill_rect(TileCoord::new(6, 1), TileCoord::new(8, 5), SlabKind::Claimed, RIVAL);
        world.add_player(AGENT, SimPlayer { stronghold: Some(TileCoord::new(3, 3)), ..agent_record() });
        world.add_player(RIVAL, SimPlayer { strength: 10, stronghold: Some(TileCoord::new(7, 3)), ..SimPlayer::default() });
        world.refresh();
        world
    }

    fn pick(world: &SimWorld) -> Option<DoorChoice> {
        let mut cfg = PlannerConfig::default();
        cfg.assault.jitter_range = 0;
        let state = AgentDiggingState::new(AGENT, 10, 7);
        AgentView { cfg: &cfg, agent: AGENT, state: &state, world }.pick_door_target(5)
    }

    #[test]
    fn softer_doors_score_higher_less_the_walk_to_their_heart() {
        let wood = pick(&door_world(RIVAL, DoorTier::Wood));
        assert_eq!(wood, Some(DoorChoice { at: TileCoord::new(4, 3), score: 398, trapped: false }));
        let magic = pick(&door_world(RIVAL, DoorTier::Magic));
        assert_eq!(magic.map(|choice| choice.score), Some(98));
    }

    #[test]
    fn traps_behind_the_door_halve_the_score() {
        let mut world = door_world(RIVAL, DoorTier::Wood);
        world.place_trap(TileCoord::new(6, 3), RIVAL);
        assert_eq!(pick(&world), Some(DoorChoice { at: TileCoord::new(4, 3), score: 199, trapped: true }));
    }

    #[test]
    fn stronger_rivals_are_left_alone() {
        let mut world = door_world(RIVAL, DoorTier::Wood);
        world.player_mut(RIVAL).unwrap().strength = 500;
        assert_eq!(pick(&world), None);
    }

    #[test]
    fn enemy_hearts_outrank_doors() {
        let mut world = door_world(RIVAL, DoorTier::Wood);
        world.set_slab(TileCoord::new(5, 3), SlabKind::DungeonHeart, RIVAL);
        world.refresh();
        let choice = pick(&world).unwrap();
        assert_eq!(choice.at, TileCoord::new(4, 3));
        assert_eq!(choice.score, i64::from(i32::MAX) - 100 * 10);
    }

    #[test]
    fn hero_doors_wait_until_every_enemy_keeper_is_beatable() {
        let mut world = door_world(PlayerId::HEROES, DoorTier::Wood);
        assert_eq!(pick(&world).map(|choice| choice.score), Some(133));
        world.player_mut(RIVAL).unwrap().strength = 500;
        assert_eq!(pick(&world), None);
    }

    #[test]
    fn hero_hearts_disqualify_the_standing_tile() {
        let mut world = door_world(PlayerId::HEROES, DoorTier::Wood);
        world.set_slab(TileCoord::new(5, 3), SlabKind::DungeonHeart, PlayerId::HEROES);
        world.refresh();
        assert_eq!(pick(&world), None);
    }

    #[test]
    fn trapped_doors_get_the_weakest_fighter() {
        let mut world = door_world(RIVAL, DoorTier::Wood);
        world.place_trap(TileCoord::new(6, 3), RIVAL);
        let _strong = world.add_unit(AGENT, UnitRole::Fighter, TileCoord::new(2, 1), 50);
        let weak = world.add_unit(AGENT, UnitRole::Fighter, TileCoord::new(2, 1), 5);
        let cfg = PlannerConfig::default();
        let mut state = AgentDiggingState::new(AGENT, 10, 7);
        let mut ctx = AgentCtx::new(&cfg, &mut state, &mut world);
        assert_eq!(ctx.drop_for_door_assault(9), Ok(Some(TileCoord::new(4, 3))));
        assert_eq!(
            world.commands().last(),
            Some(&SimCommand::DropUnit {
                player: AGENT,
                unit: weak,
                at: TileCoord::new(4, 3),
                goal: DropGoal::AssaultDoor,
            })
        );
    }

    #[test]
    fn no_fighters_means_no_assault() {
        let mut world = door_world(RIVAL, DoorTier::Wood);
        let cfg = PlannerConfig::default();
        let mut state = AgentDiggingState::new(AGENT, 10, 7);
        let mut ctx = AgentCtx::new(&cfg, &mut state, &mut world);
        assert_eq!(ctx.drop_for_door_assault(9), Ok(None));
        assert!(world.commands().is_empty());
    }
}
