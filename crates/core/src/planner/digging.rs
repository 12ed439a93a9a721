//! Tile predicates shared by every selector and the single entry point for excavation orders.
//! This module exists so the dig ledger is consulted and updated in exactly one place.
//! It does not own path choice; callers decide which tiles to dig.

use super::*;

impl<W: World> AgentView<'_, W> {
    /// Gem faces are never dangerous to work.
    pub(super) fn is_dangerous(&self, at: TileCoord) -> bool {
        self.state.danger.is_flagged(at) && self.world.slab_kind(at) != SlabKind::Gems
    }

    pub(super) fn is_own(&self, at: TileCoord) -> bool {
        self.world.slab_owner(at) == self.agent
    }

    pub(super) fn is_diggable_or_buildable(&self, at: TileCoord) -> bool {
        match self.world.slab_kind(at) {
            SlabKind::Path | SlabKind::TorchDirt | SlabKind::Earth | SlabKind::Gold => true,
            SlabKind::Wall | SlabKind::Claimed => self.is_own(at),
            _ => false,
        }
    }

    /// Tiles a corridor may run through.
    pub(super) fn is_accessible(&self, at: TileCoord) -> bool {
        match self.world.slab_kind(at) {
            kind if kind.is_liquid() => false,
            SlabKind::Wall => self.is_own(at),
            SlabKind::Path | SlabKind::TorchDirt | SlabKind::Earth | SlabKind::Gold => true,
            kind => kind.is_open_floor(),
        }
    }

    /// Own claimed floor, or path anyone may claim.
    pub(super) fn is_floor_for(&self, at: TileCoord) -> bool {
        match self.world.slab_kind(at) {
            SlabKind::Claimed => self.is_own(at),
            SlabKind::Path => true,
            _ => false,
        }
    }

    /// Already ordered but the order has not been carried out yet.
    pub(super) fn is_marked_and_undug(&self, at: TileCoord) -> bool {
        self.state.ledger.is_marked(at) && self.world.slab_kind(at).is_undug()
    }

    pub(super) fn bridges_available(&self) -> bool {
        self.world.is_room_available(self.agent, RoomKind::Bridge)
    }
}

impl<W: World> AgentCtx<'_, W> {
    /// Issues whatever order `at` still needs and marks it in the ledger.
    ///
    /// Returns whether a new order went out. Liquid is queued for a bridge
    /// instead of excavated. Tiles that need nothing are left alone.
    pub(super) fn dig_if_needed(&mut self, at: TileCoord) -> Result<bool, PlanError> {
        if self.state.ledger.is_marked(at) {
            return Ok(false);
        }
        let kind = self.world.slab_kind(at);
        if kind.is_liquid() {
            return self.bridge_later(at);
        }
        if !kind.is_excavatable() {
            return Ok(false);
        }
        self.world.request_excavate(self.agent, at)?;
        self.state.ledger.mark(at);
        Ok(true)
    }

    fn bridge_later(&mut self, at: TileCoord) -> Result<bool, PlanError> {
        if !self.view().bridges_available() {
            return Err(PlanError::NoBridge(at));
        }
        self.state.ledger.mark(at);
        self.state.bridges.push(at);
        tracing::debug!(target: LOG_TARGET, agent = %self.agent, at = %at, "queued bridge");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::sim::SimWorld;

    #[test]
    fn ownership_decides_whether_walls_and_floor_are_workable() {
        let mut world = SimWorld::new(6, 3);
        world.set_slab(TileCoord::new(1, 1), SlabKind::Wall, AGENT);
        world.set_slab(TileCoord::new(2, 1), SlabKind::Wall, RIVAL);
        world.set_slab(TileCoord::new(3, 1), SlabKind::Claimed, RIVAL);
        world.set_slab(TileCoord::new(4, 1), SlabKind::Path, PlayerId::NEUTRAL);
        let state = AgentDiggingState::new(AGENT, 6, 3);
        let cfg = PlannerConfig::default();
        let view = AgentView { cfg: &cfg, agent: AGENT, state: &state, world: &world };

        assert!(view.is_diggable_or_buildable(TileCoord::new(1, 1)));
        assert!(!view.is_diggable_or_buildable(TileCoord::new(2, 1)));
        assert!(!view.is_diggable_or_buildable(TileCoord::new(3, 1)));
        assert!(view.is_accessible(TileCoord::new(3, 1)));
        assert!(!view.is_floor_for(TileCoord::new(3, 1)));
        assert!(view.is_floor_for(TileCoord::new(4, 1)));
        assert!(!view.is_diggable_or_buildable(TileCoord::new(0, 0)));
    }

    #[test]
    fn gems_ignore_danger_flags() {
        let mut world = SimWorld::new(5, 5);
        world.set_slab(TileCoord::new(2, 2), SlabKind::Gems, PlayerId::NEUTRAL);
        world.set_slab(TileCoord::new(2, 1), SlabKind::Earth, PlayerId::NEUTRAL);
        let mut state = AgentDiggingState::new(AGENT, 5, 5);
        state.danger.flag_around(TileCoord::new(2, 2));
        let cfg = PlannerConfig::default();
        let view = AgentView { cfg: &cfg, agent: AGENT, state: &state, world: &world };
        assert!(!view.is_dangerous(TileCoord::new(2, 2)));
        assert!(view.is_dangerous(TileCoord::new(2, 1)));
    }

    #[test]
    fn marked_tiles_never_get_a_second_order() {
        let mut world = open_pocket_world();
        world.set_slab(TileCoord::new(1, 4), SlabKind::Earth, PlayerId::NEUTRAL);
        let cfg = PlannerConfig::default();
        let mut state = AgentDiggingState::new(AGENT, 9, 9);
        let mut ctx = AgentCtx::new(&cfg, &mut state, &mut world);

        assert_eq!(ctx.dig_if_needed(TileCoord::new(1, 4)), Ok(true));
        assert_eq!(ctx.dig_if_needed(TileCoord::new(1, 4)), Ok(false));
        assert_eq!(ctx.dig_if_needed(TileCoord::new(3, 3)), Ok(false));
        assert_eq!(world.excavations(AGENT), vec![TileCoord::new(1, 4)]);
    }

    #[test]
    fn liquid_is_queued_for_a_bridge_only_when_bridges_exist() {
        let mut world = open_pocket_world();
        let lava = TileCoord::new(1, 3);
        let cfg = PlannerConfig::default();
        let mut state = AgentDiggingState::new(AGENT, 9, 9);

        let mut ctx = AgentCtx::new(&cfg, &mut state, &mut world);
        assert_eq!(ctx.dig_if_needed(lava), Err(PlanError::NoBridge(lava)));
        assert!(!ctx.state.ledger.is_marked(lava));

        world.player_mut(AGENT).unwrap().available_rooms.insert(RoomKind::Bridge);
        let mut ctx = AgentCtx::new(&cfg, &mut state, &mut world);
        assert_eq!(ctx.dig_if_needed(lava), Ok(true));
        assert_eq!(state.bridges, vec![lava]);
        assert!(state.ledger.is_marked(lava));
        assert!(world.excavations(AGENT).is_empty());
    }

    #[test]
    fn declined_orders_leave_the_ledger_untouched() {
        let mut world = open_pocket_world();
        world.set_slab(TileCoord::new(1, 4), SlabKind::Earth, PlayerId::NEUTRAL);
        world.fail_excavations_after(0);
        let cfg = PlannerConfig::default();
        let mut state = AgentDiggingState::new(AGENT, 9, 9);
        let mut ctx = AgentCtx::new(&cfg, &mut state, &mut world);
        assert!(matches!(ctx.dig_if_needed(TileCoord::new(1, 4)), Err(PlanError::Command(_))));
        assert!(!state.ledger.is_marked(TileCoord::new(1, 4)));
    }
}
