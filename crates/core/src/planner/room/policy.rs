//! Which room to build next and how big it should be.

use super::*;

impl<W: World> AgentView<'_, W> {
    /// First kind in priority order that is affordable and either missing or
    /// running out of space. Gardens also wait out their regrowth time.
    pub(in crate::planner) fn decide_room_to_expand(&self) -> Option<RoomKind> {
        let expansion = &self.cfg.expansion;
        for &kind in &expansion.build_priority {
            if matches!(kind, RoomKind::Bridge | RoomKind::GuardPost) {
                continue;
            }
            if !self.world.room_buildable_now(self.agent, kind) {
                continue;
            }
            if self.world.room_tile_count(self.agent, kind) == 0 {
                return Some(kind);
            }
            let capacity = self.world.room_capacity(self.agent, kind);
            if kind == RoomKind::Garden {
                let turn = self.world.game_turn();
                let regrowing = self
                    .state
                    .last_garden_turn
                    .is_some_and(|built| turn.saturating_sub(built) < expansion.garden_regrowth_turns);
                if regrowing || expansion.garden_busy_divisor * capacity.used > capacity.total {
                    continue;
                }
            } else if capacity.free() > capacity.total * expansion.free_capacity_percent / 100 + 1 {
                continue;
            }
            return Some(kind);
        }
        None
    }

    pub(in crate::planner) fn preferred_tiles(&self, kind: RoomKind) -> i32 {
        let sizes = &self.cfg.expansion.sizes;
        let existing = self.world.room_tile_count(self.agent, kind);
        match kind {
            RoomKind::Temple | RoomKind::Scavenger => {
                (6 + existing / 2).clamp(sizes.worship_min, sizes.worship_max)
            }
            RoomKind::Torture | RoomKind::Prison | RoomKind::Graveyard => {
                (5 + existing / 2).clamp(sizes.holding_min, sizes.holding_max)
            }
            RoomKind::Treasure | RoomKind::Training | RoomKind::Library | RoomKind::Garden => sizes.spacious,
            RoomKind::Workshop => sizes.workshop,
            RoomKind::Bridge | RoomKind::GuardPost => 1,
            RoomKind::Lair => self.lair_size(existing),
            RoomKind::Entrance | RoomKind::Barracks => sizes.fallback,
        }
    }

    /// Lairs grow with the population: room for everyone expected, or a bit
    /// over half again once attraction is maxed out.
    fn lair_size(&self, existing: i32) -> i32 {
        let minimum = self.cfg.expansion.sizes.lair_min;
        let counts = self.world.creature_counts(self.agent);
        let fresh = minimum.max(4 * counts.max_attracted.max(counts.active) / 3);
        if existing == 0 {
            return fresh;
        }
        let tiles_per_creature = 1000 * counts.active / existing;
        if tiles_per_creature == 0 {
            return fresh;
        }
        let wanted = if counts.active < counts.max_attracted {
            counts.max_attracted + 2 - counts.active
        } else {
            3 * counts.active / 5 + 1
        };
        minimum.max(1000 * wanted / tiles_per_creature)
    }
}

#[cfg(test)]
mod tests {
    use super::super::super::test_support::*;
    use super::*;
    use crate::sim::SimWorld;

    fn decide(world: &SimWorld, state: &AgentDiggingState) -> Option<RoomKind> {
        let cfg = PlannerConfig::default();
        AgentView { cfg: &cfg, agent: AGENT, state, world }.decide_room_to_expand()
    }

    fn sized(world: &SimWorld, kind: RoomKind) -> i32 {
        let cfg = PlannerConfig::default();
        let state = AgentDiggingState::new(AGENT, 9, 9);
        AgentView { cfg: &cfg, agent: AGENT, state: &state, world }.preferred_tiles(kind)
    }

    #[test]
    fn missing_rooms_come_first_in_priority_order() {
        let mut world = open_pocket_world();
        let record = world.player_mut(AGENT).unwrap();
        record.available_rooms.extend([RoomKind::Lair, RoomKind::Library, RoomKind::Bridge]);
        let state = AgentDiggingState::new(AGENT, 9, 9);
        assert_eq!(decide(&world, &state), Some(RoomKind::Treasure));

        world.player_mut(AGENT).unwrap().available_rooms.remove(&RoomKind::Treasure);
        assert_eq!(decide(&world, &state), Some(RoomKind::Lair));
    }

    #[test]
    fn roomy_rooms_are_not_extended_and_unaffordable_ones_are_skipped() {
        let mut world = open_pocket_world();
        world.fill_rect(TileCoord::new(2, 2), TileCoord::new(4, 4), SlabKind::Room(RoomKind::Treasure), AGENT);
        world.refresh();
        let state = AgentDiggingState::new(AGENT, 9, 9);
        // 90 capacity, none used.
        assert_eq!(decide(&world, &state), None);

        world.player_mut(AGENT).unwrap().room_usage.insert(RoomKind::Treasure, 85);
        assert_eq!(decide(&world, &state), Some(RoomKind::Treasure));

        world.player_mut(AGENT).unwrap().money = 10;
        assert_eq!(decide(&world, &state), None);
    }

    #[test]
    fn gardens_wait_for_regrowth() {
        let mut world = open_pocket_world();
        world.player_mut(AGENT).unwrap().available_rooms = [RoomKind::Garden].into();
        world.set_room_cost(RoomKind::Garden, 100);
        world.fill_rect(TileCoord::new(2, 2), TileCoord::new(3, 3), SlabKind::Room(RoomKind::Garden), AGENT);
        world.refresh();
        world.advance_turns(1000);
        let mut state = AgentDiggingState::new(AGENT, 9, 9);
        assert_eq!(decide(&world, &state), Some(RoomKind::Garden));

        state.last_garden_turn = Some(600);
        assert_eq!(decide(&world, &state), None);
        state.last_garden_turn = Some(100);
        assert_eq!(decide(&world, &state), Some(RoomKind::Garden));

        // 40 capacity; more than a quarter in use means the garden is busy enough.
        world.player_mut(AGENT).unwrap().room_usage.insert(RoomKind::Garden, 11);
        assert_eq!(decide(&world, &state), None);
    }

    #[test]
    fn preferred_sizes_follow_existing_rooms_and_population() {
        let mut world = open_pocket_world();
        assert_eq!(sized(&world, RoomKind::Treasure), 25);
        assert_eq!(sized(&world, RoomKind::Workshop), 30);
        assert_eq!(sized(&world, RoomKind::Temple), 9);
        assert_eq!(sized(&world, RoomKind::Prison), 15);
        assert_eq!(sized(&world, RoomKind::Bridge), 1);
        assert_eq!(sized(&world, RoomKind::Lair), 12);

        world.player_mut(AGENT).unwrap().creatures = CreatureCounts { active: 12, max_attracted: 15 };
        assert_eq!(sized(&world, RoomKind::Lair), 20);

        // 12 creatures in 9 tiles: 1333 per mille, 5 more expected.
        world.fill_rect(TileCoord::new(2, 2), TileCoord::new(4, 4), SlabKind::Room(RoomKind::Lair), AGENT);
        world.refresh();
        assert_eq!(sized(&world, RoomKind::Lair), 12);
        world.player_mut(AGENT).unwrap().creatures = CreatureCounts { active: 4, max_attracted: 30 };
        // 444 per mille, 28 more expected.
        assert_eq!(sized(&world, RoomKind::Lair), 63);
    }
}
