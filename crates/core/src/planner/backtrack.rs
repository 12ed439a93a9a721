//! Walks a distance field downhill from a target back to owned territory.
//! This module exists so gold, breach and room tunnels all dig along the same kind of path.
//! It does not own target selection.

use super::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum DistanceField {
    Dig,
    Stronghold,
}

impl<W: World> AgentView<'_, W> {
    pub(super) fn distance(&self, at: TileCoord, field: DistanceField) -> i32 {
        match field {
            DistanceField::Dig => self.world.dig_distance(at, self.agent),
            DistanceField::Stronghold => self.world.stronghold_distance(at, self.agent),
        }
    }

    /// The neighbour with the smallest non-negative distance strictly below
    /// this tile's. Ties go to the first in west, east, north, south order.
    pub(super) fn closer_step(&self, at: TileCoord, field: DistanceField) -> Option<TileCoord> {
        let mut best = self.distance(at, field);
        let mut step = None;
        for n in at.neighbors4() {
            let d = self.distance(n, field);
            if d >= 0 && d < best {
                best = d;
                step = Some(n);
            }
        }
        step
    }

    /// Rejects a path tile. The tile at distance zero only has to be safe.
    fn check_path_tile(&self, at: TileCoord, distance: i32) -> Result<(), PlanError> {
        if self.is_dangerous(at) {
            return Err(PlanError::Dangerous(at));
        }
        if distance != 0 && !self.is_diggable_or_buildable(at) {
            return Err(PlanError::Undiggable(at));
        }
        Ok(())
    }

    fn next_on_path(&self, at: TileCoord, distance: i32) -> Result<Option<TileCoord>, PlanError> {
        match distance {
            0 => Ok(None),
            d if d < 0 => Err(PlanError::Unreachable(at)),
            _ => self.closer_step(at, DistanceField::Dig).map(Some).ok_or(PlanError::NoPath(at)),
        }
    }

    /// Same walk as `AgentCtx::backtrack` without issuing any order.
    pub(super) fn backtrack_feasible(&self, start: TileCoord, check_start: bool) -> Result<Vec<TileCoord>, PlanError> {
        let mut path = Vec::new();
        let mut at = start;
        let mut check = check_start;
        loop {
            let distance = self.distance(at, DistanceField::Dig);
            if check {
                self.check_path_tile(at, distance)?;
            }
            path.push(at);
            match self.next_on_path(at, distance)? {
                Some(next) => at = next,
                None => return Ok(path),
            }
            check = true;
        }
    }
}

impl<W: World> AgentCtx<'_, W> {
    /// Digs from `start` back to territory. Orders issued before a failure stay issued.
    pub(super) fn backtrack(&mut self, start: TileCoord, check_start: bool) -> Result<Vec<TileCoord>, PlanError> {
        let mut path = Vec::new();
        let mut at = start;
        let mut check = check_start;
        loop {
            let distance = self.view().distance(at, DistanceField::Dig);
            if check {
                self.view().check_path_tile(at, distance)?;
                self.dig_if_needed(at)?;
            }
            path.push(at);
            match self.view().next_on_path(at, distance)? {
                Some(next) => at = next,
                None => return Ok(path),
            }
            check = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn tunnel_through_earth_issues_one_order_per_tile() {
        let mut world = gold_corridor_world();
        let mut planner = planner_for(&world);
        let path = planner.backtrack(AGENT, &mut world, TileCoord::new(6, 3), false, true).unwrap();
        assert_eq!(
            path,
            vec![TileCoord::new(6, 3), TileCoord::new(5, 3), TileCoord::new(4, 3), TileCoord::new(3, 3)]
        );
        assert_eq!(
            world.excavations(AGENT),
            vec![TileCoord::new(6, 3), TileCoord::new(5, 3), TileCoord::new(4, 3)]
        );
    }

    #[test]
    fn fake_run_issues_nothing() {
        let mut world = gold_corridor_world();
        let mut planner = planner_for(&world);
        let path = planner.backtrack(AGENT, &mut world, TileCoord::new(6, 3), true, true).unwrap();
        assert_eq!(path.len(), 4);
        assert!(world.commands().is_empty());
        assert_eq!(planner.agent_state(AGENT).unwrap().ledger.marked_count(), 0);
    }

    #[test]
    fn failure_part_way_keeps_earlier_orders_marked() {
        let mut world = gold_corridor_world();
        world.fail_excavations_after(1);
        let mut planner = planner_for(&world);
        let result = planner.backtrack(AGENT, &mut world, TileCoord::new(6, 3), false, true);
        assert!(matches!(result, Err(PlanError::Command(_))));
        let ledger = &planner.agent_state(AGENT).unwrap().ledger;
        assert!(ledger.is_marked(TileCoord::new(6, 3)));
        assert!(!ledger.is_marked(TileCoord::new(5, 3)));
    }

    #[test]
    fn dangerous_tiles_stop_the_walk() {
        let mut world = gold_corridor_world();
        let mut planner = planner_for(&world);
        planner.agents.get_mut(&AGENT).unwrap().danger.flag_around(TileCoord::new(4, 2));
        let result = planner.backtrack(AGENT, &mut world, TileCoord::new(6, 3), false, true);
        assert_eq!(result, Err(PlanError::Dangerous(TileCoord::new(5, 3))));
        assert_eq!(world.excavations(AGENT), vec![TileCoord::new(6, 3)]);
    }

    #[test]
    fn unconnected_tiles_are_unreachable() {
        let mut world = gold_corridor_world();
        let mut planner = planner_for(&world);
        let result = planner.backtrack(AGENT, &mut world, TileCoord::new(0, 0), true, false);
        assert_eq!(result, Err(PlanError::Unreachable(TileCoord::new(0, 0))));
    }
}
