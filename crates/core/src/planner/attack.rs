//! Breach digs: the tunnel that opens a hostile pocket to an assault drop.
//! This module exists to own the single attack dig task.
//! It does not own the assault itself; door and heart targets live in `doors`.

use super::backtrack::DistanceField;
use super::*;
use crate::state::AttackDig;

impl<W: World> AgentView<'_, W> {
    /// The best tile to tunnel into across every hostile pocket that is not
    /// yet open to a drop and that a full backtrack could reach.
    pub(super) fn pick_breach_target(&self) -> Option<TargetChoice> {
        let stronghold = self.world.stronghold(self.agent)?;
        let bridges = self.bridges_available();
        let mut best: Option<TargetChoice> = None;
        for (id, region) in self.world.hostile_regions().iter().enumerate() {
            if !region.continuous_walkable && !bridges {
                continue;
            }
            if PlayerId::keepers().any(|keeper| region.contains_stronghold_of(keeper)) {
                continue;
            }
            let Some(entry) = self.best_region_entry(id, region.any_tile, stronghold) else { continue };
            let drop = self.world.unblocked_drop_distance(entry.at, self.agent);
            if drop == 0 || drop == 1 {
                continue;
            }
            if Some(entry.score) <= best.map(|choice| choice.score) {
                continue;
            }
            match self.backtrack_feasible(entry.at, false) {
                Ok(_) => best = Some(entry),
                Err(err) => {
                    tracing::trace!(target: LOG_TARGET, agent = %self.agent, at = %entry.at, error = %err, "breach entry rejected");
                }
            }
        }
        best
    }

    /// Floods the pocket from `start` and keeps the tile closest to our
    /// territory and farthest from our stronghold. Ties keep the first found.
    fn best_region_entry(&self, id: RegionId, start: TileCoord, stronghold: TileCoord) -> Option<TargetChoice> {
        let mut best: Option<TargetChoice> = None;
        self.world.traverse_region(start, &mut |at| {
            let inside = self.world.hostile_walk_region(at) == Some(id) || self.world.hostile_fly_region(at) == Some(id);
            if !inside || self.is_dangerous(at) {
                return false;
            }
            let distance = self.distance(at, DistanceField::Dig);
            if distance >= 0 {
                let score = i64::from(at.manhattan(stronghold) - distance);
                if Some(score) > best.map(|choice| choice.score) {
                    best = Some(TargetChoice { at, score });
                }
            }
            true
        });
        best
    }
}

impl<W: World> AgentCtx<'_, W> {
    pub(super) fn check_attack_dig(&mut self) {
        let Some(target) = self.view().pick_breach_target() else { return };
        match self.backtrack(target.at, false) {
            Ok(path) => {
                tracing::info!(
                    target: LOG_TARGET,
                    agent = %self.agent,
                    x = target.at.x,
                    y = target.at.y,
                    score = target.score,
                    steps = path.len(),
                    "breach dig started"
                );
                self.state.attack_dig = Some(AttackDig { entry: target.at });
                self.record(TaskKind::AttackDig, TaskOutcome::Started, target.at);
            }
            Err(err) => {
                tracing::info!(target: LOG_TARGET, agent = %self.agent, at = %target.at, error = %err, "breach dig abandoned");
                self.record(TaskKind::AttackDig, TaskOutcome::Aborted, target.at);
            }
        }
    }

    /// Done once a dropped unit could walk in; dropped when the entry has
    /// been cut off from our territory.
    pub(super) fn process_attack_dig(&mut self) {
        let Some(dig) = self.state.attack_dig else { return };
        let outcome = match self.world.unblocked_drop_distance(dig.entry, self.agent) {
            0 | 1 => TaskOutcome::Completed,
            _ if self.view().distance(dig.entry, DistanceField::Dig) < 0 => TaskOutcome::Aborted,
            _ => return,
        };
        self.state.attack_dig = None;
        tracing::info!(target: LOG_TARGET, agent = %self.agent, at = %dig.entry, ?outcome, "breach dig finished");
        self.record(TaskKind::AttackDig, outcome, dig.entry);
    }
}
