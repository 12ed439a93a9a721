//! The pending-bridge queue: liquid tiles on planned paths, built once
//! revealed, reachable and affordable.
//! This module exists to drain the queue one step per tick, oldest entry first.
//! It does not own why a tile was queued; `dig_if_needed` puts liquid here.

use std::mem;

use super::*;

/// What one pass did with a queued tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BridgeStep {
    Keep,
    Resolved(TaskOutcome),
}

impl<W: World> AgentCtx<'_, W> {
    /// One build or reveal attempt at most per tick. Returns how many entries
    /// left the queue.
    pub(super) fn process_bridges(&mut self) -> usize {
        if self.state.bridges.is_empty() {
            return 0;
        }
        let cost = self.world.room_cost(RoomKind::Bridge);
        let mut do_build = self.view().bridges_available() && self.world.money(self.agent) >= cost;
        let queue = mem::take(&mut self.state.bridges);
        let mut resolved = 0;
        for at in queue {
            match self.bridge_step(at, &mut do_build) {
                BridgeStep::Keep => self.state.bridges.push(at),
                BridgeStep::Resolved(outcome) => {
                    resolved += 1;
                    self.record(TaskKind::Bridge, outcome, at);
                }
            }
        }
        tracing::debug!(
            target: LOG_TARGET,
            agent = %self.agent,
            resolved,
            pending = self.state.bridges.len(),
            "bridge queue processed"
        );
        resolved
    }

    fn bridge_step(&mut self, at: TileCoord, do_build: &mut bool) -> BridgeStep {
        let kind = self.world.slab_kind(at);
        if kind == SlabKind::Bridge {
            let outcome = if self.view().is_own(at) { TaskOutcome::Completed } else { TaskOutcome::Aborted };
            return BridgeStep::Resolved(outcome);
        }
        if !kind.is_liquid() {
            return BridgeStep::Resolved(TaskOutcome::Aborted);
        }
        if !*do_build {
            return BridgeStep::Keep;
        }
        if !self.world.is_revealed_to(at, self.agent) {
            self.drop_digger_to_reveal(at, do_build);
            return BridgeStep::Keep;
        }
        let next_to_land = at.neighbors4().into_iter().any(|n| {
            self.view().is_own(n) && self.world.slab_kind(n).is_open_floor()
        });
        if !next_to_land {
            return BridgeStep::Keep;
        }
        *do_build = false;
        match self.world.request_construct_room(self.agent, at, RoomKind::Bridge) {
            Ok(()) => {
                tracing::info!(target: LOG_TARGET, agent = %self.agent, x = at.x, y = at.y, "bridge built");
                BridgeStep::Resolved(TaskOutcome::Completed)
            }
            Err(err) => {
                tracing::info!(target: LOG_TARGET, agent = %self.agent, at = %at, error = %err, "bridge abandoned");
                BridgeStep::Resolved(TaskOutcome::Aborted)
            }
        }
    }

    /// A digger next to hidden liquid reveals it. The drop uses up this
    /// tick's bridge action.
    fn drop_digger_to_reveal(&mut self, at: TileCoord, do_build: &mut bool) {
        for n in at.neighbors4() {
            if !self.world.can_drop_at(self.agent, n) {
                continue;
            }
            let Some(digger) = self.world.urgent_digger(self.agent) else { return };
            if self.world.request_drop_unit(self.agent, digger, n, DropGoal::DigToReveal).is_ok() {
                tracing::debug!(target: LOG_TARGET, agent = %self.agent, at = %n, "digger dropped to reveal liquid");
                *do_build = false;
                return;
            }
        }
    }
}
