//! The per-tick orchestration of every digging task for one agent.
//! This module exists to fix the order tasks run in and the gold dig budget.
//! It does not own any task's rules; each lives in its own module.

use std::mem;

use super::*;

impl<W: World> AgentCtx<'_, W> {
    /// Danger first, then bridges, breach, gold and rooms.
    pub(super) fn run_tick(&mut self) -> TickReport {
        danger::refresh(self.cfg, &mut *self.state, &*self.world);
        let bridges_resolved = self.process_bridges();

        if self.state.attack_dig.is_some() {
            self.process_attack_dig();
        } else {
            self.check_attack_dig();
        }

        let max_digs = self.view().max_gold_digs();
        self.process_gold_digs();
        if self.state.gold_digs.len() < max_digs {
            self.check_gold_dig();
        }

        if self.state.expand_room.is_some() {
            self.process_expand_room();
        } else {
            self.check_expand_room();
        }

        let report = TickReport {
            agent: self.agent,
            turn: self.world.game_turn(),
            events: mem::take(&mut self.events),
            bridges_resolved,
        };
        tracing::debug!(
            target: LOG_TARGET,
            agent = %self.agent,
            turn = report.turn,
            events = report.events.len(),
            gold_digs = self.state.gold_digs.len(),
            "planning tick finished"
        );
        report
    }
}
