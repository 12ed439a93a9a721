//! Starting a room expansion and advancing it tick by tick until built.
//! This module exists to own the lifecycle of the single active room task.
//! It does not own rectangle choice; it takes a candidate from the search.

use super::*;
use crate::state::RoomExpansion;

/// What one attempt to build on a tile came to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BuildStep {
    /// An order went out; nothing more this tick.
    Acted,
    /// Not affordable yet.
    Wait,
    Failed,
}

/// Where a room stands after one tick of work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RoomProgress {
    Working,
    Finished,
    Aborted,
}

impl<W: World> AgentCtx<'_, W> {
    /// Looks for a room worth building and starts it.
    pub(in crate::planner) fn check_expand_room(&mut self) {
        let view = self.view();
        let Some(kind) = view.decide_room_to_expand() else {
            tracing::trace!(target: LOG_TARGET, agent = %self.agent, "no room needs expanding");
            return;
        };
        let preferred = view.preferred_tiles(kind);
        match view.find_expand_location(kind, preferred) {
            Some(candidate) => self.start_room(candidate),
            None => {
                tracing::debug!(target: LOG_TARGET, agent = %self.agent, room = ?kind, "no place found for room");
            }
        }
    }

    /// Orders the corridor and interior dug and makes the room the active task.
    pub(in crate::planner) fn start_room(&mut self, candidate: RoomCandidate) {
        let at = candidate.pos.center();
        let task = TaskKind::ExpandRoom(candidate.kind);
        if let Err(err) = self.dig_room(&candidate.pos) {
            tracing::info!(
                target: LOG_TARGET,
                agent = %self.agent,
                room = ?candidate.kind,
                error = %err,
                "room expansion abandoned, could not order digging"
            );
            self.record(task, TaskOutcome::Aborted, at);
            return;
        }
        tracing::info!(
            target: LOG_TARGET,
            agent = %self.agent,
            room = ?candidate.kind,
            at = %at,
            width = candidate.pos.width(),
            height = candidate.pos.height(),
            score = candidate.score,
            "room expansion started"
        );
        self.state.expand_room = Some(RoomExpansion {
            kind: candidate.kind,
            preferred_tiles: candidate.preferred_tiles,
            pos: candidate.pos,
            score: candidate.score,
            drop_attempts: 0,
        });
        self.record(task, TaskOutcome::Started, at);
    }

    /// Corridor first, then the interior. Stops at the first declined order.
    fn dig_room(&mut self, pos: &RoomExpansionPos) -> Result<(), PlanError> {
        for at in pos.corridor().into_iter().chain(pos.tiles()) {
            self.dig_if_needed(at)?;
        }
        Ok(())
    }

    pub(in crate::planner) fn process_expand_room(&mut self) {
        let Some(mut room) = self.state.expand_room.clone() else { return };
        if room.drop_attempts < self.cfg.expansion.digger_drop_attempts {
            let dropped = self.world.urgent_digger(self.agent).is_some_and(|unit| {
                self.world.request_drop_unit(self.agent, unit, room.pos.access, DropGoal::ExcavateAtAccess).is_ok()
            });
            room.drop_attempts = if dropped { room.drop_attempts + 1 } else { u32::MAX };
        }

        let at = room.pos.center();
        let task = TaskKind::ExpandRoom(room.kind);
        match self.advance_room(&room) {
            RoomProgress::Working => self.state.expand_room = Some(room),
            RoomProgress::Finished => {
                self.state.expand_room = None;
                if room.kind == RoomKind::Garden {
                    self.state.last_garden_turn = Some(self.world.game_turn());
                }
                tracing::info!(target: LOG_TARGET, agent = %self.agent, room = ?room.kind, at = %at, "room expansion finished");
                self.record(task, TaskOutcome::Completed, at);
            }
            RoomProgress::Aborted => {
                self.state.expand_room = None;
                tracing::info!(target: LOG_TARGET, agent = %self.agent, room = ?room.kind, at = %at, "room expansion aborted");
                self.record(task, TaskOutcome::Aborted, at);
            }
        }
    }

    /// Builds on at most one tile. Temples start from their centre.
    fn advance_room(&mut self, room: &RoomExpansion) -> RoomProgress {
        let mut finished = true;
        if room.kind == RoomKind::Temple {
            let center = room.pos.center();
            if self.world.slab_kind(center) == SlabKind::Claimed {
                finished = false;
                match self.build_room_if_possible(room.kind, center) {
                    BuildStep::Acted => return RoomProgress::Working,
                    BuildStep::Failed => return RoomProgress::Aborted,
                    BuildStep::Wait => {}
                }
            } else if self.view().is_diggable_or_buildable(center) {
                return RoomProgress::Working;
            }
        }
        for at in room.pos.tiles() {
            if self.world.slab_kind(at) == SlabKind::Claimed {
                finished = false;
                match self.build_room_if_possible(room.kind, at) {
                    BuildStep::Acted => return RoomProgress::Working,
                    BuildStep::Failed => return RoomProgress::Aborted,
                    BuildStep::Wait => {}
                }
            } else if self.view().is_diggable_or_buildable(at) {
                finished = false;
            }
        }
        if finished { RoomProgress::Finished } else { RoomProgress::Working }
    }

    fn build_room_if_possible(&mut self, kind: RoomKind, at: TileCoord) -> BuildStep {
        let cost = self.world.room_cost(kind);
        let money = self.world.money(self.agent);
        if cost + self.cfg.expansion.money_reserve >= money && !(self.world.builds_to_broke(kind) && cost < money) {
            return BuildStep::Wait;
        }
        if !self.world.is_room_available(self.agent, kind) {
            return BuildStep::Failed;
        }
        if self.world.has_trap(at) && self.world.request_sell_trap(self.agent, at).is_ok() {
            return BuildStep::Acted;
        }
        if !self.world.can_build_room_at(self.agent, kind, at) {
            return BuildStep::Failed;
        }
        match self.world.request_construct_room(self.agent, at, kind) {
            Ok(()) => BuildStep::Acted,
            Err(err) => {
                tracing::debug!(target: LOG_TARGET, agent = %self.agent, at = %at, error = %err, "room tile declined");
                BuildStep::Failed
            }
        }
    }
}
