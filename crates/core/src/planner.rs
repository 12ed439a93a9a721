use std::collections::BTreeMap;

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::{Rng, SeedableRng};
use serde::Serialize;

use crate::config::PlannerConfig;
use crate::error::PlanError;
use crate::state::AgentDiggingState;
use crate::types::*;
use crate::world::{CommandSink, GridQuery, World};

mod attack;
mod backtrack;
mod bridging;
mod claims;
mod danger;
mod digging;
mod doors;
mod gold;
mod hash;
mod room;
mod scheduler;
#[cfg(test)]
mod test_support;

pub use room::RoomCandidate;

const LOG_TARGET: &str = "dig_core::planner";

/// Task categories the scheduler arbitrates between.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TaskKind {
    GoldDig,
    AttackDig,
    ExpandRoom(RoomKind),
    Bridge,
    Claim,
    DoorAssault,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TaskOutcome {
    Started,
    Completed,
    Aborted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PlanEvent {
    pub task: TaskKind,
    pub outcome: TaskOutcome,
    pub at: TileCoord,
}

/// What one planning pass did for one agent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub agent: PlayerId,
    pub turn: u64,
    pub events: Vec<PlanEvent>,
    pub bridges_resolved: usize,
}

impl TickReport {
    pub fn count(&self, task: TaskKind, outcome: TaskOutcome) -> usize {
        self.events.iter().filter(|event| event.task == task && event.outcome == outcome).count()
    }
}

/// A single tile picked by one of the target selectors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TargetChoice {
    pub at: TileCoord,
    pub score: i64,
}

/// Where to drop an assault unit, and whether traps guard the way in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DoorChoice {
    pub at: TileCoord,
    pub score: i64,
    pub trapped: bool,
}

/// Read-only view of one agent's planning state against the world.
struct AgentView<'a, W> {
    cfg: &'a PlannerConfig,
    agent: PlayerId,
    state: &'a AgentDiggingState,
    world: &'a W,
}

impl<W> Clone for AgentView<'_, W> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<W> Copy for AgentView<'_, W> {}

/// Mutable planning context for one agent for the duration of one call.
struct AgentCtx<'a, W> {
    cfg: &'a PlannerConfig,
    agent: PlayerId,
    state: &'a mut AgentDiggingState,
    world: &'a mut W,
    events: Vec<PlanEvent>,
}

impl<'a, W: World> AgentCtx<'a, W> {
    fn new(cfg: &'a PlannerConfig, state: &'a mut AgentDiggingState, world: &'a mut W) -> Self {
        Self { cfg, agent: state.agent, state, world, events: Vec::new() }
    }

    fn view(&self) -> AgentView<'_, W> {
        AgentView { cfg: self.cfg, agent: self.agent, state: &*self.state, world: &*self.world }
    }

    fn record(&mut self, task: TaskKind, outcome: TaskOutcome, at: TileCoord) {
        tracing::debug!(target: LOG_TARGET, agent = %self.agent, ?task, ?outcome, x = at.x, y = at.y, "task event");
        self.events.push(PlanEvent { task, outcome, at });
    }
}

/// The digging and expansion planner for every computer-controlled keeper.
pub struct Planner {
    config: PlannerConfig,
    rng: ChaCha8Rng,
    agents: BTreeMap<PlayerId, AgentDiggingState>,
}

impl Planner {
    pub fn new(config: PlannerConfig, seed: u64) -> Self {
        Self { config, rng: ChaCha8Rng::seed_from_u64(seed), agents: BTreeMap::new() }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Creates the agent's records sized to the world and marks every tile
    /// the command queue already holds an order for.
    pub fn setup_agent<W: GridQuery + CommandSink>(&mut self, agent: PlayerId, world: &W) {
        let (width, height) = world.dimensions();
        let mut state = AgentDiggingState::new(agent, width, height);
        for at in world.outstanding_orders(agent) {
            state.ledger.mark(at);
        }
        tracing::debug!(
            target: LOG_TARGET,
            agent = %agent,
            marked = state.ledger.marked_count(),
            "digging state set up"
        );
        self.agents.insert(agent, state);
    }

    /// Drops the agent's records, pending bridges included.
    pub fn teardown_agent(&mut self, agent: PlayerId) -> Option<AgentDiggingState> {
        self.agents.remove(&agent)
    }

    /// Rebuilds every known agent from the world's current order queue.
    pub fn reset<W: GridQuery + CommandSink>(&mut self, world: &W) {
        let agents: Vec<PlayerId> = self.agents.keys().copied().collect();
        self.agents.clear();
        for agent in agents {
            self.setup_agent(agent, world);
        }
    }

    pub fn agents(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.agents.keys().copied()
    }

    pub fn agent_state(&self, agent: PlayerId) -> Option<&AgentDiggingState> {
        self.agents.get(&agent)
    }

    fn split(&mut self, agent: PlayerId) -> Result<(&PlannerConfig, &mut AgentDiggingState), PlanError> {
        let state = self.agents.get_mut(&agent).ok_or(PlanError::AgentNotInitialized)?;
        Ok((&self.config, state))
    }

    fn view<'a, W>(&'a self, agent: PlayerId, world: &'a W) -> Result<AgentView<'a, W>, PlanError> {
        let state = self.agents.get(&agent).ok_or(PlanError::AgentNotInitialized)?;
        Ok(AgentView { cfg: &self.config, agent, state, world })
    }

    /// One full planning pass: danger, bridges, breach, gold and rooms.
    pub fn tick<W: World>(&mut self, agent: PlayerId, world: &mut W) -> Result<TickReport, PlanError> {
        let (cfg, state) = self.split(agent)?;
        let mut ctx = AgentCtx::new(cfg, state, world);
        Ok(ctx.run_tick())
    }

    pub fn refresh_danger<W: World>(&mut self, agent: PlayerId, world: &W) -> Result<(), PlanError> {
        let (cfg, state) = self.split(agent)?;
        danger::refresh(cfg, state, world);
        Ok(())
    }

    /// Walks the dig distance field from `start` back to territory.
    ///
    /// Returns the visited tiles, ending on one with distance zero. Unless
    /// `fake_run` is set, excavation orders are issued along the way and stay
    /// issued even when the walk fails later.
    pub fn backtrack<W: World>(
        &mut self,
        agent: PlayerId,
        world: &mut W,
        start: TileCoord,
        fake_run: bool,
        check_start: bool,
    ) -> Result<Vec<TileCoord>, PlanError> {
        let (cfg, state) = self.split(agent)?;
        let mut ctx = AgentCtx::new(cfg, state, world);
        if fake_run {
            ctx.view().backtrack_feasible(start, check_start)
        } else {
            ctx.backtrack(start, check_start)
        }
    }

    /// Best room of `kind` across every seed point the agent has.
    pub fn find_best_room<W: World>(
        &self,
        agent: PlayerId,
        world: &W,
        kind: RoomKind,
        preferred_tiles: i32,
    ) -> Result<Option<RoomCandidate>, PlanError> {
        Ok(self.view(agent, world)?.find_expand_location(kind, preferred_tiles))
    }

    /// Best room grown from a single seed walking along `direction`.
    pub fn expand_from<W: World>(
        &self,
        agent: PlayerId,
        world: &W,
        kind: RoomKind,
        preferred_tiles: i32,
        seed: TileCoord,
        direction: (i32, i32),
        allow_translate: bool,
    ) -> Result<Option<RoomCandidate>, PlanError> {
        Ok(self.view(agent, world)?.expand_from_seed(kind, preferred_tiles, seed, direction, allow_translate))
    }

    pub fn pick_gold_target<W: World>(
        &self,
        agent: PlayerId,
        world: &W,
    ) -> Result<Option<TargetChoice>, PlanError> {
        Ok(self.view(agent, world)?.pick_gold_target())
    }

    pub fn pick_breach_target<W: World>(
        &self,
        agent: PlayerId,
        world: &W,
    ) -> Result<Option<TargetChoice>, PlanError> {
        Ok(self.view(agent, world)?.pick_breach_target())
    }

    /// `salt` seeds the tie-breaking perturbation; equal salts give equal picks.
    pub fn pick_claim_target<W: World>(
        &self,
        agent: PlayerId,
        world: &W,
        salt: u64,
    ) -> Result<Option<TargetChoice>, PlanError> {
        Ok(self.view(agent, world)?.pick_claim_target(salt))
    }

    pub fn pick_door_target<W: World>(
        &self,
        agent: PlayerId,
        world: &W,
        salt: u64,
    ) -> Result<Option<DoorChoice>, PlanError> {
        Ok(self.view(agent, world)?.pick_door_target(salt))
    }

    /// Drops a digger next to the most valuable claimable tile, if any.
    pub fn check_claims<W: World>(
        &mut self,
        agent: PlayerId,
        world: &mut W,
    ) -> Result<Option<TileCoord>, PlanError> {
        let salt = self.rng.next_u64();
        let (cfg, state) = self.split(agent)?;
        let mut ctx = AgentCtx::new(cfg, state, world);
        ctx.drop_for_claim(salt)
    }

    /// Drops a fighter next to the most attractive hostile door or heart, if any.
    pub fn check_door_assaults<W: World>(
        &mut self,
        agent: PlayerId,
        world: &mut W,
    ) -> Result<Option<TileCoord>, PlanError> {
        let salt = self.rng.next_u64();
        let (cfg, state) = self.split(agent)?;
        let mut ctx = AgentCtx::new(cfg, state, world);
        ctx.drop_for_door_assault(salt)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::sim::SimWorld;

    #[test]
    fn setup_marks_orders_already_queued_in_the_world() {
        let mut world = open_pocket_world();
        world.queue_order(AGENT, TileCoord::new(2, 2));
        let mut planner = Planner::new(PlannerConfig::default(), 7);
        planner.setup_agent(AGENT, &world);
        let state = planner.agent_state(AGENT).unwrap();
        assert!(state.ledger.is_marked(TileCoord::new(2, 2)));
        assert_eq!(state.ledger.marked_count(), 1);
    }

    #[test]
    fn tick_without_setup_is_rejected() {
        let mut world = SimWorld::new(8, 8);
        let mut planner = Planner::new(PlannerConfig::default(), 7);
        assert_eq!(planner.tick(AGENT, &mut world), Err(PlanError::AgentNotInitialized));
    }

    #[test]
    fn reset_drains_bridges_and_rebuilds_from_the_queue() {
        let mut world = open_pocket_world();
        let mut planner = Planner::new(PlannerConfig::default(), 7);
        planner.setup_agent(AGENT, &world);
        planner.agents.get_mut(&AGENT).unwrap().bridges.push(TileCoord::new(1, 1));
        world.queue_order(AGENT, TileCoord::new(3, 3));
        planner.reset(&world);
        let state = planner.agent_state(AGENT).unwrap();
        assert!(state.bridges.is_empty());
        assert!(state.ledger.is_marked(TileCoord::new(3, 3)));
        assert_eq!(planner.agents().collect::<Vec<_>>(), vec![AGENT]);
        assert!(planner.teardown_agent(AGENT).is_some());
        assert!(planner.agent_state(AGENT).is_none());
    }
}
