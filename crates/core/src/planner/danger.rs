//! Per-tick danger flags from hostile region strength and avoided rivals.
//! This module exists to rebuild the danger map before any selector reads it.
//! It does not own region computation; strengths come from the influence provider.

use super::*;

pub(super) fn refresh<W: World>(cfg: &PlannerConfig, state: &mut AgentDiggingState, world: &W) {
    state.danger.clear();
    let agent = state.agent;
    if world.are_allies(agent, PlayerId::HEROES) {
        return;
    }
    let mine = world.strength(agent);
    let avoided: Vec<PlayerId> = PlayerId::keepers()
        .filter(|other| *other != agent && world.attitude(agent, *other) == Attitude::Avoid)
        .collect();

    for at in world.interior_coords() {
        let avoid = avoided.iter().any(|other| world.blocked_drop_distance(at, *other) == 0);
        let hostile = if avoid { 0 } else { hostile_strength(world, agent, at) };
        if avoid
            || hostile * cfg.danger.strength_ratio_denominator > mine * cfg.danger.strength_ratio_numerator
        {
            state.danger.flag_around(at);
        }
    }
    tracing::debug!(
        target: LOG_TARGET,
        agent = %agent,
        flagged = state.danger.flagged_count(),
        "danger map refreshed"
    );
}

/// Walk and fly pockets both count, except pockets holding our own stronghold.
fn hostile_strength<W: World>(world: &W, agent: PlayerId, at: TileCoord) -> i64 {
    [world.hostile_walk_region(at), world.hostile_fly_region(at)]
        .into_iter()
        .flatten()
        .filter_map(|id| world.hostile_region(id))
        .filter(|region| !region.contains_stronghold_of(agent))
        .map(|region| region.strength)
        .sum()
}
