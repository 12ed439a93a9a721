//! Tuning constants for every planner heuristic.
//!
//! Loaded from JSON. Missing fields fall back to the defaults below, which
//! reproduce the classic computer keeper's behaviour.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::RoomKind;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub danger: DangerConfig,
    pub gold: GoldConfig,
    pub rooms: RoomScoring,
    pub expansion: ExpansionConfig,
    pub assault: AssaultConfig,
}

impl PlannerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let config = PlannerConfig::from_json_str(&contents)?;
        Ok(config)
    }
}

/// A tile is dangerous when `hostile * denominator > own * numerator`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DangerConfig {
    pub strength_ratio_numerator: i64,
    pub strength_ratio_denominator: i64,
}

impl Default for DangerConfig {
    fn default() -> Self {
        Self { strength_ratio_numerator: 2, strength_ratio_denominator: 5 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoldConfig {
    pub max_concurrent_digs: usize,
    pub units_per_dig: i32,
    pub ore_score: i64,
    pub gem_score: i64,
    pub distance_bias: i64,
    pub busy_window: i32,
    pub busy_multiplier: i64,
    pub treasure_search_radius: i32,
    pub treasure_track_steps: u32,
    pub treasure_min_ore: i32,
    pub treasure_min_size: i32,
    pub treasure_max_size: i32,
    pub treasure_gem_weight: i32,
}

impl Default for GoldConfig {
    fn default() -> Self {
        Self {
            max_concurrent_digs: 10,
            units_per_dig: 5,
            ore_score: 100_000,
            gem_score: 150_000,
            distance_bias: 5,
            busy_window: 2,
            busy_multiplier: 2,
            treasure_search_radius: 9,
            treasure_track_steps: 2,
            treasure_min_ore: 5,
            treasure_min_size: 12,
            treasure_max_size: 36,
            treasure_gem_weight: 8,
        }
    }
}

/// Weights of the rectangle scoring function.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomScoring {
    pub target_tile_bonus: i64,
    pub access_gold_penalty: i64,
    pub earth_tile: i64,
    pub claimed_tile: i64,
    pub gold_tile_treasure: i64,
    pub gold_tile_other: i64,
    pub wall_tile: i64,
    pub walls: WallScores,
    pub squareness_weight: i64,
    pub stronghold_distance_weight: i64,
    pub enemy_distance_weight: i64,
    pub frontline_enemy_distance_weight: i64,
    pub min_side: i32,
    pub garden_radius: i32,
    pub garden_inline_bonus: i64,
    pub garden_diagonal_bonus: i64,
    pub treasure_mineral_base: i64,
    pub treasure_mineral_scale: i64,
    pub library_scale: Scale,
    pub garden_food_scale: Scale,
    pub garden_other_scale: Scale,
}

impl Default for RoomScoring {
    fn default() -> Self {
        Self {
            target_tile_bonus: 1000,
            access_gold_penalty: 5,
            earth_tile: -1,
            claimed_tile: 3,
            gold_tile_treasure: 5,
            gold_tile_other: -5,
            wall_tile: -10,
            walls: WallScores::default(),
            squareness_weight: 200,
            stronghold_distance_weight: 4,
            enemy_distance_weight: 4,
            frontline_enemy_distance_weight: 0,
            min_side: 3,
            garden_radius: 7,
            garden_inline_bonus: 3,
            garden_diagonal_bonus: 1,
            treasure_mineral_base: 1,
            treasure_mineral_scale: 3,
            library_scale: Scale { up: 4, down: 5 },
            garden_food_scale: Scale { up: 11, down: 10 },
            garden_other_scale: Scale { up: 9, down: 10 },
        }
    }
}

/// Scores for the ring of tiles just outside a candidate rectangle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallScores {
    pub own_wall: i64,
    pub foreign_wall: i64,
    pub earth: i64,
    pub earth_marked: i64,
    pub rock_or_gems: i64,
    pub claimed: i64,
    pub gold: i64,
    pub gold_marked: i64,
    pub exposed: i64,
    pub own_door: i64,
    pub foreign_door: i64,
    pub other: i64,
}

impl Default for WallScores {
    fn default() -> Self {
        Self {
            own_wall: 25,
            foreign_wall: -100,
            earth: 20,
            earth_marked: 5,
            rock_or_gems: 15,
            claimed: 5,
            gold: 1,
            gold_marked: 5,
            exposed: -50,
            own_door: -25,
            foreign_door: -100,
            other: -10,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scale {
    pub up: i64,
    pub down: i64,
}

impl Scale {
    pub const IDENTITY: Scale = Scale { up: 1, down: 1 };

    pub fn apply(self, score: i64) -> i64 {
        if self.down == 0 { score } else { score * self.up / self.down }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    pub max_iterations: u32,
    pub ring_start: i32,
    pub ring_patience: u32,
    pub digger_drop_attempts: u32,
    pub money_reserve: i64,
    pub garden_regrowth_turns: u64,
    pub free_capacity_percent: i64,
    pub garden_busy_divisor: i64,
    pub build_priority: Vec<RoomKind>,
    pub sizes: PreferredSizes,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            ring_start: 4,
            ring_patience: 20,
            digger_drop_attempts: 3,
            money_reserve: 1000,
            garden_regrowth_turns: 800,
            free_capacity_percent: 10,
            garden_busy_divisor: 4,
            build_priority: vec![
                RoomKind::Treasure,
                RoomKind::Lair,
                RoomKind::Garden,
                RoomKind::Library,
                RoomKind::Training,
                RoomKind::Workshop,
                RoomKind::Scavenger,
                RoomKind::Prison,
                RoomKind::Temple,
                RoomKind::Torture,
                RoomKind::Graveyard,
                RoomKind::Barracks,
            ],
            sizes: PreferredSizes::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferredSizes {
    pub fallback: i32,
    pub spacious: i32,
    pub workshop: i32,
    pub worship_min: i32,
    pub worship_max: i32,
    pub holding_min: i32,
    pub holding_max: i32,
    pub lair_min: i32,
}

impl Default for PreferredSizes {
    fn default() -> Self {
        Self {
            fallback: 9,
            spacious: 25,
            workshop: 30,
            worship_min: 9,
            worship_max: 25,
            holding_min: 15,
            holding_max: 25,
            lair_min: 12,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssaultConfig {
    pub path_value: i32,
    pub claimed_value: i32,
    pub entrance_value: i32,
    pub room_value_divisor: i32,
    pub unconscious_bonus: i32,
    pub claim_threat_radius: i32,
    pub cheap_digger_price_multiple: i64,
    pub wood_door: i32,
    pub braced_door: i32,
    pub iron_door: i32,
    pub magic_door: i32,
    pub heart_strength_weight: i64,
    pub trapped_divisor: i32,
    pub hero_door_divisor: i32,
    pub jitter_range: u64,
    /// Enemies are targeted only while `theirs * denominator < mine * numerator`.
    pub advantage_numerator: i64,
    pub advantage_denominator: i64,
}

impl Default for AssaultConfig {
    fn default() -> Self {
        Self {
            path_value: 100,
            claimed_value: 150,
            entrance_value: 250,
            room_value_divisor: 10,
            unconscious_bonus: 500,
            claim_threat_radius: 7,
            cheap_digger_price_multiple: 100,
            wood_door: 400,
            braced_door: 300,
            iron_door: 200,
            magic_door: 100,
            heart_strength_weight: 100,
            trapped_divisor: 2,
            hero_door_divisor: 3,
            jitter_range: 10,
            advantage_numerator: 4,
            advantage_denominator: 5,
        }
    }
}
