use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::TileCoord;

/// Why the command interface declined an order.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("not enough money for the order")]
    Unaffordable,
    #[error("player is not permitted to act on {0}")]
    NotPermitted(TileCoord),
    #[error("tile {0} cannot take this order in its current state")]
    InvalidTile(TileCoord),
    #[error("order rejected: {0}")]
    Rejected(String),
}

/// Why a single plan did not work out this tick.
///
/// None of these are fatal. Task initiators return them, the scheduler turns
/// them into an aborted task and tries again on a later tick.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The command interface declined an order part way through.
    #[error(transparent)]
    Command(#[from] CommandError),
    /// A tile on the way is flagged dangerous.
    #[error("tile {0} is dangerous")]
    Dangerous(TileCoord),
    /// A tile on the way can be neither dug nor built on.
    #[error("tile {0} cannot be dug or built on")]
    Undiggable(TileCoord),
    /// The distance field has no strictly closer step from this tile.
    #[error("no path back to territory from {0}")]
    NoPath(TileCoord),
    /// The tile is not connected to the agent's territory at all.
    #[error("tile {0} is unreachable")]
    Unreachable(TileCoord),
    /// Liquid lies on the way and the agent cannot build bridges.
    #[error("liquid at {0} needs a bridge")]
    NoBridge(TileCoord),
    /// `tick` was called for an agent that was never set up.
    #[error("agent has no digging state")]
    AgentNotInitialized,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse planner config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read planner config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Describes why a world fixture could not be turned into a sim world.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to parse world fixture: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read world fixture from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Rows differ in length or the map is empty.
    #[error("world rows must be non-empty and equally wide (row {row})")]
    Ragged { row: usize },
    #[error("unknown tile glyph {glyph:?} at {at}")]
    UnknownGlyph { glyph: char, at: TileCoord },
    #[error("fixture references tile {0} outside the map")]
    OutOfBounds(TileCoord),
}
