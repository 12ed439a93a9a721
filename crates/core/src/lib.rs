pub mod config;
pub mod error;
pub mod grid;
pub mod planner;
pub mod sim;
pub mod state;
pub mod types;
pub mod world;

pub use config::PlannerConfig;
pub use error::{CommandError, ConfigError, FixtureError, PlanError};
pub use planner::{DoorChoice, PlanEvent, Planner, RoomCandidate, TargetChoice, TaskKind, TaskOutcome, TickReport};
pub use sim::SimWorld;
pub use state::AgentDiggingState;
pub use types::*;
pub use world::World;
