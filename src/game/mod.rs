//! Game Logic Module
//!
//! All game simulation code. Everything under here except `session`,
//! `level` file loading, and `persistence` is deterministic.
//!
//! ## Module Structure
//!
//! - `input`: Held actions, rising edges, recordings
//! - `state`: World state, player, entities
//! - `config`: Tunables
//! - `physics`: Abilities, movement, gravity, moving platforms
//! - `collision`: AABB resolution, hidden blocks, pits, pickups
//! - `combat`: Stomps, melee, contact, projectiles, hazards
//! - `enemy_ai`: Per-kind behavior table
//! - `camera`: Camera tracking
//! - `checkpoint`: Checkpoints, death, respawn
//! - `level`: Level sources and world construction
//! - `progression`: Exit gate and unlocks
//! - `persistence`: Save stores
//! - `events`: Feedback events
//! - `snapshot`: Render snapshot
//! - `tick`: The per-frame scheduler
//! - `session`: Level loading and collaborator wiring

pub mod input;
pub mod state;
pub mod config;
pub mod physics;
pub mod collision;
pub mod combat;
pub mod enemy_ai;
pub mod camera;
pub mod checkpoint;
pub mod level;
pub mod progression;
pub mod persistence;
pub mod events;
pub mod snapshot;
pub mod tick;
pub mod session;

// Re-export key types
pub use config::SimConfig;
pub use events::GameEvent;
pub use input::{Action, EdgeDetector, InputFrame, InputRecording, InputState};
pub use session::Session;
pub use snapshot::RenderSnapshot;
pub use state::{GamePhase, PlayerState, WorldState};
pub use tick::TickResult;
