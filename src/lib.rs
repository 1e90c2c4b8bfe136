//! # Kaya Simulation
//!
//! Deterministic per-frame simulation for the Kaya side-scrolling
//! platformer: physics, collision, combat, enemy AI, camera, checkpoints,
//! and level progression.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      KAYA SIMULATION                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Deterministic primitives                 │
//! │  ├── fixed.rs     - Q16.16 fixed-point arithmetic            │
//! │  ├── vec2.rs      - 2D vector with fixed-point               │
//! │  ├── rng.rs       - Deterministic Xorshift128+ PRNG          │
//! │  └── hash.rs      - State hashing for verification           │
//! │                                                              │
//! │  game/            - Game logic                               │
//! │  ├── input.rs     - Held actions, edges, recordings          │
//! │  ├── state.rs     - World, player, entities                  │
//! │  ├── physics.rs   - Movement, gravity, abilities             │
//! │  ├── collision.rs - AABB resolution, pits, pickups           │
//! │  ├── combat.rs    - Stomp, melee, damage                     │
//! │  ├── enemy_ai.rs  - Per-kind behavior table                  │
//! │  ├── camera.rs    - Camera tracking                          │
//! │  ├── checkpoint.rs- Respawn points, death                    │
//! │  ├── level.rs     - Level sources, world construction        │
//! │  ├── progression.rs - Exit gate, unlocks                     │
//! │  ├── tick.rs      - Per-frame scheduler                      │
//! │  └── session.rs   - Loading, saves, level changes            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The tick loop is **100% deterministic**:
//! - No floating-point arithmetic in game logic (floats only at the
//!   level-file and render-snapshot edges)
//! - Entity lists iterate in index order; removal is mark-then-compact
//! - No system time dependencies
//! - All randomness from the level's seeded Xorshift128+
//!
//! Given an identical level, seed, and input stream, a replay lands on
//! the same state hash.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod game;

// Re-export commonly used types
pub use core::fixed::{Fixed, FIXED_ONE, FIXED_HALF, FIXED_SCALE};
pub use core::vec2::FixedVec2;
pub use core::rng::DeterministicRng;
pub use error::{ConfigError, LevelError, StoreError};
pub use game::input::{Action, InputFrame, InputRecording};
pub use game::session::Session;
pub use game::state::{PlayerState, WorldState};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;
