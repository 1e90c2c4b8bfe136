//! Progress persistence.
//!
//! Saves happen between ticks (on checkpoint activation and at level start),
//! never inside the simulation. The timestamp is the only wall-clock value
//! anywhere in the crate and it never feeds back into game state.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::game::config::SimConfig;
use crate::game::level::Carryover;
use crate::game::progression::LevelProgress;
use crate::game::state::{Abilities, WorldState};

/// Current save format version.
pub const SAVE_VERSION: u32 = 1;

/// Everything worth keeping between runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveData {
    /// Format version
    pub version: u32,
    /// World being played
    pub world: u8,
    /// Level being played
    pub level: u8,
    /// Score
    pub score: u32,
    /// Lives left
    pub lives: u32,
    /// Current health
    pub health: u32,
    /// Maximum health
    pub max_health: u32,
    /// Ability levels
    pub abilities: Abilities,
    /// Unlocked `(world, level)` pairs
    pub unlocked: Vec<(u8, u8)>,
    /// When the save was written
    pub saved_at: DateTime<Utc>,
}

impl SaveData {
    /// Capture the current world and unlock table.
    pub fn capture(state: &WorldState, progress: &LevelProgress, saved_at: DateTime<Utc>) -> Self {
        Self {
            version: SAVE_VERSION,
            world: state.world_index,
            level: state.level_index,
            score: state.score,
            lives: state.player.lives,
            health: state.player.health,
            max_health: state.player.max_health,
            abilities: state.player.abilities,
            unlocked: progress.unlocked(),
            saved_at,
        }
    }

    /// Unlock table from the save.
    pub fn progress(&self) -> LevelProgress {
        LevelProgress::from_pairs(&self.unlocked)
    }

    /// Player stats to resume with, clamped into valid ranges.
    pub fn carryover(&self, config: &SimConfig) -> Carryover {
        let max_lives = config.player.max_lives;
        let lives = self.lives.clamp(1, max_lives.max(1));
        if lives != self.lives {
            warn!(saved = self.lives, lives, "saved lives out of range, clamping");
        }
        Carryover {
            score: self.score,
            lives,
            max_health: self.max_health.max(1),
            abilities: self.abilities.sanitized(),
        }
    }
}

/// Somewhere to keep a [`SaveData`].
pub trait ProgressStore {
    /// Write the save, replacing any previous one.
    fn save(&mut self, data: &SaveData) -> Result<(), StoreError>;

    /// Read the save; `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<SaveData>, StoreError>;
}

impl<T: ProgressStore + ?Sized> ProgressStore for Box<T> {
    fn save(&mut self, data: &SaveData) -> Result<(), StoreError> {
        (**self).save(data)
    }

    fn load(&self) -> Result<Option<SaveData>, StoreError> {
        (**self).load()
    }
}

/// Save file on disk, written atomically through a sibling temp file.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Save file location.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressStore for JsonFileStore {
    fn save(&mut self, data: &SaveData) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(data)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), world = data.world, level = data.level, "progress saved");
        Ok(())
    }

    fn load(&self) -> Result<Option<SaveData>, StoreError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let data: SaveData = serde_json::from_slice(&raw)?;
        if data.version != SAVE_VERSION {
            warn!(version = data.version, expected = SAVE_VERSION, "save written by another version");
        }
        Ok(Some(data))
    }
}

/// Store that keeps the save in memory (tests, demos).
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    saved: Option<SaveData>,
    writes: u32,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of saves written.
    pub fn writes(&self) -> u32 {
        self.writes
    }
}

impl ProgressStore for MemoryStore {
    fn save(&mut self, data: &SaveData) -> Result<(), StoreError> {
        self.saved = Some(data.clone());
        self.writes += 1;
        Ok(())
    }

    fn load(&self) -> Result<Option<SaveData>, StoreError> {
        Ok(self.saved.clone())
    }
}
