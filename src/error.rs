//! Error types.
//!
//! None of these ever escape the tick loop: level errors fall back to the
//! built-in level and store errors are logged. They surface at the edges
//! (loading config, reading level files, saving progress).

use thiserror::Error;

/// Level data could not be produced.
#[derive(Debug, Error)]
pub enum LevelError {
    /// No file for this world/level.
    #[error("level file not found: {0}")]
    NotFound(String),

    /// File could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// JSON did not match the level schema.
    #[error("malformed level data at `{path}`: {message}")]
    Malformed {
        /// Path to the offending field
        path: String,
        /// Parser message
        message: String,
    },

    /// Parsed, but the geometry makes no sense.
    #[error("invalid level: {0}")]
    Invalid(String),
}

/// Progress could not be saved or loaded.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("save file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Save file is not valid JSON for the save schema.
    #[error("save file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// JSON did not match the config schema.
    #[error("config error at `{path}`: {message}")]
    Parse {
        /// Path to the offending field
        path: String,
        /// Parser message
        message: String,
    },

    /// Parsed, but unusable.
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}
