//! Kaya Simulation Demo
//!
//! Runs a scripted session headless, logs gameplay events, and checks
//! that the recorded inputs replay to the same state hash.
//!
//! ```text
//! kaya-sim [CONFIG_JSON] [LEVELS_DIR] [SAVE_FILE] [REPLAY_FILE]
//! ```
//!
//! Without a levels directory, levels are generated from the seed. Without
//! a save file, progress is kept in memory. With a replay file, the input
//! recording of the last level attempt is written there (JSON for `.json`
//! paths, bincode otherwise) and read back. `RUST_LOG` controls verbosity.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use kaya::{
    TICK_RATE, VERSION,
    core::fixed::FRAME_DT,
    game::{
        config::SimConfig,
        input::{Action, InputFrame, InputRecording},
        level::{GeneratedLevels, JsonLevelDirectory, LevelProvider},
        persistence::{JsonFileStore, MemoryStore, ProgressStore},
        session::Session,
        state::GamePhase,
    },
};

/// Session seed for the demo run.
const DEMO_SEED: u64 = 12345;

/// Frames to simulate (two minutes of play).
const DEMO_FRAMES: u32 = 120 * TICK_RATE;

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to install tracing subscriber")?;

    info!("Kaya Simulation v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => SimConfig::from_json_file(path.as_ref()).with_context(|| format!("loading config {path}"))?,
        None => SimConfig::default(),
    };

    let provider: Box<dyn LevelProvider> = match args.next() {
        Some(dir) => {
            info!("Levels: {}", dir);
            Box::new(JsonLevelDirectory::new(dir))
        }
        None => {
            info!("Levels: generated (seed {})", DEMO_SEED);
            Box::new(GeneratedLevels::new(DEMO_SEED, kaya::core::fixed::to_float(config.viewport.height) as f64))
        }
    };

    let store: Box<dyn ProgressStore> = match args.next() {
        Some(path) => Box::new(JsonFileStore::new(PathBuf::from(path))),
        None => Box::new(MemoryStore::new()),
    };
    let replay_path = args.next().map(PathBuf::from);

    demo_session(config, provider, store, replay_path.as_deref())
}

/// Scripted input: run right, hopping and swinging on a fixed rhythm, with
/// the odd dash and bark.
fn scripted_frame(frame: u32) -> InputFrame {
    let mut input = InputFrame::new().with(Action::MoveRight);
    let beat = frame % 90;
    input.set(Action::Jump, (10..28).contains(&beat));
    input.set(Action::Attack, beat == 40 || beat == 75);
    input.set(Action::Dash, frame % 240 == 120);
    input.set(Action::Bark, frame % 300 == 200);
    input.set(Action::Restart, frame % 60 == 0);
    input
}

fn demo_session(
    config: SimConfig,
    provider: Box<dyn LevelProvider>,
    store: Box<dyn ProgressStore>,
    replay_path: Option<&Path>,
) -> Result<()> {
    info!("=== Starting Demo Session ===");

    let mut session = Session::new(config, provider, store, DEMO_SEED);
    let mut total_events = 0usize;
    let mut levels_cleared = 0u32;

    for frame in 0..DEMO_FRAMES {
        let result = session.step(scripted_frame(frame), FRAME_DT);

        for event in &result.events {
            debug!(tick = event.tick, cue = ?event.cue(), "{:?}", event.data);
        }
        total_events += result.events.len();

        if result.level_complete {
            levels_cleared += 1;
        }
        if frame % (10 * TICK_RATE) == 0 {
            let snapshot = &result.snapshot;
            info!(
                "Frame {}: world {} level {} x={:.1} health {}/{} lives {} score {}",
                frame,
                snapshot.world,
                snapshot.level,
                snapshot.player.rect.x,
                snapshot.player.health,
                snapshot.player.max_health,
                snapshot.player.lives,
                snapshot.score,
            );
        }
        if session.is_finished() {
            info!("All worlds complete at frame {}", frame);
            break;
        }
    }

    let state = session.state();
    info!("=== Session Complete ===");
    info!("World {} level {} ({:?})", state.world_index, state.level_index, state.phase);
    info!("Score: {}  Lives: {}", state.score, state.player.lives);
    info!("Levels cleared: {}", levels_cleared);
    info!("Total events: {}", total_events);
    info!("State hash: {}", hex::encode(state.compute_hash()));
    info!("Input hash: {}", hex::encode(session.recording().compute_hash()));
    info!("Recorded input changes: {}", session.recording().delta_count());
    if let Some(path) = replay_path {
        write_replay(path, session.recording())?;
    }

    info!("=== Verifying Replay ===");
    if state.phase == GamePhase::Loading {
        info!("Level is reloading, nothing to replay");
        return Ok(());
    }
    if !session.verify_replay() {
        bail!("replay diverged from the live session");
    }
    info!("Replay matches: deterministic");
    Ok(())
}

/// Write the recording and read it back, checking nothing was lost.
fn write_replay(path: &Path, recording: &InputRecording) -> Result<()> {
    let as_json = path.extension().is_some_and(|ext| ext == "json");
    let bytes = if as_json {
        recording.to_json()?.into_bytes()
    } else {
        recording.to_bytes()?
    };
    fs::write(path, &bytes).with_context(|| format!("writing replay {}", path.display()))?;

    let raw = fs::read(path).with_context(|| format!("reading replay {}", path.display()))?;
    let restored = if as_json {
        InputRecording::from_json(std::str::from_utf8(&raw)?)?
    } else {
        InputRecording::from_bytes(&raw)?
    };
    if restored.compute_hash() != recording.compute_hash() {
        bail!("replay file {} does not match the recording", path.display());
    }
    info!("Replay written: {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}
