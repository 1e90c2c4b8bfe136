//! Play Session
//!
//! Owns the one [`WorldState`] and everything around it: level loading
//! (the Loading phase), edge detection, the progress store, the unlock
//! table, and the input recording of the current level attempt.
//!
//! Level loads always build a fresh world, so no timer from a previous
//! attempt survives a restart or a level change.

use chrono::Utc;
use tracing::{info, warn};

use crate::core::fixed::Fixed;
use crate::game::config::SimConfig;
use crate::game::events::GameEvent;
use crate::game::input::{EdgeDetector, InputFrame, InputRecording};
use crate::game::level::{load_world, Carryover, LevelProvider};
use crate::game::persistence::{ProgressStore, SaveData};
use crate::game::progression::{LevelProgress, ProgressTracker};
use crate::game::state::{GamePhase, WorldState};
use crate::game::tick::{replay_level, tick, TickResult};

/// A single-player session.
pub struct Session<P: LevelProvider, S: ProgressStore> {
    config: SimConfig,
    provider: P,
    store: S,
    progress: LevelProgress,
    session_seed: u64,
    edges: EdgeDetector,
    fresh_level: bool,
    state: WorldState,
    level_start: WorldState,
    recording: InputRecording,
    frame_index: u32,
    finished: bool,
}

impl<P: LevelProvider, S: ProgressStore> Session<P, S> {
    /// Start a session, resuming from the store when it holds a save.
    pub fn new(config: SimConfig, provider: P, store: S, session_seed: u64) -> Self {
        let saved = match store.load() {
            Ok(saved) => saved,
            Err(err) => {
                warn!(error = %err, "could not read saved progress, starting fresh");
                None
            }
        };

        let (world, level, carry, progress) = match &saved {
            Some(data) => (data.world, data.level, data.carryover(&config), data.progress()),
            None => (0, 0, Carryover::new_game(&config), LevelProgress::new()),
        };

        let state = load_world(&provider, world, level, session_seed, &carry, &config);
        let mut session = Self {
            level_start: state.clone(),
            state,
            recording: InputRecording::new(world, level, session_seed),
            config,
            provider,
            store,
            progress,
            session_seed,
            edges: EdgeDetector::new(),
            fresh_level: true,
            frame_index: 0,
            finished: false,
        };
        session.enter_level();
        session
    }

    /// Advance one frame.
    pub fn step(&mut self, frame: InputFrame, dt: Fixed) -> TickResult {
        if self.state.phase == GamePhase::Loading {
            self.restart_level();
        }

        if self.fresh_level {
            self.edges.reset(frame);
            self.fresh_level = false;
        }
        self.recording.record(self.frame_index, frame);
        self.frame_index += 1;

        let input = self.edges.sample(frame);
        let result = tick(&mut self.state, &input, dt, &self.config);

        if result.save_requested {
            self.persist();
        }
        if result.level_complete && !self.finished {
            self.advance();
        }
        result
    }

    /// The live world.
    pub fn state(&self) -> &WorldState {
        &self.state
    }

    /// Unlock table.
    pub fn progress(&self) -> &LevelProgress {
        &self.progress
    }

    /// Progress store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Simulation tunables.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Inputs recorded since the current level attempt began.
    pub fn recording(&self) -> &InputRecording {
        &self.recording
    }

    /// The last level of the last world has been completed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Re-run the current attempt from its recording and check that it
    /// lands on the live world's hash.
    pub fn verify_replay(&self) -> bool {
        if self.frame_index == 0 {
            return self.level_start.compute_hash() == self.state.compute_hash();
        }
        let (replayed, _) = replay_level(self.level_start.clone(), &self.recording, &self.config);
        replayed.compute_hash() == self.state.compute_hash()
    }

    /// Jump to a level. Locked levels are refused.
    pub fn select_level(&mut self, world: u8, level: u8) -> bool {
        if !self.progress.is_unlocked(world, level) {
            warn!(world, level, "level is locked");
            return false;
        }
        let carry = self.carryover();
        self.load(world, level, carry);
        true
    }

    fn carryover(&self) -> Carryover {
        let player = &self.state.player;
        Carryover {
            score: self.state.score,
            lives: player.lives,
            max_health: player.max_health,
            abilities: player.abilities,
        }
    }

    /// Reload the current level with a new game's score and lives.
    fn restart_level(&mut self) {
        let (world, level) = (self.state.world_index, self.state.level_index);
        info!(world, level, "restarting level");
        let carry = Carryover {
            abilities: self.state.player.abilities,
            ..Carryover::new_game(&self.config)
        };
        self.load(world, level, carry);
    }

    /// Unlock and load the next level, or finish the game.
    fn advance(&mut self) {
        let (world, level) = (self.state.world_index, self.state.level_index);
        match self.progress.advance_level(world, level) {
            Some((next_world, next_level)) => {
                let carry = self.carryover();
                self.load(next_world, next_level, carry);
            }
            None => {
                info!(score = self.state.score, "final level complete");
                self.finished = true;
                self.persist();
            }
        }
    }

    fn load(&mut self, world: u8, level: u8, carry: Carryover) {
        self.state = load_world(&self.provider, world, level, self.session_seed, &carry, &self.config);
        self.recording = InputRecording::new(self.state.world_index, self.state.level_index, self.session_seed);
        self.enter_level();
    }

    /// Loading → Playing for a freshly built world.
    fn enter_level(&mut self) {
        let from = self.state.phase;
        self.state.phase = GamePhase::Playing;
        self.level_start = self.state.clone();
        self.frame_index = 0;
        self.fresh_level = true;

        let tick = self.state.tick;
        self.state.push_event(GameEvent::phase_changed(tick, from, GamePhase::Playing));
        info!(world = self.state.world_index, level = self.state.level_index, "level started");
        self.persist();
    }

    fn persist(&mut self) {
        let data = SaveData::capture(&self.state, &self.progress, Utc::now());
        if let Err(err) = self.store.save(&data) {
            warn!(error = %err, "could not save progress");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use crate::core::fixed::{from_int, FRAME_DT};
    use crate::core::vec2::FixedVec2;
    use crate::error::{LevelError, StoreError};
    use crate::game::events::GameEventData;
    use crate::game::input::Action;
    use crate::game::level::{fallback_level, GeneratedLevels, LevelData};
    use crate::game::persistence::MemoryStore;

    /// Every level is the fallback level with the exit right by the spawn.
    struct ShortLevels;

    impl LevelProvider for ShortLevels {
        fn load(&self, _world: u8, _level: u8) -> Result<LevelData, LevelError> {
            let mut data = fallback_level();
            data.exit = vec![300.0, 500.0];
            Ok(data)
        }
    }

    struct FailingStore;

    impl ProgressStore for FailingStore {
        fn save(&mut self, _data: &SaveData) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk full")))
        }

        fn load(&self) -> Result<Option<SaveData>, StoreError> {
            Err(StoreError::Io(std::io::Error::other("unreadable")))
        }
    }

    /// Run right until the first level completes.
    fn run_to_exit(session: &mut Session<ShortLevels, MemoryStore>) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for _ in 0..300 {
            let result = session.step(InputFrame::holding(&[Action::MoveRight]), FRAME_DT);
            events.extend(result.events);
            if result.level_complete {
                break;
            }
        }
        events
    }

    #[test]
    fn test_starts_playing_and_saves() {
        let session = Session::new(SimConfig::default(), ShortLevels, MemoryStore::new(), 1);
        assert_eq!(session.state().phase, GamePhase::Playing);
        assert_eq!(session.store().writes(), 1);
    }

    #[test]
    fn test_level_complete_loads_next() {
        let mut session = Session::new(SimConfig::default(), ShortLevels, MemoryStore::new(), 1);
        let events = run_to_exit(&mut session);

        assert!(events.iter().any(|e| matches!(e.data, GameEventData::LevelComplete { level: 0, .. })));
        assert_eq!(session.state().level_index, 1);
        assert!(session.progress().is_unlocked(0, 1));
        let saved = session.store().load().unwrap().unwrap();
        assert_eq!((saved.world, saved.level), (0, 1));
    }

    #[test]
    fn test_resumes_from_save() {
        let mut first = Session::new(SimConfig::default(), ShortLevels, MemoryStore::new(), 1);
        run_to_exit(&mut first);
        let store = first.store().clone();

        let second = Session::new(SimConfig::default(), ShortLevels, store, 1);
        assert_eq!(second.state().level_index, 1);
        assert!(second.progress().is_unlocked(0, 1));
    }

    #[test]
    fn test_locked_level_refused() {
        let mut session = Session::new(SimConfig::default(), ShortLevels, MemoryStore::new(), 1);
        assert!(!session.select_level(3, 2));
        assert_eq!(session.state().world_index, 0);
        assert!(session.select_level(0, 0));
    }

    #[test]
    fn test_restart_after_game_over() {
        let config = SimConfig::default();
        let mut session = Session::new(config.clone(), ShortLevels, MemoryStore::new(), 1);

        // Drop into the void with the last life
        session.state.player.lives = 1;
        session.state.player.position = FixedVec2::new(from_int(100), from_int(900));
        session.step(InputFrame::new(), FRAME_DT);
        assert_eq!(session.state().phase, GamePhase::GameOver);

        session.step(InputFrame::holding(&[Action::Restart]), FRAME_DT);
        assert_eq!(session.state().phase, GamePhase::Loading);

        // Next frame rebuilds the level with a new game's lives
        session.step(InputFrame::new(), FRAME_DT);
        assert_eq!(session.state().phase, GamePhase::Playing);
        assert_eq!(session.state().player.lives, config.player.starting_lives);
        assert_eq!(session.state().score, 0);
    }

    #[test]
    fn test_store_failures_do_not_stop_play() {
        let mut session = Session::new(SimConfig::default(), ShortLevels, FailingStore, 1);
        session.step(InputFrame::holding(&[Action::MoveRight]), FRAME_DT);
        assert_eq!(session.state().phase, GamePhase::Playing);
    }

    #[test]
    fn test_randomized_session_replays_exactly() {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        let provider = GeneratedLevels::new(42, 600.0);
        let mut session = Session::new(SimConfig::default(), provider, MemoryStore::new(), 42);

        // Movement, jump, attack, dash, dig, bark, and pause
        let mut frame = InputFrame::new();
        for _ in 0..600 {
            if rng.gen_bool(0.2) {
                frame = InputFrame::from_bits(rng.gen_range(0..0x100));
            }
            let result = session.step(frame, FRAME_DT);
            assert!(result.snapshot.player.health <= result.snapshot.player.max_health);
            if result.level_complete || session.state().phase == GamePhase::GameOver {
                break;
            }
        }

        assert!(session.verify_replay());
    }
}
