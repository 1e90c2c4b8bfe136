//! Authoritative Simulation Tick
//!
//! One call advances the world by one frame. The phase order is fixed:
//! timers, enemy AI, physics, collision (pit falls go straight to the
//! death handler), pickups, combat, camera, checkpoints, exit check, then
//! compaction. Paused and GameOver run none of it but still produce a
//! snapshot.
//!
//! Given the same starting world and the same input stream the result is
//! bit-identical: fixed-point math, index-ordered entity lists, and one
//! seeded RNG.

use tracing::{debug, info, warn};

use crate::core::fixed::{Fixed, FRAME_DT};
use crate::game::camera;
use crate::game::checkpoint::{self, DeathOutcome};
use crate::game::collision;
use crate::game::combat;
use crate::game::config::SimConfig;
use crate::game::enemy_ai;
use crate::game::events::GameEvent;
use crate::game::input::{Action, EdgeDetector, InputRecording, InputState};
use crate::game::physics;
use crate::game::progression;
use crate::game::snapshot::RenderSnapshot;
use crate::game::state::{GamePhase, WorldState};

/// Result of a tick.
#[derive(Clone, Debug)]
pub struct TickResult {
    /// Events generated this tick, ordered by priority
    pub events: Vec<GameEvent>,
    /// A checkpoint was activated; progress should be persisted
    pub save_requested: bool,
    /// The exit was reached this tick or earlier
    pub level_complete: bool,
    /// What to draw
    pub snapshot: RenderSnapshot,
}

/// Clamp a frame delta into `[0, max_dt]`.
pub fn clamp_dt(dt: Fixed, max_dt: Fixed) -> Fixed {
    let clamped = dt.clamp(0, max_dt);
    if clamped != dt {
        warn!(dt, max_dt, "frame delta out of range, clamping");
    }
    clamped
}

/// Run one simulation tick.
///
/// Loading is left untouched; the session owns level loading and moves
/// the world to Playing once it is built.
pub fn tick(state: &mut WorldState, input: &InputState, dt: Fixed, config: &SimConfig) -> TickResult {
    let before = state.phase;
    let mut save_requested = false;

    match state.phase {
        GamePhase::Loading => {}
        GamePhase::GameOver => {
            if input.just_pressed(Action::Restart) {
                state.phase = GamePhase::Loading;
            }
        }
        GamePhase::Paused => {
            if input.just_pressed(Action::Pause) {
                state.phase = GamePhase::Playing;
            }
        }
        GamePhase::Playing => {
            if input.just_pressed(Action::Pause) {
                state.phase = GamePhase::Paused;
            } else if !state.level_complete {
                save_requested = update(state, input, clamp_dt(dt, config.physics.max_dt), config);
            }
        }
    }

    if state.phase != before {
        info!(tick = state.tick, from = ?before, to = ?state.phase, "phase changed");
        let (tick, to) = (state.tick, state.phase);
        state.push_event(GameEvent::phase_changed(tick, before, to));
    }

    #[cfg(feature = "debug-tracing")]
    tracing::trace!(tick = state.tick, hash = %hex::encode(state.compute_hash()), "tick");

    TickResult {
        events: state.take_events(),
        save_requested,
        level_complete: state.level_complete,
        snapshot: RenderSnapshot::capture(state),
    }
}

/// The Playing update. Returns true when a checkpoint asked for a save.
fn update(state: &mut WorldState, input: &InputState, dt: Fixed, config: &SimConfig) -> bool {
    // 0. Advance tick counter and every timer
    state.tick += 1;
    state.player.tick_timers();

    // 1. Enemies decide and move
    enemy_ai::step(state, dt, config);

    // 2. Player abilities, movement, platforms, shots
    physics::step(state, input, dt, config);

    // 3. Solids, hidden blocks, ground, pits
    let report = collision::resolve_player(state, config);
    if report.pit_fall && lose_life(state, config) {
        return false;
    }
    collision::collect_pickups(state, config);

    // 4. Stomps, swings, contact, shots, hazards
    let combat = combat::resolve(state, input, config);
    if !combat.defeated.is_empty() {
        debug!(tick = state.tick, defeated = ?combat.defeated, "enemies defeated");
    }
    if combat.player_died && lose_life(state, config) {
        return false;
    }

    // 5. Camera
    camera::follow(state, &config.viewport, dt);

    // 6. Checkpoints and the exit
    let saved = checkpoint::activate_checkpoints(state, config);
    progression::check_exit(state);

    state.compact();
    saved
}

/// Take a life. Returns true when the game is over; the world is compacted
/// so the final snapshot shows no defeated enemies.
fn lose_life(state: &mut WorldState, config: &SimConfig) -> bool {
    match checkpoint::handle_death(state, config) {
        DeathOutcome::Respawned => false,
        DeathOutcome::GameOver => {
            state.compact();
            true
        }
    }
}

/// Replay a recorded level attempt from its starting world.
///
/// The first frame of a level never produces rising edges, matching the
/// session. Every frame advances by [`FRAME_DT`].
///
/// Returns the final world and every event generated.
pub fn replay_level(
    initial: WorldState,
    recording: &InputRecording,
    config: &SimConfig,
) -> (WorldState, Vec<GameEvent>) {
    let mut state = initial;
    let mut edges = EdgeDetector::new();
    let mut events = Vec::new();

    for (frame_index, frame) in recording.replay_iter() {
        if frame_index == recording.start_tick {
            edges.reset(frame);
        }
        let input = edges.sample(frame);
        let result = tick(&mut state, &input, FRAME_DT, config);
        events.extend(result.events);

        if state.phase == GamePhase::Loading || result.level_complete {
            break;
        }
    }

    (state, events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use crate::core::fixed::{from_int, FIXED_ONE};
    use crate::core::vec2::FixedVec2;
    use crate::game::events::GameEventData;
    use crate::game::input::InputFrame;
    use crate::game::level::{build_world, generate, Carryover, LevelData, MAX_EXTENT};
    use crate::game::state::{Enemy, EnemyKind, Exit, Faction, LevelBounds, PlayerState, Projectile};

    fn world() -> WorldState {
        let spawn = FixedVec2::from_ints(100, 530);
        let mut w = WorldState::new(5, spawn, PlayerState::new(spawn, 3, 3));
        w.bounds = LevelBounds { min: 0, max: from_int(3000) };
        w.exit = Exit { position: FixedVec2::from_ints(2900, 500), trigger_width: from_int(70) };
        w.phase = GamePhase::Playing;
        w
    }

    fn press(edges: &mut EdgeDetector, actions: &[Action]) -> InputState {
        edges.sample(InputFrame::holding(actions))
    }

    #[test]
    fn test_dt_clamped() {
        let max = 3 * FIXED_ONE;
        assert_eq!(clamp_dt(10 * FIXED_ONE, max), max);
        assert_eq!(clamp_dt(-FIXED_ONE, max), 0);
        assert_eq!(clamp_dt(FIXED_ONE, max), FIXED_ONE);
    }

    #[test]
    fn test_pause_double_edge_returns_to_playing() {
        let config = SimConfig::default();
        let mut w = world();
        let mut edges = EdgeDetector::new();
        w.player.invincible_ticks = 30;
        w.enemies.push(Enemy::new(0, EnemyKind::Cat, FixedVec2::from_ints(1500, 530), 2 * FIXED_ONE));
        w.projectiles.push(Projectile {
            id: 0,
            position: FixedVec2::from_ints(1000, 400),
            velocity: FixedVec2::from_ints(-6, 0),
            size: FixedVec2::from_ints(10, 10),
            faction: Faction::Enemy,
            ttl: None,
            damage: 1,
            spent: false,
        });

        let r = tick(&mut w, &press(&mut edges, &[Action::Pause]), FRAME_DT, &config);
        assert_eq!(w.phase, GamePhase::Paused);
        assert!(matches!(
            r.events[0].data,
            GameEventData::PhaseChanged { from: GamePhase::Playing, to: GamePhase::Paused }
        ));
        let (enemy_at, shot_at) = (w.enemies[0].position, w.projectiles[0].position);

        // Holding the key is not a second toggle; timers and bodies stay frozen
        for _ in 0..10 {
            let r = tick(&mut w, &press(&mut edges, &[Action::Pause]), FRAME_DT, &config);
            assert_eq!(r.snapshot.enemies.len(), 1);
            assert_eq!(r.snapshot.projectiles.len(), 1);
        }
        assert_eq!(w.phase, GamePhase::Paused);
        assert_eq!(w.player.invincible_ticks, 30);
        assert_eq!(w.tick, 0);
        assert_eq!(w.enemies[0].position, enemy_at);
        assert_eq!(w.projectiles[0].position, shot_at);

        tick(&mut w, &press(&mut edges, &[]), FRAME_DT, &config);
        let r = tick(&mut w, &press(&mut edges, &[Action::Pause]), FRAME_DT, &config);
        assert_eq!(w.phase, GamePhase::Playing);
        assert_eq!(r.snapshot.phase, GamePhase::Playing);
    }

    #[test]
    fn test_level_at_coordinate_limit_runs() {
        let config = SimConfig::default();
        let json = format!(
            r#"{{
                "playerSpawn": [{spawn}, 500],
                "bounds": {{ "min": -{max}, "max": {max} }},
                "exit": [{max}, 500],
                "enemies": [
                    {{ "position": [{drone}, 350], "type": "drone" }},
                    {{ "position": [{cat}, 500], "type": "cat", "patrolArea": [-{max}, {max}] }}
                ]
            }}"#,
            max = MAX_EXTENT,
            spawn = MAX_EXTENT - 400.0,
            drone = MAX_EXTENT - 10.0,
            cat = MAX_EXTENT - 200.0,
        );
        let data = LevelData::from_json_str(&json).unwrap();
        let mut w = build_world(&data, 0, 0, 3, &Carryover::new_game(&config), &config).unwrap();
        w.phase = GamePhase::Playing;

        let mut edges = EdgeDetector::new();
        for _ in 0..600 {
            let r = tick(&mut w, &press(&mut edges, &[Action::MoveRight]), FRAME_DT, &config);
            if r.level_complete || w.phase != GamePhase::Playing {
                break;
            }
        }
        assert!(w.player.position.x <= from_int(MAX_EXTENT as i32 + 100));
    }

    #[test]
    fn test_game_over_accepts_only_restart() {
        let config = SimConfig::default();
        let mut w = world();
        w.phase = GamePhase::GameOver;
        let mut edges = EdgeDetector::new();

        tick(&mut w, &press(&mut edges, &[Action::Pause, Action::Jump]), FRAME_DT, &config);
        assert_eq!(w.phase, GamePhase::GameOver);
        tick(&mut w, &press(&mut edges, &[Action::Restart]), FRAME_DT, &config);
        assert_eq!(w.phase, GamePhase::Loading);
    }

    #[test]
    fn test_defeated_enemy_gone_same_tick() {
        let config = SimConfig::default();
        let mut w = world();
        let mut cat = Enemy::new(0, EnemyKind::Cat, FixedVec2::from_ints(130, 530), FIXED_ONE);
        cat.health = 1;
        w.enemies.push(cat);

        let mut edges = EdgeDetector::new();
        let r = tick(&mut w, &press(&mut edges, &[Action::Attack]), FRAME_DT, &config);

        assert!(w.enemies.is_empty());
        assert!(r.snapshot.enemies.is_empty());
        assert!(r.events.iter().any(|e| matches!(e.data, GameEventData::EnemyDefeated { .. })));
        assert_eq!(w.score, config.combat.enemy_points);
    }

    #[test]
    fn test_boss_gate_through_tick() {
        let config = SimConfig::default();
        let mut w = world();
        w.level_index = 4;
        w.boss_level = true;
        w.exit = Exit { position: FixedVec2::from_ints(100, 500), trigger_width: from_int(70) };
        let mut boss = Enemy::new(0, EnemyKind::Boss, FixedVec2::from_ints(1500, 500), 0);
        boss.health = 10;
        w.enemies.push(boss);

        let mut edges = EdgeDetector::new();
        let r = tick(&mut w, &press(&mut edges, &[]), FRAME_DT, &config);
        assert!(!r.level_complete);
        assert!(r.events.iter().any(|e| matches!(e.data, GameEventData::ExitBlocked)));

        w.enemies[0].health = 0;
        let r = tick(&mut w, &press(&mut edges, &[]), FRAME_DT, &config);
        assert!(r.level_complete);
        assert!(r.events.iter().any(|e| matches!(e.data, GameEventData::LevelComplete { level: 4, .. })));

        // A finished level no longer advances
        let at = w.tick;
        tick(&mut w, &press(&mut edges, &[Action::MoveRight]), FRAME_DT, &config);
        assert_eq!(w.tick, at);
    }

    #[test]
    fn test_replay_matches_live_run() {
        let config = SimConfig::default();
        let data = generate(77, 0, 1, 600.0);
        let start = build_world(&data, 0, 1, 77, &Carryover::new_game(&config), &config).unwrap();
        let mut live = start.clone();
        live.phase = GamePhase::Playing;

        let script = [
            InputFrame::holding(&[Action::MoveRight]),
            InputFrame::holding(&[Action::MoveRight, Action::Jump]),
            InputFrame::holding(&[Action::Attack]),
            InputFrame::holding(&[Action::Dash, Action::MoveRight]),
        ];
        let mut recording = InputRecording::new(0, 1, 77);
        let mut edges = EdgeDetector::new();
        for i in 0..240u32 {
            let frame = script[(i / 20) as usize % script.len()];
            recording.record(i, frame);
            if i == 0 {
                edges.reset(frame);
            }
            tick(&mut live, &edges.sample(frame), FRAME_DT, &config);
        }

        let mut replay_start = start;
        replay_start.phase = GamePhase::Playing;
        let (replayed, _) = replay_level(replay_start, &recording, &config);
        assert_eq!(replayed.compute_hash(), live.compute_hash());
    }

    proptest! {
        #[test]
        fn prop_health_stays_in_range(seed in any::<u64>(), frames in prop::collection::vec(0u16..0x80, 1..300)) {
            let config = SimConfig::default();
            let data = generate(seed, 1, 4, 600.0);
            let mut w = build_world(&data, 1, 4, seed, &Carryover::new_game(&config), &config).unwrap();
            w.phase = GamePhase::Playing;
            let mut edges = EdgeDetector::new();

            for bits in frames {
                let r = tick(&mut w, &edges.sample(InputFrame::from_bits(bits)), FRAME_DT, &config);
                prop_assert!(w.player.health <= w.player.max_health);
                prop_assert!(r.snapshot.player.health <= r.snapshot.player.max_health);
                prop_assert!(w.enemies.iter().all(|e| e.health > 0));
                if w.phase == GamePhase::GameOver {
                    prop_assert_eq!(w.player.lives, 0);
                    break;
                }
            }
        }
    }
}
