//! Checkpoints and Death
//!
//! Checkpoints are one-way: once activated they stay the respawn target
//! until the level reloads. Losing a life (pit fall or health reaching 0)
//! always goes through [`handle_death`].

use tracing::{debug, info};

use crate::core::vec2::FixedVec2;
use crate::game::config::SimConfig;
use crate::game::events::GameEvent;
use crate::game::state::{GamePhase, WorldState};

/// Activate every inactive checkpoint the player is close to.
///
/// Returns true when a checkpoint was activated and progress should be
/// saved.
pub fn activate_checkpoints(state: &mut WorldState, config: &SimConfig) -> bool {
    let radius = config.combat.checkpoint_radius;
    let offset = FixedVec2::new(0, config.player.respawn_offset);
    let position = state.player.position;
    let tick = state.tick;

    let mut activated = Vec::new();
    for checkpoint in state.checkpoints.iter_mut() {
        if checkpoint.activated || !checkpoint.position.within_radius(position, radius) {
            continue;
        }
        checkpoint.activated = true;
        activated.push((checkpoint.id, checkpoint.position - offset));
    }

    for &(id, respawn) in &activated {
        debug!(tick, checkpoint = id, "checkpoint activated");
        state.respawn_point = Some(respawn);
        state.push_event(GameEvent::checkpoint_saved(tick, id, respawn));
    }

    !activated.is_empty()
}

/// Outcome of losing a life.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeathOutcome {
    /// Player reappeared at the respawn target
    Respawned,
    /// No lives left
    GameOver,
}

/// Take one life from the player and respawn or end the game.
pub fn handle_death(state: &mut WorldState, config: &SimConfig) -> DeathOutcome {
    let tick = state.tick;
    state.player.lives = state.player.lives.saturating_sub(1);

    if state.player.lives == 0 {
        state.player.health = 0;
        state.player.velocity = FixedVec2::ZERO;
        state.phase = GamePhase::GameOver;
        info!(tick, score = state.score, "game over");
        let score = state.score;
        state.push_event(GameEvent::game_over(tick, score));
        return DeathOutcome::GameOver;
    }

    let respawn = state.respawn_target();
    let player = &mut state.player;
    player.position = respawn;
    player.prev_position = respawn;
    player.velocity = FixedVec2::ZERO;
    player.grounded = false;
    player.health = player.max_health;
    player.invincible_ticks = config.player.respawn_invincibility_ticks;
    player.attack_cooldown_ticks = 0;
    player.dash_ticks = 0;
    player.dig_ticks = 0;

    // Any swing in progress is cancelled
    state.projectiles.retain(|p| !p.is_melee());

    let lives_left = state.player.lives;
    info!(tick, lives_left, "life lost");
    state.push_event(GameEvent::life_lost(tick, lives_left, respawn));
    DeathOutcome::Respawned
}
