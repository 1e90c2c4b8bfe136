//! Physics Integration
//!
//! Player movement, abilities, moving platforms, and enemy projectile
//! travel. Everything scales by `dt` where `FIXED_ONE` is one 60 fps frame;
//! tick-counted timers advance once per Playing tick regardless of `dt`.

use tracing::debug;

use crate::core::fixed::{Fixed, FIXED_ONE, fixed_mul, fixed_sin, to_fixed};
use crate::core::vec2::FixedVec2;
use crate::game::config::{PhysicsConfig, SimConfig};
use crate::game::events::GameEvent;
use crate::game::input::{Action, InputState};
use crate::game::state::{AbilityKind, Axis, Faction, Platform, PlayerState, WorldState};

/// Extra multiplier per ability level above 1 (dash speed, bark radius).
const LEVEL_STEP: Fixed = to_fixed(0.25);

/// Multiplier for an ability at `level`: `base + 0.25 * (level - 1)`.
#[inline]
fn level_scaled(base: Fixed, level: u8) -> Fixed {
    base + LEVEL_STEP * (level.max(1) as i32 - 1)
}

// =============================================================================
// PHASE ENTRY
// =============================================================================

/// Run the physics phase: abilities, player integration, platforms, shots.
pub fn step(state: &mut WorldState, input: &InputState, dt: Fixed, config: &SimConfig) {
    use_abilities(state, input, config);
    integrate_player(&mut state.player, input, dt, &config.physics);
    advance_platforms(&mut state.platforms, dt);
    advance_projectiles(state, dt);
}

// =============================================================================
// ABILITIES
// =============================================================================

/// Trigger dash, dig, and bark on their rising edges.
pub fn use_abilities(state: &mut WorldState, input: &InputState, config: &SimConfig) {
    let tick = state.tick;
    let tuning = &config.player;

    if input.just_pressed(Action::Dash)
        && state.player.grounded
        && state.player.dash_cooldown_ticks == 0
    {
        state.player.dash_ticks = tuning.dash_ticks;
        state.player.dash_cooldown_ticks = tuning.dash_cooldown_ticks;
        state.push_event(GameEvent::ability_used(tick, AbilityKind::Dash));
    }

    if input.just_pressed(Action::Dig) && state.player.grounded && !state.player.is_hidden() {
        let level = state.player.abilities.dig.max(1) as u32;
        state.player.dig_ticks = tuning.dig_ticks * level;
        state.push_event(GameEvent::ability_used(tick, AbilityKind::Dig));
    }

    if input.just_pressed(Action::Bark) && state.player.bark_cooldown_ticks == 0 {
        state.player.bark_cooldown_ticks = tuning.bark_cooldown_ticks;
        let radius = fixed_mul(tuning.bark_radius, level_scaled(FIXED_ONE, state.player.abilities.bark));
        let origin = state.player.position;

        let mut stunned = 0u32;
        for enemy in state.enemies.iter_mut().filter(|e| e.is_alive()) {
            if enemy.position.within_radius(origin, radius) {
                enemy.stunned_ticks = tuning.bark_stun_ticks;
                enemy.velocity = FixedVec2::ZERO;
                stunned += 1;
            }
        }
        debug!(tick, stunned, "bark");
        state.push_event(GameEvent::ability_used(tick, AbilityKind::Bark));
    }
}

// =============================================================================
// PLAYER
// =============================================================================

/// Apply input, gravity, and velocity to the player.
pub fn integrate_player(player: &mut PlayerState, input: &InputState, dt: Fixed, tuning: &PhysicsConfig) {
    // Horizontal
    let direction = input.horizontal();
    if direction != 0 {
        let mut speed = tuning.move_speed;
        if player.is_dashing() {
            speed = fixed_mul(speed, level_scaled(tuning.dash_multiplier, player.abilities.dash));
        }
        if player.is_hidden() {
            speed = fixed_mul(speed, tuning.dig_speed_factor);
        }
        player.velocity.x = speed * direction;
        player.facing = direction as i8;
    } else {
        player.velocity.x = fixed_mul(player.velocity.x, tuning.friction);
    }

    // Jump
    if input.just_pressed(Action::Jump) && player.grounded {
        player.velocity.y = -tuning.jump_velocity;
        player.grounded = false;
    }

    // Variable-height gravity
    let gravity = if player.velocity.y < 0 {
        if input.is_held(Action::Jump) {
            tuning.gravity_rise_held
        } else {
            tuning.gravity_rise
        }
    } else {
        tuning.gravity_fall
    };
    player.velocity.y += fixed_mul(gravity, dt);
    if player.velocity.y > tuning.max_fall_speed {
        player.velocity.y = tuning.max_fall_speed;
    }

    player.prev_position = player.position;
    player.position = player.position + player.velocity.scale(dt);
}

// =============================================================================
// PLATFORMS & PROJECTILES
// =============================================================================

/// Advance moving platforms along their oscillation axis.
pub fn advance_platforms(platforms: &mut [Platform], dt: Fixed) {
    for platform in platforms.iter_mut().filter(|p| p.moving) {
        platform.phase = (platform.phase + fixed_mul(platform.speed, dt)) & (FIXED_ONE - 1);
        let offset = fixed_mul(fixed_sin(platform.phase), platform.range);
        platform.position = match platform.axis {
            Axis::X => FixedVec2::new(platform.origin.x + offset, platform.origin.y),
            Axis::Y => FixedVec2::new(platform.origin.x, platform.origin.y + offset),
        };
    }
}

/// Move enemy shots in a straight line.
///
/// Melee hitboxes are anchored to the player by combat instead.
pub fn advance_projectiles(state: &mut WorldState, dt: Fixed) {
    for projectile in state
        .projectiles
        .iter_mut()
        .filter(|p| p.faction == Faction::Enemy && !p.spent)
    {
        projectile.position = projectile.position + projectile.velocity.scale(dt);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{from_int, FRAME_DT, GRAVITY_FALL, JUMP_VELOCITY, MOVE_SPEED};
    use crate::game::input::InputFrame;
    use crate::game::state::{Enemy, EnemyKind};

    fn input(prev: &[Action], cur: &[Action]) -> InputState {
        InputState::from_frames(InputFrame::holding(prev), InputFrame::holding(cur))
    }

    fn grounded_player() -> PlayerState {
        let mut player = PlayerState::new(FixedVec2::from_ints(100, 100), 3, 3);
        player.grounded = true;
        player
    }

    #[test]
    fn test_run_and_friction() {
        let tuning = PhysicsConfig::default();
        let mut player = grounded_player();

        integrate_player(&mut player, &input(&[], &[Action::MoveRight]), FRAME_DT, &tuning);
        assert_eq!(player.velocity.x, MOVE_SPEED);
        assert_eq!(player.position.x, from_int(105));
        assert_eq!(player.facing, 1);

        integrate_player(&mut player, &input(&[Action::MoveRight], &[]), FRAME_DT, &tuning);
        assert_eq!(player.velocity.x, fixed_mul(MOVE_SPEED, tuning.friction));
        assert_eq!(player.facing, 1);
    }

    #[test]
    fn test_jump_requires_edge_and_ground() {
        let tuning = PhysicsConfig::default();

        let mut player = grounded_player();
        integrate_player(&mut player, &input(&[], &[Action::Jump]), FRAME_DT, &tuning);
        assert_eq!(player.velocity.y, -JUMP_VELOCITY + tuning.gravity_rise_held);
        assert!(!player.grounded);

        // Held, not pressed: no jump
        let mut player = grounded_player();
        integrate_player(&mut player, &input(&[Action::Jump], &[Action::Jump]), FRAME_DT, &tuning);
        assert_eq!(player.velocity.y, GRAVITY_FALL);

        // Airborne: no jump
        let mut player = grounded_player();
        player.grounded = false;
        integrate_player(&mut player, &input(&[], &[Action::Jump]), FRAME_DT, &tuning);
        assert_eq!(player.velocity.y, GRAVITY_FALL);
    }

    #[test]
    fn test_gravity_bands() {
        let tuning = PhysicsConfig::default();
        let mut player = grounded_player();
        player.grounded = false;

        player.velocity.y = from_int(-6);
        integrate_player(&mut player, &input(&[], &[]), FRAME_DT, &tuning);
        assert_eq!(player.velocity.y, from_int(-6) + tuning.gravity_rise);

        player.velocity.y = tuning.max_fall_speed;
        integrate_player(&mut player, &input(&[], &[]), FRAME_DT, &tuning);
        assert_eq!(player.velocity.y, tuning.max_fall_speed);
    }

    #[test]
    fn test_prev_position_recorded() {
        let tuning = PhysicsConfig::default();
        let mut player = grounded_player();
        player.grounded = false;
        player.velocity.y = from_int(10);
        integrate_player(&mut player, &input(&[], &[]), FRAME_DT, &tuning);
        assert_eq!(player.prev_position.y, from_int(100));
        assert_eq!(player.position.y, from_int(112));
    }

    #[test]
    fn test_dash_speed_and_cooldown() {
        let config = SimConfig::default();
        let spawn = FixedVec2::from_ints(100, 100);
        let mut w = WorldState::new(1, spawn, grounded_player());
        w.player.abilities.dash = 3;

        let pressed = input(&[], &[Action::Dash, Action::MoveRight]);
        use_abilities(&mut w, &pressed, &config);
        assert_eq!(w.player.dash_ticks, 18);
        assert_eq!(w.player.dash_cooldown_ticks, 60);

        integrate_player(&mut w.player, &pressed, FRAME_DT, &config.physics);
        assert_eq!(w.player.velocity.x, fixed_mul(MOVE_SPEED, to_fixed(2.5)));

        // Second press during cooldown does nothing
        w.player.dash_ticks = 0;
        use_abilities(&mut w, &pressed, &config);
        assert_eq!(w.player.dash_ticks, 0);
    }

    #[test]
    fn test_bark_stuns_nearby_only() {
        let config = SimConfig::default();
        let spawn = FixedVec2::from_ints(100, 100);
        let mut w = WorldState::new(1, spawn, grounded_player());
        w.enemies.push(Enemy::new(0, EnemyKind::Cat, FixedVec2::from_ints(200, 100), FIXED_ONE));
        w.enemies.push(Enemy::new(1, EnemyKind::Cat, FixedVec2::from_ints(400, 100), FIXED_ONE));

        use_abilities(&mut w, &input(&[], &[Action::Bark]), &config);
        assert_eq!(w.enemies[0].stunned_ticks, 120);
        assert_eq!(w.enemies[1].stunned_ticks, 0);
        assert_eq!(w.player.bark_cooldown_ticks, 48);
        assert_eq!(w.take_events().len(), 1);
    }

    #[test]
    fn test_dig_hides_and_slows() {
        let config = SimConfig::default();
        let spawn = FixedVec2::from_ints(100, 100);
        let mut w = WorldState::new(1, spawn, grounded_player());

        let pressed = input(&[], &[Action::Dig, Action::MoveLeft]);
        use_abilities(&mut w, &pressed, &config);
        assert!(w.player.is_hidden());
        assert_eq!(w.player.dig_ticks, 60);

        integrate_player(&mut w.player, &pressed, FRAME_DT, &config.physics);
        assert_eq!(w.player.velocity.x, -fixed_mul(MOVE_SPEED, to_fixed(0.5)));
        assert_eq!(w.player.facing, -1);
    }

    #[test]
    fn test_moving_platform_follows_sine() {
        let origin = FixedVec2::from_ints(300, 200);
        let mut platform = Platform::fixed(origin, FixedVec2::from_ints(100, 20));
        platform.moving = true;
        platform.axis = Axis::Y;
        platform.range = from_int(50);
        platform.speed = FIXED_ONE / 4;

        let mut platforms = vec![platform];
        advance_platforms(&mut platforms, FRAME_DT);
        // Quarter turn: sin = 1 (within approximation error)
        let dy = platforms[0].position.y - origin.y;
        assert!((dy - from_int(50)).abs() < from_int(1));
        assert_eq!(platforms[0].position.x, origin.x);

        advance_platforms(&mut platforms, FRAME_DT);
        assert!((platforms[0].position.y - origin.y).abs() < from_int(1));
    }
}
