//! Enemy Behavior
//!
//! Each [`EnemyKind`] maps to a pure update function in [`BEHAVIORS`]. A
//! behavior reads the enemy and a snapshot of what it can observe, draws
//! from the world RNG, and returns the enemy's next state plus an optional
//! projectile to spawn. The phase applies outcomes after every enemy has
//! been updated (collect-then-apply).

use tracing::trace;

use crate::core::fixed::{Fixed, FIXED_ONE, fixed_mul, fixed_sin, to_fixed};
use crate::core::rng::DeterministicRng;
use crate::core::vec2::FixedVec2;
use crate::game::config::{AiConfig, SimConfig};
use crate::game::state::{Enemy, EnemyKind, Faction, LevelBounds, Projectile, WorldState};

/// Snake wobble rate (turns per frame): one cycle per second.
const WOBBLE_RATE: Fixed = to_fixed(1.0 / 60.0);

/// Drone bob rate: one cycle every two seconds.
const BOB_RATE: Fixed = to_fixed(1.0 / 120.0);

/// Fish swim rate.
const SWIM_RATE: Fixed = to_fixed(1.0 / 90.0);

/// Sharks cruise slower.
const CRUISE_RATE: Fixed = to_fixed(1.0 / 180.0);

/// Enemy shot hitbox.
const SHOT_SIZE: FixedVec2 = FixedVec2::from_ints(10, 10);

/// Everything a behavior may observe this tick.
#[derive(Clone, Copy, Debug)]
pub struct AiContext<'a> {
    /// Player center
    pub player_position: FixedVec2,
    /// Player is dug in
    pub player_hidden: bool,
    /// Frame delta
    pub dt: Fixed,
    /// Current tick
    pub tick: u32,
    /// Level extent
    pub bounds: LevelBounds,
    /// Gravity for hopping enemies
    pub gravity: Fixed,
    /// Behavior tuning
    pub ai: &'a AiConfig,
    /// Shot speed
    pub projectile_speed: Fixed,
    /// Shots only fire at targets this close
    pub shoot_range: Fixed,
}

impl<'a> AiContext<'a> {
    /// Build the context from the world and config.
    pub fn new(state: &WorldState, dt: Fixed, config: &'a SimConfig) -> Self {
        Self {
            player_position: state.player.position,
            player_hidden: state.player.is_hidden(),
            dt,
            tick: state.tick,
            bounds: state.bounds,
            gravity: config.physics.gravity_fall,
            ai: &config.ai,
            projectile_speed: config.combat.projectile_speed,
            shoot_range: config.combat.shoot_range,
        }
    }

    /// Player is visible and within `radius` of `position`.
    #[inline]
    fn sees_player(&self, position: FixedVec2, radius: Fixed) -> bool {
        !self.player_hidden && position.within_radius(self.player_position, radius)
    }
}

/// A projectile an enemy wants to fire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShotRequest {
    /// Spawn point
    pub position: FixedVec2,
    /// Velocity in px/frame
    pub velocity: FixedVec2,
}

/// Result of one behavior update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AiOutcome {
    /// Next state
    pub enemy: Enemy,
    /// Shot to spawn, if any
    pub projectile: Option<ShotRequest>,
}

impl AiOutcome {
    fn moved(enemy: Enemy) -> Self {
        Self { enemy, projectile: None }
    }
}

/// Pure per-kind update.
pub type Behavior = fn(&Enemy, &AiContext<'_>, &mut DeterministicRng) -> AiOutcome;

/// Behavior table indexed by `EnemyKind as usize`.
pub const BEHAVIORS: [Behavior; 8] = [
    cat_behavior,
    frog_behavior,
    snake_behavior,
    drone_behavior,
    mouse_behavior,
    fish_behavior,
    shark_behavior,
    boss_behavior,
];

/// Look up the behavior for a kind.
#[inline]
pub fn behavior_for(kind: EnemyKind) -> Behavior {
    BEHAVIORS[kind as usize]
}

// =============================================================================
// PHASE ENTRY
// =============================================================================

/// Update every living enemy, then spawn requested shots.
pub fn step(state: &mut WorldState, dt: Fixed, config: &SimConfig) {
    let ctx = AiContext::new(state, dt, config);
    let mut shots = Vec::new();

    for index in 0..state.enemies.len() {
        if !state.enemies[index].is_alive() {
            continue;
        }
        let outcome = update_enemy(&state.enemies[index], &ctx, &mut state.rng);
        if let Some(shot) = outcome.projectile {
            shots.push(shot);
        }
        state.enemies[index] = outcome.enemy;
    }

    for shot in shots {
        let id = state.next_projectile_id();
        trace!(tick = state.tick, id, "enemy shot");
        state.projectiles.push(Projectile {
            id,
            position: shot.position,
            velocity: shot.velocity,
            size: SHOT_SIZE,
            faction: Faction::Enemy,
            ttl: None,
            damage: config.combat.hit_damage,
            spent: false,
        });
    }
}

/// Update one enemy: stunned enemies only count down their stun.
pub fn update_enemy(enemy: &Enemy, ctx: &AiContext<'_>, rng: &mut DeterministicRng) -> AiOutcome {
    if enemy.is_stunned() {
        let mut next = enemy.clone();
        next.stunned_ticks -= 1;
        next.velocity = FixedVec2::ZERO;
        return AiOutcome::moved(next);
    }
    behavior_for(enemy.kind)(enemy, ctx, rng)
}

// =============================================================================
// SHARED MOVES
// =============================================================================

/// Walk between the patrol bounds, turning around at either end.
fn patrol(enemy: &mut Enemy, speed: Fixed, dt: Fixed) {
    if enemy.patrol_min >= enemy.patrol_max {
        enemy.velocity.x = 0;
        return;
    }
    enemy.velocity.x = speed * enemy.direction as i32;
    enemy.position.x += fixed_mul(enemy.velocity.x, dt);

    if enemy.position.x <= enemy.patrol_min {
        enemy.position.x = enemy.patrol_min;
        enemy.direction = 1;
    } else if enemy.position.x >= enemy.patrol_max {
        enemy.position.x = enemy.patrol_max;
        enemy.direction = -1;
    }
}

/// Run at the player, staying inside the level.
fn chase(enemy: &mut Enemy, target_x: Fixed, speed: Fixed, ctx: &AiContext<'_>) {
    let dx = target_x - enemy.position.x;
    if dx != 0 {
        enemy.direction = if dx > 0 { 1 } else { -1 };
    }
    enemy.velocity.x = speed * enemy.direction as i32;
    let step = fixed_mul(enemy.velocity.x, ctx.dt);
    // Do not overshoot the target
    enemy.position.x = if step.abs() > dx.abs() {
        target_x
    } else {
        enemy.position.x + step
    };
    keep_in_bounds(enemy, ctx.bounds);
}

/// Oscillate around the home line.
fn oscillate(enemy: &mut Enemy, rate: Fixed, amplitude: Fixed, dt: Fixed) {
    enemy.phase = (enemy.phase + fixed_mul(rate, dt)) & (FIXED_ONE - 1);
    let y = enemy.home_y + fixed_mul(fixed_sin(enemy.phase), amplitude);
    enemy.velocity.y = y - enemy.position.y;
    enemy.position.y = y;
}

/// Fall under gravity back to the home line. Returns true while airborne.
///
/// Only the vertical axis moves here.
fn airborne(enemy: &mut Enemy, ctx: &AiContext<'_>) -> bool {
    if enemy.position.y >= enemy.home_y && enemy.velocity.y >= 0 {
        return false;
    }
    enemy.velocity.y += fixed_mul(ctx.gravity, ctx.dt);
    enemy.position.y += fixed_mul(enemy.velocity.y, ctx.dt);
    if enemy.position.y >= enemy.home_y {
        enemy.position.y = enemy.home_y;
        enemy.velocity.y = 0;
    }
    true
}

/// Clamp an enemy's x into the level.
fn keep_in_bounds(enemy: &mut Enemy, bounds: LevelBounds) {
    let half = enemy.size.x >> 1;
    let low = bounds.min + half;
    let high = (bounds.max - half).max(low);
    enemy.position.x = enemy.position.x.clamp(low, high);
}

/// Count down the shot timer; fire at a visible player in range.
fn try_shoot(
    enemy: &mut Enemy,
    ctx: &AiContext<'_>,
    rng: &mut DeterministicRng,
    interval: (u32, u32),
) -> Option<ShotRequest> {
    let cooldown = enemy.shoot_cooldown?;
    if cooldown > 0 {
        enemy.shoot_cooldown = Some(cooldown - 1);
        return None;
    }
    if !ctx.sees_player(enemy.position, ctx.shoot_range) {
        return None;
    }

    let aim = (ctx.player_position - enemy.position).normalize();
    enemy.shoot_cooldown = Some(rng.next_ticks(interval.0, interval.1));
    Some(ShotRequest {
        position: enemy.position,
        velocity: aim.scale(ctx.projectile_speed),
    })
}

#[inline]
fn flip_sometimes(enemy: &mut Enemy, chance: Fixed, rng: &mut DeterministicRng) {
    if rng.next_bool(chance) {
        enemy.direction = -enemy.direction;
    }
}

// =============================================================================
// BEHAVIORS
// =============================================================================

fn cat_behavior(enemy: &Enemy, ctx: &AiContext<'_>, _rng: &mut DeterministicRng) -> AiOutcome {
    let mut next = enemy.clone();
    if ctx.sees_player(enemy.position, ctx.ai.cat_chase_radius) {
        let speed = fixed_mul(enemy.speed, ctx.ai.cat_chase_multiplier);
        chase(&mut next, ctx.player_position.x, speed, ctx);
    } else {
        patrol(&mut next, enemy.speed, ctx.dt);
    }
    AiOutcome::moved(next)
}

fn frog_behavior(enemy: &Enemy, ctx: &AiContext<'_>, rng: &mut DeterministicRng) -> AiOutcome {
    let mut next = enemy.clone();
    if airborne(&mut next, ctx) {
        next.position.x += fixed_mul(next.velocity.x, ctx.dt);
        keep_in_bounds(&mut next, ctx.bounds);
        if next.position.y >= next.home_y {
            next.velocity.x = 0;
        }
        return AiOutcome::moved(next);
    }

    if next.hop_timer > 0 {
        next.hop_timer -= 1;
        return AiOutcome::moved(next);
    }

    next.direction = if ctx.sees_player(enemy.position, ctx.ai.frog_hop_range) {
        if ctx.player_position.x >= enemy.position.x { 1 } else { -1 }
    } else {
        rng.next_direction()
    };
    next.velocity = FixedVec2::new(
        enemy.speed * next.direction as i32,
        -ctx.ai.frog_hop_velocity,
    );
    next.hop_timer = ctx.ai.frog_hop_interval;
    next.position = next.position + next.velocity.scale(ctx.dt);
    AiOutcome::moved(next)
}

fn snake_behavior(enemy: &Enemy, ctx: &AiContext<'_>, _rng: &mut DeterministicRng) -> AiOutcome {
    let mut next = enemy.clone();
    patrol(&mut next, enemy.speed, ctx.dt);
    oscillate(&mut next, WOBBLE_RATE, ctx.ai.snake_wobble, ctx.dt);
    AiOutcome::moved(next)
}

fn drone_behavior(enemy: &Enemy, ctx: &AiContext<'_>, rng: &mut DeterministicRng) -> AiOutcome {
    let mut next = enemy.clone();
    patrol(&mut next, enemy.speed >> 1, ctx.dt);
    oscillate(&mut next, BOB_RATE, ctx.ai.drone_bob, ctx.dt);
    let projectile = try_shoot(&mut next, ctx, rng, ctx.ai.drone_shoot_ticks);
    AiOutcome { enemy: next, projectile }
}

fn mouse_behavior(enemy: &Enemy, ctx: &AiContext<'_>, rng: &mut DeterministicRng) -> AiOutcome {
    let mut next = enemy.clone();
    flip_sometimes(&mut next, ctx.ai.mouse_flip_chance, rng);
    patrol(&mut next, fixed_mul(enemy.speed, ctx.ai.mouse_speed_multiplier), ctx.dt);

    if !airborne(&mut next, ctx) && rng.next_bool(ctx.ai.mouse_hop_chance) {
        next.velocity.y = -ctx.ai.mouse_hop_velocity;
        next.position.y += fixed_mul(next.velocity.y, ctx.dt);
    }
    AiOutcome::moved(next)
}

fn fish_behavior(enemy: &Enemy, ctx: &AiContext<'_>, rng: &mut DeterministicRng) -> AiOutcome {
    let mut next = enemy.clone();
    flip_sometimes(&mut next, ctx.ai.fish_flip_chance, rng);
    patrol(&mut next, fixed_mul(enemy.speed, ctx.ai.fish_speed_multiplier), ctx.dt);
    oscillate(&mut next, SWIM_RATE, ctx.ai.water_band, ctx.dt);
    AiOutcome::moved(next)
}

fn shark_behavior(enemy: &Enemy, ctx: &AiContext<'_>, _rng: &mut DeterministicRng) -> AiOutcome {
    let mut next = enemy.clone();
    patrol(&mut next, enemy.speed, ctx.dt);
    oscillate(&mut next, CRUISE_RATE, ctx.ai.water_band, ctx.dt);
    AiOutcome::moved(next)
}

fn boss_behavior(enemy: &Enemy, ctx: &AiContext<'_>, rng: &mut DeterministicRng) -> AiOutcome {
    let mut next = enemy.clone();
    if ctx.player_hidden {
        patrol(&mut next, enemy.speed, ctx.dt);
    } else {
        let speed = fixed_mul(enemy.speed, ctx.ai.boss_speed_multiplier);
        chase(&mut next, ctx.player_position.x, speed, ctx);
    }
    let projectile = try_shoot(&mut next, ctx, rng, ctx.ai.boss_shoot_ticks);
    AiOutcome { enemy: next, projectile }
}

// =============================================================================
// TESTS
// =============================================================================
