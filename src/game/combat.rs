//! Combat
//!
//! Order within the phase: stomp, melee, enemy contact, enemy projectiles,
//! hazards, defeat. An enemy takes damage at most once per tick, so a stomp
//! and a melee swing landing on the same enemy in the same tick count once.

use tracing::debug;

use crate::core::fixed::{Fixed, fixed_mul};
use crate::core::vec2::FixedVec2;
use crate::game::collision::apply_pickup;
use crate::game::config::SimConfig;
use crate::game::events::{DamageSource, GameEvent, HitSource};
use crate::game::input::{Action, InputState};
use crate::game::state::{CollectibleKind, Faction, Projectile, WorldState};

/// What combat observed this tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CombatReport {
    /// Id of the enemy stomped this tick
    pub stomped: Option<u32>,
    /// A new melee swing started
    pub swing_started: bool,
    /// Enemies defeated this tick (ids)
    pub defeated: Vec<u32>,
    /// Player health reached 0
    pub player_died: bool,
}

/// Run the combat phase.
pub fn resolve(state: &mut WorldState, input: &InputState, config: &SimConfig) -> CombatReport {
    let mut report = CombatReport::default();

    report.stomped = resolve_stomp(state, config);
    report.swing_started = start_swing(state, input, config);
    resolve_melee(state, config);

    let contact = resolve_contact(state, report.stomped, config);
    let shot = resolve_enemy_projectiles(state, config);
    let hazard = resolve_hazards(state, config);
    report.player_died = contact || shot || hazard;

    report.defeated = resolve_defeats(state, config);
    report
}

// =============================================================================
// PLAYER → ENEMY
// =============================================================================

/// Apply damage to an enemy unless it was already hit this tick.
///
/// Returns false when the hit was ignored.
fn damage_enemy(state: &mut WorldState, index: usize, damage: u32, source: HitSource) -> bool {
    let tick = state.tick;
    let enemy = &mut state.enemies[index];
    if !enemy.is_alive() || enemy.last_hit_tick == Some(tick) {
        return false;
    }

    enemy.health = enemy.health.saturating_sub(damage);
    enemy.last_hit_tick = Some(tick);
    let (id, health_after) = (enemy.id, enemy.health);

    debug!(tick, enemy = id, damage, ?source, health_after, "enemy hit");
    state.push_event(GameEvent::enemy_hit(tick, id, damage, source, health_after));
    true
}

/// Land on at most one enemy's head.
fn resolve_stomp(state: &mut WorldState, config: &SimConfig) -> Option<u32> {
    let player = &state.player;
    if player.position.y <= player.prev_position.y {
        return None;
    }

    let band = config.combat.stomp_band;
    let player_box = player.aabb();
    let prev_bottom = player.prev_bottom();
    let bottom = player.bottom();

    let index = state.enemies.iter().position(|enemy| {
        let top = enemy.top();
        enemy.is_alive()
            && prev_bottom <= top + band
            && bottom >= top
            && player_box.overlaps_x(&enemy.aabb())
    })?;

    if !damage_enemy(state, index, config.combat.hit_damage, HitSource::Stomp) {
        return None;
    }

    let bounce = fixed_mul(config.physics.jump_velocity, config.combat.stomp_bounce);
    state.player.velocity.y = -bounce;
    state.player.grounded = false;
    Some(state.enemies[index].id)
}

/// Spawn a melee hitbox on the attack edge if the cooldown has expired.
fn start_swing(state: &mut WorldState, input: &InputState, config: &SimConfig) -> bool {
    if !input.just_pressed(Action::Attack) || state.player.attack_cooldown_ticks > 0 {
        return false;
    }

    let combat = &config.combat;
    let damage = if state.player.is_powered_up() {
        combat.powered_hit_damage
    } else {
        combat.hit_damage
    };
    let id = state.next_projectile_id();
    let position = swing_position(state, combat.attack_reach);

    state.projectiles.push(Projectile {
        id,
        position,
        velocity: FixedVec2::ZERO,
        size: combat.attack_size,
        faction: Faction::Player,
        ttl: Some(combat.attack_active_ticks),
        damage,
        spent: false,
    });
    state.player.attack_cooldown_ticks = combat.attack_cooldown_ticks;
    true
}

#[inline]
fn swing_position(state: &WorldState, reach: Fixed) -> FixedVec2 {
    let player = &state.player;
    FixedVec2::new(player.position.x + reach * player.facing as i32, player.position.y)
}

/// Move live swings with the player and apply their first hit.
fn resolve_melee(state: &mut WorldState, config: &SimConfig) {
    let anchor = swing_position(state, config.combat.attack_reach);

    for p in 0..state.projectiles.len() {
        if !state.projectiles[p].is_melee() || state.projectiles[p].spent {
            continue;
        }
        state.projectiles[p].position = anchor;
        let hitbox = state.projectiles[p].aabb();
        let damage = state.projectiles[p].damage;

        let target = state
            .enemies
            .iter()
            .position(|e| e.is_alive() && e.last_hit_tick != Some(state.tick) && e.aabb().overlaps(&hitbox));
        if let Some(index) = target {
            damage_enemy(state, index, damage, HitSource::Melee);
            state.projectiles[p].spent = true;
            continue;
        }

        let swing = &mut state.projectiles[p];
        let remaining = swing.ttl.unwrap_or(0).saturating_sub(1);
        swing.ttl = Some(remaining);
        if remaining == 0 {
            swing.spent = true;
        }
    }
}

// =============================================================================
// ENEMY → PLAYER
// =============================================================================

/// Hurt the player. Returns true when health reached 0.
///
/// A power-up absorbs the hit instead of health. Either way the player gets
/// a short invincibility window.
pub fn damage_player(
    state: &mut WorldState,
    damage: u32,
    source: DamageSource,
    knockback_from: Option<Fixed>,
    config: &SimConfig,
) -> bool {
    let tick = state.tick;
    let player = &mut state.player;

    let absorbed = player.is_powered_up();
    let dealt = if absorbed {
        player.powered_up_ticks = 0;
        0
    } else {
        player.health = player.health.saturating_sub(damage);
        damage
    };
    player.invincible_ticks = config.player.hit_invincibility_ticks;

    if let Some(from_x) = knockback_from {
        let away = if player.position.x < from_x { -1 } else { 1 };
        player.velocity = FixedVec2::new(config.combat.knockback_x * away, -config.combat.knockback_y);
        player.grounded = false;
    }

    let health_after = player.health;
    debug!(tick, damage = dealt, ?source, health_after, absorbed, "player damaged");
    state.push_event(GameEvent::player_damaged(tick, dealt, source, health_after, absorbed));
    health_after == 0
}

#[inline]
fn player_vulnerable(state: &WorldState) -> bool {
    !state.player.is_invincible() && !state.player.is_hidden()
}

/// Touching a non-stunned enemy hurts. The enemy stomped this tick is
/// underfoot, not touching.
fn resolve_contact(state: &mut WorldState, stomped: Option<u32>, config: &SimConfig) -> bool {
    if !player_vulnerable(state) {
        return false;
    }

    let position = state.player.position;
    let radius = config.combat.contact_radius;
    let toucher = state
        .enemies
        .iter()
        .filter(|e| Some(e.id) != stomped)
        .find(|e| e.is_alive() && !e.is_stunned() && e.position.within_radius(position, radius))
        .map(|e| e.position.x);

    match toucher {
        Some(from_x) => damage_player(state, config.combat.hit_damage, DamageSource::Contact, Some(from_x), config),
        None => false,
    }
}

/// Retire shots that left the level or reached the player.
fn resolve_enemy_projectiles(state: &mut WorldState, config: &SimConfig) -> bool {
    let margin = config.combat.projectile_margin;
    let (left, right) = (state.bounds.min.saturating_sub(margin), state.bounds.max.saturating_add(margin));
    let (top, bottom) = (-margin, state.level_height.saturating_add(margin));
    let position = state.player.position;
    let radius = config.combat.projectile_radius;

    let mut hit: Option<(u32, Fixed)> = None;
    for shot in state.projectiles.iter_mut() {
        if shot.faction != Faction::Enemy || shot.spent {
            continue;
        }
        let p = shot.position;
        if p.x < left || p.x > right || p.y < top || p.y > bottom {
            shot.spent = true;
            continue;
        }
        if p.within_radius(position, radius) {
            shot.spent = true;
            if hit.is_none() {
                hit = Some((shot.damage, p.x));
            }
        }
    }

    match hit {
        Some((damage, from_x)) if player_vulnerable(state) => {
            damage_player(state, damage, DamageSource::Projectile, Some(from_x), config)
        }
        _ => false,
    }
}

/// Standing in a hazard's radius hurts.
fn resolve_hazards(state: &mut WorldState, config: &SimConfig) -> bool {
    if state.player.is_invincible() {
        return false;
    }
    let position = state.player.position;
    let damage = state
        .hazards
        .iter()
        .find(|h| h.position.within_radius(position, h.trigger_radius))
        .map(|h| h.damage);

    match damage {
        Some(damage) => damage_player(state, damage, DamageSource::Hazard, None, config),
        None => false,
    }
}

// =============================================================================
// DEFEAT
// =============================================================================

/// Mark enemies at 0 health as defeated and award points.
///
/// The tick compacts them before it ends.
fn resolve_defeats(state: &mut WorldState, config: &SimConfig) -> Vec<u32> {
    let tick = state.tick;
    let mut defeated = Vec::new();

    for enemy in state.enemies.iter_mut() {
        if enemy.defeated || enemy.health > 0 {
            continue;
        }
        enemy.defeated = true;
        defeated.push((enemy.id, enemy.kind, enemy.is_boss));
    }

    for &(id, kind, boss) in &defeated {
        let points = if boss { config.combat.boss_points } else { config.combat.enemy_points };
        let new_score = state.add_score(points);
        if boss {
            apply_pickup(state, CollectibleKind::Heart, 1, config);
        }
        debug!(tick, enemy = id, ?kind, boss, points, "enemy defeated");
        state.push_event(GameEvent::enemy_defeated(tick, id, kind, boss, points, new_score));
    }

    defeated.into_iter().map(|(id, _, _)| id).collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{from_int, FIXED_ONE, JUMP_VELOCITY};
    use crate::game::input::InputFrame;
    use crate::game::state::{Enemy, EnemyKind, Hazard, HazardKind, PlayerState};
    use proptest::prelude::*;

    fn world() -> WorldState {
        let spawn = FixedVec2::from_ints(100, 100);
        let mut w = WorldState::new(5, spawn, PlayerState::new(spawn, 3, 3));
        w.tick = 10;
        w
    }

    fn idle() -> InputState {
        InputState::from_frames(InputFrame::new(), InputFrame::new())
    }

    fn attack() -> InputState {
        InputState::from_frames(InputFrame::new(), InputFrame::holding(&[Action::Attack]))
    }

    #[test]
    fn test_single_stomp_per_tick() {
        let config = SimConfig::default();
        let mut w = world();
        // Bottom edge swept 95 → 105 this tick; enemy top at 100
        w.player.prev_position = FixedVec2::from_ints(100, 75);
        w.player.position = FixedVec2::from_ints(100, 85);
        w.player.velocity.y = from_int(10);
        let mut first = Enemy::new(1, EnemyKind::Boss, FixedVec2::from_ints(100, 140), FIXED_ONE);
        first.health = 5;
        let mut second = Enemy::new(2, EnemyKind::Boss, FixedVec2::from_ints(110, 140), FIXED_ONE);
        second.health = 5;
        w.enemies.push(first);
        w.enemies.push(second);
        assert_eq!(w.enemies[0].top(), from_int(100));

        let report = resolve(&mut w, &idle(), &config);
        assert_eq!(report.stomped, Some(1));
        assert_eq!(w.enemies[0].health, 4);
        assert_eq!(w.enemies[1].health, 5);
        assert_eq!(w.player.velocity.y, -fixed_mul(JUMP_VELOCITY, config.combat.stomp_bounce));
    }

    #[test]
    fn test_stomp_survivor_does_not_hurt_player() {
        let config = SimConfig::default();
        let mut w = world();
        // Falling at 15 px/tick: bottom edge 117 → 132, cat top at 120
        w.player.prev_position = FixedVec2::from_ints(100, 97);
        w.player.position = FixedVec2::from_ints(100, 112);
        w.player.velocity.y = from_int(15);
        w.enemies.push(Enemy::new(1, EnemyKind::Cat, FixedVec2::from_ints(100, 140), FIXED_ONE));
        assert_eq!(w.enemies[0].top(), from_int(120));
        assert_eq!(w.player.invincible_ticks, 0);

        let report = resolve(&mut w, &idle(), &config);
        assert_eq!(report.stomped, Some(1));
        assert_eq!(w.enemies[0].health, 1);
        assert!(!report.player_died);
        assert_eq!(w.player.health, 3);
        assert_eq!(w.player.velocity.y, -fixed_mul(JUMP_VELOCITY, config.combat.stomp_bounce));
    }

    #[test]
    fn test_stomp_does_not_shield_other_enemies() {
        let config = SimConfig::default();
        let mut w = world();
        w.player.prev_position = FixedVec2::from_ints(100, 97);
        w.player.position = FixedVec2::from_ints(100, 112);
        w.enemies.push(Enemy::new(1, EnemyKind::Cat, FixedVec2::from_ints(100, 140), FIXED_ONE));
        w.enemies.push(Enemy::new(2, EnemyKind::Cat, FixedVec2::from_ints(80, 112), FIXED_ONE));

        let report = resolve(&mut w, &idle(), &config);
        assert_eq!(report.stomped, Some(1));
        assert_eq!(w.player.health, 2);
    }

    #[test]
    fn test_no_stomp_when_rising() {
        let config = SimConfig::default();
        let mut w = world();
        w.player.prev_position = FixedVec2::from_ints(100, 95);
        w.player.position = FixedVec2::from_ints(100, 85);
        w.player.invincible_ticks = 10;
        w.enemies.push(Enemy::new(1, EnemyKind::Cat, FixedVec2::from_ints(100, 120), FIXED_ONE));

        let report = resolve(&mut w, &idle(), &config);
        assert_eq!(report.stomped, None);
        assert_eq!(w.enemies[0].health, 2);
    }

    #[test]
    fn test_melee_cooldown_window() {
        let config = SimConfig::default();
        let mut w = world();

        let report = resolve(&mut w, &attack(), &config);
        assert!(report.swing_started);
        assert!(w.player_is_attacking());
        let cooldown = config.combat.attack_cooldown_ticks;

        // Mash attack: nothing starts until the cooldown has fully run down
        for t in 1..cooldown {
            w.tick += 1;
            w.player.tick_timers();
            let report = resolve(&mut w, &attack(), &config);
            assert!(!report.swing_started, "swing restarted after {t} ticks");
            w.compact();
        }
        w.tick += 1;
        w.player.tick_timers();
        assert!(resolve(&mut w, &attack(), &config).swing_started);
    }

    #[test]
    fn test_melee_and_stomp_hit_once() {
        let config = SimConfig::default();
        let mut w = world();
        w.player.prev_position = FixedVec2::from_ints(100, 75);
        w.player.position = FixedVec2::from_ints(100, 85);
        let mut boss = Enemy::new(1, EnemyKind::Boss, FixedVec2::from_ints(120, 135), FIXED_ONE);
        boss.health = 10;
        w.enemies.push(boss);

        let report = resolve(&mut w, &attack(), &config);
        assert_eq!(report.stomped, Some(1));
        assert!(report.swing_started);
        assert_eq!(w.enemies[0].health, 9);
        // The swing stays live for the next tick
        assert!(w.player_is_attacking());
    }

    #[test]
    fn test_powered_melee_double_damage_and_defeat() {
        let config = SimConfig::default();
        let mut w = world();
        w.player.powered_up_ticks = 100;
        w.enemies.push(Enemy::new(7, EnemyKind::Cat, FixedVec2::from_ints(135, 100), FIXED_ONE));
        w.player.invincible_ticks = 5;

        let report = resolve(&mut w, &attack(), &config);
        assert_eq!(report.defeated, vec![7]);
        assert!(w.enemies[0].defeated);
        assert_eq!(w.score, 100);
        w.compact();
        assert!(w.enemies.is_empty());
    }

    #[test]
    fn test_boss_defeat_grants_heart() {
        let config = SimConfig::default();
        let mut w = world();
        let mut boss = Enemy::new(1, EnemyKind::Boss, FixedVec2::from_ints(600, 100), FIXED_ONE);
        boss.health = 0;
        w.enemies.push(boss);

        resolve(&mut w, &idle(), &config);
        assert_eq!(w.score, 1000);
        assert_eq!(w.player.lives, 4);
        assert_eq!(w.player.max_health, 4);
    }

    #[test]
    fn test_contact_knockback_and_invincibility() {
        let config = SimConfig::default();
        let mut w = world();
        w.enemies.push(Enemy::new(1, EnemyKind::Cat, FixedVec2::from_ints(120, 100), FIXED_ONE));

        resolve(&mut w, &idle(), &config);
        assert_eq!(w.player.health, 2);
        assert_eq!(w.player.velocity, FixedVec2::from_ints(-5, -5));
        assert_eq!(w.player.invincible_ticks, 60);

        // Invincible: no second hit
        resolve(&mut w, &idle(), &config);
        assert_eq!(w.player.health, 2);
    }

    #[test]
    fn test_hidden_player_ignores_contact() {
        let config = SimConfig::default();
        let mut w = world();
        w.player.dig_ticks = 30;
        w.enemies.push(Enemy::new(1, EnemyKind::Cat, FixedVec2::from_ints(110, 100), FIXED_ONE));
        resolve(&mut w, &idle(), &config);
        assert_eq!(w.player.health, 3);
    }

    #[test]
    fn test_power_up_absorbs_hit() {
        let config = SimConfig::default();
        let mut w = world();
        w.player.powered_up_ticks = 500;
        w.hazards.push(Hazard {
            id: 0,
            kind: HazardKind::Spikes,
            position: FixedVec2::from_ints(100, 110),
            trigger_radius: from_int(30),
            damage: 2,
        });

        let report = resolve(&mut w, &idle(), &config);
        assert!(!report.player_died);
        assert_eq!(w.player.health, 3);
        assert!(!w.player.is_powered_up());
        assert!(w.player.is_invincible());
    }

    #[test]
    fn test_enemy_shot_spent_on_hit_or_exit() {
        let config = SimConfig::default();
        let mut w = world();
        for (id, x) in [(0, 110), (1, -500)] {
            w.projectiles.push(Projectile {
                id,
                position: FixedVec2::from_ints(x, 100),
                velocity: FixedVec2::from_ints(-6, 0),
                size: FixedVec2::from_ints(10, 10),
                faction: Faction::Enemy,
                ttl: None,
                damage: 1,
                spent: false,
            });
        }

        resolve(&mut w, &idle(), &config);
        assert!(w.projectiles.iter().all(|p| p.spent));
        assert_eq!(w.player.health, 2);
    }

    #[test]
    fn test_lethal_hit_reports_death() {
        let config = SimConfig::default();
        let mut w = world();
        w.player.health = 1;
        w.enemies.push(Enemy::new(1, EnemyKind::Frog, FixedVec2::from_ints(100, 120), FIXED_ONE));
        let report = resolve(&mut w, &idle(), &config);
        assert!(report.player_died);
        assert_eq!(w.player.health, 0);
    }

    proptest! {
        #[test]
        fn prop_enemy_health_saturates(health in 1u32..10, damage in 1u32..15) {
            let mut w = world();
            let mut enemy = Enemy::new(1, EnemyKind::Cat, FixedVec2::ZERO, FIXED_ONE);
            enemy.health = health;
            w.enemies.push(enemy);

            prop_assert!(damage_enemy(&mut w, 0, damage, HitSource::Melee));
            prop_assert_eq!(w.enemies[0].health, health.saturating_sub(damage));
            // Same tick: ignored
            prop_assert!(!damage_enemy(&mut w, 0, damage, HitSource::Stomp));
        }
    }
}
