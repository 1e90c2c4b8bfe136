//! Simulation Configuration
//!
//! Every tunable number in the simulation. `Default` gives the shipped
//! values; hosts can override any subset from JSON, where fixed-point
//! values are written as plain decimals (`"friction": 0.8`).

use std::fs;
use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::core::fixed::{
    serde_float, to_fixed, from_int, Fixed, FIXED_ONE,
    MOVE_SPEED, JUMP_VELOCITY, GRAVITY_RISE_HELD, GRAVITY_RISE, GRAVITY_FALL,
    MAX_FALL_SPEED, FRICTION, DASH_MULTIPLIER, SCORE_PER_ENEMY, SCORE_PER_BOSS,
};
use crate::core::vec2::FixedVec2;
use crate::error::ConfigError;

/// Complete simulation configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Screen geometry
    pub viewport: ViewportConfig,
    /// Player movement
    pub physics: PhysicsConfig,
    /// Player stats and timed effects
    pub player: PlayerConfig,
    /// Melee, stomp, projectiles, contact
    pub combat: CombatConfig,
    /// Enemy behavior
    pub ai: AiConfig,
}

impl SimConfig {
    /// Parse from JSON; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let de = &mut serde_json::Deserializer::from_str(json);
        let config: Self = serde_path_to_error::deserialize(de).map_err(|e| ConfigError::Parse {
            path: e.path().to_string(),
            message: e.inner().to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.viewport.width <= 0 || self.viewport.height <= 0 {
            return Err(ConfigError::Invalid("viewport must have positive size"));
        }
        if self.player.max_health == 0 || self.player.starting_lives == 0 {
            return Err(ConfigError::Invalid("player needs health and at least one life"));
        }
        if self.player.starting_lives > self.player.max_lives {
            return Err(ConfigError::Invalid("starting_lives exceeds max_lives"));
        }
        if self.combat.attack_cooldown_ticks <= self.combat.attack_active_ticks {
            return Err(ConfigError::Invalid("attack cooldown must outlast the active window"));
        }
        if self.physics.max_dt <= 0 {
            return Err(ConfigError::Invalid("max_dt must be positive"));
        }
        Ok(())
    }
}

/// Screen geometry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Viewport width in px
    #[serde(with = "serde_float")]
    pub width: Fixed,
    /// Viewport height in px
    #[serde(with = "serde_float")]
    pub height: Fixed,
    /// Falling this far below the viewport counts as a pit
    #[serde(with = "serde_float")]
    pub pit_margin: Fixed,
    /// Player center rests this far above the level's bottom edge
    #[serde(with = "serde_float")]
    pub ground_offset: Fixed,
    /// Camera keeps the player this fraction in from the left edge
    #[serde(with = "serde_float")]
    pub camera_lead: Fixed,
    /// Exponential smoothing factor per frame
    #[serde(with = "serde_float")]
    pub camera_smoothing: Fixed,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: from_int(800),
            height: from_int(600),
            pit_margin: from_int(100),
            ground_offset: from_int(70),
            camera_lead: to_fixed(1.0 / 3.0),
            camera_smoothing: to_fixed(0.1),
        }
    }
}

/// Player movement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Run speed
    #[serde(with = "serde_float")]
    pub move_speed: Fixed,
    /// Jump impulse
    #[serde(with = "serde_float")]
    pub jump_velocity: Fixed,
    /// Gravity while rising with jump held
    #[serde(with = "serde_float")]
    pub gravity_rise_held: Fixed,
    /// Gravity while rising after release
    #[serde(with = "serde_float")]
    pub gravity_rise: Fixed,
    /// Gravity while falling
    #[serde(with = "serde_float")]
    pub gravity_fall: Fixed,
    /// Terminal fall speed
    #[serde(with = "serde_float")]
    pub max_fall_speed: Fixed,
    /// Horizontal decay per frame with no input
    #[serde(with = "serde_float")]
    pub friction: Fixed,
    /// Dash multiplier at dash level 1 (+0.25 per extra level)
    #[serde(with = "serde_float")]
    pub dash_multiplier: Fixed,
    /// Horizontal multiplier while dug in
    #[serde(with = "serde_float")]
    pub dig_speed_factor: Fixed,
    /// Largest frame delta accepted, in frames
    #[serde(with = "serde_float")]
    pub max_dt: Fixed,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            move_speed: MOVE_SPEED,
            jump_velocity: JUMP_VELOCITY,
            gravity_rise_held: GRAVITY_RISE_HELD,
            gravity_rise: GRAVITY_RISE,
            gravity_fall: GRAVITY_FALL,
            max_fall_speed: MAX_FALL_SPEED,
            friction: FRICTION,
            dash_multiplier: DASH_MULTIPLIER,
            dig_speed_factor: to_fixed(0.5),
            max_dt: 3 * FIXED_ONE,
        }
    }
}

/// Player stats and timed effects (all durations in ticks).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Health per life
    pub max_health: u32,
    /// Lives at session start
    pub starting_lives: u32,
    /// Lives cap (hearts)
    pub max_lives: u32,
    /// Dash window (300 ms)
    pub dash_ticks: u32,
    /// Dash cooldown (1000 ms)
    pub dash_cooldown_ticks: u32,
    /// Dig duration at dig level 1 (1000 ms)
    pub dig_ticks: u32,
    /// Bark cooldown (800 ms)
    pub bark_cooldown_ticks: u32,
    /// Bark stun duration (2 s)
    pub bark_stun_ticks: u32,
    /// Bark radius at bark level 1 (+25% per extra level)
    #[serde(with = "serde_float")]
    pub bark_radius: Fixed,
    /// Power-up duration (30 s)
    pub power_up_ticks: u32,
    /// Treat invincibility (10 s)
    pub treat_invincibility_ticks: u32,
    /// Invincibility after taking a hit (1 s)
    pub hit_invincibility_ticks: u32,
    /// Invincibility after respawning (1.5 s)
    pub respawn_invincibility_ticks: u32,
    /// Respawn point sits this far above an activated checkpoint
    #[serde(with = "serde_float")]
    pub respawn_offset: Fixed,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: 3,
            starting_lives: 3,
            max_lives: 5,
            dash_ticks: 18,
            dash_cooldown_ticks: 60,
            dig_ticks: 60,
            bark_cooldown_ticks: 48,
            bark_stun_ticks: 120,
            bark_radius: from_int(120),
            power_up_ticks: 1800,
            treat_invincibility_ticks: 600,
            hit_invincibility_ticks: 60,
            respawn_invincibility_ticks: 90,
            respawn_offset: from_int(20),
        }
    }
}

/// Combat tuning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Melee hitbox lifetime (250 ms)
    pub attack_active_ticks: u32,
    /// Melee cooldown (500 ms), longer than the active window
    pub attack_cooldown_ticks: u32,
    /// Melee hitbox size
    pub attack_size: FixedVec2,
    /// Distance from player center to hitbox center
    #[serde(with = "serde_float")]
    pub attack_reach: Fixed,
    /// Damage per hit
    pub hit_damage: u32,
    /// Melee damage while powered up
    pub powered_hit_damage: u32,
    /// Thickness of an enemy's stompable top band
    #[serde(with = "serde_float")]
    pub stomp_band: Fixed,
    /// Bounce as a fraction of the jump impulse
    #[serde(with = "serde_float")]
    pub stomp_bounce: Fixed,
    /// Knockback horizontal speed
    #[serde(with = "serde_float")]
    pub knockback_x: Fixed,
    /// Knockback upward speed
    #[serde(with = "serde_float")]
    pub knockback_y: Fixed,
    /// Collectible pickup radius
    #[serde(with = "serde_float")]
    pub collectible_radius: Fixed,
    /// Enemy contact radius
    #[serde(with = "serde_float")]
    pub contact_radius: Fixed,
    /// Enemy projectile hit radius
    #[serde(with = "serde_float")]
    pub projectile_radius: Fixed,
    /// Checkpoint activation radius
    #[serde(with = "serde_float")]
    pub checkpoint_radius: Fixed,
    /// Enemy projectile speed
    #[serde(with = "serde_float")]
    pub projectile_speed: Fixed,
    /// Enemies only fire at players within this range
    #[serde(with = "serde_float")]
    pub shoot_range: Fixed,
    /// Projectiles vanish this far past the level edges
    #[serde(with = "serde_float")]
    pub projectile_margin: Fixed,
    /// Points per regular enemy
    pub enemy_points: u32,
    /// Points per boss
    pub boss_points: u32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            attack_active_ticks: 15,
            attack_cooldown_ticks: 30,
            attack_size: FixedVec2::from_ints(40, 30),
            attack_reach: from_int(30),
            hit_damage: 1,
            powered_hit_damage: 2,
            stomp_band: from_int(10),
            stomp_bounce: to_fixed(0.6),
            knockback_x: from_int(5),
            knockback_y: from_int(5),
            collectible_radius: from_int(25),
            contact_radius: from_int(30),
            projectile_radius: from_int(20),
            checkpoint_radius: from_int(50),
            projectile_speed: from_int(6),
            shoot_range: from_int(400),
            projectile_margin: from_int(100),
            enemy_points: SCORE_PER_ENEMY,
            boss_points: SCORE_PER_BOSS,
        }
    }
}

/// Enemy behavior tuning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Cats chase inside this radius
    #[serde(with = "serde_float")]
    pub cat_chase_radius: Fixed,
    /// Cat chase speed multiplier
    #[serde(with = "serde_float")]
    pub cat_chase_multiplier: Fixed,
    /// Frames between frog hops
    pub frog_hop_interval: u32,
    /// Frogs aim hops at players inside this range
    #[serde(with = "serde_float")]
    pub frog_hop_range: Fixed,
    /// Frog hop impulse
    #[serde(with = "serde_float")]
    pub frog_hop_velocity: Fixed,
    /// Snake wobble amplitude
    #[serde(with = "serde_float")]
    pub snake_wobble: Fixed,
    /// Drone bob amplitude
    #[serde(with = "serde_float")]
    pub drone_bob: Fixed,
    /// Mouse speed multiplier
    #[serde(with = "serde_float")]
    pub mouse_speed_multiplier: Fixed,
    /// Mouse direction flip chance per frame
    #[serde(with = "serde_float")]
    pub mouse_flip_chance: Fixed,
    /// Mouse hop chance per frame
    #[serde(with = "serde_float")]
    pub mouse_hop_chance: Fixed,
    /// Mouse hop impulse
    #[serde(with = "serde_float")]
    pub mouse_hop_velocity: Fixed,
    /// Half-height of the fish/shark water band
    #[serde(with = "serde_float")]
    pub water_band: Fixed,
    /// Fish speed multiplier
    #[serde(with = "serde_float")]
    pub fish_speed_multiplier: Fixed,
    /// Fish direction flip chance per frame
    #[serde(with = "serde_float")]
    pub fish_flip_chance: Fixed,
    /// Boss speed multiplier
    #[serde(with = "serde_float")]
    pub boss_speed_multiplier: Fixed,
    /// Boss health multiplier
    pub boss_health_multiplier: u32,
    /// Drone shot interval range
    pub drone_shoot_ticks: (u32, u32),
    /// Boss shot interval range
    pub boss_shoot_ticks: (u32, u32),
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            cat_chase_radius: from_int(300),
            cat_chase_multiplier: to_fixed(1.5),
            frog_hop_interval: 90,
            frog_hop_range: from_int(250),
            frog_hop_velocity: from_int(9),
            snake_wobble: from_int(6),
            drone_bob: from_int(15),
            mouse_speed_multiplier: to_fixed(1.2),
            mouse_flip_chance: to_fixed(0.01),
            mouse_hop_chance: to_fixed(0.005),
            mouse_hop_velocity: from_int(4),
            water_band: from_int(20),
            fish_speed_multiplier: to_fixed(1.5),
            fish_flip_chance: to_fixed(0.01),
            boss_speed_multiplier: to_fixed(0.6),
            boss_health_multiplier: 5,
            drone_shoot_ticks: (90, 150),
            boss_shoot_ticks: (45, 75),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SimConfig::from_json_str(r#"{ "physics": { "friction": 0.5 } }"#).unwrap();
        assert_eq!(config.physics.friction, to_fixed(0.5));
        assert_eq!(config.physics.move_speed, MOVE_SPEED);
        assert_eq!(config.player, PlayerConfig::default());
    }

    #[test]
    fn test_parse_error_names_path() {
        let err = SimConfig::from_json_str(r#"{ "combat": { "hit_damage": "lots" } }"#).unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => assert_eq!(path, "combat.hit_damage"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_cooldown_shorter_than_swing() {
        let json = r#"{ "combat": { "attack_active_ticks": 30, "attack_cooldown_ticks": 10 } }"#;
        assert!(matches!(SimConfig::from_json_str(json), Err(ConfigError::Invalid(_))));
    }
}
