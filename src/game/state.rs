//! World State Definitions
//!
//! Every piece of mutable simulation data lives in one [`WorldState`]
//! aggregate that the scheduler owns and threads through each tick phase.
//! Entity lists are plain `Vec`s iterated in index order, which keeps
//! iteration deterministic; removal is mark-then-compact.

use serde::{Serialize, Deserialize};
use tracing::warn;

use crate::core::fixed::{Fixed, from_int};
use crate::core::vec2::FixedVec2;
use crate::core::rng::DeterministicRng;
use crate::core::hash::{StateHash, StateHasher, compute_state_hash};
use crate::game::collision::Aabb;
use crate::game::events::GameEvent;

// =============================================================================
// GAME PHASE
// =============================================================================

/// Scheduler phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum GamePhase {
    /// Waiting for level data
    #[default]
    Loading = 0,
    /// Active gameplay
    Playing = 1,
    /// Update phases frozen, snapshots still produced
    Paused = 2,
    /// Out of lives; only restart is accepted
    GameOver = 3,
}

// =============================================================================
// PLAYER
// =============================================================================

/// Upgradeable abilities, each at level 1..=3.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AbilityKind {
    /// Stun nearby enemies
    Bark = 0,
    /// Burrow and hide
    Dig = 1,
    /// Short burst of speed
    Dash = 2,
}

/// Ability levels carried across levels and saves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Abilities {
    /// Bark level
    pub bark: u8,
    /// Dig level
    pub dig: u8,
    /// Dash level
    pub dash: u8,
}

impl Abilities {
    /// Highest level any ability can reach.
    pub const MAX_LEVEL: u8 = 3;

    /// Level of one ability.
    pub fn level(&self, kind: AbilityKind) -> u8 {
        match kind {
            AbilityKind::Bark => self.bark,
            AbilityKind::Dig => self.dig,
            AbilityKind::Dash => self.dash,
        }
    }

    /// Raise an ability by one level. Returns false when already maxed.
    pub fn upgrade(&mut self, kind: AbilityKind) -> bool {
        let slot = match kind {
            AbilityKind::Bark => &mut self.bark,
            AbilityKind::Dig => &mut self.dig,
            AbilityKind::Dash => &mut self.dash,
        };
        if *slot >= Self::MAX_LEVEL {
            return false;
        }
        *slot += 1;
        true
    }

    /// Clamp every level into 1..=3 (used on loaded saves).
    pub fn sanitized(self) -> Self {
        let fix = |v: u8| v.clamp(1, Self::MAX_LEVEL);
        Self { bark: fix(self.bark), dig: fix(self.dig), dash: fix(self.dash) }
    }
}

impl Default for Abilities {
    fn default() -> Self {
        Self { bark: 1, dig: 1, dash: 1 }
    }
}

/// The single authoritative player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Center position
    pub position: FixedVec2,

    /// Position at the start of this tick's integration (for sweep tests)
    pub prev_position: FixedVec2,

    /// Velocity in px/frame
    pub velocity: FixedVec2,

    /// Full width and height
    pub size: FixedVec2,

    /// -1 facing left, 1 facing right
    pub facing: i8,

    /// Standing on ground or a platform top
    pub grounded: bool,

    /// Current health (0..=max_health)
    pub health: u32,

    /// Maximum health
    pub max_health: u32,

    /// Remaining lives including the current one
    pub lives: u32,

    // =========================================================================
    // Tick-counted timers (advance only while Playing)
    // =========================================================================

    /// Power-up remaining ticks
    pub powered_up_ticks: u32,

    /// Invincibility remaining ticks
    pub invincible_ticks: u32,

    /// Ticks until the next melee swing is allowed
    pub attack_cooldown_ticks: u32,

    /// Dash remaining ticks
    pub dash_ticks: u32,

    /// Ticks until the next dash is allowed
    pub dash_cooldown_ticks: u32,

    /// Dig (hidden) remaining ticks
    pub dig_ticks: u32,

    /// Ticks until the next bark is allowed
    pub bark_cooldown_ticks: u32,

    // =========================================================================
    // Progress
    // =========================================================================

    /// Ability levels
    pub abilities: Abilities,

    /// Bones collected this level
    pub bones: u32,

    /// Visas collected this level
    pub visas: u32,
}

impl PlayerState {
    /// Player hitbox size in pixels.
    pub const SIZE: FixedVec2 = FixedVec2::from_ints(40, 40);

    /// Create a player at a spawn point.
    pub fn new(position: FixedVec2, max_health: u32, lives: u32) -> Self {
        Self {
            position,
            prev_position: position,
            velocity: FixedVec2::ZERO,
            size: Self::SIZE,
            facing: 1,
            grounded: false,
            health: max_health,
            max_health,
            lives,
            powered_up_ticks: 0,
            invincible_ticks: 0,
            attack_cooldown_ticks: 0,
            dash_ticks: 0,
            dash_cooldown_ticks: 0,
            dig_ticks: 0,
            bark_cooldown_ticks: 0,
            abilities: Abilities::default(),
            bones: 0,
            visas: 0,
        }
    }

    /// Axis-aligned hitbox.
    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.position, self.size)
    }

    /// Bottom edge y.
    #[inline]
    pub fn bottom(&self) -> Fixed {
        self.position.y + (self.size.y >> 1)
    }

    /// Bottom edge y before this tick's integration.
    #[inline]
    pub fn prev_bottom(&self) -> Fixed {
        self.prev_position.y + (self.size.y >> 1)
    }

    /// Power-up is active.
    #[inline]
    pub fn is_powered_up(&self) -> bool {
        self.powered_up_ticks > 0
    }

    /// Immune to damage.
    #[inline]
    pub fn is_invincible(&self) -> bool {
        self.invincible_ticks > 0
    }

    /// Dug in: ignored by chasers and contact damage.
    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.dig_ticks > 0
    }

    /// Dash window active.
    #[inline]
    pub fn is_dashing(&self) -> bool {
        self.dash_ticks > 0
    }

    /// Advance every timer by one tick.
    pub fn tick_timers(&mut self) {
        self.powered_up_ticks = self.powered_up_ticks.saturating_sub(1);
        self.invincible_ticks = self.invincible_ticks.saturating_sub(1);
        self.attack_cooldown_ticks = self.attack_cooldown_ticks.saturating_sub(1);
        self.dash_ticks = self.dash_ticks.saturating_sub(1);
        self.dash_cooldown_ticks = self.dash_cooldown_ticks.saturating_sub(1);
        self.dig_ticks = self.dig_ticks.saturating_sub(1);
        self.bark_cooldown_ticks = self.bark_cooldown_ticks.saturating_sub(1);
    }

    /// Set health, clamping into [0, max_health].
    pub fn set_health(&mut self, health: u32) {
        if health > self.max_health {
            warn!(health, max = self.max_health, "health above maximum, clamping");
        }
        self.health = health.min(self.max_health);
    }

    /// Heal without exceeding the maximum.
    pub fn heal(&mut self, amount: u32) {
        self.health = self.health.saturating_add(amount).min(self.max_health);
    }

    /// Hash this player's state for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_vec2(self.position);
        hasher.update_vec2(self.velocity);
        hasher.update_i32(self.facing as i32);
        hasher.update_bool(self.grounded);
        hasher.update_u32(self.health);
        hasher.update_u32(self.max_health);
        hasher.update_u32(self.lives);
        hasher.update_u32(self.powered_up_ticks);
        hasher.update_u32(self.invincible_ticks);
        hasher.update_u32(self.attack_cooldown_ticks);
        hasher.update_u32(self.dash_ticks);
        hasher.update_u32(self.dash_cooldown_ticks);
        hasher.update_u32(self.dig_ticks);
        hasher.update_u32(self.bark_cooldown_ticks);
        hasher.update_u32(self.bones);
        hasher.update_u32(self.visas);
    }
}

// =============================================================================
// ENEMIES
// =============================================================================

/// Enemy behavior family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum EnemyKind {
    /// Chases within a radius, patrols otherwise
    Cat = 0,
    /// Periodic large hops
    Frog = 1,
    /// Patrol with a sine wobble
    Snake = 2,
    /// Hovering, bobbing shooter
    Drone = 3,
    /// Fast erratic patrol
    Mouse = 4,
    /// Water-bound, random flips
    Fish = 5,
    /// Water-bound, deliberate
    Shark = 6,
    /// Level boss
    Boss = 7,
}

impl EnemyKind {
    /// Default hitbox size for the kind.
    pub fn size(self) -> FixedVec2 {
        match self {
            EnemyKind::Cat => FixedVec2::from_ints(40, 40),
            EnemyKind::Frog => FixedVec2::from_ints(32, 28),
            EnemyKind::Snake => FixedVec2::from_ints(48, 20),
            EnemyKind::Drone => FixedVec2::from_ints(36, 24),
            EnemyKind::Mouse => FixedVec2::from_ints(24, 18),
            EnemyKind::Fish => FixedVec2::from_ints(32, 20),
            EnemyKind::Shark => FixedVec2::from_ints(64, 32),
            EnemyKind::Boss => FixedVec2::from_ints(80, 80),
        }
    }

    /// Base health before boss multipliers.
    pub fn base_health(self) -> u32 {
        match self {
            EnemyKind::Shark => 3,
            EnemyKind::Cat | EnemyKind::Drone => 2,
            EnemyKind::Boss => 2,
            _ => 1,
        }
    }

    /// Whether this kind fires projectiles.
    pub fn shoots(self) -> bool {
        matches!(self, EnemyKind::Drone | EnemyKind::Boss)
    }
}

/// An enemy in the active set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enemy {
    /// Stable id within the level
    pub id: u32,

    /// Behavior family
    pub kind: EnemyKind,

    /// Center position
    pub position: FixedVec2,

    /// Velocity in px/frame
    pub velocity: FixedVec2,

    /// Full width and height
    pub size: FixedVec2,

    /// -1 moving left, 1 moving right
    pub direction: i8,

    /// Base patrol speed in px/frame
    pub speed: Fixed,

    /// Current health, > 0 while alive
    pub health: u32,

    /// Health at spawn
    pub max_health: u32,

    /// Gates the level exit while alive
    pub is_boss: bool,

    /// Ticks until the next shot; `None` for enemies that never shoot
    pub shoot_cooldown: Option<u32>,

    /// Left patrol bound
    pub patrol_min: Fixed,

    /// Right patrol bound
    pub patrol_max: Fixed,

    /// Resting height (ground line, hover line, or water line)
    pub home_y: Fixed,

    /// Oscillation phase in turns
    pub phase: Fixed,

    /// Ticks until the next hop (frogs)
    pub hop_timer: u32,

    /// Stunned (by a bark) remaining ticks
    pub stunned_ticks: u32,

    /// Last tick this enemy took damage
    pub last_hit_tick: Option<u32>,

    /// Marked for removal at the end of the tick
    pub defeated: bool,
}

impl Enemy {
    /// Create an enemy at a resting position.
    pub fn new(id: u32, kind: EnemyKind, position: FixedVec2, speed: Fixed) -> Self {
        let health = kind.base_health();
        Self {
            id,
            kind,
            position,
            velocity: FixedVec2::ZERO,
            size: kind.size(),
            direction: 1,
            speed,
            health,
            max_health: health,
            is_boss: kind == EnemyKind::Boss,
            shoot_cooldown: None,
            patrol_min: position.x,
            patrol_max: position.x,
            home_y: position.y,
            phase: 0,
            hop_timer: 0,
            stunned_ticks: 0,
            last_hit_tick: None,
            defeated: false,
        }
    }

    /// Builder: patrol between two x positions.
    pub fn with_patrol(mut self, min: Fixed, max: Fixed) -> Self {
        self.patrol_min = min.min(max);
        self.patrol_max = min.max(max);
        self
    }

    /// Axis-aligned hitbox.
    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.position, self.size)
    }

    /// Top edge y.
    #[inline]
    pub fn top(&self) -> Fixed {
        self.position.y - (self.size.y >> 1)
    }

    /// Still in the active set and able to act.
    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.defeated && self.health > 0
    }

    /// Stunned enemies neither move, shoot, nor hurt on contact.
    #[inline]
    pub fn is_stunned(&self) -> bool {
        self.stunned_ticks > 0
    }

    /// Hash this enemy's state for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.id);
        hasher.update_u8(self.kind as u8);
        hasher.update_vec2(self.position);
        hasher.update_vec2(self.velocity);
        hasher.update_i32(self.direction as i32);
        hasher.update_u32(self.health);
        hasher.update_opt_u32(self.shoot_cooldown);
        hasher.update_fixed(self.phase);
        hasher.update_u32(self.hop_timer);
        hasher.update_u32(self.stunned_ticks);
    }
}

// =============================================================================
// PROJECTILES
// =============================================================================

/// Which side a projectile hurts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Faction {
    /// Fired by enemies, hurts the player
    Enemy = 0,
    /// The player's melee swing, hurts enemies
    Player = 1,
}

/// A projectile or transient melee hitbox.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projectile {
    /// Stable id within the level
    pub id: u32,

    /// Center position
    pub position: FixedVec2,

    /// Velocity in px/frame (zero for melee hitboxes)
    pub velocity: FixedVec2,

    /// Full width and height
    pub size: FixedVec2,

    /// Owning side
    pub faction: Faction,

    /// Remaining active ticks; `None` travels until it hits or leaves
    pub ttl: Option<u32>,

    /// Damage on impact
    pub damage: u32,

    /// Marked for removal at the end of the tick
    pub spent: bool,
}

impl Projectile {
    /// Axis-aligned hitbox.
    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.position, self.size)
    }

    /// Melee hitboxes ride along with the player.
    #[inline]
    pub fn is_melee(&self) -> bool {
        self.faction == Faction::Player
    }
}

// =============================================================================
// OBSTACLES
// =============================================================================

/// Axis a moving platform travels along.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Horizontal
    #[default]
    X,
    /// Vertical
    Y,
}

/// Solid rectangle the player can stand on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    /// Current center position
    pub position: FixedVec2,
    /// Full width and height
    pub size: FixedVec2,
    /// Display color (0xRRGGBB), passed through to the renderer
    pub color: u32,
    /// Oscillates around `origin`
    pub moving: bool,
    /// Oscillation axis
    pub axis: Axis,
    /// Oscillation amplitude in px
    pub range: Fixed,
    /// Phase advance in turns per frame
    pub speed: Fixed,
    /// Center of oscillation
    pub origin: FixedVec2,
    /// Current phase in turns
    pub phase: Fixed,
}

impl Platform {
    /// A static platform.
    pub fn fixed(position: FixedVec2, size: FixedVec2) -> Self {
        Self {
            position,
            size,
            color: 0x8B5A2B,
            moving: false,
            axis: Axis::X,
            range: 0,
            speed: 0,
            origin: position,
            phase: 0,
        }
    }

    /// Axis-aligned box.
    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.position, self.size)
    }
}

/// What a hidden block gives when struck.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockContent {
    /// Same effect as picking up a collectible of this kind
    pub kind: CollectibleKind,
    /// Score / heal amount
    pub value: u32,
}

/// Invisible block revealed by striking it from below.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiddenBlock {
    /// Stable id within the level
    pub id: u32,
    /// Center position
    pub position: FixedVec2,
    /// Full width and height
    pub size: FixedVec2,
    /// Content, granted at most once
    pub content: Option<BlockContent>,
    /// Visible and solid
    pub revealed: bool,
    /// Content has been granted
    pub hit: bool,
}

impl HiddenBlock {
    /// Axis-aligned box.
    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.position, self.size)
    }
}

/// One-way respawn marker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Stable id within the level
    pub id: u32,
    /// Center position
    pub position: FixedVec2,
    /// Full width and height
    pub size: FixedVec2,
    /// Once true, stays true until the level reloads
    pub activated: bool,
}

/// Hazard family (visual only; all share the same trigger rules).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardKind {
    /// Floor spikes
    Spikes,
    /// Desert sandstorm
    Sandstorm,
    /// Jungle snare
    JungleTrap,
    /// Security drone zap
    Drone,
    /// Searchlight
    Spotlight,
}

/// Area that damages the player on proximity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hazard {
    /// Stable id within the level
    pub id: u32,
    /// Family
    pub kind: HazardKind,
    /// Center position
    pub position: FixedVec2,
    /// Proximity radius in px
    pub trigger_radius: Fixed,
    /// Damage per trigger
    pub damage: u32,
}

/// Pickup family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectibleKind {
    /// Score
    Bone,
    /// Rare score
    Visa,
    /// Heals
    Snack,
    /// Mushroom power-up: absorbs the next hit, doubles melee damage
    PowerUp,
    /// Temporary invincibility
    Treat,
    /// Extra life and +1 max health
    Heart,
}

/// Pickup placed in the level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collectible {
    /// Stable id within the level
    pub id: u32,
    /// Family
    pub kind: CollectibleKind,
    /// Center position
    pub position: FixedVec2,
    /// Score / heal amount
    pub value: u32,
    /// Marked for removal at the end of the tick
    pub collected: bool,
}

// =============================================================================
// LEVEL GEOMETRY
// =============================================================================

/// Horizontal extent of the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelBounds {
    /// Left edge
    pub min: Fixed,
    /// Right edge
    pub max: Fixed,
}

/// Level exit trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exit {
    /// Center of the trigger zone
    pub position: FixedVec2,
    /// Full width of the trigger zone
    pub trigger_width: Fixed,
}

impl Exit {
    /// True when x lies within the trigger zone (inclusive).
    #[inline]
    pub fn contains_x(&self, x: Fixed) -> bool {
        let half = self.trigger_width >> 1;
        x >= self.position.x.saturating_sub(half) && x <= self.position.x.saturating_add(half)
    }
}

/// Span of x where the ground is missing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitSpan {
    /// Left edge
    pub start: Fixed,
    /// Right edge
    pub end: Fixed,
}

impl PitSpan {
    /// True when x is over the gap.
    #[inline]
    pub fn contains_x(&self, x: Fixed) -> bool {
        x > self.start && x < self.end
    }
}

// =============================================================================
// WORLD STATE
// =============================================================================

/// The single mutable aggregate for one level attempt.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorldState {
    /// Ticks simulated while Playing
    pub tick: u32,

    /// Scheduler phase
    pub phase: GamePhase,

    /// Seed the level RNG was created from (for verification)
    pub rng_seed: u64,

    /// Deterministic RNG state
    pub rng: DeterministicRng,

    /// World index
    pub world_index: u8,

    /// Level index within the world
    pub level_index: u8,

    /// Exit is gated behind a living boss
    pub boss_level: bool,

    /// Level height in px (ground fallback is measured from here)
    pub level_height: Fixed,

    /// Level spawn point
    pub spawn: FixedVec2,

    /// Horizontal extent
    pub bounds: LevelBounds,

    /// Exit trigger
    pub exit: Exit,

    /// Gaps in the ground
    pub pits: Vec<PitSpan>,

    /// The player
    pub player: PlayerState,

    /// Active enemies
    pub enemies: Vec<Enemy>,

    /// Live projectiles and melee hitboxes
    pub projectiles: Vec<Projectile>,

    /// Solid platforms
    pub platforms: Vec<Platform>,

    /// Hidden blocks
    pub hidden_blocks: Vec<HiddenBlock>,

    /// Checkpoints
    pub checkpoints: Vec<Checkpoint>,

    /// Hazards
    pub hazards: Vec<Hazard>,

    /// Uncollected pickups
    pub collectibles: Vec<Collectible>,

    /// Last activated checkpoint's respawn point
    pub respawn_point: Option<FixedVec2>,

    /// Camera left edge in level coordinates
    pub camera_x: Fixed,

    /// Score
    pub score: u32,

    /// Exit reached; the session will load the next level
    pub level_complete: bool,

    /// Player stood in the exit zone last tick (edge detection for
    /// the blocked-exit notification)
    pub in_exit_zone: bool,

    /// Next projectile id (monotonic counter)
    pub next_projectile_id: u32,

    /// Events generated this tick (cleared each tick)
    #[serde(skip)]
    pub pending_events: Vec<GameEvent>,
}

impl WorldState {
    /// Create an empty world around a spawn point. Level construction
    /// fills in the rest.
    pub fn new(rng_seed: u64, spawn: FixedVec2, player: PlayerState) -> Self {
        Self {
            tick: 0,
            phase: GamePhase::Loading,
            rng_seed,
            rng: DeterministicRng::new(rng_seed),
            world_index: 0,
            level_index: 0,
            boss_level: false,
            level_height: from_int(600),
            spawn,
            bounds: LevelBounds { min: 0, max: from_int(2400) },
            exit: Exit { position: spawn, trigger_width: from_int(70) },
            pits: Vec::new(),
            player,
            enemies: Vec::new(),
            projectiles: Vec::new(),
            platforms: Vec::new(),
            hidden_blocks: Vec::new(),
            checkpoints: Vec::new(),
            hazards: Vec::new(),
            collectibles: Vec::new(),
            respawn_point: None,
            camera_x: 0,
            score: 0,
            level_complete: false,
            in_exit_zone: false,
            next_projectile_id: 0,
            pending_events: Vec::new(),
        }
    }

    /// Where the player reappears after losing a life.
    pub fn respawn_target(&self) -> FixedVec2 {
        self.respawn_point.unwrap_or(self.spawn)
    }

    /// A boss is still standing.
    pub fn living_boss(&self) -> bool {
        self.enemies.iter().any(|e| e.is_boss && e.is_alive())
    }

    /// A melee hitbox is active.
    pub fn player_is_attacking(&self) -> bool {
        self.projectiles.iter().any(|p| p.is_melee() && !p.spent)
    }

    /// Allocate a projectile id.
    pub fn next_projectile_id(&mut self) -> u32 {
        let id = self.next_projectile_id;
        self.next_projectile_id = self.next_projectile_id.wrapping_add(1);
        id
    }

    /// Add to the score.
    pub fn add_score(&mut self, amount: u32) -> u32 {
        self.score = self.score.saturating_add(amount);
        self.score
    }

    /// Drop everything marked for removal this tick.
    pub fn compact(&mut self) {
        self.enemies.retain(|e| e.is_alive());
        self.projectiles.retain(|p| !p.spent);
        self.collectibles.retain(|c| !c.collected);
    }

    /// Compute deterministic hash of the world.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, self.rng_seed, |hasher| {
            hasher.update_u8(self.phase as u8);
            hasher.update_u8(self.world_index);
            hasher.update_u8(self.level_index);
            let [s0, s1] = self.rng.state();
            hasher.update_u64(s0);
            hasher.update_u64(s1);

            self.player.hash_into(hasher);

            for enemy in &self.enemies {
                enemy.hash_into(hasher);
            }

            for projectile in &self.projectiles {
                hasher.update_u32(projectile.id);
                hasher.update_vec2(projectile.position);
                hasher.update_u8(projectile.faction as u8);
                hasher.update_opt_u32(projectile.ttl);
            }

            for platform in &self.platforms {
                hasher.update_vec2(platform.position);
            }

            for block in &self.hidden_blocks {
                hasher.update_bool(block.revealed);
                hasher.update_bool(block.hit);
            }

            for checkpoint in &self.checkpoints {
                hasher.update_bool(checkpoint.activated);
            }

            for collectible in &self.collectibles {
                hasher.update_u32(collectible.id);
            }

            hasher.update_fixed(self.camera_x);
            hasher.update_u32(self.score);
            hasher.update_bool(self.level_complete);
        })
    }

    /// Take pending events, ordered by tick then priority.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        let mut events = std::mem::take(&mut self.pending_events);
        events.sort_by_key(|e| (e.tick, e.priority));
        events
    }

    /// Push a game event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::to_fixed;

    fn world() -> WorldState {
        let spawn = FixedVec2::from_ints(100, 500);
        WorldState::new(7, spawn, PlayerState::new(spawn, 3, 3))
    }

    #[test]
    fn test_player_timers_saturate() {
        let mut player = PlayerState::new(FixedVec2::ZERO, 3, 3);
        player.invincible_ticks = 1;
        player.tick_timers();
        player.tick_timers();
        assert_eq!(player.invincible_ticks, 0);
        assert!(!player.is_invincible());
    }

    #[test]
    fn test_health_clamped_to_max() {
        let mut player = PlayerState::new(FixedVec2::ZERO, 3, 3);
        player.set_health(10);
        assert_eq!(player.health, 3);
        player.health = 1;
        player.heal(5);
        assert_eq!(player.health, 3);
    }

    #[test]
    fn test_abilities_cap_at_three() {
        let mut abilities = Abilities::default();
        assert!(abilities.upgrade(AbilityKind::Dash));
        assert!(abilities.upgrade(AbilityKind::Dash));
        assert!(!abilities.upgrade(AbilityKind::Dash));
        assert_eq!(abilities.level(AbilityKind::Dash), 3);

        let wild = Abilities { bark: 0, dig: 9, dash: 2 }.sanitized();
        assert_eq!(wild, Abilities { bark: 1, dig: 3, dash: 2 });
    }

    #[test]
    fn test_exit_zone_inclusive() {
        let exit = Exit { position: FixedVec2::from_ints(100, 0), trigger_width: to_fixed(70.0) };
        assert!(exit.contains_x(to_fixed(65.0)));
        assert!(exit.contains_x(to_fixed(135.0)));
        assert!(!exit.contains_x(to_fixed(136.0)));
    }

    #[test]
    fn test_compact_removes_marked() {
        let mut w = world();
        let mut dead = Enemy::new(1, EnemyKind::Cat, FixedVec2::ZERO, to_fixed(2.0));
        dead.health = 0;
        dead.defeated = true;
        w.enemies.push(dead);
        w.enemies.push(Enemy::new(2, EnemyKind::Frog, FixedVec2::ZERO, to_fixed(1.0)));
        w.compact();
        assert_eq!(w.enemies.len(), 1);
        assert_eq!(w.enemies[0].id, 2);
    }

    #[test]
    fn test_hash_changes_with_state() {
        let mut w = world();
        let before = w.compute_hash();
        assert_eq!(before, world().compute_hash());
        w.player.position.x += 1;
        assert_ne!(before, w.compute_hash());
    }

    #[test]
    fn test_living_boss() {
        let mut w = world();
        assert!(!w.living_boss());
        w.enemies.push(Enemy::new(1, EnemyKind::Boss, FixedVec2::ZERO, to_fixed(1.0)));
        assert!(w.living_boss());
        w.enemies[0].health = 0;
        assert!(!w.living_boss());
    }
}
