//! Level Data
//!
//! Level files describe geometry in plain pixel floats so they stay
//! editable by hand. They are converted to fixed-point exactly once, when
//! a [`WorldState`] is built; the tick loop never sees a float.
//!
//! Three sources implement [`LevelProvider`]: a directory of JSON files, a
//! seeded procedural generator, and the built-in fallback level used
//! whenever the others fail.

use std::f64::consts::TAU;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::{Serialize, Deserialize};
use tracing::{debug, info, warn};

use crate::core::fixed::{Fixed, FIXED_ONE, from_int, to_fixed};
use crate::core::rng::{derive_level_seed, DeterministicRng};
use crate::core::vec2::FixedVec2;
use crate::error::LevelError;
use crate::game::config::SimConfig;
use crate::game::progression::{is_boss_level, LEVELS_PER_WORLD, WORLD_COUNT};
use crate::game::state::{
    Abilities, Axis, BlockContent, Checkpoint, Collectible, CollectibleKind, Enemy, EnemyKind,
    Exit, Hazard, HazardKind, HiddenBlock, LevelBounds, PitSpan, Platform, PlayerState, WorldState,
};

/// Largest coordinate magnitude a level may use, in pixels. Q16.16 tops
/// out near 32767 px and the tick adds margins past the level edges.
pub const MAX_EXTENT: f64 = 16_000.0;

/// Fastest enemy base speed a level may ask for, in pixels per frame.
pub const MAX_ENEMY_SPEED: f64 = 64.0;

/// Default level height when a file leaves it out.
const DEFAULT_HEIGHT: f64 = 600.0;

/// Default exit trigger width.
const DEFAULT_EXIT_WIDTH: f64 = 70.0;

/// Default platform color (brown).
const DEFAULT_COLOR: u32 = 0x8B4513;

/// Patrol half-span for enemies without an explicit patrol area.
const DEFAULT_PATROL: f64 = 150.0;

// =============================================================================
// LEVEL FILE SCHEMA
// =============================================================================

/// A point as `[x, y]` (a trailing z from 3D tooling is ignored).
pub type Coords = Vec<f64>;

/// Horizontal extent in px.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundsData {
    /// Left edge
    pub min: f64,
    /// Right edge
    pub max: f64,
}

/// Patrol start direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Toward smaller x
    Left,
    /// Toward larger x
    #[default]
    Right,
}

/// Platform entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformData {
    /// Center
    pub position: Coords,
    /// Width, height
    pub size: Coords,
    /// `#RRGGBB`
    #[serde(default)]
    pub color: Option<String>,
    /// Oscillates
    #[serde(default)]
    pub moving: bool,
    /// Oscillation axis
    #[serde(default)]
    pub axis: Axis,
    /// Amplitude in px
    #[serde(default)]
    pub range: f64,
    /// Angular speed in radians per second
    #[serde(default)]
    pub movement_speed: f64,
}

/// Hidden block entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HiddenBlockData {
    /// Center
    pub position: Coords,
    /// Width, height (defaults to 40×40)
    #[serde(default)]
    pub size: Option<Coords>,
    /// Granted when struck
    #[serde(default)]
    pub content: Option<BlockContent>,
}

/// Enemy entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyData {
    /// Resting center
    pub position: Coords,
    /// Behavior family
    #[serde(rename = "type")]
    pub kind: EnemyKind,
    /// `[min_x, max_x]`
    #[serde(default)]
    pub patrol_area: Option<[f64; 2]>,
    /// Base speed in px/frame
    #[serde(default = "default_enemy_speed")]
    pub speed: f64,
    /// Initial heading
    #[serde(default)]
    pub direction: Direction,
    /// Gates the exit
    #[serde(default)]
    pub is_boss: bool,
}

fn default_enemy_speed() -> f64 {
    2.0
}

/// Collectible entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CollectibleData {
    /// Center
    pub position: Coords,
    /// Family
    #[serde(rename = "type")]
    pub kind: CollectibleKind,
    /// Score / heal amount (per-kind default when absent)
    #[serde(default)]
    pub value: Option<u32>,
}

/// Hazard entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardData {
    /// Center
    pub position: Coords,
    /// Family
    #[serde(rename = "type")]
    pub kind: HazardKind,
    /// Proximity radius in px
    #[serde(default = "default_trigger_radius")]
    pub trigger_radius: f64,
    /// Damage per trigger
    #[serde(default = "default_hazard_damage")]
    pub damage: u32,
}

fn default_trigger_radius() -> f64 {
    30.0
}

fn default_hazard_damage() -> u32 {
    1
}

/// Checkpoint entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckpointData {
    /// Center
    pub position: Coords,
}

/// One level as stored on disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelData {
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Level height in px
    #[serde(default = "default_height")]
    pub height: f64,
    /// Player spawn
    pub player_spawn: Coords,
    /// Horizontal extent
    pub bounds: BoundsData,
    /// Exit position
    pub exit: Coords,
    /// Exit trigger width
    #[serde(default = "default_exit_width")]
    pub exit_width: f64,
    /// Solid platforms
    #[serde(default)]
    pub platforms: Vec<PlatformData>,
    /// Hidden blocks
    #[serde(default)]
    pub hidden_blocks: Vec<HiddenBlockData>,
    /// Enemies
    #[serde(default)]
    pub enemies: Vec<EnemyData>,
    /// Pickups
    #[serde(default)]
    pub collectibles: Vec<CollectibleData>,
    /// Hazards
    #[serde(default)]
    pub hazards: Vec<HazardData>,
    /// Checkpoints
    #[serde(default)]
    pub checkpoints: Vec<CheckpointData>,
    /// Gaps in the ground as `[start_x, end_x]`
    #[serde(default)]
    pub pits: Vec<[f64; 2]>,
}

fn default_height() -> f64 {
    DEFAULT_HEIGHT
}

fn default_exit_width() -> f64 {
    DEFAULT_EXIT_WIDTH
}

impl LevelData {
    /// Parse a level, locating errors by field path.
    pub fn from_json_str(json: &str) -> Result<Self, LevelError> {
        let de = &mut serde_json::Deserializer::from_str(json);
        serde_path_to_error::deserialize(de).map_err(|e| LevelError::Malformed {
            path: e.path().to_string(),
            message: e.inner().to_string(),
        })
    }
}

// =============================================================================
// PROVIDERS
// =============================================================================

/// Source of level data.
pub trait LevelProvider {
    /// Load one level.
    fn load(&self, world: u8, level: u8) -> Result<LevelData, LevelError>;
}

impl<T: LevelProvider + ?Sized> LevelProvider for Box<T> {
    fn load(&self, world: u8, level: u8) -> Result<LevelData, LevelError> {
        (**self).load(world, level)
    }
}

/// Levels stored as `world-{w}/level-{l}.json` under a root directory.
#[derive(Clone, Debug)]
pub struct JsonLevelDirectory {
    root: PathBuf,
}

impl JsonLevelDirectory {
    /// Use levels under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// File path for a level.
    pub fn path_for(&self, world: u8, level: u8) -> PathBuf {
        self.root.join(format!("world-{world}")).join(format!("level-{level}.json"))
    }
}

impl LevelProvider for JsonLevelDirectory {
    fn load(&self, world: u8, level: u8) -> Result<LevelData, LevelError> {
        let path = self.path_for(world, level);
        let raw = fs::read_to_string(&path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => LevelError::NotFound(path.display().to_string()),
            _ => LevelError::Io { path: path.display().to_string(), source },
        })?;
        LevelData::from_json_str(&raw)
    }
}

/// Procedural levels, reproducible from a seed.
///
/// Length grows with world and level (5000 + world·1000 + level·500 px);
/// obstacles are spread evenly along it with seeded jitter.
#[derive(Clone, Copy, Debug)]
pub struct GeneratedLevels {
    seed: u64,
    height: f64,
}

impl GeneratedLevels {
    /// Generator for a seed, sized to a viewport height.
    pub fn new(seed: u64, height: f64) -> Self {
        Self { seed, height }
    }

    /// Level length in px.
    pub fn length(world: u8, level: u8) -> f64 {
        5000.0 + world as f64 * 1000.0 + level as f64 * 500.0
    }
}

impl LevelProvider for GeneratedLevels {
    fn load(&self, world: u8, level: u8) -> Result<LevelData, LevelError> {
        Ok(generate(self.seed, world, level, self.height))
    }
}

/// The built-in level: flat ground, no enemies, exit near the far end.
pub fn fallback_level() -> LevelData {
    LevelData {
        name: Some("Fallback".to_string()),
        height: DEFAULT_HEIGHT,
        player_spawn: vec![100.0, DEFAULT_HEIGHT - 100.0],
        bounds: BoundsData { min: 0.0, max: 2000.0 },
        exit: vec![1900.0, DEFAULT_HEIGHT - 100.0],
        exit_width: DEFAULT_EXIT_WIDTH,
        platforms: Vec::new(),
        hidden_blocks: Vec::new(),
        enemies: Vec::new(),
        collectibles: Vec::new(),
        hazards: Vec::new(),
        checkpoints: Vec::new(),
        pits: Vec::new(),
    }
}

// =============================================================================
// GENERATOR
// =============================================================================

#[inline]
fn to_px(value: Fixed) -> f64 {
    value as f64 / FIXED_ONE as f64
}

/// Uniform px in `[min, max)`.
fn jitter(rng: &mut DeterministicRng, min: i32, max: i32) -> f64 {
    to_px(rng.next_fixed_range(from_int(min), from_int(max)))
}

fn world_color(world: u8) -> &'static str {
    match world {
        0 => "#8B4513",
        1 => "#228B22",
        2 => "#CDAA7D",
        3 => "#708090",
        _ => "#FFFFFF",
    }
}

fn enemy_pool(world: u8) -> &'static [EnemyKind] {
    match world {
        0 => &[EnemyKind::Cat, EnemyKind::Snake, EnemyKind::Drone, EnemyKind::Frog],
        1 => &[EnemyKind::Cat, EnemyKind::Frog, EnemyKind::Fish, EnemyKind::Mouse],
        2 => &[EnemyKind::Snake, EnemyKind::Frog, EnemyKind::Fish, EnemyKind::Shark],
        3 => &[EnemyKind::Cat, EnemyKind::Drone, EnemyKind::Mouse],
        _ => &[EnemyKind::Drone, EnemyKind::Cat, EnemyKind::Shark, EnemyKind::Mouse],
    }
}

fn hazard_pool(world: u8) -> &'static [HazardKind] {
    match world {
        0 => &[HazardKind::Sandstorm, HazardKind::Spikes],
        1 | 2 => &[HazardKind::JungleTrap, HazardKind::Spikes],
        3 => &[HazardKind::Drone, HazardKind::Spotlight],
        _ => &[HazardKind::Spotlight, HazardKind::Drone, HazardKind::Spikes],
    }
}

fn default_value(kind: CollectibleKind) -> u32 {
    match kind {
        CollectibleKind::Bone => 10,
        CollectibleKind::Visa => 50,
        _ => 1,
    }
}

/// Build one procedural level.
pub fn generate(seed: u64, world: u8, level: u8, height: f64) -> LevelData {
    let mut rng = DeterministicRng::for_level(seed, world, level);
    let length = GeneratedLevels::length(world, level);
    let ground = height - 70.0;

    let mut data = LevelData {
        name: Some(format!("World {} - Level {}", world + 1, level + 1)),
        height,
        player_spawn: vec![100.0, height - 100.0],
        bounds: BoundsData { min: 0.0, max: length },
        exit: vec![length - 100.0, height - 100.0],
        exit_width: DEFAULT_EXIT_WIDTH,
        ..fallback_level()
    };

    // Platforms: 5-9, every third one moving
    let count = 5 + rng.next_int(5);
    for i in 0..count {
        let moving = i % 3 == 2;
        data.platforms.push(PlatformData {
            position: vec![300.0 + i as f64 * (length / count as f64), height - 150.0 - jitter(&mut rng, 0, 200)],
            size: vec![jitter(&mut rng, 100, 200), jitter(&mut rng, 20, 30)],
            color: Some(world_color(world).to_string()),
            moving,
            axis: if i % 2 == 0 { Axis::X } else { Axis::Y },
            range: if moving { 60.0 } else { 0.0 },
            movement_speed: if moving { 1.5 } else { 0.0 },
        });
    }

    // Enemies: 3-7, some perched higher up
    let pool = enemy_pool(world);
    let count = 3 + rng.next_int(5);
    for i in 0..count {
        let x = 500.0 + i as f64 * (length / count as f64);
        let lifted = rng.next_bool(to_fixed(0.3));
        let y = if lifted { ground - jitter(&mut rng, 0, 200) } else { ground };
        let kind = rng.choose(pool).copied().unwrap_or(EnemyKind::Cat);
        data.enemies.push(EnemyData {
            position: vec![x, y],
            kind,
            patrol_area: Some([x - DEFAULT_PATROL, x + DEFAULT_PATROL]),
            speed: jitter(&mut rng, 1, 3),
            direction: if rng.next_direction() < 0 { Direction::Left } else { Direction::Right },
            is_boss: false,
        });
    }

    if is_boss_level(level) {
        let x = length - 400.0;
        data.enemies.push(EnemyData {
            position: vec![x, ground - 20.0],
            kind: EnemyKind::Boss,
            patrol_area: Some([x - 300.0, x + 200.0]),
            speed: 1.5,
            direction: Direction::Left,
            is_boss: true,
        });
    }

    // Hazards: 4-7
    let pool = hazard_pool(world);
    let count = 4 + rng.next_int(4);
    for i in 0..count {
        let kind = rng.choose(pool).copied().unwrap_or(HazardKind::Spikes);
        data.hazards.push(HazardData {
            position: vec![400.0 + i as f64 * (length / count as f64), ground],
            kind,
            trigger_radius: jitter(&mut rng, 15, 30),
            damage: 1,
        });
    }

    // Collectibles: 5-9 bones, visas, and snacks
    let kinds = [CollectibleKind::Bone, CollectibleKind::Visa, CollectibleKind::Snack];
    let count = 5 + rng.next_int(5);
    for i in 0..count {
        let kind = rng.choose(&kinds).copied().unwrap_or(CollectibleKind::Bone);
        data.collectibles.push(CollectibleData {
            position: vec![250.0 + i as f64 * (length / count as f64), height - 100.0 - jitter(&mut rng, 0, 200)],
            kind,
            value: Some(default_value(kind)),
        });
    }

    // A power-up and a treat hidden in blocks
    for (fraction, kind) in [(0.3, CollectibleKind::PowerUp), (0.7, CollectibleKind::Treat)] {
        data.hidden_blocks.push(HiddenBlockData {
            position: vec![length * fraction, height - 210.0],
            size: None,
            content: Some(BlockContent { kind, value: 1 }),
        });
    }

    data.checkpoints.push(CheckpointData { position: vec![length / 2.0, height - 100.0] });

    // Pits from the second world on, away from spawn, checkpoint, and exit
    for i in 0..world as u32 {
        let start = length * (i as f64 + 1.0) / (world as f64 + 1.0) + 200.0;
        data.pits.push([start, start + 120.0]);
    }

    data
}

// =============================================================================
// WORLD CONSTRUCTION
// =============================================================================

/// Player progress carried from one level into the next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Carryover {
    /// Score so far
    pub score: u32,
    /// Lives left
    pub lives: u32,
    /// Maximum health
    pub max_health: u32,
    /// Ability levels
    pub abilities: Abilities,
}

impl Carryover {
    /// Fresh start for a new session.
    pub fn new_game(config: &SimConfig) -> Self {
        Self {
            score: 0,
            lives: config.player.starting_lives,
            max_health: config.player.max_health,
            abilities: Abilities::default(),
        }
    }
}

fn point(coords: &[f64], field: &str) -> Result<FixedVec2, LevelError> {
    match coords {
        [x, y, ..] => Ok(FixedVec2::new(px(*x, field)?, px(*y, field)?)),
        _ => Err(LevelError::Invalid(format!("{field} needs two coordinates"))),
    }
}

/// Pixel value to fixed-point, refusing anything outside [`MAX_EXTENT`].
fn px(value: f64, field: &str) -> Result<Fixed, LevelError> {
    if value.is_finite() && value.abs() <= MAX_EXTENT {
        Ok(to_fixed(value))
    } else {
        Err(LevelError::Invalid(format!("{field} = {value} is outside ±{MAX_EXTENT} px")))
    }
}

fn parse_color(color: Option<&str>) -> u32 {
    let Some(color) = color else {
        return DEFAULT_COLOR;
    };
    match hex::decode(color.trim_start_matches('#')) {
        Ok(bytes) if bytes.len() == 3 => {
            (bytes[0] as u32) << 16 | (bytes[1] as u32) << 8 | bytes[2] as u32
        }
        _ => {
            warn!(color, "unreadable platform color, using default");
            DEFAULT_COLOR
        }
    }
}

/// Radians per second to turns per frame at 60 fps.
#[inline]
fn turns_per_frame(radians_per_second: f64) -> Fixed {
    to_fixed(radians_per_second / (TAU * 60.0))
}

/// Build a fresh world from level data.
pub fn build_world(
    data: &LevelData,
    world: u8,
    level: u8,
    session_seed: u64,
    carry: &Carryover,
    config: &SimConfig,
) -> Result<WorldState, LevelError> {
    if !(data.bounds.max > data.bounds.min) {
        return Err(LevelError::Invalid("bounds.max must exceed bounds.min".to_string()));
    }
    if !(data.height > 0.0) {
        return Err(LevelError::Invalid("height must be positive".to_string()));
    }

    let spawn = point(&data.player_spawn, "playerSpawn")?;
    let mut player = PlayerState::new(spawn, carry.max_health, carry.lives);
    player.abilities = carry.abilities.sanitized();

    let seed = derive_level_seed(session_seed, world, level);
    let mut state = WorldState::new(seed, spawn, player);
    state.world_index = world;
    state.level_index = level;
    state.boss_level = is_boss_level(level);
    state.level_height = px(data.height, "height")?;
    state.bounds = LevelBounds { min: px(data.bounds.min, "bounds.min")?, max: px(data.bounds.max, "bounds.max")? };
    state.exit = Exit { position: point(&data.exit, "exit")?, trigger_width: px(data.exit_width, "exitWidth")? };
    state.score = carry.score;
    state.camera_x = state.bounds.min;

    for entry in &data.platforms {
        let position = point(&entry.position, "platforms.position")?;
        let mut platform = Platform::fixed(position, point(&entry.size, "platforms.size")?);
        platform.color = parse_color(entry.color.as_deref());
        if entry.moving {
            platform.moving = true;
            platform.axis = entry.axis;
            platform.range = px(entry.range, "platforms.range")?;
            platform.speed = turns_per_frame(entry.movement_speed);
        }
        state.platforms.push(platform);
    }

    for (id, entry) in data.hidden_blocks.iter().enumerate() {
        let size = match &entry.size {
            Some(size) => point(size, "hiddenBlocks.size")?,
            None => FixedVec2::from_ints(40, 40),
        };
        state.hidden_blocks.push(HiddenBlock {
            id: id as u32,
            position: point(&entry.position, "hiddenBlocks.position")?,
            size,
            content: entry.content,
            revealed: false,
            hit: false,
        });
    }

    for entry in &data.enemies {
        let is_boss = entry.is_boss || entry.kind == EnemyKind::Boss;
        if is_boss && !state.boss_level {
            warn!(world, level, "boss placed on a regular level, dropping it");
            continue;
        }
        let id = state.enemies.len() as u32;
        let position = point(&entry.position, "enemies.position")?;
        let enemy = spawn_enemy(id, entry, position, is_boss, &mut state.rng, config)?;
        state.enemies.push(enemy);
    }

    for (id, entry) in data.collectibles.iter().enumerate() {
        state.collectibles.push(Collectible {
            id: id as u32,
            kind: entry.kind,
            position: point(&entry.position, "collectibles.position")?,
            value: entry.value.unwrap_or_else(|| default_value(entry.kind)),
            collected: false,
        });
    }

    for (id, entry) in data.hazards.iter().enumerate() {
        state.hazards.push(Hazard {
            id: id as u32,
            kind: entry.kind,
            position: point(&entry.position, "hazards.position")?,
            trigger_radius: px(entry.trigger_radius, "hazards.triggerRadius")?,
            damage: entry.damage,
        });
    }

    for (id, entry) in data.checkpoints.iter().enumerate() {
        state.checkpoints.push(Checkpoint {
            id: id as u32,
            position: point(&entry.position, "checkpoints.position")?,
            size: FixedVec2::from_ints(20, 60),
            activated: false,
        });
    }

    for &[start, end] in &data.pits {
        let (start, end) = (px(start, "pits")?, px(end, "pits")?);
        state.pits.push(PitSpan { start: start.min(end), end: start.max(end) });
    }

    debug!(
        world,
        level,
        platforms = state.platforms.len(),
        enemies = state.enemies.len(),
        collectibles = state.collectibles.len(),
        "world built"
    );
    Ok(state)
}

fn spawn_enemy(
    id: u32,
    entry: &EnemyData,
    position: FixedVec2,
    is_boss: bool,
    rng: &mut DeterministicRng,
    config: &SimConfig,
) -> Result<Enemy, LevelError> {
    let kind = if is_boss && entry.kind != EnemyKind::Boss {
        // Boss entries keep their art but always use boss behavior
        EnemyKind::Boss
    } else {
        entry.kind
    };

    let (min, max) = match entry.patrol_area {
        Some([a, b]) => {
            let (a, b) = (px(a, "enemies.patrolArea")?, px(b, "enemies.patrolArea")?);
            (a.min(b), a.max(b))
        }
        None => {
            let reach = to_fixed(DEFAULT_PATROL);
            (position.x.saturating_sub(reach), position.x.saturating_add(reach))
        }
    };
    if !(entry.speed.is_finite() && entry.speed.abs() <= MAX_ENEMY_SPEED) {
        let message = format!("enemies.speed = {} is outside ±{MAX_ENEMY_SPEED} px/frame", entry.speed);
        return Err(LevelError::Invalid(message));
    }
    let mut enemy = Enemy::new(id, kind, position, to_fixed(entry.speed)).with_patrol(min, max);
    enemy.direction = match entry.direction {
        Direction::Left => -1,
        Direction::Right => 1,
    };

    if is_boss {
        enemy.is_boss = true;
        enemy.health = kind.base_health() * config.ai.boss_health_multiplier;
        enemy.max_health = enemy.health;
    }

    if kind.shoots() {
        let (low, high) = if is_boss { config.ai.boss_shoot_ticks } else { config.ai.drone_shoot_ticks };
        enemy.shoot_cooldown = Some(rng.next_ticks(low, high));
    }
    Ok(enemy)
}

// =============================================================================
// LOADING
// =============================================================================

/// Clamp a requested level to the valid range, warning when it moves.
pub fn clamp_level_index(world: u8, level: u8) -> (u8, u8) {
    let clamped = (world.min(WORLD_COUNT - 1), level.min(LEVELS_PER_WORLD - 1));
    if clamped != (world, level) {
        warn!(world, level, clamped_world = clamped.0, clamped_level = clamped.1, "level index out of range, clamping");
    }
    clamped
}

/// Load and build a level, falling back to the built-in level on any
/// failure. Never fails.
pub fn load_world(
    provider: &dyn LevelProvider,
    world: u8,
    level: u8,
    session_seed: u64,
    carry: &Carryover,
    config: &SimConfig,
) -> WorldState {
    let (world, level) = clamp_level_index(world, level);

    let built = provider
        .load(world, level)
        .and_then(|data| build_world(&data, world, level, session_seed, carry, config));

    match built {
        Ok(state) => {
            info!(world, level, "level loaded");
            state
        }
        Err(err) => {
            warn!(world, level, error = %err, "level unavailable, using fallback");
            fallback_world(world, level, session_seed, carry, config)
        }
    }
}

fn fallback_world(world: u8, level: u8, session_seed: u64, carry: &Carryover, config: &SimConfig) -> WorldState {
    let data = fallback_level();
    match build_world(&data, world, level, session_seed, carry, config) {
        Ok(state) => state,
        Err(_) => {
            // The built-in level is always valid; this only guards the type
            let spawn = FixedVec2::from_ints(100, 500);
            WorldState::new(session_seed, spawn, PlayerState::new(spawn, carry.max_health, carry.lives))
        }
    }
}
