//! Render snapshot.
//!
//! A read-only copy of what the renderer needs, converted to floats. It is
//! produced every tick, Paused and GameOver included, and nothing in it
//! flows back into the simulation.

use serde::{Serialize, Deserialize};

use crate::core::fixed::to_float;
use crate::core::vec2::FixedVec2;
use crate::game::state::{
    Abilities, CollectibleKind, EnemyKind, Faction, GamePhase, HazardKind, WorldState,
};

/// Rectangle in level pixels (center and full size).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RectView {
    /// Center x
    pub x: f32,
    /// Center y
    pub y: f32,
    /// Width
    pub w: f32,
    /// Height
    pub h: f32,
}

impl RectView {
    fn new(position: FixedVec2, size: FixedVec2) -> Self {
        let (x, y) = position.to_floats();
        let (w, h) = size.to_floats();
        Self { x, y, w, h }
    }
}

/// The player as drawn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    /// Hitbox
    pub rect: RectView,
    /// Velocity x
    pub vx: f32,
    /// Velocity y
    pub vy: f32,
    /// -1 or 1
    pub facing: i8,
    /// On the ground
    pub grounded: bool,
    /// Current health
    pub health: u32,
    /// Maximum health
    pub max_health: u32,
    /// Lives left
    pub lives: u32,
    /// Power-up active
    pub powered_up: bool,
    /// Flashing after a hit
    pub invincible: bool,
    /// Dug in
    pub hidden: bool,
    /// Dashing
    pub dashing: bool,
    /// Melee swing active
    pub attacking: bool,
    /// Ability levels
    pub abilities: Abilities,
}

/// An enemy as drawn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyView {
    /// Stable id
    pub id: u32,
    /// Kind (sprite selection)
    pub kind: EnemyKind,
    /// Hitbox
    pub rect: RectView,
    /// -1 or 1
    pub direction: i8,
    /// Health
    pub health: u32,
    /// Health at spawn
    pub max_health: u32,
    /// Boss flag
    pub is_boss: bool,
    /// Stunned by a bark
    pub stunned: bool,
}

/// A projectile or melee hitbox.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectileView {
    /// Stable id
    pub id: u32,
    /// Hitbox
    pub rect: RectView,
    /// Owning side
    pub faction: Faction,
}

/// A platform or revealed block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlatformView {
    /// Box
    pub rect: RectView,
    /// 0xRRGGBB
    pub color: u32,
}

/// A pickup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CollectibleView {
    /// Stable id
    pub id: u32,
    /// Kind
    pub kind: CollectibleKind,
    /// Center x
    pub x: f32,
    /// Center y
    pub y: f32,
}

/// A hazard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HazardView {
    /// Kind
    pub kind: HazardKind,
    /// Center x
    pub x: f32,
    /// Center y
    pub y: f32,
    /// Trigger radius
    pub radius: f32,
}

/// A checkpoint flag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckpointView {
    /// Box
    pub rect: RectView,
    /// Raised
    pub activated: bool,
}

/// Everything the renderer needs for one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    /// Simulation tick
    pub tick: u32,
    /// Scheduler phase
    pub phase: GamePhase,
    /// World index
    pub world: u8,
    /// Level index
    pub level: u8,
    /// Camera left edge
    pub camera_x: f32,
    /// Score
    pub score: u32,
    /// Bones this level
    pub bones: u32,
    /// Visas this level
    pub visas: u32,
    /// The player
    pub player: PlayerView,
    /// Living enemies
    pub enemies: Vec<EnemyView>,
    /// Live projectiles
    pub projectiles: Vec<ProjectileView>,
    /// Platforms
    pub platforms: Vec<PlatformView>,
    /// Revealed hidden blocks only
    pub blocks: Vec<RectView>,
    /// Uncollected pickups
    pub collectibles: Vec<CollectibleView>,
    /// Hazards
    pub hazards: Vec<HazardView>,
    /// Checkpoints
    pub checkpoints: Vec<CheckpointView>,
    /// Exit center x
    pub exit_x: f32,
    /// Exit center y
    pub exit_y: f32,
    /// Exit is passable (no living boss gating it)
    pub exit_open: bool,
}

impl RenderSnapshot {
    /// Copy the drawable parts of the world.
    pub fn capture(state: &WorldState) -> Self {
        let player = &state.player;
        let (vx, vy) = player.velocity.to_floats();
        let (exit_x, exit_y) = state.exit.position.to_floats();

        Self {
            tick: state.tick,
            phase: state.phase,
            world: state.world_index,
            level: state.level_index,
            camera_x: to_float(state.camera_x),
            score: state.score,
            bones: player.bones,
            visas: player.visas,
            player: PlayerView {
                rect: RectView::new(player.position, player.size),
                vx,
                vy,
                facing: player.facing,
                grounded: player.grounded,
                health: player.health,
                max_health: player.max_health,
                lives: player.lives,
                powered_up: player.is_powered_up(),
                invincible: player.is_invincible(),
                hidden: player.is_hidden(),
                dashing: player.is_dashing(),
                attacking: state.player_is_attacking(),
                abilities: player.abilities,
            },
            enemies: state
                .enemies
                .iter()
                .filter(|e| e.is_alive())
                .map(|e| EnemyView {
                    id: e.id,
                    kind: e.kind,
                    rect: RectView::new(e.position, e.size),
                    direction: e.direction,
                    health: e.health,
                    max_health: e.max_health,
                    is_boss: e.is_boss,
                    stunned: e.is_stunned(),
                })
                .collect(),
            projectiles: state
                .projectiles
                .iter()
                .filter(|p| !p.spent)
                .map(|p| ProjectileView { id: p.id, rect: RectView::new(p.position, p.size), faction: p.faction })
                .collect(),
            platforms: state
                .platforms
                .iter()
                .map(|p| PlatformView { rect: RectView::new(p.position, p.size), color: p.color })
                .collect(),
            blocks: state
                .hidden_blocks
                .iter()
                .filter(|b| b.revealed)
                .map(|b| RectView::new(b.position, b.size))
                .collect(),
            collectibles: state
                .collectibles
                .iter()
                .filter(|c| !c.collected)
                .map(|c| {
                    let (x, y) = c.position.to_floats();
                    CollectibleView { id: c.id, kind: c.kind, x, y }
                })
                .collect(),
            hazards: state
                .hazards
                .iter()
                .map(|h| {
                    let (x, y) = h.position.to_floats();
                    HazardView { kind: h.kind, x, y, radius: to_float(h.trigger_radius) }
                })
                .collect(),
            checkpoints: state
                .checkpoints
                .iter()
                .map(|c| CheckpointView { rect: RectView::new(c.position, c.size), activated: c.activated })
                .collect(),
            exit_x,
            exit_y,
            exit_open: !(state.boss_level && state.living_boss()),
        }
    }

    /// Serialize for an external renderer.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::FIXED_ONE;
    use crate::game::state::{Enemy, HiddenBlock, PlayerState};

    #[test]
    fn test_capture_converts_and_filters() {
        let spawn = FixedVec2::from_ints(100, 500);
        let mut w = WorldState::new(1, spawn, PlayerState::new(spawn, 3, 3));
        w.camera_x = FIXED_ONE * 3 / 2;
        w.boss_level = true;
        w.enemies.push(Enemy::new(0, EnemyKind::Boss, FixedVec2::from_ints(400, 500), FIXED_ONE));
        let mut gone = Enemy::new(1, EnemyKind::Cat, FixedVec2::from_ints(300, 500), FIXED_ONE);
        gone.defeated = true;
        w.enemies.push(gone);
        w.hidden_blocks.push(HiddenBlock {
            id: 0,
            position: FixedVec2::from_ints(200, 400),
            size: FixedVec2::from_ints(40, 40),
            content: None,
            revealed: false,
            hit: false,
        });

        let snap = RenderSnapshot::capture(&w);
        assert_eq!(snap.camera_x, 1.5);
        assert_eq!(snap.player.rect, RectView { x: 100.0, y: 500.0, w: 40.0, h: 40.0 });
        assert_eq!(snap.enemies.len(), 1);
        assert!(snap.blocks.is_empty());
        assert!(!snap.exit_open);
        assert!(snap.to_json().unwrap().contains("\"phase\":\"Loading\""));
    }
}
