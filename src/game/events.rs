//! Game Events
//!
//! Discrete events emitted during simulation. The host's feedback layer
//! (sound, screen shake, HUD flashes) consumes them from
//! [`TickResult::events`](crate::game::tick::TickResult); nothing is awaited
//! or returned. Each event maps to at most one named [`FeedbackCue`].

use serde::{Serialize, Deserialize};
use crate::core::vec2::FixedVec2;
use crate::game::state::{AbilityKind, CollectibleKind, BlockContent, EnemyKind, GamePhase};

/// Priority for event processing order.
///
/// Lower value = processed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Damage to anyone
    Damage = 0,
    /// Enemies leaving the active set
    Defeat = 1,
    /// Pickups and revealed blocks
    Pickup = 2,
    /// Checkpoints and lives
    Checkpoint = 3,
    /// Level and phase transitions
    Progression = 4,
    /// Lowest priority
    Other = 255,
}

/// Named cue for the feedback collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeedbackCue {
    /// Something took damage
    Hit,
    /// Something good happened
    Success,
    /// An enemy was defeated
    EnemyDefeated,
    /// A checkpoint was activated
    CheckpointSaved,
    /// The level exit was reached
    LevelComplete,
}

/// How the player hurt an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HitSource {
    /// Melee hitbox
    Melee,
    /// Landed on its head
    Stomp,
}

/// What hurt the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageSource {
    /// Touched an enemy
    Contact,
    /// Shot by an enemy
    Projectile,
    /// Stood in a hazard
    Hazard,
    /// Fell into a pit
    Pit,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Player damaged an enemy
    EnemyHit {
        /// Enemy id
        enemy_id: u32,
        /// Damage dealt
        damage: u32,
        /// Melee or stomp
        source: HitSource,
        /// Enemy health after the hit
        health_after: u32,
    },

    /// Player took a hit
    PlayerDamaged {
        /// Damage taken (0 when a power-up absorbed it)
        damage: u32,
        /// Cause
        source: DamageSource,
        /// Health after the hit
        health_after: u32,
        /// A power-up absorbed the hit
        absorbed: bool,
    },

    /// Enemy left the active set
    EnemyDefeated {
        /// Enemy id
        enemy_id: u32,
        /// Enemy kind
        kind: EnemyKind,
        /// Was a boss
        boss: bool,
        /// Points awarded
        points: u32,
        /// Score after the award
        new_score: u32,
    },

    /// Player picked up a collectible
    CollectiblePicked {
        /// Collectible id
        collectible_id: u32,
        /// Kind
        kind: CollectibleKind,
        /// Value
        value: u32,
    },

    /// A hidden block was struck from below
    BlockRevealed {
        /// Block id
        block_id: u32,
        /// Content granted, if any
        content: Option<BlockContent>,
    },

    /// Player used an ability
    AbilityUsed {
        /// Ability
        ability: AbilityKind,
    },

    /// A checkpoint was activated
    CheckpointSaved {
        /// Checkpoint id
        checkpoint_id: u32,
        /// New respawn point
        respawn: FixedVec2,
    },

    /// Player lost a life and respawned
    LifeLost {
        /// Lives left
        lives_left: u32,
        /// Where the player reappeared
        respawn: FixedVec2,
    },

    /// Player reached the exit while the boss still stands
    ExitBlocked,

    /// Player reached the exit
    LevelComplete {
        /// World index
        world: u8,
        /// Level index
        level: u8,
        /// Score at completion
        score: u32,
    },

    /// No lives left
    GameOver {
        /// Final score
        score: u32,
    },

    /// Scheduler phase changed
    PhaseChanged {
        /// Previous phase
        from: GamePhase,
        /// New phase
        to: GamePhase,
    },
}

/// A game event with timing and priority.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when event occurred
    pub tick: u32,

    /// Processing priority
    pub priority: EventPriority,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event with the priority its data implies.
    pub fn new(tick: u32, data: GameEventData) -> Self {
        let priority = match &data {
            GameEventData::EnemyHit { .. } | GameEventData::PlayerDamaged { .. } => {
                EventPriority::Damage
            }
            GameEventData::EnemyDefeated { .. } => EventPriority::Defeat,
            GameEventData::CollectiblePicked { .. } | GameEventData::BlockRevealed { .. } => {
                EventPriority::Pickup
            }
            GameEventData::CheckpointSaved { .. } | GameEventData::LifeLost { .. } => {
                EventPriority::Checkpoint
            }
            GameEventData::LevelComplete { .. }
            | GameEventData::GameOver { .. }
            | GameEventData::PhaseChanged { .. }
            | GameEventData::ExitBlocked => EventPriority::Progression,
            GameEventData::AbilityUsed { .. } => EventPriority::Other,
        };
        Self { tick, priority, data }
    }

    /// Feedback cue for this event, if it has one.
    pub fn cue(&self) -> Option<FeedbackCue> {
        match &self.data {
            GameEventData::EnemyHit { .. } => Some(FeedbackCue::Hit),
            GameEventData::PlayerDamaged { absorbed: false, .. } => Some(FeedbackCue::Hit),
            GameEventData::CollectiblePicked { .. } | GameEventData::BlockRevealed { .. } => {
                Some(FeedbackCue::Success)
            }
            GameEventData::EnemyDefeated { .. } => Some(FeedbackCue::EnemyDefeated),
            GameEventData::CheckpointSaved { .. } => Some(FeedbackCue::CheckpointSaved),
            GameEventData::LevelComplete { .. } => Some(FeedbackCue::LevelComplete),
            _ => None,
        }
    }

    /// Create enemy hit event.
    pub fn enemy_hit(tick: u32, enemy_id: u32, damage: u32, source: HitSource, health_after: u32) -> Self {
        Self::new(tick, GameEventData::EnemyHit { enemy_id, damage, source, health_after })
    }

    /// Create player damaged event.
    pub fn player_damaged(
        tick: u32,
        damage: u32,
        source: DamageSource,
        health_after: u32,
        absorbed: bool,
    ) -> Self {
        Self::new(tick, GameEventData::PlayerDamaged { damage, source, health_after, absorbed })
    }

    /// Create enemy defeated event.
    pub fn enemy_defeated(
        tick: u32,
        enemy_id: u32,
        kind: EnemyKind,
        boss: bool,
        points: u32,
        new_score: u32,
    ) -> Self {
        Self::new(tick, GameEventData::EnemyDefeated { enemy_id, kind, boss, points, new_score })
    }

    /// Create collectible picked event.
    pub fn collectible_picked(tick: u32, collectible_id: u32, kind: CollectibleKind, value: u32) -> Self {
        Self::new(tick, GameEventData::CollectiblePicked { collectible_id, kind, value })
    }

    /// Create block revealed event.
    pub fn block_revealed(tick: u32, block_id: u32, content: Option<BlockContent>) -> Self {
        Self::new(tick, GameEventData::BlockRevealed { block_id, content })
    }

    /// Create ability used event.
    pub fn ability_used(tick: u32, ability: AbilityKind) -> Self {
        Self::new(tick, GameEventData::AbilityUsed { ability })
    }

    /// Create checkpoint saved event.
    pub fn checkpoint_saved(tick: u32, checkpoint_id: u32, respawn: FixedVec2) -> Self {
        Self::new(tick, GameEventData::CheckpointSaved { checkpoint_id, respawn })
    }

    /// Create life lost event.
    pub fn life_lost(tick: u32, lives_left: u32, respawn: FixedVec2) -> Self {
        Self::new(tick, GameEventData::LifeLost { lives_left, respawn })
    }

    /// Create level complete event.
    pub fn level_complete(tick: u32, world: u8, level: u8, score: u32) -> Self {
        Self::new(tick, GameEventData::LevelComplete { world, level, score })
    }

    /// Create game over event.
    pub fn game_over(tick: u32, score: u32) -> Self {
        Self::new(tick, GameEventData::GameOver { score })
    }

    /// Create phase changed event.
    pub fn phase_changed(tick: u32, from: GamePhase, to: GamePhase) -> Self {
        Self::new(tick, GameEventData::PhaseChanged { from, to })
    }
}
