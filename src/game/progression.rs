//! Level Progression
//!
//! The exit trigger (gated behind the boss on boss levels) and the unlock
//! rules that decide which level comes next.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::game::events::{GameEvent, GameEventData};
use crate::game::state::WorldState;

/// Worlds in the game.
pub const WORLD_COUNT: u8 = 5;

/// Levels per world.
pub const LEVELS_PER_WORLD: u8 = 5;

/// Every fifth level of a world is a boss level.
#[inline]
pub fn is_boss_level(level_index: u8) -> bool {
    level_index % LEVELS_PER_WORLD == LEVELS_PER_WORLD - 1
}

// =============================================================================
// EXIT TRIGGER
// =============================================================================

/// Result of the exit check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    /// Player is not at the exit
    Away,
    /// At the exit, but a boss still stands
    Blocked,
    /// Level finished
    Complete,
}

/// Check whether the player has reached the exit.
///
/// On boss levels the exit stays closed while the boss is alive; the
/// blocked notice fires once per entry into the zone.
pub fn check_exit(state: &mut WorldState) -> ExitStatus {
    if state.level_complete {
        return ExitStatus::Complete;
    }

    let inside = state.exit.contains_x(state.player.position.x);
    let entered = inside && !state.in_exit_zone;
    state.in_exit_zone = inside;

    if !inside {
        return ExitStatus::Away;
    }

    let tick = state.tick;
    if state.boss_level && state.living_boss() {
        if entered {
            debug!(tick, "exit blocked by boss");
            state.push_event(GameEvent::new(tick, GameEventData::ExitBlocked));
        }
        return ExitStatus::Blocked;
    }

    state.level_complete = true;
    info!(tick, world = state.world_index, level = state.level_index, score = state.score, "level complete");
    let (world, level, score) = (state.world_index, state.level_index, state.score);
    state.push_event(GameEvent::level_complete(tick, world, level, score));
    ExitStatus::Complete
}

// =============================================================================
// UNLOCKS
// =============================================================================

/// Where progress goes after a level is finished.
pub trait ProgressTracker {
    /// Unlock whatever follows `(world, level)`.
    fn unlock_next_level(&mut self, world: u8, level: u8);

    /// Move to the level after `(world, level)`. Returns `None` after the
    /// final level of the final world.
    fn advance_level(&mut self, world: u8, level: u8) -> Option<(u8, u8)>;

    /// Whether a level may be played.
    fn is_unlocked(&self, world: u8, level: u8) -> bool;
}

/// Unlocked levels per world.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    unlocked: BTreeMap<u8, BTreeSet<u8>>,
}

impl LevelProgress {
    /// Fresh progress: only the first level of the first world.
    pub fn new() -> Self {
        let mut unlocked = BTreeMap::new();
        unlocked.insert(0, BTreeSet::from([0]));
        Self { unlocked }
    }

    /// Level that follows `(world, level)`, if any.
    pub fn next_of(world: u8, level: u8) -> Option<(u8, u8)> {
        if level + 1 < LEVELS_PER_WORLD {
            Some((world, level + 1))
        } else if world + 1 < WORLD_COUNT {
            Some((world + 1, 0))
        } else {
            None
        }
    }

    /// All unlocked `(world, level)` pairs in order.
    pub fn unlocked(&self) -> Vec<(u8, u8)> {
        self.unlocked
            .iter()
            .flat_map(|(&world, levels)| levels.iter().map(move |&level| (world, level)))
            .collect()
    }

    /// Rebuild from saved pairs, dropping out-of-range entries.
    pub fn from_pairs(pairs: &[(u8, u8)]) -> Self {
        let mut progress = Self::new();
        for &(world, level) in pairs {
            if world < WORLD_COUNT && level < LEVELS_PER_WORLD {
                progress.unlocked.entry(world).or_default().insert(level);
            }
        }
        progress
    }
}

impl Default for LevelProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker for LevelProgress {
    fn unlock_next_level(&mut self, world: u8, level: u8) {
        if let Some((w, l)) = Self::next_of(world, level) {
            if self.unlocked.entry(w).or_default().insert(l) {
                info!(world = w, level = l, "level unlocked");
            }
        }
    }

    fn advance_level(&mut self, world: u8, level: u8) -> Option<(u8, u8)> {
        self.unlock_next_level(world, level);
        Self::next_of(world, level)
    }

    fn is_unlocked(&self, world: u8, level: u8) -> bool {
        self.unlocked.get(&world).is_some_and(|levels| levels.contains(&level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{from_int, FIXED_ONE};
    use crate::core::vec2::FixedVec2;
    use crate::game::state::{Enemy, EnemyKind, Exit, PlayerState};

    fn boss_world() -> WorldState {
        let spawn = FixedVec2::from_ints(0, 500);
        let mut w = WorldState::new(1, spawn, PlayerState::new(spawn, 3, 3));
        w.level_index = 4;
        w.boss_level = is_boss_level(4);
        w.exit = Exit { position: FixedVec2::from_ints(100, 500), trigger_width: from_int(70) };
        let mut boss = Enemy::new(1, EnemyKind::Boss, FixedVec2::from_ints(400, 500), FIXED_ONE);
        boss.health = 10;
        w.enemies.push(boss);
        w
    }

    #[test]
    fn test_boss_gates_exit() {
        let mut w = boss_world();
        assert!(w.boss_level);

        w.player.position.x = from_int(65);
        assert_eq!(check_exit(&mut w), ExitStatus::Blocked);
        assert!(!w.level_complete);
        assert_eq!(w.take_events().len(), 1);

        // Staying in the zone does not repeat the notice
        assert_eq!(check_exit(&mut w), ExitStatus::Blocked);
        assert!(w.take_events().is_empty());

        // Boss falls; leave and re-enter
        w.enemies[0].health = 0;
        w.compact();
        w.player.position.x = from_int(20);
        assert_eq!(check_exit(&mut w), ExitStatus::Away);
        w.player.position.x = from_int(135);
        assert_eq!(check_exit(&mut w), ExitStatus::Complete);
        assert!(w.level_complete);
    }

    #[test]
    fn test_regular_level_exit() {
        let mut w = boss_world();
        w.level_index = 2;
        w.boss_level = is_boss_level(2);
        w.player.position.x = from_int(100);
        assert_eq!(check_exit(&mut w), ExitStatus::Complete);
        let events = w.take_events();
        assert!(matches!(events[0].data, GameEventData::LevelComplete { level: 2, .. }));
    }

    #[test]
    fn test_unlock_rules() {
        let mut progress = LevelProgress::new();
        assert!(progress.is_unlocked(0, 0));
        assert!(!progress.is_unlocked(0, 1));

        assert_eq!(progress.advance_level(0, 0), Some((0, 1)));
        assert!(progress.is_unlocked(0, 1));

        // Last level of a world opens the next world
        assert_eq!(progress.advance_level(0, 4), Some((1, 0)));
        assert!(progress.is_unlocked(1, 0));

        assert_eq!(progress.advance_level(4, 4), None);
        assert_eq!(progress.unlocked(), vec![(0, 0), (0, 1), (1, 0)]);
    }

    #[test]
    fn test_from_pairs_drops_out_of_range() {
        let progress = LevelProgress::from_pairs(&[(0, 3), (9, 0), (2, 7)]);
        assert_eq!(progress.unlocked(), vec![(0, 0), (0, 3)]);
    }
}
