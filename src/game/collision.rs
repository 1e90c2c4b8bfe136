//! Collision Resolution
//!
//! One canonical resolver for every solid the player can touch: platforms,
//! revealed hidden blocks, and hidden blocks struck from below. Each contact
//! is pushed out along the face with the smallest penetration, so a second
//! pass over the same state moves nothing.
//!
//! Proximity pickups (collectibles) use circular thresholds and live here
//! too; enemy/projectile/hazard proximity belongs to combat.

use tracing::debug;

use crate::core::fixed::{Fixed, fixed_clamp};
use crate::core::vec2::FixedVec2;
use crate::game::config::SimConfig;
use crate::game::events::GameEvent;
use crate::game::state::{CollectibleKind, PlayerState, WorldState};

// =============================================================================
// AABB
// =============================================================================

/// Axis-aligned box in level coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Aabb {
    /// Top-left corner
    pub min: FixedVec2,
    /// Bottom-right corner
    pub max: FixedVec2,
}

impl Aabb {
    /// Box of `size` centered on `center`.
    #[inline]
    pub fn from_center(center: FixedVec2, size: FixedVec2) -> Self {
        let half = FixedVec2::new(size.x >> 1, size.y >> 1);
        Self { min: center - half, max: center + half }
    }

    /// Strict overlap (touching edges do not count).
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.overlaps_x(other)
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    /// Strict overlap of the horizontal extents only.
    #[inline]
    pub fn overlaps_x(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x && other.min.x < self.max.x
    }
}

/// Face of a solid the mover was pushed out through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Face {
    /// Landed on it
    Top,
    /// Bumped it from below
    Bottom,
    /// Ran into its left side
    Left,
    /// Ran into its right side
    Right,
}

/// Minimal-penetration contact between a mover and a solid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Contact {
    /// Face of the solid
    pub face: Face,
    /// Penetration depth along that face's normal
    pub depth: Fixed,
}

/// Find the face with the smallest penetration, if the boxes overlap.
///
/// Ties go to the earlier face in Top, Bottom, Left, Right order.
pub fn minimal_overlap(mover: &Aabb, solid: &Aabb) -> Option<Contact> {
    if !mover.overlaps(solid) {
        return None;
    }

    let candidates = [
        (Face::Top, mover.max.y - solid.min.y),
        (Face::Bottom, solid.max.y - mover.min.y),
        (Face::Left, mover.max.x - solid.min.x),
        (Face::Right, solid.max.x - mover.min.x),
    ];

    let mut best = Contact { face: candidates[0].0, depth: candidates[0].1 };
    for &(face, depth) in &candidates[1..] {
        if depth < best.depth {
            best = Contact { face, depth };
        }
    }
    Some(best)
}

/// Push the player out of a solid along the contact face.
///
/// Velocity on the contact axis is zeroed only when the player was moving
/// into the face.
pub fn push_out(player: &mut PlayerState, contact: Contact) {
    match contact.face {
        Face::Top => {
            player.position.y -= contact.depth;
            if player.velocity.y > 0 {
                player.velocity.y = 0;
            }
            player.grounded = true;
        }
        Face::Bottom => {
            player.position.y += contact.depth;
            if player.velocity.y < 0 {
                player.velocity.y = 0;
            }
        }
        Face::Left => {
            player.position.x -= contact.depth;
            if player.velocity.x > 0 {
                player.velocity.x = 0;
            }
        }
        Face::Right => {
            player.position.x += contact.depth;
            if player.velocity.x < 0 {
                player.velocity.x = 0;
            }
        }
    }
}

// =============================================================================
// PLAYER RESOLUTION
// =============================================================================

/// What the collision phase observed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollisionReport {
    /// Player dropped below the pit line; nothing else was resolved
    pub pit_fall: bool,

    /// Number of solid contacts resolved
    pub contacts: u32,

    /// Hidden blocks revealed this tick (indices)
    pub revealed_blocks: Vec<usize>,
}

/// Resolve the player against the level for this tick.
///
/// Pit detection runs first; a pit fall skips resolution entirely and is
/// handed to the death handler by the caller.
pub fn resolve_player(state: &mut WorldState, config: &SimConfig) -> CollisionReport {
    let mut report = CollisionReport::default();

    let pit_line = config.viewport.height + config.viewport.pit_margin;
    if state.player.position.y > pit_line {
        debug!(tick = state.tick, y = state.player.position.y, "pit fall");
        report.pit_fall = true;
        return report;
    }

    state.player.grounded = false;
    resolve_solids(state, &mut report);
    grant_revealed_content(state, &report.revealed_blocks, config);
    apply_ground_fallback(state, config);
    clamp_to_bounds(&mut state.player, state.bounds.min, state.bounds.max);

    report
}

/// Resolve against platforms, then hidden blocks, in index order.
fn resolve_solids(state: &mut WorldState, report: &mut CollisionReport) {
    for platform in &state.platforms {
        if let Some(contact) = minimal_overlap(&state.player.aabb(), &platform.aabb()) {
            push_out(&mut state.player, contact);
            report.contacts += 1;
        }
    }

    for (index, block) in state.hidden_blocks.iter_mut().enumerate() {
        let Some(contact) = minimal_overlap(&state.player.aabb(), &block.aabb()) else {
            continue;
        };

        if !block.revealed {
            // Invisible blocks are only solid to a head-bump
            let struck = contact.face == Face::Bottom && state.player.velocity.y < 0;
            if !struck {
                continue;
            }
            block.revealed = true;
            report.revealed_blocks.push(index);
        }

        push_out(&mut state.player, contact);
        report.contacts += 1;
    }
}

/// Hand out the content of freshly revealed blocks, once each.
fn grant_revealed_content(state: &mut WorldState, revealed: &[usize], config: &SimConfig) {
    for &index in revealed {
        let (id, content) = {
            let block = &mut state.hidden_blocks[index];
            if block.hit {
                continue;
            }
            block.hit = true;
            (block.id, block.content)
        };

        if let Some(content) = content {
            apply_pickup(state, content.kind, content.value, config);
        }
        let tick = state.tick;
        state.push_event(GameEvent::block_revealed(tick, id, content));
    }
}

/// Solid ground under the level, except over pit spans.
fn apply_ground_fallback(state: &mut WorldState, config: &SimConfig) {
    let ground_y = state.level_height - config.viewport.ground_offset;
    let player = &mut state.player;

    if player.position.y <= ground_y {
        return;
    }
    if state.pits.iter().any(|pit| pit.contains_x(player.position.x)) {
        return;
    }

    player.position.y = ground_y;
    if player.velocity.y > 0 {
        player.velocity.y = 0;
    }
    player.grounded = true;
}

fn clamp_to_bounds(player: &mut PlayerState, min: Fixed, max: Fixed) {
    let half = player.size.x >> 1;
    if max - min < player.size.x {
        return;
    }
    let clamped = fixed_clamp(player.position.x, min + half, max - half);
    if clamped != player.position.x {
        player.position.x = clamped;
        player.velocity.x = 0;
    }
}

// =============================================================================
// PICKUPS
// =============================================================================

/// Collect every pickup within the collectible radius.
///
/// Returns how many were collected. Collected items are marked; the tick
/// compacts them.
pub fn collect_pickups(state: &mut WorldState, config: &SimConfig) -> usize {
    let radius = config.combat.collectible_radius;
    let position = state.player.position;

    let mut hits = Vec::new();
    for collectible in state.collectibles.iter_mut() {
        if collectible.collected || !collectible.position.within_radius(position, radius) {
            continue;
        }
        collectible.collected = true;
        hits.push((collectible.id, collectible.kind, collectible.value));
    }

    for &(id, kind, value) in &hits {
        apply_pickup(state, kind, value, config);
        let tick = state.tick;
        state.push_event(GameEvent::collectible_picked(tick, id, kind, value));
    }

    hits.len()
}

/// Apply a pickup's effect to the player and score.
pub fn apply_pickup(state: &mut WorldState, kind: CollectibleKind, value: u32, config: &SimConfig) {
    let player = &mut state.player;
    match kind {
        CollectibleKind::Bone => {
            player.bones = player.bones.saturating_add(1);
            state.score = state.score.saturating_add(value);
        }
        CollectibleKind::Visa => {
            player.visas = player.visas.saturating_add(1);
            state.score = state.score.saturating_add(value);
        }
        CollectibleKind::Snack => player.heal(value.max(1)),
        CollectibleKind::PowerUp => player.powered_up_ticks = config.player.power_up_ticks,
        CollectibleKind::Treat => {
            player.invincible_ticks = player.invincible_ticks.max(config.player.treat_invincibility_ticks);
        }
        CollectibleKind::Heart => {
            player.lives = (player.lives + 1).min(config.player.max_lives);
            player.max_health = player.max_health.saturating_add(1);
            player.heal(1);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{from_int, to_fixed};
    use crate::game::state::{BlockContent, Collectible, HiddenBlock, PitSpan, Platform};
    use proptest::prelude::*;

    fn world_at(x: i32, y: i32) -> WorldState {
        let spawn = FixedVec2::from_ints(x, y);
        WorldState::new(1, spawn, PlayerState::new(spawn, 3, 3))
    }

    #[test]
    fn test_minimal_overlap_picks_shallowest_face() {
        let player = Aabb::from_center(FixedVec2::from_ints(100, 82), FixedVec2::from_ints(40, 40));
        let floor = Aabb::from_center(FixedVec2::from_ints(100, 110), FixedVec2::from_ints(200, 20));
        let contact = minimal_overlap(&player, &floor).unwrap();
        assert_eq!(contact.face, Face::Top);
        assert_eq!(contact.depth, from_int(2));

        let apart = Aabb::from_center(FixedVec2::from_ints(500, 500), FixedVec2::from_ints(10, 10));
        assert!(minimal_overlap(&player, &apart).is_none());
    }

    #[test]
    fn test_landing_sets_grounded() {
        let mut w = world_at(100, 82);
        w.player.velocity.y = from_int(3);
        w.platforms.push(Platform::fixed(FixedVec2::from_ints(100, 110), FixedVec2::from_ints(200, 20)));

        let report = resolve_player(&mut w, &SimConfig::default());
        assert_eq!(report.contacts, 1);
        assert!(w.player.grounded);
        assert_eq!(w.player.velocity.y, 0);
        assert_eq!(w.player.bottom(), from_int(100));
    }

    #[test]
    fn test_rising_into_side_keeps_vertical_velocity() {
        // Penetrating the left face while moving up: only vx is cancelled
        let mut w = world_at(82, 100);
        w.player.velocity = FixedVec2::from_ints(5, -4);
        w.platforms.push(Platform::fixed(FixedVec2::from_ints(150, 100), FixedVec2::from_ints(100, 100)));

        resolve_player(&mut w, &SimConfig::default());
        assert_eq!(w.player.velocity.x, 0);
        assert_eq!(w.player.velocity.y, from_int(-4));
        assert_eq!(w.player.position.x, from_int(80));
    }

    #[test]
    fn test_hidden_block_granted_once() {
        let mut w = world_at(100, 125);
        w.player.velocity.y = from_int(-6);
        w.hidden_blocks.push(HiddenBlock {
            id: 9,
            position: FixedVec2::from_ints(100, 100),
            size: FixedVec2::from_ints(20, 20),
            content: Some(BlockContent { kind: CollectibleKind::Bone, value: 50 }),
            revealed: false,
            hit: false,
        });
        let config = SimConfig::default();

        let report = resolve_player(&mut w, &config);
        assert_eq!(report.revealed_blocks, vec![0]);
        assert!(w.hidden_blocks[0].revealed && w.hidden_blocks[0].hit);
        assert_eq!(w.score, 50);
        assert_eq!(w.take_events().len(), 1);

        // Bump it again: solid now, but no second payout
        w.player.position.y = from_int(125);
        w.player.velocity.y = from_int(-6);
        let report = resolve_player(&mut w, &config);
        assert!(report.revealed_blocks.is_empty());
        assert_eq!(w.score, 50);
        assert!(w.take_events().is_empty());
    }

    #[test]
    fn test_hidden_block_passable_from_above() {
        let mut w = world_at(100, 75);
        w.player.velocity.y = from_int(4);
        w.hidden_blocks.push(HiddenBlock {
            id: 1,
            position: FixedVec2::from_ints(100, 100),
            size: FixedVec2::from_ints(20, 20),
            content: None,
            revealed: false,
            hit: false,
        });

        let report = resolve_player(&mut w, &SimConfig::default());
        assert_eq!(report.contacts, 0);
        assert!(!w.hidden_blocks[0].revealed);
    }

    #[test]
    fn test_ground_fallback_skips_pits() {
        let config = SimConfig::default();
        let ground_y = from_int(600) - config.viewport.ground_offset;

        let mut w = world_at(300, 560);
        w.player.velocity.y = from_int(8);
        resolve_player(&mut w, &config);
        assert_eq!(w.player.position.y, ground_y);
        assert!(w.player.grounded);

        let mut w = world_at(300, 560);
        w.pits.push(PitSpan { start: from_int(250), end: from_int(350) });
        resolve_player(&mut w, &config);
        assert_eq!(w.player.position.y, from_int(560));
        assert!(!w.player.grounded);
    }

    #[test]
    fn test_pit_detected_before_resolution() {
        let mut w = world_at(300, 751);
        let report = resolve_player(&mut w, &SimConfig::default());
        assert!(report.pit_fall);
        assert_eq!(w.player.position.y, from_int(751));
    }

    #[test]
    fn test_pickups_marked_and_applied() {
        let config = SimConfig::default();
        let mut w = world_at(100, 100);
        w.player.health = 1;
        w.collectibles.push(Collectible {
            id: 0,
            kind: CollectibleKind::Snack,
            position: FixedVec2::from_ints(120, 100),
            value: 1,
            collected: false,
        });
        w.collectibles.push(Collectible {
            id: 1,
            kind: CollectibleKind::Heart,
            position: FixedVec2::new(from_int(100), to_fixed(124.5)),
            value: 1,
            collected: false,
        });
        w.collectibles.push(Collectible {
            id: 2,
            kind: CollectibleKind::Bone,
            position: FixedVec2::from_ints(200, 100),
            value: 10,
            collected: false,
        });

        assert_eq!(collect_pickups(&mut w, &config), 2);
        assert_eq!(w.player.lives, 4);
        assert_eq!(w.player.max_health, 4);
        assert_eq!(w.player.health, 3);
        assert_eq!(w.score, 0);
        w.compact();
        assert_eq!(w.collectibles.len(), 1);
    }

    #[test]
    fn test_heart_caps_lives() {
        let config = SimConfig::default();
        let mut w = world_at(0, 0);
        w.player.lives = config.player.max_lives;
        apply_pickup(&mut w, CollectibleKind::Heart, 1, &config);
        assert_eq!(w.player.lives, config.player.max_lives);
    }

    proptest! {
        #[test]
        fn prop_resolution_is_idempotent(
            px in 300i32..700,
            py in 100i32..400,
            vx in -10i32..10,
            vy in -15i32..15,
            bx in 300i32..700,
            by in 100i32..400,
            width in 10i32..200,
            height in 10i32..60,
        ) {
            let config = SimConfig::default();
            let mut w = world_at(px, py);
            w.player.velocity = FixedVec2::from_ints(vx, vy);
            w.platforms.push(Platform::fixed(
                FixedVec2::from_ints(bx, by),
                FixedVec2::from_ints(width, height),
            ));

            resolve_player(&mut w, &config);
            prop_assert!(!w.player.aabb().overlaps(&w.platforms[0].aabb()));
            let position = w.player.position;
            let velocity = w.player.velocity;

            let again = resolve_player(&mut w, &config);
            prop_assert_eq!(again.contacts, 0);
            prop_assert_eq!(w.player.position, position);
            prop_assert_eq!(w.player.velocity, velocity);
        }
    }
}
