//! Camera tracking.
//!
//! The camera eases toward keeping the player a third of the way into the
//! viewport, then clamps to the level so the edges never show.

use crate::core::fixed::{Fixed, FixedNum};
use crate::game::config::ViewportConfig;
use crate::game::state::{LevelBounds, WorldState};

/// Ease the camera toward the player and clamp it to the level.
pub fn follow(state: &mut WorldState, viewport: &ViewportConfig, dt: Fixed) {
    let target = desired_offset(state.player.position.x, viewport);
    let offset = FixedNum(state.camera_x);
    let eased = offset + (FixedNum(target) - offset) * FixedNum(viewport.camera_smoothing) * FixedNum(dt);
    state.camera_x = clamp_offset(eased.raw(), state.bounds, viewport.width);
}

/// Offset that puts the player at the lead fraction of the viewport.
#[inline]
pub fn desired_offset(player_x: Fixed, viewport: &ViewportConfig) -> Fixed {
    (FixedNum(player_x) - FixedNum(viewport.width) * FixedNum(viewport.camera_lead)).raw()
}

/// Clamp into `[min, max(min, max - width)]`.
#[inline]
pub fn clamp_offset(offset: Fixed, bounds: LevelBounds, viewport_width: Fixed) -> Fixed {
    let high = (bounds.max - viewport_width).max(bounds.min);
    offset.clamp(bounds.min, high)
}
