//! Input Capture and Edge Detection
//!
//! The host maps raw device events to logical actions and hands the
//! simulation one [`InputFrame`] of *held* actions per tick. The
//! [`EdgeDetector`] turns consecutive frames into an [`InputState`] that also
//! knows which actions were pressed this tick, so jump, attack, dash, dig,
//! bark, pause and restart fire once per press no matter how long (or how
//! repeatedly, via OS key-repeat) the key is held.

use serde::{Serialize, Deserialize};

use crate::core::hash::{StateHash, StateHasher};

// =============================================================================
// ACTIONS
// =============================================================================

/// Logical actions the simulation understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Action {
    /// Run left while held
    MoveLeft = 0,
    /// Run right while held
    MoveRight = 1,
    /// Jump on press, floatier ascent while held
    Jump = 2,
    /// Melee swing on press
    Attack = 3,
    /// Dash on press
    Dash = 4,
    /// Dig in on press
    Dig = 5,
    /// Bark (stun nearby enemies) on press
    Bark = 6,
    /// Toggle pause on press
    Pause = 7,
    /// Restart from the game-over screen on press
    Restart = 8,
}

impl Action {
    /// Every action, in bit order.
    pub const ALL: [Action; 9] = [
        Action::MoveLeft,
        Action::MoveRight,
        Action::Jump,
        Action::Attack,
        Action::Dash,
        Action::Dig,
        Action::Bark,
        Action::Pause,
        Action::Restart,
    ];

    /// Bit mask of this action inside [`InputFrame::actions`].
    #[inline]
    pub const fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

// =============================================================================
// INPUT FRAME
// =============================================================================

/// Held actions for a single tick.
///
/// NO tick field - tick is stored separately for compression.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputFrame {
    /// Packed action bits, see [`Action::bit`]
    pub actions: u16,
}

impl InputFrame {
    /// Mask of all defined action bits.
    pub const VALID_BITS: u16 = 0x01FF;

    /// Create a new empty input frame.
    pub const fn new() -> Self {
        Self { actions: 0 }
    }

    /// Create from raw bits; undefined bits are dropped.
    pub const fn from_bits(bits: u16) -> Self {
        Self { actions: bits & Self::VALID_BITS }
    }

    /// Builder: this frame with `action` held as well.
    pub const fn with(self, action: Action) -> Self {
        Self { actions: self.actions | action.bit() }
    }

    /// Create a frame holding every listed action.
    pub fn holding(actions: &[Action]) -> Self {
        actions.iter().fold(Self::new(), |frame, a| frame.with(*a))
    }

    /// Check if an action is held.
    #[inline]
    pub fn holds(&self, action: Action) -> bool {
        self.actions & action.bit() != 0
    }

    /// Set or clear an action.
    #[inline]
    pub fn set(&mut self, action: Action, held: bool) {
        if held {
            self.actions |= action.bit();
        } else {
            self.actions &= !action.bit();
        }
    }

    /// Check if this is an idle frame (no input).
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.actions == 0
    }
}

// =============================================================================
// INPUT STATE (held + edges)
// =============================================================================

/// Per-tick snapshot of held actions plus the ones that went down this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputState {
    /// Actions currently held
    pub held: InputFrame,
    /// Actions whose key went down this tick (rising edge)
    pub pressed: InputFrame,
}

impl InputState {
    /// Build from the previous and current frames.
    pub fn from_frames(previous: InputFrame, current: InputFrame) -> Self {
        Self {
            held: current,
            pressed: InputFrame::from_bits(current.actions & !previous.actions),
        }
    }

    /// Action is held this tick.
    #[inline]
    pub fn is_held(&self, action: Action) -> bool {
        self.held.holds(action)
    }

    /// Action went down this tick.
    #[inline]
    pub fn just_pressed(&self, action: Action) -> bool {
        self.pressed.holds(action)
    }

    /// Horizontal axis: -1 left, 1 right, 0 for neither or both.
    #[inline]
    pub fn horizontal(&self) -> i32 {
        let left = self.is_held(Action::MoveLeft) as i32;
        let right = self.is_held(Action::MoveRight) as i32;
        right - left
    }
}

/// Remembers the previous frame and derives rising edges.
#[derive(Clone, Debug, Default)]
pub struct EdgeDetector {
    previous: InputFrame,
}

impl EdgeDetector {
    /// Create a detector with nothing held.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample a new frame.
    pub fn sample(&mut self, frame: InputFrame) -> InputState {
        let state = InputState::from_frames(self.previous, frame);
        self.previous = frame;
        state
    }

    /// Forget held keys. Used on level reload so a jump held through the
    /// transition does not count as a fresh press.
    pub fn reset(&mut self, held: InputFrame) {
        self.previous = held;
    }
}

// =============================================================================
// INPUT RECORDING
// =============================================================================

/// Delta-compressed input entry.
///
/// Only stored when input CHANGES (not every tick).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDelta {
    /// Tick when this input state began
    pub tick: u32,
    /// The new input state
    pub frame: InputFrame,
}

impl InputDelta {
    /// Create new delta entry.
    pub fn new(tick: u32, frame: InputFrame) -> Self {
        Self { tick, frame }
    }
}

/// Complete input recording for one level attempt.
///
/// Used for replay playback and determinism checks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputRecording {
    /// World index the recording was made in
    pub world: u8,

    /// Level index the recording was made in
    pub level: u8,

    /// Session seed used for level generation and AI randomness
    pub session_seed: u64,

    /// Starting tick (usually 0)
    pub start_tick: u32,

    /// Last recorded tick
    pub end_tick: u32,

    /// Only stores ticks where input CHANGED.
    deltas: Vec<InputDelta>,

    /// Last recorded input (for delta comparison)
    #[serde(skip)]
    last_frame: InputFrame,
}

impl InputRecording {
    /// Create a new recording for a level.
    pub fn new(world: u8, level: u8, session_seed: u64) -> Self {
        Self {
            world,
            level,
            session_seed,
            start_tick: 0,
            end_tick: 0,
            deltas: Vec::with_capacity(256),
            last_frame: InputFrame::new(),
        }
    }

    /// Record input for a tick.
    ///
    /// Only stores if input changed from previous frame.
    pub fn record(&mut self, tick: u32, frame: InputFrame) {
        self.end_tick = tick;

        if frame != self.last_frame {
            self.deltas.push(InputDelta::new(tick, frame));
            self.last_frame = frame;
        }
    }

    /// Get all deltas.
    pub fn deltas(&self) -> &[InputDelta] {
        &self.deltas
    }

    /// Number of delta entries.
    pub fn delta_count(&self) -> usize {
        self.deltas.len()
    }

    /// Finalize the recording.
    pub fn finalize(&mut self, end_tick: u32) {
        self.end_tick = end_tick;
    }

    /// Create iterator over all inputs for replay.
    pub fn replay_iter(&self) -> ReplayIterator<'_> {
        ReplayIterator {
            recording: self,
            current_tick: self.start_tick,
            delta_idx: 0,
            current_frame: InputFrame::new(),
        }
    }

    /// Hash of the recorded stream, for naming replay files.
    pub fn compute_hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_input_recording();
        hasher.update_u8(self.world);
        hasher.update_u8(self.level);
        hasher.update_u64(self.session_seed);
        hasher.update_u32(self.start_tick);
        hasher.update_u32(self.end_tick);
        for delta in &self.deltas {
            hasher.update_u32(delta.tick);
            hasher.update_u16(delta.frame.actions);
        }
        hasher.finalize()
    }

    /// Serialize to compact binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from binary.
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        let mut recording: Self = bincode::deserialize(data)?;
        recording.restore_last_frame();
        Ok(recording)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut recording: Self = serde_json::from_str(json)?;
        recording.restore_last_frame();
        Ok(recording)
    }

    fn restore_last_frame(&mut self) {
        self.last_frame = self.deltas.last().map(|d| d.frame).unwrap_or_default();
    }
}

/// Iterator for replaying inputs tick-by-tick.
pub struct ReplayIterator<'a> {
    recording: &'a InputRecording,
    current_tick: u32,
    delta_idx: usize,
    current_frame: InputFrame,
}

impl<'a> Iterator for ReplayIterator<'a> {
    type Item = (u32, InputFrame);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_tick > self.recording.end_tick {
            return None;
        }

        while let Some(delta) = self.recording.deltas.get(self.delta_idx) {
            if delta.tick > self.current_tick {
                break;
            }
            self.current_frame = delta.frame;
            self.delta_idx += 1;
        }

        let result = (self.current_tick, self.current_frame);
        self.current_tick += 1;
        Some(result)
    }
}

// =============================================================================
// TESTS
// =============================================================================
