#![deny(clippy::all)]
use std::fmt;

use serde::{Deserialize, Serialize};

/// Axis indices of the standard gamepad layout.
pub const AXIS_LEFT_X: usize = 0;
pub const AXIS_LEFT_Y: usize = 1;
pub const AXIS_RIGHT_X: usize = 2;
pub const AXIS_RIGHT_Y: usize = 3;

/// Button indices of the analog triggers in the standard layout.
pub const BUTTON_LEFT_TRIGGER: usize = 6;
pub const BUTTON_RIGHT_TRIGGER: usize = 7;

/// Display names for the standard layout, indexed by physical button.
pub const BUTTON_NAMES: [&str; 18] = [
    "A", "B", "X", "Y", "LB", "RB", "LT", "RT", "Back", "Start", "L3", "R3", "Up", "Down", "Left",
    "Right", "Home", "Share",
];

#[must_use]
pub fn button_name(index: usize) -> Option<&'static str> {
    BUTTON_NAMES.get(index).copied()
}

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DeviceId(pub usize);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<usize> for DeviceId {
    fn from(id: usize) -> Self {
        Self(id)
    }
}

impl From<DeviceId> for usize {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub id: DeviceId,
    pub name: String,
    pub axis_count: usize,
    pub button_count: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ButtonState {
    pub pressed: bool,
    pub value: f32,
}

impl ButtonState {
    pub const fn new(pressed: bool, value: f32) -> Self {
        Self { pressed, value }
    }
}

/// Snapshot of a device's raw readings, replaced on every poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceFrame {
    pub id: DeviceId,
    pub axes: Vec<f32>,
    pub buttons: Vec<ButtonState>,
}

impl DeviceFrame {
    /// An at-rest frame sized for the given device.
    #[must_use]
    pub fn neutral(id: DeviceId, axis_count: usize, button_count: usize) -> Self {
        Self {
            id,
            axes: vec![0.0; axis_count],
            buttons: vec![ButtonState::default(); button_count],
        }
    }

    /// Axis reading, or 0.0 when the device reports fewer axes.
    #[must_use]
    pub fn axis(&self, index: usize) -> f32 {
        self.axes.get(index).copied().unwrap_or(0.0)
    }

    /// Button reading, released when the device reports fewer buttons.
    #[must_use]
    pub fn button(&self, index: usize) -> ButtonState {
        self.buttons.get(index).copied().unwrap_or_default()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StickPos {
    pub x: f32,
    pub y: f32,
}

impl StickPos {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[cfg(feature = "nalgebra")]
    pub fn to_vector(self) -> nalgebra::Vector2<f32> {
        nalgebra::Vector2::<f32>::from(self)
    }
}

#[cfg(feature = "nalgebra")]
impl From<StickPos> for nalgebra::Vector2<f32> {
    fn from(pos: StickPos) -> Self {
        Self::new(pos.x, pos.y)
    }
}

#[cfg(feature = "nalgebra")]
impl From<nalgebra::Vector2<f32>> for StickPos {
    fn from(v: nalgebra::Vector2<f32>) -> Self {
        Self::new(v.x, v.y)
    }
}

impl From<StickPos> for [f32; 2] {
    fn from(pos: StickPos) -> Self {
        [pos.x, pos.y]
    }
}

impl From<[f32; 2]> for StickPos {
    fn from(pos: [f32; 2]) -> Self {
        Self::new(pos[0], pos[1])
    }
}

/// One physical button after remap resolution.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonReading {
    pub logical: usize,
    pub pressed: bool,
    pub value: f32,
}

/// A fully transformed frame: sticks shaped, triggers rescaled, buttons
/// resolved through the remap table. Button order is physical.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TunedFrame {
    pub left: StickPos,
    pub right: StickPos,
    pub left_trigger: f32,
    pub right_trigger: f32,
    pub buttons: Vec<ButtonReading>,
}

/// Dual-motor rumble levels, normalized to [0, 1].
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rumble {
    pub strong: f32,
    pub weak: f32,
}

impl Rumble {
    pub const fn new(strong: f32, weak: f32) -> Self {
        Self { strong, weak }
    }
}
