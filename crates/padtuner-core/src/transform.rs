use enum_iterator::Sequence;
use padinput::{
    ButtonReading, DeviceFrame, StickPos, TunedFrame, AXIS_LEFT_X, AXIS_LEFT_Y, AXIS_RIGHT_X,
    AXIS_RIGHT_Y, BUTTON_LEFT_TRIGGER, BUTTON_RIGHT_TRIGGER,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{RootConfig, StickConfig, TriggerConfig};

/// Shaping applied to a stick's post-deadzone magnitude. All curves are
/// monotonic on [0, 1] and fix 0 and 1.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Sequence)]
#[serde(rename_all = "lowercase")]
pub enum ResponseCurve {
    Linear,
    Exponential,
    Aggressive,
    Relaxed,
}

impl ResponseCurve {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Exponential => "exponential",
            Self::Aggressive => "aggressive",
            Self::Relaxed => "relaxed",
        }
    }

    #[must_use]
    pub fn apply(self, v: f32) -> f32 {
        match self {
            Self::Linear => v,
            Self::Exponential => v * v,
            Self::Aggressive => v * v * v,
            Self::Relaxed => v.sqrt(),
        }
    }
}

impl Default for ResponseCurve {
    fn default() -> Self {
        Self::Linear
    }
}

impl fmt::Display for ResponseCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Drift correction, radial deadzone, curve shaping, and sensitivity for
/// one stick. Raw axis values outside [-1, 1] are tolerated by clamping.
#[must_use]
pub fn transform_stick(raw_x: f32, raw_y: f32, config: &StickConfig) -> StickPos {
    let drifted = StickPos::new(raw_x.clamp(-1.0, 1.0), raw_y.clamp(-1.0, 1.0)).to_vector()
        - StickPos::new(config.drift_x, config.drift_y).to_vector();

    let deadzone = (config.deadzone / 100.0).clamp(0.0, 1.0);
    let magnitude = drifted.norm();

    if magnitude < deadzone || deadzone >= 1.0 {
        return StickPos::ZERO;
    }

    // Deadzone edge maps to 0 and full deflection to 1, then the curve
    // shapes that magnitude while the direction is kept.
    let normalized = ((magnitude - deadzone) / (1.0 - deadzone)).min(1.0);
    let shaped = config.curve.apply(normalized);
    let scale = if magnitude > 0.0 {
        shaped / magnitude
    } else {
        0.0
    };

    let sensitivity = config.sensitivity / 100.0;
    let out = StickPos::from(drifted * scale * sensitivity);

    StickPos::new(out.x.clamp(-1.0, 1.0), out.y.clamp(-1.0, 1.0))
}

/// Linear deadzone and sensitivity for one trigger. The deadzone floors
/// the rescaled value at 0 and the sensitivity factor is floored at 0,
/// so only the upper bound needs clamping.
#[must_use]
pub fn transform_trigger(raw: f32, config: &TriggerConfig) -> f32 {
    let value = raw.clamp(0.0, 1.0);
    let deadzone = (config.deadzone / 100.0).clamp(0.0, 1.0);

    if value < deadzone || deadzone >= 1.0 {
        return 0.0;
    }

    let rescaled = (value - deadzone) / (1.0 - deadzone);
    let sensitivity = (config.sensitivity / 100.0).max(0.0);

    (rescaled * sensitivity).min(1.0)
}

/// Applies the whole pipeline to one raw frame: sticks from axes 0-3,
/// triggers from the analog values of buttons 6 and 7 (absent buttons
/// read 0), and the remap table across every reported button.
#[must_use]
pub fn tune_frame(frame: &DeviceFrame, config: &RootConfig) -> TunedFrame {
    let left = transform_stick(
        frame.axis(AXIS_LEFT_X),
        frame.axis(AXIS_LEFT_Y),
        &config.sticks.left,
    );
    let right = transform_stick(
        frame.axis(AXIS_RIGHT_X),
        frame.axis(AXIS_RIGHT_Y),
        &config.sticks.right,
    );

    let left_trigger =
        transform_trigger(frame.button(BUTTON_LEFT_TRIGGER).value, &config.triggers.lt);
    let right_trigger =
        transform_trigger(frame.button(BUTTON_RIGHT_TRIGGER).value, &config.triggers.rt);

    let buttons = frame
        .buttons
        .iter()
        .enumerate()
        .map(|(index, state)| ButtonReading {
            logical: config.button_mapping.resolve(index),
            pressed: state.pressed,
            value: state.value,
        })
        .collect();

    TunedFrame {
        left,
        right,
        left_trigger,
        right_trigger,
        buttons,
    }
}
