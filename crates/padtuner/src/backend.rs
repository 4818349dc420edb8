use std::{collections::HashMap, mem, time::Duration};

use gilrs::{
    ff::{BaseEffect, BaseEffectType, Effect, EffectBuilder, Repeat, Replay, Ticks},
    Axis, Button, Event, EventType, GamepadId, Gilrs,
};
use padinput::{ButtonState, DeviceFrame, DeviceId, DeviceInfo, Rumble};
use padtuner_core::device::{self, DeviceSource, SourceEvent};

/// Axes in standard layout order: left stick x and y, then right stick x and y.
const AXIS_ORDER: [Axis; 4] = [
    Axis::LeftStickX,
    Axis::LeftStickY,
    Axis::RightStickX,
    Axis::RightStickY,
];

/// Buttons in standard layout order. gilrs has no share button, so the
/// layout's last slot never reports.
const BUTTON_ORDER: [Button; 17] = [
    Button::South,
    Button::East,
    Button::West,
    Button::North,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::LeftTrigger2,
    Button::RightTrigger2,
    Button::Select,
    Button::Start,
    Button::LeftThumb,
    Button::RightThumb,
    Button::DPadUp,
    Button::DPadDown,
    Button::DPadLeft,
    Button::DPadRight,
    Button::Mode,
];

/// Device source backed by gilrs.
pub struct GilrsSource {
    gilrs: Gilrs,
    known: HashMap<usize, GamepadId>,
    effects: HashMap<usize, Effect>,
    pending: Vec<SourceEvent>,
}

impl GilrsSource {
    pub fn new() -> Result<Self, gilrs::Error> {
        let mut source = Self {
            gilrs: Gilrs::new()?,
            known: HashMap::new(),
            effects: HashMap::new(),
            pending: Vec::new(),
        };

        // Pads plugged in before startup never produce a Connected event,
        // so report them from the first poll instead.
        let ids: Vec<_> = source.gilrs.gamepads().map(|(id, _)| id).collect();
        for id in ids {
            if let Some(event) = source.track(id) {
                source.pending.push(event);
            }
        }

        Ok(source)
    }

    fn track(&mut self, id: GamepadId) -> Option<SourceEvent> {
        let key = usize::from(id);

        if self.known.insert(key, id).is_none() {
            Some(SourceEvent::Connected(self.describe(id)))
        } else {
            None
        }
    }

    fn describe(&self, id: GamepadId) -> DeviceInfo {
        DeviceInfo {
            id: DeviceId(usize::from(id)),
            name: self.gilrs.gamepad(id).name().to_owned(),
            axis_count: AXIS_ORDER.len(),
            button_count: BUTTON_ORDER.len(),
        }
    }
}

impl DeviceSource for GilrsSource {
    fn poll_events(&mut self) -> Vec<SourceEvent> {
        let mut events = mem::take(&mut self.pending);

        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            match event {
                EventType::Connected => {
                    if let Some(event) = self.track(id) {
                        events.push(event);
                    }
                }
                EventType::Disconnected => {
                    let device = DeviceId(usize::from(id));

                    if self.known.remove(&device.0).is_some() {
                        self.effects.remove(&device.0);
                        events.push(SourceEvent::Disconnected(device));
                    }
                }
                _ => {}
            }
        }

        events
    }

    fn frames(&mut self) -> Vec<DeviceFrame> {
        self.known
            .iter()
            .map(|(&key, &id)| {
                let gamepad = self.gilrs.gamepad(id);
                let mut frame =
                    DeviceFrame::neutral(DeviceId(key), AXIS_ORDER.len(), BUTTON_ORDER.len());

                for (index, &axis) in AXIS_ORDER.iter().enumerate() {
                    let value = gamepad.value(axis);

                    // gilrs reports stick up as positive y; the standard
                    // layout is positive down.
                    frame.axes[index] = match axis {
                        Axis::LeftStickY | Axis::RightStickY => -value,
                        _ => value,
                    };
                }

                for (index, &button) in BUTTON_ORDER.iter().enumerate() {
                    frame.buttons[index] = gamepad
                        .button_data(button)
                        .map(|data| ButtonState::new(data.is_pressed(), data.value()))
                        .unwrap_or_default();
                }

                frame
            })
            .collect()
    }

    fn play_rumble(
        &mut self,
        id: DeviceId,
        rumble: Rumble,
        duration: Duration,
    ) -> device::Result<()> {
        let pad = *self.known.get(&id.0).ok_or(device::Error::NotPresent)?;

        if !self.gilrs.gamepad(pad).is_ff_supported() {
            return Err(device::Error::FfUnsupported);
        }

        let millis = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        let effect = EffectBuilder::new()
            .add_effect(BaseEffect {
                kind: BaseEffectType::Strong {
                    magnitude: magnitude(rumble.strong),
                },
                scheduling: Replay {
                    play_for: Ticks::from_ms(millis),
                    ..Default::default()
                },
                envelope: Default::default(),
            })
            .add_effect(BaseEffect {
                kind: BaseEffectType::Weak {
                    magnitude: magnitude(rumble.weak),
                },
                scheduling: Replay {
                    play_for: Ticks::from_ms(millis),
                    ..Default::default()
                },
                envelope: Default::default(),
            })
            .repeat(Repeat::For(Ticks::from_ms(millis)))
            .gamepads(&[pad])
            .finish(&mut self.gilrs)
            .map_err(|e| device::Error::FfRejected(e.to_string()))?;

        effect
            .play()
            .map_err(|e| device::Error::FfRejected(e.to_string()))?;

        // Replacing a running effect drops the old one, which stops it.
        self.effects.insert(id.0, effect);
        Ok(())
    }

    fn stop_rumble(&mut self, id: DeviceId) -> device::Result<()> {
        // Dropping the effect stops playback.
        self.effects.remove(&id.0);
        Ok(())
    }
}

fn magnitude(level: f32) -> u16 {
    (level.clamp(0.0, 1.0) * f32::from(u16::MAX)) as u16
}
