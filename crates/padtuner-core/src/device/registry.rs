use std::collections::BTreeMap;

use padinput::{DeviceFrame, DeviceId, DeviceInfo};

/// Connected devices with their last-seen raw frames, plus the single
/// device whose readings drive the pipeline. The active id is always a
/// present key; an empty registry has no active device.
#[derive(Debug, Default)]
pub struct Registry {
    devices: BTreeMap<DeviceId, Entry>,
    active: Option<DeviceId>,
}

#[derive(Debug)]
struct Entry {
    info: DeviceInfo,
    frame: DeviceFrame,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or refreshes a device. The first device to connect
    /// becomes active on its own.
    pub fn connect(&mut self, info: DeviceInfo) {
        let frame = DeviceFrame::neutral(info.id, info.axis_count, info.button_count);
        let id = info.id;

        self.devices.insert(id, Entry { info, frame });

        if self.active.is_none() {
            self.active = Some(id);
        }
    }

    /// Removes a device. When the active device goes away, the lowest
    /// remaining id takes over, or no device stays active.
    pub fn disconnect(&mut self, id: DeviceId) {
        self.devices.remove(&id);

        if self.active == Some(id) {
            self.active = self.devices.keys().next().copied();
        }
    }

    /// Records the latest raw frame for an already connected device.
    /// Frames for unknown ids are dropped; connects come first.
    pub fn observe_frame(&mut self, frame: DeviceFrame) {
        if let Some(entry) = self.devices.get_mut(&frame.id) {
            entry.frame = frame;
        }
    }

    /// Explicit user override. Absent ids leave the selection untouched.
    pub fn set_active(&mut self, id: DeviceId) -> bool {
        if self.devices.contains_key(&id) {
            self.active = Some(id);
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn active_id(&self) -> Option<DeviceId> {
        self.active
    }

    #[must_use]
    pub fn active_info(&self) -> Option<DeviceInfo> {
        self.active
            .and_then(|id| self.devices.get(&id))
            .map(|entry| entry.info.clone())
    }

    #[must_use]
    pub fn active_frame(&self) -> Option<&DeviceFrame> {
        self.active
            .and_then(|id| self.devices.get(&id))
            .map(|entry| &entry.frame)
    }

    #[must_use]
    pub fn devices(&self) -> Vec<DeviceInfo> {
        self.devices.values().map(|entry| entry.info.clone()).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }
}
