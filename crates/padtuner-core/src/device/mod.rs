use std::{result, time::Duration};

use padinput::{DeviceFrame, DeviceId, DeviceInfo, Rumble};
use thiserror::Error;

pub mod registry;

#[derive(Debug, Error)]
pub enum Error {
    #[error("device not present")]
    NotPresent,
    #[error("force feedback not supported")]
    FfUnsupported,
    #[error("force feedback rejected: {0}")]
    FfRejected(String),
}

pub type Result<T> = result::Result<T, Error>;

/// Connection churn reported by a backend. A backend must report a
/// device's connection before ever producing frames for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    Connected(DeviceInfo),
    Disconnected(DeviceId),
}

/// A platform backend the poll loop drains once per tick: connection
/// events first, then a snapshot of every currently reporting device.
/// Rumble calls are best-effort; callers log failures and move on.
pub trait DeviceSource: Send {
    fn poll_events(&mut self) -> Vec<SourceEvent>;
    fn frames(&mut self) -> Vec<DeviceFrame>;

    fn play_rumble(&mut self, id: DeviceId, levels: Rumble, duration: Duration) -> Result<()>;
    fn stop_rumble(&mut self, id: DeviceId) -> Result<()>;
}
