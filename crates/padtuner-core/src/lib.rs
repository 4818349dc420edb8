#![deny(clippy::all)]
pub mod config;
pub mod device;
pub mod poller;
pub mod remap;
pub mod store;
pub mod transform;
pub mod util;
