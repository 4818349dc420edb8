#![deny(clippy::all)]

use std::error::Error;

use log::info;
use padtuner_core::{config::RootConfig, poller};

mod backend;
mod console;
mod logger;
mod settings;
mod store;

use backend::GilrsSource;
use console::Console;
use logger::Logger;
use settings::Settings;
use store::FileStore;

pub fn main() -> Result<(), Box<dyn Error>> {
    std::panic::set_hook(Box::new(panic_trace::hook));

    let config_dir = dirs::config_dir()
        .expect("Failed to get config directory")
        .join("padtuner");

    let settings = Settings::load_or_create(config_dir.join("padtuner.toml"));
    Logger::new(settings.level()).init()?;

    info!("padtuner {}", env!("CARGO_PKG_VERSION"));

    let store = FileStore::new(config_dir);
    let config = RootConfig::load(&store);
    let source = GilrsSource::new()?;

    let poller = poller::Poller::new(
        source,
        config,
        store,
        poller::Settings {
            tick_interval: settings.tick_interval(),
        },
    );

    let mut console = Console::new(poller);
    console.run();
    Ok(())
}
