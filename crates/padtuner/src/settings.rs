use std::{fs, path::Path, time::Duration};

use log::warn;
use serde::{Deserialize, Serialize};

/// How the process runs, kept as `padtuner.toml` in the config
/// directory. Tuning state lives in the store, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub poll_hz: u32,
    pub log: String,
}

impl Settings {
    pub fn load_or_create(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if path.exists() {
            Self::load(path).unwrap_or_default()
        } else {
            let settings = Self::default();
            settings.write(path);
            settings
        }
    }

    fn load(path: &Path) -> Option<Self> {
        let s = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to read settings file: {}", e);
                return None;
            }
        };

        let settings = toml::from_str::<Self>(&s);

        if let Err(e) = settings.as_ref() {
            warn!("Failed to parse settings file: {}", e);
        }

        settings.ok()
    }

    fn write(&self, path: &Path) {
        if let Err(e) =
            fs::create_dir_all(path.parent().expect("Settings path has no parent path"))
        {
            warn!("Failed to create settings directory: {}", e);
            return;
        }

        let s = match toml::to_string(self) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize settings: {}", e);
                return;
            }
        };

        if let Err(e) = fs::write(path, s) {
            warn!("Failed to write settings file: {}", e);
        }
    }

    #[must_use]
    pub fn level(&self) -> log::LevelFilter {
        self.log.parse().unwrap_or(log::LevelFilter::Info)
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.poll_hz.max(1)))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_hz: 125,
            log: "info".to_owned(),
        }
    }
}
