use std::{
    collections::HashMap,
    result,
    sync::Mutex,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = result::Result<T, Error>;

/// Durable string key-value storage for configuration blobs. Readers
/// treat a missing or unreadable key the same way: as absent.
pub trait Store {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Keeps entries in memory only. Useful for tests and throwaway
/// sessions where nothing should touch the disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryStore, Store};

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryStore::new();

        assert_eq!(store.get("missing"), None);
        store.set("key", "value").unwrap();
        assert_eq!(store.get("key"), Some("value".to_owned()));

        store.set("key", "replaced").unwrap();
        assert_eq!(store.get("key"), Some("replaced".to_owned()));
    }
}
