use web_sys::Storage;

use super::{KeyValueStore, StoreError};

/// Which Web Storage area to open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageArea {
    Session,
    Local,
}

/// `KeyValueStore` over a browser `Storage` object
pub struct BrowserStore {
    storage: Storage,
}

impl BrowserStore {
    /// Open session storage for the current window
    pub fn session() -> Result<Self, StoreError> {
        Self::open(StorageArea::Session)
    }

    /// Open local storage for the current window
    pub fn local() -> Result<Self, StoreError> {
        Self::open(StorageArea::Local)
    }

    pub fn open(area: StorageArea) -> Result<Self, StoreError> {
        let window = web_sys::window().ok_or(StoreError::Unavailable)?;
        // Accessing the property itself throws when storage is disabled
        let storage = match area {
            StorageArea::Session => window.session_storage(),
            StorageArea::Local => window.local_storage(),
        }
        .map_err(|_| StoreError::Unavailable)?
        .ok_or(StoreError::Unavailable)?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for BrowserStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage
            .get_item(key)
            .map_err(|e| StoreError::Read(format!("{:?}", e)))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StoreError::Write(format!("{:?}", e)))
    }
}
