//! Browser key-value storage behind a small trait
//!
//! Features:
//! - `KeyValueStore` seam shared by session and local storage
//! - In-memory store for native builds and tests
//! - `BrowserStore` adapter over `web_sys::Storage` (WASM only)

use std::collections::HashMap;

use thiserror::Error;

#[cfg(target_arch = "wasm32")]
mod browser;

#[cfg(target_arch = "wasm32")]
pub use browser::{BrowserStore, StorageArea};

/// Failures talking to a storage backend
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Storage is disabled or not exposed by the browser
    #[error("storage unavailable")]
    Unavailable,
    /// Backend refused a read
    #[error("storage read failed: {0}")]
    Read(String),
    /// Backend refused a write (quota exceeded, private mode, ...)
    #[error("storage write failed: {0}")]
    Write(String),
}

/// String key-value storage with the semantics of the Web Storage API
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Process-local store, used natively and in tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set` calls so far
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.items.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }
}
