//! Store implementation
//!
//! HashMap-based store with RwLock for concurrency.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::{KvError, Result};

/// Concurrently shared key-value map
#[derive(Debug, Default)]
pub struct Store {
    data: RwLock<HashMap<String, String>>,
}

impl Store {
    /// Create a new empty Store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a key (write lock)
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        self.data.write().insert(key.into(), value.into());
    }

    /// Get a value by key (read lock)
    ///
    /// Returns `KvError::KeyNotFound` when the key is absent.
    pub fn get(&self, key: &str) -> Result<String> {
        self.data.read().get(key).cloned().ok_or(KvError::KeyNotFound)
    }

    /// Remove a key (write lock)
    ///
    /// Removing an absent key is a no-op. Returns whether a value was removed.
    pub fn delete(&self, key: &str) -> bool {
        self.data.write().remove(key).is_some()
    }

    /// Check whether a key is present
    pub fn contains(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Copy of the whole mapping, taken under a single read lock
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.data.read().clone()
    }
}
