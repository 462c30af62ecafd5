//! Preference accessors the registry reads its document from.
//!
//! The host application owns the actual key-value store. The registry only
//! sees a `Preference`: one string slot it can read and overwrite.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use shared::sync::{read_lock, write_lock};

/// A single string-valued preference.
pub trait Preference: Send + Sync {
    /// Current value, empty when nothing has been stored yet.
    fn get(&self) -> String;

    fn set(&self, value: String);
}

/// A string key-value store such as the platform's shared preferences.
pub trait KeyValueStore: Send + Sync {
    fn get_string(&self, key: &str) -> Option<String>;

    fn set_string(&self, key: &str, value: String);
}

/// Binds one key of a `KeyValueStore` as a `Preference`.
#[derive(Debug)]
pub struct PreferenceEntry<S> {
    store: Arc<S>,
    key: String,
}

impl<S: KeyValueStore> PreferenceEntry<S> {
    pub fn new(store: Arc<S>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<S: KeyValueStore> Preference for PreferenceEntry<S> {
    fn get(&self) -> String {
        self.store.get_string(&self.key).unwrap_or_default()
    }

    fn set(&self, value: String) {
        self.store.set_string(&self.key, value);
    }
}

/// In-memory key-value store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_string(&self, key: &str) -> Option<String> {
        read_lock(&self.values).get(key).cloned()
    }

    fn set_string(&self, key: &str, value: String) {
        write_lock(&self.values).insert(key.to_string(), value);
    }
}

/// In-memory preference that counts writes.
#[derive(Debug, Default)]
pub struct MemoryPreference {
    value: RwLock<String>,
    writes: AtomicUsize,
}

impl MemoryPreference {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            value: RwLock::new(initial.into()),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Acquire)
    }
}

impl Preference for MemoryPreference {
    fn get(&self) -> String {
        read_lock(&self.value).clone()
    }

    fn set(&self, value: String) {
        *write_lock(&self.value) = value;
        self.writes.fetch_add(1, Ordering::AcqRel);
    }
}
