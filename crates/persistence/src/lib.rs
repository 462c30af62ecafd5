//! Persistence layer for the group tracker.
//!
//! This crate contains:
//! - The `GroupRegistry` and its load/save contract
//! - Stored document entities
//! - Preference accessors and storage configuration

pub mod config;
pub mod entities;
pub mod error;
pub mod metrics;
pub mod preference;
pub mod registry;

pub use error::StorageError;
pub use preference::{KeyValueStore, MemoryPreference, MemoryStore, Preference, PreferenceEntry};
pub use registry::GroupRegistry;
