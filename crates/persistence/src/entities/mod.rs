//! Entity definitions for the stored group document.

pub mod group_document;

pub use group_document::{StoredDevice, StoredDocument, StoredGroup};
