//! Shared utilities for the group tracker crates.
//!
//! - Validation helpers for location fixes
//! - Logging initialization
//! - Poison-tolerant lock helpers

pub mod logging;
pub mod sync;
pub mod validation;
