//! Domain layer for the group tracker.
//!
//! This crate contains:
//! - Domain models (Group, Device, Message, Location)
//! - Collaborator contracts the registry reports through (error display,
//!   group labels)

pub mod models;
pub mod services;
