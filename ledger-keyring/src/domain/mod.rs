//! Domain layer - entities and value objects
//!
//! This module holds the data the keyring manages and persists, free of any
//! device or transport concerns.

pub mod entities;

// Re-export domain components
pub use entities::*;
