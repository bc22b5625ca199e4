//! Domain entities
//!
//! Accounts managed by the keyring and the snapshot persisted on their behalf.

pub mod account;

pub use account::*;
