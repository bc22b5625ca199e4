//! Infrastructure layer - concrete transports
//!
//! Connections to real or emulated devices live here; the keyring itself
//! only depends on the `Transport` trait.

pub mod speculos;

pub use speculos::SpeculosTransport;
