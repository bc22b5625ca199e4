//! Core keyring functionality
//!
//! This module contains the account registry and signing round trip, the
//! device protocol, transaction resolution and the transaction model.

pub mod device;
pub mod keyring;
pub mod resolution;
pub mod transactions;
