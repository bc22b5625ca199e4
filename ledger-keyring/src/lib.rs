//! Ledger Keyring
//!
//! Hardware-wallet keyring for a Ledger device running the Ethereum app.
//! Keys never leave the device: the keyring keeps track of the derived
//! account and drives the signing round trip over an APDU transport.
//!
//! ## Architecture
//!
//! - **Core**: Account registry and signing, device protocol, transaction resolution, transaction model
//! - **Domain**: Accounts and the persisted keyring snapshot
//! - **Shared**: Common types, constants, configuration, errors and utilities
//! - **Infrastructure**: Concrete transports (Speculos emulator)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ledger_keyring::{KeyringConfig, LedgerKeyring, SpeculosTransport};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = KeyringConfig::from_env()?;
//! let mut keyring = LedgerKeyring::from_config(&config)?;
//!
//! // Bind the device and derive the account at the configured path
//! keyring.set_transport(SpeculosTransport::from_config(&config).await?);
//! let address = keyring.get_default_account().await?;
//! println!("Ledger account: {}", address);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod domain;
pub mod infrastructure;
pub mod shared;

// Re-export specific components
pub use crate::core::device::{DeviceSession, EthereumApp, LedgerEthApp, Transport};
pub use crate::core::keyring::{AccountRegistry, LedgerKeyring};
pub use crate::core::resolution::{Erc20Resolver, Resolution, TransactionResolver};
pub use crate::core::transactions::{Common, Hardfork, Transaction, TransactionFactory, TxData, TxType};
pub use crate::infrastructure::SpeculosTransport;

// Re-export domain entities
pub use crate::domain::{Account, SerializedKeyring};

// Re-export shared types
pub use shared::config::KeyringConfig;
pub use shared::error::{DeviceError, KeyringError, ResolutionError};
pub use shared::types::{KeyringResult, Network};

/// Install `env_logger` with `level` as the default filter; `RUST_LOG` takes precedence.
/// Later calls are no-ops.
pub fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    if env_logger::Builder::from_env(env).try_init().is_ok() {
        log::debug!("Logging initialized at {}", level);
    }
}

/// Load configuration and initialize logging from it
pub fn init() -> KeyringResult<KeyringConfig> {
    let config = KeyringConfig::from_env()?;
    init_logging(&config.log_level);
    Ok(config)
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging("debug");
        init_logging("info");
        log::info!("still logging");
    }

    #[test]
    fn test_package_metadata() {
        assert_eq!(NAME, "ledger-keyring");
        assert!(!VERSION.is_empty());
    }
}
