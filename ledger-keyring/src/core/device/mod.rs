//! Device session and the Ethereum application proxy
//!
//! The keyring never talks to a transport directly. It holds a
//! [`DeviceSession`], which owns the [`EthereumApp`] proxy built from the
//! transport supplied by the caller.

pub mod apdu;
pub mod eth_app;
pub mod path;
pub mod transport;

use std::fmt;

use async_trait::async_trait;

use crate::core::resolution::Resolution;
use crate::shared::error::{DeviceError, KeyringError};
use crate::shared::types::{AddressResponse, KeyringResult, SignatureParts};

pub use apdu::{ApduAnswer, ApduCommand};
pub use eth_app::{AppConfiguration, LedgerEthApp};
pub use path::Bip32Path;
pub use transport::Transport;

/// Address and signature operations of the on-device Ethereum application
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EthereumApp: Send + Sync {
    async fn get_address(
        &self,
        path: &str,
        display: bool,
        chain_code: bool,
    ) -> Result<AddressResponse, DeviceError>;

    /// Sign an unsigned raw transaction; `v`, `r` and `s` come back as unprefixed hex
    async fn sign_transaction(
        &self,
        path: &str,
        raw_tx_hex: &str,
        resolution: Option<Resolution>,
    ) -> Result<SignatureParts, DeviceError>;
}

/// Binding between a transport and the application proxy
#[derive(Default)]
pub struct DeviceSession {
    app: Option<Box<dyn EthereumApp>>,
}

impl DeviceSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any previous binding with a proxy over `transport`
    pub fn bind<T: Transport + 'static>(&mut self, transport: T) {
        log::info!("Binding Ledger transport");
        self.app = Some(Box::new(LedgerEthApp::new(transport)));
    }

    pub fn set_app<A: EthereumApp + 'static>(&mut self, app: A) {
        self.app = Some(Box::new(app));
    }

    pub fn clear(&mut self) {
        if self.app.take().is_some() {
            log::info!("Ledger session cleared");
        }
    }

    pub fn is_bound(&self) -> bool {
        self.app.is_some()
    }

    pub fn app(&self) -> KeyringResult<&dyn EthereumApp> {
        self.app.as_deref().ok_or(KeyringError::NotInitialized)
    }
}

impl fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceSession")
            .field("bound", &self.is_bound())
            .finish()
    }
}
