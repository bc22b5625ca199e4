//! Transaction resolution
//!
//! Before signing, the device can be given signed descriptors for the
//! contracts a transaction touches so it can show token names and amounts
//! instead of raw call data. A [`TransactionResolver`] computes those
//! descriptors from the unsigned transaction; the keyring passes the result
//! through to the device untouched.

pub mod erc20;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::shared::error::ResolutionError;

pub use erc20::{Erc20Resolver, TokenInfo};

/// Where descriptors are fetched from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadConfig {
    pub cryptoassets_base_url: Option<String>,
    pub nft_explorer_base_url: Option<String>,
    pub plugin_base_url: Option<String>,
}

/// Which kinds of descriptors to compute
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionConfig {
    pub erc20: bool,
    pub nft: bool,
    pub external_plugins: bool,
}

impl ResolutionConfig {
    pub fn erc20_only() -> Self {
        Self {
            erc20: true,
            ..Self::default()
        }
    }
}

/// Payload and signature for an external plugin selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalPlugin {
    pub payload: String,
    pub signature: String,
}

/// Descriptors to hand to the device before a signature request.
/// All blobs are unprefixed hex.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub erc20_tokens: Vec<String>,
    pub nfts: Vec<String>,
    pub external_plugin: Vec<ExternalPlugin>,
    pub plugin: Vec<String>,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        self.erc20_tokens.is_empty()
            && self.nfts.is_empty()
            && self.external_plugin.is_empty()
            && self.plugin.is_empty()
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionResolver: Send + Sync {
    /// Compute the descriptors for an unsigned raw transaction
    async fn resolve_transaction(
        &self,
        raw_tx_hex: &str,
        load_config: &LoadConfig,
        resolution_config: &ResolutionConfig,
    ) -> Result<Resolution, ResolutionError>;
}
