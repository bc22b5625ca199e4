//! Account entity and the persisted keyring snapshot

use serde::{Deserialize, Serialize};

use crate::shared::constants::DEFAULT_HD_PATH;
use crate::shared::types::{Address, HdPath};
use crate::shared::utils::validate_ethereum_address;
use crate::shared::error::KeyringError;

/// A device-held account and the path it was derived at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub address: Address,
    pub hd_path: HdPath,
}

impl Account {
    pub fn new(address: impl Into<Address>, hd_path: impl Into<HdPath>) -> Result<Self, KeyringError> {
        let address = address.into();
        validate_ethereum_address(&address)?;

        Ok(Self {
            address,
            hd_path: hd_path.into(),
        })
    }
}

/// Snapshot handed to and received from the keyring manager.
/// Both fields may be absent in what is received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedKeyring {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hd_path: Option<HdPath>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounts: Option<Vec<Account>>,
}

impl SerializedKeyring {
    pub fn new(hd_path: impl Into<HdPath>, accounts: Vec<Account>) -> Self {
        Self {
            hd_path: Some(hd_path.into()),
            accounts: Some(accounts),
        }
    }

    /// HD path, with an empty or missing value read as the default
    pub fn hd_path_or_default(&self) -> HdPath {
        match self.hd_path.as_deref() {
            Some(path) if !path.is_empty() => path.to_string(),
            _ => DEFAULT_HD_PATH.to_string(),
        }
    }
}
