//! Account registry
//!
//! Ordered, capped collection of managed accounts plus the HD path new
//! accounts are derived at.

use crate::core::device::Bip32Path;
use crate::domain::entities::{Account, SerializedKeyring};
use crate::shared::constants::{DEFAULT_HD_PATH, MAX_ACCOUNTS};
use crate::shared::error::KeyringError;
use crate::shared::types::{Address, HdPath, KeyringResult};
use crate::shared::utils::{addresses_match, validate_ethereum_address};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRegistry {
    hd_path: HdPath,
    accounts: Vec<Account>,
}

impl Default for AccountRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_HD_PATH)
    }
}

impl AccountRegistry {
    pub fn new(hd_path: impl Into<HdPath>) -> Self {
        Self {
            hd_path: hd_path.into(),
            accounts: Vec::new(),
        }
    }

    /// Restore from a snapshot; absent fields fall back to defaults.
    /// Persisted addresses and paths are checked as if freshly derived.
    pub fn from_snapshot(snapshot: &SerializedKeyring) -> KeyringResult<Self> {
        let accounts = snapshot.accounts.clone().unwrap_or_default();
        if accounts.len() > MAX_ACCOUNTS {
            return Err(KeyringError::unsupported(format!(
                "LedgerKeyring only supports one account, snapshot holds {}",
                accounts.len()
            )));
        }

        let hd_path = snapshot.hd_path_or_default();
        Bip32Path::parse(&hd_path)?;
        for account in &accounts {
            validate_ethereum_address(&account.address)?;
            Bip32Path::parse(&account.hd_path)?;
        }

        Ok(Self { hd_path, accounts })
    }

    pub fn snapshot(&self) -> SerializedKeyring {
        SerializedKeyring::new(self.hd_path.clone(), self.accounts.clone())
    }

    pub fn hd_path(&self) -> &str {
        &self.hd_path
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.accounts
            .iter()
            .map(|account| account.address.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub(crate) fn push(&mut self, account: Account) -> KeyringResult<()> {
        if self.accounts.len() >= MAX_ACCOUNTS {
            return Err(KeyringError::unsupported("LedgerKeyring only supports one account"));
        }
        if self.contains(&account.address) {
            return Err(KeyringError::validation(format!(
                "Account {} is already managed",
                account.address
            )));
        }

        self.accounts.push(account);
        Ok(())
    }

    pub fn contains(&self, address: &str) -> bool {
        self.accounts
            .iter()
            .any(|account| addresses_match(&account.address, address))
    }

    /// HD path of a managed address, compared case-insensitively
    pub fn path_for(&self, address: &str) -> KeyringResult<&str> {
        self.accounts
            .iter()
            .find(|account| addresses_match(&account.address, address))
            .map(|account| account.hd_path.as_str())
            .ok_or_else(|| KeyringError::account_not_found(address))
    }
}
