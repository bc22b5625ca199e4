//! Transaction model
//!
//! [`Transaction`] wraps an ethers `TypedTransaction` together with the chain
//! configuration it was built for, an optional signature and a frozen flag.
//! It provides the unsigned encoding sent to the device and the plain-data
//! form consumed by [`TransactionFactory`].

pub mod common;
pub mod factory;
pub mod raw;
pub mod tx_data;

use std::fmt;

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::transaction::eip2930::AccessList;
use ethers::types::{Address, NameOrAddress, Signature, H256, U256};
use ethers::utils::keccak256;
use serde::{Deserialize, Serialize};

use crate::shared::error::KeyringError;
use crate::shared::types::KeyringResult;
use crate::shared::utils::{bytes_to_hex, format_quantity, parse_quantity};

pub use common::{Common, Hardfork};
pub use factory::{TransactionFactory, TxOptions};
pub use raw::RawTransaction;
pub use tx_data::{AccessListEntry, TxData};

/// Transaction format discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxType {
    Legacy,
    AccessList,
    FeeMarket,
}

impl TxType {
    pub fn as_u8(&self) -> u8 {
        match self {
            TxType::Legacy => 0,
            TxType::AccessList => 1,
            TxType::FeeMarket => 2,
        }
    }

    pub fn from_u8(value: u8) -> KeyringResult<Self> {
        match value {
            0 => Ok(TxType::Legacy),
            1 => Ok(TxType::AccessList),
            2 => Ok(TxType::FeeMarket),
            other => Err(KeyringError::transaction(format!(
                "Unsupported transaction type: {}",
                other
            ))),
        }
    }

    /// Accepts `0x2`, `0x02` or `2`
    pub fn parse(value: &str) -> KeyringResult<Self> {
        let parsed = parse_quantity(value)?;
        if parsed > U256::from(u8::MAX) {
            return Err(KeyringError::transaction(format!(
                "Unsupported transaction type: {}",
                value
            )));
        }
        Self::from_u8(parsed.as_u32() as u8)
    }

    /// `0x`-prefixed discriminator as found in plain transaction data
    pub fn to_hex(&self) -> String {
        format!("0x{:x}", self.as_u8())
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    inner: TypedTransaction,
    signature: Option<Signature>,
    common: Common,
    frozen: bool,
}

impl Transaction {
    /// Wrap an unsigned request; the common's chain id is stamped when missing
    pub fn new(mut inner: TypedTransaction, common: Common) -> Self {
        if inner.chain_id().is_none() {
            inner.set_chain_id(common.chain_id());
        }

        Self {
            inner,
            signature: None,
            common,
            frozen: false,
        }
    }

    pub(crate) fn from_parts(
        inner: TypedTransaction,
        signature: Option<Signature>,
        common: Common,
        frozen: bool,
    ) -> Self {
        Self {
            inner,
            signature,
            common,
            frozen,
        }
    }

    pub fn tx_type(&self) -> TxType {
        match self.inner {
            TypedTransaction::Legacy(_) => TxType::Legacy,
            TypedTransaction::Eip2930(_) => TxType::AccessList,
            TypedTransaction::Eip1559(_) => TxType::FeeMarket,
        }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    pub fn inner(&self) -> &TypedTransaction {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> KeyringResult<&mut TypedTransaction> {
        if self.frozen {
            return Err(KeyringError::immutable("cannot modify a frozen transaction"));
        }
        Ok(&mut self.inner)
    }

    /// Canonical unsigned encoding the signer commits to
    pub fn message_to_sign(&self) -> Vec<u8> {
        self.inner.rlp().to_vec()
    }

    pub fn message_hash(&self) -> H256 {
        self.inner.sighash()
    }

    fn require_signature(&self) -> KeyringResult<&Signature> {
        self.signature
            .as_ref()
            .ok_or_else(|| KeyringError::transaction("transaction is not signed"))
    }

    /// Signed raw encoding, ready for broadcast
    pub fn serialize(&self) -> KeyringResult<Vec<u8>> {
        let signature = self.require_signature()?;
        Ok(self.inner.rlp_signed(signature).to_vec())
    }

    pub fn hash(&self) -> KeyringResult<H256> {
        Ok(H256::from(keccak256(self.serialize()?)))
    }

    /// Address recovered from the signature
    pub fn sender(&self) -> KeyringResult<Address> {
        let signature = self.require_signature()?;
        signature
            .recover(self.message_hash())
            .map_err(|e| KeyringError::transaction(format!("Signature recovery failed: {}", e)))
    }

    /// Plain-data form. The type discriminator is not part of it.
    pub fn to_json(&self) -> TxData {
        let inner = &self.inner;
        let mut data = TxData {
            nonce: inner.nonce().copied().map(format_quantity),
            gas_limit: inner.gas().copied().map(format_quantity),
            to: inner.to().map(|to| match to {
                NameOrAddress::Address(address) => bytes_to_hex(address.as_bytes()),
                NameOrAddress::Name(name) => name.clone(),
            }),
            value: inner.value().copied().map(format_quantity),
            data: inner.data().map(|bytes| bytes_to_hex(bytes)),
            chain_id: inner.chain_id().map(|id| format_quantity(U256::from(id.as_u64()))),
            ..TxData::default()
        };

        match inner {
            TypedTransaction::Legacy(tx) => {
                data.gas_price = tx.gas_price.map(format_quantity);
            }
            TypedTransaction::Eip2930(tx) => {
                data.gas_price = tx.tx.gas_price.map(format_quantity);
                data.access_list = Some(access_list_entries(&tx.access_list));
            }
            TypedTransaction::Eip1559(tx) => {
                data.max_fee_per_gas = tx.max_fee_per_gas.map(format_quantity);
                data.max_priority_fee_per_gas = tx.max_priority_fee_per_gas.map(format_quantity);
                data.access_list = Some(access_list_entries(&tx.access_list));
            }
        }

        if let Some(signature) = &self.signature {
            data.v = Some(format_quantity(U256::from(signature.v)));
            data.r = Some(format_quantity(signature.r));
            data.s = Some(format_quantity(signature.s));
        }

        data
    }
}

fn access_list_entries(access_list: &AccessList) -> Vec<AccessListEntry> {
    access_list
        .0
        .iter()
        .map(|item| AccessListEntry {
            address: bytes_to_hex(item.address.as_bytes()),
            storage_keys: item
                .storage_keys
                .iter()
                .map(|key| bytes_to_hex(key.as_bytes()))
                .collect(),
        })
        .collect()
}
