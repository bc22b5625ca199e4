//! Build typed transactions from plain data

use std::str::FromStr;

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::transaction::eip2930::{AccessList, AccessListItem};
use ethers::types::{
    Address, Bytes, Eip1559TransactionRequest, Eip2930TransactionRequest, NameOrAddress,
    Signature, TransactionRequest, H256, U256, U64,
};

use super::{AccessListEntry, Common, Transaction, TxData, TxType};
use crate::shared::error::KeyringError;
use crate::shared::types::KeyringResult;
use crate::shared::utils::{hex_to_bytes, parse_quantity};

/// Options applied to a freshly built transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOptions {
    pub common: Common,
    pub freeze: bool,
}

impl TxOptions {
    pub fn new(common: Common) -> Self {
        Self {
            common,
            freeze: true,
        }
    }

    pub fn freeze(mut self, freeze: bool) -> Self {
        self.freeze = freeze;
        self
    }
}

impl Default for TxOptions {
    fn default() -> Self {
        Self::new(Common::default())
    }
}

pub struct TransactionFactory;

impl TransactionFactory {
    pub fn from_tx_data(data: TxData, options: TxOptions) -> KeyringResult<Transaction> {
        let tx_type = match data.tx_type.as_deref() {
            Some(value) => TxType::parse(value)?,
            None => TxType::Legacy,
        };

        let common = options.common;
        if !common.supports(tx_type) {
            return Err(KeyringError::transaction(format!(
                "Transaction type {} is not supported at hardfork {:?}",
                tx_type,
                common.hardfork()
            )));
        }

        if let Some(chain_id) = data.chain_id.as_deref() {
            let chain_id = parse_quantity(chain_id)?;
            if chain_id != U256::from(common.chain_id()) {
                return Err(KeyringError::validation(format!(
                    "Chain id {} does not match common chain id {}",
                    chain_id,
                    common.chain_id()
                )));
            }
        }

        let inner = build_request(&data, tx_type, common.chain_id())?;
        let signature = parse_signature(&data, tx_type, common.chain_id())?;

        Ok(Transaction::from_parts(inner, signature, common, options.freeze))
    }
}

fn optional_quantity(value: &Option<String>) -> KeyringResult<Option<U256>> {
    value.as_deref().map(parse_quantity).transpose()
}

fn parse_recipient(value: &Option<String>) -> KeyringResult<Option<NameOrAddress>> {
    match value.as_deref() {
        None | Some("") | Some("0x") => Ok(None),
        Some(to) => Address::from_str(to)
            .map(|address| Some(NameOrAddress::Address(address)))
            .map_err(|_| KeyringError::validation(format!("Invalid recipient address: {}", to))),
    }
}

fn parse_access_list(entries: &Option<Vec<AccessListEntry>>) -> KeyringResult<AccessList> {
    let items = entries
        .iter()
        .flatten()
        .map(|entry| {
            let address = Address::from_str(&entry.address).map_err(|_| {
                KeyringError::validation(format!("Invalid access list address: {}", entry.address))
            })?;
            let storage_keys = entry
                .storage_keys
                .iter()
                .map(|key| {
                    H256::from_str(key).map_err(|_| {
                        KeyringError::validation(format!("Invalid storage key: {}", key))
                    })
                })
                .collect::<KeyringResult<Vec<H256>>>()?;
            Ok(AccessListItem {
                address,
                storage_keys,
            })
        })
        .collect::<KeyringResult<Vec<AccessListItem>>>()?;

    Ok(AccessList(items))
}

fn build_request(data: &TxData, tx_type: TxType, chain_id: u64) -> KeyringResult<TypedTransaction> {
    let nonce = optional_quantity(&data.nonce)?;
    let gas = optional_quantity(&data.gas_limit)?;
    let value = optional_quantity(&data.value)?;
    let to = parse_recipient(&data.to)?;
    let input = match data.data.as_deref() {
        Some(hex) => Some(Bytes::from(hex_to_bytes(hex)?)),
        None => None,
    };

    let legacy = TransactionRequest {
        to: to.clone(),
        gas,
        gas_price: optional_quantity(&data.gas_price)?,
        value,
        data: input.clone(),
        nonce,
        chain_id: Some(U64::from(chain_id)),
        ..TransactionRequest::default()
    };

    let inner = match tx_type {
        TxType::Legacy => TypedTransaction::Legacy(legacy),
        TxType::AccessList => TypedTransaction::Eip2930(Eip2930TransactionRequest::new(
            legacy,
            parse_access_list(&data.access_list)?,
        )),
        TxType::FeeMarket => TypedTransaction::Eip1559(Eip1559TransactionRequest {
            to,
            gas,
            value,
            data: input,
            nonce,
            access_list: parse_access_list(&data.access_list)?,
            max_priority_fee_per_gas: optional_quantity(&data.max_priority_fee_per_gas)?,
            max_fee_per_gas: optional_quantity(&data.max_fee_per_gas)?,
            chain_id: Some(U64::from(chain_id)),
            ..Eip1559TransactionRequest::default()
        }),
    };

    Ok(inner)
}

fn parse_signature(
    data: &TxData,
    tx_type: TxType,
    chain_id: u64,
) -> KeyringResult<Option<Signature>> {
    let (v, r, s) = match (&data.v, &data.r, &data.s) {
        (None, None, None) => return Ok(None),
        (Some(v), Some(r), Some(s)) => (
            parse_signature_part("v", v)?,
            parse_signature_part("r", r)?,
            parse_signature_part("s", s)?,
        ),
        _ => {
            return Err(KeyringError::validation(
                "v, r and s must be provided together",
            ))
        }
    };

    if v > U256::from(u64::MAX) {
        return Err(KeyringError::validation(format!("Invalid v value: {}", v)));
    }
    let v = v.as_u64();

    let valid = match tx_type {
        TxType::Legacy => {
            let eip155 = chain_id.checked_mul(2).and_then(|c| c.checked_add(35));
            v == 27 || v == 28 || eip155.map_or(false, |base| v == base || v == base + 1)
        }
        TxType::AccessList | TxType::FeeMarket => v <= 1,
    };
    if !valid {
        return Err(KeyringError::validation(format!(
            "Invalid v value {} for {:?} transaction on chain {}",
            v, tx_type, chain_id
        )));
    }

    Ok(Some(Signature { r, s, v }))
}

/// Signature parts must be `0x`-prefixed hex
fn parse_signature_part(name: &str, value: &str) -> KeyringResult<U256> {
    if !value.starts_with("0x") {
        return Err(KeyringError::validation(format!(
            "Signature {} must be 0x-prefixed hex, got {}",
            name, value
        )));
    }
    parse_quantity(value)
}
