//! Decoding of unsigned raw transactions

use rlp::{DecoderError, Rlp};

use super::TxType;
use crate::shared::constants::ADDRESS_SIZE;

/// The fields of an unsigned encoding needed outside the transaction model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTransaction {
    pub tx_type: TxType,
    pub to: Option<[u8; ADDRESS_SIZE]>,
    pub data: Vec<u8>,
    /// `None` for a pre-EIP-155 legacy encoding
    pub chain_id: Option<u64>,
}

impl RawTransaction {
    /// Split the legacy list or typed envelope
    pub fn decode(raw: &[u8]) -> Result<Self, DecoderError> {
        let first = *raw.first().ok_or(DecoderError::RlpIsTooShort)?;

        // (type, payload, index of `to`, index of `data`)
        let (tx_type, payload, to_index, data_index) = match first {
            0x01 => (TxType::AccessList, &raw[1..], 4, 6),
            0x02 => (TxType::FeeMarket, &raw[1..], 5, 7),
            b if b >= 0xc0 => (TxType::Legacy, raw, 3, 5),
            _ => return Err(DecoderError::Custom("unknown transaction type")),
        };

        let rlp = Rlp::new(payload);
        if !rlp.is_list() {
            return Err(DecoderError::RlpExpectedToBeList);
        }

        let to_bytes = rlp.at(to_index)?.data()?;
        let to = match to_bytes.len() {
            0 => None,
            ADDRESS_SIZE => {
                let mut address = [0u8; ADDRESS_SIZE];
                address.copy_from_slice(to_bytes);
                Some(address)
            }
            _ => return Err(DecoderError::Custom("recipient is not 20 bytes")),
        };

        let data = rlp.at(data_index)?.data()?.to_vec();

        let chain_id = match tx_type {
            TxType::AccessList | TxType::FeeMarket => Some(rlp.val_at::<u64>(0)?),
            // EIP-155 appends chain id, 0, 0
            TxType::Legacy if rlp.item_count()? >= 9 => Some(rlp.val_at::<u64>(6)?),
            TxType::Legacy => None,
        };

        Ok(Self {
            tx_type,
            to,
            data,
            chain_id,
        })
    }
}
