//! ERC-20 descriptor resolution
//!
//! Decodes the unsigned transaction, looks for a token call and returns the
//! signed descriptor of the target contract when it is known.

use std::collections::HashMap;

use async_trait::async_trait;

use super::{LoadConfig, Resolution, ResolutionConfig, TransactionResolver};
use crate::core::transactions::RawTransaction;
use crate::shared::constants::{
    ADDRESS_SIZE, SELECTOR_APPROVE, SELECTOR_TRANSFER, SELECTOR_TRANSFER_FROM,
};
use crate::shared::error::ResolutionError;
use crate::shared::utils::strip_hex_prefix;

/// A token known to the device's crypto-asset list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub ticker: String,
    pub contract_address: [u8; ADDRESS_SIZE],
    pub decimals: u32,
    pub chain_id: u32,
    pub signature: Vec<u8>,
}

impl TokenInfo {
    /// Parse `ticker_len || ticker || address || decimals || chain_id || signature`
    pub fn from_descriptor(descriptor_hex: &str) -> Result<Self, ResolutionError> {
        let bytes = hex::decode(strip_hex_prefix(descriptor_hex))
            .map_err(|e| ResolutionError::InvalidDescriptor(e.to_string()))?;

        let ticker_len = *bytes
            .first()
            .ok_or_else(|| ResolutionError::InvalidDescriptor("empty descriptor".to_string()))?
            as usize;
        let fixed_end = 1 + ticker_len + ADDRESS_SIZE + 8;
        if bytes.len() <= fixed_end {
            return Err(ResolutionError::InvalidDescriptor(format!(
                "descriptor too short: {} bytes",
                bytes.len()
            )));
        }

        let ticker = String::from_utf8(bytes[1..1 + ticker_len].to_vec())
            .map_err(|_| ResolutionError::InvalidDescriptor("ticker is not utf-8".to_string()))?;

        let mut offset = 1 + ticker_len;
        let mut contract_address = [0u8; ADDRESS_SIZE];
        contract_address.copy_from_slice(&bytes[offset..offset + ADDRESS_SIZE]);
        offset += ADDRESS_SIZE;

        let decimals = read_u32(&bytes[offset..offset + 4]);
        let chain_id = read_u32(&bytes[offset + 4..offset + 8]);

        Ok(Self {
            ticker,
            contract_address,
            decimals,
            chain_id,
            signature: bytes[fixed_end..].to_vec(),
        })
    }

    /// Wire form handed to the device
    pub fn descriptor(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + self.ticker.len() + ADDRESS_SIZE + 8 + self.signature.len());
        bytes.push(self.ticker.len() as u8);
        bytes.extend_from_slice(self.ticker.as_bytes());
        bytes.extend_from_slice(&self.contract_address);
        bytes.extend_from_slice(&self.decimals.to_be_bytes());
        bytes.extend_from_slice(&self.chain_id.to_be_bytes());
        bytes.extend_from_slice(&self.signature);
        bytes
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b))
}

fn is_token_call(data: &[u8]) -> bool {
    data.len() >= 4
        && [SELECTOR_TRANSFER, SELECTOR_APPROVE, SELECTOR_TRANSFER_FROM]
            .iter()
            .any(|selector| data[..4] == selector[..])
}

/// Resolver backed by an in-memory token list
#[derive(Debug, Clone, Default)]
pub struct Erc20Resolver {
    tokens: HashMap<[u8; ADDRESS_SIZE], Vec<TokenInfo>>,
}

impl Erc20Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, token: TokenInfo) {
        self.tokens
            .entry(token.contract_address)
            .or_default()
            .push(token);
    }

    pub fn register_descriptor(&mut self, descriptor_hex: &str) -> Result<(), ResolutionError> {
        let token = TokenInfo::from_descriptor(descriptor_hex)?;
        log::debug!("Registered token descriptor for {}", token.ticker);
        self.register(token);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tokens.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn lookup(&self, contract: &[u8; ADDRESS_SIZE], chain_id: Option<u64>) -> Option<&TokenInfo> {
        self.tokens.get(contract)?.iter().find(|token| match chain_id {
            Some(id) => u64::from(token.chain_id) == id,
            None => true,
        })
    }
}

#[async_trait]
impl TransactionResolver for Erc20Resolver {
    async fn resolve_transaction(
        &self,
        raw_tx_hex: &str,
        _load_config: &LoadConfig,
        resolution_config: &ResolutionConfig,
    ) -> Result<Resolution, ResolutionError> {
        let mut resolution = Resolution::default();
        if !resolution_config.erc20 || self.is_empty() {
            return Ok(resolution);
        }

        let raw = hex::decode(strip_hex_prefix(raw_tx_hex))?;
        let call = RawTransaction::decode(&raw)?;

        if let Some(contract) = call.to {
            if is_token_call(&call.data) {
                if let Some(token) = self.lookup(&contract, call.chain_id) {
                    log::debug!("Resolved ERC-20 call to {}", token.ticker);
                    resolution.erc20_tokens.push(hex::encode(token.descriptor()));
                }
            }
        }

        Ok(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::transaction::eip2718::TypedTransaction;
    use ethers::types::{Address, Bytes, Eip1559TransactionRequest};

    const USDC: [u8; 20] = [0xa0; 20];

    fn usdc() -> TokenInfo {
        TokenInfo {
            ticker: "USDC".to_string(),
            contract_address: USDC,
            decimals: 6,
            chain_id: 1,
            signature: vec![0x30, 0x44, 0x02, 0x20],
        }
    }

    fn transfer_data() -> Bytes {
        let mut data = SELECTOR_TRANSFER.to_vec();
        data.extend_from_slice(&[0u8; 64]);
        Bytes::from(data)
    }

    fn resolver() -> Erc20Resolver {
        let mut resolver = Erc20Resolver::new();
        resolver.register(usdc());
        resolver
    }

    fn fee_market_transfer(chain_id: u64) -> String {
        let tx: TypedTransaction = Eip1559TransactionRequest::new()
            .to(Address::from(USDC))
            .data(transfer_data())
            .nonce(3)
            .gas(60_000)
            .max_fee_per_gas(100)
            .max_priority_fee_per_gas(2)
            .chain_id(chain_id)
            .into();
        hex::encode(tx.rlp())
    }

    #[test]
    fn test_descriptor_round_trip() {
        let token = usdc();
        let parsed = TokenInfo::from_descriptor(&hex::encode(token.descriptor())).unwrap();
        assert_eq!(parsed, token);
    }

    #[test]
    fn test_descriptor_too_short() {
        assert!(matches!(
            TokenInfo::from_descriptor("0455534443"),
            Err(ResolutionError::InvalidDescriptor(_))
        ));
        assert!(TokenInfo::from_descriptor("").is_err());
    }

    #[tokio::test]
    async fn test_resolves_known_token_transfer() {
        let resolution = resolver()
            .resolve_transaction(
                &fee_market_transfer(1),
                &LoadConfig::default(),
                &ResolutionConfig::erc20_only(),
            )
            .await
            .unwrap();

        assert_eq!(resolution.erc20_tokens, vec![hex::encode(usdc().descriptor())]);
        assert!(resolution.nfts.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_chain_is_not_resolved() {
        let resolution = resolver()
            .resolve_transaction(
                &fee_market_transfer(5),
                &LoadConfig::default(),
                &ResolutionConfig::erc20_only(),
            )
            .await
            .unwrap();

        assert!(resolution.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_or_empty_resolver_returns_empty() {
        let raw = fee_market_transfer(1);

        let disabled = resolver()
            .resolve_transaction(&raw, &LoadConfig::default(), &ResolutionConfig::default())
            .await
            .unwrap();
        assert!(disabled.is_empty());

        let empty = Erc20Resolver::new()
            .resolve_transaction(&raw, &LoadConfig::default(), &ResolutionConfig::erc20_only())
            .await
            .unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_token_call_selectors() {
        assert!(is_token_call(&transfer_data()));
        assert!(is_token_call(&SELECTOR_TRANSFER_FROM));
        assert!(!is_token_call(&[0xde, 0xad, 0xbe, 0xef]));
        assert!(!is_token_call(&[0xa9, 0x05]));
    }

    #[tokio::test]
    async fn test_malformed_transaction() {
        let result = resolver()
            .resolve_transaction("0x05c0", &LoadConfig::default(), &ResolutionConfig::erc20_only())
            .await;
        assert!(matches!(result, Err(ResolutionError::MalformedTransaction(_))));

        let result = resolver()
            .resolve_transaction("zz", &LoadConfig::default(), &ResolutionConfig::erc20_only())
            .await;
        assert!(result.is_err());
    }
}
