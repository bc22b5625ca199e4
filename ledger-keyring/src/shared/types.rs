use serde::{Deserialize, Serialize};

// Basic types for keyring operations
pub type Address = String;
pub type HdPath = String;

// Ethereum mainnet and its public test networks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Network {
    Mainnet,
    Sepolia,
    Holesky,
    Custom(u64),
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 1,
            Network::Sepolia => 11155111,
            Network::Holesky => 17000,
            Network::Custom(chain_id) => *chain_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Network::Mainnet => "Ethereum Mainnet",
            Network::Sepolia => "Sepolia",
            Network::Holesky => "Holesky",
            Network::Custom(_) => "Custom",
        }
    }

    /// Map a chain id back to a known network
    pub fn from_chain_id(chain_id: u64) -> Self {
        match chain_id {
            1 => Network::Mainnet,
            11155111 => Network::Sepolia,
            17000 => Network::Holesky,
            other => Network::Custom(other),
        }
    }
}

/// Address reply of the signing application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressResponse {
    pub public_key: String,
    pub address: Address,
    pub chain_code: Option<String>,
}

/// Raw signature parts as returned by the device, unprefixed hex
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureParts {
    pub v: String,
    pub r: String,
    pub s: String,
}

// Result types for better error handling
pub type KeyringResult<T> = Result<T, crate::shared::error::KeyringError>;
