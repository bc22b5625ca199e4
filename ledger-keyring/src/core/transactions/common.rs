//! Chain configuration attached to every transaction

use serde::{Deserialize, Serialize};

use super::TxType;
use crate::shared::types::Network;

/// Protocol upgrades that change which transaction formats are valid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Hardfork {
    Homestead,
    SpuriousDragon,
    Byzantium,
    Istanbul,
    Berlin,
    London,
    Shanghai,
    Cancun,
}

impl Hardfork {
    /// Access lists arrived with Berlin, fee-market transactions with London
    pub fn supports(&self, tx_type: TxType) -> bool {
        match tx_type {
            TxType::Legacy => true,
            TxType::AccessList => *self >= Hardfork::Berlin,
            TxType::FeeMarket => *self >= Hardfork::London,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Common {
    network: Network,
    hardfork: Hardfork,
}

impl Common {
    pub fn new(network: Network, hardfork: Hardfork) -> Self {
        Self { network, hardfork }
    }

    pub fn mainnet() -> Self {
        Self::new(Network::Mainnet, Hardfork::Cancun)
    }

    pub fn custom(chain_id: u64, hardfork: Hardfork) -> Self {
        Self::new(Network::from_chain_id(chain_id), hardfork)
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn chain_id(&self) -> u64 {
        self.network.chain_id()
    }

    pub fn hardfork(&self) -> Hardfork {
        self.hardfork
    }

    pub fn supports(&self, tx_type: TxType) -> bool {
        self.hardfork.supports(tx_type)
    }
}

impl Default for Common {
    fn default() -> Self {
        Self::mainnet()
    }
}
