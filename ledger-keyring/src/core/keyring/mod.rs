//! Ledger keyring
//!
//! Manages the single device-held account and runs the signing round trip:
//! the unsigned encoding goes to the device together with its resolution
//! descriptors, and the returned signature is folded back into a transaction
//! of the original type, chain configuration and frozen state.

pub mod registry;

use crate::core::device::{DeviceSession, EthereumApp, Transport};
use crate::core::resolution::{Erc20Resolver, LoadConfig, ResolutionConfig, TransactionResolver};
use crate::core::transactions::{Transaction, TransactionFactory, TxOptions};
use crate::domain::entities::{Account, SerializedKeyring};
use crate::shared::config::KeyringConfig;
use crate::shared::constants::{KEYRING_TYPE, MAX_ACCOUNTS};
use crate::shared::error::KeyringError;
use crate::shared::types::{Address, KeyringResult};
use crate::shared::utils::add_hex_prefix;

pub use registry::AccountRegistry;

pub struct LedgerKeyring {
    registry: AccountRegistry,
    session: DeviceSession,
    resolver: Box<dyn TransactionResolver>,
    load_config: LoadConfig,
    resolution_config: ResolutionConfig,
    display_address: bool,
    include_chain_code: bool,
}

impl LedgerKeyring {
    pub const TYPE: &'static str = KEYRING_TYPE;

    /// Build from a persisted snapshot (possibly empty)
    pub fn new(opts: SerializedKeyring) -> KeyringResult<Self> {
        Self::build(opts, &KeyringConfig::default())
    }

    pub fn from_config(config: &KeyringConfig) -> KeyringResult<Self> {
        config.validate()?;
        let opts = SerializedKeyring {
            hd_path: Some(config.hd_path.clone()),
            accounts: None,
        };
        Self::build(opts, config)
    }

    fn build(opts: SerializedKeyring, config: &KeyringConfig) -> KeyringResult<Self> {
        Ok(Self {
            registry: AccountRegistry::from_snapshot(&opts)?,
            session: DeviceSession::new(),
            resolver: Box::new(Erc20Resolver::new()),
            load_config: LoadConfig::default(),
            resolution_config: ResolutionConfig {
                erc20: config.resolve_erc20,
                ..ResolutionConfig::default()
            },
            display_address: config.display_address,
            include_chain_code: config.include_chain_code,
        })
    }

    pub fn with_resolver<R: TransactionResolver + 'static>(mut self, resolver: R) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn with_load_config(mut self, load_config: LoadConfig) -> Self {
        self.load_config = load_config;
        self
    }

    pub fn keyring_type(&self) -> &'static str {
        Self::TYPE
    }

    pub fn hd_path(&self) -> &str {
        self.registry.hd_path()
    }

    pub fn serialize(&self) -> SerializedKeyring {
        self.registry.snapshot()
    }

    /// Replace the registry; the current one is kept if the snapshot is rejected
    pub fn deserialize(&mut self, opts: SerializedKeyring) -> KeyringResult<()> {
        self.registry = AccountRegistry::from_snapshot(&opts)?;
        Ok(())
    }

    pub fn get_accounts(&self) -> Vec<Address> {
        self.registry.addresses()
    }

    /// Ask the device for the address at `hd_path`
    pub async fn unlock(&self, hd_path: &str) -> KeyringResult<Address> {
        let app = self.session.app()?;
        let response = app
            .get_address(hd_path, self.display_address, self.include_chain_code)
            .await?;
        Ok(response.address)
    }

    pub async fn add_accounts(&mut self, n: usize) -> KeyringResult<Vec<Address>> {
        if n > MAX_ACCOUNTS {
            return Err(KeyringError::unsupported(format!(
                "LedgerKeyring only supports one account {}",
                n
            )));
        }

        if self.registry.is_empty() {
            let hd_path = self.registry.hd_path().to_string();
            let address = self.unlock(&hd_path).await?;
            log::info!("Added Ledger account {} at {}", address, hd_path);
            self.registry.push(Account::new(address, hd_path)?)?;
        }

        Ok(self.get_accounts())
    }

    pub async fn get_default_account(&mut self) -> KeyringResult<Address> {
        let accounts = if self.registry.is_empty() {
            self.add_accounts(1).await?
        } else {
            self.get_accounts()
        };

        accounts
            .into_iter()
            .next()
            .ok_or_else(|| KeyringError::validation("No account was derived"))
    }

    pub async fn sign_transaction(
        &self,
        address: &str,
        tx: &Transaction,
    ) -> KeyringResult<Transaction> {
        let hd_path = self.registry.path_for(address)?;

        let raw_tx_hex = hex::encode(tx.message_to_sign());
        log::debug!("Resolving transaction {}", raw_tx_hex);

        let resolution = self
            .resolver
            .resolve_transaction(&raw_tx_hex, &self.load_config, &self.resolution_config)
            .await?;

        let app = self.session.app()?;
        let signature = app
            .sign_transaction(hd_path, &raw_tx_hex, Some(resolution))
            .await?;
        log::debug!(
            "Ledger signature received: v={} r={} s={}",
            signature.v,
            signature.r,
            signature.s
        );

        // the plain form carries no type, so it is stamped back explicitly
        let mut tx_data = tx.to_json();
        tx_data.tx_type = Some(tx.tx_type().to_hex());
        tx_data.v = Some(add_hex_prefix(&signature.v));
        tx_data.r = Some(add_hex_prefix(&signature.r));
        tx_data.s = Some(add_hex_prefix(&signature.s));

        TransactionFactory::from_tx_data(
            tx_data,
            TxOptions {
                common: *tx.common(),
                freeze: tx.is_frozen(),
            },
        )
    }

    /// Bind a transport; any previous binding is dropped
    pub fn set_transport<T: Transport + 'static>(&mut self, transport: T) {
        self.session.bind(transport);
    }

    pub fn set_app<A: EthereumApp + 'static>(&mut self, app: A) {
        self.session.set_app(app);
    }

    /// Forget the device binding after the transport went away
    pub fn disconnect(&mut self) {
        self.session.clear();
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_bound()
    }
}
