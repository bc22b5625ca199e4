//! Keyring configuration
//!
//! Settings are layered: built-in defaults, then an optional TOML file,
//! then `LEDGER_KEYRING_*` environment variables (a `.env` file is loaded first).

use std::env;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use dotenv::dotenv;
use serde::{Deserialize, Serialize};

use crate::core::device::Bip32Path;
use crate::shared::constants::{DEFAULT_HD_PATH, DEFAULT_SPECULOS_HOST, DEFAULT_SPECULOS_PORT};
use crate::shared::error::KeyringError;

pub const ENV_PREFIX: &str = "LEDGER_KEYRING";
pub const CONFIG_PATH_VAR: &str = "LEDGER_KEYRING_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "ledger-keyring.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyringConfig {
    pub hd_path: String,
    /// Ask the device to show the address when deriving the account
    pub display_address: bool,
    pub include_chain_code: bool,
    pub resolve_erc20: bool,
    pub log_level: String,
    pub speculos_host: String,
    pub speculos_port: u16,
}

impl Default for KeyringConfig {
    fn default() -> Self {
        Self {
            hd_path: DEFAULT_HD_PATH.to_string(),
            display_address: true,
            include_chain_code: true,
            resolve_erc20: true,
            log_level: "info".to_string(),
            speculos_host: DEFAULT_SPECULOS_HOST.to_string(),
            speculos_port: DEFAULT_SPECULOS_PORT,
        }
    }
}

impl KeyringConfig {
    /// Load configuration from `.env`, the config file and the environment
    pub fn from_env() -> Result<Self, KeyringError> {
        dotenv().ok();

        let path = env::var(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        Self::load(Some(&path), ENV_PREFIX)
    }

    /// Load configuration from an optional file and an environment prefix
    pub fn load(path: Option<&Path>, env_prefix: &str) -> Result<Self, KeyringError> {
        let defaults = Self::default();

        let mut builder = Config::builder()
            .set_default("hd_path", defaults.hd_path)?
            .set_default("display_address", defaults.display_address)?
            .set_default("include_chain_code", defaults.include_chain_code)?
            .set_default("resolve_erc20", defaults.resolve_erc20)?
            .set_default("log_level", defaults.log_level)?
            .set_default("speculos_host", defaults.speculos_host)?
            .set_default("speculos_port", i64::from(defaults.speculos_port))?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        let settings = builder
            .add_source(Environment::with_prefix(env_prefix).try_parsing(true))
            .build()?;

        let config: KeyringConfig = settings.try_deserialize()?;
        config.validate()?;

        log::debug!("Loaded keyring configuration: {:?}", config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), KeyringError> {
        Bip32Path::parse(&self.hd_path)
            .map_err(|e| KeyringError::config(format!("Invalid hd_path: {}", e)))?;

        if self.speculos_host.is_empty() {
            return Err(KeyringError::config("speculos_host cannot be empty"));
        }

        Ok(())
    }

    /// Address of the emulator APDU port
    pub fn speculos_addr(&self) -> String {
        format!("{}:{}", self.speculos_host, self.speculos_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = KeyringConfig::default();
        assert_eq!(config.hd_path, "m/44'/60'/0'/0/0");
        assert!(config.display_address);
        assert!(config.include_chain_code);
        assert_eq!(config.speculos_addr(), "127.0.0.1:9999");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_defaults_without_sources() {
        let config = KeyringConfig::load(None, "LEDGER_KEYRING_TEST_EMPTY")
            .expect("Failed to load defaults");
        assert_eq!(config, KeyringConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("Failed to create temp file");
        writeln!(file, "hd_path = \"m/44'/60'/1'/0/0\"").unwrap();
        writeln!(file, "display_address = false").unwrap();
        writeln!(file, "speculos_port = 40000").unwrap();

        let config = KeyringConfig::load(Some(file.path()), "LEDGER_KEYRING_TEST_FILE")
            .expect("Failed to load config file");
        assert_eq!(config.hd_path, "m/44'/60'/1'/0/0");
        assert!(!config.display_address);
        assert!(config.include_chain_code);
        assert_eq!(config.speculos_port, 40000);
    }

    #[test]
    fn test_environment_overrides() {
        env::set_var("LEDGER_KEYRING_TEST_ENV_HD_PATH", "m/44'/60'/0'/0/7");
        env::set_var("LEDGER_KEYRING_TEST_ENV_RESOLVE_ERC20", "false");

        let config = KeyringConfig::load(None, "LEDGER_KEYRING_TEST_ENV")
            .expect("Failed to load env config");
        assert_eq!(config.hd_path, "m/44'/60'/0'/0/7");
        assert!(!config.resolve_erc20);

        env::remove_var("LEDGER_KEYRING_TEST_ENV_HD_PATH");
        env::remove_var("LEDGER_KEYRING_TEST_ENV_RESOLVE_ERC20");
    }

    #[test]
    fn test_invalid_hd_path_rejected() {
        env::set_var("LEDGER_KEYRING_TEST_BAD_HD_PATH", "m/44'/sixty");

        let result = KeyringConfig::load(None, "LEDGER_KEYRING_TEST_BAD");
        assert!(matches!(result, Err(KeyringError::Config(_))));

        env::remove_var("LEDGER_KEYRING_TEST_BAD_HD_PATH");
    }
}
