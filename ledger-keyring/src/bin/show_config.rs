use anyhow::Context;
use ledger_keyring::{init_logging, KeyringConfig, LedgerKeyring};

fn main() -> anyhow::Result<()> {
    let config = KeyringConfig::from_env().context("failed to load keyring configuration")?;
    init_logging(&config.log_level);

    println!("{} Keyring Configuration:\n", LedgerKeyring::TYPE);
    println!("  HD Path: {}", config.hd_path);
    println!("  Display Address On Device: {}", config.display_address);
    println!("  Include Chain Code: {}", config.include_chain_code);
    println!("  Resolve ERC-20 Tokens: {}", config.resolve_erc20);
    println!("  Log Level: {}", config.log_level);
    println!("  Speculos Address: {}", config.speculos_addr());

    Ok(())
}
