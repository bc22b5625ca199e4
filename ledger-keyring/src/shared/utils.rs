//! Utility functions for the keyring
//!
//! This module contains common hex and address helpers used throughout the keyring.

use crate::shared::constants::ADDRESS_HEX_LENGTH;
use crate::shared::error::KeyringError;
use ethers::types::U256;

/// Prefix a hex string with `0x` unless it already carries one
pub fn add_hex_prefix(value: &str) -> String {
    if value.starts_with("0x") || value.starts_with("0X") {
        value.to_string()
    } else {
        format!("0x{}", value)
    }
}

/// Remove a leading `0x` if present
pub fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

/// Convert hex string to bytes
pub fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, KeyringError> {
    hex::decode(strip_hex_prefix(hex))
        .map_err(|e| KeyringError::validation(format!("Invalid hex string: {}", e)))
}

/// Convert bytes to hex string
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse a hex quantity (`0x1a`, `1a`, `0x`) into a U256
pub fn parse_quantity(value: &str) -> Result<U256, KeyringError> {
    let digits = strip_hex_prefix(value);
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_str_radix(digits, 16)
        .map_err(|_| KeyringError::validation(format!("Invalid hex quantity: {}", value)))
}

/// Format a quantity as minimal `0x` hex
pub fn format_quantity(value: U256) -> String {
    format!("0x{:x}", value)
}

/// Validate Ethereum address format
pub fn validate_ethereum_address(address: &str) -> Result<(), KeyringError> {
    if !address.starts_with("0x") {
        return Err(KeyringError::validation("Address must start with 0x"));
    }

    if address.len() != ADDRESS_HEX_LENGTH {
        return Err(KeyringError::validation("Address must be 42 characters long"));
    }

    if !address[2..].chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(KeyringError::validation("Address contains invalid hex characters"));
    }

    Ok(())
}

/// Case-insensitive address comparison
pub fn addresses_match(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
