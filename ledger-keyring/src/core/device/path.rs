//! BIP-32 derivation paths in the device wire format

use std::fmt;
use std::str::FromStr;

use bip32::DerivationPath;

use crate::shared::error::KeyringError;

const HARDENED_FLAG: u32 = 0x8000_0000;
const MAX_DEPTH: usize = 10;

/// A parsed HD path, kept as raw child indexes (hardened bit included)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bip32Path {
    components: Vec<u32>,
}

impl Bip32Path {
    /// Parse `m/44'/60'/0'/0/0`; the leading `m/` is optional
    pub fn parse(path: &str) -> Result<Self, KeyringError> {
        let trimmed = path.trim();
        let normalized = if trimmed.starts_with('m') {
            trimmed.to_string()
        } else {
            format!("m/{}", trimmed)
        };

        let derivation = DerivationPath::from_str(&normalized)
            .map_err(|e| KeyringError::validation(format!("Invalid HD path {}: {}", path, e)))?;

        let components: Vec<u32> = derivation
            .into_iter()
            .map(|child| {
                if child.is_hardened() {
                    child.index() | HARDENED_FLAG
                } else {
                    child.index()
                }
            })
            .collect();

        if components.is_empty() || components.len() > MAX_DEPTH {
            return Err(KeyringError::validation(format!(
                "HD path must have between 1 and {} components: {}",
                MAX_DEPTH, path
            )));
        }

        Ok(Self { components })
    }

    pub fn components(&self) -> &[u32] {
        &self.components
    }

    /// Encode as `depth || index_be*`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + self.components.len() * 4);
        bytes.push(self.components.len() as u8);
        for index in &self.components {
            bytes.extend_from_slice(&index.to_be_bytes());
        }
        bytes
    }
}

impl fmt::Display for Bip32Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for index in &self.components {
            if index & HARDENED_FLAG != 0 {
                write!(f, "/{}'", index & !HARDENED_FLAG)?;
            } else {
                write!(f, "/{}", index)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bip32_path_standard() {
        let path = Bip32Path::parse("m/44'/60'/0'/0/0").unwrap();

        assert_eq!(
            path.components(),
            &[0x8000002C, 0x8000003C, 0x80000000, 0x00000000, 0x00000000]
        );
    }

    #[test]
    fn test_bip32_path_without_prefix() {
        let with = Bip32Path::parse("m/44'/60'/0'/0/0").unwrap();
        let without = Bip32Path::parse("44'/60'/0'/0/0").unwrap();
        assert_eq!(with, without);
    }

    #[test]
    fn test_bip32_path_bytes() {
        let bytes = Bip32Path::parse("m/44'/60'").unwrap().to_bytes();

        assert_eq!(bytes, vec![2, 0x80, 0x00, 0x00, 0x2C, 0x80, 0x00, 0x00, 0x3C]);
    }

    #[test]
    fn test_bip32_path_display() {
        let path = Bip32Path::parse("44'/60'/0'/0/3").unwrap();
        assert_eq!(path.to_string(), "m/44'/60'/0'/0/3");
    }

    #[test]
    fn test_invalid_paths() {
        assert!(Bip32Path::parse("m/44'/sixty'").is_err());
        assert!(Bip32Path::parse("m").is_err());
        assert!(Bip32Path::parse("m/1/2/3/4/5/6/7/8/9/10/11").is_err());
    }
}
