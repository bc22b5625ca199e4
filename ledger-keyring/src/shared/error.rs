//! Error handling for the keyring
//!
//! This module defines the error types used throughout the keyring.
//! Device and resolution failures keep their own types and are carried
//! verbatim inside [`KeyringError`] so callers can tell them apart.

use thiserror::Error;

/// Keyring error type
#[derive(Error, Debug, Clone)]
pub enum KeyringError {
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Account not found for address: {0}")]
    AccountNotFound(String),

    #[error("Ledger app is not initialized. You must call setTransport first.")]
    NotInitialized,

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Transaction is frozen: {0}")]
    Immutable(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl KeyringError {
    /// Create an unsupported operation error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedOperation(message.into())
    }

    /// Create an account not found error
    pub fn account_not_found(address: impl Into<String>) -> Self {
        Self::AccountNotFound(address.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a transaction error
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction(message.into())
    }

    /// Create an immutability error
    pub fn immutable(message: impl Into<String>) -> Self {
        Self::Immutable(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True when the failure came from the device or its transport
    pub fn is_device_error(&self) -> bool {
        matches!(self, Self::Device(_))
    }
}

/// Failures surfaced by the signing-application proxy or its transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Device returned status {code:#06x}: {description}")]
    Status { code: u16, description: String },

    #[error("Unexpected device response: {0}")]
    UnexpectedResponse(String),

    #[error("Invalid device request: {0}")]
    InvalidRequest(String),
}

impl DeviceError {
    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create an unexpected response error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::UnexpectedResponse(message.into())
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Status word reported by the device, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// The user declined the request on the device
    pub fn is_user_rejected(&self) -> bool {
        self.status_code() == Some(crate::shared::constants::SW_CONDITIONS_NOT_SATISFIED)
    }
}

/// Failures from the transaction-resolution service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("Malformed raw transaction: {0}")]
    MalformedTransaction(String),

    #[error("Invalid token descriptor: {0}")]
    InvalidDescriptor(String),
}

impl ResolutionError {
    /// Create a malformed transaction error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedTransaction(message.into())
    }
}

// Standard library error conversions
impl From<std::io::Error> for DeviceError {
    fn from(err: std::io::Error) -> Self {
        Self::transport(format!("IO error: {}", err))
    }
}

impl From<hex::FromHexError> for KeyringError {
    fn from(err: hex::FromHexError) -> Self {
        Self::validation(format!("Hex decoding error: {}", err))
    }
}

impl From<serde_json::Error> for KeyringError {
    fn from(err: serde_json::Error) -> Self {
        Self::validation(format!("JSON error: {}", err))
    }
}

impl From<config::ConfigError> for KeyringError {
    fn from(err: config::ConfigError) -> Self {
        Self::config(err.to_string())
    }
}

impl From<rlp::DecoderError> for ResolutionError {
    fn from(err: rlp::DecoderError) -> Self {
        Self::malformed(format!("RLP error: {}", err))
    }
}

impl From<hex::FromHexError> for ResolutionError {
    fn from(err: hex::FromHexError) -> Self {
        Self::malformed(format!("Hex decoding error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyring_error_creation() {
        let unsupported = KeyringError::unsupported("two accounts");
        let not_found = KeyringError::account_not_found("0x1234");
        let validation = KeyringError::validation("Invalid input");

        assert!(matches!(unsupported, KeyringError::UnsupportedOperation(_)));
        assert!(matches!(not_found, KeyringError::AccountNotFound(_)));
        assert!(matches!(validation, KeyringError::Validation(_)));
    }

    #[test]
    fn test_not_initialized_message() {
        assert_eq!(
            KeyringError::NotInitialized.to_string(),
            "Ledger app is not initialized. You must call setTransport first."
        );
    }

    #[test]
    fn test_device_error_is_carried_verbatim() {
        let device = DeviceError::Status {
            code: 0x6985,
            description: "Conditions of use not satisfied".to_string(),
        };
        let error: KeyringError = device.clone().into();

        assert!(error.is_device_error());
        assert_eq!(error.to_string(), device.to_string());
        match error {
            KeyringError::Device(inner) => {
                assert_eq!(inner, device);
                assert!(inner.is_user_rejected());
            }
            other => panic!("unexpected error kind: {:?}", other),
        }
    }

    #[test]
    fn test_resolution_error_is_distinct() {
        let error: KeyringError = ResolutionError::malformed("empty").into();
        assert!(matches!(error, KeyringError::Resolution(_)));
        assert!(!error.is_device_error());
    }

    #[test]
    fn test_error_conversions() {
        let io_error = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let device_error: DeviceError = io_error.into();
        assert!(matches!(device_error, DeviceError::Transport(_)));

        let rlp_error: ResolutionError = rlp::DecoderError::RlpIsTooShort.into();
        assert!(matches!(rlp_error, ResolutionError::MalformedTransaction(_)));
    }
}
