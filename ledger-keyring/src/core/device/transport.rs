//! Transport abstraction
//!
//! A transport is an established connection to a hardware signer
//! (BLE, USB HID, or the Speculos emulator). Discovery and pairing
//! happen before a transport is handed to the keyring.

use async_trait::async_trait;

use super::apdu::{ApduAnswer, ApduCommand};
use crate::shared::error::DeviceError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one APDU and wait for its answer
    async fn exchange(&self, command: &ApduCommand) -> Result<ApduAnswer, DeviceError>;
}

