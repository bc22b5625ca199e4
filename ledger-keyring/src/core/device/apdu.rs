//! APDU framing for the Ethereum application

use crate::shared::constants::*;
use crate::shared::error::DeviceError;

/// APDU command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduCommand {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    pub data: Vec<u8>,
}

impl ApduCommand {
    /// Command addressed to the Ethereum application
    pub fn eth(ins: u8, p1: u8, p2: u8, data: Vec<u8>) -> Self {
        Self {
            cla: ETH_CLA,
            ins,
            p1,
            p2,
            data,
        }
    }

    /// Serialize as `cla ins p1 p2 lc data`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(5 + self.data.len());
        bytes.push(self.cla);
        bytes.push(self.ins);
        bytes.push(self.p1);
        bytes.push(self.p2);
        bytes.push(self.data.len() as u8);
        bytes.extend_from_slice(&self.data);
        bytes
    }
}

/// APDU answer: payload followed by a two byte status word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduAnswer {
    pub data: Vec<u8>,
    pub status: u16,
}

impl ApduAnswer {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DeviceError> {
        if bytes.len() < 2 {
            return Err(DeviceError::unexpected("APDU answer shorter than status word"));
        }

        let split = bytes.len() - 2;
        let status = u16::from_be_bytes([bytes[split], bytes[split + 1]]);

        Ok(Self {
            data: bytes[..split].to_vec(),
            status,
        })
    }

    pub fn is_success(&self) -> bool {
        self.status == SW_OK
    }

    /// Turn a non-success status word into a [DeviceError]
    pub fn into_result(self) -> Result<Vec<u8>, DeviceError> {
        if self.is_success() {
            Ok(self.data)
        } else {
            log::warn!(
                "APDU failed: {:04X} - {}",
                self.status,
                status_description(self.status)
            );
            Err(DeviceError::Status {
                code: self.status,
                description: status_description(self.status).to_string(),
            })
        }
    }
}

/// Human readable meaning of a status word
pub fn status_description(status: u16) -> &'static str {
    match status {
        SW_OK => "Success",
        SW_SECURITY_STATUS_NOT_SATISFIED => "Security status not satisfied (device locked)",
        SW_CONDITIONS_NOT_SATISFIED => "Conditions of use not satisfied (rejected by user)",
        SW_INVALID_DATA => "Invalid data",
        SW_WRONG_LENGTH => "Wrong length",
        SW_INCORRECT_P1_P2 => "Incorrect parameters P1 or P2",
        SW_INS_NOT_SUPPORTED => "Instruction not supported (Ethereum app not open?)",
        SW_CLA_NOT_SUPPORTED => "Class not supported (Ethereum app not open?)",
        SW_APP_NOT_OPEN => "Ethereum app is not open",
        SW_LOCKED_DEVICE => "Device is locked",
        _ => "Unknown status",
    }
}
