//! Constants for the keyring
//!
//! This module contains all constants used throughout the keyring.

// Keyring constants
pub const KEYRING_TYPE: &str = "Ledger";
pub const DEFAULT_HD_PATH: &str = "m/44'/60'/0'/0/0";
pub const MAX_ACCOUNTS: usize = 1;

// Address constants
pub const ADDRESS_SIZE: usize = 20;
pub const ADDRESS_HEX_LENGTH: usize = 42;

// Ethereum app APDU instructions
pub const ETH_CLA: u8 = 0xE0;
pub const INS_GET_PUBLIC_ADDRESS: u8 = 0x02;
pub const INS_SIGN_TRANSACTION: u8 = 0x04;
pub const INS_GET_APP_CONFIGURATION: u8 = 0x06;
pub const INS_PROVIDE_ERC20_TOKEN_INFORMATION: u8 = 0x0A;
pub const INS_SET_EXTERNAL_PLUGIN: u8 = 0x12;
pub const INS_PROVIDE_NFT_INFORMATION: u8 = 0x14;
pub const INS_SET_PLUGIN: u8 = 0x16;

// Sign transaction chunk markers
pub const P1_FIRST_CHUNK: u8 = 0x00;
pub const P1_MORE_CHUNK: u8 = 0x80;
pub const MAX_APDU_DATA: usize = 255;
/// Largest response body accepted from a transport
pub const MAX_APDU_RESPONSE: usize = 65_536;

// Status words
pub const SW_OK: u16 = 0x9000;
pub const SW_SECURITY_STATUS_NOT_SATISFIED: u16 = 0x6982;
pub const SW_CONDITIONS_NOT_SATISFIED: u16 = 0x6985;
pub const SW_INVALID_DATA: u16 = 0x6A80;
pub const SW_WRONG_LENGTH: u16 = 0x6700;
pub const SW_INCORRECT_P1_P2: u16 = 0x6B00;
pub const SW_INS_NOT_SUPPORTED: u16 = 0x6D00;
pub const SW_CLA_NOT_SUPPORTED: u16 = 0x6E00;
pub const SW_APP_NOT_OPEN: u16 = 0x6511;
pub const SW_LOCKED_DEVICE: u16 = 0x5515;

// ERC-20 method selectors recognised by the resolver
pub const SELECTOR_TRANSFER: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];
pub const SELECTOR_APPROVE: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3];
pub const SELECTOR_TRANSFER_FROM: [u8; 4] = [0x23, 0xb8, 0x72, 0xdd];

// Speculos emulator defaults
pub const DEFAULT_SPECULOS_HOST: &str = "127.0.0.1";
pub const DEFAULT_SPECULOS_PORT: u16 = 9999;
