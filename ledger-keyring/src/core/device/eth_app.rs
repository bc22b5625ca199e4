//! Ledger Ethereum application over an APDU transport

use std::str::FromStr;

use async_trait::async_trait;
use ethers::types::Address;
use ethers::utils::to_checksum;

use super::apdu::ApduCommand;
use super::path::Bip32Path;
use super::transport::Transport;
use super::EthereumApp;
use crate::core::resolution::Resolution;
use crate::core::transactions::{RawTransaction, TxType};
use crate::shared::constants::*;
use crate::shared::error::DeviceError;
use crate::shared::types::{AddressResponse, SignatureParts};
use crate::shared::utils::strip_hex_prefix;

const CHAIN_CODE_SIZE: usize = 32;
const SIGNATURE_SIZE: usize = 65;

/// Flags and version reported by the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfiguration {
    pub arbitrary_data_enabled: bool,
    pub erc20_provisioning_necessary: bool,
    pub version: String,
}

pub struct LedgerEthApp<T: Transport> {
    transport: T,
}

impl<T: Transport> LedgerEthApp<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn send(&self, command: ApduCommand) -> Result<Vec<u8>, DeviceError> {
        log::debug!("=> {}", hex::encode(command.to_bytes()));
        let answer = self.transport.exchange(&command).await?;
        log::debug!("<= {} {:04X}", hex::encode(&answer.data), answer.status);
        answer.into_result()
    }

    pub async fn app_configuration(&self) -> Result<AppConfiguration, DeviceError> {
        let data = self
            .send(ApduCommand::eth(INS_GET_APP_CONFIGURATION, 0x00, 0x00, vec![]))
            .await?;

        if data.len() < 4 {
            return Err(DeviceError::unexpected(format!(
                "app configuration has {} bytes",
                data.len()
            )));
        }

        Ok(AppConfiguration {
            arbitrary_data_enabled: data[0] & 0x01 != 0,
            erc20_provisioning_necessary: data[0] & 0x02 != 0,
            version: format!("{}.{}.{}", data[1], data[2], data[3]),
        })
    }

    async fn provide(&self, ins: u8, descriptor: Vec<u8>) -> Result<(), DeviceError> {
        if descriptor.len() > MAX_APDU_DATA {
            return Err(DeviceError::invalid_request(format!(
                "descriptor of {} bytes does not fit in one APDU",
                descriptor.len()
            )));
        }
        self.send(ApduCommand::eth(ins, 0x00, 0x00, descriptor)).await?;
        Ok(())
    }

    /// Hand every descriptor to the device before the signature request
    async fn provide_resolution(&self, resolution: &Resolution) -> Result<(), DeviceError> {
        for plugin in &resolution.plugin {
            self.provide(INS_SET_PLUGIN, decode_blob(plugin)?).await?;
        }
        for external in &resolution.external_plugin {
            let mut blob = decode_blob(&external.payload)?;
            blob.extend(decode_blob(&external.signature)?);
            self.provide(INS_SET_EXTERNAL_PLUGIN, blob).await?;
        }
        for nft in &resolution.nfts {
            self.provide(INS_PROVIDE_NFT_INFORMATION, decode_blob(nft)?).await?;
        }
        for token in &resolution.erc20_tokens {
            self.provide(INS_PROVIDE_ERC20_TOKEN_INFORMATION, decode_blob(token)?)
                .await?;
        }
        Ok(())
    }
}

fn decode_blob(value: &str) -> Result<Vec<u8>, DeviceError> {
    hex::decode(strip_hex_prefix(value))
        .map_err(|e| DeviceError::invalid_request(format!("invalid hex: {}", e)))
}

fn parse_path(path: &str) -> Result<Bip32Path, DeviceError> {
    Bip32Path::parse(path).map_err(|e| DeviceError::invalid_request(e.to_string()))
}

fn parse_address_response(data: &[u8], chain_code: bool) -> Result<AddressResponse, DeviceError> {
    let pk_len = *data
        .first()
        .ok_or_else(|| DeviceError::unexpected("empty address response"))? as usize;
    let addr_len_at = 1 + pk_len;
    let addr_len = *data
        .get(addr_len_at)
        .ok_or_else(|| DeviceError::unexpected("address response truncated"))? as usize;
    let addr_end = addr_len_at + 1 + addr_len;
    if data.len() < addr_end {
        return Err(DeviceError::unexpected("address response truncated"));
    }

    let ascii = std::str::from_utf8(&data[addr_len_at + 1..addr_end])
        .map_err(|_| DeviceError::unexpected("address is not ascii"))?;
    let address = Address::from_str(ascii)
        .map_err(|_| DeviceError::unexpected(format!("invalid address {}", ascii)))?;

    let chain_code = if chain_code {
        let code = data
            .get(addr_end..addr_end + CHAIN_CODE_SIZE)
            .ok_or_else(|| DeviceError::unexpected("chain code missing"))?;
        Some(hex::encode(code))
    } else {
        None
    };

    Ok(AddressResponse {
        public_key: hex::encode(&data[1..addr_len_at]),
        address: to_checksum(&address, None),
        chain_code,
    })
}

/// `chain_id * 2 + 35`, or an error when the chain id cannot carry an EIP-155 `v`
fn eip155_base(chain_id: u64) -> Result<u64, DeviceError> {
    chain_id
        .checked_mul(2)
        .and_then(|doubled| doubled.checked_add(35))
        .ok_or_else(|| {
            DeviceError::invalid_request(format!("chain id {} overflows an EIP-155 v", chain_id))
        })
}

/// Recover the full `v` for chains whose EIP-155 value does not fit the one-byte reply
fn compute_v(response_v: u8, raw: &RawTransaction) -> Result<String, DeviceError> {
    let chain_id = raw.chain_id.unwrap_or(0);
    let base = eip155_base(chain_id)?;

    if base < 255 {
        return Ok(format!("{:02x}", response_v));
    }

    let truncated = u64::from(chain_id as u32);
    let one_byte = ((truncated * 2 + 35) % 256) as u8;

    match raw.tx_type {
        TxType::AccessList | TxType::FeeMarket => {
            let parity = (i16::from(response_v) - i16::from(one_byte)).abs() % 2;
            let v = if parity == 1 { "00" } else { "01" };
            Ok(v.to_string())
        }
        TxType::Legacy => {
            let parity = response_v.wrapping_sub(one_byte);
            let v = base.checked_add(u64::from(parity)).ok_or_else(|| {
                DeviceError::invalid_request(format!("chain id {} overflows an EIP-155 v", chain_id))
            })?;
            Ok(format!("{:x}", v))
        }
    }
}

#[async_trait]
impl<T: Transport> EthereumApp for LedgerEthApp<T> {
    async fn get_address(
        &self,
        path: &str,
        display: bool,
        chain_code: bool,
    ) -> Result<AddressResponse, DeviceError> {
        let path = parse_path(path)?;
        let command = ApduCommand::eth(
            INS_GET_PUBLIC_ADDRESS,
            u8::from(display),
            u8::from(chain_code),
            path.to_bytes(),
        );

        let data = self.send(command).await?;
        let response = parse_address_response(&data, chain_code)?;
        log::info!("Ledger address at {}: {}", path, response.address);
        Ok(response)
    }

    async fn sign_transaction(
        &self,
        path: &str,
        raw_tx_hex: &str,
        resolution: Option<Resolution>,
    ) -> Result<SignatureParts, DeviceError> {
        let path = parse_path(path)?;
        let raw = decode_blob(raw_tx_hex)?;
        let decoded = RawTransaction::decode(&raw)
            .map_err(|e| DeviceError::invalid_request(format!("undecodable transaction: {}", e)))?;
        eip155_base(decoded.chain_id.unwrap_or(0))?;

        if let Some(resolution) = &resolution {
            self.provide_resolution(resolution).await?;
        }

        let mut payload = path.to_bytes();
        payload.extend_from_slice(&raw);

        let mut response = Vec::new();
        for (index, chunk) in payload.chunks(MAX_APDU_DATA).enumerate() {
            let p1 = if index == 0 { P1_FIRST_CHUNK } else { P1_MORE_CHUNK };
            response = self
                .send(ApduCommand::eth(INS_SIGN_TRANSACTION, p1, 0x00, chunk.to_vec()))
                .await?;
        }

        if response.len() < SIGNATURE_SIZE {
            return Err(DeviceError::unexpected(format!(
                "signature has {} bytes",
                response.len()
            )));
        }

        Ok(SignatureParts {
            v: compute_v(response[0], &decoded)?,
            r: hex::encode(&response[1..33]),
            s: hex::encode(&response[33..65]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::device::apdu::ApduAnswer;
    use crate::core::resolution::ExternalPlugin;
    use crate::core::transactions::test_support::{fee_market_request, legacy_request};
    use crate::core::transactions::{Common, Hardfork, Transaction};
    use ethers::types::Bytes;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned answers and records every command
    #[derive(Default)]
    struct ScriptedTransport {
        sent: Mutex<Vec<ApduCommand>>,
        answers: Mutex<VecDeque<Vec<u8>>>,
    }

    impl ScriptedTransport {
        fn with_answers(answers: Vec<Vec<u8>>) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                answers: Mutex::new(answers.into()),
            }
        }

        fn sent(&self) -> Vec<ApduCommand> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn exchange(&self, command: &ApduCommand) -> Result<ApduAnswer, DeviceError> {
            self.sent.lock().unwrap().push(command.clone());
            let answer = self
                .answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| vec![0x90, 0x00]);
            ApduAnswer::from_bytes(&answer)
        }
    }

    fn ok(mut data: Vec<u8>) -> Vec<u8> {
        data.extend_from_slice(&[0x90, 0x00]);
        data
    }

    fn signature_answer(v: u8) -> Vec<u8> {
        let mut data = vec![v];
        data.extend_from_slice(&[0x11; 32]);
        data.extend_from_slice(&[0x22; 32]);
        ok(data)
    }

    fn raw_hex(tx: &Transaction) -> String {
        hex::encode(tx.message_to_sign())
    }

    #[tokio::test]
    async fn test_get_address() {
        let mut data = vec![65];
        data.extend_from_slice(&[0x04; 65]);
        data.push(40);
        data.extend_from_slice(b"abcdef0123456789abcdef0123456789abcdef01");
        data.extend_from_slice(&[0x33; 32]);

        let app = LedgerEthApp::new(ScriptedTransport::with_answers(vec![ok(data)]));
        let response = app.get_address("m/44'/60'/0'/0/0", true, true).await.unwrap();

        assert!(response
            .address
            .eq_ignore_ascii_case("0xabcdef0123456789abcdef0123456789abcdef01"));
        assert_eq!(response.public_key, "04".repeat(65));
        assert_eq!(response.chain_code, Some("33".repeat(32)));

        let sent = app.transport().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].ins, INS_GET_PUBLIC_ADDRESS);
        assert_eq!((sent[0].p1, sent[0].p2), (1, 1));
        assert_eq!(sent[0].data, Bip32Path::parse("m/44'/60'/0'/0/0").unwrap().to_bytes());
    }

    #[tokio::test]
    async fn test_get_address_truncated() {
        let app = LedgerEthApp::new(ScriptedTransport::with_answers(vec![ok(vec![65, 0x04])]));
        let result = app.get_address("m/44'/60'/0'/0/0", false, false).await;
        assert!(matches!(result, Err(DeviceError::UnexpectedResponse(_))));
    }

    #[tokio::test]
    async fn test_user_rejection_is_reported() {
        let app = LedgerEthApp::new(ScriptedTransport::with_answers(vec![vec![0x69, 0x85]]));
        let tx = Transaction::new(legacy_request(), Common::mainnet());

        let err = app
            .sign_transaction("m/44'/60'/0'/0/0", &raw_hex(&tx), None)
            .await
            .unwrap_err();
        assert!(err.is_user_rejected());
    }

    #[tokio::test]
    async fn test_sign_splits_long_payload() {
        let mut request = legacy_request();
        request.set_data(Bytes::from(vec![0xab; 400]));
        let tx = Transaction::new(request, Common::mainnet());

        let path_len = Bip32Path::parse("m/44'/60'/0'/0/0").unwrap().to_bytes().len();
        let total = path_len + tx.message_to_sign().len();
        let chunks = (total + MAX_APDU_DATA - 1) / MAX_APDU_DATA;
        assert!(chunks > 1);

        let mut answers = vec![ok(vec![]); chunks - 1];
        answers.push(signature_answer(0x25));
        let app = LedgerEthApp::new(ScriptedTransport::with_answers(answers));
        let signature = app
            .sign_transaction("m/44'/60'/0'/0/0", &raw_hex(&tx), None)
            .await
            .unwrap();

        assert_eq!(signature.v, "25");
        assert_eq!(signature.r, "11".repeat(32));
        assert_eq!(signature.s, "22".repeat(32));

        let sent = app.transport().sent();
        assert_eq!(sent.len(), chunks);
        assert_eq!(sent[0].p1, P1_FIRST_CHUNK);
        assert_eq!(sent[0].data.len(), MAX_APDU_DATA);
        assert!(sent[1..].iter().all(|cmd| cmd.p1 == P1_MORE_CHUNK));
        assert!(sent.iter().all(|cmd| cmd.ins == INS_SIGN_TRANSACTION));
    }

    #[tokio::test]
    async fn test_descriptors_are_provided_first() {
        let tx = Transaction::new(fee_market_request(), Common::mainnet());
        let resolution = Resolution {
            erc20_tokens: vec!["0a0b".to_string()],
            nfts: vec!["0c".to_string()],
            external_plugin: vec![ExternalPlugin {
                payload: "01".to_string(),
                signature: "02".to_string(),
            }],
            plugin: vec!["0d".to_string()],
        };

        let app = LedgerEthApp::new(ScriptedTransport::with_answers(vec![
            ok(vec![]),
            ok(vec![]),
            ok(vec![]),
            ok(vec![]),
            signature_answer(0x01),
        ]));
        let signature = app
            .sign_transaction("m/44'/60'/0'/0/0", &raw_hex(&tx), Some(resolution))
            .await
            .unwrap();
        assert_eq!(signature.v, "01");

        let instructions: Vec<u8> = app.transport().sent().iter().map(|cmd| cmd.ins).collect();
        assert_eq!(
            instructions,
            vec![
                INS_SET_PLUGIN,
                INS_SET_EXTERNAL_PLUGIN,
                INS_PROVIDE_NFT_INFORMATION,
                INS_PROVIDE_ERC20_TOKEN_INFORMATION,
                INS_SIGN_TRANSACTION,
            ]
        );
        assert_eq!(app.transport().sent()[1].data, vec![0x01, 0x02]);
    }

    #[test]
    fn test_v_for_large_chain_id() {
        // 84532 * 2 + 35 = 169099, low byte 0x8b
        let legacy = Transaction::new(legacy_request(), Common::custom(84532, Hardfork::London));
        let raw = RawTransaction::decode(&legacy.message_to_sign()).unwrap();
        assert_eq!(compute_v(0x8b, &raw).unwrap(), "2948b");
        assert_eq!(compute_v(0x8c, &raw).unwrap(), "2948c");

        let typed = Transaction::new(fee_market_request(), Common::custom(84532, Hardfork::London));
        let raw = RawTransaction::decode(&typed.message_to_sign()).unwrap();
        assert_eq!(compute_v(0x00, &raw).unwrap(), "00");
        assert_eq!(compute_v(0x01, &raw).unwrap(), "01");
    }

    #[test]
    fn test_v_for_small_chain_id() {
        let legacy = Transaction::new(legacy_request(), Common::mainnet());
        let raw = RawTransaction::decode(&legacy.message_to_sign()).unwrap();
        assert_eq!(compute_v(0x26, &raw).unwrap(), "26");
    }

    #[test]
    fn test_v_for_overflowing_chain_id() {
        let raw = RawTransaction {
            tx_type: TxType::Legacy,
            to: None,
            data: Vec::new(),
            chain_id: Some(u64::MAX / 2 + 1),
        };
        assert!(matches!(compute_v(0x00, &raw), Err(DeviceError::InvalidRequest(_))));

        let typed = RawTransaction { tx_type: TxType::FeeMarket, ..raw };
        assert!(matches!(compute_v(0x01, &typed), Err(DeviceError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_overflowing_chain_id_is_rejected_without_traffic() {
        let app = LedgerEthApp::new(ScriptedTransport::default());
        let tx = Transaction::new(legacy_request(), Common::custom(u64::MAX, Hardfork::London));

        let result = app
            .sign_transaction("m/44'/60'/0'/0/0", &raw_hex(&tx), None)
            .await;

        assert!(matches!(result, Err(DeviceError::InvalidRequest(_))));
        assert!(app.transport().sent().is_empty());
    }

    #[tokio::test]
    async fn test_app_configuration() {
        let app = LedgerEthApp::new(ScriptedTransport::with_answers(vec![ok(vec![0x03, 1, 10, 4])]));
        let config = app.app_configuration().await.unwrap();

        assert!(config.arbitrary_data_enabled);
        assert!(config.erc20_provisioning_necessary);
        assert_eq!(config.version, "1.10.4");
    }

    #[tokio::test]
    async fn test_invalid_path_is_rejected_without_traffic() {
        let app = LedgerEthApp::new(ScriptedTransport::default());
        let result = app.get_address("m/44'/x", true, true).await;

        assert!(matches!(result, Err(DeviceError::InvalidRequest(_))));
        assert!(app.transport().sent().is_empty());
    }
}
