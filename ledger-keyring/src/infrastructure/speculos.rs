//! TCP transport to the Speculos emulator
//!
//! Frames are `len:u32be || apdu` on the way in and
//! `len:u32be || data[len] || sw[2]` on the way back.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::core::device::{ApduAnswer, ApduCommand, Transport};
use crate::shared::config::KeyringConfig;
use crate::shared::constants::MAX_APDU_RESPONSE;
use crate::shared::error::DeviceError;

pub struct SpeculosTransport {
    connection: Mutex<TcpStream>,
    exchanges: AtomicU64,
}

impl SpeculosTransport {
    pub async fn connect(addr: &str) -> Result<Self, DeviceError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| DeviceError::transport(format!("Failed to connect to {}: {}", addr, e)))?;
        log::info!("Connected to Speculos at {}", addr);

        Ok(Self {
            connection: Mutex::new(stream),
            exchanges: AtomicU64::new(0),
        })
    }

    pub async fn from_config(config: &KeyringConfig) -> Result<Self, DeviceError> {
        Self::connect(&config.speculos_addr()).await
    }

    /// Number of completed exchanges
    pub fn exchanges(&self) -> u64 {
        self.exchanges.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Transport for SpeculosTransport {
    async fn exchange(&self, command: &ApduCommand) -> Result<ApduAnswer, DeviceError> {
        let apdu = command.to_bytes();
        let mut request = Vec::with_capacity(apdu.len() + 4);
        request.extend_from_slice(&(apdu.len() as u32).to_be_bytes());
        request.extend_from_slice(&apdu);

        let mut stream = self.connection.lock().await;
        stream.write_all(&request).await?;

        let mut header = [0u8; 4];
        stream.read_exact(&mut header).await?;
        let len = u32::from_be_bytes(header) as usize;
        if len > MAX_APDU_RESPONSE {
            return Err(DeviceError::unexpected(format!(
                "response of {} bytes exceeds {}",
                len, MAX_APDU_RESPONSE
            )));
        }

        let mut response = vec![0u8; len + 2];
        stream.read_exact(&mut response).await?;

        self.exchanges.fetch_add(1, Ordering::Relaxed);
        ApduAnswer::from_bytes(&response)
    }
}
