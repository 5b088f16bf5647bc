//! Base58, Base58Check and Wallet Import Format
//!
//! The alphabet transform is delegated to `bs58`; checksum and version framing live here so
//! a bad checksum is reported as [`BitcoinError::ChecksumMismatch`] rather than a generic
//! decode failure.

use zeroize::Zeroize;

use crate::constants::*;
use crate::error::{BitcoinError, Result};
use crate::hash::sha256d;
use crate::keys::PrivateKey;
use crate::types::Network;

/// Base58Encode: each leading 0x00 byte becomes a leading '1'
pub fn encode(data: &[u8]) -> String {
    bs58::encode(data).into_string()
}

/// Base58Decode: inverse of [`encode`]
pub fn decode(s: &str) -> Result<Vec<u8>> {
    bs58::decode(s)
        .into_vec()
        .map_err(|e| BitcoinError::InvalidEncoding(format!("base58: {}", e)))
}

/// checksum = SHA256(SHA256(payload))[0..4]
pub fn checksum(payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = sha256d(payload);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest[..CHECKSUM_LEN]);
    out
}

/// Base58CheckEncode(payload) = Base58Encode(payload || checksum)
pub fn encode_check(payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(payload.len() + CHECKSUM_LEN);
    data.extend_from_slice(payload);
    data.extend_from_slice(&checksum(payload));
    encode(&data)
}

/// Decode and verify the trailing 4-byte checksum, returning the payload
pub fn decode_check(s: &str) -> Result<Vec<u8>> {
    let mut data = decode(s)?;
    if data.len() < CHECKSUM_LEN {
        return Err(BitcoinError::InvalidEncoding(format!(
            "base58check: {} bytes is shorter than the checksum",
            data.len()
        )));
    }
    let split = data.len() - CHECKSUM_LEN;
    if checksum(&data[..split]) != data[split..] {
        return Err(BitcoinError::ChecksumMismatch);
    }
    data.truncate(split);
    Ok(data)
}

/// Decoded WIF payload
///
/// The secret bytes are scrubbed when the value is dropped.
#[derive(PartialEq, Eq)]
pub struct WifKey {
    pub secret: [u8; 32],
    pub compressed: bool,
    pub network: Network,
}

impl WifKey {
    pub fn private_key(&self) -> Result<PrivateKey> {
        PrivateKey::from_bytes(&self.secret)
    }
}

impl Drop for WifKey {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

impl std::fmt::Debug for WifKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WifKey")
            .field("secret", &"<redacted>")
            .field("compressed", &self.compressed)
            .field("network", &self.network)
            .finish()
    }
}

/// WIFEncode: Base58Check(version || secret || [0x01 if compressed])
pub fn wif_encode(secret: &[u8; 32], compressed: bool, network: Network) -> String {
    let mut payload = Vec::with_capacity(34);
    payload.push(network.wif_version());
    payload.extend_from_slice(secret);
    if compressed {
        payload.push(WIF_COMPRESSED_FLAG);
    }
    let encoded = encode_check(&payload);
    payload.zeroize();
    encoded
}

/// WIFDecode: validates version byte, payload length and compression flag
pub fn wif_decode(wif: &str) -> Result<WifKey> {
    let mut payload = decode_check(wif.trim())?;
    let result = parse_wif_payload(&payload);
    payload.zeroize();
    result
}

fn parse_wif_payload(payload: &[u8]) -> Result<WifKey> {
    let (&version, body) = payload
        .split_first()
        .ok_or_else(|| BitcoinError::InvalidEncoding("empty WIF payload".to_string()))?;
    let network = match version {
        WIF_VERSION_MAINNET => Network::Mainnet,
        WIF_VERSION_TESTNET => Network::Testnet,
        other => {
            return Err(BitcoinError::InvalidEncoding(format!(
                "unknown WIF version byte 0x{:02x}",
                other
            )))
        }
    };
    let compressed = match body.len() {
        32 => false,
        33 if body[32] == WIF_COMPRESSED_FLAG => true,
        33 => {
            return Err(BitcoinError::InvalidEncoding(format!(
                "WIF compression flag 0x{:02x}",
                body[32]
            )))
        }
        len => {
            return Err(BitcoinError::InvalidEncoding(format!(
                "WIF payload must be 32 or 33 bytes after the version, got {}",
                len
            )))
        }
    };
    let mut secret = [0u8; 32];
    secret.copy_from_slice(&body[..32]);
    Ok(WifKey {
        secret,
        compressed,
        network,
    })
}

impl PrivateKey {
    /// Decode a WIF string, returning the key with its compression flag and network
    pub fn from_wif(wif: &str) -> Result<(PrivateKey, bool, Network)> {
        let decoded = wif_decode(wif)?;
        let key = decoded.private_key()?;
        Ok((key, decoded.compressed, decoded.network))
    }

    pub fn to_wif(&self, compressed: bool, network: Network) -> String {
        let mut secret = self.to_bytes();
        let wif = wif_encode(&secret, compressed, network);
        secret.zeroize();
        wif
    }
}
