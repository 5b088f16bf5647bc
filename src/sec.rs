//! SEC 1 encodings of keys
//!
//! Public keys: 33-byte compressed (`02`/`03` || x) or 65-byte uncompressed (`04` || x || y).
//! Private keys: 32-byte big-endian scalar.

use crate::curve::{Curve, Point};
use crate::error::{BitcoinError, CurveError, Result};
use crate::field::U256;
use crate::keys::{PrivateKey, PublicKey};

pub const SEC_COMPRESSED_LEN: usize = 33;
pub const SEC_UNCOMPRESSED_LEN: usize = 65;
pub const SEC_PRIVATE_KEY_LEN: usize = 32;

const TAG_EVEN: u8 = 0x02;
const TAG_ODD: u8 = 0x03;
const TAG_UNCOMPRESSED: u8 = 0x04;

impl PublicKey {
    /// 02/03 || x
    pub fn to_sec_compressed(&self) -> [u8; SEC_COMPRESSED_LEN] {
        let mut out = [0u8; SEC_COMPRESSED_LEN];
        out[0] = if self.y().is_odd() { TAG_ODD } else { TAG_EVEN };
        out[1..].copy_from_slice(&self.x().to_be_bytes());
        out
    }

    /// 04 || x || y
    pub fn to_sec_uncompressed(&self) -> [u8; SEC_UNCOMPRESSED_LEN] {
        let mut out = [0u8; SEC_UNCOMPRESSED_LEN];
        out[0] = TAG_UNCOMPRESSED;
        out[1..33].copy_from_slice(&self.x().to_be_bytes());
        out[33..].copy_from_slice(&self.y().to_be_bytes());
        out
    }

    pub fn to_sec(&self, compressed: bool) -> Vec<u8> {
        if compressed {
            self.to_sec_compressed().to_vec()
        } else {
            self.to_sec_uncompressed().to_vec()
        }
    }

    /// Decode either SEC form.
    ///
    /// Compressed keys recover y from the curve equation; both forms are checked for
    /// curve membership. Every failure is reported as `InvalidEncoding`.
    pub fn from_sec(bytes: &[u8]) -> Result<Self> {
        let curve = Curve::secp256k1();
        let point = match (bytes.first(), bytes.len()) {
            (Some(&tag), SEC_COMPRESSED_LEN) if tag == TAG_EVEN || tag == TAG_ODD => {
                let x = U256::from_be_slice(&bytes[1..])
                    .ok_or_else(|| BitcoinError::InvalidEncoding("SEC x coordinate".to_string()))?;
                curve
                    .lift_x(&x, tag == TAG_ODD)
                    .map_err(|e| sec_point_error("compressed", e))?
            }
            (Some(&TAG_UNCOMPRESSED), SEC_UNCOMPRESSED_LEN) => {
                let x = U256::from_be_slice(&bytes[1..33])
                    .ok_or_else(|| BitcoinError::InvalidEncoding("SEC x coordinate".to_string()))?;
                let y = U256::from_be_slice(&bytes[33..])
                    .ok_or_else(|| BitcoinError::InvalidEncoding("SEC y coordinate".to_string()))?;
                Point::new(curve, x, y).map_err(|e| sec_point_error("uncompressed", e))?
            }
            (Some(tag), len) => {
                return Err(BitcoinError::InvalidEncoding(format!(
                    "SEC prefix 0x{:02x} with length {}",
                    tag, len
                )))
            }
            (None, _) => {
                return Err(BitcoinError::InvalidEncoding(
                    "empty SEC public key".to_string(),
                ))
            }
        };
        PublicKey::from_point(point).map_err(|e| BitcoinError::InvalidEncoding(e.to_string()))
    }

    /// Hex-encoded SEC public key
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim())
            .map_err(|e| BitcoinError::InvalidEncoding(format!("public key hex: {}", e)))?;
        Self::from_sec(&bytes)
    }

    pub fn to_hex(&self, compressed: bool) -> String {
        hex::encode(self.to_sec(compressed))
    }
}

fn sec_point_error(form: &str, err: CurveError) -> BitcoinError {
    BitcoinError::InvalidEncoding(format!("{} SEC point: {}", form, err))
}

pub fn encode_public_key(key: &PublicKey, compressed: bool) -> Vec<u8> {
    key.to_sec(compressed)
}

pub fn decode_public_key(bytes: &[u8]) -> Result<PublicKey> {
    PublicKey::from_sec(bytes)
}

/// 32-byte big-endian scalar
pub fn encode_private_key(key: &PrivateKey) -> [u8; SEC_PRIVATE_KEY_LEN] {
    key.to_bytes()
}

pub fn decode_private_key(bytes: &[u8]) -> Result<PrivateKey> {
    if bytes.len() != SEC_PRIVATE_KEY_LEN {
        return Err(BitcoinError::InvalidEncoding(format!(
            "private key must be {} bytes, got {}",
            SEC_PRIVATE_KEY_LEN,
            bytes.len()
        )));
    }
    PrivateKey::from_bytes(bytes)
}
