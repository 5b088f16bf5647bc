//! Private/public key types and key derivation on secp256k1
//!
//! A [`PrivateKey`] is a scalar d with 1 ≤ d < n. It is never `Clone`, its `Debug`
//! output is redacted, and the scalar is zeroized when the key is dropped.

use std::fmt;

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::curve::{Curve, Point};
use crate::error::{BitcoinError, Result};
use crate::field::U256;

pub struct PrivateKey {
    secret: U256,
}

impl PrivateKey {
    /// Wrap a scalar, rejecting values outside [1, n-1]
    pub fn new(secret: U256) -> Result<Self> {
        if !is_valid_private_key(&secret) {
            return Err(BitcoinError::InvalidPrivateKey("scalar outside [1, n-1]".to_string()));
        }
        Ok(PrivateKey { secret })
    }

    /// 32-byte big-endian scalar
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 32 {
            return Err(BitcoinError::InvalidPrivateKey(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }
        let mut secret = U256::from_be_slice(bytes)
            .ok_or_else(|| BitcoinError::InvalidPrivateKey("scalar too large".to_string()))?;
        let key = PrivateKey::new(secret);
        secret.zeroize();
        key
    }

    pub fn generate() -> Self {
        Self::generate_with(&mut OsRng)
    }

    /// Draw d uniformly from [1, n-1] by rejection sampling 32-byte candidates
    pub fn generate_with<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 32];
        loop {
            rng.fill_bytes(&mut bytes);
            let mut candidate = U256::from_be_bytes(&bytes);
            if is_valid_private_key(&candidate) {
                bytes.zeroize();
                return PrivateKey { secret: candidate };
            }
            candidate.zeroize();
        }
    }

    pub fn secret(&self) -> &U256 {
        &self.secret
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.secret.to_be_bytes()
    }

    /// PublicKey = d·G
    pub fn public_key(&self) -> Result<PublicKey> {
        private_key_to_public_key(&self.secret)
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// A finite point on secp256k1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    point: Point<'static>,
}

impl PublicKey {
    pub fn from_point(point: Point<'static>) -> Result<Self> {
        if point.is_infinity() {
            return Err(BitcoinError::InvalidPublicKey("point at infinity".to_string()));
        }
        if point.curve() != Curve::secp256k1() {
            return Err(BitcoinError::InvalidPublicKey("point is not on secp256k1".to_string()));
        }
        if !point.is_on_curve() {
            return Err(BitcoinError::InvalidPublicKey("point is not on the curve".to_string()));
        }
        Ok(PublicKey { point })
    }

    /// Construct from affine coordinates
    pub fn from_coordinates(x: U256, y: U256) -> Result<Self> {
        let point = Point::new(Curve::secp256k1(), x, y)?;
        Self::from_point(point)
    }

    pub fn point(&self) -> &Point<'static> {
        &self.point
    }

    pub fn x(&self) -> U256 {
        self.point.x().copied().unwrap_or(U256::ZERO)
    }

    pub fn y(&self) -> U256 {
        self.point.y().copied().unwrap_or(U256::ZERO)
    }
}

/// Generate a fresh key pair from the operating system RNG
pub fn generate_key_pair() -> Result<(PrivateKey, PublicKey)> {
    let private_key = PrivateKey::generate();
    let public_key = private_key.public_key()?;
    Ok((private_key, public_key))
}

/// IsValidPrivateKey: 1 ≤ d < n
pub fn is_valid_private_key(d: &U256) -> bool {
    !d.is_zero() && d < Curve::secp256k1().order()
}

/// PrivateKeyToPublicKey: d ↦ d·G
pub fn private_key_to_public_key(d: &U256) -> Result<PublicKey> {
    if !is_valid_private_key(d) {
        return Err(BitcoinError::InvalidPrivateKey("scalar outside [1, n-1]".to_string()));
    }
    let point = Curve::secp256k1().generator().scalar_mul(d)?;
    PublicKey::from_point(point)
}
