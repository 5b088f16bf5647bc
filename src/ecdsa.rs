//! ECDSA signing and verification over secp256k1
//!
//! Nonces are derived deterministically per RFC 6979 (HMAC-SHA256) unless a caller
//! supplies an RNG. Every produced signature is normalized to low-S.

use hmac::{Hmac, Mac};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::constants::SECP256K1_HALF_N;
use crate::curve::Curve;
use crate::error::{BitcoinError, CurveError, Result};
use crate::field::U256;
use crate::hash::sha256;
use crate::keys::{PrivateKey, PublicKey};
use crate::types::Hash;

type HmacSha256 = Hmac<Sha256>;

/// Signature: (r, s) ∈ ℤₙ²
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub r: U256,
    pub s: U256,
}

impl Signature {
    pub fn new(r: U256, s: U256) -> Self {
        Signature { r, s }
    }

    /// s ≤ n/2
    pub fn is_low_s(&self) -> bool {
        self.s <= SECP256K1_HALF_N
    }

    /// Replace s with n - s when s is in the upper half
    pub fn normalize_s(&self) -> Self {
        if self.is_low_s() {
            *self
        } else {
            Signature {
                r: self.r,
                s: self.s.neg_mod(Curve::secp256k1().order()),
            }
        }
    }

    /// 64-byte r || s
    pub fn to_compact(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.r.to_be_bytes());
        out[32..].copy_from_slice(&self.s.to_be_bytes());
        out
    }

    pub fn from_compact(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 64 {
            return Err(BitcoinError::InvalidEncoding(format!(
                "compact signature must be 64 bytes, got {}",
                bytes.len()
            )));
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Ok(Signature {
            r: U256::from_be_bytes(&r),
            s: U256::from_be_bytes(&s),
        })
    }
}

/// Sign: SHA256(message), RFC 6979 nonce
pub fn sign(key: &PrivateKey, message: &[u8]) -> Result<Signature> {
    sign_digest(key, &sha256(message))
}

/// Sign a precomputed 32-byte digest (e.g. a transaction sighash)
pub fn sign_digest(key: &PrivateKey, digest: &Hash) -> Result<Signature> {
    let mut nonces = Rfc6979::new(key, digest)?;
    loop {
        let mut k = nonces.next_nonce()?;
        let result = try_sign(key, digest, &k);
        k.zeroize();
        if let Some(sig) = result? {
            return Ok(sig);
        }
    }
}

/// Sign with nonces drawn from a caller-supplied CSPRNG
pub fn sign_digest_with_rng<R: RngCore + CryptoRng>(
    key: &PrivateKey,
    digest: &Hash,
    rng: &mut R,
) -> Result<Signature> {
    let n = Curve::secp256k1().order();
    let mut bytes = [0u8; 32];
    loop {
        rng.fill_bytes(&mut bytes);
        let mut k = U256::from_be_bytes(&bytes);
        let result = if k.is_zero() || k >= *n {
            Ok(None)
        } else {
            try_sign(key, digest, &k)
        };
        k.zeroize();
        let signature = match result {
            Ok(Some(sig)) => Ok(sig),
            Ok(None) => continue,
            Err(e) => Err(e),
        };
        bytes.zeroize();
        return signature;
    }
}

/// Sign with an explicit nonce k ∈ [1, n-1]
pub fn sign_digest_with_nonce(key: &PrivateKey, digest: &Hash, k: &U256) -> Result<Signature> {
    let n = Curve::secp256k1().order();
    if k.is_zero() || k >= n {
        return Err(BitcoinError::InvalidPrivateKey("nonce outside [1, n-1]".to_string()));
    }
    try_sign(key, digest, k)?
        .ok_or_else(|| BitcoinError::InvalidPrivateKey("nonce yields r = 0 or s = 0".to_string()))
}

/// 1. R = k·G, r = R.x mod n
/// 2. s = k⁻¹(z + r·d) mod n
/// 3. normalize to low-S
///
/// `None` when r = 0 or s = 0 and a fresh nonce is needed.
fn try_sign(key: &PrivateKey, digest: &Hash, k: &U256) -> Result<Option<Signature>> {
    let curve = Curve::secp256k1();
    let n = curve.order();

    let big_r = curve.generator().scalar_mul(k)?;
    let r = match big_r.x() {
        Some(x) => x.reduce(n),
        None => return Ok(None),
    };
    if r.is_zero() {
        return Ok(None);
    }

    let z = U256::from_be_bytes(digest).reduce(n);
    let k_inv = k.inv_mod(n).ok_or(CurveError::DegenerateInverse)?;
    let rd = r.mul_mod(key.secret(), n);
    let s = k_inv.mul_mod(&z.add_mod(&rd, n), n);
    if s.is_zero() {
        return Ok(None);
    }

    Ok(Some(Signature { r, s }.normalize_s()))
}

/// Verify: SHA256(message)
pub fn verify(public_key: &PublicKey, message: &[u8], signature: &Signature) -> Result<bool> {
    verify_digest(public_key, &sha256(message), signature)
}

/// Verify a signature over a 32-byte digest
///
/// 1. r, s ∉ (0, n) → false
/// 2. u₁ = z·s⁻¹, u₂ = r·s⁻¹ (mod n)
/// 3. accept iff (u₁·G + u₂·Q).x mod n = r
pub fn verify_digest(public_key: &PublicKey, digest: &Hash, signature: &Signature) -> Result<bool> {
    let curve = Curve::secp256k1();
    let n = curve.order();
    let Signature { r, s } = *signature;
    if r.is_zero() || s.is_zero() || r >= *n || s >= *n {
        return Ok(false);
    }
    if !public_key.point().is_on_curve() {
        return Err(BitcoinError::InvalidPublicKey("point is not on the curve".to_string()));
    }

    let z = U256::from_be_bytes(digest).reduce(n);
    let s_inv = s.inv_mod(n).ok_or(CurveError::DegenerateInverse)?;
    let u1 = z.mul_mod(&s_inv, n);
    let u2 = r.mul_mod(&s_inv, n);

    let point = curve
        .generator()
        .scalar_mul(&u1)?
        .add(&public_key.point().scalar_mul(&u2)?)?;
    match point.x() {
        Some(x) => Ok(x.reduce(n) == r),
        None => Ok(false),
    }
}

/// RFC 6979 nonce for a key and digest (first candidate)
pub fn rfc6979_nonce(key: &PrivateKey, digest: &Hash) -> Result<U256> {
    Rfc6979::new(key, digest)?.next_nonce()
}

/// HMAC_DRBG state of RFC 6979 §3.2 for qlen = hlen = 256
struct Rfc6979 {
    k: [u8; 32],
    v: [u8; 32],
    first: bool,
}

impl Rfc6979 {
    fn new(key: &PrivateKey, digest: &Hash) -> Result<Self> {
        let n = Curve::secp256k1().order();
        let mut x = key.to_bytes();
        let h1 = U256::from_be_bytes(digest).reduce(n).to_be_bytes();

        let mut state = Rfc6979 {
            k: [0u8; 32],
            v: [1u8; 32],
            first: true,
        };
        let seeded = state.reseed(0x00, &x, &h1).and_then(|_| state.reseed(0x01, &x, &h1));
        x.zeroize();
        seeded?;
        Ok(state)
    }

    /// K = HMAC_K(V || tag || x || h1), V = HMAC_K(V)
    fn reseed(&mut self, tag: u8, x: &[u8; 32], h1: &[u8; 32]) -> Result<()> {
        self.k = self.hmac(&[&self.v[..], &[tag][..], &x[..], &h1[..]])?;
        self.v = self.hmac(&[&self.v[..]])?;
        Ok(())
    }

    fn hmac(&self, parts: &[&[u8]]) -> Result<[u8; 32]> {
        let mut mac = HmacSha256::new_from_slice(&self.k)
            .map_err(|e| BitcoinError::InvalidPrivateKey(format!("hmac key: {}", e)))?;
        for part in parts {
            mac.update(part);
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&mac.finalize().into_bytes());
        Ok(out)
    }

    fn next_nonce(&mut self) -> Result<U256> {
        let n = Curve::secp256k1().order();
        loop {
            if !self.first {
                self.k = self.hmac(&[&self.v[..], &[0x00][..]])?;
                self.v = self.hmac(&[&self.v[..]])?;
            }
            self.first = false;
            self.v = self.hmac(&[&self.v[..]])?;
            let candidate = U256::from_be_bytes(&self.v);
            if !candidate.is_zero() && candidate < *n {
                return Ok(candidate);
            }
        }
    }
}

impl Drop for Rfc6979 {
    fn drop(&mut self) {
        self.k.zeroize();
        self.v.zeroize();
    }
}
