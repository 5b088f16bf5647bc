//! Fixed-width 256-bit integers with modular arithmetic helpers
//!
//! All field and scalar math of the curve engine runs on [`U256`]. Modular helpers
//! expect operands already reduced below the modulus and an odd modulus, which holds
//! for both the secp256k1 field prime and the group order.
//!
//! None of these routines are constant-time.

use std::cmp::Ordering;
use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// 256-bit unsigned integer, little-endian 64-bit limbs
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct U256([u64; 4]);

impl U256 {
    pub const ZERO: U256 = U256([0; 4]);
    pub const ONE: U256 = U256([1, 0, 0, 0]);

    /// Build from little-endian limbs
    pub const fn from_limbs(limbs: [u64; 4]) -> Self {
        U256(limbs)
    }

    pub fn from_u64(value: u64) -> Self {
        U256([value, 0, 0, 0])
    }

    pub fn limbs(&self) -> [u64; 4] {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&x| x == 0)
    }

    pub fn is_odd(&self) -> bool {
        self.0[0] & 1 == 1
    }

    /// Value of bit `i` (0 = least significant)
    pub fn bit(&self, i: usize) -> bool {
        if i >= 256 {
            return false;
        }
        (self.0[i / 64] >> (i % 64)) & 1 == 1
    }

    /// Number of significant bits
    pub fn bits(&self) -> usize {
        for i in (0..4).rev() {
            if self.0[i] != 0 {
                return i * 64 + (64 - self.0[i].leading_zeros() as usize);
            }
        }
        0
    }

    pub fn from_be_bytes(bytes: &[u8; 32]) -> Self {
        let mut words = [0u64; 4];
        for (i, word) in words.iter_mut().enumerate() {
            let start = 32 - (i + 1) * 8;
            let mut chunk = [0u8; 8];
            chunk.copy_from_slice(&bytes[start..start + 8]);
            *word = u64::from_be_bytes(chunk);
        }
        U256(words)
    }

    /// Big-endian slice of at most 32 bytes
    pub fn from_be_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() > 32 {
            return None;
        }
        let mut padded = [0u8; 32];
        padded[32 - bytes.len()..].copy_from_slice(bytes);
        Some(Self::from_be_bytes(&padded))
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for (i, &word) in self.0.iter().enumerate() {
            let start = 32 - (i + 1) * 8;
            bytes[start..start + 8].copy_from_slice(&word.to_be_bytes());
        }
        bytes
    }

    /// Parse up to 64 hex digits, optional `0x` prefix
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        if s.is_empty() || s.len() > 64 {
            return None;
        }
        let padded = format!("{:0>64}", s);
        let bytes = hex::decode(padded).ok()?;
        Self::from_be_slice(&bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_be_bytes())
    }

    pub fn overflowing_add(&self, other: &U256) -> (U256, bool) {
        let mut out = [0u64; 4];
        let mut carry = false;
        for (i, limb) in out.iter_mut().enumerate() {
            let (s1, c1) = self.0[i].overflowing_add(other.0[i]);
            let (s2, c2) = s1.overflowing_add(carry as u64);
            *limb = s2;
            carry = c1 || c2;
        }
        (U256(out), carry)
    }

    pub fn overflowing_sub(&self, other: &U256) -> (U256, bool) {
        let mut out = [0u64; 4];
        let mut borrow = false;
        for (i, limb) in out.iter_mut().enumerate() {
            let (d1, b1) = self.0[i].overflowing_sub(other.0[i]);
            let (d2, b2) = d1.overflowing_sub(borrow as u64);
            *limb = d2;
            borrow = b1 || b2;
        }
        (U256(out), borrow)
    }

    pub fn wrapping_add(&self, other: &U256) -> U256 {
        self.overflowing_add(other).0
    }

    pub fn wrapping_sub(&self, other: &U256) -> U256 {
        self.overflowing_sub(other).0
    }

    pub fn shr(&self, shift: u32) -> Self {
        if shift >= 256 {
            return U256::ZERO;
        }

        let mut result = U256::ZERO;
        let word_shift = (shift / 64) as usize;
        let bit_shift = shift % 64;

        for i in word_shift..4 {
            result.0[i - word_shift] |= self.0[i] >> bit_shift;
            if bit_shift > 0 && i > word_shift {
                result.0[i - word_shift - 1] |= self.0[i] << (64 - bit_shift);
            }
        }

        result
    }

    /// Shift left by one, returning the bit shifted out
    fn shl1(&self) -> (U256, bool) {
        let mut out = [0u64; 4];
        let mut carry = 0u64;
        for (i, limb) in out.iter_mut().enumerate() {
            *limb = (self.0[i] << 1) | carry;
            carry = self.0[i] >> 63;
        }
        (U256(out), carry == 1)
    }

    /// Shift right by one, filling the top bit with `high`
    fn shr1(&self, high: bool) -> U256 {
        let mut out = [0u64; 4];
        for i in 0..4 {
            let next = if i == 3 { high as u64 } else { self.0[i + 1] & 1 };
            out[i] = (self.0[i] >> 1) | (next << 63);
        }
        U256(out)
    }

    /// Full 512-bit product as little-endian limbs
    fn mul_wide(&self, other: &U256) -> [u64; 8] {
        let mut out = [0u64; 8];
        for i in 0..4 {
            let mut carry: u128 = 0;
            for j in 0..4 {
                let t = (self.0[i] as u128) * (other.0[j] as u128) + out[i + j] as u128 + carry;
                out[i + j] = t as u64;
                carry = t >> 64;
            }
            out[i + 4] = carry as u64;
        }
        out
    }

    /// Reduce a 512-bit value modulo `m` by shift-and-subtract
    fn reduce_wide(wide: &[u64; 8], m: &U256) -> U256 {
        let top = (0..8)
            .rev()
            .find(|&i| wide[i] != 0)
            .map(|i| i * 64 + (64 - wide[i].leading_zeros() as usize))
            .unwrap_or(0);

        let mut r = U256::ZERO;
        for i in (0..top).rev() {
            let (shifted, carry) = r.shl1();
            r = shifted;
            if (wide[i / 64] >> (i % 64)) & 1 == 1 {
                r.0[0] |= 1;
            }
            // r < 2m here, so one subtraction restores r < m
            if carry || r >= *m {
                r = r.wrapping_sub(m);
            }
        }
        r
    }

    /// self mod m
    pub fn reduce(&self, m: &U256) -> U256 {
        if self < m {
            return *self;
        }
        let mut wide = [0u64; 8];
        wide[..4].copy_from_slice(&self.0);
        Self::reduce_wide(&wide, m)
    }

    pub fn add_mod(&self, other: &U256, m: &U256) -> U256 {
        let (sum, carry) = self.overflowing_add(other);
        if carry || sum >= *m {
            sum.wrapping_sub(m)
        } else {
            sum
        }
    }

    pub fn sub_mod(&self, other: &U256, m: &U256) -> U256 {
        let (diff, borrow) = self.overflowing_sub(other);
        if borrow {
            diff.wrapping_add(m)
        } else {
            diff
        }
    }

    pub fn neg_mod(&self, m: &U256) -> U256 {
        if self.is_zero() {
            U256::ZERO
        } else {
            m.wrapping_sub(self)
        }
    }

    pub fn mul_mod(&self, other: &U256, m: &U256) -> U256 {
        Self::reduce_wide(&self.mul_wide(other), m)
    }

    pub fn square_mod(&self, m: &U256) -> U256 {
        self.mul_mod(self, m)
    }

    /// self^exp mod m, square-and-multiply from the top bit
    pub fn pow_mod(&self, exp: &U256, m: &U256) -> U256 {
        let base = self.reduce(m);
        let mut acc = U256::ONE.reduce(m);
        for i in (0..exp.bits()).rev() {
            acc = acc.square_mod(m);
            if exp.bit(i) {
                acc = acc.mul_mod(&base, m);
            }
        }
        acc
    }

    /// (self + m) / 2 mod m for odd m, or self / 2 when self is even
    fn halve_mod(&self, m: &U256) -> U256 {
        if self.is_odd() {
            let (sum, carry) = self.overflowing_add(m);
            sum.shr1(carry)
        } else {
            self.shr1(false)
        }
    }

    /// Multiplicative inverse modulo an odd `m` (binary extended Euclid).
    ///
    /// Returns `None` when `self ≡ 0 (mod m)` or the inverse does not exist.
    pub fn inv_mod(&self, m: &U256) -> Option<U256> {
        if !m.is_odd() {
            return None;
        }
        let a = self.reduce(m);
        if a.is_zero() {
            return None;
        }

        let mut u = a;
        let mut v = *m;
        let mut x1 = U256::ONE;
        let mut x2 = U256::ZERO;

        while u != U256::ONE && v != U256::ONE {
            if u.is_zero() || v.is_zero() {
                return None;
            }
            while !u.is_odd() {
                u = u.shr1(false);
                x1 = x1.halve_mod(m);
            }
            while !v.is_odd() {
                v = v.shr1(false);
                x2 = x2.halve_mod(m);
            }
            if u >= v {
                u = u.wrapping_sub(&v);
                x1 = x1.sub_mod(&x2, m);
            } else {
                v = v.wrapping_sub(&u);
                x2 = x2.sub_mod(&x1, m);
            }
        }

        if u == U256::ONE {
            Some(x1)
        } else {
            Some(x2)
        }
    }
}

impl PartialOrd for U256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for U256 {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.0.iter().rev().zip(other.0.iter().rev()) {
            match a.cmp(b) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }
}

impl fmt::Debug for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U256(0x{})", self.to_hex())
    }
}

impl fmt::LowerHex for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Zeroize for U256 {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// Serialized as a 64-digit big-endian hex string
impl Serialize for U256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for U256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        U256::from_hex(&s)
            .ok_or_else(|| D::Error::custom(format!("invalid 256-bit hex value: {}", s)))
    }
}
