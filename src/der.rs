//! DER encoding of ECDSA signatures
//!
//! `30 <len> 02 <rlen> <r> 02 <slen> <s>` with minimal, non-negative integers. Decoding is
//! strict: short-form lengths only, no padding beyond the sign byte, no trailing data.

use crate::ecdsa::Signature;
use crate::error::{BitcoinError, Result};
use crate::field::U256;

const TAG_SEQUENCE: u8 = 0x30;
const TAG_INTEGER: u8 = 0x02;

/// Largest DER signature: 2 + 2 × (2 + 33)
pub const MAX_DER_LEN: usize = 72;

impl Signature {
    pub fn to_der(&self) -> Vec<u8> {
        encode_der(self)
    }

    pub fn from_der(bytes: &[u8]) -> Result<Self> {
        decode_der(bytes)
    }
}

/// Encode a signature as a DER SEQUENCE of two INTEGERs
pub fn encode_der(signature: &Signature) -> Vec<u8> {
    let r = encode_integer(&signature.r);
    let s = encode_integer(&signature.s);

    let mut out = Vec::with_capacity(2 + r.len() + s.len());
    out.push(TAG_SEQUENCE);
    out.push((r.len() + s.len()) as u8);
    out.extend_from_slice(&r);
    out.extend_from_slice(&s);
    out
}

/// Decode a strict DER signature
pub fn decode_der(bytes: &[u8]) -> Result<Signature> {
    if bytes.len() < 8 || bytes.len() > MAX_DER_LEN {
        return Err(der_error(format!("length {} outside [8, {}]", bytes.len(), MAX_DER_LEN)));
    }
    if bytes[0] != TAG_SEQUENCE {
        return Err(der_error(format!("expected SEQUENCE tag, got 0x{:02x}", bytes[0])));
    }
    let body_len = bytes[1] as usize;
    if body_len & 0x80 != 0 {
        return Err(der_error("long-form length".to_string()));
    }
    if body_len != bytes.len() - 2 {
        return Err(der_error(format!(
            "sequence length {} does not match {} remaining bytes",
            body_len,
            bytes.len() - 2
        )));
    }

    let body = &bytes[2..];
    let (r, rest) = decode_integer(body, "r")?;
    let (s, rest) = decode_integer(rest, "s")?;
    if !rest.is_empty() {
        return Err(der_error(format!("{} trailing bytes", rest.len())));
    }
    Ok(Signature { r, s })
}

/// Split `DER || sighash_type` as found in a scriptSig
pub fn decode_der_with_sighash(bytes: &[u8]) -> Result<(Signature, u8)> {
    match bytes.split_last() {
        Some((&sighash_type, der)) => Ok((decode_der(der)?, sighash_type)),
        None => Err(der_error("empty signature".to_string())),
    }
}

pub fn encode_der_with_sighash(signature: &Signature, sighash_type: u8) -> Vec<u8> {
    let mut out = encode_der(signature);
    out.push(sighash_type);
    out
}

fn encode_integer(value: &U256) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
    let digits = &bytes[start..];

    let mut out = Vec::with_capacity(digits.len() + 3);
    out.push(TAG_INTEGER);
    if digits[0] & 0x80 != 0 {
        out.push(digits.len() as u8 + 1);
        out.push(0x00);
    } else {
        out.push(digits.len() as u8);
    }
    out.extend_from_slice(digits);
    out
}

fn decode_integer<'a>(input: &'a [u8], name: &str) -> Result<(U256, &'a [u8])> {
    if input.len() < 2 {
        return Err(der_error(format!("truncated INTEGER {}", name)));
    }
    if input[0] != TAG_INTEGER {
        return Err(der_error(format!("expected INTEGER tag for {}, got 0x{:02x}", name, input[0])));
    }
    let len = input[1] as usize;
    if len == 0 {
        return Err(der_error(format!("zero-length INTEGER {}", name)));
    }
    if len & 0x80 != 0 {
        return Err(der_error(format!("long-form length for {}", name)));
    }
    if input.len() < 2 + len {
        return Err(der_error(format!("INTEGER {} overruns the sequence", name)));
    }
    let digits = &input[2..2 + len];
    if digits[0] & 0x80 != 0 {
        return Err(der_error(format!("negative INTEGER {}", name)));
    }
    if len > 1 && digits[0] == 0x00 && digits[1] & 0x80 == 0 {
        return Err(der_error(format!("non-minimal INTEGER {}", name)));
    }
    let value = U256::from_be_slice(strip_sign_byte(digits))
        .ok_or_else(|| der_error(format!("INTEGER {} wider than 256 bits", name)))?;
    Ok((value, &input[2 + len..]))
}

fn strip_sign_byte(digits: &[u8]) -> &[u8] {
    if digits.len() > 1 && digits[0] == 0x00 {
        &digits[1..]
    } else {
        digits
    }
}

fn der_error(msg: String) -> BitcoinError {
    BitcoinError::InvalidEncoding(format!("DER: {}", msg))
}
