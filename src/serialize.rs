//! Legacy Bitcoin wire format
//!
//! Encoding appends little-endian fields to a byte vector; decoding reads them back through
//! `byteorder` over any `Read`. Truncated input surfaces as `InvalidEncoding`.

use std::io::{self, Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::constants::*;
use crate::error::{BitcoinError, Result};
use crate::types::*;

/// Scripts longer than this are rejected while decoding
pub const MAX_SCRIPT_LEN: usize = 10_000;

pub trait Encodable {
    fn encode(&self, out: &mut Vec<u8>);

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode(&mut out);
        out
    }
}

pub trait Decodable: Sized {
    fn decode<R: Read>(reader: &mut R) -> Result<Self>;

    /// Decode from a complete buffer, rejecting trailing bytes
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);
        let value = Self::decode(&mut cursor)?;
        let consumed = cursor.position() as usize;
        if consumed != bytes.len() {
            return Err(BitcoinError::InvalidEncoding(format!(
                "{} trailing bytes",
                bytes.len() - consumed
            )));
        }
        Ok(value)
    }
}

/// Number of bytes [`encode_varint`] produces
pub fn varint_size(value: u64) -> usize {
    if value < 0xfd {
        1
    } else if value <= 0xffff {
        3
    } else if value <= 0xffffffff {
        5
    } else {
        9
    }
}

/// Encode a number as a Bitcoin varint
pub fn encode_varint(value: u64) -> Vec<u8> {
    if value < 0xfd {
        vec![value as u8]
    } else if value <= 0xffff {
        let mut result = vec![0xfd];
        result.extend_from_slice(&(value as u16).to_le_bytes());
        result
    } else if value <= 0xffffffff {
        let mut result = vec![0xfe];
        result.extend_from_slice(&(value as u32).to_le_bytes());
        result
    } else {
        let mut result = vec![0xff];
        result.extend_from_slice(&value.to_le_bytes());
        result
    }
}

/// Read a varint, rejecting non-canonical (over-long) encodings
pub fn read_varint<R: Read>(reader: &mut R) -> Result<u64> {
    let n0 = reader.read_u8().map_err(io_error)?;
    let (value, min) = match n0 {
        0xff => (reader.read_u64::<LittleEndian>().map_err(io_error)?, 0x1_0000_0000),
        0xfe => (reader.read_u32::<LittleEndian>().map_err(io_error)? as u64, 0x1_0000),
        0xfd => (reader.read_u16::<LittleEndian>().map_err(io_error)? as u64, 0xfd),
        _ => return Ok(n0 as u64),
    };
    if value < min {
        return Err(BitcoinError::InvalidEncoding(format!("non-canonical varint {}", value)));
    }
    Ok(value)
}

fn write_script(out: &mut Vec<u8>, script: &[u8]) {
    out.extend_from_slice(&encode_varint(script.len() as u64));
    out.extend_from_slice(script);
}

fn read_script<R: Read>(reader: &mut R) -> Result<ByteString> {
    let len = read_varint(reader)? as usize;
    if len > MAX_SCRIPT_LEN {
        return Err(BitcoinError::InvalidEncoding(format!(
            "script length {} exceeds {}",
            len, MAX_SCRIPT_LEN
        )));
    }
    let mut script = vec![0u8; len];
    reader.read_exact(&mut script).map_err(io_error)?;
    Ok(script)
}

/// Smallest wire size of an input: outpoint, empty script, sequence
const MIN_INPUT_SIZE: u64 = 36 + 1 + 4;

/// Smallest wire size of an output: value, empty script
const MIN_OUTPUT_SIZE: u64 = 8 + 1;

/// Read an element count, rejecting counts that could not fit in `MAX_TX_SIZE`
fn read_count<R: Read>(reader: &mut R, what: &str, min_size: u64) -> Result<usize> {
    let count = read_varint(reader)?;
    if count.saturating_mul(min_size) > MAX_TX_SIZE as u64 {
        return Err(BitcoinError::InvalidEncoding(format!(
            "{} count {} cannot fit in {} bytes",
            what, count, MAX_TX_SIZE
        )));
    }
    Ok(count as usize)
}

fn io_error(e: io::Error) -> BitcoinError {
    match e.kind() {
        io::ErrorKind::UnexpectedEof => {
            BitcoinError::InvalidEncoding("unexpected end of data".to_string())
        }
        _ => BitcoinError::InvalidEncoding(e.to_string()),
    }
}

impl Encodable for OutPoint {
    fn encode(&self, out: &mut Vec<u8>) {
        // Previous output hash (32 bytes, internal order)
        out.extend_from_slice(&self.hash);
        out.extend_from_slice(&self.index.to_le_bytes());
    }
}

impl Decodable for OutPoint {
    fn decode<R: Read>(reader: &mut R) -> Result<Self> {
        let mut hash = [0u8; 32];
        reader.read_exact(&mut hash).map_err(io_error)?;
        let index = reader.read_u32::<LittleEndian>().map_err(io_error)?;
        Ok(OutPoint { hash, index })
    }
}

impl Encodable for TransactionInput {
    fn encode(&self, out: &mut Vec<u8>) {
        self.prevout.encode(out);
        write_script(out, &self.script_sig);
        out.extend_from_slice(&self.sequence.to_le_bytes());
    }
}

impl Decodable for TransactionInput {
    fn decode<R: Read>(reader: &mut R) -> Result<Self> {
        let prevout = OutPoint::decode(reader)?;
        let script_sig = read_script(reader)?;
        let sequence = reader.read_u32::<LittleEndian>().map_err(io_error)?;
        Ok(TransactionInput {
            prevout,
            script_sig,
            sequence,
        })
    }
}

impl Encodable for TransactionOutput {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.value.to_le_bytes());
        write_script(out, &self.script_pubkey);
    }
}

impl Decodable for TransactionOutput {
    fn decode<R: Read>(reader: &mut R) -> Result<Self> {
        let value = reader.read_i64::<LittleEndian>().map_err(io_error)?;
        let script_pubkey = read_script(reader)?;
        Ok(TransactionOutput { value, script_pubkey })
    }
}

impl Encodable for Transaction {
    /// version || varint(n_in) || inputs || varint(n_out) || outputs || lock_time
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&encode_varint(self.inputs.len() as u64));
        for input in &self.inputs {
            input.encode(out);
        }
        out.extend_from_slice(&encode_varint(self.outputs.len() as u64));
        for output in &self.outputs {
            output.encode(out);
        }
        out.extend_from_slice(&self.lock_time.to_le_bytes());
    }
}

impl Decodable for Transaction {
    fn decode<R: Read>(reader: &mut R) -> Result<Self> {
        let version = reader.read_u32::<LittleEndian>().map_err(io_error)?;

        let input_count = read_count(reader, "input", MIN_INPUT_SIZE)?;
        let mut inputs = Vec::with_capacity(input_count);
        for _ in 0..input_count {
            inputs.push(TransactionInput::decode(reader)?);
        }

        let output_count = read_count(reader, "output", MIN_OUTPUT_SIZE)?;
        let mut outputs = Vec::with_capacity(output_count);
        for _ in 0..output_count {
            outputs.push(TransactionOutput::decode(reader)?);
        }

        let lock_time = reader.read_u32::<LittleEndian>().map_err(io_error)?;
        Ok(Transaction {
            version,
            inputs,
            outputs,
            lock_time,
        })
    }
}
