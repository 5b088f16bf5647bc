//! Script construction, parsing and template recognition
//!
//! Covers the standard templates legacy wallets produce: P2PKH, P2SH and bare
//! `m-of-n` CHECKMULTISIG redeem scripts. There is no interpreter; spending conditions
//! are checked by matching templates in [`crate::transaction`].

use byteorder::{ByteOrder, LittleEndian};

use crate::constants::MAX_MULTISIG_KEYS;
use crate::der::{decode_der_with_sighash, encode_der_with_sighash};
use crate::ecdsa::Signature;
use crate::error::{BitcoinError, Result};
use crate::keys::PublicKey;
use crate::types::ByteString;

pub const OP_0: u8 = 0x00;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_1: u8 = 0x51;
pub const OP_16: u8 = 0x60;
pub const OP_DUP: u8 = 0x76;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_CHECKMULTISIG: u8 = 0xae;

/// Largest direct push (opcodes 0x01..=0x4b)
const MAX_DIRECT_PUSH: usize = 0x4b;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Any non-push opcode
    Op(u8),
    /// Data push, re-encoded minimally by [`Script::to_bytes`]
    Push(ByteString),
}

/// Script: 𝒮𝒞 = Instruction*
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Script {
    instructions: Vec<Instruction>,
}

/// Recognized output/redeem script shapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptTemplate {
    /// OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG
    P2pkh { hash: [u8; 20] },
    /// OP_HASH160 <20> OP_EQUAL
    P2sh { hash: [u8; 20] },
    /// OP_m <pk>... OP_n OP_CHECKMULTISIG
    Multisig {
        threshold: usize,
        public_keys: Vec<ByteString>,
    },
    NonStandard,
}

impl Script {
    pub fn new() -> Self {
        Script::default()
    }

    pub fn push_opcode(mut self, opcode: u8) -> Self {
        self.instructions.push(Instruction::Op(opcode));
        self
    }

    pub fn push_data(mut self, data: &[u8]) -> Self {
        self.instructions.push(Instruction::Push(data.to_vec()));
        self
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn to_bytes(&self) -> ByteString {
        let mut out = Vec::new();
        for instruction in &self.instructions {
            match instruction {
                Instruction::Op(opcode) => out.push(*opcode),
                Instruction::Push(data) => encode_push(&mut out, data),
            }
        }
        out
    }

    /// Split raw bytes into instructions
    ///
    /// Fails with `MalformedScript` when a push runs past the end of the script.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut instructions = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            let opcode = bytes[i];
            i += 1;
            let len = match opcode {
                // OP_0 pushes the empty string
                OP_0 => 0,
                0x01..=0x4b => opcode as usize,
                OP_PUSHDATA1 => {
                    let width = take(bytes, i, 1)?;
                    i += 1;
                    width[0] as usize
                }
                OP_PUSHDATA2 => {
                    let width = take(bytes, i, 2)?;
                    i += 2;
                    LittleEndian::read_u16(width) as usize
                }
                OP_PUSHDATA4 => {
                    let width = take(bytes, i, 4)?;
                    i += 4;
                    LittleEndian::read_u32(width) as usize
                }
                _ => {
                    instructions.push(Instruction::Op(opcode));
                    continue;
                }
            };
            let data = take(bytes, i, len)?;
            i += len;
            instructions.push(Instruction::Push(data.to_vec()));
        }
        Ok(Script { instructions })
    }

    pub fn classify(&self) -> ScriptTemplate {
        use Instruction::{Op, Push};

        match self.instructions.as_slice() {
            [Op(OP_DUP), Op(OP_HASH160), Push(hash), Op(OP_EQUALVERIFY), Op(OP_CHECKSIG)]
                if hash.len() == 20 =>
            {
                ScriptTemplate::P2pkh { hash: to_hash20(hash) }
            }
            [Op(OP_HASH160), Push(hash), Op(OP_EQUAL)] if hash.len() == 20 => {
                ScriptTemplate::P2sh { hash: to_hash20(hash) }
            }
            [Op(m), keys @ .., Op(n), Op(OP_CHECKMULTISIG)] => {
                let (threshold, total) = match (small_int(*m), small_int(*n)) {
                    (Some(m), Some(n)) => (m, n),
                    _ => return ScriptTemplate::NonStandard,
                };
                let mut public_keys = Vec::with_capacity(keys.len());
                for key in keys {
                    match key {
                        Push(bytes) if bytes.len() == 33 || bytes.len() == 65 => {
                            public_keys.push(bytes.clone())
                        }
                        _ => return ScriptTemplate::NonStandard,
                    }
                }
                if total != public_keys.len() || threshold > total {
                    return ScriptTemplate::NonStandard;
                }
                ScriptTemplate::Multisig { threshold, public_keys }
            }
            _ => ScriptTemplate::NonStandard,
        }
    }
}

/// Classify raw script bytes; unparseable scripts are `NonStandard`
pub fn classify_script(bytes: &[u8]) -> ScriptTemplate {
    match Script::parse(bytes) {
        Ok(script) => script.classify(),
        Err(_) => ScriptTemplate::NonStandard,
    }
}

/// The pubkey hash of a P2PKH scriptPubKey
pub fn p2pkh_hash(script_pubkey: &[u8]) -> Option<[u8; 20]> {
    match classify_script(script_pubkey) {
        ScriptTemplate::P2pkh { hash } => Some(hash),
        _ => None,
    }
}

fn take(bytes: &[u8], start: usize, len: usize) -> Result<&[u8]> {
    start
        .checked_add(len)
        .and_then(|end| bytes.get(start..end))
        .ok_or_else(|| {
            BitcoinError::MalformedScript(format!(
                "push of {} bytes at offset {} overruns {}-byte script",
                len,
                start,
                bytes.len()
            ))
        })
}

fn encode_push(out: &mut Vec<u8>, data: &[u8]) {
    let len = data.len();
    if len == 0 {
        out.push(OP_0);
    } else if len <= MAX_DIRECT_PUSH {
        out.push(len as u8);
    } else if len <= 0xff {
        out.push(OP_PUSHDATA1);
        out.push(len as u8);
    } else if len <= 0xffff {
        out.push(OP_PUSHDATA2);
        out.extend_from_slice(&(len as u16).to_le_bytes());
    } else {
        out.push(OP_PUSHDATA4);
        out.extend_from_slice(&(len as u32).to_le_bytes());
    }
    out.extend_from_slice(data);
}

/// OP_1..OP_16 → 1..16
fn small_int(opcode: u8) -> Option<usize> {
    match opcode {
        OP_1..=OP_16 => Some((opcode - OP_1 + 1) as usize),
        _ => None,
    }
}

/// 1..16 → OP_1..OP_16
fn small_int_opcode(n: usize) -> Option<u8> {
    match n {
        1..=16 => Some(OP_1 + (n as u8 - 1)),
        _ => None,
    }
}

fn to_hash20(bytes: &[u8]) -> [u8; 20] {
    let mut hash = [0u8; 20];
    hash.copy_from_slice(bytes);
    hash
}

pub fn p2pkh_script_pubkey(hash: &[u8; 20]) -> ByteString {
    Script::new()
        .push_opcode(OP_DUP)
        .push_opcode(OP_HASH160)
        .push_data(hash)
        .push_opcode(OP_EQUALVERIFY)
        .push_opcode(OP_CHECKSIG)
        .to_bytes()
}

pub fn p2sh_script_pubkey(hash: &[u8; 20]) -> ByteString {
    Script::new()
        .push_opcode(OP_HASH160)
        .push_data(hash)
        .push_opcode(OP_EQUAL)
        .to_bytes()
}

/// OP_threshold <pk₁> ... <pkₙ> OP_n OP_CHECKMULTISIG, keys in compressed SEC form
///
/// Requires 1 ≤ threshold ≤ n ≤ 16.
pub fn multisig_redeem_script(threshold: usize, public_keys: &[PublicKey]) -> Result<ByteString> {
    let total = public_keys.len();
    let invalid = BitcoinError::InvalidThreshold {
        threshold,
        keys: total,
    };
    if threshold < 1 || threshold > total || total > MAX_MULTISIG_KEYS {
        return Err(invalid);
    }
    let (m, n) = match (small_int_opcode(threshold), small_int_opcode(total)) {
        (Some(m), Some(n)) => (m, n),
        _ => return Err(invalid),
    };

    let mut script = Script::new().push_opcode(m);
    for key in public_keys {
        script = script.push_data(&key.to_sec_compressed());
    }
    Ok(script.push_opcode(n).push_opcode(OP_CHECKMULTISIG).to_bytes())
}

/// Unlocking script for a P2PKH output: <DER sig || sighash type> <SEC pubkey>
pub fn p2pkh_script_sig(
    signature: &Signature,
    sighash_type: u8,
    public_key_sec: &[u8],
) -> ByteString {
    Script::new()
        .push_data(&encode_der_with_sighash(signature, sighash_type))
        .push_data(public_key_sec)
        .to_bytes()
}

/// A parsed P2PKH scriptSig
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct P2pkhScriptSig {
    pub signature: Signature,
    pub sighash_type: u8,
    pub public_key: PublicKey,
    /// SEC bytes as pushed; hashed against the locking script
    pub public_key_bytes: ByteString,
}

/// Parse `<sig> <pubkey>`; any structural or codec failure is `MalformedScript`
pub fn parse_p2pkh_script_sig(script_sig: &[u8]) -> Result<P2pkhScriptSig> {
    let script = Script::parse(script_sig)?;
    let (sig_bytes, key_bytes) = match script.instructions() {
        [Instruction::Push(sig), Instruction::Push(key)] => (sig, key),
        other => {
            return Err(BitcoinError::MalformedScript(format!(
                "expected two pushes, found {} instructions",
                other.len()
            )))
        }
    };
    let (signature, sighash_type) = decode_der_with_sighash(sig_bytes)
        .map_err(|e| BitcoinError::MalformedScript(format!("signature: {}", e)))?;
    let public_key = PublicKey::from_sec(key_bytes)
        .map_err(|e| BitcoinError::MalformedScript(format!("public key: {}", e)))?;
    Ok(P2pkhScriptSig {
        signature,
        sighash_type,
        public_key,
        public_key_bytes: key_bytes.clone(),
    })
}
