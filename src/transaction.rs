//! Transaction serialization, legacy signature hashing and validation against supplied UTXOs

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::constants::*;
use crate::ecdsa::verify_digest;
use crate::error::{BitcoinError, Result};
use crate::hash::{hash160, sha256d};
use crate::script::{p2pkh_hash, parse_p2pkh_script_sig};
use crate::serialize::{Decodable, Encodable};
use crate::types::*;

impl Transaction {
    /// Canonical legacy wire encoding
    pub fn serialize(&self) -> Vec<u8> {
        self.to_bytes()
    }

    /// Inverse of [`Transaction::serialize`]; rejects truncated input and trailing bytes
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes(bytes)
    }

    pub fn size(&self) -> usize {
        self.serialize().len()
    }

    /// SHA256(SHA256(tx)) in internal byte order
    pub fn hash(&self) -> Hash {
        sha256d(&self.serialize())
    }

    /// Transaction id: hash displayed byte-reversed as hex
    pub fn txid(&self) -> String {
        let mut hash = self.hash();
        hash.reverse();
        hex::encode(hash)
    }
}

/// Parse a displayed (byte-reversed) txid into internal byte order
pub fn txid_to_hash(txid: &str) -> Result<Hash> {
    let bytes =
        hex::decode(txid).map_err(|e| BitcoinError::InvalidEncoding(format!("txid: {}", e)))?;
    if bytes.len() != 32 {
        return Err(BitcoinError::InvalidEncoding(format!(
            "txid must be 32 bytes, got {}",
            bytes.len()
        )));
    }
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&bytes);
    hash.reverse();
    Ok(hash)
}

/// CheckTransaction: 𝒯𝒳 → {valid, invalid}
///
/// A transaction tx = (v, ins, outs, lt) is valid if and only if:
/// 1. |ins| > 0 ∧ |outs| > 0
/// 2. ∀o ∈ outs: 0 ≤ o.value ≤ M_max, Σ o.value ≤ M_max
/// 3. |tx| ≤ M_max_tx_size
/// 4. no outpoint is spent twice
pub fn check_transaction(tx: &Transaction) -> Result<()> {
    // 1. Check inputs and outputs are not empty
    if tx.inputs.is_empty() || tx.outputs.is_empty() {
        return Err(BitcoinError::InvalidTransaction("Empty inputs or outputs".to_string()));
    }

    // 2. Check output values are valid
    total_output_value(tx)?;

    // 3. Check transaction size limit
    let tx_size = tx.size();
    if tx_size > MAX_TX_SIZE {
        return Err(BitcoinError::InvalidTransaction(format!(
            "Transaction too large: {} bytes",
            tx_size
        )));
    }

    // 4. Check for duplicate inputs
    let mut seen = HashSet::with_capacity(tx.inputs.len());
    for input in &tx.inputs {
        if !seen.insert(input.prevout) {
            return Err(BitcoinError::InvalidTransaction(format!(
                "Duplicate input {}:{}",
                hex::encode(input.prevout.hash),
                input.prevout.index
            )));
        }
    }

    Ok(())
}

/// Σ outputs, each in [0, MAX_MONEY] and the total no greater than MAX_MONEY
fn total_output_value(tx: &Transaction) -> Result<i64> {
    let mut total = 0i64;
    for (i, output) in tx.outputs.iter().enumerate() {
        if output.value < 0 || output.value > MAX_MONEY {
            return Err(BitcoinError::InvalidTransaction(format!(
                "Invalid output value {} at index {}",
                output.value, i
            )));
        }
        total = total.checked_add(output.value).filter(|v| *v <= MAX_MONEY).ok_or_else(|| {
            BitcoinError::InvalidTransaction("Total output value exceeds MAX_MONEY".to_string())
        })?;
    }
    Ok(total)
}

/// SignatureHash: 𝒯𝒳 × ℕ × 𝕊 × ℕ → ℍ (legacy algorithm)
///
/// 1. Blank every scriptSig, then place `script_code` in input `input_index`
/// 2. NONE: drop all outputs; other inputs' sequences become 0
/// 3. SINGLE: keep outputs up to `input_index`, earlier ones as (-1, ∅); other sequences 0
/// 4. ANYONECANPAY: keep only input `input_index`
/// 5. Serialize, append sighash type as u32 LE, double SHA-256
///
/// SINGLE without a matching output returns the constant 1, as consensus does.
pub fn signature_hash(
    tx: &Transaction,
    input_index: usize,
    script_code: &[u8],
    sighash_type: u8,
) -> Result<Hash> {
    if input_index >= tx.inputs.len() {
        return Err(BitcoinError::InvalidTransaction(format!(
            "Input index {} out of range ({} inputs)",
            input_index,
            tx.inputs.len()
        )));
    }
    let base_type = sighash_type & 0x1f;
    let anyone_can_pay = sighash_type & SIGHASH_ANYONECANPAY != 0;
    let known_base = matches!(base_type, SIGHASH_ALL | SIGHASH_NONE | SIGHASH_SINGLE);
    if !known_base || sighash_type & 0x60 != 0 {
        return Err(BitcoinError::UnsupportedSighash(sighash_type));
    }

    if base_type == SIGHASH_SINGLE && input_index >= tx.outputs.len() {
        let mut one = [0u8; 32];
        one[0] = 1;
        return Ok(one);
    }

    let mut inputs = Vec::with_capacity(tx.inputs.len());
    for (i, input) in tx.inputs.iter().enumerate() {
        if anyone_can_pay && i != input_index {
            continue;
        }
        let mut input = input.clone();
        if i == input_index {
            input.script_sig = script_code.to_vec();
        } else {
            input.script_sig = Vec::new();
            if base_type == SIGHASH_NONE || base_type == SIGHASH_SINGLE {
                input.sequence = 0;
            }
        }
        inputs.push(input);
    }

    let outputs = match base_type {
        SIGHASH_NONE => Vec::new(),
        SIGHASH_SINGLE => {
            let mut outputs = Vec::with_capacity(input_index + 1);
            for _ in 0..input_index {
                outputs.push(TransactionOutput {
                    value: -1,
                    script_pubkey: Vec::new(),
                });
            }
            outputs.push(tx.outputs[input_index].clone());
            outputs
        }
        _ => tx.outputs.clone(),
    };

    let stripped = Transaction {
        version: tx.version,
        inputs,
        outputs,
        lock_time: tx.lock_time,
    };
    let mut data = stripped.serialize();
    data.extend_from_slice(&(sighash_type as u32).to_le_bytes());
    let hash = sha256d(&data);
    trace!(input = input_index, sighash_type, preimage_len = data.len(), "computed sighash");
    Ok(hash)
}

/// Look up the UTXO an input spends
pub fn find_utxo<'a>(utxos: &'a [Utxo], outpoint: &OutPoint) -> Option<&'a Utxo> {
    utxos.iter().find(|utxo| utxo.outpoint == *outpoint)
}

/// Σ inputs - Σ outputs over the supplied UTXOs
pub fn calculate_fee(tx: &Transaction, utxos: &[Utxo]) -> Result<i64> {
    let mut total_in = 0i64;
    for (i, input) in tx.inputs.iter().enumerate() {
        let utxo = find_utxo(utxos, &input.prevout).ok_or_else(|| missing_utxo(i, &input.prevout))?;
        if utxo.value < 0 || utxo.value > MAX_MONEY {
            return Err(BitcoinError::UtxoMismatch(format!(
                "UTXO for input {} has invalid value {}",
                i, utxo.value
            )));
        }
        total_in = total_in
            .checked_add(utxo.value)
            .filter(|v| *v <= MAX_MONEY)
            .ok_or_else(|| {
                BitcoinError::InvalidTransaction("Total input value exceeds MAX_MONEY".to_string())
            })?;
    }
    let total_out = total_output_value(tx)?;
    if total_in < total_out {
        return Err(BitcoinError::InsufficientFunds {
            available: total_in,
            required: total_out,
        });
    }
    Ok(total_in - total_out)
}

/// ValidateTransaction: 𝒯𝒳 × 𝒰* → ℤ
///
/// For each input i spending utxo u:
/// 1. u exists for i.prevout and pays to P2PKH hash h
/// 2. scriptSig parses as <sig || type> <pubkey> with hash160(pubkey) = h
/// 3. sig verifies over SignatureHash(tx, i, u.script_pubkey, type)
///
/// Returns the fee Σ inputs - Σ outputs.
pub fn validate_transaction(tx: &Transaction, utxos: &[Utxo]) -> Result<i64> {
    check_transaction(tx)?;

    for (i, input) in tx.inputs.iter().enumerate() {
        let utxo =
            find_utxo(utxos, &input.prevout).ok_or_else(|| missing_utxo(i, &input.prevout))?;
        let expected_hash = p2pkh_hash(&utxo.script_pubkey).ok_or_else(|| {
            BitcoinError::UtxoMismatch(format!("UTXO for input {} is not P2PKH", i))
        })?;

        let script_sig = parse_p2pkh_script_sig(&input.script_sig)?;
        if hash160(&script_sig.public_key_bytes) != expected_hash {
            return Err(BitcoinError::UtxoMismatch(format!(
                "Public key of input {} does not match the UTXO pubkey hash",
                i
            )));
        }

        let sighash = signature_hash(tx, i, &utxo.script_pubkey, script_sig.sighash_type)?;
        if !verify_digest(&script_sig.public_key, &sighash, &script_sig.signature)? {
            debug!(input = i, "signature verification failed");
            return Err(BitcoinError::SignatureInvalid { input: i });
        }
    }

    let fee = calculate_fee(tx, utxos)?;
    debug!(inputs = tx.inputs.len(), outputs = tx.outputs.len(), fee, "transaction validated");
    Ok(fee)
}

fn missing_utxo(input: usize, outpoint: &OutPoint) -> BitcoinError {
    BitcoinError::UtxoMismatch(format!(
        "Input {} spends {}:{} which is not in the UTXO set",
        input,
        hex::encode(outpoint.hash),
        outpoint.index
    ))
}
