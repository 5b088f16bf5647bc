//! Incremental P2PKH transaction builder
//!
//! State machine: `Empty → InputsAdded → OutputsAdded → FeeSet → Signed → Serialized`.
//! Inputs, outputs, fee and change address may be changed freely until the transaction is
//! signed; afterwards the builder only hands out the signed transaction and its bytes.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::address::Address;
use crate::config::BuilderConfig;
use crate::constants::*;
use crate::ecdsa::sign_digest;
use crate::error::{BitcoinError, Result};
use crate::hash::hash160;
use crate::keys::{PrivateKey, PublicKey};
use crate::script::{p2pkh_hash, p2pkh_script_sig};
use crate::transaction::{calculate_fee, check_transaction, signature_hash};
use crate::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BuilderState {
    Empty,
    InputsAdded,
    OutputsAdded,
    FeeSet,
    Signed,
    Serialized,
}

impl fmt::Display for BuilderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

pub struct TransactionBuilder {
    config: BuilderConfig,
    inputs: Vec<Utxo>,
    outputs: Vec<TransactionOutput>,
    fee: Option<i64>,
    change_address: Option<Address>,
    signed: Option<Transaction>,
    serialized: bool,
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        TransactionBuilder::new(BuilderConfig::default())
    }
}

impl TransactionBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        TransactionBuilder {
            config,
            inputs: Vec::new(),
            outputs: Vec::new(),
            fee: None,
            change_address: None,
            signed: None,
            serialized: false,
        }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn state(&self) -> BuilderState {
        if self.serialized {
            BuilderState::Serialized
        } else if self.signed.is_some() {
            BuilderState::Signed
        } else if self.fee.is_some() {
            BuilderState::FeeSet
        } else if !self.outputs.is_empty() {
            BuilderState::OutputsAdded
        } else if !self.inputs.is_empty() {
            BuilderState::InputsAdded
        } else {
            BuilderState::Empty
        }
    }

    pub fn inputs(&self) -> &[Utxo] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TransactionOutput] {
        &self.outputs
    }

    pub fn fee(&self) -> Option<i64> {
        self.fee
    }

    /// The signed transaction, once [`TransactionBuilder::sign`] has succeeded
    pub fn transaction(&self) -> Option<&Transaction> {
        self.signed.as_ref()
    }

    fn ensure_unsigned(&self, operation: &str) -> Result<()> {
        match self.state() {
            BuilderState::Signed | BuilderState::Serialized => {
                Err(BitcoinError::InvalidState(format!(
                    "{} ({} after signing)",
                    self.state(),
                    operation
                )))
            }
            _ => Ok(()),
        }
    }

    /// AddInput(prevTxHash, prevIndex, utxo)
    ///
    /// The UTXO must describe the referenced outpoint; spending it twice is rejected.
    pub fn add_input(
        &mut self,
        prev_tx_hash: Hash,
        prev_index: u32,
        utxo: Utxo,
    ) -> Result<&mut Self> {
        self.ensure_unsigned("add_input")?;
        let outpoint = OutPoint {
            hash: prev_tx_hash,
            index: prev_index,
        };
        if utxo.outpoint != outpoint {
            return Err(BitcoinError::UtxoMismatch(format!(
                "UTXO describes {}:{} but input references {}:{}",
                hex::encode(utxo.outpoint.hash),
                utxo.outpoint.index,
                hex::encode(prev_tx_hash),
                prev_index
            )));
        }
        if utxo.value <= 0 || utxo.value > MAX_MONEY {
            return Err(BitcoinError::UtxoMismatch(format!(
                "UTXO value {} out of range",
                utxo.value
            )));
        }
        if self.inputs.iter().any(|existing| existing.outpoint == outpoint) {
            return Err(BitcoinError::InvalidTransaction(format!(
                "Outpoint {}:{} already added",
                hex::encode(prev_tx_hash),
                prev_index
            )));
        }
        debug!(index = prev_index, value = utxo.value, "added input");
        self.inputs.push(utxo);
        Ok(self)
    }

    pub fn add_utxo(&mut self, utxo: Utxo) -> Result<&mut Self> {
        let OutPoint { hash, index } = utxo.outpoint;
        self.add_input(hash, index, utxo)
    }

    /// AddOutput(address, amount); an undecodable address is `InvalidAddress`
    pub fn add_output(&mut self, address: &str, amount: i64) -> Result<&mut Self> {
        let address = Address::parse(address).map_err(|e| match e {
            e @ BitcoinError::InvalidAddress(_) => e,
            other => BitcoinError::InvalidAddress(other.to_string()),
        })?;
        self.add_output_address(&address, amount)
    }

    pub fn add_output_address(&mut self, address: &Address, amount: i64) -> Result<&mut Self> {
        self.ensure_unsigned("add_output")?;
        if address.network() != self.config.network {
            return Err(BitcoinError::InvalidAddress(format!(
                "{} belongs to {:?}, builder targets {:?}",
                address,
                address.network(),
                self.config.network
            )));
        }
        if amount <= 0 || amount > MAX_MONEY {
            return Err(BitcoinError::InvalidTransaction(format!(
                "Output amount {} out of range",
                amount
            )));
        }
        debug!(%address, amount, "added output");
        self.outputs.push(TransactionOutput {
            value: amount,
            script_pubkey: address.script_pubkey(),
        });
        Ok(self)
    }

    /// SetFee(satoshis)
    pub fn set_fee(&mut self, fee: i64) -> Result<&mut Self> {
        self.ensure_unsigned("set_fee")?;
        if !(0..=MAX_MONEY).contains(&fee) {
            return Err(BitcoinError::InvalidTransaction(format!("Fee {} out of range", fee)));
        }
        self.fee = Some(fee);
        Ok(self)
    }

    pub fn set_change_address(&mut self, address: &str) -> Result<&mut Self> {
        self.ensure_unsigned("set_change_address")?;
        let address =
            Address::parse(address).map_err(|e| BitcoinError::InvalidAddress(e.to_string()))?;
        if address.network() != self.config.network {
            return Err(BitcoinError::InvalidAddress(format!(
                "change address {} belongs to {:?}",
                address,
                address.network()
            )));
        }
        self.change_address = Some(address);
        Ok(self)
    }

    fn total_input(&self) -> i64 {
        self.inputs.iter().fold(0, |acc, utxo| acc.saturating_add(utxo.value))
    }

    fn total_output(&self) -> i64 {
        self.outputs.iter().fold(0, |acc, output| acc.saturating_add(output.value))
    }

    /// Add UTXOs from `pool`, largest first, until inputs cover outputs plus fee
    pub fn select_utxos(&mut self, pool: &[Utxo]) -> Result<&mut Self> {
        self.ensure_unsigned("select_utxos")?;
        let required = self.total_output().saturating_add(self.fee.unwrap_or(0));
        let missing = required.saturating_sub(self.total_input());
        if missing <= 0 {
            return Ok(self);
        }
        let candidates: Vec<Utxo> = pool
            .iter()
            .filter(|utxo| !self.inputs.iter().any(|existing| existing.outpoint == utxo.outpoint))
            .cloned()
            .collect();
        let selected = select_utxos(&candidates, missing).map_err(|e| match e {
            BitcoinError::InsufficientFunds { available, .. } => BitcoinError::InsufficientFunds {
                available: available.saturating_add(self.total_input()),
                required,
            },
            other => other,
        })?;
        for utxo in selected {
            self.add_utxo(utxo)?;
        }
        Ok(self)
    }

    /// SignTransaction(privateKeys)
    ///
    /// 1. Require ≥ 1 input, ≥ 1 output and a fee; inputs ≥ outputs + fee
    /// 2. Append change when inputs - outputs - fee exceeds the dust threshold
    /// 3. For each input in order: legacy SIGHASH_ALL over its UTXO scriptPubKey, sign with
    ///    the key whose compressed or uncompressed hash160 matches, attach the scriptSig
    pub fn sign(&mut self, keys: &[PrivateKey]) -> Result<Transaction> {
        self.ensure_unsigned("sign")?;
        if self.inputs.is_empty() {
            return Err(BitcoinError::InvalidState(format!("{} (no inputs to sign)", self.state())));
        }
        if self.outputs.is_empty() {
            return Err(BitcoinError::InvalidState(format!("{} (no outputs)", self.state())));
        }
        let fee = self
            .fee
            .ok_or_else(|| BitcoinError::InvalidState(format!("{} (fee not set)", self.state())))?;

        let total_in = self.total_input();
        let total_out = self.total_output();
        let required = total_out.saturating_add(fee);
        if total_in < required {
            return Err(BitcoinError::InsufficientFunds {
                available: total_in,
                required,
            });
        }

        let mut outputs = self.outputs.clone();
        let change = total_in - required;
        if change > self.config.dust_threshold {
            let change_script = self.change_script()?;
            outputs.push(TransactionOutput {
                value: change,
                script_pubkey: change_script,
            });
            debug!(change, "appended change output");
        } else if change > 0 {
            debug!(
                change,
                dust_threshold = self.config.dust_threshold,
                "change below dust, added to fee"
            );
        }

        let mut tx = Transaction {
            version: self.config.version,
            inputs: self
                .inputs
                .iter()
                .map(|utxo| TransactionInput {
                    prevout: utxo.outpoint,
                    script_sig: Vec::new(),
                    sequence: self.config.sequence,
                })
                .collect(),
            outputs,
            lock_time: self.config.lock_time,
        };

        let signers = keys
            .iter()
            .map(|key| Ok((key, key.public_key()?)))
            .collect::<Result<Vec<(&PrivateKey, PublicKey)>>>()?;

        for (i, utxo) in self.inputs.iter().enumerate() {
            let expected = p2pkh_hash(&utxo.script_pubkey).ok_or_else(|| {
                BitcoinError::UtxoMismatch(format!("UTXO for input {} is not P2PKH", i))
            })?;
            let (key, public_key_sec) = find_signer(&signers, &expected)
                .ok_or(BitcoinError::MissingPrivateKey { input: i })?;

            let sighash = signature_hash(&tx, i, &utxo.script_pubkey, SIGHASH_ALL)?;
            let signature = sign_digest(key, &sighash)?;
            tx.inputs[i].script_sig = p2pkh_script_sig(&signature, SIGHASH_ALL, &public_key_sec);
            debug!(input = i, "signed input");
        }

        let paid = check_transaction(&tx).and_then(|_| calculate_fee(&tx, &self.inputs))?;
        debug!(txid = %tx.txid(), fee = paid, "transaction signed");
        self.signed = Some(tx.clone());
        Ok(tx)
    }

    /// Wire bytes of the signed transaction; moves the builder to `Serialized`
    pub fn serialize(&mut self) -> Result<Vec<u8>> {
        let bytes = match &self.signed {
            Some(tx) => tx.serialize(),
            None => {
                return Err(BitcoinError::InvalidState(format!(
                    "{} (sign before serializing)",
                    self.state()
                )))
            }
        };
        self.serialized = true;
        Ok(bytes)
    }

    /// Change goes to the configured change address, else back to the first input's script
    fn change_script(&self) -> Result<ByteString> {
        if let Some(address) = &self.change_address {
            return Ok(address.script_pubkey());
        }
        let first = self
            .inputs
            .first()
            .ok_or_else(|| BitcoinError::InvalidState("no inputs for change".to_string()))?;
        let address = Address::from_script_pubkey(&first.script_pubkey, self.config.network)?;
        Ok(address.script_pubkey())
    }
}

/// Match a pubkey hash against compressed and uncompressed encodings of each key
fn find_signer<'a>(
    signers: &[(&'a PrivateKey, PublicKey)],
    expected: &[u8; 20],
) -> Option<(&'a PrivateKey, Vec<u8>)> {
    for (key, public_key) in signers {
        let compressed = public_key.to_sec_compressed();
        if hash160(&compressed) == *expected {
            return Some((*key, compressed.to_vec()));
        }
        let uncompressed = public_key.to_sec_uncompressed();
        if hash160(&uncompressed) == *expected {
            return Some((*key, uncompressed.to_vec()));
        }
    }
    None
}

/// Largest-first selection of UTXOs whose values sum to at least `target`
pub fn select_utxos(pool: &[Utxo], target: i64) -> Result<Vec<Utxo>> {
    let mut sorted: Vec<&Utxo> = pool.iter().collect();
    sorted.sort_by(|a, b| b.value.cmp(&a.value));

    let mut selected = Vec::new();
    let mut total = 0i64;
    for utxo in sorted {
        if total >= target {
            break;
        }
        total += utxo.value;
        selected.push(utxo.clone());
    }
    if total < target {
        return Err(BitcoinError::InsufficientFunds {
            available: total,
            required: target,
        });
    }
    Ok(selected)
}
