//! Core value types shared by the codecs, addresses and transactions

use serde::{Deserialize, Serialize};

use crate::constants::*;

/// Hash type: 256-bit hash
pub type Hash = [u8; 32];

/// Byte string type
pub type ByteString = Vec<u8>;

/// Bitcoin network a key or address belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    pub fn is_testnet(&self) -> bool {
        matches!(self, Network::Testnet)
    }

    pub fn from_testnet_flag(testnet: bool) -> Self {
        if testnet {
            Network::Testnet
        } else {
            Network::Mainnet
        }
    }

    pub fn p2pkh_version(&self) -> u8 {
        match self {
            Network::Mainnet => P2PKH_VERSION_MAINNET,
            Network::Testnet => P2PKH_VERSION_TESTNET,
        }
    }

    pub fn p2sh_version(&self) -> u8 {
        match self {
            Network::Mainnet => P2SH_VERSION_MAINNET,
            Network::Testnet => P2SH_VERSION_TESTNET,
        }
    }

    pub fn wif_version(&self) -> u8 {
        match self {
            Network::Mainnet => WIF_VERSION_MAINNET,
            Network::Testnet => WIF_VERSION_TESTNET,
        }
    }
}

/// OutPoint: 𝒪 = ℍ × ℕ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    /// Previous transaction hash in internal byte order
    pub hash: Hash,
    pub index: u32,
}

/// Transaction Input: ℐ = 𝒪 × 𝕊 × ℕ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub prevout: OutPoint,
    pub script_sig: ByteString,
    pub sequence: u32,
}

/// Transaction Output: 𝒯 = ℤ × 𝕊
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub value: i64,
    pub script_pubkey: ByteString,
}

/// Transaction: 𝒯𝒳 = ℕ × ℐ* × 𝒯* × ℕ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: u32,
}

/// UTXO: an unspent output referenced by outpoint, supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub outpoint: OutPoint,
    pub value: i64,
    pub script_pubkey: ByteString,
}

impl Utxo {
    pub fn new(tx_hash: Hash, index: u32, value: i64, script_pubkey: ByteString) -> Self {
        Utxo {
            outpoint: OutPoint { hash: tx_hash, index },
            value,
            script_pubkey,
        }
    }
}
