//! Legacy P2PKH and P2SH addresses
//!
//! address = Base58Check(version || hash160(payload)), where the payload is the SEC public
//! key for P2PKH and the redeem script for P2SH.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::base58;
use crate::error::{BitcoinError, Result};
use crate::hash::hash160;
use crate::keys::PublicKey;
use crate::script::{
    classify_script, multisig_redeem_script, p2pkh_script_pubkey, p2sh_script_pubkey,
    ScriptTemplate,
};
use crate::types::{ByteString, Network};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    P2pkh,
    P2sh,
}

/// The keys a P2SH multisig address was built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultisigInfo {
    pub threshold: usize,
    pub public_keys: Vec<PublicKey>,
}

#[derive(Debug, Clone)]
pub struct Address {
    kind: AddressKind,
    hash: [u8; 20],
    network: Network,
    multisig: Option<MultisigInfo>,
}

impl PartialEq for Address {
    // multisig metadata only reconstructs the redeem script
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.hash == other.hash && self.network == other.network
    }
}

impl Eq for Address {}

impl Address {
    /// P2PKH over the compressed SEC encoding
    pub fn p2pkh(public_key: &PublicKey, network: Network) -> Self {
        Self::p2pkh_from_hash(hash160(&public_key.to_sec_compressed()), network)
    }

    /// P2PKH over the uncompressed SEC encoding
    pub fn p2pkh_uncompressed(public_key: &PublicKey, network: Network) -> Self {
        Self::p2pkh_from_hash(hash160(&public_key.to_sec_uncompressed()), network)
    }

    pub fn p2pkh_from_hash(hash: [u8; 20], network: Network) -> Self {
        Address {
            kind: AddressKind::P2pkh,
            hash,
            network,
            multisig: None,
        }
    }

    pub fn p2sh_from_hash(hash: [u8; 20], network: Network) -> Self {
        Address {
            kind: AddressKind::P2sh,
            hash,
            network,
            multisig: None,
        }
    }

    /// P2SH wrapping an m-of-n CHECKMULTISIG redeem script
    pub fn multisig(public_keys: &[PublicKey], threshold: usize, network: Network) -> Result<Self> {
        let redeem_script = multisig_redeem_script(threshold, public_keys)?;
        debug!(
            threshold,
            keys = public_keys.len(),
            script_len = redeem_script.len(),
            "built multisig redeem script"
        );
        Ok(Address {
            kind: AddressKind::P2sh,
            hash: hash160(&redeem_script),
            network,
            multisig: Some(MultisigInfo {
                threshold,
                public_keys: public_keys.to_vec(),
            }),
        })
    }

    /// Decode a Base58Check address, recovering kind and network from the version byte.
    ///
    /// Checksum failures keep their own error; everything else is `InvalidAddress`.
    pub fn parse(s: &str) -> Result<Self> {
        let payload = match base58::decode_check(s.trim()) {
            Ok(payload) => payload,
            Err(BitcoinError::ChecksumMismatch) => return Err(BitcoinError::ChecksumMismatch),
            Err(e) => return Err(BitcoinError::InvalidAddress(e.to_string())),
        };
        if payload.len() != 21 {
            return Err(BitcoinError::InvalidAddress(format!(
                "payload must be 21 bytes, got {}",
                payload.len()
            )));
        }
        let (kind, network) = match payload[0] {
            v if v == Network::Mainnet.p2pkh_version() => (AddressKind::P2pkh, Network::Mainnet),
            v if v == Network::Testnet.p2pkh_version() => (AddressKind::P2pkh, Network::Testnet),
            v if v == Network::Mainnet.p2sh_version() => (AddressKind::P2sh, Network::Mainnet),
            v if v == Network::Testnet.p2sh_version() => (AddressKind::P2sh, Network::Testnet),
            v => {
                return Err(BitcoinError::InvalidAddress(format!(
                    "unknown version byte 0x{:02x}",
                    v
                )))
            }
        };
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&payload[1..]);
        Ok(Address {
            kind,
            hash,
            network,
            multisig: None,
        })
    }

    /// Recover the address a P2PKH or P2SH scriptPubKey pays to
    pub fn from_script_pubkey(script_pubkey: &[u8], network: Network) -> Result<Self> {
        match classify_script(script_pubkey) {
            ScriptTemplate::P2pkh { hash } => Ok(Self::p2pkh_from_hash(hash, network)),
            ScriptTemplate::P2sh { hash } => Ok(Self::p2sh_from_hash(hash, network)),
            other => Err(BitcoinError::InvalidAddress(format!(
                "script is not P2PKH or P2SH: {:?}",
                other
            ))),
        }
    }

    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    pub fn hash(&self) -> &[u8; 20] {
        &self.hash
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn multisig_info(&self) -> Option<&MultisigInfo> {
        self.multisig.as_ref()
    }

    fn version(&self) -> u8 {
        match self.kind {
            AddressKind::P2pkh => self.network.p2pkh_version(),
            AddressKind::P2sh => self.network.p2sh_version(),
        }
    }

    pub fn script_pubkey(&self) -> ByteString {
        match self.kind {
            AddressKind::P2pkh => p2pkh_script_pubkey(&self.hash),
            AddressKind::P2sh => p2sh_script_pubkey(&self.hash),
        }
    }

    /// Redeem script of a multisig address built locally; `None` for parsed addresses
    pub fn redeem_script(&self) -> Option<ByteString> {
        let info = self.multisig.as_ref()?;
        multisig_redeem_script(info.threshold, &info.public_keys).ok()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut payload = Vec::with_capacity(21);
        payload.push(self.version());
        payload.extend_from_slice(&self.hash);
        f.write_str(&base58::encode_check(&payload))
    }
}

impl FromStr for Address {
    type Err = BitcoinError;

    fn from_str(s: &str) -> Result<Self> {
        Address::parse(s)
    }
}

/// CreateMultisigAddress(pubkeys, threshold, network)
pub fn create_multisig_address(
    public_keys: &[PublicKey],
    threshold: usize,
    network: Network,
) -> Result<Address> {
    Address::multisig(public_keys, threshold, network)
}

/// Parse an address and require it to belong to `network`
pub fn validate_address(s: &str, network: Network) -> Result<Address> {
    let address = Address::parse(s)?;
    if address.network != network {
        return Err(BitcoinError::InvalidAddress(format!(
            "address is for {:?}, expected {:?}",
            address.network, network
        )));
    }
    Ok(address)
}
