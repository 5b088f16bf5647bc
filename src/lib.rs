//! # btc-primitives
//!
//! Bitcoin cryptographic primitives built from first principles: secp256k1 arithmetic,
//! key derivation, ECDSA with RFC 6979 nonces, SEC/DER/Base58Check/WIF codecs, legacy
//! P2PKH and P2SH-multisig addresses, and a builder that signs and validates legacy
//! transactions against caller-supplied UTXOs.
//!
//! ## Layers
//!
//! - `field`, `curve`: 256-bit modular arithmetic and affine points over 𝔽ₚ
//! - `keys`, `ecdsa`: d ∈ [1, n-1], Q = d·G, (r, s) signatures
//! - `sec`, `der`, `base58`: byte and text encodings of keys and signatures
//! - `script`, `address`: scriptPubKey templates and their Base58Check addresses
//! - `serialize`, `transaction`, `builder`: wire format, sighash, validation and signing
//! - `service`: request/response handlers for a payment front end
//!
//! ## Design Principles
//!
//! 1. **Typed errors**: every fallible operation returns [`Result`] with a [`BitcoinError`]
//! 2. **Deterministic signing**: nonces come from RFC 6979, signatures are low-S
//! 3. **Validated construction**: private keys, public keys and points cannot be built
//!    outside their valid ranges
//!
//! ## Usage
//!
//! ```rust
//! use btc_primitives::BitcoinPrimitives;
//! use btc_primitives::types::Network;
//!
//! let btc = BitcoinPrimitives::new(Network::Testnet);
//! let (private_key, public_key) = btc.generate_key_pair().unwrap();
//! let address = btc.address(&public_key);
//! assert!(btc.validate_address(&address.to_string()).is_ok());
//!
//! let signature = btc.sign_message(&private_key, b"hello").unwrap();
//! assert!(btc.verify_message(&public_key, b"hello", &signature).unwrap());
//! ```

pub mod address;
pub mod base58;
pub mod builder;
pub mod config;
pub mod constants;
pub mod curve;
pub mod der;
pub mod ecdsa;
pub mod error;
pub mod field;
pub mod hash;
pub mod keys;
pub mod script;
pub mod sec;
pub mod serialize;
pub mod service;
pub mod transaction;
pub mod types;

pub use address::{Address, AddressKind};
pub use builder::{BuilderState, TransactionBuilder};
pub use config::BuilderConfig;
pub use curve::{Curve, Point};
pub use ecdsa::Signature;
pub use error::{BitcoinError, CurveError, Result};
pub use field::U256;
pub use keys::{PrivateKey, PublicKey};
pub use serialize::{Decodable, Encodable};
pub use types::*;

/// Entry point bundling the primitives for one network
///
/// # Examples
///
/// ```
/// use btc_primitives::BitcoinPrimitives;
/// use btc_primitives::types::Network;
///
/// let btc = BitcoinPrimitives::new(Network::Mainnet);
/// let wif = "KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgd9M7rFU73sVHnoWn";
/// let key = btc.private_key_from_wif(wif).unwrap();
/// let address = btc.address(&key.public_key().unwrap());
/// assert_eq!(address.to_string(), "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BitcoinPrimitives {
    network: Network,
}

impl BitcoinPrimitives {
    pub fn new(network: Network) -> Self {
        BitcoinPrimitives { network }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Fresh key pair from the operating system RNG
    pub fn generate_key_pair(&self) -> Result<(PrivateKey, PublicKey)> {
        keys::generate_key_pair()
    }

    /// Compressed P2PKH address for `public_key`
    pub fn address(&self, public_key: &PublicKey) -> Address {
        Address::p2pkh(public_key, self.network)
    }

    /// Parse an address, requiring it to belong to this network
    ///
    /// # Examples
    ///
    /// ```
    /// use btc_primitives::{BitcoinPrimitives, BitcoinError};
    /// use btc_primitives::types::Network;
    ///
    /// let testnet = BitcoinPrimitives::new(Network::Testnet);
    /// let result = testnet.validate_address("1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH");
    /// assert!(matches!(result, Err(BitcoinError::InvalidAddress(_))));
    /// ```
    pub fn validate_address(&self, address: &str) -> Result<Address> {
        address::validate_address(address, self.network)
    }

    /// m-of-n P2SH multisig address over compressed keys
    pub fn create_multisig_address(
        &self,
        public_keys: &[PublicKey],
        threshold: usize,
    ) -> Result<Address> {
        address::create_multisig_address(public_keys, threshold, self.network)
    }

    /// ECDSA over SHA-256(message)
    pub fn sign_message(&self, key: &PrivateKey, message: &[u8]) -> Result<Signature> {
        ecdsa::sign(key, message)
    }

    pub fn verify_message(
        &self,
        public_key: &PublicKey,
        message: &[u8],
        signature: &Signature,
    ) -> Result<bool> {
        ecdsa::verify(public_key, message, signature)
    }

    /// Compressed WIF for this network
    pub fn private_key_to_wif(&self, key: &PrivateKey) -> String {
        key.to_wif(true, self.network)
    }

    /// Decode WIF, rejecting keys for the other network
    pub fn private_key_from_wif(&self, wif: &str) -> Result<PrivateKey> {
        let (key, _, network) = PrivateKey::from_wif(wif)?;
        if network != self.network {
            return Err(BitcoinError::InvalidPrivateKey(format!(
                "WIF is for {:?}, expected {:?}",
                network, self.network
            )));
        }
        Ok(key)
    }

    /// Builder using the default configuration for this network
    pub fn transaction_builder(&self) -> TransactionBuilder {
        TransactionBuilder::new(BuilderConfig {
            network: self.network,
            ..BuilderConfig::default()
        })
    }

    /// Full validation of a signed transaction; returns the fee
    pub fn validate_transaction(&self, tx: &Transaction, utxos: &[Utxo]) -> Result<i64> {
        transaction::validate_transaction(tx, utxos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wif_network_enforced() {
        let mainnet = BitcoinPrimitives::new(Network::Mainnet);
        let testnet = BitcoinPrimitives::new(Network::Testnet);
        let key = PrivateKey::new(U256::from_u64(42)).unwrap();
        let wif = mainnet.private_key_to_wif(&key);
        assert_eq!(mainnet.private_key_from_wif(&wif).unwrap().to_bytes(), key.to_bytes());
        assert!(matches!(
            testnet.private_key_from_wif(&wif),
            Err(BitcoinError::InvalidPrivateKey(_))
        ));
    }

    #[test]
    fn test_builder_inherits_network() {
        let btc = BitcoinPrimitives::new(Network::Testnet);
        assert_eq!(btc.transaction_builder().config().network, Network::Testnet);
    }
}
