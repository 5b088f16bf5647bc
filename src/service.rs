//! Request/response types and handlers for a payment-service front end
//!
//! An HTTP layer decodes JSON into these requests and serializes the responses; handlers
//! here are pure calls into the key, address and signature modules.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::address::{
    create_multisig_address, validate_address as parse_for_network, Address, AddressKind,
};
use crate::der::decode_der;
use crate::ecdsa::{sign, verify};
use crate::error::{BitcoinError, Result};
use crate::keys::{generate_key_pair, PrivateKey, PublicKey};
use crate::types::Network;

fn default_compressed() -> bool {
    true
}

/// Request to create a new single-key wallet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWalletRequest {
    #[serde(default)]
    pub network: Network,
    /// Use compressed SEC for the address (default true)
    #[serde(default = "default_compressed")]
    pub compressed: bool,
}

impl Default for CreateWalletRequest {
    fn default() -> Self {
        CreateWalletRequest {
            network: Network::Mainnet,
            compressed: default_compressed(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletResponse {
    pub address: String,
    pub public_key: String,
    pub private_key_wif: String,
    pub network: Network,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateAddressRequest {
    pub address: String,
    #[serde(default)]
    pub network: Network,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateAddressResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_type: Option<AddressKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMultisigRequest {
    /// Hex SEC public keys (compressed or uncompressed)
    pub public_keys: Vec<String>,
    pub threshold: usize,
    #[serde(default)]
    pub network: Network,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultisigResponse {
    pub address: String,
    pub redeem_script: String,
    pub threshold: usize,
    pub total_keys: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignMessageRequest {
    pub private_key_wif: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignMessageResponse {
    /// DER signature, hex
    pub signature: String,
    pub public_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyMessageRequest {
    pub public_key: String,
    pub message: String,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyMessageResponse {
    pub valid: bool,
}

/// Generate a key pair and its P2PKH address
pub fn create_wallet(request: &CreateWalletRequest) -> Result<WalletResponse> {
    let (private_key, public_key) = generate_key_pair()?;
    let address = if request.compressed {
        Address::p2pkh(&public_key, request.network)
    } else {
        Address::p2pkh_uncompressed(&public_key, request.network)
    };
    debug!(%address, network = ?request.network, "created wallet");
    Ok(WalletResponse {
        address: address.to_string(),
        public_key: public_key.to_hex(request.compressed),
        private_key_wif: private_key.to_wif(request.compressed, request.network),
        network: request.network,
    })
}

/// Invalid addresses are a normal response, not an error
pub fn validate_address(request: &ValidateAddressRequest) -> ValidateAddressResponse {
    match parse_for_network(&request.address, request.network) {
        Ok(address) => ValidateAddressResponse {
            valid: true,
            address_type: Some(address.kind()),
            error: None,
        },
        Err(e) => {
            trace!(error = %e, "address rejected");
            ValidateAddressResponse {
                valid: false,
                address_type: None,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Decode hex SEC keys
pub fn parse_public_keys(keys: &[String]) -> Result<Vec<PublicKey>> {
    keys.iter()
        .enumerate()
        .map(|(i, key)| {
            PublicKey::from_hex(key)
                .map_err(|e| BitcoinError::InvalidPublicKey(format!("key {}: {}", i, e)))
        })
        .collect()
}

pub fn create_multisig(request: &CreateMultisigRequest) -> Result<MultisigResponse> {
    let public_keys = parse_public_keys(&request.public_keys)?;
    let address = create_multisig_address(&public_keys, request.threshold, request.network)?;
    let redeem_script = address
        .redeem_script()
        .ok_or_else(|| {
            BitcoinError::InvalidState("multisig address without redeem script".to_string())
        })?;
    debug!(%address, threshold = request.threshold, keys = public_keys.len(), "created multisig");
    Ok(MultisigResponse {
        address: address.to_string(),
        redeem_script: hex::encode(redeem_script),
        threshold: request.threshold,
        total_keys: public_keys.len(),
    })
}

/// ECDSA over SHA-256(message), returned as DER hex
pub fn sign_message(request: &SignMessageRequest) -> Result<SignMessageResponse> {
    let (private_key, compressed, _) = PrivateKey::from_wif(&request.private_key_wif)?;
    let signature = sign(&private_key, request.message.as_bytes())?;
    let public_key = private_key.public_key()?;
    trace!(message_len = request.message.len(), "signed message");
    Ok(SignMessageResponse {
        signature: hex::encode(signature.to_der()),
        public_key: public_key.to_hex(compressed),
    })
}

pub fn verify_message(request: &VerifyMessageRequest) -> Result<VerifyMessageResponse> {
    let public_key = PublicKey::from_hex(&request.public_key)?;
    let der = hex::decode(request.signature.trim())
        .map_err(|e| BitcoinError::InvalidEncoding(format!("signature hex: {}", e)))?;
    let signature = decode_der(&der)?;
    let valid = verify(&public_key, request.message.as_bytes(), &signature)?;
    trace!(valid, "verified message");
    Ok(VerifyMessageResponse { valid })
}
