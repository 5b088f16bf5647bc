//! Hash functions used by keys, addresses and transactions

use bitcoin_hashes::{sha256d as bh_sha256d, Hash as BitcoinHash};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::types::Hash;

/// SHA256(x)
pub fn sha256(data: &[u8]) -> Hash {
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&Sha256::digest(data));
    hash
}

/// SHA256(SHA256(x)), used for checksums, txids and sighashes
pub fn sha256d(data: &[u8]) -> Hash {
    let result = bh_sha256d::Hash::hash(data);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result[..]);
    hash
}

/// RIPEMD160(SHA256(x))
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha256_hash = Sha256::digest(data);
    let ripemd160_hash = Ripemd160::digest(sha256_hash);
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&ripemd160_hash);
    hash
}
