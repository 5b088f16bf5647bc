//! Bitcoin constants for keys, encodings and legacy transactions

use crate::field::U256;

/// secp256k1 field prime p = 2^256 - 2^32 - 977
pub const SECP256K1_P: U256 = U256::from_limbs([
    0xFFFF_FFFE_FFFF_FC2F,
    0xFFFF_FFFF_FFFF_FFFF,
    0xFFFF_FFFF_FFFF_FFFF,
    0xFFFF_FFFF_FFFF_FFFF,
]);

/// secp256k1 coefficient a
pub const SECP256K1_A: U256 = U256::ZERO;

/// secp256k1 coefficient b
pub const SECP256K1_B: U256 = U256::from_limbs([7, 0, 0, 0]);

/// secp256k1 generator x coordinate
pub const SECP256K1_GX: U256 = U256::from_limbs([
    0x59F2_815B_16F8_1798,
    0x029B_FCDB_2DCE_28D9,
    0x55A0_6295_CE87_0B07,
    0x79BE_667E_F9DC_BBAC,
]);

/// secp256k1 generator y coordinate
pub const SECP256K1_GY: U256 = U256::from_limbs([
    0x9C47_D08F_FB10_D4B8,
    0xFD17_B448_A685_5419,
    0x5DA4_FBFC_0E11_08A8,
    0x483A_DA77_26A3_C465,
]);

/// secp256k1 group order n
pub const SECP256K1_N: U256 = U256::from_limbs([
    0xBFD2_5E8C_D036_4141,
    0xBAAE_DCE6_AF48_A03B,
    0xFFFF_FFFF_FFFF_FFFE,
    0xFFFF_FFFF_FFFF_FFFF,
]);

/// n / 2, upper bound of a low-S signature
pub const SECP256K1_HALF_N: U256 = U256::from_limbs([
    0xDFE9_2F46_681B_20A0,
    0x5D57_6E73_57A4_501D,
    0xFFFF_FFFF_FFFF_FFFF,
    0x7FFF_FFFF_FFFF_FFFF,
]);

/// Version byte: P2PKH mainnet
pub const P2PKH_VERSION_MAINNET: u8 = 0x00;

/// Version byte: P2PKH testnet
pub const P2PKH_VERSION_TESTNET: u8 = 0x6F;

/// Version byte: P2SH mainnet
pub const P2SH_VERSION_MAINNET: u8 = 0x05;

/// Version byte: P2SH testnet
pub const P2SH_VERSION_TESTNET: u8 = 0xC4;

/// Version byte: WIF mainnet
pub const WIF_VERSION_MAINNET: u8 = 0x80;

/// Version byte: WIF testnet
pub const WIF_VERSION_TESTNET: u8 = 0xEF;

/// Trailing WIF byte marking a compressed public key
pub const WIF_COMPRESSED_FLAG: u8 = 0x01;

/// Length of a Base58Check checksum
pub const CHECKSUM_LEN: usize = 4;

/// Maximum money supply: 21,000,000 BTC in satoshis
pub const MAX_MONEY: i64 = 21_000_000 * 100_000_000;

/// Satoshis per BTC
pub const SATOSHIS_PER_BTC: i64 = 100_000_000;

/// Maximum serialized transaction size (1MB)
pub const MAX_TX_SIZE: usize = 1_000_000;

/// Maximum public keys in a bare OP_CHECKMULTISIG redeem script built with OP_N
pub const MAX_MULTISIG_KEYS: usize = 16;

/// Default dust threshold for P2PKH change outputs
pub const DEFAULT_DUST_THRESHOLD: i64 = 546;

/// Default transaction version
pub const DEFAULT_TX_VERSION: u32 = 1;

/// Sequence number for final transaction
pub const SEQUENCE_FINAL: u32 = 0xffffffff;

/// Sign all inputs and outputs
pub const SIGHASH_ALL: u8 = 0x01;

/// Sign inputs only
pub const SIGHASH_NONE: u8 = 0x02;

/// Sign the output at the same index as the input
pub const SIGHASH_SINGLE: u8 = 0x03;

/// Sign only the current input
pub const SIGHASH_ANYONECANPAY: u8 = 0x80;
