//! Error types for key handling, codecs and transaction validation

use thiserror::Error;

/// Failures of the curve arithmetic engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurveError {
    #[error("Point is not on the curve")]
    InvalidPoint,

    #[error("Coordinate outside the field [0, p)")]
    CoordinateOutOfRange,

    #[error("Modular inverse of zero")]
    DegenerateInverse,

    #[error("Operands belong to different curves")]
    CurveMismatch,

    #[error("Invalid curve parameters: {0}")]
    InvalidParameters(String),

    #[error("No square root exists for the given x coordinate")]
    NoSquareRoot,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BitcoinError {
    #[error("Curve error: {0}")]
    Curve(#[from] CurveError),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("Checksum mismatch")]
    ChecksumMismatch,

    #[error("Invalid threshold {threshold} for {keys} public keys")]
    InvalidThreshold { threshold: usize, keys: usize },

    #[error("Malformed script: {0}")]
    MalformedScript(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Insufficient funds: available {available}, required {required}")]
    InsufficientFunds { available: i64, required: i64 },

    #[error("Signature invalid for input {input}")]
    SignatureInvalid { input: usize },

    #[error("UTXO mismatch: {0}")]
    UtxoMismatch(String),

    #[error("Transaction validation failed: {0}")]
    InvalidTransaction(String),

    #[error("Operation not allowed in builder state {0}")]
    InvalidState(String),

    #[error("No private key controls input {input}")]
    MissingPrivateKey { input: usize },

    #[error("Unsupported sighash type 0x{0:02x}")]
    UnsupportedSighash(u8),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, BitcoinError>;
