//! Transaction builder configuration

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{BitcoinError, Result};
use crate::types::Network;

/// Settings applied to every transaction a [`crate::builder::TransactionBuilder`] produces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    pub network: Network,
    pub version: u32,
    pub lock_time: u32,
    /// nSequence written to every input
    pub sequence: u32,
    /// Change at or below this many satoshis is left to the fee
    pub dust_threshold: i64,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        BuilderConfig {
            network: Network::Mainnet,
            version: DEFAULT_TX_VERSION,
            lock_time: 0,
            sequence: SEQUENCE_FINAL,
            dust_threshold: DEFAULT_DUST_THRESHOLD,
        }
    }
}

impl BuilderConfig {
    pub fn mainnet() -> Self {
        BuilderConfig::default()
    }

    pub fn testnet() -> Self {
        BuilderConfig {
            network: Network::Testnet,
            ..BuilderConfig::default()
        }
    }

    /// Parse from JSON; absent fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: BuilderConfig =
            serde_json::from_str(json).map_err(|e| BitcoinError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| BitcoinError::InvalidConfig(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.dust_threshold < 0 || self.dust_threshold > MAX_MONEY {
            return Err(BitcoinError::InvalidConfig(format!(
                "dust threshold {} outside [0, MAX_MONEY]",
                self.dust_threshold
            )));
        }
        Ok(())
    }
}
