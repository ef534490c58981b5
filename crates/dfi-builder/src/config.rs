//! Builder configuration.
//!
//! Loaded from TOML; every field has a default:
//!
//! ```toml
//! network = "testnet"
//! fee_per_byte = 1.0
//! use_node_fee_rate = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use dfi_script::Network;
use dfi_transaction::FeeRate;

use crate::BuildError;

/// Default fee rate in smallest units per byte.
const DEFAULT_FEE_PER_BYTE: f64 = 1.0;

/// Settings shared by every transaction a builder produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Network addresses are parsed and rendered for.
    #[serde(default = "default_values::network")]
    pub network: Network,

    /// Fee rate used when the node supplies none.
    #[serde(default = "default_values::fee_per_byte")]
    pub fee_per_byte: FeeRate,

    /// Ask the node for a fee estimate before each build.
    #[serde(default)]
    pub use_node_fee_rate: bool,
}

impl BuilderConfig {
    pub fn new(network: Network, fee_per_byte: FeeRate) -> Self {
        BuilderConfig { network, fee_per_byte, use_node_fee_rate: false }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, BuildError> {
        toml::from_str(s).map_err(|e| BuildError::InvalidConfig(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, BuildError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| BuildError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String, BuildError> {
        toml::to_string(self).map_err(|e| BuildError::InvalidConfig(e.to_string()))
    }
}

impl Default for BuilderConfig {
    fn default() -> Self {
        BuilderConfig {
            network: default_values::network(),
            fee_per_byte: default_values::fee_per_byte(),
            use_node_fee_rate: false,
        }
    }
}

mod default_values {
    use super::*;

    pub(super) fn network() -> Network {
        Network::Mainnet
    }

    pub(super) fn fee_per_byte() -> FeeRate {
        FeeRate::new(DEFAULT_FEE_PER_BYTE).unwrap_or(FeeRate::ZERO)
    }
}
