//! Planner configuration

use crate::fees::{FeeCalculator, DEFAULT_FEE};
use crate::selection::SelectionStrategy;
use crate::Result;
use pirate_params::NetworkType;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Transfer planner configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Network whose address formats are accepted
    pub network: NetworkType,
    /// Fixed fee in arrrtoshis
    pub fee: u64,
    /// Note selection strategy
    pub selection_strategy: SelectionStrategy,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            network: NetworkType::Mainnet,
            fee: DEFAULT_FEE,
            selection_strategy: SelectionStrategy::LargestFirst,
        }
    }
}

impl PlannerConfig {
    /// Default configuration for `network`
    pub fn for_network(network: NetworkType) -> Self {
        Self {
            network,
            ..Self::default()
        }
    }

    /// Parse from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading planner config from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Serialize as pretty JSON
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the fee is within policy bounds
    pub fn validate(&self) -> Result<()> {
        FeeCalculator::validate_fee(self.fee)
    }

    /// Fee calculator for the configured fee
    pub fn fee_calculator(&self) -> Result<FeeCalculator> {
        FeeCalculator::with_fee(self.fee)
    }
}
