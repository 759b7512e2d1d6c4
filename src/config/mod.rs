//! Deployment configuration of a collection
//!
//! ```json
//! {
//!   "workchain": 0,
//!   "owner": "EQ...",
//!   "next_item_index": 0,
//!   "collection_content": "https://example.com/collection.json",
//!   "common_content": "https://example.com/items/",
//!   "royalty": { "factor": 100, "base": 200 },
//!   "mining": { "pow_complexity": "0x1000...", "target_delta": 900,
//!               "min_complexity": 240, "max_complexity": 252 }
//! }
//! ```


use crate::giver::data::{DEFAULT_MAX_COMPLEXITY, DEFAULT_MIN_COMPLEXITY, DEFAULT_TARGET_DELTA};
use crate::giver::{GiverStorage, RoyaltyParams};
use crate::tvm::{Address, Cell};
use anyhow::{Context, Result, anyhow};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoyaltyConfig {
    pub factor: u16,
    pub base: u16,
    /// Defaults to the collection owner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningConfig {
    /// Hex threshold, `0x` prefix optional; defaults to `2^min_complexity`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pow_complexity: Option<String>,
    #[serde(default)]
    pub last_success: u32,
    /// Hex seed, `0x` prefix optional; defaults to zero
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
    #[serde(default = "default_target_delta")]
    pub target_delta: u32,
    #[serde(default = "default_min_complexity")]
    pub min_complexity: u8,
    #[serde(default = "default_max_complexity")]
    pub max_complexity: u8,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            pow_complexity: None,
            last_success: 0,
            seed: None,
            target_delta: DEFAULT_TARGET_DELTA,
            min_complexity: DEFAULT_MIN_COMPLEXITY,
            max_complexity: DEFAULT_MAX_COMPLEXITY,
        }
    }
}

fn default_target_delta() -> u32 {
    DEFAULT_TARGET_DELTA
}

fn default_min_complexity() -> u8 {
    DEFAULT_MIN_COMPLEXITY
}

fn default_max_complexity() -> u8 {
    DEFAULT_MAX_COMPLEXITY
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiverConfig {
    #[serde(default)]
    pub workchain: i8,
    pub owner: Address,
    #[serde(default)]
    pub next_item_index: u64,
    pub collection_content: String,
    pub common_content: String,
    pub royalty: RoyaltyConfig,
    #[serde(default)]
    pub mining: MiningConfig,
}

fn parse_hex(value: &str) -> Option<BigUint> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    BigUint::parse_bytes(digits.as_bytes(), 16)
}

impl FromStr for GiverConfig {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        serde_json::from_str(s)
    }
}

impl GiverConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        json.parse()
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// Builds the initial collection storage around the given item code
    pub fn to_storage(&self, item_code: Arc<Cell>) -> Result<GiverStorage> {
        let royalty_address = self.royalty.address.unwrap_or(self.owner);
        let mut builder = GiverStorage::builder(self.owner, item_code)
            .next_item_index(self.next_item_index)
            .collection_content(self.collection_content.clone())
            .common_content(self.common_content.clone())
            .royalty_params(RoyaltyParams::new(
                self.royalty.factor,
                self.royalty.base,
                royalty_address,
            ))
            .last_success(self.mining.last_success)
            .target_delta(self.mining.target_delta)
            .complexity_bounds(self.mining.min_complexity, self.mining.max_complexity);

        if let Some(complexity) = &self.mining.pow_complexity {
            let value = parse_hex(complexity)
                .ok_or_else(|| anyhow!("invalid pow_complexity {:?}", complexity))?;
            builder = builder.pow_complexity(value);
        }

        if let Some(seed) = &self.mining.seed {
            let value = parse_hex(seed)
                .and_then(|value| u128::try_from(value).ok())
                .ok_or_else(|| anyhow!("invalid seed {:?}", seed))?;
            builder = builder.seed(value);
        }

        Ok(builder.build()?)
    }
}
