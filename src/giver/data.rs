//! Collection storage layout
//!
//! ```text
//! default#_ royalty_factor:uint16 royalty_base:uint16 royalty_address:MsgAddress = RoyaltyParams;
//!
//! storage#_ owner_address:MsgAddress next_item_index:uint64
//!   ^[collection_content:^Cell common_content:^Cell]
//!   nft_item_code:^Cell
//!   royalty_params:^RoyaltyParams
//!   pow_complexity:uint256 last_success:uint32 seed:uint128
//!   target_delta:uint32 min_complexity:uint8 max_complexity:uint8
//!   = Storage;
//! ```

use crate::giver::error::GiverError;
use crate::tvm::error::Result;
use crate::tvm::{
    Address, Builder, Cell, Slice, decode_offchain_content, decode_snake_string,
    encode_offchain_content, encode_snake_string,
};
use num_bigint::BigUint;
use std::sync::Arc;

/// The threshold may be eased once no solution arrived for `target_delta * 16` seconds
pub const RESCALE_INTERVAL_MULTIPLIER: u64 = 16;

/// Default target interval between solutions
pub const DEFAULT_TARGET_DELTA: u32 = 15 * 60;

pub const DEFAULT_MIN_COMPLEXITY: u8 = 240;
pub const DEFAULT_MAX_COMPLEXITY: u8 = 252;

/// Royalty owed on secondary sales: `factor / base` of the price goes to `address`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoyaltyParams {
    pub factor: u16,
    pub base: u16,
    pub address: Address,
}

impl RoyaltyParams {
    pub fn new(factor: u16, base: u16, address: Address) -> Self {
        Self {
            factor,
            base,
            address,
        }
    }

    pub fn store(&self, builder: &mut Builder) -> Result<()> {
        builder.store_uint(self.factor as u64, 16)?;
        builder.store_uint(self.base as u64, 16)?;
        builder.store_address(Some(&self.address))?;
        Ok(())
    }

    pub fn load(slice: &mut Slice) -> Result<Self> {
        Ok(Self {
            factor: slice.load_u16()?,
            base: slice.load_u16()?,
            address: slice.load_std_address()?,
        })
    }

    pub fn to_cell(&self) -> Result<Arc<Cell>> {
        let mut builder = Builder::new();
        self.store(&mut builder)?;
        builder.build()
    }

    pub fn from_cell(cell: &Arc<Cell>) -> Result<Self> {
        Self::load(&mut Slice::new(cell.clone()))
    }
}

/// Proof-of-work parameters of the collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningData {
    /// A mine message is accepted when its hash is strictly greater than this value
    pub pow_complexity: BigUint,
    /// Unix time of the last accepted mint or rescale
    pub last_success: u32,
    pub seed: u128,
    /// Target seconds between solutions
    pub target_delta: u32,
    pub min_complexity: u8,
    pub max_complexity: u8,
}

impl MiningData {
    /// Smallest allowed threshold, `2^min_complexity`
    pub fn lower_bound(&self) -> BigUint {
        BigUint::from(1u8) << self.min_complexity as usize
    }

    /// Largest allowed threshold, `2^max_complexity`
    pub fn upper_bound(&self) -> BigUint {
        BigUint::from(1u8) << self.max_complexity as usize
    }

    /// Clamps a threshold into `[2^min_complexity, 2^max_complexity]`
    pub fn clamp(&self, value: BigUint) -> BigUint {
        let lower = self.lower_bound();
        let upper = self.upper_bound();
        if value < lower {
            lower
        } else if value > upper {
            upper
        } else {
            value
        }
    }

    /// Seconds without a solution after which the threshold may be eased
    pub fn rescale_interval(&self) -> u64 {
        self.target_delta as u64 * RESCALE_INTERVAL_MULTIPLIER
    }

    pub fn store(&self, builder: &mut Builder) -> Result<()> {
        builder.store_biguint(&self.pow_complexity, 256)?;
        builder.store_u32(self.last_success)?;
        builder.store_u128(self.seed, 128)?;
        builder.store_u32(self.target_delta)?;
        builder.store_uint(self.min_complexity as u64, 8)?;
        builder.store_uint(self.max_complexity as u64, 8)?;
        Ok(())
    }

    pub fn load(slice: &mut Slice) -> Result<Self> {
        Ok(Self {
            pow_complexity: slice.load_biguint(256)?,
            last_success: slice.load_u32()?,
            seed: slice.load_u128(128)?,
            target_delta: slice.load_u32()?,
            min_complexity: slice.load_uint(8)? as u8,
            max_complexity: slice.load_uint(8)? as u8,
        })
    }
}

/// Persistent state of the collection contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiverStorage {
    pub owner_address: Address,
    pub next_item_index: u64,
    /// Off-chain URI of the collection metadata
    pub collection_content: String,
    /// Prefix prepended to every item's individual content
    pub common_content: String,
    pub item_code: Arc<Cell>,
    pub royalty_params: RoyaltyParams,
    pub mining: MiningData,
}

impl GiverStorage {
    /// Starts a storage builder with default content, royalty and mining parameters
    pub fn builder(owner_address: Address, item_code: Arc<Cell>) -> GiverStorageBuilder {
        GiverStorageBuilder::new(owner_address, item_code)
    }

    /// Builds the `^[collection_content common_content]` cell
    pub fn content_cell(collection_content: &str, common_content: &str) -> Result<Arc<Cell>> {
        let mut builder = Builder::new();
        builder.store_ref(encode_offchain_content(collection_content)?)?;
        builder.store_ref(encode_snake_string(common_content)?)?;
        builder.build()
    }

    /// Parses the content cell back into (collection content, common content)
    pub fn parse_content_cell(cell: &Arc<Cell>) -> Result<(String, String)> {
        let mut slice = Slice::new(cell.clone());
        let collection_content = decode_offchain_content(&slice.load_reference()?)?;
        let common_content = decode_snake_string(&slice.load_reference()?)?;
        Ok((collection_content, common_content))
    }

    /// Serializes the storage into the contract data cell
    pub fn to_cell(&self) -> Result<Arc<Cell>> {
        let mut builder = Builder::new();
        builder.store_address(Some(&self.owner_address))?;
        builder.store_u64(self.next_item_index)?;
        builder.store_ref(Self::content_cell(
            &self.collection_content,
            &self.common_content,
        )?)?;
        builder.store_ref(self.item_code.clone())?;
        builder.store_ref(self.royalty_params.to_cell()?)?;
        self.mining.store(&mut builder)?;
        builder.build()
    }

    /// Parses a contract data cell
    pub fn from_cell(cell: &Arc<Cell>) -> Result<Self> {
        let mut slice = Slice::new(cell.clone());

        let owner_address = slice.load_std_address()?;
        let next_item_index = slice.load_u64()?;
        let (collection_content, common_content) =
            Self::parse_content_cell(&slice.load_reference()?)?;
        let item_code = slice.load_reference()?;
        let royalty_params = RoyaltyParams::from_cell(&slice.load_reference()?)?;
        let mining = MiningData::load(&mut slice)?;

        Ok(Self {
            owner_address,
            next_item_index,
            collection_content,
            common_content,
            item_code,
            royalty_params,
            mining,
        })
    }
}

/// Builder for [`GiverStorage`]
///
/// Every `build` call returns an independent value; nothing is shared between
/// storages produced from clones of the same builder except the immutable item code.
#[derive(Debug, Clone)]
pub struct GiverStorageBuilder {
    owner_address: Address,
    item_code: Arc<Cell>,
    next_item_index: u64,
    collection_content: String,
    common_content: String,
    royalty_params: Option<RoyaltyParams>,
    pow_complexity: Option<BigUint>,
    last_success: u32,
    seed: u128,
    target_delta: u32,
    min_complexity: u8,
    max_complexity: u8,
}

impl GiverStorageBuilder {
    pub fn new(owner_address: Address, item_code: Arc<Cell>) -> Self {
        Self {
            owner_address,
            item_code,
            next_item_index: 0,
            collection_content: String::new(),
            common_content: String::new(),
            royalty_params: None,
            pow_complexity: None,
            last_success: 0,
            seed: 0,
            target_delta: DEFAULT_TARGET_DELTA,
            min_complexity: DEFAULT_MIN_COMPLEXITY,
            max_complexity: DEFAULT_MAX_COMPLEXITY,
        }
    }

    pub fn next_item_index(mut self, index: u64) -> Self {
        self.next_item_index = index;
        self
    }

    pub fn collection_content(mut self, content: impl Into<String>) -> Self {
        self.collection_content = content.into();
        self
    }

    pub fn common_content(mut self, content: impl Into<String>) -> Self {
        self.common_content = content.into();
        self
    }

    pub fn royalty_params(mut self, royalty_params: RoyaltyParams) -> Self {
        self.royalty_params = Some(royalty_params);
        self
    }

    /// Initial threshold; defaults to `2^min_complexity`
    pub fn pow_complexity(mut self, complexity: BigUint) -> Self {
        self.pow_complexity = Some(complexity);
        self
    }

    pub fn last_success(mut self, last_success: u32) -> Self {
        self.last_success = last_success;
        self
    }

    pub fn seed(mut self, seed: u128) -> Self {
        self.seed = seed;
        self
    }

    pub fn target_delta(mut self, target_delta: u32) -> Self {
        self.target_delta = target_delta;
        self
    }

    pub fn complexity_bounds(mut self, min_complexity: u8, max_complexity: u8) -> Self {
        self.min_complexity = min_complexity;
        self.max_complexity = max_complexity;
        self
    }

    /// Validates the bounds and clamps the initial threshold into them
    pub fn build(self) -> std::result::Result<GiverStorage, GiverError> {
        if self.min_complexity > self.max_complexity {
            return Err(GiverError::InvalidComplexityBounds {
                min: self.min_complexity,
                max: self.max_complexity,
            });
        }

        let royalty_params = self
            .royalty_params
            .unwrap_or_else(|| RoyaltyParams::new(0, 1000, self.owner_address));

        let mut mining = MiningData {
            pow_complexity: BigUint::default(),
            last_success: self.last_success,
            seed: self.seed,
            target_delta: self.target_delta,
            min_complexity: self.min_complexity,
            max_complexity: self.max_complexity,
        };
        mining.pow_complexity = match self.pow_complexity {
            Some(complexity) => mining.clamp(complexity),
            None => mining.lower_bound(),
        };

        Ok(GiverStorage {
            owner_address: self.owner_address,
            next_item_index: self.next_item_index,
            collection_content: self.collection_content,
            common_content: self.common_content,
            item_code: self.item_code,
            royalty_params,
            mining,
        })
    }
}
