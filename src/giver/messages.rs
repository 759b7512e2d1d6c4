//! Collection message bodies
//!
//! Builders turn parameter structs into body cells; [`CollectionRequest::parse`]
//! reads the same bodies back on the receiving side.

use crate::giver::data::{GiverStorage, RoyaltyParams};
use crate::protocol::{ExitCode, Rejection};
use crate::tvm::error::Result;
use crate::tvm::{Address, Builder, Cell, Slice};
use num_bigint::BigUint;
use std::sync::Arc;

pub const OP_CHANGE_OWNER: u32 = 3;
pub const OP_EDIT_CONTENT: u32 = 4;
pub const OP_GET_ROYALTY_PARAMS: u32 = 0x693d3950;
pub const OP_GET_ROYALTY_PARAMS_RESPONSE: u32 = 0xa8cb00ad;
pub const OP_MINE: u32 = 0x4d696e65;
pub const OP_RESCALE_COMPLEXITY: u32 = 0x5253636c;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeOwnerParams {
    pub query_id: Option<u64>,
    pub new_owner: Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditContentParams {
    pub query_id: Option<u64>,
    pub collection_content: String,
    pub common_content: String,
    pub royalty_params: RoyaltyParams,
}

/// Parameters of a mine message
///
/// `data1` is the free nonce searched by miners; `data2` defaults to `data1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MineParams {
    pub expire: u32,
    pub mint_to: Address,
    pub data1: BigUint,
    pub seed: u128,
    pub data2: Option<BigUint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RescaleParams {
    pub query_id: Option<u64>,
    pub expire: u32,
}

pub fn change_owner(params: &ChangeOwnerParams) -> Result<Arc<Cell>> {
    let mut builder = Builder::new();
    builder.store_u32(OP_CHANGE_OWNER)?;
    builder.store_u64(params.query_id.unwrap_or(0))?;
    builder.store_address(Some(&params.new_owner))?;
    builder.build()
}

pub fn edit_content(params: &EditContentParams) -> Result<Arc<Cell>> {
    let mut builder = Builder::new();
    builder.store_u32(OP_EDIT_CONTENT)?;
    builder.store_u64(params.query_id.unwrap_or(0))?;
    builder.store_ref(GiverStorage::content_cell(
        &params.collection_content,
        &params.common_content,
    )?)?;
    builder.store_ref(params.royalty_params.to_cell()?)?;
    builder.build()
}

pub fn get_royalty_params(query_id: Option<u64>) -> Result<Arc<Cell>> {
    let mut builder = Builder::new();
    builder.store_u32(OP_GET_ROYALTY_PARAMS)?;
    builder.store_u64(query_id.unwrap_or(0))?;
    builder.build()
}

pub fn royalty_params_response(query_id: u64, royalty_params: &RoyaltyParams) -> Result<Arc<Cell>> {
    let mut builder = Builder::new();
    builder.store_u32(OP_GET_ROYALTY_PARAMS_RESPONSE)?;
    builder.store_u64(query_id)?;
    royalty_params.store(&mut builder)?;
    builder.build()
}

pub fn mine(params: &MineParams) -> Result<Arc<Cell>> {
    let data2 = params.data2.as_ref().unwrap_or(&params.data1);

    let mut builder = Builder::new();
    builder.store_u32(OP_MINE)?;
    builder.store_u32(params.expire)?;
    builder.store_address(Some(&params.mint_to))?;
    builder.store_biguint(&params.data1, 256)?;
    builder.store_u128(params.seed, 128)?;
    builder.store_biguint(data2, 256)?;
    builder.build()
}

pub fn rescale_complexity(params: &RescaleParams) -> Result<Arc<Cell>> {
    let mut builder = Builder::new();
    builder.store_u32(OP_RESCALE_COMPLEXITY)?;
    builder.store_u64(params.query_id.unwrap_or(0))?;
    builder.store_u32(params.expire)?;
    builder.build()
}

/// A parsed inbound collection message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionRequest {
    /// Empty body, plain value transfer
    TopUp,
    ChangeOwner {
        query_id: u64,
        new_owner: Address,
    },
    EditContent {
        query_id: u64,
        collection_content: String,
        common_content: String,
        royalty_params: RoyaltyParams,
    },
    GetRoyaltyParams {
        query_id: u64,
    },
    Mine {
        expire: u32,
        /// `None` when the body carries `addr_none`
        mint_to: Option<Address>,
        data1: BigUint,
        seed: u128,
        data2: BigUint,
    },
    RescaleComplexity {
        query_id: u64,
        expire: u32,
    },
}

impl CollectionRequest {
    pub fn parse(body: &Arc<Cell>) -> std::result::Result<Self, Rejection> {
        let mut slice = Slice::new(body.clone());
        if slice.is_empty() && slice.remaining_refs() == 0 {
            return Ok(CollectionRequest::TopUp);
        }

        let op = slice.load_u32()?;
        let request = match op {
            OP_CHANGE_OWNER => CollectionRequest::ChangeOwner {
                query_id: slice.load_u64()?,
                new_owner: slice.load_std_address()?,
            },
            OP_EDIT_CONTENT => {
                let query_id = slice.load_u64()?;
                let (collection_content, common_content) =
                    GiverStorage::parse_content_cell(&slice.load_reference()?)?;
                let royalty_params = RoyaltyParams::from_cell(&slice.load_reference()?)?;
                CollectionRequest::EditContent {
                    query_id,
                    collection_content,
                    common_content,
                    royalty_params,
                }
            }
            OP_GET_ROYALTY_PARAMS => CollectionRequest::GetRoyaltyParams {
                query_id: slice.load_u64()?,
            },
            OP_MINE => CollectionRequest::Mine {
                expire: slice.load_u32()?,
                mint_to: slice.load_address()?,
                data1: slice.load_biguint(256)?,
                seed: slice.load_u128(128)?,
                data2: slice.load_biguint(256)?,
            },
            OP_RESCALE_COMPLEXITY => CollectionRequest::RescaleComplexity {
                query_id: slice.load_u64()?,
                expire: slice.load_u32()?,
            },
            other => {
                return Err(Rejection::new(
                    ExitCode::UnknownOp,
                    format!("unknown collection op 0x{:08x}", other),
                ));
            }
        };

        Ok(request)
    }
}
