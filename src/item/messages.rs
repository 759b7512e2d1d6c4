//! Item message bodies

use crate::giver::RoyaltyParams;
use crate::protocol::{ExitCode, Rejection};
use crate::tvm::error::Result;
use crate::tvm::{Address, Builder, Cell, Slice, encode_offchain_content};
use num_bigint::BigUint;
use std::sync::Arc;

pub const OP_TRANSFER: u32 = 0x5fcc3d14;
pub const OP_OWNERSHIP_ASSIGNED: u32 = 0x05138d91;
pub const OP_EXCESSES: u32 = 0xd53276db;
pub const OP_GET_STATIC_DATA: u32 = 0x2fcb26a2;
pub const OP_REPORT_STATIC_DATA: u32 = 0x8b771735;
pub const OP_EDIT_CONTENT: u32 = 0x1a0b9d51;
pub const OP_TRANSFER_EDITORSHIP: u32 = 0x1c04412a;
pub const OP_EDITORSHIP_ASSIGNED: u32 = 0x511a4463;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferParams {
    pub query_id: Option<u64>,
    pub new_owner: Address,
    pub response_to: Option<Address>,
    pub forward_amount: Option<u128>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEditorshipParams {
    pub query_id: Option<u64>,
    pub new_editor: Address,
    pub response_to: Option<Address>,
    pub forward_amount: Option<u128>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditItemContentParams {
    pub query_id: Option<u64>,
    pub content: String,
    pub royalty_params: RoyaltyParams,
}

fn store_transfer_like(
    builder: &mut Builder,
    op: u32,
    query_id: Option<u64>,
    target: &Address,
    response_to: Option<&Address>,
    forward_amount: Option<u128>,
) -> Result<()> {
    builder.store_u32(op)?;
    builder.store_u64(query_id.unwrap_or(0))?;
    builder.store_address(Some(target))?;
    builder.store_address(response_to)?;
    // no custom payload
    builder.store_bit(false)?;
    builder.store_coins(forward_amount.unwrap_or(0))?;
    // empty inline forward payload
    builder.store_bit(false)?;
    Ok(())
}

pub fn transfer(params: &TransferParams) -> Result<Arc<Cell>> {
    let mut builder = Builder::new();
    store_transfer_like(
        &mut builder,
        OP_TRANSFER,
        params.query_id,
        &params.new_owner,
        params.response_to.as_ref(),
        params.forward_amount,
    )?;
    builder.build()
}

pub fn transfer_editorship(params: &TransferEditorshipParams) -> Result<Arc<Cell>> {
    let mut builder = Builder::new();
    store_transfer_like(
        &mut builder,
        OP_TRANSFER_EDITORSHIP,
        params.query_id,
        &params.new_editor,
        params.response_to.as_ref(),
        params.forward_amount,
    )?;
    builder.build()
}

pub fn get_static_data(query_id: Option<u64>) -> Result<Arc<Cell>> {
    let mut builder = Builder::new();
    builder.store_u32(OP_GET_STATIC_DATA)?;
    builder.store_u64(query_id.unwrap_or(0))?;
    builder.build()
}

pub fn edit_content(params: &EditItemContentParams) -> Result<Arc<Cell>> {
    let mut builder = Builder::new();
    builder.store_u32(OP_EDIT_CONTENT)?;
    builder.store_u64(params.query_id.unwrap_or(0))?;
    builder.store_ref(encode_offchain_content(&params.content)?)?;
    builder.store_ref(params.royalty_params.to_cell()?)?;
    builder.build()
}

/// Body the collection sends along with the item state init
pub fn deploy(owner: &Address, content: Arc<Cell>) -> Result<Arc<Cell>> {
    let mut builder = Builder::new();
    builder.store_address(Some(owner))?;
    builder.store_ref(content)?;
    builder.build()
}

pub fn report_static_data(query_id: u64, index: u64, collection: &Address) -> Result<Arc<Cell>> {
    let mut builder = Builder::new();
    builder.store_u32(OP_REPORT_STATIC_DATA)?;
    builder.store_u64(query_id)?;
    builder.store_biguint(&BigUint::from(index), 256)?;
    builder.store_address(Some(collection))?;
    builder.build()
}

fn assigned(
    op: u32,
    query_id: u64,
    previous: &Address,
    forward_payload: Option<Arc<Cell>>,
) -> Result<Arc<Cell>> {
    let mut builder = Builder::new();
    builder.store_u32(op)?;
    builder.store_u64(query_id)?;
    builder.store_address(Some(previous))?;
    builder.store_maybe_ref(forward_payload)?;
    builder.build()
}

pub fn ownership_assigned(
    query_id: u64,
    prev_owner: &Address,
    forward_payload: Option<Arc<Cell>>,
) -> Result<Arc<Cell>> {
    assigned(OP_OWNERSHIP_ASSIGNED, query_id, prev_owner, forward_payload)
}

pub fn editorship_assigned(
    query_id: u64,
    prev_editor: &Address,
    forward_payload: Option<Arc<Cell>>,
) -> Result<Arc<Cell>> {
    assigned(OP_EDITORSHIP_ASSIGNED, query_id, prev_editor, forward_payload)
}

pub fn excesses(query_id: u64) -> Result<Arc<Cell>> {
    let mut builder = Builder::new();
    builder.store_u32(OP_EXCESSES)?;
    builder.store_u64(query_id)?;
    builder.build()
}

/// Common fields of transfer and transfer_editorship
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handover {
    pub query_id: u64,
    pub target: Address,
    pub response_to: Option<Address>,
    pub forward_amount: u128,
    /// Set when the payload was passed by reference
    pub forward_payload: Option<Arc<Cell>>,
}

impl Handover {
    fn load(slice: &mut Slice) -> std::result::Result<Self, Rejection> {
        let query_id = slice.load_u64()?;
        let target = slice.load_std_address()?;
        let response_to = slice.load_address()?;
        // custom payload is ignored
        slice.load_maybe_ref()?;
        let forward_amount = slice.load_coins()?;
        let forward_payload = if slice.is_empty() {
            None
        } else if slice.load_bit()? {
            Some(slice.load_reference()?)
        } else {
            None
        };

        Ok(Self {
            query_id,
            target,
            response_to,
            forward_amount,
            forward_payload,
        })
    }
}

/// A parsed inbound item message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemRequest {
    TopUp,
    Transfer(Handover),
    GetStaticData { query_id: u64 },
    EditContent { query_id: u64, content: Arc<Cell> },
    TransferEditorship(Handover),
}

impl ItemRequest {
    pub fn parse(body: &Arc<Cell>) -> std::result::Result<Self, Rejection> {
        let mut slice = Slice::new(body.clone());
        if slice.is_empty() && slice.remaining_refs() == 0 {
            return Ok(ItemRequest::TopUp);
        }

        let op = slice.load_u32()?;
        let request = match op {
            OP_TRANSFER => ItemRequest::Transfer(Handover::load(&mut slice)?),
            OP_TRANSFER_EDITORSHIP => ItemRequest::TransferEditorship(Handover::load(&mut slice)?),
            OP_GET_STATIC_DATA => ItemRequest::GetStaticData {
                query_id: slice.load_u64()?,
            },
            OP_EDIT_CONTENT => ItemRequest::EditContent {
                query_id: slice.load_u64()?,
                content: slice.load_reference()?,
            },
            other => {
                return Err(Rejection::new(
                    ExitCode::UnknownOp,
                    format!("unknown item op 0x{:08x}", other),
                ));
            }
        };

        Ok(request)
    }
}
