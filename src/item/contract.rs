use crate::item::data::ItemStorage;
use crate::item::messages::{self, Handover, ItemRequest};
use crate::protocol::{
    Contract, ExitCode, MessageContext, OutboundMessage, Outcome, Rejection,
    SEND_MODE_CARRY_REMAINING_VALUE, SEND_MODE_PAY_FEES_SEPARATELY, apply_atomically,
};
use crate::tvm::error::Result;
use crate::tvm::{Address, Cell, Slice, StateInit};
use std::sync::Arc;

/// Snapshot returned by the `get_nft_data` getter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftData {
    pub initialized: bool,
    pub index: u64,
    pub collection_address: Address,
    pub owner_address: Option<Address>,
    pub content: Option<Arc<Cell>>,
}

/// An item spawned by the collection
#[derive(Debug, Clone)]
pub struct ItemContract {
    address: Address,
    state_init: StateInit,
    storage: ItemStorage,
}

impl ItemContract {
    /// Deploys an item from the state init the collection attached to its deploy message
    pub fn deploy(state_init: StateInit, workchain: i8) -> Result<Self> {
        let storage = ItemStorage::from_cell(&state_init.data)?;
        let address = state_init.address(workchain)?;
        Ok(Self {
            address,
            state_init,
            storage,
        })
    }

    pub fn storage(&self) -> &ItemStorage {
        &self.storage
    }

    pub fn nft_data(&self) -> NftData {
        NftData {
            initialized: self.storage.is_initialized(),
            index: self.storage.index,
            collection_address: self.storage.collection_address,
            owner_address: self.storage.owner_address,
            content: self.storage.content.clone(),
        }
    }

    pub fn editor(&self) -> Option<Address> {
        self.storage.editor_address
    }

    pub fn data_cell(&self) -> Result<Arc<Cell>> {
        self.storage.to_cell()
    }
}

fn initialize(
    storage: &mut ItemStorage,
    ctx: &MessageContext,
    body: &Arc<Cell>,
) -> std::result::Result<Vec<OutboundMessage>, Rejection> {
    if ctx.sender != storage.collection_address {
        return Err(Rejection::new(
            ExitCode::NotInitialized,
            format!("item {} is not initialized", storage.index),
        ));
    }

    let mut slice = Slice::new(body.clone());
    storage.owner_address = Some(slice.load_std_address()?);
    storage.content = Some(slice.load_reference()?);
    if !slice.is_empty() {
        storage.editor_address = slice.load_address()?;
    }

    log::debug!(
        "Item #{} initialized for {:?}",
        storage.index,
        storage.owner_address
    );
    Ok(Vec::new())
}

/// Notification to the new holder and excesses back to the response address
fn handover_messages(
    ctx: &MessageContext,
    handover: &Handover,
    previous: &Address,
    notify: fn(u64, &Address, Option<Arc<Cell>>) -> Result<Arc<Cell>>,
) -> std::result::Result<Vec<OutboundMessage>, Rejection> {
    let mut out_messages = Vec::new();

    if handover.forward_amount > 0 {
        out_messages.push(OutboundMessage {
            destination: handover.target,
            amount: handover.forward_amount,
            bounce: false,
            mode: SEND_MODE_PAY_FEES_SEPARATELY,
            state_init: None,
            body: notify(
                handover.query_id,
                previous,
                handover.forward_payload.clone(),
            )?,
        });
    }

    if let Some(response_to) = handover.response_to {
        out_messages.push(OutboundMessage {
            destination: response_to,
            amount: ctx.value.saturating_sub(handover.forward_amount),
            bounce: false,
            mode: SEND_MODE_PAY_FEES_SEPARATELY,
            state_init: None,
            body: messages::excesses(handover.query_id)?,
        });
    }

    Ok(out_messages)
}

fn handle(
    storage: &mut ItemStorage,
    ctx: &MessageContext,
    body: &Arc<Cell>,
) -> std::result::Result<Vec<OutboundMessage>, Rejection> {
    let owner = match storage.owner_address {
        Some(owner) => owner,
        None => return initialize(storage, ctx, body),
    };

    match ItemRequest::parse(body)? {
        ItemRequest::TopUp => Ok(Vec::new()),
        ItemRequest::Transfer(handover) => {
            if ctx.sender != owner {
                return Err(Rejection::new(ExitCode::NotOwner, "transfer by non-owner"));
            }
            let out_messages =
                handover_messages(ctx, &handover, &owner, messages::ownership_assigned)?;
            storage.owner_address = Some(handover.target);
            log::debug!("Item #{} transferred to {}", storage.index, handover.target);
            Ok(out_messages)
        }
        ItemRequest::GetStaticData { query_id } => Ok(vec![OutboundMessage {
            destination: ctx.sender,
            amount: 0,
            bounce: false,
            mode: SEND_MODE_CARRY_REMAINING_VALUE,
            state_init: None,
            body: messages::report_static_data(
                query_id,
                storage.index,
                &storage.collection_address,
            )?,
        }]),
        ItemRequest::EditContent { content, .. } => {
            if storage.editor_address != Some(ctx.sender) {
                return Err(Rejection::new(ExitCode::NotEditor, "edit by non-editor"));
            }
            storage.content = Some(content);
            Ok(Vec::new())
        }
        ItemRequest::TransferEditorship(handover) => {
            let editor = match storage.editor_address {
                Some(editor) if editor == ctx.sender => editor,
                _ => {
                    return Err(Rejection::new(
                        ExitCode::NotEditor,
                        "editorship transfer by non-editor",
                    ));
                }
            };
            let out_messages =
                handover_messages(ctx, &handover, &editor, messages::editorship_assigned)?;
            storage.editor_address = Some(handover.target);
            Ok(out_messages)
        }
    }
}

impl Contract for ItemContract {
    fn address(&self) -> Address {
        self.address
    }

    fn state_init(&self) -> &StateInit {
        &self.state_init
    }

    fn receive_internal(&mut self, ctx: &MessageContext, body: &Arc<Cell>) -> Outcome {
        apply_atomically(&mut self.storage, |storage| handle(storage, ctx, body))
    }
}
