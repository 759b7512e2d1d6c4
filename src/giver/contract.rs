use crate::giver::data::{GiverStorage, MiningData, RoyaltyParams};
use crate::giver::messages::{self, CollectionRequest};
use crate::giver::mining::{RescalePolicy, ShiftRescale, hash_to_uint};
use crate::item::ItemStorage;
use crate::protocol::{
    Contract, ExitCode, MessageContext, OutboundMessage, Outcome, Rejection,
    SEND_MODE_CARRY_REMAINING_VALUE, SEND_MODE_PAY_FEES_SEPARATELY, apply_atomically,
};
use crate::tvm::error::Result;
use crate::tvm::{Address, Cell, StateInit, decode_snake_string, encode_offchain_content};
use num_bigint::BigUint;
use std::sync::Arc;

/// Value attached to every item deploy message, nanotons
pub const ITEM_DEPLOY_AMOUNT: u128 = 50_000_000;

/// Snapshot returned by the `get_collection_data` getter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionData {
    pub next_item_index: u64,
    pub collection_content: String,
    pub owner_address: Address,
}

/// The proof-of-work NFT collection
#[derive(Debug, Clone)]
pub struct GiverContract {
    address: Address,
    state_init: StateInit,
    storage: GiverStorage,
    rescale_policy: Arc<dyn RescalePolicy>,
}

impl GiverContract {
    /// Deploys the collection with the given code and initial storage
    pub fn deploy(code: Arc<Cell>, storage: GiverStorage, workchain: i8) -> Result<Self> {
        let state_init = StateInit::new(code, storage.to_cell()?);
        let address = state_init.address(workchain)?;
        Ok(Self {
            address,
            state_init,
            storage,
            rescale_policy: Arc::new(ShiftRescale::default()),
        })
    }

    /// Replaces the policy used to ease the threshold on rescale
    pub fn with_rescale_policy(mut self, policy: Arc<dyn RescalePolicy>) -> Self {
        self.rescale_policy = policy;
        self
    }

    pub fn storage(&self) -> &GiverStorage {
        &self.storage
    }

    pub fn collection_data(&self) -> CollectionData {
        CollectionData {
            next_item_index: self.storage.next_item_index,
            collection_content: self.storage.collection_content.clone(),
            owner_address: self.storage.owner_address,
        }
    }

    pub fn item_state_init(&self, index: u64) -> Result<StateInit> {
        ItemStorage::state_init(&self.storage.item_code, index, &self.address)
    }

    pub fn nft_address_by_index(&self, index: u64) -> Result<Address> {
        self.item_state_init(index)?.address(self.address.workchain)
    }

    /// Full content URI of an item: common content followed by the individual content
    ///
    /// The index does not take part; it is kept for parity with the on-chain getter.
    pub fn nft_content(&self, _index: u64, individual_content: &Arc<Cell>) -> Result<String> {
        let individual = decode_snake_string(individual_content)?;
        Ok(format!("{}{}", self.storage.common_content, individual))
    }

    /// Same as [`Self::nft_content`], as an off-chain content cell
    pub fn nft_content_cell(&self, index: u64, individual_content: &Arc<Cell>) -> Result<Arc<Cell>> {
        encode_offchain_content(&self.nft_content(index, individual_content)?)
    }

    pub fn royalty_params(&self) -> &RoyaltyParams {
        &self.storage.royalty_params
    }

    pub fn mining_data(&self) -> &MiningData {
        &self.storage.mining
    }

    pub fn data_cell(&self) -> Result<Arc<Cell>> {
        self.storage.to_cell()
    }
}

fn ensure_owner(storage: &GiverStorage, ctx: &MessageContext) -> std::result::Result<(), Rejection> {
    if ctx.sender != storage.owner_address {
        return Err(Rejection::new(
            ExitCode::NotOwner,
            format!("{} is not the collection owner", ctx.sender),
        ));
    }
    Ok(())
}

fn ensure_not_expired(ctx: &MessageContext, expire: u32) -> std::result::Result<(), Rejection> {
    if ctx.now > expire {
        return Err(Rejection::new(
            ExitCode::MessageExpired,
            format!("message expired at {}, now {}", expire, ctx.now),
        ));
    }
    Ok(())
}

/// Threshold after an accepted mine: the winning hash plus one
///
/// Bounds are not applied here. A hash of `2^256 - 1` keeps the threshold at
/// the largest value that fits the 256-bit storage field.
pub(crate) fn next_complexity(hash: BigUint) -> BigUint {
    let limit = (BigUint::from(1u8) << 256usize) - 1u8;
    (hash + 1u8).min(limit)
}

fn mine(
    storage: &mut GiverStorage,
    ctx: &MessageContext,
    body: &Arc<Cell>,
    collection_address: &Address,
    expire: u32,
    mint_to: Option<Address>,
) -> std::result::Result<Vec<OutboundMessage>, Rejection> {
    ensure_not_expired(ctx, expire)?;

    let mint_to = mint_to
        .ok_or_else(|| Rejection::new(ExitCode::InvalidAddress, "mint_to is addr_none"))?;

    let hash = hash_to_uint(&body.hash());
    if hash <= storage.mining.pow_complexity {
        return Err(Rejection::new(
            ExitCode::PowNotSatisfied,
            format!(
                "hash {:x} does not exceed complexity {:x}",
                hash, storage.mining.pow_complexity
            ),
        ));
    }

    let index = storage.next_item_index;
    let state_init = ItemStorage::state_init(&storage.item_code, index, collection_address)?;
    let destination = state_init.address(collection_address.workchain)?;
    let deploy_body = crate::item::messages::deploy(&mint_to, Arc::new(Cell::new()))?;

    storage.next_item_index = index
        .checked_add(1)
        .ok_or_else(|| Rejection::new(ExitCode::IntegerOverflow, "item index exhausted"))?;
    storage.mining.last_success = ctx.now;
    storage.mining.pow_complexity = next_complexity(hash);

    log::debug!("Mined item #{} for {} at {}", index, mint_to, destination);

    Ok(vec![OutboundMessage {
        destination,
        amount: ITEM_DEPLOY_AMOUNT,
        bounce: true,
        mode: SEND_MODE_PAY_FEES_SEPARATELY,
        state_init: Some(state_init),
        body: deploy_body,
    }])
}

fn rescale(
    storage: &mut GiverStorage,
    ctx: &MessageContext,
    policy: &dyn RescalePolicy,
    expire: u32,
) -> std::result::Result<Vec<OutboundMessage>, Rejection> {
    let mining = &mut storage.mining;
    let elapsed = (ctx.now as u64).saturating_sub(mining.last_success as u64);
    if elapsed < mining.rescale_interval() {
        return Err(Rejection::new(
            ExitCode::RescaleTooEarly,
            format!(
                "{}s since last success, rescale allowed after {}s",
                elapsed,
                mining.rescale_interval()
            ),
        ));
    }
    ensure_not_expired(ctx, expire)?;

    mining.pow_complexity = mining.clamp(policy.ease(&mining.pow_complexity));
    mining.last_success = ctx.now;

    log::debug!("Complexity rescaled to {:x}", mining.pow_complexity);
    Ok(Vec::new())
}

fn handle(
    storage: &mut GiverStorage,
    ctx: &MessageContext,
    body: &Arc<Cell>,
    collection_address: &Address,
    policy: &dyn RescalePolicy,
) -> std::result::Result<Vec<OutboundMessage>, Rejection> {
    match CollectionRequest::parse(body)? {
        CollectionRequest::TopUp => Ok(Vec::new()),
        CollectionRequest::Mine {
            expire, mint_to, ..
        } => mine(storage, ctx, body, collection_address, expire, mint_to),
        CollectionRequest::RescaleComplexity { expire, .. } => {
            rescale(storage, ctx, policy, expire)
        }
        CollectionRequest::ChangeOwner { new_owner, .. } => {
            ensure_owner(storage, ctx)?;
            storage.owner_address = new_owner;
            Ok(Vec::new())
        }
        CollectionRequest::EditContent {
            collection_content,
            common_content,
            royalty_params,
            ..
        } => {
            ensure_owner(storage, ctx)?;
            storage.collection_content = collection_content;
            storage.common_content = common_content;
            storage.royalty_params = royalty_params;
            Ok(Vec::new())
        }
        CollectionRequest::GetRoyaltyParams { query_id } => Ok(vec![OutboundMessage {
            destination: ctx.sender,
            amount: 0,
            bounce: false,
            mode: SEND_MODE_CARRY_REMAINING_VALUE,
            state_init: None,
            body: messages::royalty_params_response(query_id, &storage.royalty_params)?,
        }]),
    }
}

impl Contract for GiverContract {
    fn address(&self) -> Address {
        self.address
    }

    fn state_init(&self) -> &StateInit {
        &self.state_init
    }

    fn receive_internal(&mut self, ctx: &MessageContext, body: &Arc<Cell>) -> Outcome {
        let address = self.address;
        let policy = self.rescale_policy.clone();
        apply_atomically(&mut self.storage, |storage| {
            handle(storage, ctx, body, &address, policy.as_ref())
        })
    }
}
