//! The proof-of-work NFT collection ("giver")
//!
//! - data: storage layout, royalty and mining parameters, storage builder
//! - messages: opcode table, body builders and the request parser
//! - mining: threshold comparison and rescale policies
//! - contract: the collection state machine and its getters
//! - miner: off-chain search for mine messages

pub mod contract;
pub mod data;
pub mod error;
pub mod messages;
pub mod miner;
pub mod mining;

pub use contract::{CollectionData, GiverContract, ITEM_DEPLOY_AMOUNT};
pub use data::{GiverStorage, GiverStorageBuilder, MiningData, RoyaltyParams};
pub use error::GiverError;
pub use messages::{
    ChangeOwnerParams, CollectionRequest, EditContentParams, MineParams, RescaleParams,
};
pub use miner::{Solution, find_solution, mine_parallel};
pub use mining::{RescalePolicy, ShiftRescale, hash_to_uint, satisfies};
