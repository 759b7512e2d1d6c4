//! NFT items deployed by the collection
//!
//! An item starts uninitialised and accepts only its collection's first
//! message, which sets the owner and content. After that it handles
//! transfers, static data queries and editorship.

pub mod contract;
pub mod data;
pub mod messages;
#[cfg(test)]
mod tests;

pub use contract::{ItemContract, NftData};
pub use data::ItemStorage;
pub use messages::{
    EditItemContentParams, Handover, ItemRequest, TransferEditorshipParams, TransferParams,
};
