//! Item storage layout
//!
//! ```text
//! init#_ index:uint64 collection_address:MsgAddress = ItemInit;
//! storage#_ index:uint64 collection_address:MsgAddress
//!   owner_address:MsgAddress content:^Cell editor_address:MsgAddress = Storage;
//! ```
//!
//! An item is deployed with the short `init` form, so its address depends only
//! on the item code, the collection and the index. The collection fills in the
//! owner and content with the first message.

use crate::tvm::error::Result;
use crate::tvm::{Address, Builder, Cell, Slice, StateInit};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemStorage {
    pub index: u64,
    pub collection_address: Address,
    pub owner_address: Option<Address>,
    pub content: Option<Arc<Cell>>,
    pub editor_address: Option<Address>,
}

impl ItemStorage {
    /// Storage of an item that has been deployed but not initialised yet
    pub fn uninitialized(index: u64, collection_address: Address) -> Self {
        Self {
            index,
            collection_address,
            owner_address: None,
            content: None,
            editor_address: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.owner_address.is_some()
    }

    /// Builds the state init data an item is deployed with
    pub fn init_data(index: u64, collection_address: &Address) -> Result<Arc<Cell>> {
        let mut builder = Builder::new();
        builder.store_u64(index)?;
        builder.store_address(Some(collection_address))?;
        builder.build()
    }

    /// Builds the state init of the item `index` of a collection
    pub fn state_init(
        item_code: &Arc<Cell>,
        index: u64,
        collection_address: &Address,
    ) -> Result<StateInit> {
        Ok(StateInit::new(
            item_code.clone(),
            Self::init_data(index, collection_address)?,
        ))
    }

    pub fn to_cell(&self) -> Result<Arc<Cell>> {
        let (owner, content) = match (&self.owner_address, &self.content) {
            (Some(owner), Some(content)) => (owner, content),
            _ => return Self::init_data(self.index, &self.collection_address),
        };

        let mut builder = Builder::new();
        builder.store_u64(self.index)?;
        builder.store_address(Some(&self.collection_address))?;
        builder.store_address(Some(owner))?;
        builder.store_ref(content.clone())?;
        builder.store_address(self.editor_address.as_ref())?;
        builder.build()
    }

    /// Parses either the short init form or the full storage form
    pub fn from_cell(cell: &Arc<Cell>) -> Result<Self> {
        let mut slice = Slice::new(cell.clone());
        let index = slice.load_u64()?;
        let collection_address = slice.load_std_address()?;
        let mut storage = Self::uninitialized(index, collection_address);

        if slice.is_empty() {
            return Ok(storage);
        }

        storage.owner_address = Some(slice.load_std_address()?);
        storage.content = Some(slice.load_reference()?);
        if !slice.is_empty() {
            storage.editor_address = slice.load_address()?;
        }

        Ok(storage)
    }
}
