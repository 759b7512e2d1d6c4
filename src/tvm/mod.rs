//! TVM data structures
//!
//! - Cell: up to 1023 bits and up to 4 references, identified by its representation hash
//! - Slice: a reader for sequentially accessing cell data
//! - Builder: cell construction with addresses, coins, big integers and snake data
//! - BoC: Bag of Cells transport format
//! - Address: standard addresses and their text forms
//! - Content: off-chain content and snake string encodings
//! - StateInit: deployable code + data and address derivation

pub mod address;
pub mod boc;
pub mod builder;
pub mod cell;
pub mod content;
pub mod error;
pub mod slice;
pub mod state_init;
#[cfg(test)]
mod tests;

pub use address::Address;
pub use boc::{
    base64_to_boc, boc_to_base64, boc_to_hex, deserialize_boc, hex_to_boc, serialize_boc,
};
pub use builder::{Builder, MAX_CELL_BYTES};
pub use cell::{Cell, CellBuilder, MAX_CELL_BITS, MAX_CELL_REFS};
pub use content::{
    decode_offchain_content, decode_snake_bytes, decode_snake_string, encode_offchain_content,
    encode_snake_bytes, encode_snake_string,
};
pub use error::EncodingError;
pub use slice::Slice;
pub use state_init::{StateInit, contract_address};
