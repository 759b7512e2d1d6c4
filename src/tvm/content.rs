//! Token content encodings
//!
//! Off-chain content is a one-byte tag followed by the URI bytes, stored as a
//! snake: the payload is cut into 127-byte chunks, one chunk per cell, each
//! cell linking the next through its first reference.

use crate::tvm::builder::{Builder, MAX_CELL_BYTES};
use crate::tvm::cell::Cell;
use crate::tvm::error::{EncodingError, Result};
use crate::tvm::slice::Slice;
use std::sync::Arc;

/// Tag marking off-chain (URI) content
pub const OFFCHAIN_CONTENT_PREFIX: u8 = 0x01;

/// Tag marking on-chain (dictionary) content
pub const ONCHAIN_CONTENT_PREFIX: u8 = 0x00;

/// Encodes raw bytes as a snake cell chain
pub fn encode_snake_bytes(bytes: &[u8]) -> Result<Arc<Cell>> {
    let mut tail: Option<Arc<Cell>> = None;

    // Build from the last chunk so every cell is finished before it is referenced
    let chunks: Vec<&[u8]> = if bytes.is_empty() {
        vec![bytes]
    } else {
        bytes.chunks(MAX_CELL_BYTES).collect()
    };
    for chunk in chunks.into_iter().rev() {
        let mut builder = Builder::new();
        builder.store_bytes(chunk)?;
        if let Some(next) = tail.take() {
            builder.store_ref(next)?;
        }
        tail = Some(builder.build()?);
    }

    tail.ok_or_else(|| EncodingError::InvalidContent("empty chunk list".to_string()))
}

/// Decodes a snake cell chain back into bytes
pub fn decode_snake_bytes(cell: &Arc<Cell>) -> Result<Vec<u8>> {
    Slice::new(cell.clone()).load_snake_bytes()
}

/// Encodes a UTF-8 string as a snake cell chain (no tag)
pub fn encode_snake_string(s: &str) -> Result<Arc<Cell>> {
    encode_snake_bytes(s.as_bytes())
}

/// Decodes a snake cell chain into a UTF-8 string
pub fn decode_snake_string(cell: &Arc<Cell>) -> Result<String> {
    Slice::new(cell.clone()).load_snake_string()
}

/// Encodes an off-chain content URI
pub fn encode_offchain_content(uri: &str) -> Result<Arc<Cell>> {
    let mut payload = Vec::with_capacity(uri.len() + 1);
    payload.push(OFFCHAIN_CONTENT_PREFIX);
    payload.extend_from_slice(uri.as_bytes());
    encode_snake_bytes(&payload)
}

/// Decodes an off-chain content URI, rejecting any other content layout
pub fn decode_offchain_content(cell: &Arc<Cell>) -> Result<String> {
    let payload = decode_snake_bytes(cell)?;
    match payload.split_first() {
        Some((&OFFCHAIN_CONTENT_PREFIX, uri)) => String::from_utf8(uri.to_vec())
            .map_err(|e| EncodingError::InvalidContent(format!("invalid UTF-8: {}", e))),
        Some((&ONCHAIN_CONTENT_PREFIX, _)) => Err(EncodingError::InvalidContent(
            "on-chain content is not supported".to_string(),
        )),
        Some((tag, _)) => Err(EncodingError::InvalidContent(format!(
            "unknown content tag 0x{:02x}",
            tag
        ))),
        None => Err(EncodingError::InvalidContent("empty content".to_string())),
    }
}
