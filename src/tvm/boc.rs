//! Bag of Cells (BoC) serialization and deserialization
//!
//! BoC is the transport form of a cell tree. Cells are laid out so that every
//! reference points to a cell with a larger index (the root comes first), and
//! identical subtrees are stored once.

use crate::crc::CRC32C;
use crate::tvm::cell::{Cell, MAX_CELL_REFS};
use crate::tvm::error::{EncodingError, Result};
use base64::Engine;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// BoC magic number for the generic format
const BOC_GENERIC_MAGIC: u32 = 0xb5ee9c72;

/// Legacy indexed BoC magic numbers
const BOC_INDEXED_MAGIC: u32 = 0x68ff65f3;
const BOC_INDEXED_CRC32C_MAGIC: u32 = 0xacc3a728;

const FLAG_HAS_IDX: u8 = 0x80;
const FLAG_HAS_CRC32C: u8 = 0x40;
const FLAG_HAS_CACHE_BITS: u8 = 0x20;

fn invalid(msg: impl Into<String>) -> EncodingError {
    EncodingError::InvalidBoc(msg.into())
}

/// Serializes a cell tree into a Bag of Cells
pub fn serialize_boc(root: &Arc<Cell>, has_crc32: bool) -> Result<Vec<u8>> {
    let cells = collect_cells(root);

    let index: HashMap<[u8; 32], usize> = cells
        .iter()
        .enumerate()
        .map(|(idx, cell)| (cell.hash(), idx))
        .collect();

    let size_bytes = bytes_needed(cells.len());

    let mut serialized_cells = Vec::with_capacity(cells.len());
    for cell in &cells {
        serialized_cells.push(serialize_cell(cell, &index, size_bytes)?);
    }

    let cells_size: usize = serialized_cells.iter().map(|c| c.len()).sum();
    let offset_bytes = bytes_needed(cells_size);

    let mut result = Vec::with_capacity(16 + cells_size);
    result.extend_from_slice(&BOC_GENERIC_MAGIC.to_be_bytes());

    let flags = if has_crc32 { FLAG_HAS_CRC32C } else { 0 };
    result.push(flags | size_bytes as u8);
    result.push(offset_bytes as u8);

    write_uint(&mut result, cells.len(), size_bytes);
    // One root, no absent cells
    write_uint(&mut result, 1, size_bytes);
    write_uint(&mut result, 0, size_bytes);
    write_uint(&mut result, cells_size, offset_bytes);
    // Root index
    write_uint(&mut result, 0, size_bytes);

    for cell_data in serialized_cells {
        result.extend_from_slice(&cell_data);
    }

    if has_crc32 {
        let crc = CRC32C.checksum(&result);
        result.extend_from_slice(&crc.to_le_bytes());
    }

    Ok(result)
}

/// Deserializes a Bag of Cells into its root cell
pub fn deserialize_boc(data: &[u8]) -> Result<Arc<Cell>> {
    if data.len() < 4 {
        return Err(invalid("data too short"));
    }

    let magic = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
    match magic {
        BOC_GENERIC_MAGIC => deserialize_boc_generic(data),
        BOC_INDEXED_MAGIC | BOC_INDEXED_CRC32C_MAGIC => {
            Err(invalid("legacy indexed BoC format is not supported"))
        }
        _ => Err(invalid(format!("bad magic number 0x{:08x}", magic))),
    }
}

fn deserialize_boc_generic(data: &[u8]) -> Result<Arc<Cell>> {
    let mut pos = 4;

    let flags_and_size = read_byte(data, &mut pos)?;
    let has_idx = flags_and_size & FLAG_HAS_IDX != 0;
    let has_crc32 = flags_and_size & FLAG_HAS_CRC32C != 0;
    let has_cache_bits = flags_and_size & FLAG_HAS_CACHE_BITS != 0;
    let size_bytes = (flags_and_size & 0x07) as usize;

    if size_bytes == 0 || size_bytes > 4 {
        return Err(invalid(format!("bad size_bytes {}", size_bytes)));
    }
    if has_cache_bits && !has_idx {
        return Err(invalid("cache bits require an index"));
    }

    let offset_bytes = read_byte(data, &mut pos)? as usize;
    if offset_bytes == 0 || offset_bytes > 8 {
        return Err(invalid(format!("bad offset_bytes {}", offset_bytes)));
    }

    let cells_count = read_uint(data, &mut pos, size_bytes)?;
    let roots_count = read_uint(data, &mut pos, size_bytes)?;
    let absent_count = read_uint(data, &mut pos, size_bytes)?;
    let cells_size = read_uint(data, &mut pos, offset_bytes)?;

    if roots_count != 1 {
        return Err(invalid(format!(
            "expected exactly one root, found {}",
            roots_count
        )));
    }
    if absent_count != 0 {
        return Err(invalid("absent cells are not supported"));
    }
    if cells_count == 0 {
        return Err(invalid("no cells"));
    }
    // Every cell takes at least its two descriptor bytes
    if cells_count > cells_size / 2 {
        return Err(invalid(format!(
            "{} cells do not fit in {} bytes",
            cells_count, cells_size
        )));
    }

    let root_idx = read_uint(data, &mut pos, size_bytes)?;
    if root_idx >= cells_count {
        return Err(invalid(format!("root index {} out of range", root_idx)));
    }

    if has_idx {
        pos = cells_count
            .checked_mul(offset_bytes)
            .and_then(|index_size| pos.checked_add(index_size))
            .ok_or_else(|| invalid("index overflow"))?;
    }

    let cells_end = pos
        .checked_add(cells_size)
        .ok_or_else(|| invalid("cells size overflow"))?;
    let expected_len = cells_end + if has_crc32 { 4 } else { 0 };
    if data.len() < expected_len {
        return Err(invalid("unexpected end of data"));
    }
    if data.len() > expected_len {
        return Err(invalid("trailing bytes after cells"));
    }

    if has_crc32 {
        let expected_crc = u32::from_le_bytes([
            data[cells_end],
            data[cells_end + 1],
            data[cells_end + 2],
            data[cells_end + 3],
        ]);
        let actual_crc = CRC32C.checksum(&data[..cells_end]);
        if expected_crc != actual_crc {
            return Err(invalid(format!(
                "CRC32C mismatch: expected 0x{:08x}, got 0x{:08x}",
                expected_crc, actual_crc
            )));
        }
    }

    let cells = parse_cells(&data[pos..cells_end], cells_count, size_bytes)?;
    Ok(cells[root_idx].clone())
}

struct RawCell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<usize>,
}

fn parse_cells(data: &[u8], count: usize, size_bytes: usize) -> Result<Vec<Arc<Cell>>> {
    let mut raw_cells = Vec::with_capacity(count);
    let mut pos = 0;

    for idx in 0..count {
        let d1 = read_byte(data, &mut pos)?;
        let d2 = read_byte(data, &mut pos)?;

        let ref_count = (d1 & 0x07) as usize;
        if ref_count > MAX_CELL_REFS {
            return Err(invalid(format!("cell {} has {} references", idx, ref_count)));
        }
        if d1 & 0x08 != 0 {
            return Err(invalid(format!("cell {} is exotic", idx)));
        }
        if d1 & 0x10 != 0 {
            return Err(invalid(format!("cell {} carries stored hashes", idx)));
        }

        let data_size = (d2 as usize).div_ceil(2);
        if pos + data_size > data.len() {
            return Err(invalid("cell data exceeds buffer"));
        }
        let cell_data = data[pos..pos + data_size].to_vec();
        pos += data_size;

        let bit_len = if d2 % 2 == 0 {
            data_size * 8
        } else {
            // Partial last byte: strip the completion tag
            let last_byte = cell_data[data_size - 1];
            if last_byte == 0 {
                return Err(invalid(format!("cell {} misses its completion tag", idx)));
            }
            (data_size - 1) * 8 + 7 - last_byte.trailing_zeros() as usize
        };

        let mut refs = Vec::with_capacity(ref_count);
        for _ in 0..ref_count {
            let ref_idx = read_uint(data, &mut pos, size_bytes)?;
            if ref_idx <= idx || ref_idx >= count {
                return Err(invalid(format!(
                    "cell {} references cell {} out of order",
                    idx, ref_idx
                )));
            }
            refs.push(ref_idx);
        }

        raw_cells.push(RawCell {
            data: cell_data,
            bit_len,
            refs,
        });
    }

    if pos != data.len() {
        return Err(invalid("cells size does not match cell data"));
    }

    // References always point forward, so build from the last cell backwards
    let mut built: Vec<Option<Arc<Cell>>> = vec![None; count];
    for (idx, raw) in raw_cells.into_iter().enumerate().rev() {
        let references = raw
            .refs
            .iter()
            .map(|&r| built[r].clone().ok_or_else(|| invalid("unresolved reference")))
            .collect::<Result<Vec<_>>>()?;
        built[idx] = Some(Arc::new(Cell::with_references(
            raw.data,
            raw.bit_len,
            references,
        )?));
    }

    built
        .into_iter()
        .map(|c| c.ok_or_else(|| invalid("unresolved cell")))
        .collect()
}

fn serialize_cell(
    cell: &Arc<Cell>,
    index: &HashMap<[u8; 32], usize>,
    size_bytes: usize,
) -> Result<Vec<u8>> {
    let mut result = Vec::new();
    result.extend_from_slice(&cell.descriptors());
    result.extend_from_slice(&cell.serialize_data());

    for reference in cell.references() {
        let ref_idx = index
            .get(&reference.hash())
            .ok_or_else(|| invalid("reference not found in cell index"))?;
        write_uint(&mut result, *ref_idx, size_bytes);
    }

    Ok(result)
}

/// Orders cells root-first so that references always point forward
fn collect_cells(root: &Arc<Cell>) -> Vec<Arc<Cell>> {
    let mut cells = Vec::new();
    let mut visited = HashSet::new();
    collect_post_order(root, &mut cells, &mut visited);
    cells.reverse();
    cells
}

fn collect_post_order(
    cell: &Arc<Cell>,
    cells: &mut Vec<Arc<Cell>>,
    visited: &mut HashSet<[u8; 32]>,
) {
    if !visited.insert(cell.hash()) {
        return;
    }
    for reference in cell.references() {
        collect_post_order(reference, cells, visited);
    }
    cells.push(cell.clone());
}

fn bytes_needed(value: usize) -> usize {
    if value == 0 {
        return 1;
    }
    let bits = (usize::BITS - value.leading_zeros()) as usize;
    bits.div_ceil(8)
}

fn write_uint(buf: &mut Vec<u8>, value: usize, size: usize) {
    let bytes = (value as u64).to_be_bytes();
    buf.extend_from_slice(&bytes[8 - size..]);
}

fn read_byte(data: &[u8], pos: &mut usize) -> Result<u8> {
    let byte = *data.get(*pos).ok_or_else(|| invalid("unexpected end of data"))?;
    *pos += 1;
    Ok(byte)
}

fn read_uint(data: &[u8], pos: &mut usize, size: usize) -> Result<usize> {
    if *pos + size > data.len() {
        return Err(invalid("not enough data to read uint"));
    }

    let result = data[*pos..*pos + size]
        .iter()
        .fold(0usize, |acc, &b| (acc << 8) | b as usize);
    *pos += size;

    Ok(result)
}

/// Parses a BoC from a hex string
pub fn hex_to_boc(hex: &str) -> Result<Arc<Cell>> {
    let hex: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = hex::decode(&hex).map_err(|e| invalid(format!("bad hex: {}", e)))?;
    deserialize_boc(&bytes)
}

/// Serializes a cell tree to a hex BoC
pub fn boc_to_hex(cell: &Arc<Cell>, has_crc32: bool) -> Result<String> {
    Ok(hex::encode(serialize_boc(cell, has_crc32)?))
}

/// Serializes a cell tree to a base64 BoC
pub fn boc_to_base64(cell: &Arc<Cell>, has_crc32: bool) -> Result<String> {
    let bytes = serialize_boc(cell, has_crc32)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}

/// Parses a BoC from a base64 string
pub fn base64_to_boc(b64: &str) -> Result<Arc<Cell>> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|e| invalid(format!("bad base64: {}", e)))?;
    deserialize_boc(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tvm::cell::CellBuilder;

    #[test]
    fn test_serialize_deserialize_simple() {
        let mut builder = CellBuilder::new();
        builder.store_u32(0x12345678).unwrap();
        let cell = builder.build().unwrap();

        let boc = serialize_boc(&cell, false).unwrap();
        let deserialized = deserialize_boc(&boc).unwrap();

        assert_eq!(cell.hash(), deserialized.hash());
    }

    #[test]
    fn test_empty_cell_boc_bytes() {
        let cell = Arc::new(Cell::new());
        // Matches the canonical encoding produced by other TON libraries
        assert_eq!(
            boc_to_hex(&cell, false).unwrap(),
            "b5ee9c72010101010002000000"
        );
    }

    #[test]
    fn test_hex_conversion() {
        let mut builder = CellBuilder::new();
        builder.store_byte(0xFF).unwrap();
        let cell = builder.build().unwrap();

        let hex = boc_to_hex(&cell, false).unwrap();
        let decoded = hex_to_boc(&hex).unwrap();

        assert_eq!(cell.hash(), decoded.hash());
    }

    #[test]
    fn test_shared_subtree_stored_once() {
        let leaf = {
            let mut b = CellBuilder::new();
            b.store_u32(7).unwrap();
            b.build().unwrap()
        };
        let mut root = CellBuilder::new();
        root.store_reference(leaf.clone()).unwrap();
        root.store_reference(leaf).unwrap();
        let root = root.build().unwrap();

        assert_eq!(collect_cells(&root).len(), 2);
        let decoded = deserialize_boc(&serialize_boc(&root, true).unwrap()).unwrap();
        assert_eq!(decoded.hash(), root.hash());
    }

    #[test]
    fn test_bad_magic() {
        assert!(matches!(
            deserialize_boc(&[0, 1, 2, 3, 4, 5]),
            Err(EncodingError::InvalidBoc(_))
        ));
    }

    #[test]
    fn test_cell_count_larger_than_cells_section() {
        let mut bytes = vec![0xb5, 0xee, 0x9c, 0x72, 0x04, 0x01];
        bytes.extend_from_slice(&0xffff_ffffu32.to_be_bytes()); // cells
        bytes.extend_from_slice(&1u32.to_be_bytes()); // roots
        bytes.extend_from_slice(&0u32.to_be_bytes()); // absent
        bytes.push(0x00); // cells_size
        bytes.extend_from_slice(&0u32.to_be_bytes()); // root index
        assert_eq!(bytes.len(), 23);

        assert!(matches!(
            deserialize_boc(&bytes),
            Err(EncodingError::InvalidBoc(_))
        ));
    }

    #[test]
    fn test_cells_size_overflow_rejected() {
        let mut bytes = vec![0xb5, 0xee, 0x9c, 0x72, 0x84, 0x08];
        bytes.extend_from_slice(&0xffff_ffffu32.to_be_bytes());
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&u64::MAX.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());

        assert!(matches!(
            deserialize_boc(&bytes),
            Err(EncodingError::InvalidBoc(_))
        ));
    }
}
