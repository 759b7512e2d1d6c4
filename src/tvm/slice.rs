//! Slice implementation for reading data from cells
//!
//! A Slice provides a way to read data from a Cell sequentially,
//! tracking the current position in both bits and references.

use crate::tvm::address::Address;
use crate::tvm::cell::Cell;
use crate::tvm::error::{EncodingError, Result};
use num_bigint::BigUint;
use std::sync::Arc;

/// A slice for reading data from a cell
#[derive(Debug, Clone)]
pub struct Slice {
    /// The cell being read
    cell: Arc<Cell>,
    /// Current bit position in the cell
    bit_pos: usize,
    /// Current reference position
    ref_pos: usize,
}

impl Slice {
    /// Creates a new slice from a cell
    pub fn new(cell: Arc<Cell>) -> Self {
        Self {
            cell,
            bit_pos: 0,
            ref_pos: 0,
        }
    }

    /// Returns the number of remaining bits
    pub fn remaining_bits(&self) -> usize {
        self.cell.bit_len().saturating_sub(self.bit_pos)
    }

    /// Returns the number of remaining references
    pub fn remaining_refs(&self) -> usize {
        self.cell.reference_count().saturating_sub(self.ref_pos)
    }

    /// Checks if both bits and references are exhausted
    pub fn is_empty(&self) -> bool {
        self.remaining_bits() == 0 && self.remaining_refs() == 0
    }

    /// Loads a single bit
    pub fn load_bit(&mut self) -> Result<bool> {
        if self.remaining_bits() == 0 {
            return Err(EncodingError::Underflow("no more bits to read".to_string()));
        }

        let byte = self.cell.data()[self.bit_pos / 8];
        let bit = (byte >> (7 - (self.bit_pos % 8))) & 1;
        self.bit_pos += 1;

        Ok(bit == 1)
    }

    /// Loads multiple bits into a left-aligned byte vector
    pub fn load_bits(&mut self, n: usize) -> Result<Vec<u8>> {
        if n > self.remaining_bits() {
            return Err(EncodingError::Underflow(format!(
                "not enough bits remaining: requested {}, available {}",
                n,
                self.remaining_bits()
            )));
        }

        let mut result = vec![0u8; n.div_ceil(8)];
        for i in 0..n {
            if self.load_bit()? {
                result[i / 8] |= 1 << (7 - (i % 8));
            }
        }

        Ok(result)
    }

    /// Loads a byte (8 bits)
    pub fn load_byte(&mut self) -> Result<u8> {
        Ok(self.load_bits(8)?[0])
    }

    /// Loads multiple bytes
    pub fn load_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        self.load_bits(n * 8)
    }

    /// Loads a u16 value (16 bits, big-endian)
    pub fn load_u16(&mut self) -> Result<u16> {
        Ok(self.load_uint(16)? as u16)
    }

    /// Loads a u32 value (32 bits, big-endian)
    pub fn load_u32(&mut self) -> Result<u32> {
        Ok(self.load_uint(32)? as u32)
    }

    /// Loads a u64 value (64 bits, big-endian)
    pub fn load_u64(&mut self) -> Result<u64> {
        self.load_uint(64)
    }

    /// Loads a uint with a specific number of bits
    pub fn load_uint(&mut self, bits: usize) -> Result<u64> {
        if bits > 64 {
            return Err(EncodingError::Overflow(
                "cannot load more than 64 bits into u64".to_string(),
            ));
        }
        if bits == 0 {
            return Ok(0);
        }

        let bytes = self.load_bits(bits)?;
        let mut buf = [0u8; 8];
        buf[..bytes.len()].copy_from_slice(&bytes);

        Ok(u64::from_be_bytes(buf) >> (64 - bits))
    }

    /// Loads a signed integer with a specific number of bits
    pub fn load_int(&mut self, bits: usize) -> Result<i64> {
        if bits > 64 {
            return Err(EncodingError::Overflow(
                "cannot load more than 64 bits into i64".to_string(),
            ));
        }
        if bits == 0 {
            return Ok(0);
        }

        let unsigned = self.load_uint(bits)?;

        let sign_bit = 1u64 << (bits - 1);
        if bits < 64 && unsigned & sign_bit != 0 {
            Ok((unsigned | (!0u64 << bits)) as i64)
        } else {
            Ok(unsigned as i64)
        }
    }

    /// Loads an unsigned integer of arbitrary width (e.g. uint256)
    pub fn load_biguint(&mut self, bits: usize) -> Result<BigUint> {
        if bits == 0 {
            return Ok(BigUint::default());
        }
        let bytes = self.load_bits(bits)?;
        let value = BigUint::from_bytes_be(&bytes);
        Ok(value >> (bytes.len() * 8 - bits))
    }

    /// Loads a u128 value with a specific number of bits
    pub fn load_u128(&mut self, bits: usize) -> Result<u128> {
        if bits > 128 {
            return Err(EncodingError::Overflow(
                "cannot load more than 128 bits into u128".to_string(),
            ));
        }
        let value = self.load_biguint(bits)?;
        let bytes = value.to_bytes_be();
        let mut buf = [0u8; 16];
        buf[16 - bytes.len()..].copy_from_slice(&bytes);
        Ok(u128::from_be_bytes(buf))
    }

    /// Loads a reference to another cell
    pub fn load_reference(&mut self) -> Result<Arc<Cell>> {
        let reference = self
            .cell
            .reference(self.ref_pos)
            .cloned()
            .ok_or_else(|| EncodingError::Underflow("no more references to read".to_string()))?;

        self.ref_pos += 1;
        Ok(reference)
    }

    /// Loads an optional reference (Maybe ^Cell)
    pub fn load_maybe_ref(&mut self) -> Result<Option<Arc<Cell>>> {
        if self.load_bit()? {
            Ok(Some(self.load_reference()?))
        } else {
            Ok(None)
        }
    }

    /// Preloads a reference without advancing the position
    pub fn preload_reference(&self, index: usize) -> Result<Arc<Cell>> {
        let actual_index = self.ref_pos + index;
        self.cell.reference(actual_index).cloned().ok_or_else(|| {
            EncodingError::Underflow(format!("reference not found at index {}", actual_index))
        })
    }

    /// Skips a number of bits
    pub fn skip_bits(&mut self, n: usize) -> Result<()> {
        if n > self.remaining_bits() {
            return Err(EncodingError::Underflow(format!(
                "cannot skip {} bits: only {} remaining",
                n,
                self.remaining_bits()
            )));
        }
        self.bit_pos += n;
        Ok(())
    }

    /// Gets the underlying cell
    pub fn cell(&self) -> &Arc<Cell> {
        &self.cell
    }

    /// Loads all remaining references
    pub fn load_remaining_refs(&mut self) -> Result<Vec<Arc<Cell>>> {
        let mut refs = Vec::new();
        while self.remaining_refs() > 0 {
            refs.push(self.load_reference()?);
        }
        Ok(refs)
    }

    /// Loads coins (VarUInteger 16)
    pub fn load_coins(&mut self) -> Result<u128> {
        let len = self.load_uint(4)? as usize;
        if len == 0 {
            return Ok(0);
        }

        let bytes = self.load_bytes(len)?;
        Ok(bytes
            .iter()
            .fold(0u128, |acc, &byte| (acc << 8) | byte as u128))
    }

    /// Loads an address (MsgAddress), `None` for `addr_none`
    ///
    /// Only `addr_none$00` and `addr_std$10` without anycast are accepted.
    pub fn load_address(&mut self) -> Result<Option<Address>> {
        let tag = self.load_uint(2)? as u8;
        match tag {
            0b00 => Ok(None),
            0b10 => {
                if self.load_bit()? {
                    return Err(EncodingError::InvalidAddress(
                        "anycast addresses are not supported".to_string(),
                    ));
                }
                let workchain = self.load_int(8)? as i8;
                let bytes = self.load_bytes(32)?;
                let mut hash_part = [0u8; 32];
                hash_part.copy_from_slice(&bytes);
                Ok(Some(Address::new(workchain, hash_part)))
            }
            other => Err(EncodingError::InvalidAddressTag(other)),
        }
    }

    /// Loads an address that must be present
    pub fn load_std_address(&mut self) -> Result<Address> {
        self.load_address()?
            .ok_or_else(|| EncodingError::InvalidAddress("expected addr_std, got addr_none".to_string()))
    }

    /// Loads snake-encoded bytes: the rest of this cell, then the chain of first references
    pub fn load_snake_bytes(&mut self) -> Result<Vec<u8>> {
        let mut result = Vec::new();
        let mut current = self.clone();

        loop {
            let bits = current.remaining_bits();
            if bits % 8 != 0 {
                return Err(EncodingError::InvalidContent(format!(
                    "snake cell holds {} bits, expected whole bytes",
                    bits
                )));
            }
            result.extend(current.load_bytes(bits / 8)?);

            if current.remaining_refs() == 0 {
                break;
            }
            current = Slice::new(current.load_reference()?);
        }

        self.bit_pos = self.cell.bit_len();
        if self.remaining_refs() > 0 {
            self.ref_pos += 1;
        }

        Ok(result)
    }

    /// Loads a snake-encoded UTF-8 string
    pub fn load_snake_string(&mut self) -> Result<String> {
        String::from_utf8(self.load_snake_bytes()?)
            .map_err(|e| EncodingError::InvalidContent(format!("invalid UTF-8: {}", e)))
    }
}

impl From<Arc<Cell>> for Slice {
    fn from(cell: Arc<Cell>) -> Self {
        Self::new(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tvm::builder::Builder;
    use crate::tvm::cell::CellBuilder;

    #[test]
    fn test_slice_load_bits() {
        let mut builder = CellBuilder::new();
        builder.store_byte(0xFF).unwrap();
        builder.store_byte(0x00).unwrap();
        let cell = builder.build().unwrap();

        let mut slice = Slice::new(cell);
        assert_eq!(slice.remaining_bits(), 16);

        assert_eq!(slice.load_byte().unwrap(), 0xFF);
        assert_eq!(slice.remaining_bits(), 8);

        assert_eq!(slice.load_byte().unwrap(), 0x00);
        assert_eq!(slice.remaining_bits(), 0);
        assert!(slice.load_bit().is_err());
    }

    #[test]
    fn test_slice_load_uint() {
        let mut builder = CellBuilder::new();
        builder.store_u32(0x12345678).unwrap();
        builder.store_uint(5, 3).unwrap();
        let cell = builder.build().unwrap();

        let mut slice = Slice::new(cell);
        assert_eq!(slice.load_u32().unwrap(), 0x12345678);
        assert_eq!(slice.load_uint(3).unwrap(), 5);
    }

    #[test]
    fn test_uint_widths() {
        for bits in [1usize, 7, 8, 13, 32, 63, 64] {
            let max = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
            for value in [0, 1, max / 3, max] {
                let mut builder = CellBuilder::new();
                builder.store_uint(value, bits).unwrap();
                let mut slice = Slice::new(builder.build().unwrap());
                assert_eq!(slice.load_uint(bits).unwrap(), value, "bits = {}", bits);
            }
            if bits < 64 {
                let mut builder = CellBuilder::new();
                assert!(builder.store_uint(max + 1, bits).is_err());
            }
        }
    }

    #[test]
    fn test_slice_load_int() {
        let mut builder = Builder::new();
        builder.store_int(-1, 8).unwrap();
        builder.store_int(-42, 17).unwrap();
        let mut slice = builder.to_slice().unwrap();

        assert_eq!(slice.load_int(8).unwrap(), -1);
        assert_eq!(slice.load_int(17).unwrap(), -42);
    }

    #[test]
    fn test_slice_load_biguint() {
        let value = (BigUint::from(1u8) << 255usize) + BigUint::from(12345u32);
        let mut builder = Builder::new();
        builder.store_bit(false).unwrap();
        builder.store_biguint(&value, 256).unwrap();
        builder.store_u128(u128::MAX >> 1, 127).unwrap();

        let mut slice = builder.to_slice().unwrap();
        slice.skip_bits(1).unwrap();
        assert_eq!(slice.load_biguint(256).unwrap(), value);
        assert_eq!(slice.load_u128(127).unwrap(), u128::MAX >> 1);
    }

    #[test]
    fn test_slice_load_reference() {
        let ref_cell = CellBuilder::new().build().unwrap();

        let mut builder = CellBuilder::new();
        builder.store_reference(ref_cell.clone()).unwrap();
        let cell = builder.build().unwrap();

        let mut slice = Slice::new(cell);
        assert_eq!(slice.remaining_refs(), 1);

        let loaded = slice.load_reference().unwrap();
        assert_eq!(loaded.hash(), ref_cell.hash());
        assert_eq!(slice.remaining_refs(), 0);
        assert!(slice.load_reference().is_err());
    }

    #[test]
    fn test_slice_skip() {
        let mut builder = CellBuilder::new();
        builder.store_u32(0x12345678).unwrap();
        let cell = builder.build().unwrap();

        let mut slice = Slice::new(cell);
        slice.skip_bits(16).unwrap();
        assert_eq!(slice.remaining_bits(), 16);
        assert_eq!(slice.load_u16().unwrap(), 0x5678);
    }

    #[test]
    fn test_load_coins() {
        let mut builder = Builder::new();
        builder.store_coins(0).unwrap();
        builder.store_coins(10_000_000).unwrap();
        let mut slice = builder.to_slice().unwrap();

        assert_eq!(slice.load_coins().unwrap(), 0);
        assert_eq!(slice.load_coins().unwrap(), 10_000_000);
    }

    #[test]
    fn test_load_address_variants() {
        let addr = Address::new(-1, [0xAB; 32]);
        let mut builder = Builder::new();
        builder.store_address(None).unwrap();
        builder.store_address(Some(&addr)).unwrap();
        let mut slice = builder.to_slice().unwrap();

        assert_eq!(slice.load_address().unwrap(), None);
        assert_eq!(slice.load_address().unwrap(), Some(addr));
    }

    #[test]
    fn test_load_address_rejects_unknown_tags() {
        for tag in [0b01u64, 0b11] {
            let mut builder = Builder::new();
            builder.store_uint(tag, 2).unwrap();
            builder.store_uint(0, 9).unwrap();
            let mut slice = builder.to_slice().unwrap();
            assert_eq!(
                slice.load_address(),
                Err(EncodingError::InvalidAddressTag(tag as u8))
            );
        }
    }

    #[test]
    fn test_load_snake_bytes() {
        let data: Vec<u8> = (0..300u32).map(|i| (i % 251) as u8).collect();
        let mut builder = Builder::new();
        builder.store_snake_bytes(&data).unwrap();
        let mut slice = builder.to_slice().unwrap();

        assert_eq!(slice.load_snake_bytes().unwrap(), data);
        assert!(slice.is_empty());
    }
}
