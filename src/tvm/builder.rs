//! High-level builder for constructing cells
//!
//! `Builder` wraps the low-level [`CellBuilder`] with the encodings used by
//! storage and message layouts: signed and arbitrary-width integers,
//! addresses, coins, optional references and snake-encoded byte strings.
//!
//! # Examples
//!
//! ```rust
//! use nft_giver_rs::tvm::{Address, Builder};
//!
//! let mut builder = Builder::new();
//! let addr = Address::new(0, [0u8; 32]);
//! builder.store_address(Some(&addr)).unwrap();
//! builder.store_coins(1_000_000_000).unwrap();
//! builder.store_string("Hello, TON!").unwrap();
//!
//! let cell = builder.build().unwrap();
//! assert_eq!(cell.bit_len(), 267 + 4 + 32 + 11 * 8);
//! ```

use crate::tvm::address::Address;
use crate::tvm::cell::{Cell, CellBuilder, MAX_CELL_BITS, MAX_CELL_REFS};
use crate::tvm::error::{EncodingError, Result};
use crate::tvm::slice::Slice;
use num_bigint::BigUint;
use std::sync::Arc;

/// Largest byte string that fits into a single cell
pub const MAX_CELL_BYTES: usize = MAX_CELL_BITS / 8;

/// Extended builder with convenience methods
#[derive(Debug, Clone, Default)]
pub struct Builder {
    inner: CellBuilder,
}

impl Builder {
    /// Creates a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of bits used
    pub fn bit_len(&self) -> usize {
        self.inner.bit_len()
    }

    /// Returns the number of available bits
    pub fn available_bits(&self) -> usize {
        MAX_CELL_BITS - self.bit_len()
    }

    /// Returns the number of available whole bytes
    pub fn available_bytes(&self) -> usize {
        self.available_bits() / 8
    }

    /// Returns the number of references
    pub fn ref_count(&self) -> usize {
        self.inner.ref_count()
    }

    /// Returns the number of available references
    pub fn available_refs(&self) -> usize {
        MAX_CELL_REFS - self.ref_count()
    }

    /// Stores a single bit
    pub fn store_bit(&mut self, bit: bool) -> Result<&mut Self> {
        self.inner.store_bit(bit)?;
        Ok(self)
    }

    /// Stores multiple bits from a byte slice
    pub fn store_bits(&mut self, bits: &[u8], bit_len: usize) -> Result<&mut Self> {
        self.inner.store_bits(bits, bit_len)?;
        Ok(self)
    }

    /// Stores a byte
    pub fn store_byte(&mut self, byte: u8) -> Result<&mut Self> {
        self.inner.store_byte(byte)?;
        Ok(self)
    }

    /// Stores multiple bytes
    pub fn store_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self> {
        self.inner.store_bytes(bytes)?;
        Ok(self)
    }

    /// Stores a u32 value
    pub fn store_u32(&mut self, value: u32) -> Result<&mut Self> {
        self.inner.store_u32(value)?;
        Ok(self)
    }

    /// Stores a u64 value
    pub fn store_u64(&mut self, value: u64) -> Result<&mut Self> {
        self.inner.store_u64(value)?;
        Ok(self)
    }

    /// Stores an unsigned integer with specific bit length
    pub fn store_uint(&mut self, value: u64, bits: usize) -> Result<&mut Self> {
        self.inner.store_uint(value, bits)?;
        Ok(self)
    }

    /// Stores a signed integer with specific bit length (two's complement)
    pub fn store_int(&mut self, value: i64, bits: usize) -> Result<&mut Self> {
        if bits == 0 || bits > 64 {
            return Err(EncodingError::Overflow(format!(
                "signed integer width must be 1..=64 bits, got {}",
                bits
            )));
        }

        let min = if bits == 64 { i64::MIN } else { -(1i64 << (bits - 1)) };
        let max = if bits == 64 { i64::MAX } else { (1i64 << (bits - 1)) - 1 };
        if value < min || value > max {
            return Err(EncodingError::Overflow(format!(
                "value {} does not fit in {} signed bits",
                value, bits
            )));
        }

        let unsigned = if bits == 64 {
            value as u64
        } else {
            (value as u64) & ((1u64 << bits) - 1)
        };

        self.store_uint(unsigned, bits)
    }

    /// Stores an unsigned integer of arbitrary width (e.g. uint256)
    pub fn store_biguint(&mut self, value: &BigUint, bits: usize) -> Result<&mut Self> {
        if value.bits() > bits as u64 {
            return Err(EncodingError::Overflow(format!(
                "value of {} bits does not fit in {} bits",
                value.bits(),
                bits
            )));
        }
        if bits == 0 {
            return Ok(self);
        }

        let byte_len = bits.div_ceil(8);
        let aligned = value << (byte_len * 8 - bits);
        let raw = aligned.to_bytes_be();

        let mut buf = vec![0u8; byte_len];
        if *value != BigUint::default() {
            buf[byte_len - raw.len()..].copy_from_slice(&raw);
        }

        self.store_bits(&buf, bits)
    }

    /// Stores a u128 value with specific bit length
    pub fn store_u128(&mut self, value: u128, bits: usize) -> Result<&mut Self> {
        self.store_biguint(&BigUint::from(value), bits)
    }

    /// Stores a boolean value as a single bit
    pub fn store_bool(&mut self, value: bool) -> Result<&mut Self> {
        self.store_bit(value)
    }

    /// Stores a reference to another cell
    pub fn store_ref(&mut self, cell: Arc<Cell>) -> Result<&mut Self> {
        self.inner.store_reference(cell)?;
        Ok(self)
    }

    /// Stores an optional reference (Maybe ^Cell)
    pub fn store_maybe_ref(&mut self, cell: Option<Arc<Cell>>) -> Result<&mut Self> {
        match cell {
            Some(c) => {
                self.store_bit(true)?;
                self.store_ref(c)?;
            }
            None => {
                self.store_bit(false)?;
            }
        }
        Ok(self)
    }

    /// Stores the contents of another cell
    pub fn store_cell(&mut self, cell: &Arc<Cell>) -> Result<&mut Self> {
        if self.ref_count() + cell.reference_count() > MAX_CELL_REFS {
            return Err(EncodingError::Overflow("builder refs overflow".to_string()));
        }

        self.store_bits(cell.data(), cell.bit_len())?;
        for reference in cell.references() {
            self.store_ref(reference.clone())?;
        }

        Ok(self)
    }

    /// Stores the unread part of a slice
    pub fn store_slice(&mut self, slice: &Slice) -> Result<&mut Self> {
        let mut rest = slice.clone();
        let remaining_bits = rest.remaining_bits();
        if remaining_bits > 0 {
            let data = rest.load_bits(remaining_bits)?;
            self.store_bits(&data, remaining_bits)?;
        }

        for reference in rest.load_remaining_refs()? {
            self.store_ref(reference)?;
        }

        Ok(self)
    }

    /// Stores coins (VarUInteger 16)
    pub fn store_coins(&mut self, amount: u128) -> Result<&mut Self> {
        if amount == 0 {
            return self.store_uint(0, 4);
        }

        let byte_len = (128 - amount.leading_zeros() as usize).div_ceil(8);
        if byte_len > 15 {
            return Err(EncodingError::Overflow(format!(
                "coins value {} needs {} bytes, maximum is 15",
                amount, byte_len
            )));
        }

        self.store_uint(byte_len as u64, 4)?;
        let bytes = amount.to_be_bytes();
        self.store_bytes(&bytes[16 - byte_len..])?;

        Ok(self)
    }

    /// Stores a string inline (max 127 bytes)
    pub fn store_string(&mut self, s: &str) -> Result<&mut Self> {
        let bytes = s.as_bytes();
        if bytes.len() > MAX_CELL_BYTES {
            return Err(EncodingError::Overflow(format!(
                "string of {} bytes does not fit in a cell, use store_snake_string",
                bytes.len()
            )));
        }
        self.store_bytes(bytes)
    }

    /// Stores a string using snake encoding
    pub fn store_snake_string(&mut self, s: &str) -> Result<&mut Self> {
        self.store_snake_bytes(s.as_bytes())
    }

    /// Stores bytes using snake encoding
    ///
    /// Whatever fits into this builder is stored inline; the rest continues in
    /// a chain of cells, one chunk per cell, each linked via its first reference.
    pub fn store_snake_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self> {
        let available = self.available_bytes();
        if bytes.len() <= available {
            return self.store_bytes(bytes);
        }

        let mut tail = Builder::new();
        tail.store_snake_bytes(&bytes[available..])?;
        let tail = tail.build()?;

        self.store_bytes(&bytes[..available])?;
        self.store_ref(tail)?;

        Ok(self)
    }

    /// Stores an address (MsgAddress): `addr_none$00` or `addr_std$10`
    pub fn store_address(&mut self, address: Option<&Address>) -> Result<&mut Self> {
        match address {
            None => {
                self.store_uint(0b00, 2)?;
            }
            Some(addr) => {
                // addr_std$10 anycast:(Maybe Anycast) workchain_id:int8 address:bits256
                self.store_uint(0b10, 2)?;
                self.store_bit(false)?;
                self.store_int(addr.workchain as i64, 8)?;
                self.store_bytes(&addr.hash_part)?;
            }
        }
        Ok(self)
    }

    /// Builds the cell
    pub fn build(self) -> Result<Arc<Cell>> {
        self.inner.build()
    }

    /// Converts to a slice
    pub fn to_slice(self) -> Result<Slice> {
        Ok(Slice::new(self.build()?))
    }
}
