//! Cell implementation
//!
//! A cell stores up to 1023 bits of data and up to 4 references to other
//! cells. Cells are immutable: the representation hash and depth are
//! computed once, when the cell is built.

use crate::tvm::error::{EncodingError, Result};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

/// Maximum number of bits a cell can store
pub const MAX_CELL_BITS: usize = 1023;

/// Maximum number of references a cell can have
pub const MAX_CELL_REFS: usize = 4;

/// An ordinary (level 0, non-exotic) cell
#[derive(Clone, PartialEq, Eq)]
pub struct Cell {
    /// Cell data, exactly `ceil(bit_len / 8)` bytes, unused trailing bits zeroed
    data: Vec<u8>,
    /// Number of bits in the cell (not necessarily a multiple of 8)
    bit_len: usize,
    /// References to other cells
    references: Vec<Arc<Cell>>,
    /// Representation hash
    hash: [u8; 32],
    /// Depth of the subtree rooted at this cell
    depth: u16,
}

impl Cell {
    /// Creates a new empty cell
    pub fn new() -> Self {
        Self::from_parts(Vec::new(), 0, Vec::new())
    }

    /// Creates a cell with the given data and bit length
    pub fn with_data(data: Vec<u8>, bit_len: usize) -> Result<Self> {
        Self::with_references(data, bit_len, Vec::new())
    }

    /// Creates a cell with data and references
    pub fn with_references(
        mut data: Vec<u8>,
        bit_len: usize,
        references: Vec<Arc<Cell>>,
    ) -> Result<Self> {
        if bit_len > MAX_CELL_BITS {
            return Err(EncodingError::Overflow(format!(
                "cell bit length {} exceeds maximum {}",
                bit_len, MAX_CELL_BITS
            )));
        }
        if references.len() > MAX_CELL_REFS {
            return Err(EncodingError::Overflow(format!(
                "cell has {} references, maximum is {}",
                references.len(),
                MAX_CELL_REFS
            )));
        }

        let required_bytes = bit_len.div_ceil(8);
        if data.len() < required_bytes {
            return Err(EncodingError::Underflow(format!(
                "data length {} is insufficient for {} bits",
                data.len(),
                bit_len
            )));
        }

        data.truncate(required_bytes);
        if bit_len % 8 != 0 {
            let last = required_bytes - 1;
            data[last] &= 0xFFu8 << (8 - bit_len % 8);
        }

        Ok(Self::from_parts(data, bit_len, references))
    }

    fn from_parts(data: Vec<u8>, bit_len: usize, references: Vec<Arc<Cell>>) -> Self {
        let depth = references
            .iter()
            .map(|r| r.depth() + 1)
            .max()
            .unwrap_or(0);

        let mut cell = Self {
            data,
            bit_len,
            references,
            hash: [0u8; 32],
            depth,
        };
        cell.hash = cell.compute_hash();
        cell
    }

    /// Returns the cell's data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the number of bits in the cell
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Returns the cell's references
    pub fn references(&self) -> &[Arc<Cell>] {
        &self.references
    }

    /// Returns the number of references
    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    /// Gets a reference by index
    pub fn reference(&self, index: usize) -> Option<&Arc<Cell>> {
        self.references.get(index)
    }

    /// Computes the cell's descriptors (2 bytes)
    pub fn descriptors(&self) -> [u8; 2] {
        // r + 8*s + 32*l, with s (exotic) and l (level) always zero here
        let refs_descriptor = self.references.len() as u8;

        // floor(b/8) + ceil(b/8)
        let bits_descriptor = (self.bit_len / 8 + self.bit_len.div_ceil(8)) as u8;

        [refs_descriptor, bits_descriptor]
    }

    /// Serializes the cell data, appending the completion tag if the last byte is partial
    pub fn serialize_data(&self) -> Vec<u8> {
        let mut result = self.data.clone();

        if self.bit_len % 8 != 0 {
            let last_byte_idx = self.bit_len / 8;
            let bits_in_last_byte = self.bit_len % 8;
            result[last_byte_idx] |= 1 << (7 - bits_in_last_byte);
        }

        result
    }

    /// Returns the depth of the cell
    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// Returns the representation hash of the cell
    pub fn hash(&self) -> [u8; 32] {
        self.hash
    }

    fn compute_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();

        hasher.update(self.descriptors());
        hasher.update(self.serialize_data());

        for reference in &self.references {
            hasher.update(reference.depth().to_be_bytes());
        }
        for reference in &self.references {
            hasher.update(reference.hash());
        }

        hasher.finalize().into()
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("bits", &self.bit_len)
            .field("data", &hex::encode(&self.data))
            .field("refs", &self.references)
            .field("hash", &hex::encode(self.hash))
            .finish()
    }
}

/// Low-level builder for constructing cells
///
/// Provides the basic bit/byte operations and enforces the cell limits.
/// For message and storage layouts use [`Builder`](crate::tvm::Builder),
/// which wraps this type with addresses, coins, big integers and snake data.
///
/// # Example
///
/// ```rust
/// use nft_giver_rs::tvm::CellBuilder;
///
/// let mut builder = CellBuilder::new();
/// builder.store_u32(0x12345678).unwrap();
/// builder.store_byte(0xFF).unwrap();
/// let cell = builder.build().unwrap();
/// assert_eq!(cell.bit_len(), 40);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CellBuilder {
    data: Vec<u8>,
    bit_len: usize,
    references: Vec<Arc<Cell>>,
}

impl CellBuilder {
    /// Creates a new cell builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of bits written so far
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Returns the number of references written so far
    pub fn ref_count(&self) -> usize {
        self.references.len()
    }

    /// Stores the first `bit_len` bits of a byte slice
    pub fn store_bits(&mut self, bits: &[u8], bit_len: usize) -> Result<&mut Self> {
        if self.bit_len + bit_len > MAX_CELL_BITS {
            return Err(EncodingError::Overflow(format!(
                "cannot store {} bits: {} of {} already used",
                bit_len, self.bit_len, MAX_CELL_BITS
            )));
        }

        if bits.len() < bit_len.div_ceil(8) {
            return Err(EncodingError::Underflow(format!(
                "insufficient data for {} bits",
                bit_len
            )));
        }

        for i in 0..bit_len {
            let bit = (bits[i / 8] >> (7 - (i % 8))) & 1;

            let target_byte_idx = self.bit_len / 8;
            if target_byte_idx >= self.data.len() {
                self.data.push(0);
            }
            if bit == 1 {
                self.data[target_byte_idx] |= 1 << (7 - (self.bit_len % 8));
            }

            self.bit_len += 1;
        }

        Ok(self)
    }

    /// Stores a single bit
    pub fn store_bit(&mut self, bit: bool) -> Result<&mut Self> {
        self.store_bits(&[if bit { 0x80 } else { 0x00 }], 1)
    }

    /// Stores a byte
    pub fn store_byte(&mut self, byte: u8) -> Result<&mut Self> {
        self.store_bits(&[byte], 8)
    }

    /// Stores multiple bytes
    pub fn store_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self> {
        self.store_bits(bytes, bytes.len() * 8)
    }

    /// Stores a u32 value
    pub fn store_u32(&mut self, value: u32) -> Result<&mut Self> {
        self.store_bits(&value.to_be_bytes(), 32)
    }

    /// Stores a u64 value
    pub fn store_u64(&mut self, value: u64) -> Result<&mut Self> {
        self.store_bits(&value.to_be_bytes(), 64)
    }

    /// Stores `value` as an unsigned big-endian integer of exactly `bits` bits
    pub fn store_uint(&mut self, value: u64, bits: usize) -> Result<&mut Self> {
        if bits > 64 {
            return Err(EncodingError::Overflow(
                "cannot store more than 64 bits from u64".to_string(),
            ));
        }
        if bits < 64 && value >> bits != 0 {
            return Err(EncodingError::Overflow(format!(
                "value {} does not fit in {} bits",
                value, bits
            )));
        }
        if bits == 0 {
            return Ok(self);
        }

        // Left-align the value so the top `bits` bits of the buffer carry it
        let aligned = value << (64 - bits);
        self.store_bits(&aligned.to_be_bytes(), bits)
    }

    /// Adds a reference to another cell
    pub fn store_reference(&mut self, cell: Arc<Cell>) -> Result<&mut Self> {
        if self.references.len() >= MAX_CELL_REFS {
            return Err(EncodingError::Overflow(format!(
                "cannot add reference: maximum {} references allowed",
                MAX_CELL_REFS
            )));
        }
        self.references.push(cell);
        Ok(self)
    }

    /// Builds the cell
    pub fn build(self) -> Result<Arc<Cell>> {
        Ok(Arc::new(Cell::with_references(
            self.data,
            self.bit_len,
            self.references,
        )?))
    }
}
