//! Contract state init and address derivation
//!
//! ```text
//! _ split_depth:(Maybe (## 5)) special:(Maybe TickTock)
//!   code:(Maybe ^Cell) data:(Maybe ^Cell)
//!   library:(HashmapE 256 SimpleLib) = StateInit;
//! ```

use crate::tvm::address::Address;
use crate::tvm::builder::Builder;
use crate::tvm::cell::Cell;
use crate::tvm::error::{EncodingError, Result};
use crate::tvm::slice::Slice;
use std::sync::Arc;

/// Code and data of a contract at deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateInit {
    pub code: Arc<Cell>,
    pub data: Arc<Cell>,
}

impl StateInit {
    pub fn new(code: Arc<Cell>, data: Arc<Cell>) -> Self {
        Self { code, data }
    }

    /// Serializes the state init: no split depth, no special, code, data, no libraries
    pub fn to_cell(&self) -> Result<Arc<Cell>> {
        let mut builder = Builder::new();
        builder.store_bit(false)?;
        builder.store_bit(false)?;
        builder.store_maybe_ref(Some(self.code.clone()))?;
        builder.store_maybe_ref(Some(self.data.clone()))?;
        builder.store_bit(false)?;
        builder.build()
    }

    /// Parses a state init that carries both code and data
    pub fn from_cell(cell: &Arc<Cell>) -> Result<Self> {
        let mut slice = Slice::new(cell.clone());

        if slice.load_bit()? {
            return Err(EncodingError::InvalidStateInit(
                "split depth is not supported".to_string(),
            ));
        }
        if slice.load_bit()? {
            return Err(EncodingError::InvalidStateInit(
                "special (tick-tock) contracts are not supported".to_string(),
            ));
        }
        let code = slice
            .load_maybe_ref()?
            .ok_or_else(|| EncodingError::InvalidStateInit("missing code".to_string()))?;
        let data = slice
            .load_maybe_ref()?
            .ok_or_else(|| EncodingError::InvalidStateInit("missing data".to_string()))?;
        if slice.load_maybe_ref()?.is_some() {
            return Err(EncodingError::InvalidStateInit(
                "libraries are not supported".to_string(),
            ));
        }

        Ok(Self { code, data })
    }

    /// Returns the representation hash of the state init cell
    pub fn hash(&self) -> Result<[u8; 32]> {
        Ok(self.to_cell()?.hash())
    }

    /// Derives the address the contract gets when deployed to `workchain`
    pub fn address(&self, workchain: i8) -> Result<Address> {
        Ok(Address::new(workchain, self.hash()?))
    }
}

/// Derives a contract address from its code and data
pub fn contract_address(workchain: i8, code: &Arc<Cell>, data: &Arc<Cell>) -> Result<Address> {
    StateInit::new(code.clone(), data.clone()).address(workchain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tvm::builder::Builder;

    fn cell_with(value: u32) -> Arc<Cell> {
        let mut builder = Builder::new();
        builder.store_u32(value).unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_state_init_layout() {
        let state_init = StateInit::new(cell_with(1), cell_with(2));
        let cell = state_init.to_cell().unwrap();

        assert_eq!(cell.bit_len(), 5);
        assert_eq!(cell.data(), &[0b0011_0000]);
        assert_eq!(cell.reference_count(), 2);
        assert_eq!(StateInit::from_cell(&cell).unwrap(), state_init);
    }

    #[test]
    fn test_address_is_deterministic() {
        let first = contract_address(0, &cell_with(10), &cell_with(20)).unwrap();
        let second = contract_address(0, &cell_with(10), &cell_with(20)).unwrap();
        assert_eq!(first, second);

        let other_data = contract_address(0, &cell_with(10), &cell_with(21)).unwrap();
        assert_ne!(first, other_data);

        let masterchain = contract_address(-1, &cell_with(10), &cell_with(20)).unwrap();
        assert_eq!(masterchain.hash_part, first.hash_part);
        assert_eq!(masterchain.workchain, -1);
    }

    #[test]
    fn test_library_is_rejected() {
        let mut builder = Builder::new();
        builder.store_bit(false).unwrap();
        builder.store_bit(false).unwrap();
        builder.store_maybe_ref(Some(cell_with(1))).unwrap();
        builder.store_maybe_ref(Some(cell_with(2))).unwrap();
        builder.store_maybe_ref(Some(cell_with(3))).unwrap();
        let cell = builder.build().unwrap();

        assert!(matches!(
            StateInit::from_cell(&cell),
            Err(EncodingError::InvalidStateInit(_))
        ));
    }
}
