use thiserror::Error;

/// Errors raised while building or parsing cells and the structures stored in them.
///
/// A failing build call never hands back a partially written cell.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("Cell overflow: {0}")]
    Overflow(String),
    #[error("Cell underflow: {0}")]
    Underflow(String),
    #[error("Invalid address tag 0b{0:02b}")]
    InvalidAddressTag(u8),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Invalid BoC: {0}")]
    InvalidBoc(String),
    #[error("Invalid content: {0}")]
    InvalidContent(String),
    #[error("Invalid state init: {0}")]
    InvalidStateInit(String),
}

pub type Result<T> = std::result::Result<T, EncodingError>;
