use crate::tvm::EncodingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GiverError {
    #[error("Invalid complexity bounds: min {min} > max {max}")]
    InvalidComplexityBounds { min: u8, max: u8 },
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),
    #[error("Mining worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}
