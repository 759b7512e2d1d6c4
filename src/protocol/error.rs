use crate::tvm::EncodingError;
use std::fmt;
use thiserror::Error;

/// Result code of processing one inbound message
///
/// Non-zero codes are expected protocol outcomes: the caller inspects the
/// code, the contract storage is left untouched, and the caller may retry
/// with adjusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitCode {
    Success,
    /// An integer counter ran past its range
    IntegerOverflow,
    /// Message body ended early or held malformed data
    CellUnderflow,
    /// Mine message hash did not exceed the current threshold
    PowNotSatisfied,
    /// Message `expire` is in the past
    MessageExpired,
    /// Not enough time passed since the last success to ease the threshold
    RescaleTooEarly,
    /// A required address was missing or not a standard address
    InvalidAddress,
    /// Sender is not the owner
    NotOwner,
    /// Item has not been initialised by its collection
    NotInitialized,
    /// Sender is not the editor
    NotEditor,
    /// Inbound external messages are not accepted
    ExternalRejected,
    UnknownOp,
}

impl ExitCode {
    pub fn code(self) -> u32 {
        match self {
            ExitCode::Success => 0,
            ExitCode::IntegerOverflow => 4,
            ExitCode::CellUnderflow => 9,
            ExitCode::PowNotSatisfied => 24,
            ExitCode::MessageExpired => 25,
            ExitCode::RescaleTooEarly => 30,
            ExitCode::InvalidAddress => 36,
            ExitCode::NotOwner => 401,
            ExitCode::NotInitialized => 405,
            ExitCode::NotEditor => 410,
            ExitCode::ExternalRejected => 0xfffe,
            ExitCode::UnknownOp => 0xffff,
        }
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Success
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

impl PartialEq<u32> for ExitCode {
    fn eq(&self, other: &u32) -> bool {
        self.code() == *other
    }
}

/// Why a message was rejected
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{code}: {reason}")]
pub struct Rejection {
    pub code: ExitCode,
    pub reason: String,
}

impl Rejection {
    pub fn new(code: ExitCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }
}

impl From<EncodingError> for Rejection {
    fn from(err: EncodingError) -> Self {
        let code = match err {
            EncodingError::InvalidAddress(_) | EncodingError::InvalidAddressTag(_) => {
                ExitCode::InvalidAddress
            }
            _ => ExitCode::CellUnderflow,
        };
        Rejection::new(code, err.to_string())
    }
}
