use crate::protocol::error::{ExitCode, Rejection};
use crate::tvm::error::Result;
use crate::tvm::{Address, Builder, Cell, StateInit};
use std::sync::Arc;

/// Pay transfer fees separately from the message value
pub const SEND_MODE_PAY_FEES_SEPARATELY: u8 = 1;

/// Carry all the remaining value of the inbound message
pub const SEND_MODE_CARRY_REMAINING_VALUE: u8 = 64;

/// Execution context of one inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageContext {
    /// Current unix time, seconds
    pub now: u32,
    pub sender: Address,
    /// Value attached to the inbound message, nanotons
    pub value: u128,
}

impl MessageContext {
    pub fn new(now: u32, sender: Address, value: u128) -> Self {
        Self { now, sender, value }
    }
}

/// A message a contract emits while processing an inbound one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub destination: Address,
    pub amount: u128,
    pub bounce: bool,
    pub mode: u8,
    pub state_init: Option<StateInit>,
    pub body: Arc<Cell>,
}

impl OutboundMessage {
    /// Serializes as an internal message
    ///
    /// ```text
    /// int_msg_info$0 ihr_disabled:Bool bounce:Bool bounced:Bool
    ///   src:MsgAddress dest:MsgAddressInt value:CurrencyCollection
    ///   ihr_fee:Grams fwd_fee:Grams created_lt:uint64 created_at:uint32
    /// init:(Maybe (Either StateInit ^StateInit)) body:(Either X ^X)
    /// ```
    ///
    /// Source, fees and logical time are left for the validator to fill in;
    /// state init and body always go into references.
    pub fn to_cell(&self) -> Result<Arc<Cell>> {
        let mut builder = Builder::new();
        builder.store_bit(false)?;
        builder.store_bit(true)?;
        builder.store_bit(self.bounce)?;
        builder.store_bit(false)?;
        builder.store_address(None)?;
        builder.store_address(Some(&self.destination))?;
        builder.store_coins(self.amount)?;
        builder.store_bit(false)?;
        builder.store_coins(0)?;
        builder.store_coins(0)?;
        builder.store_u64(0)?;
        builder.store_u32(0)?;

        match &self.state_init {
            Some(state_init) => {
                builder.store_bit(true)?;
                builder.store_bit(true)?;
                builder.store_ref(state_init.to_cell()?)?;
            }
            None => {
                builder.store_bit(false)?;
            }
        }

        builder.store_bit(true)?;
        builder.store_ref(self.body.clone())?;
        builder.build()
    }
}

/// Result of processing one inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub exit_code: ExitCode,
    pub out_messages: Vec<OutboundMessage>,
}

impl Outcome {
    pub fn success(out_messages: Vec<OutboundMessage>) -> Self {
        Self {
            exit_code: ExitCode::Success,
            out_messages,
        }
    }

    pub fn rejected(exit_code: ExitCode) -> Self {
        Self {
            exit_code,
            out_messages: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code.is_success()
    }
}

/// Runs `handler` against a copy of `state` and commits the copy only on success
pub fn apply_atomically<S, F>(state: &mut S, handler: F) -> Outcome
where
    S: Clone,
    F: FnOnce(&mut S) -> std::result::Result<Vec<OutboundMessage>, Rejection>,
{
    let mut draft = state.clone();
    match handler(&mut draft) {
        Ok(out_messages) => {
            *state = draft;
            Outcome::success(out_messages)
        }
        Err(rejection) => {
            log::warn!("Message rejected: {}", rejection);
            Outcome::rejected(rejection.code)
        }
    }
}
