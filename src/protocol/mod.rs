//! Contract message processing shared by the collection and its items
//!
//! Each contract handles one inbound message at a time against an explicit
//! [`MessageContext`]. The result is an [`Outcome`]: an exit code plus the
//! outbound messages. A rejected message leaves the contract state unchanged.

pub mod error;
pub mod message;


pub use error::{ExitCode, Rejection};
pub use message::{
    MessageContext, OutboundMessage, Outcome, SEND_MODE_CARRY_REMAINING_VALUE,
    SEND_MODE_PAY_FEES_SEPARATELY, apply_atomically,
};

use crate::tvm::{Address, Cell, StateInit};
use std::sync::Arc;

/// A contract that reacts to inbound messages
pub trait Contract {
    /// Address the contract was deployed to
    fn address(&self) -> Address;

    /// State init the contract was deployed with
    fn state_init(&self) -> &StateInit;

    /// Processes an internal message
    fn receive_internal(&mut self, ctx: &MessageContext, body: &Arc<Cell>) -> Outcome;

    /// Processes an inbound external message; rejected unless overridden
    fn receive_external(&mut self, _body: &Arc<Cell>) -> Outcome {
        Outcome::rejected(ExitCode::ExternalRejected)
    }
}
