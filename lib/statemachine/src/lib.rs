//! The state-machine driver (C5): executes compiled state graphs over an SMCB, and
//! the message-pair array abstraction used for cross-server request/reply exchanges.

pub mod driver;
pub mod message_pair;
pub mod smcb;

pub use driver::{Driver, RunOutcome, StepOutcome};
pub use message_pair::{Classification, MessagePair, ReplyClassifier};
pub use smcb::{ActionResult, MachineId, OpId, OpIdGenerator, Smcb, StateGraph, StateRecord};
