//! Request orchestration.
//!
//! `controller` holds the operation state machine; `session` drives it from UI
//! commands on the async runtime so presentation layers only exchange messages.

mod controller;
#[cfg_attr(not(feature = "tui"), allow(dead_code))]
mod session;

pub(crate) use controller::{OperationController, MSG_UNREACHABLE};
#[cfg(feature = "tui")]
pub(crate) use session::{run_controller, UiCommand};
#[cfg(test)]
pub(crate) use controller::tests::ScriptedBackend;
