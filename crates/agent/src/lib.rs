//! The turn loop: the heart of Steward.
//!
//! One turn follows a **plan → act → observe** cycle:
//!
//! 1. **Receive** the user's message and append it to the session
//! 2. **Send** the conversation and tool schemas to the backend, batch or
//!    streaming (streamed deltas are folded by the [`StreamAssembler`])
//! 3. **If tool calls**: execute them in order, append one result per call,
//!    loop back to step 2
//! 4. **If text only**: append it and return
//!
//! The loop stops early with `Error::MaxRoundsExceeded` when the round cap
//! is hit.

pub mod assembler;
pub mod executor;
pub mod loop_runner;
pub mod prompt;
pub mod stream_event;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use assembler::{AssembledResponse, StreamAssembler};
pub use executor::{ToolExecutor, ToolOutcome, resolve};
pub use loop_runner::{AgentLoop, Session, TurnOutcome};
pub use prompt::system_prompt;
pub use stream_event::{AgentStreamEvent, EventSender};
