//! The wire contract between the agent loop and the executor
//!
//! - [`Action`]: the closed set of UI actions, discriminated on `type`
//! - [`AgentTurn`]: the envelope carrying the agent's state and its action
//! - [`legacy`]: adapter for the deprecated multi-action sequence format
//! - [`prompt`]: system prompt, element listing and per-turn feedback

pub mod action;
pub mod envelope;
pub mod legacy;
pub mod prompt;

pub use action::{Action, ExecutionResult};
pub use envelope::{AgentTurn, CurrentState, TurnAction, agent_output_schema};
