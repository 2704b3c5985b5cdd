//! # guide-engine
//!
//! A guided browser automation engine: an LLM agent loop proposes one UI
//! action per turn, and an executor performs it visibly in the user's own
//! browser tab, with an animated pointer moving to each element first.
//!
//! ## Features
//!
//! - **Action Protocol**: a closed, strongly-typed set of UI actions with a JSON schema for the model
//! - **DOM Indexing**: interactive, visible elements get numeric indices the model refers to
//! - **Element Resolution**: an index is re-resolved against the live page before every use
//! - **Guided Execution**: scroll, settle, animate, then act, one action at a time
//! - **Agent Loop**: step budget, cancellation, pause/resume and an append-only session log
//!
//! ## Running a Guide
//!
//! The `guide-runner` binary replays recorded agent turns against a real page:
//!
//! ```bash
//! cargo run --bin guide-runner -- --url https://example.com --task "Find the docs" --turns turns.json
//!
//! # Print the JSON schema the model must follow
//! cargo run --bin guide-runner -- --print-schema
//! ```
//!
//! ## Library Usage
//!
//! ### Driving a Chrome tab
//!
//! ```rust,no_run
//! use guide_engine::{
//!     ActionExecutor, BrowserSession, GuideConfig, GuideDriver, GuideTask, InMemorySessionLog,
//!     LaunchOptions, ScriptedModel,
//! };
//! use std::sync::Arc;
//!
//! # async fn run() -> guide_engine::Result<()> {
//! let session = BrowserSession::launch(LaunchOptions::default())?;
//! session.navigate("https://example.com")?;
//!
//! let page = Arc::new(session.page()?);
//! let model = Arc::new(ScriptedModel::from_json(r#"[
//!     {"current_state": {"evaluation_previous_goal": "Unknown", "next_goal": "Finish"},
//!      "action": {"type": "done", "text": "Nothing to do", "success": true}}
//! ]"#)?);
//!
//! let mut driver = GuideDriver::new(
//!     GuideConfig::default(),
//!     model,
//!     page.clone(),
//!     Box::new(ActionExecutor::for_page(page)),
//!     Arc::new(InMemorySessionLog::new()),
//! );
//! let outcome = driver.run(GuideTask::new("Show me around")).await?;
//! println!("success: {}", outcome.success());
//! # Ok(())
//! # }
//! ```
//!
//! ### Validating model output
//!
//! ```rust
//! use guide_engine::{Action, AgentTurn};
//!
//! let turn = AgentTurn::parse(r#"{
//!     "current_state": {"evaluation_previous_goal": "Unknown", "next_goal": "Open orders"},
//!     "action": {"type": "click_element", "index": 3}
//! }"#).unwrap();
//! assert!(matches!(turn.actions()[0], Action::ClickElement { index: 3, .. }));
//!
//! // Kinds outside the protocol are rejected
//! assert!(AgentTurn::parse(r#"{
//!     "current_state": {"evaluation_previous_goal": "", "next_goal": ""},
//!     "action": {"type": "hover", "index": 3}
//! }"#).is_err());
//! ```
//!
//! ## Module Overview
//!
//! - [`protocol`]: actions, the agent envelope, the legacy adapter and prompts
//! - [`dom`]: DOM indexing, visibility, snapshots and element resolution
//! - [`guide`]: the pointer animator and the action executor
//! - [`agent`]: the model boundary, session log and the loop driver
//! - [`browser`]: Chrome session management and the CDP-backed page
//! - [`error`]: error types and result aliases

pub mod agent;
pub mod browser;
pub mod dom;
pub mod error;
pub mod guide;
pub mod protocol;

pub use agent::{
    GuideConfig, GuideDriver, GuideHandle, GuideOutcome, GuideSignal, GuideTask,
    InMemorySessionLog, Model, ModelRequest, ScriptedModel, SessionLog, Termination,
};
pub use browser::{BrowserSession, CdpPage, ConnectionOptions, LaunchOptions};
pub use dom::{DomSnapshot, DomTree, ElementNode, ElementResolver, MemoryPage, TrackingMap};
pub use error::{GuideError, Result};
pub use guide::{ActionChannel, ActionExecutor, InteractionAnimator};
pub use protocol::{Action, AgentTurn, CurrentState, ExecutionResult, agent_output_schema};
