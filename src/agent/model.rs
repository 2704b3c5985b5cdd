//! The LLM boundary.
//!
//! The engine treats the model as an opaque function from a request to one
//! raw structured response; validation happens in the driver.

use crate::error::{GuideError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    /// Result of executing the previous action
    Tool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn tool(content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
        }
    }
}

/// Everything the model sees for one turn
#[derive(Debug, Clone, Serialize)]
pub struct ModelRequest {
    pub system_prompt: String,
    pub messages: Vec<ChatMessage>,

    /// JSON schema the response must conform to
    pub schema: Value,

    /// Base64 PNG of the viewport
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
}

/// One structured response per call, with no retries beyond what the
/// implementation does natively
#[async_trait]
pub trait Model: Send + Sync {
    async fn next_turn(&self, request: &ModelRequest) -> Result<Value>;
}

/// Replays a recorded list of agent turns in order
#[derive(Debug, Default)]
pub struct ScriptedModel {
    turns: Mutex<VecDeque<Value>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    pub fn new(turns: impl IntoIterator<Item = Value>) -> Self {
        Self {
            turns: Mutex::new(turns.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Load turns from a JSON array
    pub fn from_json(json: &str) -> Result<Self> {
        let turns: Vec<Value> = serde_json::from_str(json)?;
        Ok(Self::new(turns))
    }

    /// Number of calls received so far
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn remaining(&self) -> usize {
        self.turns.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl Model for ScriptedModel {
    async fn next_turn(&self, request: &ModelRequest) -> Result<Value> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        self.turns
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .ok_or_else(|| GuideError::ModelFailed("No scripted turns left".to_string()))
    }
}

/// Repeats the same response forever
#[derive(Debug, Clone)]
pub struct RepeatingModel {
    turn: Value,
}

impl RepeatingModel {
    pub fn new(turn: Value) -> Self {
        Self { turn }
    }
}

#[async_trait]
impl Model for RepeatingModel {
    async fn next_turn(&self, _request: &ModelRequest) -> Result<Value> {
        Ok(self.turn.clone())
    }
}
