use crate::error::{GuideError, Result};
use crate::protocol::action::Action;
use crate::protocol::legacy;
use schemars::JsonSchema;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The agent's self-reported progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CurrentState {
    /// Success|Failed|Unknown - whether the previous goal was achieved, and why
    pub evaluation_previous_goal: String,

    /// What has been done and what must be remembered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,

    /// What the next action should achieve
    pub next_goal: String,

    /// 1-based numbers of the plan steps that are complete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_steps: Option<Vec<usize>>,
}

impl CurrentState {
    pub fn new(evaluation_previous_goal: impl Into<String>, next_goal: impl Into<String>) -> Self {
        Self {
            evaluation_previous_goal: evaluation_previous_goal.into(),
            memory: None,
            next_goal: next_goal.into(),
            completed_steps: None,
        }
    }

    pub fn with_memory(mut self, memory: impl Into<String>) -> Self {
        self.memory = Some(memory.into());
        self
    }

    pub fn with_completed_steps(mut self, steps: Vec<usize>) -> Self {
        self.completed_steps = Some(steps);
        self
    }
}

/// The `action` member: one canonical action, or a legacy sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TurnAction {
    Single(Action),
    Sequence(Vec<Action>),
}

impl TurnAction {
    pub fn actions(&self) -> &[Action] {
        match self {
            TurnAction::Single(action) => std::slice::from_ref(action),
            TurnAction::Sequence(actions) => actions,
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, TurnAction::Sequence(_))
    }
}

impl<'de> Deserialize<'de> for TurnAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            value @ Value::Object(_) => serde_json::from_value(value)
                .map(TurnAction::Single)
                .map_err(de::Error::custom),
            Value::Array(items) => legacy::adapt_sequence(&items)
                .map(TurnAction::Sequence)
                .map_err(de::Error::custom),
            other => Err(de::Error::custom(format!(
                "action must be an object or an array, got {}",
                other
            ))),
        }
    }
}

/// One structured model response.
///
/// `current_state` and `action` are validated strictly. Unknown top-level
/// keys are kept in `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AgentTurn {
    pub current_state: CurrentState,

    /// Only one action at a time
    #[schemars(with = "Action")]
    pub action: TurnAction,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AgentTurn {
    pub fn new(current_state: CurrentState, action: Action) -> Self {
        Self {
            current_state,
            action: TurnAction::Single(action),
            extra: Map::new(),
        }
    }

    /// Validate a raw model response
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| GuideError::InvalidAction(e.to_string()))
    }

    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| GuideError::InvalidAction(e.to_string()))
    }

    pub fn actions(&self) -> &[Action] {
        self.action.actions()
    }
}

/// JSON schema of [`AgentTurn`], handed to the model as its output contract
pub fn agent_output_schema() -> Value {
    schemars::schema_for!(AgentTurn).to_value()
}
