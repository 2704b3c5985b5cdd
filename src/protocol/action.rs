use schemars::JsonSchema;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

fn default_wait_seconds() -> u64 {
    3
}

/// One discrete UI action requested by the agent.
///
/// Discriminated on `type`. Fields not listed for a kind are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum Action {
    /// Finish the task
    Done {
        /// Summary for the user, including everything found out for the task
        text: String,
        /// Whether the whole task was completed
        success: bool,
    },

    /// Pause to let the page load
    Wait {
        /// Seconds to wait
        #[serde(default = "default_wait_seconds")]
        seconds: u64,
    },

    ClickElement {
        /// Highlight index of the element in the current listing
        index: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        xpath: Option<String>,
    },

    /// Replace the contents of a text field
    InputText {
        index: usize,
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        xpath: Option<String>,
    },

    /// Type into an element without clearing it
    SendKeys { index: usize, text: String },

    ScrollToElement { index: usize },

    ScrollDown {
        /// Pixels; one page when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        amount: Option<i64>,
    },

    ScrollUp {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        amount: Option<i64>,
    },

    /// List the options of a dropdown `<select>` element
    GetDropdownOptions { index: usize },

    /// Select an option from a dropdown `<select>` element by its text
    #[serde(alias = "select_option")]
    SelectDropdownOption { index: usize, text: String },

    GoBack {},

    /// An action name this engine cannot perform (only produced by the legacy adapter)
    #[serde(skip_deserializing)]
    #[schemars(skip)]
    Unsupported { name: String },
}

impl Action {
    /// Wire name of the action kind
    pub fn kind(&self) -> &str {
        match self {
            Action::Done { .. } => "done",
            Action::Wait { .. } => "wait",
            Action::ClickElement { .. } => "click_element",
            Action::InputText { .. } => "input_text",
            Action::SendKeys { .. } => "send_keys",
            Action::ScrollToElement { .. } => "scroll_to_element",
            Action::ScrollDown { .. } => "scroll_down",
            Action::ScrollUp { .. } => "scroll_up",
            Action::GetDropdownOptions { .. } => "get_dropdown_options",
            Action::SelectDropdownOption { .. } => "select_dropdown_option",
            Action::GoBack {} => "go_back",
            Action::Unsupported { name } => name.as_str(),
        }
    }

    /// Highlight index the action targets, if any
    pub fn index(&self) -> Option<usize> {
        match self {
            Action::ClickElement { index, .. }
            | Action::InputText { index, .. }
            | Action::SendKeys { index, .. }
            | Action::ScrollToElement { index }
            | Action::GetDropdownOptions { index }
            | Action::SelectDropdownOption { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Action::Done { .. })
    }

    /// The step-budget fallback: `done{success:false}`
    pub fn give_up(text: impl Into<String>) -> Self {
        Action::Done {
            text: text.into(),
            success: false,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index() {
            Some(index) => write!(f, "{}[{}]", self.kind(), index),
            None => f.write_str(self.kind()),
        }
    }
}

/// What executing one action produced.
///
/// On the wire: `true`/`false` for effects, a string for read-only queries
/// and `{"done": {...}}` for the terminal action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    Success,
    Failure,
    Text(String),
    Terminated { success: bool, text: String },
}

impl ExecutionResult {
    pub fn from_bool(ok: bool) -> Self {
        if ok {
            ExecutionResult::Success
        } else {
            ExecutionResult::Failure
        }
    }

    /// Whether the action achieved its effect
    pub fn is_success(&self) -> bool {
        match self {
            ExecutionResult::Success | ExecutionResult::Text(_) => true,
            ExecutionResult::Failure => false,
            ExecutionResult::Terminated { success, .. } => *success,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ExecutionResult::Failure)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionResult::Terminated { .. })
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ExecutionResult::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl Serialize for ExecutionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Done<'a> {
            success: bool,
            text: &'a str,
        }

        match self {
            ExecutionResult::Success => serializer.serialize_bool(true),
            ExecutionResult::Failure => serializer.serialize_bool(false),
            ExecutionResult::Text(text) => serializer.serialize_str(text),
            ExecutionResult::Terminated { success, text } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("done", &Done { success: *success, text })?;
                map.end()
            }
        }
    }
}
