//! Adapter for the deprecated multi-action wire format.
//!
//! Each item is an object with exactly one non-null key naming the action,
//! e.g. `{"click_element": {"index": 3}}`. Items are converted to the
//! canonical [`Action`]; kinds this engine cannot perform become
//! [`Action::Unsupported`].

use crate::protocol::action::Action;
use serde_json::{Map, Value};

/// Legacy kinds that map directly onto a canonical action
const CANONICAL_KINDS: [&str; 9] = [
    "done",
    "go_back",
    "wait",
    "click_element",
    "input_text",
    "scroll_down",
    "scroll_up",
    "get_dropdown_options",
    "select_dropdown_option",
];

/// Convert one legacy item
pub fn adapt_item(item: &Value) -> Result<Action, String> {
    let object = item
        .as_object()
        .ok_or_else(|| format!("expected an action object, got {}", item))?;

    let mut present = object.iter().filter(|(_, v)| !v.is_null());
    let (name, payload) = match (present.next(), present.next()) {
        (Some(entry), None) => entry,
        (None, _) => return Err("action item has no action set".to_string()),
        (Some((first, _)), Some((second, _))) => {
            return Err(format!(
                "action item sets more than one action ({}, {})",
                first, second
            ));
        }
    };

    if !CANONICAL_KINDS.contains(&name.as_str()) {
        log::warn!("Legacy action '{}' is not supported by the guide executor", name);
        return Ok(Action::Unsupported { name: name.clone() });
    }

    let mut fields = match payload {
        Value::Object(fields) => fields.clone(),
        other => return Err(format!("parameters of '{}' must be an object, got {}", name, other)),
    };
    fields.insert("type".to_string(), Value::String(name.clone()));

    serde_json::from_value(Value::Object(fields)).map_err(|e| format!("invalid '{}': {}", name, e))
}

/// Convert a whole legacy sequence; it must not be empty
pub fn adapt_sequence(items: &[Value]) -> Result<Vec<Action>, String> {
    if items.is_empty() {
        return Err("action list must contain at least one action".to_string());
    }
    items
        .iter()
        .enumerate()
        .map(|(i, item)| adapt_item(item).map_err(|e| format!("action[{}]: {}", i, e)))
        .collect()
}

/// Render a canonical action in the legacy single-key form
pub fn to_legacy(action: &Action) -> Value {
    let mut fields = match serde_json::to_value(action) {
        Ok(Value::Object(fields)) => fields,
        _ => Map::new(),
    };
    fields.remove("type");

    let mut item = Map::new();
    item.insert(action.kind().to_string(), Value::Object(fields));
    Value::Object(item)
}
