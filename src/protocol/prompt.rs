//! Text the agent loop sends to the model.

use crate::dom::page::PageLocation;
use crate::dom::snapshot::DomSnapshot;
use crate::protocol::action::{Action, ExecutionResult};

const ANONYMOUS_USER: &str = "Anonymous user";

const SYSTEM_PROMPT: &str = r#"You are an AI agent that guides users through {mailbox_name} by operating their browser for them. Accomplish the task by following the rules below.

# Input Format
Task
Previous steps
Current URL
Interactive Elements
[index]<type>text</type>
- index: numeric identifier used to interact with the element
- type: HTML element type (button, input, select, ...)
- text: element description
Example:
[33]<button>Submit Form</button>

Only elements with a numeric index in [] are interactive. Indexes are only valid for the element listing you were just given.

# Response Rules
1. RESPONSE FORMAT: always respond with JSON matching the AgentOutput schema:
{"current_state": {"evaluation_previous_goal": "Success|Failed|Unknown - check the current elements to decide whether the previous goal was achieved. Mention anything unexpected and say briefly why",
"next_goal": "What the next immediate action must achieve",
"completed_steps": [1, 2]},
"action": {"type": "action-type", ...action parameters}}

2. ACTION: exactly one action per response. The page is indexed again after every action.

3. ELEMENT INTERACTION: only use indexes from the current listing.

4. NAVIGATION & ERROR HANDLING:
- If no suitable element exists, scroll to look for it or go back
- Close or accept popups and cookie banners
- If the page is not fully loaded, use the wait action

5. TASK COMPLETION:
- Use the done action as soon as the task is complete
- Do not use done before everything the user asked for is finished, unless you reach the last allowed step
- At the last step, use done even if the task is unfinished: set success to true only if the whole task is complete, otherwise false
- Include everything you found out for the task in the done text
- Never invent actions

6. FORM FILLING: if an input changes the page (e.g. suggestions appear), re-check the elements before continuing.

Current user email: {user_email}"#;

/// The system prompt for one guide session
pub fn system_prompt(mailbox_name: &str, user_email: Option<&str>) -> String {
    SYSTEM_PROMPT
        .replace("{mailbox_name}", mailbox_name)
        .replace("{user_email}", user_email.unwrap_or(ANONYMOUS_USER))
}

/// One line per indexed element: `[index]<tag>text</tag>`
pub fn element_listing(snapshot: &DomSnapshot) -> String {
    if snapshot.elements.is_empty() {
        return "(no interactive elements)".to_string();
    }

    snapshot
        .elements
        .iter()
        .map(|(index, element)| {
            let text = element
                .text
                .as_deref()
                .filter(|t| !t.is_empty())
                .or_else(|| element.attributes.get("aria-label").map(String::as_str))
                .unwrap_or_default();
            format!("[{}]<{}>{}</{}>", index, element.tag_name, text, element.tag_name)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// First user message of a session
pub fn initial_message(
    instructions: &str,
    plan: &[String],
    location: &PageLocation,
    snapshot: &DomSnapshot,
    resumed: bool,
) -> String {
    let mut message = format!(
        "Your ultimate task is: \"\"\"{}\"\"\".\n\
         If you achieved your ultimate task, stop everything and use the done action in the next step to complete the task. If not, continue as usual.\n",
        instructions
    );

    if !plan.is_empty() {
        message.push_str("\nPlan:\n");
        for (i, step) in plan.iter().enumerate() {
            message.push_str(&format!("{}. {}\n", i + 1, step));
        }
    }

    message.push_str(&format!(
        "\nCurrent URL: {}\nCurrent Page Title: {}\nCurrent Elements:\n{}",
        location.url,
        location.title,
        element_listing(snapshot)
    ));

    if resumed {
        message.push_str(
            "\n\nWe are resuming the guide. Check whether the plan is still valid for the current page; the elements have changed since the last step.",
        );
    }
    message
}

/// Feedback for the model after an action ran, built from the fresh snapshot
pub fn action_feedback(
    action: &Action,
    result: &ExecutionResult,
    location: &PageLocation,
    snapshot: &DomSnapshot,
) -> String {
    if result.is_failure() {
        return format!(
            "Failed to execute action. Current elements:\n{}",
            element_listing(snapshot)
        );
    }

    let mut message = format!("Executed the last action: {}.\n", action.kind());
    if let Some(text) = result.as_text() {
        message.push_str(&format!("Result: {}\n", text));
    }
    message.push_str(&format!(
        "\nNow, the current URL is: {}\nCurrent Page Title: {}\nElements:\n{}",
        location.url,
        location.title,
        element_listing(snapshot)
    ));
    message
}

/// Feedback when the page could not be read after an action; the listing
/// is the last one that could be
pub fn unreadable_page_feedback(
    action: &Action,
    result: &ExecutionResult,
    error: &str,
    snapshot: &DomSnapshot,
) -> String {
    let mut message = if result.is_failure() {
        "Failed to execute action.\n".to_string()
    } else {
        format!("Executed the last action: {}.\n", action.kind())
    };
    if let Some(text) = result.as_text() {
        message.push_str(&format!("Result: {}\n", text));
    }
    message.push_str(&format!(
        "\nThe page could not be read afterwards ({}). It may still be loading; use the wait action before interacting.\nLast known elements:\n{}",
        error,
        element_listing(snapshot)
    ));
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::tracking::{TrackedElement, TrackingMap};

    fn snapshot() -> DomSnapshot {
        let mut map = TrackingMap::new();
        map.register(TrackedElement::new("/html/body/button", "button").with_text("Request refund"));
        map.register(
            TrackedElement::new("/html/body/input", "input").with_attribute("aria-label", "Email"),
        );
        DomSnapshot::new("https://shop.example/orders", "Orders", map)
    }

    fn location() -> PageLocation {
        PageLocation {
            url: "https://shop.example/orders".into(),
            title: "Orders".into(),
        }
    }

    #[test]
    fn test_system_prompt_placeholders() {
        let prompt = system_prompt("Gumroad", Some("buyer@example.com"));
        assert!(prompt.contains("guides users through Gumroad"));
        assert!(prompt.contains("Current user email: buyer@example.com"));
        assert!(prompt.contains("[index]<type>text</type>"));
        assert!(!prompt.contains("{mailbox_name}"));

        assert!(system_prompt("Gumroad", None).ends_with("Anonymous user"));
    }

    #[test]
    fn test_element_listing() {
        assert_eq!(
            element_listing(&snapshot()),
            "[0]<button>Request refund</button>\n[1]<input>Email</input>"
        );

        let empty = DomSnapshot::new("about:blank", "", TrackingMap::new());
        assert_eq!(element_listing(&empty), "(no interactive elements)");
    }

    #[test]
    fn test_initial_message() {
        let plan = vec!["Open orders".to_string(), "Request refund".to_string()];
        let message = initial_message("Refund my order", &plan, &location(), &snapshot(), false);

        assert!(message.starts_with("Your ultimate task is: \"\"\"Refund my order\"\"\"."));
        assert!(message.contains("1. Open orders\n2. Request refund"));
        assert!(message.contains("Current Page Title: Orders"));
        assert!(!message.contains("resuming"));

        let resumed = initial_message("Refund my order", &[], &location(), &snapshot(), true);
        assert!(resumed.contains("We are resuming the guide."));
        assert!(!resumed.contains("Plan:"));
    }

    #[test]
    fn test_feedback_on_success_and_failure() {
        let click = Action::ClickElement { index: 0, xpath: None };

        let ok = action_feedback(&click, &ExecutionResult::Success, &location(), &snapshot());
        assert!(ok.starts_with("Executed the last action: click_element."));
        assert!(ok.contains("Now, the current URL is: https://shop.example/orders"));
        assert!(ok.contains("[0]<button>Request refund</button>"));

        let failed = action_feedback(&click, &ExecutionResult::Failure, &location(), &snapshot());
        assert!(failed.starts_with("Failed to execute action. Current elements:"));
    }

    #[test]
    fn test_feedback_includes_dropdown_options() {
        let action = Action::GetDropdownOptions { index: 3 };
        let result = ExecutionResult::Text("Damaged, Late".into());
        let message = action_feedback(&action, &result, &location(), &snapshot());
        assert!(message.contains("Result: Damaged, Late"));
    }

    #[test]
    fn test_unreadable_page_feedback_keeps_last_listing() {
        let click = Action::ClickElement { index: 0, xpath: None };

        let message =
            unreadable_page_feedback(&click, &ExecutionResult::Success, "target closed", &snapshot());
        assert!(message.starts_with("Executed the last action: click_element."));
        assert!(message.contains("could not be read afterwards (target closed)"));
        assert!(message.contains("Last known elements:\n[0]<button>Request refund</button>"));

        let failed =
            unreadable_page_feedback(&click, &ExecutionResult::Failure, "timeout", &snapshot());
        assert!(failed.starts_with("Failed to execute action."));
    }
}
