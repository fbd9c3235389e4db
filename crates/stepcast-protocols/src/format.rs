//! Step-text formatting.
//!
//! [`describe`] works on loosely shaped JSON rather than [`InteractionEvent`]
//! because the relay carries whatever producers send; fields such as `text`,
//! `name`, `selected` or `url` are accepted as fallbacks.
//!
//! [`InteractionEvent`]: crate::InteractionEvent

use serde_json::Value;

/// Collapse every run of whitespace to a single space and trim both ends.
pub fn normalize_text(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First non-empty field among `keys`, with numbers rendered as text.
fn first_field(payload: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match payload.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        _ => false,
    }
}

/// Render a relayed payload as a reproduction step, or `None` to drop it.
pub fn describe(payload: &Value) -> Option<String> {
    let label = first_field(payload, &["label", "text", "name"]);
    let value = first_field(payload, &["value", "selected", "input"]);

    match payload.get("type").and_then(Value::as_str) {
        Some("click") => label.map(|l| format!("Click \"{l}\"")),
        Some("input") if label.is_some() || value.is_some() => Some(format!(
            "Enter \"{}\" into \"{}\"",
            value.as_deref().unwrap_or("[value]"),
            label.as_deref().unwrap_or("[field]")
        )),
        Some("select") if label.is_some() || value.is_some() => Some(format!(
            "Select \"{}\" from \"{}\"",
            value.as_deref().unwrap_or("[option]"),
            label.as_deref().unwrap_or("[dropdown]")
        )),
        Some("input") | Some("select") => None,
        Some("toggle") => {
            let label = label?;
            if is_truthy(payload.get("checked")) {
                Some(format!("Enable \"{label}\""))
            } else {
                Some(format!("Disable \"{label}\""))
            }
        }
        Some("navigation") => {
            first_field(payload, &["url", "path"]).map(|url| format!("Navigate to \"{url}\""))
        }
        Some("error") => {
            first_field(payload, &["message"]).map(|m| format!("See error \"{m}\""))
        }
        _ => first_field(payload, &["text"]),
    }
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;
