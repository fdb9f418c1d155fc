//! Recovery of tool calls that a model wrote into its text instead of the
//! structured `tool_calls` field, e.g.
//! `<tool_call>{"name": "add", "arguments": {"a": 1, "b": 2}}</tool_call>`.

use crate::traits::ToolCall;
use serde::Deserialize;

const OPEN_TAG: &str = "<tool_call>";
const CLOSE_TAG: &str = "</tool_call>";

#[derive(Deserialize)]
struct InlineCall {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

/// Splits `text` into the prose outside the tags and the calls inside them.
/// An unterminated tag is left in the prose untouched.
pub fn extract(text: &str) -> (String, Vec<ToolCall>) {
    let mut prose = Vec::new();
    let mut calls = Vec::new();
    let mut remaining = text;

    while let Some(start) = remaining.find(OPEN_TAG) {
        let after_open = &remaining[start + OPEN_TAG.len()..];
        let Some(end) = after_open.find(CLOSE_TAG) else {
            break;
        };

        push_trimmed(&mut prose, &remaining[..start]);

        let stream =
            serde_json::Deserializer::from_str(&after_open[..end]).into_iter::<InlineCall>();
        for call in stream.map_while(Result::ok) {
            let arguments = match call.arguments {
                serde_json::Value::Null => "{}".to_string(),
                serde_json::Value::String(raw) => raw,
                other => other.to_string(),
            };
            calls.push(ToolCall {
                id: format!("call_{}", uuid::Uuid::new_v4().simple()),
                name: call.name,
                arguments,
            });
        }

        remaining = &after_open[end + CLOSE_TAG.len()..];
    }

    push_trimmed(&mut prose, remaining);
    (prose.join("\n"), calls)
}

fn push_trimmed(parts: &mut Vec<String>, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        parts.push(text.to_string());
    }
}
