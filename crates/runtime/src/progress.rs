//! Best-effort progress notifications for live display.

use serde::Serialize;
use serde_json::{Value, json};
use store::ToolCall;

/// A notification emitted when the model requests tool calls.
///
/// This mirrors what a push channel forwards to a browser client; it is
/// fire-and-forget and not part of the correctness contract.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressUpdate {
    pub user: &'static str,
    pub tool_calls: Vec<Value>,
}

impl ProgressUpdate {
    pub fn tool_calls(calls: &[ToolCall]) -> Self {
        Self {
            user: "AI",
            tool_calls: format_tool_calls(calls),
        }
    }
}

/// Sink for progress updates. Implementations must not block the exchange.
pub trait ProgressSink: Send + Sync {
    fn notify(&self, update: ProgressUpdate);
}

/// Render tool calls for display: arguments parsed to JSON, with any bulky
/// `content` field removed.
fn format_tool_calls(calls: &[ToolCall]) -> Vec<Value> {
    calls
        .iter()
        .map(|call| {
            let mut arguments: Value =
                serde_json::from_str(&call.function.arguments).unwrap_or(Value::Null);
            if let Some(object) = arguments.as_object_mut() {
                object.remove("content");
            }
            json!({
                "id": call.id,
                "type": "function",
                "function": {
                    "name": call.function.name,
                    "arguments": arguments,
                },
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_content_from_arguments() {
        let calls = vec![ToolCall::new(
            "call_1",
            "saveProjectFile",
            r#"{"path":"a.txt","content":"enormous blob","encoding":"utf8"}"#,
        )];
        let update = ProgressUpdate::tool_calls(&calls);
        let arguments = &update.tool_calls[0]["function"]["arguments"];
        assert_eq!(arguments["path"], "a.txt");
        assert!(arguments.get("content").is_none());
    }

    #[test]
    fn unparseable_arguments_render_as_null() {
        let calls = vec![ToolCall::new("call_1", "readProjectFile", "{broken")];
        let update = ProgressUpdate::tool_calls(&calls);
        assert_eq!(
            update.tool_calls[0]["function"]["arguments"],
            Value::Null
        );
    }
}
