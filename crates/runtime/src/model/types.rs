use super::errors::ModelError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use store::Turn;

/// A tool definition exposed to the model.
///
/// The registry sends these verbatim on every completion request; they are
/// the model-facing contract and must match what the handlers accept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's parameters.
    pub parameters: Value,
}

/// How the model should choose tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// Model decides whether to use tools.
    Auto,
    /// Model must call at least one tool.
    Required,
}

/// Everything needed for a model request.
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Turn],
    pub tools: &'a [ToolSpec],
    pub tool_choice: ToolChoice,
}

/// Trait for LLM provider backends.
pub trait Backend: Send + Sync {
    /// Send a completion request and return the assistant turn.
    fn complete(
        &self,
        request: CompletionRequest<'_>,
    ) -> impl Future<Output = Result<Turn, ModelError>> + Send;
}
