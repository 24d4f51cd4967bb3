//! Built-in tools and the registry that dispatches model tool calls.

mod errors;
mod fs;
mod process;
mod web;

pub use errors::ToolError;
pub use fs::{
    DeleteProjectFile, DeleteProjectFolder, FindProjectFilesByContent, FindProjectFilesByName,
    ListProjectFiles, ReadProjectFile, SaveProjectFile,
};
pub use process::{ExecuteCommand, ProcessSet, StartCommand};
pub use web::ReadWebPage;

use crate::model::ToolSpec;
use async_trait::async_trait;
use sandbox::Sandbox;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use store::{ToolCall, Turn};

/// A locally executable tool.
///
/// This is the boundary between the model loop and side effects. Handlers
/// return `Err` only for failures the model should see as errors; expected
/// domain outcomes (a missing file on read, a failing command) are part of
/// the `Ok` payload so the model can adapt.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The model-facing definition of this tool.
    fn spec(&self) -> ToolSpec;

    /// Execute the tool with already-parsed JSON arguments.
    async fn run(&self, args: Value) -> Result<Value, ToolError>;
}

/// Parse a tool's JSON arguments into its typed argument struct.
fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|e| ToolError::InvalidInput(e.to_string()))
}

/// Maps tool names to handlers and dispatches model tool calls.
///
/// Registered once at startup; immutable afterwards.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    specs: Vec<ToolSpec>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the full built-in tool set.
    pub fn builtin(sandbox: Arc<Sandbox>, processes: ProcessSet) -> Self {
        let mut registry = Self::new();
        registry.register(FindProjectFilesByName::new(sandbox.clone()));
        registry.register(FindProjectFilesByContent::new(sandbox.clone()));
        registry.register(ListProjectFiles::new(sandbox.clone()));
        registry.register(ReadProjectFile::new(sandbox.clone()));
        registry.register(SaveProjectFile::new(sandbox.clone()));
        registry.register(DeleteProjectFolder::new(sandbox.clone()));
        registry.register(DeleteProjectFile::new(sandbox.clone()));
        registry.register(ExecuteCommand::new(sandbox.clone()));
        registry.register(StartCommand::new(sandbox, processes));
        registry.register(ReadWebPage::new());
        registry
    }

    /// Add a tool. Names must be unique.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let spec = tool.spec();
        debug_assert!(
            self.specs.iter().all(|s| s.name != spec.name),
            "duplicate tool name: {}",
            spec.name
        );
        self.specs.push(spec);
        self.tools.push(Arc::new(tool));
    }

    /// The provider-facing tool definitions.
    pub fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    fn find(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.specs
            .iter()
            .position(|spec| spec.name == name)
            .map(|i| &self.tools[i])
    }

    /// Execute one tool call, always yielding a tool-result turn.
    ///
    /// Unknown tools and malformed arguments become error text in the
    /// result rather than failing the exchange; the model retries with a
    /// corrected call. Unknown tool names additionally log at error level
    /// since they indicate a schema/handler mismatch, not a model mistake.
    pub async fn dispatch(&self, call: &ToolCall) -> Turn {
        let name = call.function.name.as_str();

        let content = match self.find(name) {
            None => {
                tracing::error!(tool = name, "model requested an unregistered tool");
                ToolError::NotFound(name.to_string()).to_string()
            }
            Some(tool) => match serde_json::from_str::<Value>(&call.function.arguments) {
                Err(e) => format!("Error parsing arguments: {e}"),
                Ok(args) => {
                    tracing::info!(tool = name, id = %call.id, "executing tool call");
                    match tool.run(args).await {
                        Ok(value) => value.to_string(),
                        Err(e) => {
                            tracing::warn!(tool = name, error = %e, "tool call failed");
                            format!("Error executing tool: {e}")
                        }
                    }
                }
            },
        };

        Turn::tool_result(name, &call.id, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn registry() -> (TempDir, ToolRegistry) {
        let dir = TempDir::new().unwrap();
        let sandbox = Arc::new(Sandbox::new(dir.path()).unwrap());
        let registry = ToolRegistry::builtin(sandbox, ProcessSet::new());
        (dir, registry)
    }

    #[test]
    fn builtin_registry_exposes_all_tools() {
        let (_dir, registry) = registry();
        let names: Vec<_> = registry.specs().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "findProjectFilesByName",
                "findProjectFilesByContent",
                "listProjectFiles",
                "readProjectFile",
                "saveProjectFile",
                "deleteProjectFolder",
                "deleteProjectFile",
                "executeCommand",
                "startCommand",
                "readWebPage",
            ]
        );
    }

    #[tokio::test]
    async fn unknown_tool_becomes_error_result() {
        let (_dir, registry) = registry();
        let call = ToolCall::new("call_1", "launchMissiles", "{}");

        let turn = registry.dispatch(&call).await;
        assert_eq!(turn.tool_call_id.as_deref(), Some("call_1"));
        assert!(turn.text().contains("Unknown tool: launchMissiles"));
    }

    #[tokio::test]
    async fn malformed_arguments_become_error_result() {
        let (_dir, registry) = registry();
        let call = ToolCall::new("call_2", "readProjectFile", "{not json");

        let turn = registry.dispatch(&call).await;
        assert!(turn.text().starts_with("Error parsing arguments:"));
    }

    #[tokio::test]
    async fn sandbox_escape_becomes_error_result() {
        let (_dir, registry) = registry();
        let call = ToolCall::new(
            "call_3",
            "saveProjectFile",
            r#"{"path":"../evil.txt","content":"x","encoding":"utf8"}"#,
        );

        let turn = registry.dispatch(&call).await;
        assert!(turn.text().contains("escapes the output directory"));
    }
}
