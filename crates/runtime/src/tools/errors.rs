use thiserror::Error;

/// Errors that can occur during tool execution.
///
/// These never cross the registry boundary as `Err`: the dispatcher folds
/// them into tool-result turns so the model can see the failure and adapt.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool is not registered.
    #[error("Unknown tool: {0}")]
    NotFound(String),

    /// Arguments did not match the tool's parameter schema.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A path escaped the sandbox root.
    #[error(transparent)]
    Sandbox(#[from] sandbox::Error),

    /// The tool ran but failed.
    #[error("{0}")]
    Execution(String),
}
