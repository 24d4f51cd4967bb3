//! Tool-calling agent runtime.
//!
//! The runtime turns one user message into one completed exchange: the
//! conversation plus tool schemas go to a model [`Backend`], tool calls in
//! the reply are dispatched through a [`ToolRegistry`] against a sandboxed
//! project folder, and the loop repeats until the model answers in plain
//! text. [`Session`] owns the loop and the persisted conversation.
//!
//! ```ignore
//! let sandbox = Arc::new(Sandbox::new("./project")?);
//! let processes = ProcessSet::new();
//! let tools = ToolRegistry::builtin(sandbox, processes.clone());
//! let client = CompletionClient::new(OpenAiBackend::new(api_key), "gpt-4o");
//! let store = ConversationStore::new("./project");
//!
//! let mut session = Session::new(store, client, tools, processes)?;
//! let answer = session.chat_text("add a README").await?;
//! session.end().await;
//! ```

mod completion;
mod error;
pub mod model;
mod progress;
mod providers;
mod session;
#[cfg(test)]
mod testing;
pub mod tools;

pub use completion::CompletionClient;
pub use error::{Error, Result};
pub use model::{Backend, CompletionRequest, ModelError, ToolChoice, ToolSpec};
pub use progress::{ProgressSink, ProgressUpdate};
pub use providers::{OpenAiBackend, OpenAiBackendBuilder};
pub use session::Session;
pub use tools::{ProcessSet, Tool, ToolError, ToolRegistry};
