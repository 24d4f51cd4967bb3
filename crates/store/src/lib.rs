//! JSON-file persistence for codechat conversations.
//!
//! This crate provides the conversation data model and its on-disk form.
//! The persisted file is a JSON array of [`Turn`]s in the provider wire
//! format, so what is stored is exactly what is sent.
//!
//! # Core Concepts
//!
//! ## Turn
//!
//! A [`Turn`] is one message-equivalent unit: a user message, an assistant
//! reply (optionally carrying [`ToolCall`] requests), or a tool result
//! linked back to its request by `tool_call_id`.
//!
//! ## ConversationStore
//!
//! The [`ConversationStore`] reads and atomically rewrites the conversation
//! file. It is written once per completed exchange, not per tool round, so
//! a crash loses at most the in-flight exchange.
//!
//! # Example
//!
//! ```no_run
//! use store::{ConversationStore, Turn, strip_transient};
//!
//! let store = ConversationStore::new("./out");
//! let mut turns = strip_transient(store.load()?);
//! turns.push(Turn::user("create foo.txt"));
//! store.persist(&turns)?;
//! # Ok::<(), store::Error>(())
//! ```

mod error;
mod store;
mod turn;

pub use error::{Error, Result};
pub use store::{ConversationStore, strip_transient};
pub use turn::{Content, ContentBlock, FunctionCall, ImageUrl, Role, ToolCall, Turn};
