//! Test doubles shared by the runtime's unit tests.

use crate::model::{Backend, CompletionRequest, ModelError, ToolChoice};
use std::collections::VecDeque;
use std::sync::Mutex;
use store::Turn;

/// A backend that replays a fixed script of responses and records every
/// request's message list and tool choice.
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<Turn, ModelError>>>,
    requests: Mutex<Vec<Vec<Turn>>>,
    choices: Mutex<Vec<ToolChoice>>,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Result<Turn, ModelError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
            choices: Mutex::new(Vec::new()),
        }
    }

    /// Message lists of every request seen so far.
    pub fn requests(&self) -> Vec<Vec<Turn>> {
        self.requests.lock().unwrap().clone()
    }

    /// Tool choices of every request seen so far.
    pub fn tool_choices(&self) -> Vec<ToolChoice> {
        self.choices.lock().unwrap().clone()
    }
}

impl Backend for ScriptedBackend {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Turn, ModelError> {
        self.requests
            .lock()
            .unwrap()
            .push(request.messages.to_vec());
        self.choices.lock().unwrap().push(request.tool_choice);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted backend ran out of responses")
    }
}

/// Build an assistant turn carrying the given tool calls.
pub fn assistant_tool_calls(calls: Vec<store::ToolCall>) -> Turn {
    Turn {
        role: store::Role::Assistant,
        content: None,
        tool_calls: Some(calls),
        tool_call_id: None,
        name: None,
    }
}
