//! Session management: the tool-calling orchestration loop.

use crate::completion::CompletionClient;
use crate::model::{Backend, ToolChoice};
use crate::progress::{ProgressSink, ProgressUpdate};
use crate::tools::{ProcessSet, ToolRegistry};
use crate::{Error, Result};
use std::sync::Arc;
use store::{ContentBlock, ConversationStore, Turn, strip_transient};

/// Base developer instructions injected at the start of every session.
const DEVELOPER_PROMPT: &str = include_str!("developer.md");

/// Upper bound on tool rounds per exchange, unless overridden.
const DEFAULT_MAX_ROUNDS: usize = 32;

/// A conversation session.
///
/// One session owns one conversation: it is loaded from the store at
/// construction, mutated by [`Session::chat`] exchanges, and persisted
/// after each completed exchange. One exchange runs at a time (`&mut
/// self`); tool calls within a round run concurrently.
pub struct Session<B: Backend> {
    store: ConversationStore,
    client: CompletionClient<B>,
    tools: ToolRegistry,
    processes: ProcessSet,
    progress: Option<Arc<dyn ProgressSink>>,
    conversation: Vec<Turn>,
    max_rounds: usize,
}

impl<B: Backend> Session<B> {
    /// Create a session, loading any persisted conversation and
    /// re-injecting the current developer instructions.
    pub fn new(
        store: ConversationStore,
        client: CompletionClient<B>,
        tools: ToolRegistry,
        processes: ProcessSet,
    ) -> Result<Self> {
        let mut conversation = strip_transient(store.load()?);
        conversation.push(Turn::developer(DEVELOPER_PROMPT));

        Ok(Self {
            store,
            client,
            tools,
            processes,
            progress: None,
            conversation,
            max_rounds: DEFAULT_MAX_ROUNDS,
        })
    }

    /// Layer project-specific instructions onto the base developer message.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.conversation.push(Turn::developer(instructions));
        self
    }

    /// Attach a sink for best-effort tool-call progress notifications.
    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Bound the number of tool rounds per exchange.
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// The current conversation, including instruction turns.
    pub fn conversation(&self) -> &[Turn] {
        &self.conversation
    }

    /// Send a plain-text user message.
    pub async fn chat_text(&mut self, text: &str) -> Result<String> {
        self.chat(vec![ContentBlock::text(text)]).await
    }

    /// Run one exchange: user message in, final assistant text out.
    ///
    /// Each round sends the conversation and tool schemas to the model.
    /// A reply carrying tool calls is dispatched (all calls concurrently,
    /// results joined before the next round); a plain reply ends the
    /// exchange. The conversation is persisted once the exchange
    /// completes, or before failing with [`Error::RoundLimit`], so a
    /// runaway model loses no history.
    ///
    /// Context-overflow recovery may shrink the working copy sent to the
    /// provider; the persisted conversation keeps the full history.
    pub async fn chat(&mut self, message: Vec<ContentBlock>) -> Result<String> {
        let mut working = self.conversation.clone();
        self.append(Turn::user_blocks(message), &mut working);

        // Bias the first round toward acting; follow-ups decide freely.
        let mut tool_choice = ToolChoice::Required;

        for _round in 0..self.max_rounds {
            let reply = self
                .client
                .complete(&mut working, self.tools.specs(), tool_choice)
                .await?;
            tool_choice = ToolChoice::Auto;

            let Some(calls) = reply.tool_calls.clone().filter(|c| !c.is_empty()) else {
                let text = reply.text();
                self.append(reply, &mut working);
                self.store.persist(&self.conversation)?;
                return Ok(text);
            };

            self.append(reply, &mut working);

            if let Some(sink) = &self.progress {
                sink.notify(ProgressUpdate::tool_calls(&calls));
            }

            let results =
                futures::future::join_all(calls.iter().map(|call| self.tools.dispatch(call)))
                    .await;
            for result in results {
                self.append(result, &mut working);
            }
        }

        self.store.persist(&self.conversation)?;
        Err(Error::RoundLimit {
            rounds: self.max_rounds,
        })
    }

    fn append(&mut self, turn: Turn, working: &mut Vec<Turn>) {
        working.push(turn.clone());
        self.conversation.push(turn);
    }

    /// End the session, reaping any processes started by tools.
    pub async fn end(self) {
        self.processes.kill_all().await;
    }
}
