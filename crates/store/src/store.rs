//! JSON-file conversation store.

use crate::{Result, Role, Turn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// File name of the persisted conversation inside the output directory.
const CONVERSATION_FILE: &str = "codechat.json";

/// Persisted conversation backed by a JSON file.
///
/// The store assumes a single writer: one process per output directory.
/// There is no file locking; writes are atomic (write-then-rename), so a
/// violated assumption loses turns but never leaves the file unparseable.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    path: PathBuf,
}

impl ConversationStore {
    /// Create a store backed by `<dir>/codechat.json`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(CONVERSATION_FILE),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted conversation, or an empty one if none exists.
    pub fn load(&self) -> Result<Vec<Turn>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(|source| crate::Error::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Persist the full turn sequence, replacing the previous file.
    ///
    /// The JSON is pretty-printed and written to a temp file in the same
    /// directory, then renamed over the target, so the file stays
    /// parseable even if the process dies mid-write.
    pub fn persist(&self, turns: &[Turn]) -> Result<()> {
        let json = serde_json::to_string_pretty(turns)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Remove turns that must not survive a reload.
///
/// Stored `system`, `developer`, and legacy `function` turns are stale: the
/// current developer instructions are re-injected at session start. Tool
/// result turns whose `tool_call_id` does not reference the immediately
/// preceding assistant turn are corruption and are dropped as well.
pub fn strip_transient(turns: Vec<Turn>) -> Vec<Turn> {
    let mut out: Vec<Turn> = Vec::with_capacity(turns.len());
    let mut pending_ids: HashSet<String> = HashSet::new();

    for turn in turns {
        match turn.role {
            Role::System | Role::Developer | Role::Function => continue,
            Role::Tool => {
                let linked = turn
                    .tool_call_id
                    .as_ref()
                    .is_some_and(|id| pending_ids.contains(id));
                if linked {
                    out.push(turn);
                } else {
                    tracing::warn!(
                        tool_call_id = turn.tool_call_id.as_deref().unwrap_or(""),
                        "dropping dangling tool result from persisted conversation"
                    );
                }
            }
            Role::Assistant | Role::User => {
                pending_ids = turn
                    .tool_calls
                    .iter()
                    .flatten()
                    .map(|call| call.id.clone())
                    .collect();
                out.push(turn);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToolCall;
    use tempfile::TempDir;

    #[test]
    fn load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = ConversationStore::new(dir.path());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn persist_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = ConversationStore::new(dir.path());
        let turns = vec![Turn::user("hello"), Turn::assistant("hi there")];

        store.persist(&turns).unwrap();
        assert_eq!(store.load().unwrap(), turns);
    }

    #[test]
    fn persist_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let store = ConversationStore::new(dir.path());
        store.persist(&[Turn::user("x")]).unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("codechat.json")]);
    }

    #[test]
    fn persisted_file_is_pretty_json() {
        let dir = TempDir::new().unwrap();
        let store = ConversationStore::new(dir.path());
        store.persist(&[Turn::user("x")]).unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        assert!(content.contains('\n'));
        serde_json::from_str::<Vec<Turn>>(&content).unwrap();
    }

    #[test]
    fn strip_removes_instruction_roles() {
        let turns = vec![
            Turn::developer("instructions"),
            Turn {
                role: Role::System,
                content: Some(crate::Content::Text("old system".into())),
                tool_calls: None,
                tool_call_id: None,
                name: None,
            },
            Turn::user("hello"),
            Turn::assistant("hi"),
        ];
        let stripped = strip_transient(turns);
        assert_eq!(stripped.len(), 2);
        assert_eq!(stripped[0].role, Role::User);
    }

    #[test]
    fn strip_keeps_linked_tool_results() {
        let assistant = Turn {
            role: Role::Assistant,
            content: None,
            tool_calls: Some(vec![ToolCall::new("call_1", "readProjectFile", "{}")]),
            tool_call_id: None,
            name: None,
        };
        let turns = vec![
            Turn::user("read it"),
            assistant,
            Turn::tool_result("readProjectFile", "call_1", "\"data\""),
            Turn::assistant("done"),
        ];
        assert_eq!(strip_transient(turns).len(), 4);
    }

    #[test]
    fn strip_drops_dangling_tool_results() {
        let turns = vec![
            Turn::user("hello"),
            Turn::tool_result("readProjectFile", "call_missing", "\"data\""),
            Turn::assistant("hi"),
        ];
        let stripped = strip_transient(turns);
        assert_eq!(stripped.len(), 2);
        assert!(stripped.iter().all(|t| t.role != Role::Tool));
    }
}
