//! Command execution tools and the set of children they leave running.

use super::{Tool, ToolError, parse_args};
use crate::model::ToolSpec;
use async_trait::async_trait;
use sandbox::Sandbox;
use serde::Deserialize;
use serde_json::{Value, json};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

/// Milliseconds `startCommand` waits before returning and letting the
/// child keep running.
const DEFAULT_START_TIMEOUT_MS: u64 = 5000;

fn shell_command(command: &str) -> Command {
    #[cfg(unix)]
    {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd
    }
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    }
}

/// Children spawned by `startCommand`, owned by the session.
///
/// The session kills whatever is still running when it ends, so a started
/// dev server does not outlive the conversation that started it.
#[derive(Debug, Clone, Default)]
pub struct ProcessSet {
    children: Arc<Mutex<Vec<Child>>>,
}

impl ProcessSet {
    pub fn new() -> Self {
        Self::default()
    }

    async fn track(&self, child: Child) {
        self.children.lock().await.push(child);
    }

    /// Number of tracked children that have not yet exited.
    pub async fn active(&self) -> usize {
        let mut children = self.children.lock().await;
        children
            .iter_mut()
            .map(|child| child.try_wait())
            .filter(|status| matches!(status, Ok(None)))
            .count()
    }

    /// Kill and reap every tracked child.
    pub async fn kill_all(&self) {
        let mut children = self.children.lock().await;
        let count = children.len();
        for mut child in children.drain(..) {
            let _ = child.kill().await;
        }
        if count > 0 {
            tracing::info!(count, "killed remaining started commands");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// executeCommand
// ─────────────────────────────────────────────────────────────────────────────

pub struct ExecuteCommand {
    sandbox: Arc<Sandbox>,
}

impl ExecuteCommand {
    pub fn new(sandbox: Arc<Sandbox>) -> Self {
        Self { sandbox }
    }
}

#[derive(Deserialize)]
struct ExecuteCommandArgs {
    path: String,
    command: String,
}

#[async_trait]
impl Tool for ExecuteCommand {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "executeCommand".into(),
            description: "Allows to execute commands like npm / git or aws cli relative to the \
                          project folder, and returns the output so you can check it"
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "The path under which the command should be executed",
                    },
                    "command": {
                        "type": "string",
                        "description": "The command that should be executed",
                    },
                },
                "required": ["path", "command"],
            }),
        }
    }

    /// Always resolves: the model inspects `{stdout, stderr, error}` and
    /// decides what to do with a failure.
    async fn run(&self, args: Value) -> Result<Value, ToolError> {
        let args: ExecuteCommandArgs = parse_args(args)?;
        let cwd = self.sandbox.resolve(&args.path)?;

        tracing::info!(command = %args.command, cwd = %cwd.display(), "executing command");

        match shell_command(&args.command).current_dir(&cwd).output().await {
            Ok(output) => Ok(json!({
                "stdout": String::from_utf8_lossy(&output.stdout),
                "stderr": String::from_utf8_lossy(&output.stderr),
                "error": if output.status.success() {
                    Value::Null
                } else {
                    json!(format!("Command failed: {}", output.status))
                },
            })),
            Err(e) => Ok(json!({
                "stdout": "",
                "stderr": "",
                "error": format!("Error executing command: {e}"),
            })),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// startCommand
// ─────────────────────────────────────────────────────────────────────────────

pub struct StartCommand {
    sandbox: Arc<Sandbox>,
    processes: ProcessSet,
}

impl StartCommand {
    pub fn new(sandbox: Arc<Sandbox>, processes: ProcessSet) -> Self {
        Self { sandbox, processes }
    }
}

#[derive(Deserialize)]
struct StartCommandArgs {
    path: String,
    command: String,
    timeout: Option<u64>,
}

async fn pump(mut reader: impl AsyncRead + Unpin, buffer: Arc<Mutex<String>>) {
    let mut chunk = [0u8; 4096];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buffer
                .lock()
                .await
                .push_str(&String::from_utf8_lossy(&chunk[..n])),
        }
    }
}

#[async_trait]
impl Tool for StartCommand {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "startCommand".into(),
            description: "Allows to execute commands like npm / git or aws cli relative to the \
                          project folder similar to executeCommand, but does not wait for the \
                          command to finish, useful for npm start like commands"
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "The path under which the command should be executed",
                    },
                    "command": {
                        "type": "string",
                        "description": "The command that should be executed",
                    },
                    "timeout": {
                        "type": "integer",
                        "description": "The number of milliseconds to wait for the command to \
                                        finish, before returning the output and letting it run. \
                                        Defaults to 5000.",
                    },
                },
                "required": ["path", "command"],
            }),
        }
    }

    async fn run(&self, args: Value) -> Result<Value, ToolError> {
        let args: StartCommandArgs = parse_args(args)?;
        let cwd = self.sandbox.resolve(&args.path)?;
        let timeout = Duration::from_millis(args.timeout.unwrap_or(DEFAULT_START_TIMEOUT_MS));

        tracing::info!(command = %args.command, cwd = %cwd.display(), "starting command");

        let mut child = shell_command(&args.command)
            .current_dir(&cwd)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ToolError::Execution(format!("Error starting command: {e}")))?;

        let buffer = Arc::new(Mutex::new(String::new()));
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(pump(stdout, buffer.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(pump(stderr, buffer.clone()));
        }

        // The child stays alive past this return; the session reaps it.
        self.processes.track(child).await;

        tokio::time::sleep(timeout).await;

        let output = buffer.lock().await.clone();
        Ok(Value::String(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolRegistry;
    use store::ToolCall;
    use tempfile::TempDir;

    fn setup() -> (TempDir, ProcessSet, ToolRegistry) {
        let dir = TempDir::new().unwrap();
        let sandbox = Arc::new(Sandbox::new(dir.path()).unwrap());
        let processes = ProcessSet::new();
        let registry = ToolRegistry::builtin(sandbox, processes.clone());
        (dir, processes, registry)
    }

    async fn call(registry: &ToolRegistry, name: &str, args: Value) -> Value {
        let call = ToolCall::new("call_p", name, args.to_string());
        serde_json::from_str(&registry.dispatch(&call).await.text()).unwrap()
    }

    #[tokio::test]
    async fn execute_captures_stdout() {
        let (_dir, _processes, registry) = setup();
        let result = call(
            &registry,
            "executeCommand",
            json!({"path": ".", "command": "echo hello"}),
        )
        .await;
        assert_eq!(result["stdout"], json!("hello\n"));
        assert_eq!(result["error"], Value::Null);
    }

    #[tokio::test]
    async fn execute_reports_failure_without_rejecting() {
        let (_dir, _processes, registry) = setup();
        let result = call(
            &registry,
            "executeCommand",
            json!({"path": ".", "command": "exit 3"}),
        )
        .await;
        assert!(result["error"].as_str().unwrap().contains("Command failed"));
    }

    #[tokio::test]
    async fn execute_runs_in_resolved_cwd() {
        let (dir, _processes, registry) = setup();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let result = call(
            &registry,
            "executeCommand",
            json!({"path": "sub", "command": "pwd"}),
        )
        .await;
        assert!(result["stdout"].as_str().unwrap().trim().ends_with("/sub"));
    }

    #[tokio::test]
    async fn start_returns_buffered_output_while_child_runs() {
        let (_dir, processes, registry) = setup();
        let result = call(
            &registry,
            "startCommand",
            json!({"path": ".", "command": "echo started; sleep 30", "timeout": 300}),
        )
        .await;
        assert!(result.as_str().unwrap().contains("started"));
        assert_eq!(processes.active().await, 1);

        processes.kill_all().await;
        assert_eq!(processes.active().await, 0);
    }
}
