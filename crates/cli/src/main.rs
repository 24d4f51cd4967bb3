mod config;
mod error;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use runtime::{CompletionClient, OpenAiBackend, ProcessSet, Session, ToolRegistry};
use sandbox::Sandbox;
use store::{ConversationStore, Role, Turn};

use config::Config;
use error::Result;

const CONFIG_FILE: &str = "codechat.toml";

#[derive(Parser)]
#[command(name = "codechat")]
#[command(about = "A tool-calling coding agent for a project folder", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the config file
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session
    Chat,
    /// Print the persisted conversation
    History {
        /// Show only the last N turns
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config)?;

    match cli.command {
        Some(Commands::Chat) | None => cmd_chat(config).await,
        Some(Commands::History { limit }) => cmd_history(config, limit),
    }
}

async fn cmd_chat(config: Config) -> Result<()> {
    println!("codechat v{}", env!("CARGO_PKG_VERSION"));

    let api_key = config.api_key()?;
    let model = config.model();
    let output_dir = config.output_dir()?;

    let mut builder = OpenAiBackend::builder(api_key);
    if let Some(base_url) = &config.base_url {
        builder = builder.base_url(base_url);
    }
    let backend = builder.build();

    let sandbox = Arc::new(Sandbox::new(&output_dir)?);
    let processes = ProcessSet::new();
    let tools = ToolRegistry::builtin(sandbox, processes.clone());
    let client = CompletionClient::new(backend, &model);
    let store = ConversationStore::new(&output_dir);

    let mut session = Session::new(store, client, tools, processes)?;
    if let Some(instructions) = config.instructions()? {
        session = session.with_instructions(instructions);
    }
    if let Some(max_rounds) = config.max_rounds {
        session = session.with_max_rounds(max_rounds);
    }

    println!("Project: {}", output_dir.display());
    println!("Model: {model}");
    println!("Type 'quit' or Ctrl+D to exit.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF
            break;
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "quit" || input == "exit" {
            break;
        }

        match session.chat_text(input).await {
            Ok(response) => {
                println!("\n{response}\n");
            }
            Err(e) => {
                eprintln!("Error: {e}\n");
            }
        }
    }

    session.end().await;
    println!("\nSession ended.");
    Ok(())
}

fn cmd_history(config: Config, limit: Option<usize>) -> Result<()> {
    let output_dir = config.output_dir()?;
    let turns = ConversationStore::new(&output_dir).load()?;

    if turns.is_empty() {
        println!("No conversation found in {}", output_dir.display());
        return Ok(());
    }

    let skip = limit.map_or(0, |n| turns.len().saturating_sub(n));
    for turn in &turns[skip..] {
        print_turn(turn);
    }

    Ok(())
}

fn print_turn(turn: &Turn) {
    match turn.role {
        Role::User => println!("USER: {}", truncate(&turn.text())),
        Role::Assistant => {
            if let Some(calls) = &turn.tool_calls {
                for call in calls {
                    println!(
                        "ASSISTANT -> {}({})",
                        call.function.name,
                        truncate(&call.function.arguments)
                    );
                }
            }
            let text = turn.text();
            if !text.is_empty() {
                println!("ASSISTANT: {}", truncate(&text));
            }
        }
        Role::Tool => {
            let name = turn.name.as_deref().unwrap_or("tool");
            println!("TOOL {name}: {}", truncate(&turn.text()));
        }
        // Instruction turns are session-local noise in a transcript.
        Role::Developer | Role::System | Role::Function => {}
    }
}

/// Truncate long content for display.
fn truncate(text: &str) -> String {
    const MAX: usize = 200;
    if text.chars().count() > MAX {
        let cut: String = text.chars().take(MAX).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}
