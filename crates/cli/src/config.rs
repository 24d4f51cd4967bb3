//! Configuration loading from codechat.toml.

use serde::Deserialize;
use std::path::{Path, PathBuf};

fn default_model() -> String {
    "gpt-4o".to_string()
}

/// Top-level configuration.
///
/// Environment variables take precedence over the file: the project folder
/// from `CODECHAT_OUTPUT_FOLDER`, the model from `CODECHAT_MODEL`. The API
/// key is only ever read from `OPENAI_API_KEY`.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Project folder the agent works in. Every tool path resolves inside it.
    pub output_dir: Option<PathBuf>,

    /// Model to request completions from.
    #[serde(default = "default_model")]
    pub model: String,

    /// Optional base URL override, e.g. an Azure OpenAI deployment.
    pub base_url: Option<String>,

    /// Optional file with project-specific instructions, layered onto the
    /// base developer message.
    pub instructions: Option<PathBuf>,

    /// Upper bound on tool rounds per exchange.
    pub max_rounds: Option<usize>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load the file if it exists, defaults otherwise.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Self::parse("")
        }
    }

    /// The project folder, with the environment override applied.
    pub fn output_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = std::env::var_os("CODECHAT_OUTPUT_FOLDER") {
            return Ok(PathBuf::from(dir));
        }
        self.output_dir.clone().ok_or(ConfigError::MissingOutputDir)
    }

    /// The model, with the environment override applied.
    pub fn model(&self) -> String {
        std::env::var("CODECHAT_MODEL").unwrap_or_else(|_| self.model.clone())
    }

    /// The API key, from the environment only.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        std::env::var("OPENAI_API_KEY").map_err(|_| ConfigError::MissingApiKey)
    }

    /// Contents of the instructions file, if one is configured.
    pub fn instructions(&self) -> Result<Option<String>, ConfigError> {
        match &self.instructions {
            Some(path) => Ok(Some(std::fs::read_to_string(path)?)),
            None => Ok(None),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error(
        "project folder not configured: set output_dir in codechat.toml or CODECHAT_OUTPUT_FOLDER"
    )]
    MissingOutputDir,

    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config = Config::parse(
            r#"
            output_dir = "./project"
            model = "gpt-4o-mini"
            instructions = "AGENT.md"
            max_rounds = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.output_dir, Some(PathBuf::from("./project")));
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.instructions, Some(PathBuf::from("AGENT.md")));
        assert_eq!(config.max_rounds, Some(8));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert!(config.output_dir.is_none());
        assert!(config.max_rounds.is_none());
        assert!(config.base_url.is_none());
    }

    #[test]
    fn missing_output_dir_is_an_error() {
        let config = Config::parse("").unwrap();
        assert!(matches!(
            config.output_dir(),
            Err(ConfigError::MissingOutputDir)
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            Config::parse("output_dir = ["),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn instructions_file_is_read() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("AGENT.md");
        std::fs::write(&path, "always write tests").unwrap();

        let mut config = Config::parse("").unwrap();
        config.instructions = Some(path);
        assert_eq!(
            config.instructions().unwrap().as_deref(),
            Some("always write tests")
        );
    }
}
