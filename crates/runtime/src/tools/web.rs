//! Web page retrieval tool.

use super::{Tool, ToolError, parse_args};
use crate::model::ToolSpec;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

pub struct ReadWebPage {
    client: reqwest::Client,
}

impl ReadWebPage {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReadWebPage {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct ReadWebPageArgs {
    url: String,
}

#[async_trait]
impl Tool for ReadWebPage {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "readWebPage".into(),
            description: "Allows to read the content of a web page by providing the URL".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "The URL of the web page to read the content from",
                    },
                },
                "required": ["url"],
            }),
        }
    }

    async fn run(&self, args: Value) -> Result<Value, ToolError> {
        let args: ReadWebPageArgs = parse_args(args)?;

        tracing::info!(url = %args.url, "reading web page");

        let response = self
            .client
            .get(&args.url)
            .send()
            .await
            .map_err(|e| ToolError::Execution(format!("Error reading web page: {e}")))?;

        if !response.status().is_success() {
            return Ok(Value::String(format!(
                "Error reading web page: {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ToolError::Execution(format!("Error reading web page: {e}")))?;

        Ok(Value::String(body))
    }
}
