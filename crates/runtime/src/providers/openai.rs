//! OpenAI chat-completions backend.

use crate::model::{Backend, CompletionRequest, ModelError, ToolChoice, ToolSpec};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use store::Turn;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

// Provider error codes that the completion client recovers from.
const CODE_RATE_LIMIT: &str = "rate_limit_exceeded";
const CODE_CONTEXT_LENGTH: &str = "context_length_exceeded";

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    tools: &'a [ApiTool<'a>],
    tool_choice: ToolChoice,
}

#[derive(Debug, Serialize)]
struct ApiTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a ToolSpec,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: Turn,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating an OpenAI backend.
#[derive(Debug, Clone)]
pub struct OpenAiBackendBuilder {
    api_key: String,
    base_url: String,
}

impl OpenAiBackendBuilder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: OPENAI_API_URL.to_string(),
        }
    }

    /// Override the completions endpoint, e.g. for an Azure deployment.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn build(self) -> OpenAiBackend {
        OpenAiBackend {
            client: reqwest::Client::new(),
            api_key: self.api_key,
            base_url: self.base_url,
        }
    }
}

/// OpenAI chat-completions API backend.
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiBackend {
    pub fn builder(api_key: impl Into<String>) -> OpenAiBackendBuilder {
        OpenAiBackendBuilder::new(api_key)
    }

    pub fn new(api_key: impl Into<String>) -> Self {
        Self::builder(api_key).build()
    }
}

impl Backend for OpenAiBackend {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Turn, ModelError> {
        let tools: Vec<ApiTool<'_>> = request
            .tools
            .iter()
            .map(|spec| ApiTool {
                kind: "function",
                function: spec,
            })
            .collect();

        let body = ApiRequest {
            model: request.model,
            messages: request.messages,
            tools: &tools,
            tool_choice: request.tool_choice,
        };

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &body));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        api_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| ModelError::InvalidResponse("response carried no choices".into()))
    }
}

/// Map a provider error response to a [`ModelError`].
///
/// Classification is by the `error.code` field; HTTP 429 without a parseable
/// body is still treated as a rate limit.
fn classify_error(status: StatusCode, body: &str) -> ModelError {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        match parsed.error.code.as_deref() {
            Some(CODE_RATE_LIMIT) => return ModelError::RateLimited,
            Some(CODE_CONTEXT_LENGTH) => return ModelError::ContextOverflow,
            _ => {
                return ModelError::Api {
                    status: status.as_u16(),
                    message: parsed.error.message,
                };
            }
        }
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        return ModelError::RateLimited;
    }

    ModelError::Api {
        status: status.as_u16(),
        message: body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_wire_shape() {
        let messages = vec![Turn::user("hi")];
        let specs = vec![ToolSpec {
            name: "readProjectFile".into(),
            description: "read a file".into(),
            parameters: json!({"type": "object"}),
        }];
        let tools: Vec<ApiTool<'_>> = specs
            .iter()
            .map(|spec| ApiTool {
                kind: "function",
                function: spec,
            })
            .collect();
        let request = ApiRequest {
            model: "gpt-4o",
            messages: &messages,
            tools: &tools,
            tool_choice: ToolChoice::Required,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["tool_choice"], json!("required"));
        assert_eq!(value["tools"][0]["type"], json!("function"));
        assert_eq!(
            value["tools"][0]["function"]["name"],
            json!("readProjectFile")
        );
        assert_eq!(value["messages"][0]["role"], json!("user"));
    }

    #[test]
    fn tools_omitted_when_empty() {
        let messages = vec![Turn::user("hi")];
        let request = ApiRequest {
            model: "gpt-4o",
            messages: &messages,
            tools: &[],
            tool_choice: ToolChoice::Auto,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("tools").is_none());
    }

    #[test]
    fn classifies_rate_limit_by_code() {
        let body = json!({"error": {"message": "slow down", "code": "rate_limit_exceeded"}});
        assert!(matches!(
            classify_error(StatusCode::TOO_MANY_REQUESTS, &body.to_string()),
            ModelError::RateLimited
        ));
    }

    #[test]
    fn classifies_context_overflow_by_code() {
        let body =
            json!({"error": {"message": "too long", "code": "context_length_exceeded"}});
        assert!(matches!(
            classify_error(StatusCode::BAD_REQUEST, &body.to_string()),
            ModelError::ContextOverflow
        ));
    }

    #[test]
    fn classifies_bare_429_as_rate_limit() {
        assert!(matches!(
            classify_error(StatusCode::TOO_MANY_REQUESTS, "not json"),
            ModelError::RateLimited
        ));
    }

    #[test]
    fn other_errors_are_fatal() {
        let body = json!({"error": {"message": "bad key", "code": "invalid_api_key"}});
        assert!(matches!(
            classify_error(StatusCode::UNAUTHORIZED, &body.to_string()),
            ModelError::Api { status: 401, .. }
        ));
    }
}
