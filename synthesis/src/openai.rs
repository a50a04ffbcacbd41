//! OpenAI-compatible chat completions backend.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::backend::GenerativeBackend;
use crate::error::BackendError;
use crate::schema::JsonSchema;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Backend calling `/chat/completions` with a `json_schema` response format.
pub struct OpenAiBackend {
    /// API key.
    api_key: Option<String>,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Model name.
    model: String,
}

impl OpenAiBackend {
    /// Create a backend from `OPENAI_API_KEY`, `OPENAI_BASE_URL` and `COURSEGEN_MODEL`.
    pub fn new() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            client: reqwest::Client::new(),
            model: std::env::var("COURSEGEN_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Get the model.
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Default for OpenAiBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerativeBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(
        &self,
        system_instructions: &str,
        user_text: &str,
        schema: &JsonSchema,
        max_tokens: u32,
    ) -> Result<Value, BackendError> {
        let api_key = self.api_key.as_ref().ok_or(BackendError::NotConfigured)?;

        debug!(
            "Requesting {} from {} ({} chars of input)",
            schema.name,
            self.model,
            user_text.len()
        );

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_instructions },
                { "role": "user", "content": user_text },
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": schema.name,
                    "schema": schema.schema,
                    "strict": true,
                },
            },
            "max_tokens": max_tokens,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(BackendError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Api { status, message });
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        let choice = result
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::InvalidResponse("no choices in response".to_string()))?;

        if let Some(refusal) = choice.message.refusal {
            return Err(BackendError::InvalidResponse(format!("model refused: {refusal}")));
        }

        let content = choice
            .message
            .content
            .ok_or_else(|| BackendError::InvalidResponse("empty message content".to_string()))?;

        let value: Value = serde_json::from_str(&content)
            .map_err(|e| BackendError::InvalidResponse(format!("content is not JSON: {e}")))?;

        schema.check(&value)?;

        if let Some(usage) = result.usage {
            debug!(
                "{} used {} prompt + {} completion tokens",
                schema.name, usage.prompt_tokens, usage.completion_tokens
            );
        }

        Ok(value)
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Chat completions response format.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::course_schema;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion(content: &str) -> Value {
        json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 20, "total_tokens": 30 },
        })
    }

    fn backend(server: &MockServer) -> OpenAiBackend {
        OpenAiBackend::new()
            .with_api_key("test-key")
            .with_base_url(server.uri())
            .with_model("test-model")
    }

    #[tokio::test]
    async fn test_complete_parses_message_content() {
        let server = MockServer::start().await;
        let content = json!({
            "title": "Thermodynamics",
            "description": "Heat and work",
            "summary": "Energy moves.",
            "target_audience": ["students"],
            "difficulty_level": "beginner",
            "prerequisites": [],
        });
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completion(&content.to_string())),
            )
            .expect(1)
            .mount(&server)
            .await;

        let value = backend(&server)
            .complete("system", "user", &course_schema(), 256)
            .await
            .unwrap();

        assert_eq!(value, content);
    }

    #[tokio::test]
    async fn test_rate_limit_maps_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let err = backend(&server)
            .complete("system", "user", &course_schema(), 256)
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::RateLimited { retry_after_secs: 7 }));
    }

    #[tokio::test]
    async fn test_api_error_keeps_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = backend(&server)
            .complete("system", "user", &course_schema(), 256)
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::Api { status: 500, ref message } if message == "boom"));
    }

    #[tokio::test]
    async fn test_non_json_content_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("not json")))
            .mount(&server)
            .await;

        let err = backend(&server)
            .complete("system", "user", &course_schema(), 256)
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_wrong_shape_is_schema_violation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(r#"{"title": "x"}"#)))
            .mount(&server)
            .await;

        let err = backend(&server)
            .complete("system", "user", &course_schema(), 256)
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::SchemaViolation(_)));
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let backend = OpenAiBackend {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
            model: DEFAULT_MODEL.to_string(),
        };

        assert!(!backend.is_available());
        let err = backend
            .complete("system", "user", &course_schema(), 256)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotConfigured));
    }
}
