//! Narrative generation from raw financial data.
//!
//! Some callers hold transaction dumps or account exports rather than a
//! written history. A [`TextGenerator`] turns that raw data into a short
//! narrative, which is then ingested like any other behavior text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProfileError, Result};

/// Instruction used when the caller does not supply one.
pub const DEFAULT_NARRATIVE_INSTRUCTION: &str = "You are a financial analyst. \
Summarize the following raw financial data as a short third-person narrative \
of the person's financial behavior: income stability, spending habits, saving, \
use of credit and repayment history. Do not invent facts that are not in the data. \
Reply with the narrative only.";

/// A request to narrate raw data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeRequest {
    /// Instruction given to the generator.
    pub instruction: String,

    /// Raw, unstructured or semi-structured data.
    pub raw_data: String,
}

impl NarrativeRequest {
    /// Create a request with the default instruction.
    pub fn new(raw_data: impl Into<String>) -> Self {
        Self {
            instruction: DEFAULT_NARRATIVE_INSTRUCTION.to_string(),
            raw_data: raw_data.into(),
        }
    }

    /// Override the instruction.
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }
}

/// Trait for narrative generators.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Get the name of this generator.
    fn name(&self) -> &str;

    /// Produce a narrative for the given request.
    async fn generate(&self, request: &NarrativeRequest) -> Result<String>;
}

/// OpenAI-compatible chat completion generator.
pub struct OpenAIChatGenerator {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
    model: String,
    temperature: f32,
}

impl OpenAIChatGenerator {
    /// Create a new generator reading `OPENAI_API_KEY`.
    pub fn new() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            base_url: "https://api.openai.com/v1".to_string(),
            client: reqwest::Client::new(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
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

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

impl Default for OpenAIChatGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGenerator for OpenAIChatGenerator {
    fn name(&self) -> &str {
        "openai-chat"
    }

    async fn generate(&self, request: &NarrativeRequest) -> Result<String> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            ProfileError::TextGeneration("generator API key not configured".to_string())
        })?;

        debug!("Generating narrative with model: {}", self.model);

        let body = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                { "role": "system", "content": request.instruction },
                { "role": "user", "content": request.raw_data }
            ]
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ProfileError::TextGeneration(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProfileError::TextGeneration(format!(
                "API error ({status}): {error_text}"
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProfileError::TextGeneration(format!("invalid response: {e}")))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| ProfileError::TextGeneration("empty completion".to_string()))?;

        info!("Generated narrative of {} characters", text.chars().count());
        Ok(text)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn generator(server: &MockServer) -> OpenAIChatGenerator {
        OpenAIChatGenerator::new()
            .with_api_key("test-key")
            .with_base_url(server.uri())
    }

    #[test]
    fn test_request_defaults() {
        let request = NarrativeRequest::new("rent: 1200, paid 2024-01-01");
        assert_eq!(request.instruction, DEFAULT_NARRATIVE_INSTRUCTION);

        let request = request.with_instruction("Be brief.");
        assert_eq!(request.instruction, "Be brief.");
    }

    #[tokio::test]
    async fn test_generate_returns_trimmed_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "messages": [
                    { "role": "system", "content": "Be brief." },
                    { "role": "user", "content": "salary 3000; rent 1200" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [
                    { "message": { "role": "assistant", "content": "  Pays rent on time.\n" } }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = NarrativeRequest::new("salary 3000; rent 1200").with_instruction("Be brief.");
        let text = generator(&server).generate(&request).await.unwrap();
        assert_eq!(text, "Pays rent on time.");
    }

    #[tokio::test]
    async fn test_empty_completion_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": []
            })))
            .mount(&server)
            .await;

        let err = generator(&server)
            .generate(&NarrativeRequest::new("data"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::TextGeneration(_)));
    }

    #[tokio::test]
    async fn test_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = generator(&server)
            .generate(&NarrativeRequest::new("data"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::TextGeneration(_)));
    }
}
