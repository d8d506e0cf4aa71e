//! Chat model client used to generate answers.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::gemini::{Content, build_http_client, describe_failure, method_url};
use crate::error::LlmError;
use crate::models::GeminiConfig;

/// A text-in, text-out generative model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a completion for a fully rendered prompt.
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Model identifier, for status output.
    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenate the text parts of the first candidate.
    fn into_text(self) -> Result<String, LlmError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(LlmError::Blocked(reason));
        }

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("no candidates returned".to_string()))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            let reason = candidate.finish_reason.unwrap_or_default();
            if matches!(reason.as_str(), "SAFETY" | "RECITATION" | "BLOCKLIST") {
                return Err(LlmError::Blocked(reason));
            }
            if reason.is_empty() {
                return Err(LlmError::InvalidResponse("empty answer".to_string()));
            }
            return Err(LlmError::InvalidResponse(format!(
                "empty answer (finish reason {reason})"
            )));
        }

        Ok(text)
    }
}

/// Client for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiChatClient {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl GeminiChatClient {
    /// Create a chat client bound to the configured model and generation settings.
    pub fn new(config: &GeminiConfig) -> Result<Self, LlmError> {
        let client = build_http_client(config).map_err(LlmError::ClientError)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.llm_model.trim().to_string(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }

    fn request(&self, prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::text(Some("user"), prompt)],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        }
    }
}

#[async_trait]
impl ChatModel for GeminiChatClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        debug!(model = %self.model, prompt_len = prompt.len(), "generating answer");
        let url = method_url(&self.base_url, &self.model, "generateContent");

        let response = self
            .client
            .post(&url)
            .json(&self.request(prompt))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    LlmError::ConnectionError(e.to_string())
                } else {
                    LlmError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ServerError(describe_failure(status, &body)));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        body.into_text()
    }

    fn model(&self) -> &str {
        &self.model
    }
}
