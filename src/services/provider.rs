//! Factory for the remote model clients.
//!
//! The manager and the RAG system never construct clients directly; they ask
//! a [`ModelProvider`], which lets tests swap in local fakes.

use std::sync::Arc;

use super::embedding::{EmbeddingProvider, GeminiEmbeddingClient};
use super::llm::{ChatModel, GeminiChatClient};
use crate::error::{EmbeddingError, LlmError};
use crate::models::Config;

pub trait ModelProvider: Send + Sync {
    fn embeddings(&self, config: &Config) -> Result<Arc<dyn EmbeddingProvider>, EmbeddingError>;

    fn chat_model(&self, config: &Config) -> Result<Arc<dyn ChatModel>, LlmError>;
}

/// Gemini-backed clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeminiProvider;

impl ModelProvider for GeminiProvider {
    fn embeddings(&self, config: &Config) -> Result<Arc<dyn EmbeddingProvider>, EmbeddingError> {
        Ok(Arc::new(GeminiEmbeddingClient::new(&config.gemini)?))
    }

    fn chat_model(&self, config: &Config) -> Result<Arc<dyn ChatModel>, LlmError> {
        Ok(Arc::new(GeminiChatClient::new(&config.gemini)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_provider_builds_clients() {
        let mut config = Config::default();
        config.gemini.api_key = Some("test-key".to_string());

        let embeddings = GeminiProvider.embeddings(&config).unwrap();
        assert_eq!(embeddings.model(), config.gemini.embedding_model);

        let llm = GeminiProvider.chat_model(&config).unwrap();
        assert_eq!(llm.model(), config.gemini.llm_model);
    }

    #[test]
    fn test_gemini_provider_without_key_fails() {
        let config = Config::default();
        assert!(GeminiProvider.embeddings(&config).is_err());
        assert!(GeminiProvider.chat_model(&config).is_err());
    }
}
