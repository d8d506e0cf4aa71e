//! Embedding client for generating text embeddings.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::gemini::{Content, build_http_client, describe_failure, method_url, model_resource};
use crate::error::EmbeddingError;
use crate::models::GeminiConfig;

/// Produces vectors for document chunks and queries.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed texts for indexing. Output order matches input order.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a search query.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Model identifier, for status output.
    fn model(&self) -> &str;
}

/// Task type hint sent with each embedding request.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum TaskType {
    /// For indexing documents
    RetrievalDocument,
    /// For search queries
    RetrievalQuery,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest {
    model: String,
    content: Content,
    task_type: TaskType,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedContentRequest>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

/// Client for the Gemini embedding endpoints.
#[derive(Debug, Clone)]
pub struct GeminiEmbeddingClient {
    client: Client,
    base_url: String,
    model: String,
    batch_size: usize,
}

impl GeminiEmbeddingClient {
    /// Create a new embedding client with the given configuration.
    pub fn new(config: &GeminiConfig) -> Result<Self, EmbeddingError> {
        let client = build_http_client(config).map_err(EmbeddingError::ClientError)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.embedding_model.trim().to_string(),
            batch_size: config.embedding_batch_size.max(1) as usize,
        })
    }

    fn request(&self, text: &str, task_type: TaskType) -> EmbedContentRequest {
        EmbedContentRequest {
            model: model_resource(&self.model),
            content: Content::text(None, text),
            task_type,
        }
    }

    /// Embed one batch through `batchEmbedContents`.
    async fn embed_single_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let url = method_url(&self.base_url, &self.model, "batchEmbedContents");
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|t| self.request(t, TaskType::RetrievalDocument))
                .collect(),
        };

        let response: BatchEmbedResponse = self.post(&url, &request).await?;

        if response.embeddings.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                response.embeddings.len()
            )));
        }

        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }

    async fn post<Req, Resp>(&self, url: &str, body: &Req) -> Result<Resp, EmbeddingError>
    where
        Req: Serialize + ?Sized,
        Resp: for<'de> Deserialize<'de>,
    {
        let response = self.client.post(url).json(body).send().await.map_err(|e| {
            if e.is_connect() {
                EmbeddingError::ConnectionError(e.to_string())
            } else {
                EmbeddingError::RequestError(e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ServerError(describe_failure(status, &body)));
        }

        response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))
    }

    /// Get the base URL of the embedding service.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingClient {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            debug!(model = %self.model, batch_size = batch.len(), "embedding batch");
            all_embeddings.extend(self.embed_single_batch(batch).await?);
        }

        Ok(all_embeddings)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        debug!(model = %self.model, text_len = text.len(), "embedding query");
        let url = method_url(&self.base_url, &self.model, "embedContent");
        let request = self.request(text, TaskType::RetrievalQuery);
        let response: EmbedContentResponse = self.post(&url, &request).await?;

        if response.embedding.values.is_empty() {
            return Err(EmbeddingError::InvalidResponse(
                "empty embedding response".to_string(),
            ));
        }

        Ok(response.embedding.values)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GeminiConfig {
        GeminiConfig {
            api_key: Some("test-key".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_client_creation() {
        let client = GeminiEmbeddingClient::new(&config());
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_requires_api_key() {
        let err = GeminiEmbeddingClient::new(&GeminiConfig::default()).unwrap_err();
        assert!(matches!(err, EmbeddingError::ClientError(_)));
    }

    #[test]
    fn test_base_url_trimming() {
        let config = GeminiConfig {
            base_url: "http://localhost:8080/v1beta/".to_string(),
            ..config()
        };
        let client = GeminiEmbeddingClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/v1beta");
    }

    #[test]
    fn test_request_serialization() {
        let client = GeminiEmbeddingClient::new(&config()).unwrap();
        let request = client.request("hello", TaskType::RetrievalQuery);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "models/text-embedding-004");
        assert_eq!(json["taskType"], "RETRIEVAL_QUERY");
        assert_eq!(json["content"]["parts"][0]["text"], "hello");
        assert!(json["content"].get("role").is_none());
    }

    #[test]
    fn test_batch_response_parsing() {
        let body = r#"{"embeddings": [{"values": [0.1, 0.2]}, {"values": [0.3, 0.4]}]}"#;
        let response: BatchEmbedResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.embeddings.len(), 2);
        assert_eq!(response.embeddings[1].values, vec![0.3, 0.4]);
    }

    #[tokio::test]
    async fn test_embed_empty_batch_skips_request() {
        let client = GeminiEmbeddingClient::new(&config()).unwrap();
        let embeddings = client.embed_documents(&[]).await.unwrap();
        assert!(embeddings.is_empty());
    }
}
