//! Ownership of the embedding provider and the persistent vector store.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use super::chunker::TextSplitter;
use super::embedding::EmbeddingProvider;
use super::provider::ModelProvider;
use super::qa_chain::VectorStoreRetriever;
use super::vector_store::{VectorStore, open_store};
use crate::error::{RagError, VectorStoreError};
use crate::models::{Config, Document};

const EMBEDDINGS_CONTEXT: &str = "failed to initialize embeddings";
const VECTOR_STORE_CONTEXT: &str = "failed to initialize vector store";
const ADD_DOCUMENTS_CONTEXT: &str = "failed to add documents to vector store";

/// Builds the embedding client and vector store, then chunks and inserts
/// documents into it.
pub struct VectorStoreManager {
    config: Config,
    provider: Arc<dyn ModelProvider>,
    splitter: TextSplitter,
    embeddings: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
}

impl VectorStoreManager {
    pub fn new(config: Config, provider: Arc<dyn ModelProvider>) -> Self {
        let splitter = TextSplitter::from_config(&config.indexing);
        Self {
            config,
            provider,
            splitter,
            embeddings: None,
            vector_store: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn splitter(&self) -> &TextSplitter {
        &self.splitter
    }

    /// Embeddings, then the store. Stops at the first failure; whatever was
    /// built before it stays in place.
    pub fn setup(&mut self, persist_directory: &Path) -> Result<(), RagError> {
        self.initialize_embeddings()?;
        self.initialize_vector_store(persist_directory)?;
        Ok(())
    }

    pub fn initialize_embeddings(&mut self) -> Result<(), RagError> {
        let embeddings = self
            .provider
            .embeddings(&self.config)
            .map_err(|e| RagError::upstream(EMBEDDINGS_CONTEXT, e))?;

        info!(model = embeddings.model(), "embeddings initialized");
        self.embeddings = Some(embeddings);
        Ok(())
    }

    pub fn initialize_vector_store(&mut self, persist_directory: &Path) -> Result<(), RagError> {
        let embeddings = self
            .embeddings
            .clone()
            .ok_or(RagError::NotInitialized("embeddings"))?;

        if persist_directory.exists() && !persist_directory.is_dir() {
            return Err(RagError::InvalidPath(persist_directory.to_path_buf()));
        }

        fs::create_dir_all(persist_directory)
            .map_err(|e| RagError::upstream(VECTOR_STORE_CONTEXT, VectorStoreError::from(e)))?;

        let collection = &self.config.vector_store.collection;
        let store = open_store(persist_directory, collection, embeddings)
            .map_err(|e| RagError::upstream(VECTOR_STORE_CONTEXT, e))?;

        info!(
            path = %persist_directory.display(),
            collection = %collection,
            "vector store initialized"
        );
        self.vector_store = Some(store);
        Ok(())
    }

    /// Split and insert `documents`; returns the number of chunks stored.
    pub async fn add_documents(&self, documents: &[Document]) -> Result<usize, RagError> {
        let store = self
            .vector_store
            .as_ref()
            .ok_or(RagError::NotInitialized("vector store"))?;

        if documents.is_empty() {
            debug!("no documents to add");
            return Ok(0);
        }

        let chunks = self.splitter.split_documents(documents);
        let count = chunks.len();
        debug!(documents = documents.len(), chunks = count, "split documents");

        store
            .add_documents(chunks)
            .await
            .map_err(|e| RagError::upstream(ADD_DOCUMENTS_CONTEXT, e))?;

        info!(chunks = count, collection = store.collection(), "added chunks to vector store");
        Ok(count)
    }

    pub fn retriever(&self) -> Result<VectorStoreRetriever, RagError> {
        self.vector_store
            .clone()
            .map(VectorStoreRetriever::new)
            .ok_or(RagError::NotInitialized("vector store"))
    }

    pub fn embeddings(&self) -> Option<&Arc<dyn EmbeddingProvider>> {
        self.embeddings.as_ref()
    }

    pub fn vector_store(&self) -> Option<&Arc<dyn VectorStore>> {
        self.vector_store.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EmbeddingError, ErrorKind, LlmError};
    use crate::services::llm::ChatModel;
    use async_trait::async_trait;

    struct ConstantEmbeddings;

    #[async_trait]
    impl EmbeddingProvider for ConstantEmbeddings {
        async fn embed_documents(
            &self,
            texts: &[String],
        ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        async fn embed_query(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![1.0, 0.0])
        }

        fn model(&self) -> &str {
            "constant"
        }
    }

    struct TestProvider {
        fail_embeddings: bool,
    }

    impl ModelProvider for TestProvider {
        fn embeddings(&self, _config: &Config) -> Result<Arc<dyn EmbeddingProvider>, EmbeddingError> {
            if self.fail_embeddings {
                return Err(EmbeddingError::ClientError("no key".to_string()));
            }
            Ok(Arc::new(ConstantEmbeddings))
        }

        fn chat_model(&self, _config: &Config) -> Result<Arc<dyn ChatModel>, LlmError> {
            Err(LlmError::ClientError("unused".to_string()))
        }
    }

    fn manager(fail_embeddings: bool) -> VectorStoreManager {
        let mut config = Config::default();
        config.indexing.chunk_size = 20;
        config.indexing.chunk_overlap = 5;
        VectorStoreManager::new(config, Arc::new(TestProvider { fail_embeddings }))
    }

    #[tokio::test]
    async fn test_add_documents_requires_store() {
        let manager = manager(false);
        let err = manager.add_documents(&[Document::new("x")]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotInitialized);
    }

    #[test]
    fn test_store_requires_embeddings() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = manager(false);
        let err = manager.initialize_vector_store(dir.path()).unwrap_err();
        assert!(matches!(err, RagError::NotInitialized("embeddings")));
    }

    #[test]
    fn test_embedding_failure_is_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = manager(true);
        let err = manager.setup(dir.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert!(err.to_string().starts_with(EMBEDDINGS_CONTEXT));
        assert!(manager.vector_store().is_none());
    }

    #[test]
    fn test_file_path_is_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut manager = manager(false);
        let err = manager.setup(file.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPath);
        // embeddings were built before the failing step
        assert!(manager.embeddings().is_some());
    }

    #[tokio::test]
    async fn test_setup_creates_directory_and_adds_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let persist = dir.path().join("nested").join("store");
        let mut manager = manager(false);

        manager.setup(&persist).unwrap();
        assert!(persist.is_dir());

        let doc = Document::new("one two three four five six seven eight nine ten");
        let count = manager.add_documents(&[doc]).await.unwrap();
        assert!(count > 1);

        let info = manager.vector_store().unwrap().collection_info().await.unwrap();
        assert_eq!(info.points_count, count as u64);
        assert_eq!(manager.add_documents(&[]).await.unwrap(), 0);
        assert!(manager.retriever().is_ok());
    }
}
