//! The RAG system: configuration, vector store and chat model composed into a
//! question answering service.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use super::llm::ChatModel;
use super::manager::VectorStoreManager;
use super::provider::{GeminiProvider, ModelProvider};
use super::qa_chain::RetrievalQa;
use crate::error::RagError;
use crate::models::{Config, Document, QueryResult};

const LLM_CONTEXT: &str = "failed to initialize LLM";
const QUERY_CONTEXT: &str = "failed to process query";

/// Observable lifecycle of a [`RagSystem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    /// `initialize` started but did not complete
    Initializing,
    Ready,
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lifecycle::Uninitialized => write!(f, "uninitialized"),
            Lifecycle::Initializing => write!(f, "initializing"),
            Lifecycle::Ready => write!(f, "ready"),
        }
    }
}

struct ReadyState {
    llm: Arc<dyn ChatModel>,
    qa_chain: RetrievalQa,
}

enum RagState {
    Uninitialized,
    Initializing,
    Ready(ReadyState),
}

pub struct RagSystem {
    manager: VectorStoreManager,
    provider: Arc<dyn ModelProvider>,
    state: RagState,
}

impl RagSystem {
    /// A system backed by the Gemini API.
    pub fn new(config: Config) -> Self {
        Self::with_provider(config, Arc::new(GeminiProvider))
    }

    pub fn with_provider(config: Config, provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            manager: VectorStoreManager::new(config, provider.clone()),
            provider,
            state: RagState::Uninitialized,
        }
    }

    pub fn config(&self) -> &Config {
        self.manager.config()
    }

    pub fn manager(&self) -> &VectorStoreManager {
        &self.manager
    }

    pub fn lifecycle(&self) -> Lifecycle {
        match self.state {
            RagState::Uninitialized => Lifecycle::Uninitialized,
            RagState::Initializing => Lifecycle::Initializing,
            RagState::Ready(_) => Lifecycle::Ready,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, RagState::Ready(_))
    }

    /// Model answering questions, once ready.
    pub fn llm(&self) -> Option<&Arc<dyn ChatModel>> {
        match &self.state {
            RagState::Ready(ready) => Some(&ready.llm),
            _ => None,
        }
    }

    /// Build every handle and the QA chain against `persist_directory`.
    ///
    /// May be called again; each call rebuilds all handles. On failure the
    /// system stays in [`Lifecycle::Initializing`].
    pub fn initialize(&mut self, persist_directory: &Path) -> Result<(), RagError> {
        if self.is_ready() {
            warn!("RAG system already initialized, rebuilding handles");
        }
        self.state = RagState::Initializing;

        self.config().validate()?;
        self.manager.setup(persist_directory)?;
        let llm = self.initialize_llm()?;
        let qa_chain = self.create_qa_chain(llm.clone())?;

        self.state = RagState::Ready(ReadyState { llm, qa_chain });
        info!(path = %persist_directory.display(), "RAG system initialized");
        Ok(())
    }

    fn initialize_llm(&self) -> Result<Arc<dyn ChatModel>, RagError> {
        let llm = self
            .provider
            .chat_model(self.config())
            .map_err(|e| RagError::upstream(LLM_CONTEXT, e))?;
        info!(model = llm.model(), "LLM initialized");
        Ok(llm)
    }

    fn create_qa_chain(&self, llm: Arc<dyn ChatModel>) -> Result<RetrievalQa, RagError> {
        let retriever = self.manager.retriever()?;
        Ok(RetrievalQa::new(
            Arc::new(retriever),
            llm,
            self.config().retrieval.top_k,
        ))
    }

    /// Chunk and store `documents`, returning the chunk count.
    ///
    /// With `auto_initialize`, an unready system is first initialized against
    /// the configured persist directory.
    pub async fn add_documents(
        &mut self,
        documents: &[Document],
        auto_initialize: bool,
    ) -> Result<usize, RagError> {
        if !self.is_ready() {
            if !auto_initialize {
                return Err(RagError::NotInitialized("RAG system"));
            }
            let persist_directory = self.config().vector_store.persist_directory.clone();
            self.initialize(&persist_directory)?;
        }

        self.manager.add_documents(documents).await
    }

    pub async fn query(&self, question: &str) -> Result<QueryResult, RagError> {
        let RagState::Ready(ready) = &self.state else {
            return Err(RagError::NotInitialized("RAG system"));
        };

        let output = ready
            .qa_chain
            .invoke(question)
            .await
            .map_err(|e| RagError::upstream(QUERY_CONTEXT, e))?;

        info!(sources = output.source_documents.len(), "query processed");
        Ok(QueryResult::new(
            question,
            output.answer,
            &output.source_documents,
        ))
    }

    /// Answer text only.
    pub async fn ask(&self, question: &str) -> Result<String, RagError> {
        Ok(self.query(question).await?.answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EmbeddingError, ErrorKind, LlmError};
    use crate::services::embedding::EmbeddingProvider;

    /// Provider whose clients can never be built.
    struct UnreachableProvider;

    impl ModelProvider for UnreachableProvider {
        fn embeddings(&self, _config: &Config) -> Result<Arc<dyn EmbeddingProvider>, EmbeddingError> {
            Err(EmbeddingError::ConnectionError("unreachable".to_string()))
        }

        fn chat_model(&self, _config: &Config) -> Result<Arc<dyn ChatModel>, LlmError> {
            Err(LlmError::ConnectionError("unreachable".to_string()))
        }
    }

    struct ConstantEmbeddings;

    #[async_trait::async_trait]
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

    /// Embeddings build, the chat model does not.
    struct NoChatProvider;

    impl ModelProvider for NoChatProvider {
        fn embeddings(&self, _config: &Config) -> Result<Arc<dyn EmbeddingProvider>, EmbeddingError> {
            Ok(Arc::new(ConstantEmbeddings))
        }

        fn chat_model(&self, _config: &Config) -> Result<Arc<dyn ChatModel>, LlmError> {
            Err(LlmError::ClientError("missing Google API key".to_string()))
        }
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.gemini.api_key = Some("test-key".to_string());
        config
    }

    #[test]
    fn test_new_system_is_uninitialized() {
        let rag = RagSystem::with_provider(config(), Arc::new(UnreachableProvider));
        assert_eq!(rag.lifecycle(), Lifecycle::Uninitialized);
        assert!(!rag.is_ready());
        assert!(rag.llm().is_none());
    }

    #[test]
    fn test_invalid_config_fails_before_setup() {
        let dir = tempfile::tempdir().unwrap();
        let mut rag = RagSystem::with_provider(Config::default(), Arc::new(UnreachableProvider));
        let err = rag.initialize(dir.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert_eq!(rag.lifecycle(), Lifecycle::Initializing);
    }

    #[test]
    fn test_failed_initialize_leaves_initializing() {
        let dir = tempfile::tempdir().unwrap();
        let mut rag = RagSystem::with_provider(config(), Arc::new(UnreachableProvider));
        let err = rag.initialize(dir.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert_eq!(rag.lifecycle(), Lifecycle::Initializing);
    }

    #[tokio::test]
    async fn test_llm_failure_keeps_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut rag = RagSystem::with_provider(config(), Arc::new(NoChatProvider));

        let err = rag.initialize(dir.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert!(err.to_string().starts_with(LLM_CONTEXT));
        assert_eq!(rag.lifecycle(), Lifecycle::Initializing);
        assert!(rag.manager().embeddings().is_some());
        assert!(rag.manager().vector_store().is_some());
        assert!(rag.llm().is_none());

        let err = rag.query("anything").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotInitialized);
    }

    #[tokio::test]
    async fn test_query_before_initialize() {
        let rag = RagSystem::with_provider(config(), Arc::new(UnreachableProvider));
        let err = rag.query("anything").await.unwrap_err();
        assert!(matches!(err, RagError::NotInitialized("RAG system")));
        assert!(rag.ask("anything").await.is_err());
    }

    #[test]
    fn test_lifecycle_display() {
        assert_eq!(Lifecycle::Ready.to_string(), "ready");
        assert_eq!(Lifecycle::Initializing.to_string(), "initializing");
    }
}
