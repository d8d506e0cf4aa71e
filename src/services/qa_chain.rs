//! Retrieval-augmented question answering.
//!
//! Answering is split into two steps that can be exercised on their own:
//! [`RetrievalQa::retrieve`] pulls the top-k chunks for a query and
//! [`RetrievalQa::generate`] "stuffs" them into a single prompt for the chat
//! model.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::llm::ChatModel;
use super::vector_store::VectorStore;
use crate::error::{LlmError, UpstreamError, VectorStoreError};
use crate::models::Document;

pub const DEFAULT_QA_TEMPLATE: &str = "You are a helpful AI assistant that answers questions based on the provided context.
Use the following pieces of context to answer the question at the end.
If you don't know the answer based on the context, just say that you don't know.
Context:
{context}
Question: {question}
Answer:";

/// Separator placed between retrieved chunks in the context slot.
const CONTEXT_SEPARATOR: &str = "\n\n";

/// Source of ranked chunks for a query.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Up to `k` documents, most similar first.
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Document>, VectorStoreError>;
}

/// Retriever backed by a vector store similarity search.
#[derive(Clone)]
pub struct VectorStoreRetriever {
    store: Arc<dyn VectorStore>,
}

impl VectorStoreRetriever {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Retriever for VectorStoreRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Document>, VectorStoreError> {
        self.store.similarity_search(query, k).await
    }
}

/// Prompt with `{context}` and `{question}` placeholders.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_QA_TEMPLATE)
    }
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn format(&self, context: &str, question: &str) -> String {
        self.template
            .replace("{context}", context)
            .replace("{question}", question)
    }
}

/// Answer plus the chunks it was conditioned on.
#[derive(Debug, Clone)]
pub struct QaOutput {
    pub answer: String,
    pub source_documents: Vec<Document>,
}

pub struct RetrievalQa {
    retriever: Arc<dyn Retriever>,
    llm: Arc<dyn ChatModel>,
    prompt: PromptTemplate,
    top_k: usize,
}

impl RetrievalQa {
    pub fn new(retriever: Arc<dyn Retriever>, llm: Arc<dyn ChatModel>, top_k: usize) -> Self {
        Self {
            retriever,
            llm,
            prompt: PromptTemplate::default(),
            top_k,
        }
    }

    #[must_use]
    pub fn with_prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Document>, VectorStoreError> {
        self.retriever.retrieve(query, k).await
    }

    /// Render the prompt from `context` and ask the chat model.
    pub async fn generate(&self, question: &str, context: &[Document]) -> Result<String, LlmError> {
        let joined = context
            .iter()
            .map(|d| d.content.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);
        let prompt = self.prompt.format(&joined, question);
        self.llm.generate(&prompt).await
    }

    pub async fn invoke(&self, question: &str) -> Result<QaOutput, UpstreamError> {
        let source_documents = self.retrieve(question, self.top_k).await?;
        debug!(retrieved = source_documents.len(), top_k = self.top_k, "retrieved context");

        let answer = self.generate(question, &source_documents).await?;

        Ok(QaOutput {
            answer,
            source_documents,
        })
    }
}
