//! Vector store abstraction layer.
//!
//! A store is a single named collection with an embedding provider attached:
//! callers hand it plain documents and query text, and the store embeds both.

mod sqlite;

pub use sqlite::{DB_FILE_NAME, SqliteVectorStore};

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use super::embedding::EmbeddingProvider;
use crate::error::VectorStoreError;
use crate::models::Document;

/// Collection information
#[derive(Debug, Clone)]
pub struct CollectionInfo {
    pub name: String,
    pub points_count: u64,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Embed and insert documents; returns the generated chunk ids.
    async fn add_documents(&self, documents: Vec<Document>)
    -> Result<Vec<String>, VectorStoreError>;

    /// The `k` most similar documents with their cosine similarity, best first.
    async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<(Document, f32)>, VectorStoreError>;

    /// The `k` most similar documents, best first.
    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<Document>, VectorStoreError> {
        let scored = self.similarity_search_with_score(query, k).await?;
        Ok(scored.into_iter().map(|(doc, _)| doc).collect())
    }

    /// Get information about the bound collection.
    async fn collection_info(&self) -> Result<CollectionInfo, VectorStoreError>;

    /// Get the collection name.
    fn collection(&self) -> &str;
}

/// Open (creating if needed) the persistent store rooted at `persist_directory`.
pub fn open_store(
    persist_directory: &Path,
    collection: &str,
    embeddings: Arc<dyn EmbeddingProvider>,
) -> Result<Arc<dyn VectorStore>, VectorStoreError> {
    let store = SqliteVectorStore::open(persist_directory, collection, embeddings)?;
    Ok(Arc::new(store))
}
