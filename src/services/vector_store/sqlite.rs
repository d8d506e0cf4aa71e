//! SQLite vector store backend.
//!
//! Chunks, metadata and embeddings live in one database file inside the
//! persist directory. Search is an exhaustive cosine-similarity scan over the
//! bound collection.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{Connection, params};
use tokio::sync::Mutex;
use tracing::debug;

use super::{CollectionInfo, VectorStore};
use crate::error::VectorStoreError;
use crate::models::{Document, Metadata, StoredChunk};
use crate::services::embedding::EmbeddingProvider;

pub const DB_FILE_NAME: &str = "docqa.sqlite3";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS collections (
    name TEXT PRIMARY KEY,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS embeddings (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    collection TEXT NOT NULL REFERENCES collections(name),
    content TEXT NOT NULL,
    metadata TEXT NOT NULL DEFAULT '{}',
    embedding BLOB NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_embeddings_collection ON embeddings(collection);
"#;

pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
    collection: String,
    embeddings: Arc<dyn EmbeddingProvider>,
    db_path: PathBuf,
}

struct Row {
    id: String,
    content: String,
    metadata: String,
    embedding: Vec<u8>,
}

impl SqliteVectorStore {
    /// Open the database under `persist_directory` and bind `collection`,
    /// creating both if missing. The directory itself must exist.
    pub fn open(
        persist_directory: &Path,
        collection: &str,
        embeddings: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, VectorStoreError> {
        let db_path = persist_directory.join(DB_FILE_NAME);
        let conn = Connection::open(&db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        conn.execute(
            "INSERT OR IGNORE INTO collections (name, created_at) VALUES (?1, ?2)",
            params![collection, chrono::Utc::now().to_rfc3339()],
        )?;

        debug!(path = %db_path.display(), collection, "opened vector store");

        Ok(Self {
            conn: Mutex::new(conn),
            collection: collection.to_string(),
            embeddings,
            db_path,
        })
    }

    /// Count a collection's chunks without binding an embedding provider.
    /// Returns 0 when the database does not exist.
    pub fn count_collection(
        persist_directory: &Path,
        collection: &str,
    ) -> Result<u64, VectorStoreError> {
        let db_path = persist_directory.join(DB_FILE_NAME);
        if !db_path.is_file() {
            return Ok(0);
        }

        let conn = Connection::open(&db_path)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM embeddings WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Option<Vec<f32>> {
        if bytes.len() % 4 != 0 {
            return None;
        }
        Some(
            bytes
                .chunks_exact(4)
                .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                .collect(),
        )
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let denom = norm_a * norm_b;

        if denom <= f32::EPSILON {
            0.0
        } else {
            dot / denom
        }
    }

    async fn insert(&self, chunks: &[StoredChunk]) -> Result<(), VectorStoreError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO embeddings (id, collection, content, metadata, embedding, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for chunk in chunks {
                stmt.execute(params![
                    chunk.id,
                    self.collection,
                    chunk.content,
                    serde_json::to_string(&chunk.metadata)?,
                    Self::serialize_embedding(&chunk.embedding),
                    chunk.created_at,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    async fn load_rows(&self) -> Result<Vec<Row>, VectorStoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, content, metadata, embedding FROM embeddings
             WHERE collection = ?1 ORDER BY seq",
        )?;
        let rows = stmt
            .query_map(params![self.collection], |row| {
                Ok(Row {
                    id: row.get(0)?,
                    content: row.get(1)?,
                    metadata: row.get(2)?,
                    embedding: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn add_documents(
        &self,
        documents: Vec<Document>,
    ) -> Result<Vec<String>, VectorStoreError> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let vectors = self.embeddings.embed_documents(&texts).await?;

        if vectors.len() != documents.len() {
            return Err(VectorStoreError::EmbeddingCountMismatch {
                expected: documents.len(),
                actual: vectors.len(),
            });
        }

        let chunks: Vec<StoredChunk> = documents
            .into_iter()
            .zip(vectors)
            .map(|(doc, embedding)| StoredChunk::from_document(doc, embedding))
            .collect();

        self.insert(&chunks).await?;

        Ok(chunks.into_iter().map(|c| c.id).collect())
    }

    async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<(Document, f32)>, VectorStoreError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embeddings.embed_query(query).await?;
        let rows = self.load_rows().await?;

        let mut scored = Vec::with_capacity(rows.len());
        for row in rows {
            let embedding = Self::deserialize_embedding(&row.embedding)
                .ok_or_else(|| VectorStoreError::CorruptEmbedding(row.id.clone()))?;
            let metadata: Metadata = serde_json::from_str(&row.metadata)?;
            let score = Self::cosine_similarity(&query_vector, &embedding);
            scored.push((Document::with_metadata(row.content, metadata), score));
        }

        // stable sort: equal scores keep insertion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        debug!(collection = %self.collection, k, hits = scored.len(), "similarity search");
        Ok(scored)
    }

    async fn collection_info(&self) -> Result<CollectionInfo, VectorStoreError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM embeddings WHERE collection = ?1",
            params![self.collection],
            |row| row.get(0),
        )?;
        Ok(CollectionInfo {
            name: self.collection.clone(),
            points_count: count as u64,
        })
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmbeddingError;
    use serde_json::json;

    /// Letter-frequency embedding, good enough to rank obvious matches.
    struct LetterEmbeddings;

    fn letters(text: &str) -> Vec<f32> {
        let mut v = vec![0.0; 26];
        for c in text.to_lowercase().chars().filter(char::is_ascii_lowercase) {
            v[(c as u8 - b'a') as usize] += 1.0;
        }
        v
    }

    #[async_trait]
    impl EmbeddingProvider for LetterEmbeddings {
        async fn embed_documents(
            &self,
            texts: &[String],
        ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|t| letters(t)).collect())
        }

        async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(letters(text))
        }

        fn model(&self) -> &str {
            "letters"
        }
    }

    fn open(dir: &Path, collection: &str) -> SqliteVectorStore {
        SqliteVectorStore::open(dir, collection, Arc::new(LetterEmbeddings)).unwrap()
    }

    #[test]
    fn test_embedding_blob_round_trip() {
        let v = vec![0.5, -1.25, 3.0];
        let bytes = SqliteVectorStore::serialize_embedding(&v);
        assert_eq!(bytes.len(), 12);
        assert_eq!(SqliteVectorStore::deserialize_embedding(&bytes), Some(v));
        assert_eq!(SqliteVectorStore::deserialize_embedding(&[0, 1, 2]), None);
    }

    #[test]
    fn test_cosine_similarity() {
        let sim = SqliteVectorStore::cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]);
        assert!((sim - 1.0).abs() < 1e-6);
        assert_eq!(SqliteVectorStore::cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(SqliteVectorStore::cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(SqliteVectorStore::cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_add_and_search() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path(), "docs");

        let ids = store
            .add_documents(vec![
                Document::new("zzz zebra zone").with_entry("source", "z"),
                Document::new("apple apple pie").with_entry("source", "a"),
            ])
            .await
            .unwrap();
        assert_eq!(ids.len(), 2);

        let results = store.similarity_search_with_score("apple", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.content, "apple apple pie");
        assert_eq!(results[0].0.metadata.get("source"), Some(&json!("a")));
        assert!(results[0].1 >= results[1].1);

        let top = store.similarity_search("apple", 1).await.unwrap();
        assert_eq!(top.len(), 1);
        assert!(store.similarity_search("apple", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicates_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path(), "docs");
        let doc = Document::new("same content");

        store.add_documents(vec![doc.clone()]).await.unwrap();
        store.add_documents(vec![doc]).await.unwrap();

        assert_eq!(store.collection_info().await.unwrap().points_count, 2);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = open(dir.path(), "docs");
            store
                .add_documents(vec![Document::new("The sky is blue.")])
                .await
                .unwrap();
        }

        assert_eq!(
            SqliteVectorStore::count_collection(dir.path(), "docs").unwrap(),
            1
        );
        let store = open(dir.path(), "docs");
        assert!(store.db_path().ends_with(DB_FILE_NAME));
        let info = store.collection_info().await.unwrap();
        assert_eq!(info.name, "docs");
        assert_eq!(info.points_count, 1);
        let results = store.similarity_search("sky", 4).await.unwrap();
        assert_eq!(results[0].content, "The sky is blue.");
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let a = open(dir.path(), "a");
        let b = open(dir.path(), "b");

        a.add_documents(vec![Document::new("only in a")]).await.unwrap();

        assert_eq!(a.collection_info().await.unwrap().points_count, 1);
        assert_eq!(b.collection_info().await.unwrap().points_count, 0);
        assert!(b.similarity_search("only", 4).await.unwrap().is_empty());
    }

    #[test]
    fn test_count_missing_database() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            SqliteVectorStore::count_collection(dir.path(), "docs").unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_add_empty_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path(), "docs");
        assert!(store.add_documents(Vec::new()).await.unwrap().is_empty());
        assert_eq!(store.collection_info().await.unwrap().points_count, 0);
    }
}
