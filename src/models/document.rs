use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key-value provenance attached to a document and copied onto its chunks.
pub type Metadata = Map<String, Value>;

/// A unit of text plus its metadata. Chunks produced by the splitter are
/// documents too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(content: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Add a metadata entry.
    #[must_use]
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Character count, which is what chunk sizes are measured in.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// A chunk as persisted in the vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embedding: Vec<f32>,
    pub created_at: String,
}

impl StoredChunk {
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn from_document(document: Document, embedding: Vec<f32>) -> Self {
        Self {
            id: Self::generate_id(),
            content: document.content,
            metadata: document.metadata,
            embedding,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn into_document(self) -> Document {
        Document::with_metadata(self.content, self.metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_builder() {
        let doc = Document::new("The sky is blue.")
            .with_entry("source", "a")
            .with_entry("seq_num", 1);
        assert_eq!(doc.content, "The sky is blue.");
        assert_eq!(doc.metadata.get("source"), Some(&json!("a")));
        assert_eq!(doc.metadata.get("seq_num"), Some(&json!(1)));
    }

    #[test]
    fn test_char_len_counts_chars() {
        assert_eq!(Document::new("héllo").char_len(), 5);
    }

    #[test]
    fn test_stored_chunk_ids_are_unique() {
        let a = StoredChunk::from_document(Document::new("same"), vec![1.0]);
        let b = StoredChunk::from_document(Document::new("same"), vec![1.0]);
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 36);
        assert!(!a.created_at.is_empty());
    }

    #[test]
    fn test_stored_chunk_round_trip_keeps_metadata() {
        let doc = Document::new("text").with_entry("source", "a");
        let chunk = StoredChunk::from_document(doc.clone(), Vec::new());
        assert_eq!(chunk.into_document(), doc);
    }

    #[test]
    fn test_deserialize_without_metadata() {
        let doc: Document = serde_json::from_str(r#"{"content": "hi"}"#).unwrap();
        assert!(doc.metadata.is_empty());
    }
}
