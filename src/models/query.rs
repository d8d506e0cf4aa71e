//! Query-related models: output format and question-answering results.

use serde::{Deserialize, Serialize};

use super::document::{Document, Metadata};
use crate::utils::truncate_snippet;

/// Maximum characters of a source chunk echoed back in a [`QueryResult`].
pub const SNIPPET_MAX_CHARS: usize = 200;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// Machine-parseable JSON format
    Json,
    /// Documentation-friendly Markdown format
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// A source chunk used to answer a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Chunk content, truncated to [`SNIPPET_MAX_CHARS`] plus an ellipsis
    pub content: String,

    /// Metadata of the chunk as stored
    pub metadata: Metadata,
}

impl From<&Document> for SourceDocument {
    fn from(document: &Document) -> Self {
        Self {
            content: truncate_snippet(&document.content, SNIPPET_MAX_CHARS),
            metadata: document.metadata.clone(),
        }
    }
}

/// Answer to a question together with the sources it was generated from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub question: String,
    pub answer: String,
    pub source_documents: Vec<SourceDocument>,
}

impl QueryResult {
    pub fn new(question: impl Into<String>, answer: impl Into<String>, sources: &[Document]) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            source_documents: sources.iter().map(SourceDocument::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(
            "md".parse::<OutputFormat>().unwrap(),
            OutputFormat::Markdown
        );
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_source_document_truncates_long_content() {
        let doc = Document::new("x".repeat(250)).with_entry("source", "a");
        let source = SourceDocument::from(&doc);
        assert_eq!(source.content.chars().count(), 203);
        assert!(source.content.ends_with("..."));
        assert_eq!(source.metadata, doc.metadata);
    }

    #[test]
    fn test_source_document_keeps_short_content() {
        let doc = Document::new("y".repeat(200));
        assert_eq!(SourceDocument::from(&doc).content, "y".repeat(200));
    }

    #[test]
    fn test_query_result_preserves_source_order() {
        let docs = vec![Document::new("first"), Document::new("second")];
        let result = QueryResult::new("q", "a", &docs);
        assert_eq!(result.question, "q");
        assert_eq!(result.answer, "a");
        let contents: Vec<&str> = result
            .source_documents
            .iter()
            .map(|s| s.content.as_str())
            .collect();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[test]
    fn test_query_result_json_shape() {
        let docs = vec![Document::new("The sky is blue.").with_entry("source", "a")];
        let result = QueryResult::new("What color is the sky?", "Blue.", &docs);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["question"], "What color is the sky?");
        assert_eq!(json["source_documents"][0]["content"], "The sky is blue.");
        assert_eq!(json["source_documents"][0]["metadata"]["source"], "a");
    }
}
