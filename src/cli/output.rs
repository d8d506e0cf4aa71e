use std::fmt::Write as FmtWrite;

use serde::Serialize;

use crate::models::{Document, OutputFormat, QueryResult};
use crate::utils::preview_line;

/// Characters of each chunk shown by `split`.
const CHUNK_PREVIEW_CHARS: usize = 80;

pub trait Formatter {
    fn format_query_result(&self, result: &QueryResult) -> String;
    fn format_ingest_stats(&self, stats: &IngestStats) -> String;
    fn format_chunks(&self, chunks: &[Document]) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub llm_model: String,
    pub embedding_model: String,
    pub api_key_configured: bool,
    pub persist_directory: String,
    pub collection: String,
    pub store_exists: bool,
    /// `None` when the store could not be opened
    pub chunk_count: Option<u64>,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestStats {
    pub file: String,
    pub documents: u64,
    pub chunks_created: u64,
    pub collection: String,
    pub duration_ms: u64,
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_query_result(&self, result: &QueryResult) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "Question: {}\n", result.question);
        let _ = writeln!(output, "{}\n", result.answer.trim_end());

        if result.source_documents.is_empty() {
            let _ = writeln!(output, "No source documents.");
            return output;
        }

        let _ = writeln!(output, "Sources ({}):", result.source_documents.len());
        for (i, source) in result.source_documents.iter().enumerate() {
            let origin = source
                .metadata
                .get("source")
                .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(output, "{}. {}", i + 1, origin);
            for line in source.content.lines() {
                let _ = writeln!(output, "   {}", line);
            }
        }

        output
    }

    fn format_ingest_stats(&self, stats: &IngestStats) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "Ingest Complete");
        let _ = writeln!(output, "---------------");
        let _ = writeln!(output, "File: {}", stats.file);
        let _ = writeln!(output, "Documents loaded: {}", stats.documents);
        let _ = writeln!(output, "Chunks created: {}", stats.chunks_created);
        let _ = writeln!(output, "Collection: {}", stats.collection);
        let _ = writeln!(output, "Duration: {}ms", stats.duration_ms);
        output
    }

    fn format_chunks(&self, chunks: &[Document]) -> String {
        if chunks.is_empty() {
            return "No chunks produced.\n".to_string();
        }

        let mut output = String::new();
        let _ = writeln!(output, "{} chunks\n", chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            let _ = writeln!(
                output,
                "{:>4}. [{} chars] {}",
                i + 1,
                chunk.char_len(),
                preview_line(&chunk.content, CHUNK_PREVIEW_CHARS)
            );
        }
        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "Status");
        let _ = writeln!(output, "------");

        let key_status = if status.api_key_configured {
            "[SET]"
        } else {
            "[MISSING]"
        };
        let _ = writeln!(output, "API key:       {}", key_status);
        let _ = writeln!(output, "  LLM:         {}", status.llm_model);
        let _ = writeln!(output, "  Embedding:   {}", status.embedding_model);
        let _ = writeln!(output);

        let store_status = if status.store_exists {
            "[FOUND]"
        } else {
            "[NOT CREATED]"
        };
        let _ = writeln!(output, "Vector Store:  {}", store_status);
        let _ = writeln!(output, "  Path:        {}", status.persist_directory);
        let _ = writeln!(output, "  Collection:  {}", status.collection);
        if let Some(count) = status.chunk_count {
            let _ = writeln!(output, "  Chunks:      {}", count);
        }
        let _ = writeln!(output);

        let _ = writeln!(
            output,
            "Chunking:      {} chars, {} overlap",
            status.chunk_size, status.chunk_overlap
        );
        let _ = writeln!(output, "Top-K:         {}", status.top_k);
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render<T: Serialize + ?Sized>(&self, value: &T) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_else(|e| serde_json::json!({"error": e.to_string()}).to_string())
    }
}

impl Formatter for JsonFormatter {
    fn format_query_result(&self, result: &QueryResult) -> String {
        self.render(result)
    }

    fn format_ingest_stats(&self, stats: &IngestStats) -> String {
        self.render(stats)
    }

    fn format_chunks(&self, chunks: &[Document]) -> String {
        self.render(&serde_json::json!({
            "count": chunks.len(),
            "chunks": chunks,
        }))
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        self.render(status)
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({"message": message}).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({"error": error}).to_string()
    }
}

pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format_query_result(&self, result: &QueryResult) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "## {}\n", result.question);
        let _ = writeln!(output, "{}\n", result.answer.trim_end());

        if result.source_documents.is_empty() {
            return output;
        }

        let _ = writeln!(output, "### Sources\n");
        for (i, source) in result.source_documents.iter().enumerate() {
            let metadata = serde_json::Value::Object(source.metadata.clone());
            let _ = writeln!(output, "{}. `{}`\n", i + 1, metadata);
            let _ = writeln!(output, "```");
            let _ = writeln!(output, "{}", source.content);
            let _ = writeln!(output, "```\n");
        }
        output
    }

    fn format_ingest_stats(&self, stats: &IngestStats) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "## Ingest Complete\n");
        let _ = writeln!(output, "| Metric | Value |");
        let _ = writeln!(output, "|--------|-------|");
        let _ = writeln!(output, "| File | `{}` |", stats.file);
        let _ = writeln!(output, "| Documents loaded | {} |", stats.documents);
        let _ = writeln!(output, "| Chunks created | {} |", stats.chunks_created);
        let _ = writeln!(output, "| Collection | {} |", stats.collection);
        let _ = writeln!(output, "| Duration | {}ms |", stats.duration_ms);
        output
    }

    fn format_chunks(&self, chunks: &[Document]) -> String {
        if chunks.is_empty() {
            return "## Chunks\n\n*No chunks produced.*\n".to_string();
        }

        let mut output = String::new();
        let _ = writeln!(output, "## Chunks ({})\n", chunks.len());
        let _ = writeln!(output, "| # | Chars | Preview |");
        let _ = writeln!(output, "|---|-------|---------|");
        for (i, chunk) in chunks.iter().enumerate() {
            let preview = preview_line(&chunk.content, CHUNK_PREVIEW_CHARS).replace('|', "\\|");
            let _ = writeln!(output, "| {} | {} | {} |", i + 1, chunk.char_len(), preview);
        }
        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "## Status\n");

        let key_status = if status.api_key_configured { "✅" } else { "❌" };
        let _ = writeln!(output, "### Gemini {}\n", key_status);
        let _ = writeln!(output, "- **LLM:** {}", status.llm_model);
        let _ = writeln!(output, "- **Embedding:** {}", status.embedding_model);
        let _ = writeln!(output);

        let store_status = if status.store_exists { "✅" } else { "❌" };
        let _ = writeln!(output, "### Vector Store {}\n", store_status);
        let _ = writeln!(output, "- **Path:** `{}`", status.persist_directory);
        let _ = writeln!(output, "- **Collection:** {}", status.collection);
        if let Some(count) = status.chunk_count {
            let _ = writeln!(output, "- **Chunks:** {}", count);
        }
        let _ = writeln!(
            output,
            "- **Chunking:** {} chars, {} overlap",
            status.chunk_size, status.chunk_overlap
        );
        let _ = writeln!(output, "- **Top-K:** {}", status.top_k);
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("> {}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("> ⚠️ **Error:** {}\n", error)
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}
