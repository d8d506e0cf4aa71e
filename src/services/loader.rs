//! JSON document loading.
//!
//! [`JsonLoader`] selects values from a JSON file with a small jq-like path
//! expression and turns each selected value into a [`Document`].

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use super::chunker::TextSplitter;
use crate::error::LoaderError;
use crate::models::{Document, Metadata};

/// Selection used by [`load_documents`].
pub const MESSAGES_PATH_EXPR: &str = ".messages[]";

const LOAD_CHUNK_SIZE: usize = 1000;
const LOAD_CHUNK_OVERLAP: usize = 200;

/// One step of a path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// `.key` or `."quoted key"`
    Key(String),
    /// `[]`: every element of an array or every value of an object
    Iterate,
    /// `[N]`, negative counts from the end
    Index(i64),
}

fn invalid(expr: &str, reason: impl Into<String>) -> LoaderError {
    LoaderError::InvalidExpression {
        expr: expr.to_string(),
        reason: reason.into(),
    }
}

/// Parse `.`, `.key`, `."quoted key"`, `[]` and `[N]` segments.
pub fn parse_path_expr(expr: &str) -> Result<Vec<PathSegment>, LoaderError> {
    let chars: Vec<char> = expr.trim().chars().collect();
    if chars.first() != Some(&'.') {
        return Err(invalid(expr, "expression must start with '.'"));
    }

    let mut segments = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '.' => {
                i += 1;
                if i == chars.len() {
                    if i == 1 {
                        break;
                    }
                    return Err(invalid(expr, "expected key after '.'"));
                }
                match chars[i] {
                    '[' => {}
                    '"' => {
                        i += 1;
                        let mut key = String::new();
                        loop {
                            match chars.get(i) {
                                None => return Err(invalid(expr, "unterminated quoted key")),
                                Some('"') => break,
                                Some('\\') => {
                                    let escaped = chars
                                        .get(i + 1)
                                        .ok_or_else(|| invalid(expr, "unterminated quoted key"))?;
                                    key.push(*escaped);
                                    i += 2;
                                }
                                Some(c) => {
                                    key.push(*c);
                                    i += 1;
                                }
                            }
                        }
                        i += 1;
                        segments.push(PathSegment::Key(key));
                    }
                    _ => {
                        let start = i;
                        while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                            i += 1;
                        }
                        if start == i {
                            return Err(invalid(
                                expr,
                                format!("unexpected '{}' after '.'", chars[i]),
                            ));
                        }
                        segments.push(PathSegment::Key(chars[start..i].iter().collect()));
                    }
                }
            }
            '[' => {
                let close = chars[i..]
                    .iter()
                    .position(|&c| c == ']')
                    .map(|offset| i + offset)
                    .ok_or_else(|| invalid(expr, "missing ']'"))?;
                let inner: String = chars[i + 1..close].iter().collect();
                let inner = inner.trim();

                if inner.is_empty() {
                    segments.push(PathSegment::Iterate);
                } else {
                    let index = inner
                        .parse::<i64>()
                        .map_err(|_| invalid(expr, format!("invalid index '{inner}'")))?;
                    segments.push(PathSegment::Index(index));
                }
                i = close + 1;
            }
            c => return Err(invalid(expr, format!("unexpected '{c}'"))),
        }
    }

    Ok(segments)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn apply_segment(value: Value, segment: &PathSegment) -> Result<Vec<Value>, LoaderError> {
    match (segment, value) {
        (PathSegment::Key(key), Value::Object(mut map)) => {
            Ok(vec![map.remove(key).unwrap_or(Value::Null)])
        }
        (PathSegment::Key(_), Value::Null) => Ok(vec![Value::Null]),
        (PathSegment::Key(key), other) => Err(LoaderError::Selection(format!(
            "cannot index {} with \"{key}\"",
            type_name(&other)
        ))),
        (PathSegment::Iterate, Value::Array(items)) => Ok(items),
        (PathSegment::Iterate, Value::Object(map)) => Ok(map.into_iter().map(|(_, v)| v).collect()),
        (PathSegment::Iterate, other) => Err(LoaderError::Selection(format!(
            "cannot iterate over {}",
            type_name(&other)
        ))),
        (PathSegment::Index(index), Value::Array(mut items)) => {
            let len = items.len() as i64;
            let position = if *index < 0 { len + index } else { *index };
            if (0..len).contains(&position) {
                Ok(vec![items.swap_remove(position as usize)])
            } else {
                Ok(vec![Value::Null])
            }
        }
        (PathSegment::Index(_), Value::Null) => Ok(vec![Value::Null]),
        (PathSegment::Index(index), other) => Err(LoaderError::Selection(format!(
            "cannot index {} with {index}",
            type_name(&other)
        ))),
    }
}

/// Evaluate parsed segments against `root`.
pub fn select(root: Value, segments: &[PathSegment]) -> Result<Vec<Value>, LoaderError> {
    let mut values = vec![root];
    for segment in segments {
        let mut next = Vec::new();
        for value in values {
            next.extend(apply_segment(value, segment)?);
        }
        values = next;
    }
    Ok(values)
}

/// Loads documents from a JSON file.
#[derive(Debug, Clone)]
pub struct JsonLoader {
    path: PathBuf,
    path_expr: String,
    text_content: bool,
}

impl JsonLoader {
    /// A loader that requires every selected value to be a string.
    pub fn new(path: impl Into<PathBuf>, path_expr: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            path_expr: path_expr.into(),
            text_content: true,
        }
    }

    /// When `false`, non-string values are rendered as JSON text instead of
    /// rejected.
    #[must_use]
    pub fn with_text_content(mut self, text_content: bool) -> Self {
        self.text_content = text_content;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `null`, empty containers and falsy scalars become the empty string;
    /// `text_content` rejects anything else that is not a string.
    fn content_of(&self, value: Value, seq_num: usize) -> Result<String, LoaderError> {
        match value {
            Value::String(s) => Ok(s),
            Value::Null => Ok(String::new()),
            other if self.text_content => Err(LoaderError::Selection(format!(
                "expected string content at position {seq_num}, got {}",
                type_name(&other)
            ))),
            Value::Array(ref items) if items.is_empty() => Ok(String::new()),
            Value::Object(ref map) if map.is_empty() => Ok(String::new()),
            Value::Bool(false) => Ok(String::new()),
            Value::Number(ref n) if n.as_f64() == Some(0.0) => Ok(String::new()),
            other => Ok(other.to_string()),
        }
    }

    pub fn load(&self) -> Result<Vec<Document>, LoaderError> {
        let segments = parse_path_expr(&self.path_expr)?;

        let raw = fs::read_to_string(&self.path).map_err(|source| LoaderError::Io {
            path: self.path.clone(),
            source,
        })?;
        let root: Value = serde_json::from_str(&raw)?;

        let resolved = fs::canonicalize(&self.path).map_err(|source| LoaderError::Io {
            path: self.path.clone(),
            source,
        })?;
        let source = resolved.display().to_string();
        let documents = select(root, &segments)?
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                let seq_num = i + 1;
                let content = self.content_of(value, seq_num)?;
                let mut metadata = Metadata::new();
                metadata.insert("source".to_string(), Value::from(source.as_str()));
                metadata.insert("seq_num".to_string(), Value::from(seq_num));
                Ok(Document::with_metadata(content, metadata))
            })
            .collect::<Result<Vec<_>, LoaderError>>()?;

        debug!(path = %source, expr = %self.path_expr, documents = documents.len(), "loaded JSON documents");
        Ok(documents)
    }
}

/// Load `{"messages": [...]}` from `path` and split every message into
/// 1000-character chunks with 200 characters of overlap.
pub fn load_documents(path: impl AsRef<Path>) -> Result<Vec<Document>, LoaderError> {
    let documents = JsonLoader::new(path.as_ref(), MESSAGES_PATH_EXPR)
        .with_text_content(false)
        .load()?;

    let splitter = TextSplitter::new(LOAD_CHUNK_SIZE, LOAD_CHUNK_OVERLAP);
    Ok(splitter.split_documents(&documents))
}
