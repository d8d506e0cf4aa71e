use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_LLM_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_COLLECTION: &str = "documents";
pub const DEFAULT_PERSIST_DIRECTORY: &str = "./chroma_db";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub gemini: GeminiConfig,

    #[serde(default)]
    pub indexing: IndexingConfig,

    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("docqa").join("config.toml"))
    }

    /// Load the config file (if any) and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_file()?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn load_file() -> Result<Self, ConfigError> {
        if let Some(path) = Self::config_path()
            && path.exists()
        {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            return Ok(config);
        }
        Ok(Self::default())
    }

    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_path().ok_or_else(|| {
            ConfigError::PathError("could not determine config directory".to_string())
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Override values from a key lookup, normally the process environment.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("GOOGLE_API_KEY") {
            self.gemini.api_key = Some(v);
        }
        if let Some(v) = get("DOCQA_LLM_MODEL") {
            self.gemini.llm_model = v;
        }
        if let Some(v) = get("DOCQA_EMBEDDING_MODEL") {
            self.gemini.embedding_model = v;
        }
        if let Some(v) = get("DOCQA_GEMINI_BASE_URL") {
            self.gemini.base_url = v;
        }
        if let Some(v) = get("DOCQA_TEMPERATURE") {
            self.gemini.temperature = parse_value("DOCQA_TEMPERATURE", &v)?;
        }
        if let Some(v) = get("DOCQA_MAX_OUTPUT_TOKENS") {
            self.gemini.max_output_tokens = parse_value("DOCQA_MAX_OUTPUT_TOKENS", &v)?;
        }
        if let Some(v) = get("DOCQA_CHUNK_SIZE") {
            self.indexing.chunk_size = parse_value("DOCQA_CHUNK_SIZE", &v)?;
        }
        if let Some(v) = get("DOCQA_CHUNK_OVERLAP") {
            self.indexing.chunk_overlap = parse_value("DOCQA_CHUNK_OVERLAP", &v)?;
        }
        if let Some(v) = get("DOCQA_COLLECTION") {
            self.vector_store.collection = v;
        }
        if let Some(v) = get("DOCQA_PERSIST_DIR") {
            self.vector_store.persist_directory = PathBuf::from(v);
        }
        if let Some(v) = get("DOCQA_TOP_K") {
            self.retrieval.top_k = parse_value("DOCQA_TOP_K", &v)?;
        }

        Ok(())
    }

    /// Check that credentials, model names and numeric parameters are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

        if self
            .gemini
            .api_key
            .as_deref()
            .is_none_or(|k| k.trim().is_empty())
        {
            return invalid("GOOGLE_API_KEY is required");
        }
        if self.gemini.llm_model.trim().is_empty() {
            return invalid("LLM model name is required");
        }
        if self.gemini.embedding_model.trim().is_empty() {
            return invalid("embedding model name is required");
        }
        if !(0.0..=2.0).contains(&self.gemini.temperature) {
            return invalid("temperature must be between 0.0 and 2.0");
        }
        if self.gemini.max_output_tokens == 0 {
            return invalid("max_output_tokens must be at least 1");
        }
        if self.indexing.chunk_size == 0 {
            return invalid("chunk_size must be at least 1");
        }
        if self.indexing.chunk_overlap >= self.indexing.chunk_size {
            return Err(ConfigError::ValidationError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.indexing.chunk_overlap, self.indexing.chunk_size
            )));
        }
        if self.vector_store.collection.trim().is_empty() {
            return invalid("collection name is required");
        }
        if self.retrieval.top_k == 0 {
            return invalid("top_k must be at least 1");
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::ValidationError(format!("invalid value for {key}: {value}")))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_llm_model")]
    pub llm_model: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_embedding_batch_size")]
    pub embedding_batch_size: u32,

    /// Request timeout; unset means requests may block indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_llm_model() -> String {
    DEFAULT_LLM_MODEL.to_string()
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_output_tokens() -> u32 {
    1024
}

fn default_base_url() -> String {
    DEFAULT_GEMINI_BASE_URL.to_string()
}

// batchEmbedContents accepts at most 100 requests
fn default_embedding_batch_size() -> u32 {
    100
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            llm_model: default_llm_model(),
            embedding_model: default_embedding_model(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            base_url: default_base_url(),
            embedding_batch_size: default_embedding_batch_size(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(default = "default_persist_directory")]
    pub persist_directory: PathBuf,
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_persist_directory() -> PathBuf {
    PathBuf::from(DEFAULT_PERSIST_DIRECTORY)
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            persist_directory: default_persist_directory(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    4
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}
