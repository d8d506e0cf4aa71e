mod chunker;
mod embedding;
mod gemini;
mod llm;
mod loader;
mod manager;
mod provider;
mod qa_chain;
mod rag;
mod vector_store;

pub use chunker::{DEFAULT_SEPARATORS, TextSplitter};
pub use embedding::{EmbeddingProvider, GeminiEmbeddingClient};
pub use llm::{ChatModel, GeminiChatClient};
pub use loader::{JsonLoader, MESSAGES_PATH_EXPR, PathSegment, load_documents, parse_path_expr};
pub use manager::VectorStoreManager;
pub use provider::{GeminiProvider, ModelProvider};
pub use qa_chain::{
    DEFAULT_QA_TEMPLATE, PromptTemplate, QaOutput, RetrievalQa, Retriever, VectorStoreRetriever,
};
pub use rag::{Lifecycle, RagSystem};
pub use vector_store::{
    CollectionInfo, DB_FILE_NAME, SqliteVectorStore, VectorStore, open_store,
};
