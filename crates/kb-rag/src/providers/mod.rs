//! Model provider traits and implementations

pub mod embedding;
pub mod llm;
pub mod ollama;

pub use embedding::{DimensionChecked, EmbeddingProvider};
pub use llm::{ChatMessage, LlmProvider};
pub use ollama::OllamaClient;
