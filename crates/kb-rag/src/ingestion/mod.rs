//! Document ingestion: extraction and chunking

pub mod chunker;
pub mod extract;

pub use chunker::chunk_text;
pub use extract::{extract, DocumentFormat};
