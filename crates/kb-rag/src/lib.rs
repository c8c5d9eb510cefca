//! Knowledge-base question answering over documents and web pages
//!
//! Ingests PDFs, text files, HTML pages, and web search results into a
//! durable vector store, then answers questions by retrieving the most
//! similar chunks and prompting an Ollama-compatible model with them.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod sanitize;
pub mod server;
pub mod session;
pub mod storage;
pub mod types;
pub mod web;

pub use config::KbConfig;
pub use error::{Error, Result};
pub use pipeline::RagPipeline;
pub use server::KbServer;
