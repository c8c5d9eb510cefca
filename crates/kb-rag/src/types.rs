//! Shared types for chunks and chat turns

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bounded slice of sanitized document text, the unit of retrieval.
///
/// Chunk ids are derived from the source label and position, so re-ingesting
/// the same source overwrites its own chunks (upsert) and can never clobber
/// chunks belonging to an unrelated document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Store-unique chunk id
    pub id: String,
    /// Sanitized text content
    pub text: String,
    /// Filename or URL the chunk came from
    pub source: String,
    /// Position of the chunk within its document
    pub ingest_order: u32,
}

impl Chunk {
    /// Create a chunk with a deterministic id derived from source and order
    pub fn new(source: &str, ingest_order: u32, text: String) -> Self {
        Self {
            id: format!("{source}#{ingest_order}"),
            text,
            source: source.to_string(),
            ingest_order,
        }
    }
}

/// One question/response exchange in a session's chat history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatTurn {
    pub query: String,
    pub response: String,
    pub asked_at: DateTime<Utc>,
}

impl ChatTurn {
    pub fn new(query: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            response: response.into(),
            asked_at: Utc::now(),
        }
    }
}
