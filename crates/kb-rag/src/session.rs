//! Per-session conversation state

use crate::error::{Error, Result};
use crate::ingestion::extract::{self, DocumentFormat};
use crate::types::ChatTurn;

/// Mutable state attached to a chat session.
///
/// Holds the running chat history plus an optional "active document": the
/// text of the most recently uploaded file, answered against directly
/// instead of going through vector retrieval.
#[derive(Debug, Default)]
pub struct SessionState {
    history: Vec<ChatTurn>,
    active_document: Option<ActiveDocument>,
}

/// The full extracted text of a recently uploaded document
#[derive(Debug, Clone)]
pub struct ActiveDocument {
    pub source: String,
    pub text: String,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed question/response exchange
    pub fn record_turn(&mut self, query: impl Into<String>, response: impl Into<String>) {
        self.history.push(ChatTurn::new(query, response));
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Make an uploaded document the active one for this session.
    ///
    /// Extraction failures leave any previously active document in place.
    pub fn set_active_document(
        &mut self,
        source: &str,
        data: &[u8],
        format: DocumentFormat,
    ) -> Result<()> {
        let text = extract::extract(data, format, source)?;
        if text.trim().is_empty() {
            return Err(Error::extraction(source, "document yielded no text"));
        }
        self.active_document = Some(ActiveDocument {
            source: source.to_string(),
            text,
        });
        Ok(())
    }

    pub fn active_document(&self) -> Option<&ActiveDocument> {
        self.active_document.as_ref()
    }

    pub fn clear_active_document(&mut self) {
        self.active_document = None;
    }
}
