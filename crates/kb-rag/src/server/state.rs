//! Shared application state

use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;

use crate::config::KbConfig;
use crate::error::Result;
use crate::generation::AnswerGenerator;
use crate::pipeline::RagPipeline;
use crate::providers::{DimensionChecked, OllamaClient};
use crate::sanitize::Sanitizer;
use crate::session::SessionState;
use crate::storage::VectorStore;
use crate::web::{WebFetcher, WebSearcher};

/// Shared application state, cheap to clone into handlers
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: KbConfig,
    pipeline: RagPipeline,
    /// Per-session chat state, keyed by caller-chosen session id
    sessions: DashMap<String, Arc<tokio::sync::Mutex<SessionState>>>,
}

impl AppState {
    /// Wire up the full pipeline from configuration
    pub fn new(config: KbConfig) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(VectorStore::open(
            &config.vector_db.storage_path,
            &config.vector_db.collection,
            config.embeddings.dimensions,
        )?);

        // One client serves both embeddings and chat.
        let ollama = Arc::new(OllamaClient::new(&config.llm, &config.embeddings.model));
        let embedder = DimensionChecked::new(ollama.clone(), config.embeddings.dimensions);
        let generator = AnswerGenerator::new(ollama);

        let pipeline = RagPipeline::new(
            Sanitizer::new(&config.sanitizer)?,
            config.chunking.clone(),
            embedder,
            store,
            generator,
            WebSearcher::new(&config.web),
            WebFetcher::new(&config.web),
        );

        info!(
            collection = %config.vector_db.collection,
            model = %config.embeddings.model,
            "application state initialized"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pipeline,
                sessions: DashMap::new(),
            }),
        })
    }

    /// Build state around an existing pipeline. Used by tests.
    pub fn with_pipeline(config: KbConfig, pipeline: RagPipeline) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pipeline,
                sessions: DashMap::new(),
            }),
        }
    }

    pub fn config(&self) -> &KbConfig {
        &self.inner.config
    }

    pub fn pipeline(&self) -> &RagPipeline {
        &self.inner.pipeline
    }

    /// Get or create the state for a session id
    pub fn session(&self, id: &str) -> Arc<tokio::sync::Mutex<SessionState>> {
        let entry = self
            .inner
            .sessions
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(SessionState::new())));
        Arc::clone(entry.value())
    }

    /// Look up a session without creating it
    pub fn existing_session(&self, id: &str) -> Option<Arc<tokio::sync::Mutex<SessionState>>> {
        self.inner.sessions.get(id).map(|s| Arc::clone(s.value()))
    }
}
