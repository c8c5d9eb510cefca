//! The retrieval-augmented pipeline
//!
//! Orchestrates every path from raw input to the knowledge base and from a
//! question to an answer. All text entering an embedding or a prompt goes
//! through the sanitizer first.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::generation::{AnswerGenerator, PromptBuilder, NO_RELEVANT_CONTENT};
use crate::ingestion::extract::DocumentFormat;
use crate::ingestion::{chunk_text, extract};
use crate::providers::DimensionChecked;
use crate::sanitize::Sanitizer;
use crate::session::SessionState;
use crate::storage::VectorStore;
use crate::types::Chunk;
use crate::web::{WebFetcher, WebSearcher};

/// Number of chunks retrieved per query
pub const TOP_K: usize = 5;

/// Outcome of ingesting one source into the store
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub source: String,
    pub chunks: usize,
}

/// Outcome of a query-driven web ingestion batch.
///
/// A failed URL never aborts the batch; it is reported alongside the
/// successes.
#[derive(Debug, Default, Serialize)]
pub struct WebIngestReport {
    pub ingested: Vec<IngestReport>,
    pub failures: Vec<WebIngestFailure>,
}

#[derive(Debug, Serialize)]
pub struct WebIngestFailure {
    pub url: String,
    pub error: String,
}

/// End-to-end ingestion and question answering
pub struct RagPipeline {
    sanitizer: Sanitizer,
    chunking: ChunkingConfig,
    embedder: DimensionChecked,
    store: Arc<VectorStore>,
    generator: AnswerGenerator,
    searcher: WebSearcher,
    fetcher: WebFetcher,
}

impl RagPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sanitizer: Sanitizer,
        chunking: ChunkingConfig,
        embedder: DimensionChecked,
        store: Arc<VectorStore>,
        generator: AnswerGenerator,
        searcher: WebSearcher,
        fetcher: WebFetcher,
    ) -> Self {
        Self {
            sanitizer,
            chunking,
            embedder,
            store,
            generator,
            searcher,
            fetcher,
        }
    }

    pub fn store(&self) -> &Arc<VectorStore> {
        &self.store
    }

    /// Ingest an uploaded document: extract, sanitize, chunk, embed, store.
    ///
    /// A document that extracts to nothing is an error; silently indexing
    /// zero chunks would make the upload look successful.
    pub async fn ingest_document(
        &self,
        source_label: &str,
        data: &[u8],
        format: DocumentFormat,
    ) -> Result<IngestReport> {
        let text = extract(data, format, source_label)?;
        self.ingest_text(source_label, &text).await
    }

    /// Fetch a URL and ingest its readable text
    pub async fn ingest_url(&self, url: &str) -> Result<IngestReport> {
        let text = self.fetcher.fetch_text(url).await?;
        self.ingest_text(url, &text).await
    }

    /// Search the web for `query` and ingest each result page.
    ///
    /// Per-URL failures are collected, not propagated; only a failing
    /// search itself is an error.
    pub async fn ingest_from_query(&self, query: &str) -> Result<WebIngestReport> {
        let urls = self.searcher.search(query).await?;
        let mut report = WebIngestReport::default();
        for url in urls {
            match self.ingest_url(&url).await {
                Ok(ingested) => report.ingested.push(ingested),
                Err(e) => {
                    warn!(url, error = %e, "skipping failed web source");
                    report.failures.push(WebIngestFailure {
                        url,
                        error: e.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    /// Sanitize, chunk, embed, and store one source's text
    async fn ingest_text(&self, source_label: &str, text: &str) -> Result<IngestReport> {
        let sanitized = self.sanitizer.sanitize(text);
        if sanitized.trim().is_empty() {
            return Err(Error::extraction(source_label, "document yielded no text"));
        }

        let pieces = chunk_text(
            &sanitized,
            self.chunking.chunk_size,
            self.chunking.chunk_overlap,
        )?;
        let chunks: Vec<Chunk> = pieces
            .into_iter()
            .enumerate()
            .map(|(i, piece)| Chunk::new(source_label, i as u32, piece))
            .collect();

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let store = Arc::clone(&self.store);
        let count = chunks.len();
        let stored_chunks = chunks;
        tokio::task::spawn_blocking(move || store.add(&stored_chunks, &embeddings))
            .await
            .map_err(|e| Error::internal(format!("store task failed: {e}")))??;

        info!(source = source_label, chunks = count, "ingested source");
        Ok(IngestReport {
            source: source_label.to_string(),
            chunks: count,
        })
    }

    /// Answer a question for a session.
    ///
    /// With an active uploaded document the question is answered against
    /// that document's full text, bypassing retrieval. Otherwise the
    /// sanitized question is embedded and the top chunks become context.
    /// An empty store or an empty result set short-circuits to a fixed
    /// reply without touching the embedding or inference backends.
    pub async fn answer(&self, session: &mut SessionState, query: &str) -> Result<String> {
        let clean_query = self.sanitizer.sanitize(query);

        let context = if let Some(doc) = session.active_document() {
            Some(self.sanitizer.sanitize(&doc.text))
        } else {
            self.retrieve_context(&clean_query).await?
        };

        let Some(context) = context else {
            session.record_turn(&clean_query, NO_RELEVANT_CONTENT);
            return Ok(NO_RELEVANT_CONTENT.to_string());
        };

        let prompt = PromptBuilder::build_qa_prompt(&clean_query, &context);
        let response = self.generator.generate(&prompt, session.history()).await;
        session.record_turn(&clean_query, &response);
        Ok(response)
    }

    /// Retrieve context for a query, or `None` when nothing relevant exists
    async fn retrieve_context(&self, query: &str) -> Result<Option<String>> {
        let store = Arc::clone(&self.store);
        let empty = tokio::task::spawn_blocking(move || store.is_empty())
            .await
            .map_err(|e| Error::internal(format!("store task failed: {e}")))??;
        if empty {
            return Ok(None);
        }

        let query_vector = self.embedder.embed(query).await?;
        let store = Arc::clone(&self.store);
        let results = tokio::task::spawn_blocking(move || store.query(&query_vector, TOP_K))
            .await
            .map_err(|e| Error::internal(format!("store task failed: {e}")))??;

        if results.is_empty() {
            return Ok(None);
        }
        Ok(Some(PromptBuilder::build_context(&results)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SanitizerConfig, WebConfig};
    use crate::providers::{ChatMessage, EmbeddingProvider, LlmProvider};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic embedder: one-hot on text length modulo dimensions.
    struct StubEmbedder {
        dims: usize,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut v = vec![0.0; self.dims];
            v[text.chars().count() % self.dims] = 1.0;
            Ok(v)
        }
    }

    struct StubLlm {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl LlmProvider for StubLlm {
        async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let prompt = &messages.last().unwrap().content;
            Ok(format!("answered: {}", prompt.chars().take(30).collect::<String>()))
        }
    }

    struct TestPipeline {
        pipeline: RagPipeline,
        embed_calls: Arc<AtomicUsize>,
        llm_calls: Arc<AtomicUsize>,
    }

    fn pipeline_with(blocklist: &[&str]) -> TestPipeline {
        let embed_calls = Arc::new(AtomicUsize::new(0));
        let llm_calls = Arc::new(AtomicUsize::new(0));
        let dims = 8;

        let sanitizer = Sanitizer::new(&SanitizerConfig {
            blocklist: blocklist.iter().map(|t| t.to_string()).collect(),
        })
        .unwrap();
        let embedder = DimensionChecked::new(
            Arc::new(StubEmbedder {
                dims,
                calls: Arc::clone(&embed_calls),
            }),
            dims,
        );
        let store = Arc::new(VectorStore::open_in_memory("test", dims).unwrap());
        let generator = AnswerGenerator::new(Arc::new(StubLlm {
            calls: Arc::clone(&llm_calls),
        }));
        let web = WebConfig::default();

        TestPipeline {
            pipeline: RagPipeline::new(
                sanitizer,
                ChunkingConfig {
                    chunk_size: 40,
                    chunk_overlap: 8,
                },
                embedder,
                store,
                generator,
                WebSearcher::new(&web),
                WebFetcher::new(&web),
            ),
            embed_calls,
            llm_calls,
        }
    }

    #[tokio::test]
    async fn ingest_stores_sanitized_chunks() {
        let t = pipeline_with(&["secret"]);
        let report = t
            .pipeline
            .ingest_document(
                "notes.txt",
                b"the secret plan is hidden in the secret annex of this text",
                DocumentFormat::Text,
            )
            .await
            .unwrap();

        assert_eq!(report.source, "notes.txt");
        assert!(report.chunks >= 1);
        let texts = t.pipeline.store().all_texts().unwrap();
        let joined = texts.join(" ");
        assert!(!joined.contains("secret"));
        assert!(joined.contains("****"));
    }

    #[tokio::test]
    async fn ingest_rejects_empty_document() {
        let t = pipeline_with(&[]);
        let err = t
            .pipeline
            .ingest_document("empty.txt", b"   \n  ", DocumentFormat::Text)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
        assert!(t.pipeline.store().is_empty().unwrap());
    }

    #[tokio::test]
    async fn reingesting_a_source_does_not_duplicate() {
        let t = pipeline_with(&[]);
        let data = b"some document body that is long enough to produce a few chunks here";
        t.pipeline
            .ingest_document("doc.txt", data, DocumentFormat::Text)
            .await
            .unwrap();
        let count = t.pipeline.store().len().unwrap();
        t.pipeline
            .ingest_document("doc.txt", data, DocumentFormat::Text)
            .await
            .unwrap();
        assert_eq!(t.pipeline.store().len().unwrap(), count);
    }

    #[tokio::test]
    async fn empty_store_short_circuits_without_backend_calls() {
        let t = pipeline_with(&[]);
        let mut session = SessionState::new();
        let answer = t.pipeline.answer(&mut session, "anything?").await.unwrap();

        assert_eq!(answer, NO_RELEVANT_CONTENT);
        assert_eq!(t.embed_calls.load(Ordering::SeqCst), 0);
        assert_eq!(t.llm_calls.load(Ordering::SeqCst), 0);
        // The non-answer still lands in history.
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test]
    async fn answers_from_retrieved_context() {
        let t = pipeline_with(&[]);
        t.pipeline
            .ingest_document(
                "facts.txt",
                b"the capital of atlantis is poseidonia",
                DocumentFormat::Text,
            )
            .await
            .unwrap();

        let mut session = SessionState::new();
        let answer = t
            .pipeline
            .answer(&mut session, "what is the capital?")
            .await
            .unwrap();

        assert!(answer.starts_with("answered:"));
        assert_eq!(t.llm_calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.history()[0].response, answer);
    }

    #[tokio::test]
    async fn query_is_sanitized_before_embedding() {
        let t = pipeline_with(&["badword"]);
        t.pipeline
            .ingest_document("doc.txt", b"harmless content", DocumentFormat::Text)
            .await
            .unwrap();

        let mut session = SessionState::new();
        t.pipeline
            .answer(&mut session, "tell me about badword")
            .await
            .unwrap();
        assert_eq!(session.history()[0].query, "tell me about ****");
    }

    #[tokio::test]
    async fn active_document_bypasses_retrieval() {
        let t = pipeline_with(&[]);
        // Store stays empty; only the active document feeds the prompt.
        let mut session = SessionState::new();
        session
            .set_active_document("upload.txt", b"active document body", DocumentFormat::Text)
            .unwrap();

        let answer = t.pipeline.answer(&mut session, "summarize").await.unwrap();
        assert!(answer.starts_with("answered:"));
        assert_eq!(t.embed_calls.load(Ordering::SeqCst), 0);
        assert_eq!(t.llm_calls.load(Ordering::SeqCst), 1);
    }
}
