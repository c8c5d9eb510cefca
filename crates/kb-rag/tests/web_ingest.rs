//! Web search ingestion against a mocked search engine and target pages

use async_trait::async_trait;
use httpmock::prelude::*;
use std::sync::Arc;

use kb_rag::config::{ChunkingConfig, SanitizerConfig, WebConfig};
use kb_rag::generation::AnswerGenerator;
use kb_rag::pipeline::RagPipeline;
use kb_rag::providers::{ChatMessage, DimensionChecked, EmbeddingProvider, LlmProvider};
use kb_rag::sanitize::Sanitizer;
use kb_rag::storage::VectorStore;
use kb_rag::web::{WebFetcher, WebSearcher};
use kb_rag::Result;

const DIMS: usize = 4;

struct StubEmbedder;

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0; DIMS];
        v[text.len() % DIMS] = 1.0;
        Ok(v)
    }
}

struct StubLlm;

#[async_trait]
impl LlmProvider for StubLlm {
    async fn chat(&self, _messages: &[ChatMessage]) -> Result<String> {
        Ok("stub answer".to_string())
    }
}

fn pipeline(server: &MockServer) -> RagPipeline {
    let web = WebConfig {
        search_endpoint: format!("{}/search", server.base_url()),
        max_results: 3,
        timeout_secs: 5,
        user_agent: "test-agent".to_string(),
    };
    RagPipeline::new(
        Sanitizer::new(&SanitizerConfig::default()).unwrap(),
        ChunkingConfig {
            chunk_size: 100,
            chunk_overlap: 10,
        },
        DimensionChecked::new(Arc::new(StubEmbedder), DIMS),
        Arc::new(VectorStore::open_in_memory("web_test", DIMS).unwrap()),
        AnswerGenerator::new(Arc::new(StubLlm)),
        WebSearcher::new(&web),
        WebFetcher::new(&web),
    )
}

fn results_page(server: &MockServer) -> String {
    format!(
        r#"<html><body>
        <a class="result__a" href="{base}/pages/good">Good page</a>
        <a class="result__a" href="{base}/pages/missing">Missing page</a>
        </body></html>"#,
        base = server.base_url()
    )
}

#[tokio::test]
async fn partial_failure_ingests_the_healthy_page() {
    let server = MockServer::start();

    let page = results_page(&server);
    server.mock(|when, then| {
        when.method(GET).path("/search");
        then.status(200).body(&page);
    });
    server.mock(|when, then| {
        when.method(GET).path("/pages/good");
        then.status(200)
            .body("<html><body><p>Rust keeps memory safe without garbage collection.</p></body></html>");
    });
    server.mock(|when, then| {
        when.method(GET).path("/pages/missing");
        then.status(404).body("not found");
    });

    let pipeline = pipeline(&server);
    let report = pipeline.ingest_from_query("rust memory").await.unwrap();

    assert_eq!(report.ingested.len(), 1);
    assert!(report.ingested[0].source.ends_with("/pages/good"));
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].url.ends_with("/pages/missing"));
    assert!(report.failures[0].error.contains("404"));

    // Only the healthy page's chunks landed in the store.
    let texts = pipeline.store().all_texts().unwrap();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("memory safe"));
}

#[tokio::test]
async fn failed_search_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/search");
        then.status(500).body("search broke");
    });

    let pipeline = pipeline(&server);
    assert!(pipeline.ingest_from_query("anything").await.is_err());
}

#[tokio::test]
async fn direct_url_ingestion_reports_fetch_failures() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/pages/gone");
        then.status(410).body("gone");
    });

    let pipeline = pipeline(&server);
    let err = pipeline
        .ingest_url(&format!("{}/pages/gone", server.base_url()))
        .await
        .unwrap_err();
    assert!(matches!(err, kb_rag::Error::FetchFailed { .. }));
    assert!(pipeline.store().is_empty().unwrap());
}
