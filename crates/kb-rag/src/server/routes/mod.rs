//! API routes for the knowledge-base server

pub mod ingest;
pub mod query;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Ingestion - with larger body limit for file uploads
        .route(
            "/documents",
            post(ingest::upload_documents).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/urls", post(ingest::ingest_urls))
        .route("/web-ingest", post(ingest::web_ingest))
        // Query
        .route("/query", post(query::query))
        // Corpus export (word cloud, diagnostics)
        .route("/corpus", get(query::corpus))
        // Session history
        .route("/sessions/:id/history", get(query::get_history))
        .route("/sessions/:id/history", delete(query::clear_history))
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "kb-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Knowledge-base Q&A over uploaded documents and web pages",
        "endpoints": {
            "POST /api/documents": "Upload documents (multipart)",
            "POST /api/urls": "Ingest a list of URLs",
            "POST /api/web-ingest": "Search the web and ingest the top results",
            "POST /api/query": "Ask a question against the knowledge base",
            "GET /api/corpus": "Export all indexed chunk texts",
            "GET /api/sessions/:id/history": "Get a session's chat history",
            "DELETE /api/sessions/:id/history": "Clear a session's chat history"
        }
    }))
}
