//! Ingestion endpoints

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::ingestion::extract::DocumentFormat;
use crate::pipeline::{IngestReport, WebIngestFailure, WebIngestReport};
use crate::server::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub documents: Vec<IngestReport>,
    pub errors: Vec<UploadError>,
}

#[derive(Debug, Serialize)]
pub struct UploadError {
    pub filename: String,
    pub error: String,
}

/// POST /api/documents - upload and index files.
///
/// An optional `session_id` text field makes the last successfully
/// extracted file the session's active document, so follow-up questions
/// are answered against it directly.
pub async fn upload_documents(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut documents = Vec::new();
    let mut errors = Vec::new();
    let mut session_id: Option<String> = None;
    let mut activate: Option<(String, Vec<u8>, DocumentFormat)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::internal(format!("failed to read multipart field: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "session_id" {
            let value = field
                .text()
                .await
                .map_err(|e| Error::internal(format!("failed to read session id: {e}")))?;
            if !value.trim().is_empty() {
                session_id = Some(value.trim().to_string());
            }
            continue;
        }

        let Some(filename) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };

        let data = match field.bytes().await {
            Ok(d) => d,
            Err(e) => {
                errors.push(UploadError {
                    filename,
                    error: format!("failed to read upload: {e}"),
                });
                continue;
            }
        };

        info!(filename, bytes = data.len(), "processing upload");

        let format = match DocumentFormat::from_filename(&filename) {
            Ok(f) => f,
            Err(e) => {
                errors.push(UploadError {
                    filename,
                    error: e.to_string(),
                });
                continue;
            }
        };

        match state
            .pipeline()
            .ingest_document(&filename, &data, format)
            .await
        {
            Ok(report) => {
                activate = Some((filename, data.to_vec(), format));
                documents.push(report);
            }
            Err(e) => errors.push(UploadError {
                filename,
                error: e.to_string(),
            }),
        }
    }

    if let (Some(id), Some((filename, data, format))) = (session_id, activate) {
        let session = state.session(&id);
        let mut session = session.lock().await;
        session.set_active_document(&filename, &data, format)?;
    }

    Ok(Json(UploadResponse { documents, errors }))
}

#[derive(Debug, Deserialize)]
pub struct UrlIngestRequest {
    pub urls: Vec<String>,
}

/// POST /api/urls - fetch and index a list of URLs.
///
/// Individual failures are reported per URL without aborting the batch.
pub async fn ingest_urls(
    State(state): State<AppState>,
    Json(request): Json<UrlIngestRequest>,
) -> Result<Json<WebIngestReport>> {
    let mut report = WebIngestReport::default();
    for url in request.urls {
        match state.pipeline().ingest_url(&url).await {
            Ok(ingested) => report.ingested.push(ingested),
            Err(e) => report.failures.push(WebIngestFailure {
                url,
                error: e.to_string(),
            }),
        }
    }
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct WebIngestRequest {
    pub query: String,
}

/// POST /api/web-ingest - search the web and index the top result pages
pub async fn web_ingest(
    State(state): State<AppState>,
    Json(request): Json<WebIngestRequest>,
) -> Result<Json<WebIngestReport>> {
    let report = state.pipeline().ingest_from_query(&request.query).await?;
    Ok(Json(report))
}
