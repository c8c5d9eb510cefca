//! Query and session endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::ChatTurn;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    /// Omitted on the first request; the response returns the id to reuse
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub session_id: String,
}

/// POST /api/query - answer a question against the knowledge base
pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    let session_id = request
        .session_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let session = state.session(&session_id);
    let mut session = session.lock().await;
    let answer = state.pipeline().answer(&mut session, &request.query).await?;

    Ok(Json(QueryResponse { answer, session_id }))
}

#[derive(Debug, Serialize)]
pub struct CorpusResponse {
    pub texts: Vec<String>,
}

/// GET /api/corpus - all indexed chunk texts, for word clouds and debugging
pub async fn corpus(State(state): State<AppState>) -> Result<Json<CorpusResponse>> {
    let texts = state.pipeline().store().all_texts()?;
    Ok(Json(CorpusResponse { texts }))
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub history: Vec<ChatTurn>,
}

/// GET /api/sessions/:id/history
pub async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HistoryResponse>> {
    let history = match state.existing_session(&id) {
        Some(session) => session.lock().await.history().to_vec(),
        None => Vec::new(),
    };
    Ok(Json(HistoryResponse {
        session_id: id,
        history,
    }))
}

/// DELETE /api/sessions/:id/history
pub async fn clear_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> StatusCode {
    if let Some(session) = state.existing_session(&id) {
        session.lock().await.clear_history();
    }
    StatusCode::NO_CONTENT
}
