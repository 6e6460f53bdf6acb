//! Service status.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};

use super::session_id;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/status", get(get_status))
}

/// GET /api/status: models, retrieval settings, and the caller's document
/// when a session header is present.
async fn get_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    let document = session_id(&headers)
        .and_then(|id| state.session(id))
        .and_then(|session| {
            let session = session.lock();
            session.document_summary()
        });
    let retrieval = state.orchestrator.retrieval();

    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "embedModel": state.orchestrator.embed_model(),
        "generateModel": state.orchestrator.generate_model(),
        "chunkSize": retrieval.chunk_size,
        "chunkOverlap": retrieval.chunk_overlap,
        "topK": retrieval.top_k,
        "maxUploadBytes": state.config.max_upload_bytes,
        "sessions": state.session_count(),
        "queryCache": state.orchestrator.query_cache_stats(),
        "document": document,
    }))
}
