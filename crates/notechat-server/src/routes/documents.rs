//! Document upload: one active document per session.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tracing::{debug, info};

use super::{require_session, ApiError, ApiResult};
use crate::state::AppState;
use notechat_ingest::{content_hash, FileType};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/documents", post(upload_document))
}

/// POST /api/documents: multipart upload, field `file`.
///
/// The previous document and transcript stay in place until the new index
/// is fully built; a failed upload changes nothing.
async fn upload_document(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResult<Json<serde_json::Value>> {
    let session = require_session(&state, &headers)?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, format!("Invalid upload: {}", e)))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        if field.name().is_some_and(|n| n != "file") {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, format!("Invalid upload: {}", e)))?;
        upload = Some((filename, bytes.to_vec()));
        break;
    }
    let (filename, bytes) =
        upload.ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "No file uploaded"))?;

    FileType::from_filename(&filename)?;
    debug!("Upload {} ({} bytes)", filename, bytes.len());

    let fingerprint = content_hash(&bytes);
    {
        let session = session.lock();
        if session.is_active_document(&fingerprint) {
            info!("Upload {} matches the active document, keeping index", filename);
            return Ok(Json(json!({
                "success": true,
                "unchanged": true,
                "document": session.document_summary(),
            })));
        }
    }

    let document = state.orchestrator.index_upload(&filename, bytes).await?;
    let summary = document.summary();
    session.lock().install_document(document);

    Ok(Json(json!({
        "success": true,
        "unchanged": false,
        "message": "Document processed successfully. You can now ask questions about it.",
        "document": summary,
    })))
}
