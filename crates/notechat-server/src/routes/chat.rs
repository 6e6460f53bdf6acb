//! Chat routes: ask, detail level, and the chat archive.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::{require_session, ApiResult};
use crate::state::AppState;
use notechat_chat::Verbosity;
use notechat_core::Error;
use notechat_runtime::NO_DOCUMENT_REPLY;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat", get(get_chat).post(ask))
        .route("/chat/detail", put(set_detail))
        .route("/chats", get(list_chats))
        .route("/chats/new", post(new_chat))
        .route("/chats/{label}/open", post(open_chat))
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct DetailRequest {
    pub level: Verbosity,
}

/// GET /api/chat: the live transcript.
async fn get_chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let session = require_session(&state, &headers)?;
    let session = session.lock();
    Ok(Json(json!({
        "user": session.user(),
        "since": session.created_at(),
        "messages": session.conversation(),
        "currentChat": session.current_chat(),
        "detail": session.verbosity(),
        "document": session.document_summary(),
    })))
}

/// POST /api/chat: answer a question about the active document.
async fn ask(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<AskRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let session = require_session(&state, &headers)?;
    let question = req.message.trim().to_string();
    if question.is_empty() {
        return Err(Error::InvalidInput("Message cannot be empty".into()).into());
    }

    let (index, fingerprint, verbosity) = {
        let mut session = session.lock();
        let active = session
            .document()
            .map(|doc| (doc.index.clone(), doc.fingerprint.clone()));
        match active {
            Some((index, fingerprint)) => (index, fingerprint, session.verbosity()),
            None => {
                session.record_exchange(&question, NO_DOCUMENT_REPLY);
                return Ok(Json(json!({
                    "answer": NO_DOCUMENT_REPLY,
                    "sources": [],
                    "recorded": true,
                })));
            }
        }
    };

    debug!("Answering with {} chunks indexed ({:?})", index.len(), verbosity);
    let result = state
        .orchestrator
        .answer(index, &question, verbosity)
        .await?;

    let recorded = session
        .lock()
        .record_answer_for(&fingerprint, &question, &result.answer.text);

    Ok(Json(json!({
        "answer": result.answer.text,
        "fallback": result.answer.fallback,
        "sources": result.sources,
        "detail": verbosity,
        "recorded": recorded,
    })))
}

/// PUT /api/chat/detail: switch between concise and detailed answers.
async fn set_detail(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<DetailRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let session = require_session(&state, &headers)?;
    session.lock().set_verbosity(req.level);
    Ok(Json(json!({ "detail": req.level })))
}

/// GET /api/chats: archived chat labels, oldest first.
async fn list_chats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let session = require_session(&state, &headers)?;
    let session = session.lock();
    Ok(Json(json!({
        "chats": session.archive_labels(),
        "currentChat": session.current_chat(),
    })))
}

/// POST /api/chats/new: archive the live conversation and start over.
async fn new_chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let session = require_session(&state, &headers)?;
    let mut session = session.lock();
    let archived = session.new_chat();
    if let Some(label) = &archived {
        info!("{} archived as {}", session.user(), label);
    }
    Ok(Json(json!({
        "archived": archived,
        "chats": session.archive_labels(),
    })))
}

/// POST /api/chats/{label}/open: restore an archived conversation.
async fn open_chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(label): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let session = require_session(&state, &headers)?;
    let mut session = session.lock();
    let messages = serde_json::to_value(session.open_chat(&label)?).map_err(Error::from)?;
    Ok(Json(json!({
        "currentChat": label,
        "messages": messages,
    })))
}
