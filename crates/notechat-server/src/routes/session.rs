//! Login, signup and logout.
//!
//! Any non-empty credentials are accepted; the email becomes the session's
//! user label.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, post};
use axum::{Json, Router};
use serde_json::json;

use super::{session_id, ApiError, ApiResult};
use crate::state::AppState;
use notechat_runtime::{Credentials, SignupForm};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/session/login", post(login))
        .route("/session/signup", post(signup))
        .route("/session", delete(logout))
}

/// POST /api/session/login
async fn login(
    State(state): State<Arc<AppState>>,
    Json(form): Json<Credentials>,
) -> ApiResult<impl IntoResponse> {
    let user = form.validate()?;
    let id = state.open_session(user.clone());
    Ok((
        StatusCode::CREATED,
        Json(json!({ "sessionId": id, "user": user })),
    ))
}

/// POST /api/session/signup
async fn signup(
    State(state): State<Arc<AppState>>,
    Json(form): Json<SignupForm>,
) -> ApiResult<impl IntoResponse> {
    let user = form.validate()?;
    let id = state.open_session(user.clone());
    Ok((
        StatusCode::CREATED,
        Json(json!({ "sessionId": id, "user": user })),
    ))
}

/// DELETE /api/session
async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let id = session_id(&headers).ok_or_else(ApiError::unauthorized)?;
    if !state.close_session(id) {
        return Err(ApiError::unauthorized());
    }
    Ok(Json(json!({ "success": true })))
}
