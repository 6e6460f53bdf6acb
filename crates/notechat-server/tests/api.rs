//! End-to-end API tests: drive the router in memory with fake backends.
//!
//! The fake embedder counts a handful of keywords, so retrieval is
//! predictable without a network. The fake completer records every prompt.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tower::ServiceExt;

use notechat_chat::{CompletionBackend, Generation};
use notechat_core::{Error, NoteChatConfig, Result};
use notechat_infer::{EmbedMode, EmbedderBackend};
use notechat_runtime::{Orchestrator, NO_DOCUMENT_REPLY};
use notechat_server::routes::SESSION_HEADER;
use notechat_server::{build_router, AppState};

const VOCAB: [&str; 4] = ["alpha", "bravo", "charlie", "delta"];

/// Uploads containing this word make the embedding service fail.
const POISON: &str = "explode";

struct KeywordEmbedder;

#[async_trait]
impl EmbedderBackend for KeywordEmbedder {
    async fn embed(&self, texts: &[String], _mode: EmbedMode) -> Result<Vec<Vec<f32>>> {
        if texts.iter().any(|t| t.to_lowercase().contains(POISON)) {
            return Err(Error::EmbeddingService("API error 429: rate limited".into()));
        }
        Ok(texts
            .iter()
            .map(|t| {
                let lower = t.to_lowercase();
                let mut v: Vec<f32> = VOCAB.iter().map(|w| lower.matches(w).count() as f32).collect();
                v.push(0.1);
                v
            })
            .collect())
    }

    fn model(&self) -> &str {
        "keyword"
    }
}

#[derive(Default)]
struct RecordingCompleter {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl CompletionBackend for RecordingCompleter {
    async fn generate(&self, prompt: &str) -> Result<Generation> {
        self.prompts.lock().push(prompt.to_string());
        Ok(Generation {
            text: Some("Setup is described in section bravo.".into()),
        })
    }

    fn model(&self) -> &str {
        "recording"
    }
}

struct TestApp {
    router: Router,
    completer: Arc<RecordingCompleter>,
}

fn test_app() -> TestApp {
    test_app_with_session_ttl(None)
}

fn test_app_with_session_ttl(ttl: Option<Duration>) -> TestApp {
    let mut config = NoteChatConfig::from_lookup(|key| match key {
        "COHERE_API_KEY" => Some("test-key".to_string()),
        "NOTECHAT_CHUNK_SIZE" => Some("40".to_string()),
        "NOTECHAT_CHUNK_OVERLAP" => Some("10".to_string()),
        "NOTECHAT_TOP_K" => Some("2".to_string()),
        _ => None,
    })
    .unwrap();
    if let Some(ttl) = ttl {
        config.session_ttl = ttl;
    }
    let completer = Arc::new(RecordingCompleter::default());
    let orchestrator = Orchestrator::new(
        Arc::new(KeywordEmbedder),
        completer.clone(),
        config.retrieval,
        config.timeouts,
    );
    let state = Arc::new(AppState::new(config, orchestrator));
    TestApp {
        router: build_router(state),
        completer,
    }
}

const NOTES: &str = "Section alpha covers the intro.\n\nSection bravo covers setup.\n\nSection charlie covers deployment.\n\nSection delta covers monitoring.";

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn json_request(method: Method, uri: &str, session: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(id) = session {
        builder = builder.header(SESSION_HEADER, id);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, session: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(SESSION_HEADER, session)
        .body(Body::empty())
        .unwrap()
}

fn post_empty(uri: &str, session: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(SESSION_HEADER, session)
        .body(Body::empty())
        .unwrap()
}

fn upload(session: &str, filename: &str, content: &[u8]) -> Request<Body> {
    let boundary = "notechat-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/api/documents")
        .header(SESSION_HEADER, session)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn login(app: &Router) -> String {
    let (status, body) = send(
        app,
        json_request(
            Method::POST,
            "/api/session/login",
            None,
            json!({ "email": "ann@example.com", "password": "secret" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["sessionId"].as_str().unwrap().to_string()
}

async fn ask(app: &Router, session: &str, message: &str) -> (StatusCode, Value) {
    send(
        app,
        json_request(Method::POST, "/api/chat", Some(session), json!({ "message": message })),
    )
    .await
}

#[tokio::test]
async fn test_login_requires_all_fields() {
    let app = test_app();
    let (status, body) = send(
        &app.router,
        json_request(
            Method::POST,
            "/api/session/login",
            None,
            json!({ "email": "ann@example.com", "password": "" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please fill all fields");
}

#[tokio::test]
async fn test_signup_password_mismatch() {
    let app = test_app();
    let (status, body) = send(
        &app.router,
        json_request(
            Method::POST,
            "/api/session/signup",
            None,
            json!({ "email": "ann@example.com", "password": "a", "confirm": "b" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Passwords do not match");
}

#[tokio::test]
async fn test_chat_requires_session() {
    let app = test_app();
    let (status, body) = send(&app.router, get("/api/chat", "no-such-session")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_ask_before_upload_is_recorded() {
    let app = test_app();
    let session = login(&app.router).await;

    let (status, body) = ask(&app.router, &session, "What is this about?").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], NO_DOCUMENT_REPLY);

    let (_, chat) = send(&app.router, get("/api/chat", &session)).await;
    let messages = chat["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[1]["content"], NO_DOCUMENT_REPLY);
    assert!(app.completer.prompts.lock().is_empty());
}

#[tokio::test]
async fn test_upload_and_ask() {
    let app = test_app();
    let session = login(&app.router).await;

    let (status, body) = send(&app.router, upload(&session, "notes.txt", NOTES.as_bytes())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["document"]["name"], "notes.txt");
    assert_eq!(body["document"]["type"], "txt");
    assert_eq!(body["document"]["chunks"], 4);

    let (status, body) = ask(&app.router, &session, "What does bravo cover?").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "Setup is described in section bravo.");
    assert_eq!(body["recorded"], true);
    let sources = body["sources"].as_array().unwrap();
    assert!(!sources.is_empty() && sources.len() <= 2);
    assert!(sources[0]["excerpt"].as_str().unwrap().contains("bravo"));

    let prompts = app.completer.prompts.lock();
    assert!(prompts[0].contains("Section bravo covers setup."));
    assert!(prompts[0].ends_with("focusing on the key points."));
}

#[tokio::test]
async fn test_unsupported_upload_leaves_session_untouched() {
    let app = test_app();
    let session = login(&app.router).await;
    send(&app.router, upload(&session, "notes.txt", NOTES.as_bytes())).await;
    ask(&app.router, &session, "alpha?").await;

    let (status, body) = send(&app.router, upload(&session, "tool.exe", b"MZ\x90\x00")).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error"], "Unsupported file type: exe");

    let (_, chat) = send(&app.router, get("/api/chat", &session)).await;
    assert_eq!(chat["document"]["name"], "notes.txt");
    assert_eq!(chat["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_embedding_keeps_previous_index() {
    let app = test_app();
    let session = login(&app.router).await;
    send(&app.router, upload(&session, "notes.txt", NOTES.as_bytes())).await;
    ask(&app.router, &session, "charlie?").await;

    let (status, body) = send(
        &app.router,
        upload(&session, "other.txt", b"This file will explode the embedder."),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(!body["error"].as_str().unwrap().contains("429"));

    let (_, chat) = send(&app.router, get("/api/chat", &session)).await;
    assert_eq!(chat["document"]["name"], "notes.txt");
    assert_eq!(chat["messages"].as_array().unwrap().len(), 2);

    let (status, _) = ask(&app.router, &session, "delta?").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_empty_document_is_rejected() {
    let app = test_app();
    let session = login(&app.router).await;
    let (status, _) = send(&app.router, upload(&session, "blank.txt", b"  \n\n ")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_reupload_same_document_keeps_conversation() {
    let app = test_app();
    let session = login(&app.router).await;
    send(&app.router, upload(&session, "notes.txt", NOTES.as_bytes())).await;
    ask(&app.router, &session, "bravo?").await;

    let (status, body) = send(&app.router, upload(&session, "notes.txt", NOTES.as_bytes())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unchanged"], true);

    let (_, chat) = send(&app.router, get("/api/chat", &session)).await;
    assert_eq!(chat["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_new_upload_clears_conversation() {
    let app = test_app();
    let session = login(&app.router).await;
    send(&app.router, upload(&session, "notes.txt", NOTES.as_bytes())).await;
    ask(&app.router, &session, "bravo?").await;

    let (status, _) = send(
        &app.router,
        upload(&session, "more.txt", b"Section delta is about alerts."),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, chat) = send(&app.router, get("/api/chat", &session)).await;
    assert_eq!(chat["document"]["name"], "more.txt");
    assert!(chat["messages"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_new_chat_and_open_chat() {
    let app = test_app();
    let session = login(&app.router).await;
    send(&app.router, upload(&session, "notes.txt", NOTES.as_bytes())).await;
    ask(&app.router, &session, "alpha?").await;

    let (status, body) = send(&app.router, post_empty("/api/chats/new", &session)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["archived"], "Chat 1");
    assert_eq!(body["chats"], json!(["Chat 1"]));

    let (_, chat) = send(&app.router, get("/api/chat", &session)).await;
    assert!(chat["messages"].as_array().unwrap().is_empty());
    assert!(chat["document"].is_null());

    let (status, body) = send(&app.router, post_empty("/api/chats/Chat%201/open", &session)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currentChat"], "Chat 1");
    assert_eq!(body["messages"].as_array().unwrap().len(), 2);
    assert_eq!(body["messages"][0]["content"], "alpha?");

    let (status, _) = send(&app.router, post_empty("/api/chats/Chat%209/open", &session)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_detail_level_changes_prompt_suffix() {
    let app = test_app();
    let session = login(&app.router).await;
    send(&app.router, upload(&session, "notes.txt", NOTES.as_bytes())).await;

    let (status, body) = send(
        &app.router,
        json_request(
            Method::PUT,
            "/api/chat/detail",
            Some(&session),
            json!({ "level": "detailed" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "detailed");

    let (_, body) = ask(&app.router, &session, "bravo?").await;
    assert_eq!(body["detail"], "detailed");
    let prompts = app.completer.prompts.lock();
    assert!(prompts[0].contains("MANDATORY SECTIONS"));
    assert!(!prompts[0].ends_with("focusing on the key points."));
}

#[tokio::test]
async fn test_logout_drops_session() {
    let app = test_app();
    let session = login(&app.router).await;

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/api/session")
        .header(SESSION_HEADER, &session)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app.router, get("/api/chat", &session)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_idle_session_expires() {
    let app = test_app_with_session_ttl(Some(Duration::from_millis(50)));
    let session = login(&app.router).await;

    let (status, _) = send(&app.router, get("/api/chat", &session)).await;
    assert_eq!(status, StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(120)).await;
    let (status, body) = send(&app.router, get("/api/chat", &session)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Please log in first");
}

#[tokio::test]
async fn test_status_reports_models() {
    let app = test_app();
    let session = login(&app.router).await;
    send(&app.router, upload(&session, "notes.txt", NOTES.as_bytes())).await;

    let (status, body) = send(&app.router, get("/api/status", &session)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["embedModel"], "keyword");
    assert_eq!(body["generateModel"], "recording");
    assert_eq!(body["topK"], 2);
    assert_eq!(body["document"]["chunks"], 4);
    assert_eq!(body["queryCache"]["entries"], 0);
}
