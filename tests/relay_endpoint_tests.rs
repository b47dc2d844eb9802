// Integration tests for the relay endpoints, driven through the router with
// a stubbed speech-to-text service.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use voice_relay::analysis::IncidentAnalyzer;
use voice_relay::http::{create_router, AppState, RelayLimits};
use voice_relay::stt::SpeechToText;
use voice_relay::{ScratchStore, VoiceError};

const TTL: Duration = Duration::from_secs(300);

struct FixedStt {
    reply: Option<&'static str>,
}

#[async_trait::async_trait]
impl SpeechToText for FixedStt {
    async fn transcribe(
        &self,
        _audio: Vec<u8>,
        _filename: &str,
        _mime_type: &str,
    ) -> Result<String, VoiceError> {
        match self.reply {
            Some(text) => Ok(text.to_string()),
            None => Err(VoiceError::TranscriptionFailed("service down".to_string())),
        }
    }
}

struct FixedAnalyzer;

#[async_trait::async_trait]
impl IncidentAnalyzer for FixedAnalyzer {
    async fn analyze(&self, _description: &str) -> anyhow::Result<Value> {
        Ok(json!({
            "incident_type": "slip",
            "severity": "low",
            "risk_factors": ["wet floor"],
            "recommended_actions": ["place signage"],
        }))
    }
}

fn state_with(dir: &TempDir, stt: FixedStt, limits: RelayLimits) -> AppState {
    AppState {
        scratch: Arc::new(ScratchStore::new(dir.path(), TTL).unwrap()),
        stt: Arc::new(stt),
        analyzer: Arc::new(FixedAnalyzer),
        limits: Arc::new(limits),
    }
}

fn upload_request(mime: &str, payload: &[u8]) -> Request<Body> {
    let boundary = "x-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"audio.wav\"\r\nContent-Type: {mime}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn scratch_file_count(dir: &TempDir) -> usize {
    std::fs::read_dir(dir.path()).unwrap().count()
}

#[tokio::test]
async fn upload_stores_the_file_and_returns_its_scratch_path() {
    let dir = TempDir::new().unwrap();
    let state = state_with(&dir, FixedStt { reply: Some("hi") }, RelayLimits::default());
    let router = create_router(state);

    let response = router
        .oneshot(upload_request("audio/webm", b"opus bytes"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let path = body["path"].as_str().unwrap();
    assert!(path.starts_with(dir.path().to_str().unwrap()));
    assert_eq!(std::fs::read(path).unwrap(), b"opus bytes");
}

#[tokio::test]
async fn upload_without_a_file_field_is_rejected() {
    let dir = TempDir::new().unwrap();
    let state = state_with(&dir, FixedStt { reply: Some("hi") }, RelayLimits::default());
    let router = create_router(state);

    let boundary = "x-test-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nvalue\r\n--{boundary}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(scratch_file_count(&dir), 0);
}

#[tokio::test]
async fn upload_with_a_disallowed_type_is_rejected() {
    let dir = TempDir::new().unwrap();
    let state = state_with(&dir, FixedStt { reply: Some("hi") }, RelayLimits::default());
    let router = create_router(state);

    let response = router
        .oneshot(upload_request("audio/flac", b"flac bytes"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Invalid file type");
    assert_eq!(scratch_file_count(&dir), 0);
}

#[tokio::test]
async fn oversize_upload_is_rejected_with_no_scratch_file() {
    let dir = TempDir::new().unwrap();
    let state = state_with(&dir, FixedStt { reply: Some("hi") }, RelayLimits::default());
    let router = create_router(state);

    let payload = vec![0u8; 10 * 1024 * 1024 + 1];
    let response = router
        .oneshot(upload_request("audio/wav", &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"], "File too large");
    assert_eq!(scratch_file_count(&dir), 0);
}

#[tokio::test]
async fn transcribe_returns_text_and_consumes_the_scratch_file() {
    let dir = TempDir::new().unwrap();
    let state = state_with(
        &dir,
        FixedStt {
            reply: Some("the shelf collapsed near bay four"),
        },
        RelayLimits::default(),
    );
    let router = create_router(state.clone());

    let path = state.scratch.store("audio.webm", b"opus").await.unwrap();
    let path = path.display().to_string();

    let response = router
        .clone()
        .oneshot(json_request("/api/transcribe", json!({ "path": path })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["text"], "the shelf collapsed near bay four");
    assert_eq!(scratch_file_count(&dir), 0, "file should be consumed");

    // The handle is single-use: transcribing it again is NotFound
    let second = router
        .oneshot(json_request("/api/transcribe", json!({ "path": path })))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn transcribe_without_a_path_is_rejected() {
    let dir = TempDir::new().unwrap();
    let state = state_with(&dir, FixedStt { reply: Some("hi") }, RelayLimits::default());
    let router = create_router(state);

    let response = router
        .oneshot(json_request("/api/transcribe", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn transcribe_outside_the_scratch_root_is_not_found() {
    let dir = TempDir::new().unwrap();
    let state = state_with(&dir, FixedStt { reply: Some("hi") }, RelayLimits::default());
    let router = create_router(state);

    let response = router
        .oneshot(json_request(
            "/api/transcribe",
            json!({ "path": "/etc/passwd" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn transcription_failure_leaves_the_file_for_the_sweep() {
    let dir = TempDir::new().unwrap();
    let state = state_with(&dir, FixedStt { reply: None }, RelayLimits::default());
    let router = create_router(state.clone());

    let path = state.scratch.store("audio.wav", b"pcm").await.unwrap();

    let response = router
        .oneshot(json_request(
            "/api/transcribe",
            json!({ "path": path.display().to_string() }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(path.exists(), "failed transcription must not delete the file");
}

#[tokio::test]
async fn analyze_returns_the_collaborator_payload() {
    let dir = TempDir::new().unwrap();
    let state = state_with(&dir, FixedStt { reply: Some("hi") }, RelayLimits::default());
    let router = create_router(state);

    let response = router
        .oneshot(json_request(
            "/api/analyze",
            json!({ "description": "worker slipped on a wet floor" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["incident_type"], "slip");
    assert_eq!(body["severity"], "low");
}

#[tokio::test]
async fn health_check_responds_ok() {
    let dir = TempDir::new().unwrap();
    let state = state_with(&dir, FixedStt { reply: Some("hi") }, RelayLimits::default());
    let router = create_router(state);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
