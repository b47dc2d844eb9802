use super::state::AppState;
use crate::stt::mime_for_filename;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Scratch path naming the stored audio; consumed by /api/transcribe
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct TranscribeRequest {
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn client_error(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/upload
/// Accept one audio file and park it in the scratch store
pub async fn upload_audio(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    // An axum `Field` borrows the `Multipart`, so it cannot be stored across
    // later `next_field()` calls or used after the loop. Consume the matching
    // field's data inline, preserving the original validation order
    // (mime -> filename -> bytes -> size -> store).
    let mut file_data = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() == Some("file") {
                    let mime_type = field.content_type().unwrap_or_default().to_string();
                    if !state.limits.allowed_types.iter().any(|t| *t == mime_type) {
                        warn!("Rejecting upload with type {:?}", mime_type);
                        return client_error("Invalid file type");
                    }

                    let filename = field.file_name().unwrap_or("audio").to_string();

                    let bytes = match field.bytes().await {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            warn!("Failed to read upload body: {}", e);
                            return client_error("Failed to read file");
                        }
                    };

                    file_data = Some((filename, bytes));
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Rejecting malformed multipart body: {}", e);
                return client_error("Invalid multipart body");
            }
        }
    }

    let Some((filename, bytes)) = file_data else {
        return client_error("No file provided");
    };

    if bytes.len() as u64 > state.limits.max_upload_bytes {
        warn!(
            "Rejecting oversize upload: {} bytes > {} ceiling",
            bytes.len(),
            state.limits.max_upload_bytes
        );
        return client_error("File too large");
    }

    match state.scratch.store(&filename, &bytes).await {
        Ok(path) => (
            StatusCode::OK,
            Json(UploadResponse {
                path: path.display().to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to store upload: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to upload file".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// POST /api/transcribe
/// Exchange a scratch path for transcript text, consuming the file
pub async fn transcribe_audio(
    State(state): State<AppState>,
    Json(req): Json<TranscribeRequest>,
) -> Response {
    let Some(path) = req.path.filter(|p| !p.is_empty()) else {
        return client_error("No audio file path provided");
    };

    // Resolve before calling out: a missing file must not cost an API call.
    let resolved = match state.scratch.resolve(&path).await {
        Ok(resolved) => resolved,
        Err(_) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "Audio file not found".to_string(),
                }),
            )
                .into_response();
        }
    };

    let audio = match tokio::fs::read(&resolved).await {
        Ok(audio) => audio,
        Err(_) => {
            // Swept between resolution and read
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "Audio file not found".to_string(),
                }),
            )
                .into_response();
        }
    };

    let filename = resolved
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("audio")
        .to_string();
    let mime_type = mime_for_filename(&filename);

    match state.stt.transcribe(audio, &filename, mime_type).await {
        Ok(text) => {
            // Consume the handle now rather than waiting out the sweep. A
            // failed delete is logged only; the transcript is already in hand.
            match state.scratch.remove(&resolved).await {
                Ok(()) => info!("Cleaned up scratch file {:?}", resolved),
                Err(e) => warn!("Failed to clean up scratch file {:?}: {}", resolved, e),
            }

            (StatusCode::OK, Json(TranscribeResponse { text })).into_response()
        }
        Err(e) => {
            // Leave the file for the sweep.
            error!("Transcription failed for {:?}: {}", resolved, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to transcribe audio".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// POST /api/analyze
/// Classify an incident description via the language-model collaborator
pub async fn analyze_incident(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Response {
    match state.analyzer.analyze(&req.description).await {
        Ok(analysis) => (StatusCode::OK, Json(analysis)).into_response(),
        Err(e) => {
            error!("Incident analysis failed: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to analyze incident".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
