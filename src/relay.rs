//! Client-side calls to the upload and transcribe relay endpoints.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::info;

use crate::audio::AudioBuffer;
use crate::error::{Result, VoiceError};

/// The two-hop relay as seen from the client: upload a finished buffer for a
/// scratch path, then exchange the path for a transcript. Stages run strictly
/// in sequence and nothing is retried.
#[async_trait::async_trait]
pub trait RelayClient: Send + Sync {
    /// Upload a validated buffer; returns the scratch path naming it.
    async fn upload(&self, buffer: &AudioBuffer) -> Result<String>;

    /// Exchange a scratch path for transcript text.
    async fn transcribe(&self, path: &str) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    path: String,
}

#[derive(Debug, Deserialize)]
struct TranscribeResponse {
    text: String,
}

/// HTTP implementation against the relay server.
pub struct HttpRelay {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRelay {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| VoiceError::UploadFailed(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

#[async_trait::async_trait]
impl RelayClient for HttpRelay {
    async fn upload(&self, buffer: &AudioBuffer) -> Result<String> {
        let part = Part::bytes(buffer.bytes.clone())
            .file_name("audio.wav")
            .mime_str(&buffer.mime_type)
            .map_err(|e| VoiceError::UploadFailed(e.to_string()))?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/api/upload", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| VoiceError::UploadFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(VoiceError::UploadFailed(format!(
                "upload returned {}",
                response.status()
            )));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| VoiceError::UploadFailed(e.to_string()))?;

        info!("Uploaded {} bytes to {}", buffer.len(), body.path);
        Ok(body.path)
    }

    async fn transcribe(&self, path: &str) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/api/transcribe", self.base_url))
            .json(&serde_json::json!({ "path": path }))
            .send()
            .await
            .map_err(|e| VoiceError::TranscriptionFailed(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(VoiceError::NotFound);
        }
        if !response.status().is_success() {
            return Err(VoiceError::TranscriptionFailed(format!(
                "transcribe returned {}",
                response.status()
            )));
        }

        let body: TranscribeResponse = response
            .json()
            .await
            .map_err(|e| VoiceError::TranscriptionFailed(e.to_string()))?;

        if body.text.is_empty() {
            return Err(VoiceError::TranscriptionFailed(
                "empty transcript".to_string(),
            ));
        }

        Ok(body.text)
    }
}
