//! Whisper-style transcription client.

use std::time::Duration;

use anyhow::{bail, Result as AnyResult};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info};

use super::SpeechToText;
use crate::error::{Result, VoiceError};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/audio/transcriptions";

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

pub struct WhisperClient {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
    language: String,
}

impl WhisperClient {
    /// Fails when the credential is empty: a relay without a key must refuse
    /// to start rather than fail mid-flow.
    pub fn new(api_key: &str, model: &str, language: &str) -> AnyResult<Self> {
        if api_key.trim().is_empty() {
            bail!("speech service credential is missing; the transcription relay cannot start");
        }

        let http = Client::builder().timeout(Duration::from_secs(60)).build()?;

        Ok(Self {
            http,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            language: language.to_string(),
        })
    }

    /// Point the client at a different compatible service.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait::async_trait]
impl SpeechToText for WhisperClient {
    async fn transcribe(&self, audio: Vec<u8>, filename: &str, mime_type: &str) -> Result<String> {
        info!("Transcribing {} ({} bytes)", filename, audio.len());

        let part = Part::bytes(audio)
            .file_name(filename.to_string())
            .mime_str(mime_type)
            .map_err(|e| VoiceError::TranscriptionFailed(e.to_string()))?;

        let form = Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("language", self.language.clone())
            .text("response_format", "text");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| VoiceError::TranscriptionFailed(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let text = response
                .text()
                .await
                .map_err(|e| VoiceError::TranscriptionFailed(e.to_string()))?;
            let text = text.trim().to_string();

            info!("Transcription successful: {} chars", text.len());
            Ok(text)
        } else {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|r| r.error.message)
                .unwrap_or(body);

            error!("Speech service error ({}): {}", status.as_u16(), message);
            Err(VoiceError::TranscriptionFailed(format!(
                "{} ({})",
                message,
                status.as_u16()
            )))
        }
    }
}
