use std::time::Duration;

use anyhow::{bail, Result};
use serde::Deserialize;

use crate::audio::UploadLimits;
use crate::session::SessionConfig;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub scratch: ScratchConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    /// Upload size ceiling in bytes
    #[serde(default = "default_max_audio_bytes")]
    pub max_audio_bytes: u64,
    /// MIME types the upload endpoint accepts
    #[serde(default = "default_allowed_types")]
    pub allowed_audio_types: Vec<String>,
    /// Hard ceiling on one recording cycle, in milliseconds
    #[serde(default = "default_max_recording_ms")]
    pub max_recording_duration_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct ScratchConfig {
    #[serde(default = "default_scratch_path")]
    pub path: String,
    /// How long an unconsumed upload may live
    #[serde(default = "default_scratch_ttl_secs")]
    pub ttl_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct SpeechConfig {
    /// Speech service credential. Required: without it the transcription
    /// relay refuses to start.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_speech_model")]
    pub model: String,
    /// Fixed source language requested from the service
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_analysis_model")]
    pub model: String,
}

fn default_service_name() -> String {
    "voice-relay".to_string()
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_audio_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_allowed_types() -> Vec<String> {
    vec![
        "audio/webm".to_string(),
        "audio/wav".to_string(),
        "audio/mp3".to_string(),
    ]
}

fn default_max_recording_ms() -> u64 {
    60_000
}

fn default_scratch_path() -> String {
    std::env::temp_dir()
        .join("voice-relay")
        .display()
        .to_string()
}

fn default_scratch_ttl_secs() -> u64 {
    5 * 60
}

fn default_speech_model() -> String {
    "whisper-1".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_analysis_model() -> String {
    "gpt-4".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            max_audio_bytes: default_max_audio_bytes(),
            allowed_audio_types: default_allowed_types(),
            max_recording_duration_ms: default_max_recording_ms(),
        }
    }
}

impl Default for ScratchConfig {
    fn default() -> Self {
        Self {
            path: default_scratch_path(),
            ttl_secs: default_scratch_ttl_secs(),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_speech_model(),
            language: default_language(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model: default_analysis_model(),
        }
    }
}

impl Config {
    /// Load from a config file with `VOICE_RELAY__`-prefixed environment
    /// overrides layered on top (e.g. `VOICE_RELAY__SPEECH__API_KEY`).
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("VOICE_RELAY").separator("__"))
            .build()?;

        let cfg: Config = settings.try_deserialize()?;
        cfg.validate()?;

        Ok(cfg)
    }

    /// Session settings for the client half, sharing the configured ceiling.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            max_duration: Duration::from_millis(self.audio.max_recording_duration_ms),
            ..SessionConfig::default()
        }
    }

    /// Client-side validation limits. The MIME allow-list stays the client's
    /// prefix list; only the byte ceiling is shared with the server.
    pub fn upload_limits(&self) -> UploadLimits {
        UploadLimits {
            max_bytes: self.audio.max_audio_bytes,
            ..UploadLimits::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.speech.api_key.trim().is_empty() {
            bail!(
                "speech.api_key is not set; the transcription relay cannot start without a credential"
            );
        }
        if self.audio.max_audio_bytes == 0 {
            bail!("audio.max_audio_bytes must be positive");
        }
        if self.audio.max_recording_duration_ms == 0 {
            bail!("audio.max_recording_duration_ms must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_limits() {
        let audio = AudioConfig::default();
        assert_eq!(audio.max_audio_bytes, 10 * 1024 * 1024);
        assert_eq!(audio.max_recording_duration_ms, 60_000);
        assert_eq!(ScratchConfig::default().ttl_secs, 300);
    }

    #[test]
    fn a_missing_credential_refuses_to_validate() {
        let cfg = Config {
            service: ServiceConfig::default(),
            audio: AudioConfig::default(),
            scratch: ScratchConfig::default(),
            speech: SpeechConfig::default(),
            analysis: AnalysisConfig::default(),
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("credential"));
    }
}
