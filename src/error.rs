//! Error types for the voice capture and transcription pipeline

use thiserror::Error;

/// Failures a recording cycle can surface, from microphone access through
/// the transcription relay. Display messages are user-facing.
#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Microphone access was denied")]
    PermissionDenied,

    #[error("No microphone found")]
    DeviceNotFound,

    #[error("No supported audio format found")]
    UnsupportedFormat,

    #[error("Audio recording is not supported on this host")]
    CaptureUnsupported,

    #[error("Recorder not initialized")]
    NotInitialized,

    #[error("No audio data available")]
    NoAudioData,

    #[error("Audio recording is empty. Please try again")]
    EmptyRecording,

    #[error("Audio file too large. Maximum size is {max_bytes} bytes")]
    FileTooLarge { max_bytes: u64 },

    #[error("Invalid audio format: {mime_type}")]
    InvalidFormat { mime_type: String },

    #[error("Failed to upload audio file: {0}")]
    UploadFailed(String),

    #[error("Failed to transcribe audio: {0}")]
    TranscriptionFailed(String),

    #[error("Audio file not found")]
    NotFound,

    #[error("Audio device error: {0}")]
    Device(String),
}

impl VoiceError {
    /// Whether this error came from the device/permission layer rather than
    /// validation or the network stage. Used to pick the notice category.
    pub fn is_device_error(&self) -> bool {
        matches!(
            self,
            VoiceError::PermissionDenied
                | VoiceError::DeviceNotFound
                | VoiceError::Device(_)
                | VoiceError::CaptureUnsupported
        )
    }
}

pub type Result<T> = std::result::Result<T, VoiceError>;
