pub mod analysis;
pub mod audio;
pub mod config;
pub mod controller;
pub mod error;
pub mod http;
pub mod relay;
pub mod scratch;
pub mod session;
pub mod stt;

pub use audio::{
    AudioBuffer, AudioChunk, CaptureBackend, CaptureConstraints, CaptureDevice, CaptureEvent,
    MicrophoneBackend, UploadLimits,
};
pub use config::Config;
pub use controller::{
    Notice, NoticeSeverity, NotificationSink, RecordingState, VoiceInputController,
};
pub use error::VoiceError;
pub use http::{create_router, AppState, RelayLimits};
pub use relay::{HttpRelay, RelayClient};
pub use scratch::ScratchStore;
pub use session::{RecordingSession, SessionConfig, SessionEvent};
pub use stt::{SpeechToText, WhisperClient};
