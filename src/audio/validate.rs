//! Pure validation of capture capability and finished audio buffers. No I/O;
//! the upload endpoint re-runs the size/type checks because the client is
//! untrusted.

use super::buffer::AudioBuffer;
use crate::error::{Result, VoiceError};

pub const DEFAULT_MAX_AUDIO_BYTES: u64 = 10 * 1024 * 1024;

/// MIME prefixes a finished buffer may carry.
pub const ALLOWED_MIME_PREFIXES: &[&str] =
    &["audio/webm", "audio/wav", "audio/mp3", "audio/ogg"];

/// Size and format ceilings applied to outbound buffers.
#[derive(Debug, Clone)]
pub struct UploadLimits {
    pub max_bytes: u64,
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_AUDIO_BYTES,
            allowed_mime_types: ALLOWED_MIME_PREFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl UploadLimits {
    pub fn allows_mime(&self, mime_type: &str) -> bool {
        self.allowed_mime_types
            .iter()
            .any(|allowed| mime_type.starts_with(allowed.as_str()))
    }
}

/// What the host process can do, as probed before a cycle starts.
#[derive(Debug, Clone)]
pub struct HostCapabilities {
    /// Whether any capture primitive exists at all
    pub capture_available: bool,
    /// The MIME type negotiation settled on, if any
    pub encodable_mime: Option<String>,
}

/// Outbound capability check, run before touching hardware.
pub fn check_capture_support(host: &HostCapabilities) -> Result<()> {
    if !host.capture_available {
        return Err(VoiceError::CaptureUnsupported);
    }
    if host.encodable_mime.is_none() {
        return Err(VoiceError::UnsupportedFormat);
    }
    Ok(())
}

/// Buffer check, run after a cycle finishes and before any network call.
///
/// Exactly one violation is reported: absence, emptiness, the size ceiling,
/// then the format allow-list, in that order.
pub fn check_buffer(buffer: Option<&AudioBuffer>, limits: &UploadLimits) -> Result<()> {
    let buffer = buffer.ok_or(VoiceError::NoAudioData)?;

    if buffer.is_empty() {
        return Err(VoiceError::EmptyRecording);
    }

    if buffer.len() as u64 > limits.max_bytes {
        return Err(VoiceError::FileTooLarge {
            max_bytes: limits.max_bytes,
        });
    }

    if !limits.allows_mime(&buffer.mime_type) {
        return Err(VoiceError::InvalidFormat {
            mime_type: buffer.mime_type.clone(),
        });
    }

    Ok(())
}
