use std::sync::OnceLock;

use crate::error::{Result, VoiceError};

/// Ordered container/codec preferences, best first. The negotiator picks the
/// first one the process can actually encode.
pub const DEFAULT_MIME_PREFERENCES: &[&str] = &[
    "audio/webm;codecs=opus",
    "audio/webm",
    "audio/ogg;codecs=opus",
    "audio/wav",
];

/// Capability probe for the encoders available in this process.
pub trait EncoderSupport {
    fn can_encode(&self, mime_type: &str) -> bool;
}

/// The stock encoder set: hound gives us WAV/PCM and nothing else.
#[derive(Debug, Default)]
pub struct StockEncoders;

impl EncoderSupport for StockEncoders {
    fn can_encode(&self, mime_type: &str) -> bool {
        mime_type == "audio/wav"
    }
}

/// Pick the first preference the given encoder set can produce.
///
/// Deterministic and side-effect free; callers may invoke it any number of
/// times.
pub fn negotiate<'a>(preferences: &[&'a str], support: &dyn EncoderSupport) -> Result<&'a str> {
    preferences
        .iter()
        .copied()
        .find(|mime| support.can_encode(mime))
        .ok_or(VoiceError::UnsupportedFormat)
}

static NEGOTIATED: OnceLock<Option<&'static str>> = OnceLock::new();

/// The negotiated MIME type for this process, cached after the first call.
/// Encoder capability does not change during a run.
pub fn negotiated_mime() -> Result<&'static str> {
    NEGOTIATED
        .get_or_init(|| negotiate(DEFAULT_MIME_PREFERENCES, &StockEncoders).ok())
        .ok_or(VoiceError::UnsupportedFormat)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Everything;

    impl EncoderSupport for Everything {
        fn can_encode(&self, _mime_type: &str) -> bool {
            true
        }
    }

    struct Nothing;

    impl EncoderSupport for Nothing {
        fn can_encode(&self, _mime_type: &str) -> bool {
            false
        }
    }

    #[test]
    fn negotiate_returns_first_supported_preference() {
        let mime = negotiate(DEFAULT_MIME_PREFERENCES, &Everything).unwrap();
        assert_eq!(mime, "audio/webm;codecs=opus");
    }

    #[test]
    fn negotiate_skips_unsupported_entries() {
        let mime = negotiate(DEFAULT_MIME_PREFERENCES, &StockEncoders).unwrap();
        assert_eq!(mime, "audio/wav");
    }

    #[test]
    fn negotiate_fails_when_nothing_is_encodable() {
        let err = negotiate(DEFAULT_MIME_PREFERENCES, &Nothing).unwrap_err();
        assert!(matches!(err, VoiceError::UnsupportedFormat));
    }

    #[test]
    fn negotiated_mime_is_stable_across_calls() {
        let first = negotiated_mime().unwrap();
        let second = negotiated_mime().unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "audio/wav");
    }
}
