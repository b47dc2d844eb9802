//! External speech-to-text boundary: binary audio in, transcript text out.
//! Any compatible service can stand in for the shipped Whisper client.

mod whisper;

pub use whisper::WhisperClient;

use crate::error::Result;

#[async_trait::async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe one audio payload to plain text.
    async fn transcribe(&self, audio: Vec<u8>, filename: &str, mime_type: &str) -> Result<String>;
}

/// MIME type for a scratch filename, by extension. The relay stores audio as
/// opaque bytes, so the extension is the only format hint left server-side.
pub fn mime_for_filename(filename: &str) -> &'static str {
    match std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
    {
        Some("wav") => "audio/wav",
        Some("webm") => "audio/webm",
        Some("mp3") => "audio/mp3",
        Some("ogg") => "audio/ogg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_map_to_audio_mime_types() {
        assert_eq!(mime_for_filename("take.wav"), "audio/wav");
        assert_eq!(mime_for_filename("abc-audio.webm"), "audio/webm");
        assert_eq!(mime_for_filename("noext"), "application/octet-stream");
    }
}
