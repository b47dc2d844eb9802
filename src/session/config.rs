use std::time::Duration;

/// Configuration for a recording session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Hard ceiling on one recording cycle; expiry force-stops the device
    /// Default: 60 seconds
    pub max_duration: Duration,

    /// Preferred sample rate (the speech service expects 16kHz)
    pub sample_rate: u32,

    /// Preferred channel count (1 = mono)
    pub channels: u16,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_duration: Duration::from_secs(60),
            sample_rate: 16000, // Whisper expects 16kHz
            channels: 1,        // Mono
        }
    }
}
