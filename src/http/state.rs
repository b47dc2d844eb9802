use std::sync::Arc;

use crate::analysis::IncidentAnalyzer;
use crate::scratch::ScratchStore;
use crate::stt::SpeechToText;

/// Server-side upload ceilings, re-checked here because the client is
/// untrusted. Membership is exact: these are the types the relay's external
/// interface names.
#[derive(Debug, Clone)]
pub struct RelayLimits {
    pub max_upload_bytes: u64,
    pub allowed_types: Vec<String>,
}

impl Default for RelayLimits {
    fn default() -> Self {
        Self {
            max_upload_bytes: 10 * 1024 * 1024,
            allowed_types: vec![
                "audio/webm".to_string(),
                "audio/wav".to_string(),
                "audio/mp3".to_string(),
            ],
        }
    }
}

/// Shared application state for HTTP handlers. Handlers share nothing in
/// memory beyond this; cross-request coordination goes through the scratch
/// store.
#[derive(Clone)]
pub struct AppState {
    pub scratch: Arc<ScratchStore>,
    pub stt: Arc<dyn SpeechToText>,
    pub analyzer: Arc<dyn IncidentAnalyzer>,
    pub limits: Arc<RelayLimits>,
}
