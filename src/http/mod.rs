//! HTTP relay bridging recorded audio to the speech-to-text service:
//! - POST /api/upload - park an audio file in the scratch store
//! - POST /api/transcribe - exchange a scratch path for transcript text
//! - POST /api/analyze - incident-analysis collaborator boundary
//! - GET /health - health check

pub mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::{AppState, RelayLimits};
