//! Recording session management
//!
//! One `RecordingSession` wraps one capture device for the lifetime of a
//! controller: it accumulates encoded chunks, enforces the hard duration
//! ceiling, and assembles the finished buffer when the device stops.

mod config;
mod session;

pub use config::SessionConfig;
pub use session::{RecordingSession, SessionEvent};
