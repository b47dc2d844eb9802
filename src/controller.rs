//! The client-facing facade over one recording pipeline: microphone capture,
//! validation, upload, transcription.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::audio::validate::{check_buffer, UploadLimits};
use crate::audio::AudioBuffer;
use crate::error::{Result, VoiceError};
use crate::relay::RelayClient;
use crate::session::{RecordingSession, SessionEvent};

/// Lifecycle of one recording cycle. Exactly one instance per controller;
/// error exits short-circuit straight back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Initializing,
    Recording,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeSeverity {
    Info,
    Alert,
}

/// A user-facing notice. Presentation is up to the sink.
#[derive(Debug, Clone)]
pub struct Notice {
    pub title: String,
    pub body: String,
    pub severity: NoticeSeverity,
}

impl Notice {
    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            severity: NoticeSeverity::Info,
        }
    }

    pub fn alert(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            severity: NoticeSeverity::Alert,
        }
    }
}

/// Single port through which every user-facing notice leaves the pipeline.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Drives RecordingSession -> validation -> upload -> transcription and hands
/// the transcript to the caller-supplied callback.
pub struct VoiceInputController {
    inner: Arc<Inner>,
}

struct Inner {
    session: RecordingSession,
    relay: Arc<dyn RelayClient>,
    notices: Arc<dyn NotificationSink>,
    on_transcript: Box<dyn Fn(String) + Send + Sync>,
    limits: UploadLimits,
    state: Mutex<RecordingState>,
}

impl VoiceInputController {
    pub fn new(
        session: RecordingSession,
        relay: Arc<dyn RelayClient>,
        notices: Arc<dyn NotificationSink>,
        on_transcript: impl Fn(String) + Send + Sync + 'static,
    ) -> Self {
        Self::with_limits(session, relay, notices, on_transcript, UploadLimits::default())
    }

    pub fn with_limits(
        session: RecordingSession,
        relay: Arc<dyn RelayClient>,
        notices: Arc<dyn NotificationSink>,
        on_transcript: impl Fn(String) + Send + Sync + 'static,
        limits: UploadLimits,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                session,
                relay,
                notices,
                on_transcript: Box::new(on_transcript),
                limits,
                state: Mutex::new(RecordingState::Idle),
            }),
        }
    }

    pub fn state(&self) -> RecordingState {
        *self.inner.state.lock().unwrap()
    }

    pub fn is_recording(&self) -> bool {
        matches!(
            self.state(),
            RecordingState::Initializing | RecordingState::Recording
        )
    }

    pub fn is_processing(&self) -> bool {
        self.state() == RecordingState::Processing
    }

    /// Begin a recording cycle. A no-op while a cycle is already recording or
    /// processing: no new hardware stream is acquired.
    ///
    /// Device, permission, and format failures surface here, already routed
    /// through the notification sink.
    pub async fn start_recording(&self) -> Result<()> {
        {
            let mut state = self.inner.state.lock().unwrap();
            if *state != RecordingState::Idle {
                return Ok(());
            }
            *state = RecordingState::Initializing;
        }

        let events = match self.inner.session.start().await {
            Ok(Some(events)) => events,
            Ok(None) => {
                // The device was already active; nothing new was started.
                self.inner.set_state(RecordingState::Idle);
                return Ok(());
            }
            Err(e) => {
                self.inner.notify_error(&e);
                self.inner.set_state(RecordingState::Idle);
                return Err(e);
            }
        };

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.run_cycle(events).await;
        });

        Ok(())
    }

    /// End the current cycle. Safe to call in any state: the deadline timer
    /// is cancelled and the hardware stream is released even when recording
    /// never actually started.
    pub async fn stop_recording(&self) {
        self.inner.session.stop().await;
    }
}

impl Inner {
    fn set_state(&self, next: RecordingState) {
        *self.state.lock().unwrap() = next;
    }

    async fn run_cycle(self: Arc<Self>, mut events: mpsc::Receiver<SessionEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::Started => {
                    self.set_state(RecordingState::Recording);
                    self.notices.notify(Notice::info(
                        "Recording started",
                        "Speak clearly into your microphone",
                    ));
                }
                SessionEvent::MaxDurationReached => {
                    self.notices.notify(Notice::info(
                        "Recording stopped",
                        format!(
                            "Maximum duration reached ({} seconds)",
                            self.session.config().max_duration.as_secs()
                        ),
                    ));
                }
                SessionEvent::Failed(e) => {
                    self.notify_error(&e);
                    self.set_state(RecordingState::Idle);
                    return;
                }
                SessionEvent::Finished(buffer) => {
                    self.process(buffer).await;
                    return;
                }
            }
        }

        // Session went away without finishing; never strand the state machine.
        self.set_state(RecordingState::Idle);
    }

    /// Validate, upload, and transcribe a finished cycle. The state returns
    /// to `Idle` on every path out of here.
    async fn process(&self, buffer: Option<AudioBuffer>) {
        let Some(buffer) = buffer else {
            // Zero chunks accumulated: the cycle ends silently, with no
            // upload or transcription request issued.
            self.set_state(RecordingState::Idle);
            return;
        };

        self.set_state(RecordingState::Processing);

        match self.run_pipeline(buffer).await {
            Ok(text) => {
                (self.on_transcript)(text);
                self.notices.notify(Notice::info(
                    "Transcription complete",
                    "Your speech has been converted to text",
                ));
            }
            Err(e) => self.notify_error(&e),
        }

        self.set_state(RecordingState::Idle);
    }

    async fn run_pipeline(&self, buffer: AudioBuffer) -> Result<String> {
        // Client-side validation happens before any network call; the server
        // re-checks because it does not trust us.
        check_buffer(Some(&buffer), &self.limits)?;

        let path = self.relay.upload(&buffer).await?;
        let text = self.relay.transcribe(&path).await?;

        info!("Recording cycle produced a {}-char transcript", text.len());
        Ok(text)
    }

    fn notify_error(&self, e: &VoiceError) {
        error!("Recording cycle failed: {}", e);

        let title = if matches!(e, VoiceError::PermissionDenied) {
            "Permission error"
        } else if e.is_device_error() {
            "Device error"
        } else {
            "Recording error"
        };

        self.notices.notify(Notice::alert(title, e.to_string()));
    }
}
