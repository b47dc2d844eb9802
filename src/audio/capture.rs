use anyhow::Result as AnyResult;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::buffer::AudioChunk;
use super::mime;
use crate::error::{Result, VoiceError};

/// Capture preferences declared to the platform. All values are ideal, not
/// mandatory; a backend applies what the hardware honors and silently
/// substitutes the rest.
#[derive(Debug, Clone)]
pub struct CaptureConstraints {
    pub sample_rate: u32,
    pub channels: u16,
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

/// Identity of the input device a backend opened.
#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    pub name: String,
}

/// Lifecycle and data events a capture backend emits for one take.
#[derive(Debug)]
pub enum CaptureEvent {
    /// Encoding has begun. Fired exactly once per take.
    Started,
    /// An encoder-flushed segment. Never zero-length.
    Data(AudioChunk),
    /// Encoding finished and the hardware stream was released. Fired exactly
    /// once per take.
    Stopped,
    /// The device or encoder faulted. The backend releases hardware before
    /// this is emitted.
    Error(VoiceError),
}

/// A platform audio capture primitive.
///
/// Implementations own the hardware stream and the encoder for one take and
/// report through the event channel handed to [`CaptureBackend::begin`].
#[async_trait::async_trait]
pub trait CaptureBackend: Send {
    /// Request access to an input device with the given preferences.
    ///
    /// Fails with `PermissionDenied` when access is refused, `DeviceNotFound`
    /// when no input device exists or the device reports no identity.
    async fn open(&mut self, constraints: &CaptureConstraints) -> Result<DeviceIdentity>;

    /// Begin capturing and encoding, reporting through `events`.
    async fn begin(&mut self, events: mpsc::Sender<CaptureEvent>) -> Result<()>;

    /// Finish the take: flush any buffered final chunk, emit `Stopped`, and
    /// release the hardware stream.
    async fn end(&mut self) -> AnyResult<()>;

    /// Release the hardware stream without finishing a take. Idempotent.
    async fn release(&mut self);

    /// Whether `open` has succeeded and the device is held.
    fn is_open(&self) -> bool;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// State wrapper around a capture backend: owns exactly one active hardware
/// stream and one active encoder at a time.
pub struct CaptureDevice {
    backend: Box<dyn CaptureBackend>,
    constraints: CaptureConstraints,
    mime_type: Option<&'static str>,
    active: bool,
}

impl CaptureDevice {
    pub fn new(backend: Box<dyn CaptureBackend>, constraints: CaptureConstraints) -> Self {
        Self {
            backend,
            constraints,
            mime_type: None,
            active: false,
        }
    }

    /// Negotiate an encodable format and open the input device. Calling this
    /// again once initialized is a no-op, so the platform permission prompt
    /// fires at most once.
    pub async fn initialize(&mut self) -> Result<()> {
        if self.is_initialized() {
            return Ok(());
        }

        let mime_type = mime::negotiated_mime()?;

        let identity = self.backend.open(&self.constraints).await?;
        info!(
            "Capture device ready: {} via {} ({})",
            identity.name,
            self.backend.name(),
            mime_type
        );

        self.mime_type = Some(mime_type);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.backend.is_open()
    }

    /// The MIME type negotiated at initialization.
    pub fn mime_type(&self) -> Result<&'static str> {
        self.mime_type.ok_or(VoiceError::NotInitialized)
    }

    /// Begin a take. Returns the event receiver for the cycle.
    ///
    /// Fails with `NotInitialized` before a successful [`initialize`]. A
    /// second call while already active returns `Ok(None)` without touching
    /// the stream (never double-starts).
    pub async fn start(&mut self) -> Result<Option<mpsc::Receiver<CaptureEvent>>> {
        if !self.is_initialized() {
            return Err(VoiceError::NotInitialized);
        }
        if self.active {
            return Ok(None);
        }

        let (tx, rx) = mpsc::channel(32);
        match self.backend.begin(tx).await {
            Ok(()) => {
                self.active = true;
                Ok(Some(rx))
            }
            Err(e) => {
                // Hardware must not stay held after a failed start.
                self.backend.release().await;
                Err(e)
            }
        }
    }

    /// Finish the active take, if any, and release the hardware stream. The
    /// stream is released on every exit path so the microphone indicator is
    /// never left on.
    pub async fn stop(&mut self) {
        if self.active {
            self.active = false;
            if let Err(e) = self.backend.end().await {
                warn!("Capture backend failed to finalize take: {:#}", e);
            }
        }
        self.backend.release().await;
    }

    /// Settle state after the backend surfaced an error event. The backend
    /// has already dropped the hardware stream by then; releasing again just
    /// reaps its bookkeeping so the next cycle can start clean.
    pub async fn recover_from_fault(&mut self) {
        self.active = false;
        self.backend.release().await;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}
