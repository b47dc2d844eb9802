use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::info;

use super::config::SessionConfig;
use crate::audio::{AudioBuffer, AudioChunk, CaptureConstraints, CaptureDevice, CaptureEvent};
use crate::error::{Result, VoiceError};

/// What one recording cycle reports back to its driver.
#[derive(Debug)]
pub enum SessionEvent {
    /// The device began encoding
    Started,
    /// The hard deadline expired and the device is being force-stopped.
    /// Informational: whatever was captured still flows through `Finished`.
    MaxDurationReached,
    /// The cycle ended. `None` means zero chunks were accumulated and the
    /// cycle ends silently with no buffer.
    Finished(Option<AudioBuffer>),
    /// The device or encoder faulted; hardware was already released
    Failed(VoiceError),
}

/// Drives one capture device across bounded recording cycles.
///
/// The device is initialized lazily on the first cycle and reused afterwards,
/// so the platform permission prompt fires at most once per session.
pub struct RecordingSession {
    config: SessionConfig,
    device: Arc<Mutex<CaptureDevice>>,
    chunks: Arc<Mutex<Vec<AudioChunk>>>,
    deadline: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl RecordingSession {
    pub fn new(config: SessionConfig) -> Self {
        let constraints = CaptureConstraints {
            sample_rate: config.sample_rate,
            channels: config.channels,
            ..CaptureConstraints::default()
        };
        let device = CaptureDevice::new(
            Box::new(crate::audio::MicrophoneBackend::new()),
            constraints,
        );
        Self::with_device(config, device)
    }

    /// Build a session around an already-constructed device. Lets tests wire
    /// in scripted backends.
    pub fn with_device(config: SessionConfig, device: CaptureDevice) -> Self {
        Self {
            config,
            device: Arc::new(Mutex::new(device)),
            chunks: Arc::new(Mutex::new(Vec::new())),
            deadline: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Start a recording cycle and return its event stream.
    ///
    /// Returns `Ok(None)` when a cycle is already in flight (the device never
    /// double-starts). Device and format errors surface here, before any
    /// network stage is reached.
    pub async fn start(&self) -> Result<Option<mpsc::Receiver<SessionEvent>>> {
        self.chunks.lock().await.clear();

        let (capture_rx, mime_type) = {
            let mut device = self.device.lock().await;
            device.initialize().await?;
            let mime_type = device.mime_type()?;
            match device.start().await? {
                Some(rx) => (rx, mime_type),
                None => return Ok(None),
            }
        };

        let (tx, rx) = mpsc::channel(16);

        self.arm_deadline(tx.clone()).await;
        self.spawn_pump(capture_rx, tx, mime_type.to_string());

        Ok(Some(rx))
    }

    /// Stop the current cycle: cancel the deadline synchronously, then stop
    /// the device. Always releases hardware, even when nothing was recording.
    pub async fn stop(&self) {
        if let Some(handle) = self.deadline.lock().await.take() {
            handle.abort();
        }
        self.device.lock().await.stop().await;
    }

    async fn arm_deadline(&self, tx: mpsc::Sender<SessionEvent>) {
        let device = Arc::clone(&self.device);
        let max_duration = self.config.max_duration;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(max_duration).await;
            info!(
                "Max recording duration reached ({} s), forcing stop",
                max_duration.as_secs()
            );
            let _ = tx.send(SessionEvent::MaxDurationReached).await;
            device.lock().await.stop().await;
        });

        let mut deadline = self.deadline.lock().await;
        if let Some(stale) = deadline.replace(handle) {
            stale.abort();
        }
    }

    fn spawn_pump(
        &self,
        mut capture_rx: mpsc::Receiver<CaptureEvent>,
        tx: mpsc::Sender<SessionEvent>,
        mime_type: String,
    ) {
        let chunks = Arc::clone(&self.chunks);
        let device = Arc::clone(&self.device);
        let deadline = Arc::clone(&self.deadline);

        tokio::spawn(async move {
            while let Some(event) = capture_rx.recv().await {
                match event {
                    CaptureEvent::Started => {
                        let _ = tx.send(SessionEvent::Started).await;
                    }
                    CaptureEvent::Data(chunk) => {
                        if !chunk.is_empty() {
                            chunks.lock().await.push(chunk);
                        }
                    }
                    CaptureEvent::Error(e) => {
                        if let Some(handle) = deadline.lock().await.take() {
                            handle.abort();
                        }
                        device.lock().await.recover_from_fault().await;
                        let _ = tx.send(SessionEvent::Failed(e)).await;
                        return;
                    }
                    CaptureEvent::Stopped => {
                        let drained = std::mem::take(&mut *chunks.lock().await);
                        let buffer = AudioBuffer::from_chunks(drained, &mime_type);
                        let _ = tx.send(SessionEvent::Finished(buffer)).await;
                        return;
                    }
                }
            }

            // Event channel closed without a stop event: end the cycle
            // silently rather than leave the driver waiting.
            let _ = tx.send(SessionEvent::Finished(None)).await;
        });
    }
}
