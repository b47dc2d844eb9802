//! Microphone capture backend using CPAL, encoding takes as WAV via hound.
//!
//! CPAL streams are not `Send`, so the stream lives on a dedicated capture
//! thread. Samples accumulate on that thread and the finished take is encoded
//! as one complete WAV flushed as the final data chunk, the way a platform
//! recorder delivers its encoding when stopped.

use std::io::Cursor;
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result as AnyResult};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SampleRate, SizedSample, Stream, StreamConfig};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::buffer::AudioChunk;
use super::capture::{CaptureBackend, CaptureConstraints, CaptureEvent, DeviceIdentity};
use super::validate::{check_capture_support, HostCapabilities};
use super::mime;
use crate::error::{Result, VoiceError};

const STOP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// CPAL-backed microphone capture.
pub struct MicrophoneBackend {
    open: bool,
    constraints: CaptureConstraints,
    take: Option<TakeHandle>,
}

struct TakeHandle {
    stop_tx: std_mpsc::Sender<()>,
    join: JoinHandle<()>,
}

impl MicrophoneBackend {
    pub fn new() -> Self {
        Self {
            open: false,
            constraints: CaptureConstraints::default(),
            take: None,
        }
    }
}

impl Default for MicrophoneBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CaptureBackend for MicrophoneBackend {
    async fn open(&mut self, constraints: &CaptureConstraints) -> Result<DeviceIdentity> {
        check_capture_support(&host_capabilities())?;

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(VoiceError::DeviceNotFound)?;

        // A device that cannot report its own identity is as good as absent.
        let name = device.name().map_err(|_| VoiceError::DeviceNotFound)?;

        let (config, format) = choose_config(&device, constraints)?;
        info!(
            "Opened input device {:?}: {} Hz, {} ch, {:?}",
            name, config.sample_rate.0, config.channels, format
        );

        self.open = true;
        self.constraints = constraints.clone();
        Ok(DeviceIdentity { name })
    }

    async fn begin(&mut self, events: mpsc::Sender<CaptureEvent>) -> Result<()> {
        if !self.open {
            return Err(VoiceError::NotInitialized);
        }
        if self.take.is_some() {
            return Ok(());
        }

        let (stop_tx, stop_rx) = std_mpsc::channel();
        let constraints = self.constraints.clone();
        let join = std::thread::Builder::new()
            .name("mic-capture".into())
            .spawn(move || capture_thread(constraints, events, stop_rx))
            .map_err(|e| VoiceError::Device(e.to_string()))?;

        self.take = Some(TakeHandle { stop_tx, join });
        Ok(())
    }

    async fn end(&mut self) -> AnyResult<()> {
        let Some(take) = self.take.take() else {
            return Ok(());
        };

        // A closed channel means the thread already exited after a fault.
        let _ = take.stop_tx.send(());
        tokio::task::spawn_blocking(move || take.join.join())
            .await
            .context("capture thread join task failed")?
            .map_err(|_| anyhow::anyhow!("capture thread panicked"))?;

        Ok(())
    }

    async fn release(&mut self) {
        if let Some(take) = self.take.take() {
            let _ = take.stop_tx.send(());
            let _ = tokio::task::spawn_blocking(move || take.join.join()).await;
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn name(&self) -> &str {
        "cpal-microphone"
    }
}

/// Probe what this process can capture and encode.
pub fn host_capabilities() -> HostCapabilities {
    HostCapabilities {
        capture_available: !cpal::available_hosts().is_empty(),
        encodable_mime: mime::negotiated_mime().ok().map(|m| m.to_string()),
    }
}

/// Body of the capture thread: owns the CPAL stream for one take.
fn capture_thread(
    constraints: CaptureConstraints,
    events: mpsc::Sender<CaptureEvent>,
    stop_rx: std_mpsc::Receiver<()>,
) {
    let host = cpal::default_host();
    let Some(device) = host.default_input_device() else {
        let _ = events.blocking_send(CaptureEvent::Error(VoiceError::DeviceNotFound));
        return;
    };

    let (config, format) = match choose_config(&device, &constraints) {
        Ok(chosen) => chosen,
        Err(e) => {
            let _ = events.blocking_send(CaptureEvent::Error(e));
            return;
        }
    };

    let samples: Arc<Mutex<Vec<i16>>> = Arc::new(Mutex::new(Vec::new()));
    let fault: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

    let stream = match build_stream(&device, &config, format, &samples, &fault) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = events.blocking_send(CaptureEvent::Error(e));
            return;
        }
    };

    if let Err(e) = stream.play() {
        drop(stream);
        let _ = events.blocking_send(CaptureEvent::Error(VoiceError::Device(e.to_string())));
        return;
    }

    let _ = events.blocking_send(CaptureEvent::Started);

    // Wait for the stop signal, watching for stream faults along the way.
    loop {
        match stop_rx.recv_timeout(STOP_POLL_INTERVAL) {
            Ok(()) | Err(std_mpsc::RecvTimeoutError::Disconnected) => break,
            Err(std_mpsc::RecvTimeoutError::Timeout) => {
                let faulted = fault.lock().unwrap().take();
                if let Some(message) = faulted {
                    // Release hardware before surfacing the fault.
                    drop(stream);
                    let _ = events.blocking_send(CaptureEvent::Error(VoiceError::Device(message)));
                    return;
                }
            }
        }
    }

    // Release the microphone before flushing the take.
    drop(stream);

    let take: Vec<i16> = std::mem::take(&mut *samples.lock().unwrap());
    if !take.is_empty() {
        match encode_wav(&take, config.sample_rate.0, config.channels) {
            Ok(bytes) => {
                let _ = events.blocking_send(CaptureEvent::Data(AudioChunk::new(
                    bytes,
                    "audio/wav",
                )));
            }
            Err(e) => {
                let _ = events
                    .blocking_send(CaptureEvent::Error(VoiceError::Device(format!("{e:#}"))));
                return;
            }
        }
    }

    let _ = events.blocking_send(CaptureEvent::Stopped);
}

/// Pick a stream config honoring the ideal constraints where the device
/// supports them, falling back to the device default otherwise.
fn choose_config(
    device: &cpal::Device,
    constraints: &CaptureConstraints,
) -> Result<(StreamConfig, SampleFormat)> {
    if let Ok(ranges) = device.supported_input_configs() {
        for range in ranges {
            let rate = SampleRate(constraints.sample_rate);
            if range.channels() == constraints.channels
                && range.min_sample_rate() <= rate
                && rate <= range.max_sample_rate()
            {
                let supported = range.with_sample_rate(rate);
                let format = supported.sample_format();
                return Ok((supported.into(), format));
            }
        }
    }

    let supported = device.default_input_config().map_err(map_config_error)?;
    let format = supported.sample_format();
    Ok((supported.into(), format))
}

fn build_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    format: SampleFormat,
    samples: &Arc<Mutex<Vec<i16>>>,
    fault: &Arc<Mutex<Option<String>>>,
) -> Result<Stream> {
    match format {
        SampleFormat::I16 => build_stream_typed::<i16>(device, config, samples, fault),
        SampleFormat::U16 => build_stream_typed::<u16>(device, config, samples, fault),
        SampleFormat::F32 => build_stream_typed::<f32>(device, config, samples, fault),
        _ => Err(VoiceError::UnsupportedFormat),
    }
}

fn build_stream_typed<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    samples: &Arc<Mutex<Vec<i16>>>,
    fault: &Arc<Mutex<Option<String>>>,
) -> Result<Stream>
where
    T: SizedSample + Send + 'static,
    i16: Sample + FromSample<T>,
{
    let samples = Arc::clone(samples);
    let fault = Arc::clone(fault);
    let err_fn = move |err: cpal::StreamError| {
        warn!("Audio stream error: {}", err);
        fault.lock().unwrap().get_or_insert_with(|| err.to_string());
    };

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let mut buf = samples.lock().unwrap();
                for &sample in data {
                    buf.push(i16::from_sample(sample));
                }
            },
            err_fn,
            None,
        )
        .map_err(map_build_error)
}

/// Encode a finished take as a complete in-memory WAV.
fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> AnyResult<Vec<u8>> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer =
        hound::WavWriter::new(&mut cursor, spec).context("Failed to create WAV encoder")?;
    for &sample in samples {
        writer
            .write_sample(sample)
            .context("Failed to write sample to WAV")?;
    }
    writer.finalize().context("Failed to finalize WAV")?;

    Ok(cursor.into_inner())
}

fn map_build_error(e: cpal::BuildStreamError) -> VoiceError {
    match e {
        cpal::BuildStreamError::DeviceNotAvailable => VoiceError::DeviceNotFound,
        cpal::BuildStreamError::StreamConfigNotSupported | cpal::BuildStreamError::InvalidArgument => {
            VoiceError::UnsupportedFormat
        }
        other => classify_backend_message(other.to_string()),
    }
}

fn map_config_error(e: cpal::DefaultStreamConfigError) -> VoiceError {
    match e {
        cpal::DefaultStreamConfigError::DeviceNotAvailable => VoiceError::DeviceNotFound,
        cpal::DefaultStreamConfigError::StreamTypeNotSupported => VoiceError::UnsupportedFormat,
        cpal::DefaultStreamConfigError::BackendSpecific { err } => {
            classify_backend_message(err.to_string())
        }
    }
}

/// Backend-specific errors do not distinguish a denied microphone from other
/// faults; OS permission refusals surface with "denied" in the description.
fn classify_backend_message(message: String) -> VoiceError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("denied") || lower.contains("permission") {
        VoiceError::PermissionDenied
    } else {
        VoiceError::Device(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_wav_produces_riff_header_and_payload() {
        let bytes = encode_wav(&[0, 1, -1, i16::MAX, i16::MIN], 16000, 1).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        // 44-byte canonical header plus two bytes per sample
        assert_eq!(bytes.len(), 44 + 5 * 2);
    }

    #[test]
    fn permission_refusals_are_classified_from_backend_messages() {
        assert!(matches!(
            classify_backend_message("Access denied by user".into()),
            VoiceError::PermissionDenied
        ));
        assert!(matches!(
            classify_backend_message("ALSA device busy".into()),
            VoiceError::Device(_)
        ));
    }
}
