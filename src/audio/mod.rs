//! Audio capture pipeline: MIME negotiation, the capture device and its
//! backends, and validation of finished buffers.

pub mod buffer;
pub mod capture;
pub mod microphone;
pub mod mime;
pub mod validate;

pub use buffer::{AudioBuffer, AudioChunk};
pub use capture::{CaptureBackend, CaptureConstraints, CaptureDevice, CaptureEvent, DeviceIdentity};
pub use microphone::MicrophoneBackend;
pub use mime::{negotiate, negotiated_mime, EncoderSupport, StockEncoders, DEFAULT_MIME_PREFERENCES};
pub use validate::{check_buffer, check_capture_support, HostCapabilities, UploadLimits};
