// Unit tests for buffer validation and assembly.
//
// These cover the client-side checks that run before any network call.

use voice_relay::audio::validate::{check_buffer, check_capture_support, HostCapabilities};
use voice_relay::audio::{AudioBuffer, AudioChunk, UploadLimits};
use voice_relay::VoiceError;

fn buffer(bytes: Vec<u8>, mime_type: &str) -> AudioBuffer {
    AudioBuffer::from_chunks(vec![AudioChunk::new(bytes, mime_type)], mime_type)
        .expect("one chunk should assemble")
}

#[test]
fn absent_buffer_is_no_audio_data() {
    let err = check_buffer(None, &UploadLimits::default()).unwrap_err();
    assert!(matches!(err, VoiceError::NoAudioData));
}

#[test]
fn zero_byte_buffer_is_empty_recording() {
    let empty = AudioBuffer {
        bytes: Vec::new(),
        mime_type: "audio/webm".to_string(),
    };
    let err = check_buffer(Some(&empty), &UploadLimits::default()).unwrap_err();
    assert!(matches!(err, VoiceError::EmptyRecording));
}

#[test]
fn oversize_buffer_is_file_too_large() {
    let limits = UploadLimits {
        max_bytes: 16,
        ..UploadLimits::default()
    };
    let big = buffer(vec![0u8; 17], "audio/wav");
    let err = check_buffer(Some(&big), &limits).unwrap_err();
    assert!(matches!(err, VoiceError::FileTooLarge { max_bytes: 16 }));
}

#[test]
fn unlisted_mime_type_is_invalid_format() {
    let odd = buffer(vec![1, 2, 3], "audio/flac");
    let err = check_buffer(Some(&odd), &UploadLimits::default()).unwrap_err();
    match err {
        VoiceError::InvalidFormat { mime_type } => assert_eq!(mime_type, "audio/flac"),
        other => panic!("expected InvalidFormat, got {:?}", other),
    }
}

#[test]
fn allow_list_matches_on_prefix() {
    // A codec-qualified type passes because matching is by prefix
    let qualified = buffer(vec![1, 2, 3], "audio/webm;codecs=opus");
    assert!(check_buffer(Some(&qualified), &UploadLimits::default()).is_ok());

    for mime in ["audio/webm", "audio/wav", "audio/mp3", "audio/ogg"] {
        let ok = buffer(vec![1, 2, 3], mime);
        assert!(
            check_buffer(Some(&ok), &UploadLimits::default()).is_ok(),
            "{} should be allowed",
            mime
        );
    }
}

#[test]
fn emptiness_is_reported_before_format() {
    // An empty buffer with a bad tag reports the emptiness, not the format
    let empty = AudioBuffer {
        bytes: Vec::new(),
        mime_type: "text/plain".to_string(),
    };
    let err = check_buffer(Some(&empty), &UploadLimits::default()).unwrap_err();
    assert!(matches!(err, VoiceError::EmptyRecording));
}

#[test]
fn buffer_at_exact_ceiling_is_accepted() {
    let limits = UploadLimits {
        max_bytes: 8,
        ..UploadLimits::default()
    };
    let at_limit = buffer(vec![0u8; 8], "audio/wav");
    assert!(check_buffer(Some(&at_limit), &limits).is_ok());
}

#[test]
fn chunks_concatenate_in_emission_order() {
    let assembled = AudioBuffer::from_chunks(
        vec![
            AudioChunk::new(vec![1, 2], "audio/wav"),
            AudioChunk::new(vec![3], "audio/wav"),
            AudioChunk::new(vec![4, 5], "audio/wav"),
        ],
        "audio/wav",
    )
    .expect("chunks should assemble");

    assert_eq!(assembled.bytes, vec![1, 2, 3, 4, 5]);
    assert_eq!(assembled.mime_type, "audio/wav");
}

#[test]
fn zero_chunks_assemble_to_no_buffer() {
    assert!(AudioBuffer::from_chunks(Vec::new(), "audio/wav").is_none());
}

#[test]
fn missing_capture_primitive_is_rejected_first() {
    let host = HostCapabilities {
        capture_available: false,
        encodable_mime: None,
    };
    let err = check_capture_support(&host).unwrap_err();
    assert!(matches!(err, VoiceError::CaptureUnsupported));
}

#[test]
fn capture_without_encoder_is_unsupported_format() {
    let host = HostCapabilities {
        capture_available: true,
        encodable_mime: None,
    };
    let err = check_capture_support(&host).unwrap_err();
    assert!(matches!(err, VoiceError::UnsupportedFormat));
}

#[test]
fn capture_with_encoder_is_supported() {
    let host = HostCapabilities {
        capture_available: true,
        encodable_mime: Some("audio/wav".to_string()),
    };
    assert!(check_capture_support(&host).is_ok());
}
