/// An encoded audio fragment emitted by the capture device. Immutable once
/// created; ownership moves to the session on emission.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Encoded bytes for this segment (never empty)
    pub bytes: Vec<u8>,
    /// MIME type the encoder produced
    pub mime_type: String,
}

impl AudioChunk {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// One recording cycle's audio: the concatenation of every chunk the cycle
/// produced, tagged with the negotiated MIME type.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl AudioBuffer {
    /// Assemble a buffer from accumulated chunks. A cycle that produced no
    /// chunks yields no buffer at all.
    pub fn from_chunks(chunks: Vec<AudioChunk>, mime_type: &str) -> Option<Self> {
        if chunks.is_empty() {
            return None;
        }

        let total: usize = chunks.iter().map(|c| c.len()).sum();
        let mut bytes = Vec::with_capacity(total);
        for chunk in chunks {
            bytes.extend_from_slice(&chunk.bytes);
        }

        Some(Self {
            bytes,
            mime_type: mime_type.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
