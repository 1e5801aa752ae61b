use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::error::CaptureError;
use crate::processing::wav_format;

/// The finalized output of a stopped capture session.
///
/// `data` is every encoded chunk concatenated in emission order;
/// `chunk_lengths` records where each chunk ends so the order can be checked.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioObject {
    pub id: Uuid,
    pub mime_type: String,
    pub data: Vec<u8>,
    pub chunk_lengths: Vec<usize>,
    pub sample_rate: f64,
    pub channels: u16,
    /// Duration of the encoded audio, from the number of frames captured.
    pub media_duration: Duration,
    /// Wall-clock time between recording start and stop.
    pub elapsed: Duration,
    pub checksum: String,
    pub created_at: DateTime<Utc>,
}

impl AudioObject {
    pub(crate) fn assemble(
        chunks: Vec<Vec<u8>>,
        mime_type: String,
        sample_rate: f64,
        channels: u16,
        media_duration: Duration,
        elapsed: Duration,
    ) -> Self {
        let chunk_lengths: Vec<usize> = chunks.iter().map(Vec::len).collect();
        let data = chunks.concat();
        let checksum = hex_encode(&Sha256::digest(&data));

        Self {
            id: Uuid::new_v4(),
            mime_type,
            data,
            chunk_lengths,
            sample_rate,
            channels,
            media_duration,
            elapsed,
            checksum,
            created_at: Utc::now(),
        }
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_lengths.len()
    }

    /// Byte range of the `index`-th chunk within `data`.
    pub fn chunk(&self, index: usize) -> Option<&[u8]> {
        let len = *self.chunk_lengths.get(index)?;
        let start: usize = self.chunk_lengths[..index].iter().sum();
        self.data.get(start..start + len)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the payload is raw 16-bit linear PCM.
    pub fn is_linear_pcm(&self) -> bool {
        self.mime_type.starts_with("audio/L16")
    }

    /// Wrap a linear PCM payload in a 44-byte WAV header.
    pub fn to_wav(&self) -> Result<Vec<u8>, CaptureError> {
        if !self.is_linear_pcm() {
            return Err(CaptureError::EncodingFailed(format!(
                "cannot wrap {} in a WAV container",
                self.mime_type
            )));
        }
        let data_size = u32::try_from(self.data.len())
            .map_err(|_| CaptureError::EncodingFailed("payload too large for WAV".into()))?;

        let header = wav_format::generate_wav_header(self.sample_rate as u32, 16, self.channels, data_size);
        let mut wav = Vec::with_capacity(header.len() + self.data.len());
        wav.extend_from_slice(&header);
        wav.extend_from_slice(&self.data);
        Ok(wav)
    }

    pub fn metadata(&self, file_path: &str) -> RecordingMetadata {
        RecordingMetadata {
            id: self.id.to_string(),
            mime_type: self.mime_type.clone(),
            duration_secs: self.media_duration.as_secs_f64(),
            elapsed_secs: self.elapsed.as_secs_f64(),
            sample_rate: self.sample_rate,
            channels: self.channels,
            chunk_count: self.chunk_count(),
            byte_length: self.data.len(),
            file_path: file_path.to_string(),
            checksum: self.checksum.clone(),
            created_at: self.created_at.to_rfc3339(),
        }
    }
}

/// Sidecar description of an exported recording, handed to the
/// transcription client along with the audio file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub mime_type: String,
    pub duration_secs: f64,
    pub elapsed_secs: f64,
    pub sample_rate: f64,
    pub channels: u16,
    pub chunk_count: usize,
    pub byte_length: usize,
    pub file_path: String,
    pub checksum: String,
    pub created_at: String,
}

pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
