use std::sync::Arc;

use crate::models::audio::StreamFormat;
use crate::models::error::CaptureError;

/// Streaming audio encoder fed one time slice at a time.
///
/// The built-in implementation is `PcmEncoder` (16-bit linear PCM). Hosts
/// that want a compressed container supply their own through an
/// `EncoderFactory`.
pub trait AudioEncoder: Send {
    /// MIME type of the produced byte stream (e.g., `audio/L16;rate=48000;channels=1`).
    fn mime_type(&self) -> String;

    /// Encode one slice of mono f32 samples.
    ///
    /// May return an empty vec if the encoder is still buffering.
    fn encode(&mut self, samples: &[f32]) -> Result<Vec<u8>, CaptureError>;

    /// Emit whatever the encoder still holds. Called once on stop.
    fn flush(&mut self) -> Result<Vec<u8>, CaptureError>;
}

/// Builds a fresh encoder for each session from the mono output format.
pub type EncoderFactory = Arc<dyn Fn(&StreamFormat) -> Box<dyn AudioEncoder> + Send + Sync>;
