use crate::models::audio::StreamFormat;
use crate::models::error::CaptureError;
use crate::traits::encoder::AudioEncoder;

use super::pcm::convert_to_int16_pcm;

/// Encodes mono f32 slices as raw 16-bit little-endian PCM.
///
/// Stateless: every slice is emitted immediately and `flush` has nothing to add.
#[derive(Debug, Clone)]
pub struct PcmEncoder {
    sample_rate: u32,
}

impl PcmEncoder {
    pub fn new(format: &StreamFormat) -> Self {
        Self {
            sample_rate: format.sample_rate.round() as u32,
        }
    }
}

impl AudioEncoder for PcmEncoder {
    fn mime_type(&self) -> String {
        format!("audio/L16;rate={};channels=1", self.sample_rate)
    }

    fn encode(&mut self, samples: &[f32]) -> Result<Vec<u8>, CaptureError> {
        Ok(convert_to_int16_pcm(samples))
    }

    fn flush(&mut self) -> Result<Vec<u8>, CaptureError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_carries_rate() {
        let encoder = PcmEncoder::new(&StreamFormat {
            sample_rate: 16000.0,
            channels: 1,
        });
        assert_eq!(encoder.mime_type(), "audio/L16;rate=16000;channels=1");
    }

    #[test]
    fn encodes_two_bytes_per_sample() {
        let mut encoder = PcmEncoder::new(&StreamFormat {
            sample_rate: 48000.0,
            channels: 1,
        });
        assert_eq!(encoder.encode(&[0.0; 480]).unwrap().len(), 960);
        assert!(encoder.flush().unwrap().is_empty());
    }
}
