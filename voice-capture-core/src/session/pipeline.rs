use std::time::Duration;

use crate::models::audio::StreamFormat;
use crate::models::audio_object::AudioObject;
use crate::models::config::RecorderConfig;
use crate::models::error::CaptureError;
use crate::processing::chunker::TimeSliceChunker;
use crate::processing::pcm::Resampler;
use crate::traits::encoder::{AudioEncoder, EncoderFactory};

/// Per-session encoding path: mono samples → optional resample → fixed
/// time slices → encoder → append-only chunk list.
pub(crate) struct EncodingPipeline {
    resampler: Option<Resampler>,
    chunker: TimeSliceChunker,
    encoder: Box<dyn AudioEncoder>,
    chunks: Vec<Vec<u8>>,
    output_rate: f64,
    frames: u64,
}

/// What one push added to the chunk list.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PushOutcome {
    pub frames: u64,
    pub chunks: u64,
    pub bytes: u64,
}

impl EncodingPipeline {
    pub fn new(device: &StreamFormat, config: &RecorderConfig, factory: &EncoderFactory) -> Self {
        let output_rate = config.target_sample_rate.unwrap_or(device.sample_rate);
        let output = StreamFormat {
            sample_rate: output_rate,
            channels: 1,
        };

        Self {
            resampler: config.target_sample_rate.map(Resampler::new),
            chunker: TimeSliceChunker::new(output_rate, config.timeslice()),
            encoder: factory(&output),
            chunks: Vec::new(),
            output_rate,
            frames: 0,
        }
    }

    /// Feed mono samples captured at `source_rate`.
    pub fn push(&mut self, mono: &[f32], source_rate: f64) -> Result<PushOutcome, CaptureError> {
        let samples = match &mut self.resampler {
            Some(resampler) => resampler.resample(mono, source_rate),
            None => mono.to_vec(),
        };

        let mut outcome = PushOutcome {
            frames: samples.len() as u64,
            ..Default::default()
        };
        self.frames += outcome.frames;

        for slice in self.chunker.push(&samples) {
            let encoded = self.encoder.encode(&slice)?;
            let bytes = self.append(encoded);
            if bytes > 0 {
                outcome.chunks += 1;
                outcome.bytes += bytes;
            }
        }
        Ok(outcome)
    }

    /// Flush the trailing partial slice and the encoder, then concatenate
    /// every chunk in append order.
    pub fn finish(mut self, elapsed: Duration) -> Result<AudioObject, CaptureError> {
        if let Some(rest) = self.chunker.finish() {
            let encoded = self.encoder.encode(&rest)?;
            self.append(encoded);
        }
        let tail = self.encoder.flush()?;
        self.append(tail);

        let media_duration = Duration::from_nanos((self.frames as f64 * 1e9 / self.output_rate).round() as u64);
        Ok(AudioObject::assemble(
            self.chunks,
            self.encoder.mime_type(),
            self.output_rate,
            1,
            media_duration,
            elapsed,
        ))
    }

    fn append(&mut self, encoded: Vec<u8>) -> u64 {
        if encoded.is_empty() {
            return 0;
        }
        let len = encoded.len() as u64;
        self.chunks.push(encoded);
        len
    }
}
