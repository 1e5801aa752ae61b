/// Streaming linear-interpolation resampler for mono audio.
///
/// Keeps the read position and the last input sample between calls, so a
/// stream split into arbitrary buffers yields the same output as one call
/// over the whole stream.
#[derive(Debug, Clone)]
pub struct Resampler {
    pub target_sample_rate: f64,
    /// Input position of the next output sample, relative to the start of
    /// the next buffer. Negative values point into the previous buffer.
    position: f64,
    last: Option<f32>,
}

impl Resampler {
    pub fn new(target_sample_rate: f64) -> Self {
        Self {
            target_sample_rate,
            position: 0.0,
            last: None,
        }
    }

    /// Resample the next buffer from `source_sample_rate` to the target rate.
    ///
    /// Returns input unchanged if rates match.
    pub fn resample(&mut self, samples: &[f32], source_sample_rate: f64) -> Vec<f32> {
        if samples.is_empty() {
            return Vec::new();
        }
        if !source_sample_rate.is_finite()
            || source_sample_rate <= 0.0
            || (source_sample_rate - self.target_sample_rate).abs() < 0.01
        {
            self.reset();
            return samples.to_vec();
        }

        let step = source_sample_rate / self.target_sample_rate;
        let len = samples.len();
        let last_index = (len - 1) as f64;
        let mut output = Vec::with_capacity((len as f64 / step).ceil() as usize + 1);

        while self.position <= last_index {
            let sample = if self.position < 0.0 {
                // Between the previous buffer's last sample and samples[0].
                let previous = self.last.unwrap_or(samples[0]);
                let fraction = (self.position + 1.0) as f32;
                previous * (1.0 - fraction) + samples[0] * fraction
            } else {
                let index = self.position as usize;
                let fraction = (self.position - index as f64) as f32;
                match samples.get(index + 1) {
                    Some(&next) => samples[index] * (1.0 - fraction) + next * fraction,
                    None => samples[index],
                }
            };
            output.push(sample);
            self.position += step;
        }

        self.position -= len as f64;
        self.last = Some(samples[len - 1]);
        output
    }

    /// Forget the carried position, e.g. before a new stream.
    pub fn reset(&mut self) {
        self.position = 0.0;
        self.last = None;
    }
}

/// Convert f32 samples `[-1.0, 1.0]` to 16-bit PCM (little-endian bytes).
///
/// Clamps out-of-range values. Output length = `samples.len() * 2` bytes.
pub fn convert_to_int16_pcm(samples: &[f32]) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        let int16_value = (clamped * i16::MAX as f32) as i16;
        data.extend_from_slice(&int16_value.to_le_bytes());
    }
    data
}
