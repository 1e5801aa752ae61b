//! Frequency-domain analysis of the live input.
//!
//! Mirrors the behavior of a platform analyser node: a Blackman-windowed FFT
//! over the newest `fft_size` samples, magnitudes blended over time, then
//! mapped from a decibel range onto bytes 0–255.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::models::config::AnalyserOptions;

use super::ring_buffer::RingBuffer;

/// Largest value a frequency bin can take.
pub const MAX_BIN_MAGNITUDE: u8 = u8::MAX;

pub struct AnalysisGraph {
    options: AnalyserOptions,
    history: RingBuffer,
    window: Vec<f32>,
    smoothed: Vec<f32>,
    bytes: Vec<u8>,
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
}

impl AnalysisGraph {
    pub fn new(options: AnalyserOptions) -> Self {
        let size = options.fft_size;
        let bins = options.frequency_bin_count();
        let fft = FftPlanner::new().plan_fft_forward(size);

        Self {
            options,
            history: RingBuffer::new(size),
            window: blackman_window(size),
            smoothed: vec![0.0; bins],
            bytes: vec![0; bins],
            fft,
            buffer: vec![Complex::new(0.0, 0.0); size],
        }
    }

    pub fn options(&self) -> &AnalyserOptions {
        &self.options
    }

    /// Feed mono samples and recompute the frequency snapshot.
    pub fn process(&mut self, samples: &[f32]) {
        if samples.is_empty() {
            return;
        }
        self.history.write(samples);
        self.recompute();
    }

    /// Latest byte-scaled magnitudes, one per frequency bin.
    pub fn frequency_data(&self) -> &[u8] {
        &self.bytes
    }

    /// Mean bin magnitude normalized to 0–100.
    pub fn level(&self) -> f32 {
        if self.bytes.is_empty() {
            return 0.0;
        }
        let sum: u32 = self.bytes.iter().map(|&b| b as u32).sum();
        let mean = sum as f32 / self.bytes.len() as f32;
        mean / MAX_BIN_MAGNITUDE as f32 * 100.0
    }

    fn recompute(&mut self) {
        let size = self.options.fft_size;
        let recent = self.history.latest(size);
        // Left-pad with silence until a full window has been seen.
        let offset = size - recent.len();

        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = if i < offset { 0.0 } else { recent[i - offset] };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }
        self.fft.process(&mut self.buffer);

        let tau = self.options.smoothing;
        let min_db = self.options.min_decibels;
        let range = self.options.max_decibels - min_db;
        let scale = 1.0 / size as f32;

        for k in 0..self.smoothed.len() {
            let magnitude = self.buffer[k].norm() * scale;
            let mut blended = tau * self.smoothed[k] + (1.0 - tau) * magnitude;
            if !blended.is_finite() {
                blended = 0.0;
            }
            self.smoothed[k] = blended;

            let db = 20.0 * blended.log10();
            let scaled = (MAX_BIN_MAGNITUDE as f32 / range * (db - min_db)).floor();
            self.bytes[k] = if scaled.is_nan() {
                0
            } else {
                scaled.clamp(0.0, MAX_BIN_MAGNITUDE as f32) as u8
            };
        }
    }
}

fn blackman_window(size: usize) -> Vec<f32> {
    let alpha = 0.16f32;
    let a0 = 0.5 * (1.0 - alpha);
    let a1 = 0.5;
    let a2 = 0.5 * alpha;
    (0..size)
        .map(|n| {
            let x = n as f32 / size as f32;
            a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
        })
        .collect()
}
