use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Highest accepted `target_sample_rate`, in Hz.
pub const MAX_SAMPLE_RATE: f64 = 384_000.0;

/// Longest accepted encoded chunk, in milliseconds.
pub const MAX_TIMESLICE_MS: u64 = 60_000;

/// Largest accepted surface width or height.
pub const MAX_SURFACE_DIMENSION: f32 = 16_384.0;

pub const MAX_BAR_COUNT: usize = 4096;

/// Processing constraints requested when opening the microphone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl Default for AudioConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

/// Frequency-analysis settings for the level analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyserOptions {
    /// Analysis window in samples. Power of two, 32..=32768 (default: 256).
    pub fft_size: usize,

    /// Weight of the previous magnitude when blending in a new one (default: 0.8).
    pub smoothing: f32,

    /// Magnitude mapped to byte 0 (default: -100 dB).
    pub min_decibels: f32,

    /// Magnitude mapped to byte 255 (default: -30 dB).
    pub max_decibels: f32,
}

impl AnalyserOptions {
    pub fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }
}

impl Default for AnalyserOptions {
    fn default() -> Self {
        Self {
            fft_size: 256,
            smoothing: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

/// Geometry of the bar visualization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarLayout {
    pub width: f32,
    pub height: f32,
    pub bar_width: f32,
    pub bar_spacing: f32,
    /// Fraction of `height` a bar may reach at full level.
    pub max_height_ratio: f32,
}

impl BarLayout {
    pub fn bar_count(&self) -> usize {
        (self.width / (self.bar_width + self.bar_spacing)).floor().max(0.0) as usize
    }

    pub fn max_bar_height(&self) -> f32 {
        self.height * self.max_height_ratio
    }
}

impl Default for BarLayout {
    fn default() -> Self {
        Self {
            width: 400.0,
            height: 100.0,
            bar_width: 4.0,
            bar_spacing: 2.0,
            max_height_ratio: 0.8,
        }
    }
}

/// Render loop pacing and layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Delay between redraws in milliseconds (default: 16, roughly 60 Hz).
    pub frame_interval_ms: u64,
    pub layout: BarLayout,
}

impl RenderOptions {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            layout: BarLayout::default(),
        }
    }
}

/// Configuration for a capture session manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    pub constraints: AudioConstraints,

    /// Length of one encoded chunk in milliseconds of audio (default: 100).
    pub timeslice_ms: u64,

    /// Resample device audio to this rate before encoding (None = device rate).
    pub target_sample_rate: Option<f64>,

    pub analyser: AnalyserOptions,

    pub render: RenderOptions,

    /// Give up on a pending permission prompt after this long (None = wait forever).
    pub acquire_timeout_ms: Option<u64>,
}

impl RecorderConfig {
    pub fn timeslice(&self) -> Duration {
        Duration::from_millis(self.timeslice_ms)
    }

    pub fn acquire_timeout(&self) -> Option<Duration> {
        self.acquire_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.timeslice_ms == 0 || self.timeslice_ms > MAX_TIMESLICE_MS {
            return Err(format!("timeslice must be within 1..={} ms: {}", MAX_TIMESLICE_MS, self.timeslice_ms));
        }
        if let Some(rate) = self.target_sample_rate {
            if !rate.is_finite() || rate <= 0.0 || rate > MAX_SAMPLE_RATE {
                return Err(format!("target sample rate must be within (0, {}]: {}", MAX_SAMPLE_RATE, rate));
            }
        }

        let analyser = &self.analyser;
        if !analyser.fft_size.is_power_of_two() || !(32..=32768).contains(&analyser.fft_size) {
            return Err(format!("unsupported fft size: {}", analyser.fft_size));
        }
        if !(0.0..=1.0).contains(&analyser.smoothing) {
            return Err(format!("smoothing must be within 0..=1: {}", analyser.smoothing));
        }
        if !analyser.min_decibels.is_finite() || !analyser.max_decibels.is_finite() {
            return Err("decibel range must be finite".into());
        }
        if analyser.min_decibels >= analyser.max_decibels {
            return Err("min decibels must be below max decibels".into());
        }

        if self.render.frame_interval_ms == 0 {
            return Err("frame interval must be positive".into());
        }
        let layout = &self.render.layout;
        let dimensions = [layout.width, layout.height, layout.bar_width, layout.bar_spacing];
        if dimensions.iter().any(|d| !d.is_finite()) {
            return Err("layout dimensions must be finite".into());
        }
        if !(0.0..=MAX_SURFACE_DIMENSION).contains(&layout.width) || !(0.0..=MAX_SURFACE_DIMENSION).contains(&layout.height) {
            return Err(format!("surface dimensions must be within 0..={}", MAX_SURFACE_DIMENSION));
        }
        if layout.bar_width <= 0.0 || layout.bar_spacing < 0.0 {
            return Err("bar width must be positive and spacing non-negative".into());
        }
        if layout.bar_count() > MAX_BAR_COUNT {
            return Err(format!("layout yields {} bars, at most {} allowed", layout.bar_count(), MAX_BAR_COUNT));
        }
        if !(0.0..=1.0).contains(&layout.max_height_ratio) {
            return Err(format!("max height ratio must be within 0..=1: {}", layout.max_height_ratio));
        }
        Ok(())
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            constraints: AudioConstraints::default(),
            timeslice_ms: 100,
            target_sample_rate: None,
            analyser: AnalyserOptions::default(),
            render: RenderOptions::default(),
            acquire_timeout_ms: None,
        }
    }
}
