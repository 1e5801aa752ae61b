use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transport type for an input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioTransportType {
    BuiltIn,
    Bluetooth,
    Usb,
    Virtual,
    Unknown,
}

/// An input device backing a microphone stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSource {
    pub id: String,
    pub name: String,
    pub is_default: bool,
    pub transport_type: Option<AudioTransportType>,
}

/// Native format of samples delivered by a microphone stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreamFormat {
    pub sample_rate: f64,
    pub channels: u16,
}

/// Normalized instantaneous loudness in the range 0–100.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct LevelSample(f32);

impl LevelSample {
    pub const SILENT: Self = Self(0.0);
    pub const MAX: f32 = 100.0;

    /// Clamps into 0–100; NaN maps to silence.
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::SILENT;
        }
        Self(value.clamp(0.0, Self::MAX))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Level as a 0.0–1.0 fraction.
    pub fn fraction(self) -> f32 {
        self.0 / Self::MAX
    }
}

/// Opaque reference to a capture session handed back from `start()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
}

impl SessionHandle {
    pub(crate) fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }
}

/// Counters for debugging capture sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureDiagnostics {
    pub callback_count: u64,
    pub frames_captured: u64,
    pub dropped_callbacks: u64,
    pub chunks_emitted: u64,
    pub bytes_encoded: u64,
    pub format: String,
}
