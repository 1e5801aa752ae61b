//! # voice-capture-core
//!
//! Platform-agnostic microphone capture with live level visualization.
//!
//! Records one session at a time into an encoded audio object while metering
//! the input and animating a bar visualization. Platform backends (cpal,
//! WASAPI, a browser bridge) implement `MicrophoneAccess` and plug into the
//! generic `CaptureSessionManager`.
//!
//! ## Architecture
//!
//! ```text
//! voice-capture-core (this crate)
//! ├── traits/       ← MicrophoneAccess, MicrophoneStream, AudioEncoder, DrawingSurface, CaptureObserver
//! ├── models/       ← CaptureError, CaptureState, RecorderConfig, AudioObject, LevelSample, etc.
//! ├── processing/   ← LevelAnalyzer, RingBuffer, TimeSliceChunker, PCM encoding, WAV header generation
//! ├── render/       ← VisualizationFrame, RenderLoop
//! ├── session/      ← CaptureSessionManager (orchestrator)
//! ├── storage/      ← recording export, settings
//! └── feedback      ← validation of pronunciation-analysis responses
//! ```

pub mod feedback;
pub mod models;
pub mod processing;
pub mod render;
pub mod session;
pub mod storage;
pub mod traits;

#[cfg(test)]
mod testing;

// Re-export key types at crate root for convenience.
pub use feedback::{FeedbackError, PronunciationFeedback};
pub use models::audio::{AudioSource, AudioTransportType, CaptureDiagnostics, LevelSample, SessionHandle, StreamFormat};
pub use models::audio_object::{AudioObject, RecordingMetadata};
pub use models::config::{AnalyserOptions, AudioConstraints, BarLayout, RecorderConfig, RenderOptions};
pub use models::error::CaptureError;
pub use models::state::CaptureState;
pub use processing::level_analyzer::LevelAnalyzer;
pub use processing::pcm_encoder::PcmEncoder;
pub use processing::ring_buffer::RingBuffer;
pub use render::frame::{Bar, VisualizationFrame};
pub use render::render_loop::RenderLoop;
pub use session::manager::{CaptureSessionManager, CaptureSessionManagerBuilder};
pub use storage::recording::{read_metadata, save_recording, SavedRecording};
pub use storage::settings::{load_config, save_config};
pub use traits::capture_observer::CaptureObserver;
pub use traits::encoder::{AudioEncoder, EncoderFactory};
pub use traits::microphone::{AudioBufferCallback, MicrophoneAccess, MicrophoneStream, StreamErrorCallback};
pub use traits::surface::DrawingSurface;
