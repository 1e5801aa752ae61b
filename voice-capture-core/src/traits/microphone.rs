use std::sync::Arc;

use crate::models::audio::{AudioSource, StreamFormat};
use crate::models::config::AudioConstraints;
use crate::models::error::CaptureError;

/// Callback invoked when an audio buffer is available.
///
/// Parameters:
/// - `samples`: Interleaved f32 samples in `[-1.0, 1.0]`.
/// - `sample_rate`: The actual sample rate of the delivered audio.
/// - `channels`: Number of interleaved channels.
pub type AudioBufferCallback = Arc<dyn Fn(&[f32], f64, u16) + Send + Sync + 'static>;

/// Callback invoked when the device reports a runtime failure.
pub type StreamErrorCallback = Arc<dyn Fn(CaptureError) + Send + Sync + 'static>;

/// Host capability that grants access to a microphone.
///
/// Implemented by the platform layer (cpal, WASAPI, a browser bridge) and by
/// scripted fakes in tests.
pub trait MicrophoneAccess: Send + Sync {
    /// Ask for a live input stream honoring `constraints`.
    ///
    /// May block until the user answers a permission prompt. Fails with
    /// `DeviceAccessDenied` or `DeviceUnavailable`.
    fn request_microphone(
        &self,
        constraints: &AudioConstraints,
    ) -> Result<Box<dyn MicrophoneStream>, CaptureError>;
}

/// A granted, exclusively held microphone.
pub trait MicrophoneStream: Send {
    /// Native format of buffers passed to `on_data`.
    fn format(&self) -> StreamFormat;

    /// Information about the device backing this stream.
    fn source(&self) -> AudioSource;

    /// Begin delivering buffers. Callbacks may fire on a device thread.
    fn start(
        &mut self,
        on_data: AudioBufferCallback,
        on_error: StreamErrorCallback,
    ) -> Result<(), CaptureError>;

    /// Stop delivery and give the device back to the OS.
    ///
    /// Idempotent. No callback runs after this returns. Implementations
    /// should also release on drop.
    fn release(&mut self);
}
