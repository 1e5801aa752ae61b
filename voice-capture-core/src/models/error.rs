use thiserror::Error;

/// Errors that can occur during capture, analysis, and export.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("microphone access denied")]
    DeviceAccessDenied,

    #[error("no input device available")]
    DeviceUnavailable,

    #[error("a capture session is already active")]
    SessionAlreadyActive,

    #[error("cannot {operation} while {state}")]
    InvalidStateTransition {
        operation: &'static str,
        state: &'static str,
    },

    #[error("capture session was cancelled")]
    Cancelled,

    #[error("timed out waiting for microphone access")]
    Timeout,

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    #[error("input stream failed: {0}")]
    StreamFailed(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl CaptureError {
    /// Whether the error stems from the platform refusing or lacking a device.
    pub fn is_device_error(&self) -> bool {
        matches!(self, Self::DeviceAccessDenied | Self::DeviceUnavailable)
    }
}
