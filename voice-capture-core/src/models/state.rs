use super::error::CaptureError;

/// Capture session state machine.
///
/// State transitions:
/// ```text
/// idle → acquiring → recording → stopping → stopped
///            │           │           │
///            └───────────┴───────────┴─→ cancelled / failed
/// ```
/// Terminal states may start a new session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Acquiring,
    Recording,
    Stopping,
    Stopped,
    Cancelled,
    Failed(CaptureError),
}

impl CaptureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    /// Acquiring, recording, or stopping: a device may be held.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Acquiring | Self::Recording | Self::Stopping)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::Cancelled | Self::Failed(_))
    }

    /// Short lowercase name used in errors and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Acquiring => "acquiring",
            Self::Recording => "recording",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Cancelled => "cancelled",
            Self::Failed(_) => "failed",
        }
    }

    pub(crate) fn invalid(&self, operation: &'static str) -> CaptureError {
        CaptureError::InvalidStateTransition {
            operation,
            state: self.name(),
        }
    }
}
