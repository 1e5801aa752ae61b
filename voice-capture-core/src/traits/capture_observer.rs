use crate::models::audio_object::AudioObject;
use crate::models::error::CaptureError;
use crate::models::state::CaptureState;

/// Optional listener for capture session notifications.
///
/// Results are also returned from the manager's methods; the observer exists
/// for failures that happen on a device thread, where there is no caller to
/// return to. Methods may be called from any thread, including the device's
/// own callback thread, so they must not call `start()`: it waits for a failed
/// device to be released, and that can need the thread it was called on.
pub trait CaptureObserver: Send + Sync {
    /// Called after every state change.
    fn on_state_changed(&self, state: &CaptureState);

    /// Called when a device or encoder error ends a session.
    fn on_error(&self, error: &CaptureError);

    /// Called once a stopped session has produced its audio object.
    fn on_capture_finished(&self, _audio: &AudioObject) {}
}
