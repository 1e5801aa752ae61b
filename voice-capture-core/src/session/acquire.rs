use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::models::config::AudioConstraints;
use crate::models::error::CaptureError;
use crate::traits::microphone::{MicrophoneAccess, MicrophoneStream};

type Acquired = Result<Box<dyn MicrophoneStream>, CaptureError>;

enum Slot {
    Waiting,
    Done(Acquired),
    Abandoned,
}

struct Handoff {
    slot: Mutex<Slot>,
    ready: Condvar,
}

/// Request the microphone on a helper thread and wait at most `timeout`.
///
/// If the caller gives up first, a device granted later is released by the
/// helper as soon as it arrives.
pub(crate) fn request_with_timeout(
    access: Arc<dyn MicrophoneAccess>,
    constraints: AudioConstraints,
    timeout: Duration,
) -> Acquired {
    let handoff = Arc::new(Handoff {
        slot: Mutex::new(Slot::Waiting),
        ready: Condvar::new(),
    });

    let producer = Arc::clone(&handoff);
    thread::Builder::new()
        .name("mic-acquire".into())
        .spawn(move || {
            let result = access.request_microphone(&constraints);

            let mut slot = producer.slot.lock();
            if matches!(*slot, Slot::Abandoned) {
                drop(slot);
                if let Ok(mut stream) = result {
                    log::warn!("Microphone granted after the request timed out; releasing it");
                    stream.release();
                }
                return;
            }
            *slot = Slot::Done(result);
            producer.ready.notify_one();
        })
        .map_err(|e| CaptureError::Unknown(format!("failed to spawn acquisition thread: {}", e)))?;

    let deadline = Instant::now() + timeout;
    let mut slot = handoff.slot.lock();
    while matches!(*slot, Slot::Waiting) {
        if handoff.ready.wait_until(&mut slot, deadline).timed_out() {
            break;
        }
    }

    match std::mem::replace(&mut *slot, Slot::Abandoned) {
        Slot::Done(result) => result,
        _ => Err(CaptureError::Timeout),
    }
}
