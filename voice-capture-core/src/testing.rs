//! Scripted fakes for the device, encoder, surface, and observer seams.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::models::audio::{AudioSource, StreamFormat};
use crate::models::audio_object::AudioObject;
use crate::models::config::AudioConstraints;
use crate::models::error::CaptureError;
use crate::models::state::CaptureState;
use crate::render::frame::VisualizationFrame;
use crate::traits::capture_observer::CaptureObserver;
use crate::traits::encoder::AudioEncoder;
use crate::traits::microphone::{
    AudioBufferCallback, MicrophoneAccess, MicrophoneStream, StreamErrorCallback,
};
use crate::traits::surface::DrawingSurface;

fn poll_until(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    done()
}

/// Devices granted and not yet released, across every stream of one fake.
#[derive(Default)]
struct HeldDevices {
    current: AtomicUsize,
    max: AtomicUsize,
}

impl HeldDevices {
    fn acquire(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
    }

    fn release(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Test-side view of a stream handed out by `FakeMicrophone`.
pub(crate) struct FakeDevice {
    format: StreamFormat,
    callbacks: Mutex<Option<(AudioBufferCallback, StreamErrorCallback)>>,
    started: AtomicBool,
    released: AtomicBool,
    held: Arc<HeldDevices>,
}

impl FakeDevice {
    fn new(format: StreamFormat, held: Arc<HeldDevices>) -> Self {
        held.acquire();
        Self {
            format,
            callbacks: Mutex::new(None),
            started: AtomicBool::new(false),
            released: AtomicBool::new(false),
            held,
        }
    }

    /// Deliver one buffer as the device would. False if nobody is listening.
    pub fn feed(&self, samples: &[f32]) -> bool {
        let on_data = self.callbacks.lock().as_ref().map(|(on_data, _)| Arc::clone(on_data));
        match on_data {
            Some(on_data) => {
                on_data(samples, self.format.sample_rate, self.format.channels);
                true
            }
            None => false,
        }
    }

    /// Deliver `ms` milliseconds of constant-valued audio.
    pub fn feed_ms(&self, ms: u64, value: f32) -> bool {
        let frames = (self.format.sample_rate * ms as f64 / 1000.0).round() as usize;
        self.feed(&vec![value; frames * self.format.channels as usize])
    }

    /// Report a runtime device failure.
    pub fn fail(&self, error: CaptureError) {
        let on_error = self.callbacks.lock().as_ref().map(|(_, on_error)| Arc::clone(on_error));
        if let Some(on_error) = on_error {
            on_error(error);
        }
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    pub fn wait_for_release(&self, timeout: Duration) -> bool {
        poll_until(timeout, || self.is_released())
    }
}

struct FakeStream {
    device: Arc<FakeDevice>,
    fail_start: Option<CaptureError>,
    error_on_start: Option<CaptureError>,
    release_delay: Duration,
}

impl MicrophoneStream for FakeStream {
    fn format(&self) -> StreamFormat {
        self.device.format
    }

    fn source(&self) -> AudioSource {
        AudioSource {
            id: "fake-mic".into(),
            name: "Fake Microphone".into(),
            is_default: true,
            transport_type: None,
        }
    }

    fn start(&mut self, on_data: AudioBufferCallback, on_error: StreamErrorCallback) -> Result<(), CaptureError> {
        if let Some(error) = self.fail_start.clone() {
            return Err(error);
        }
        *self.device.callbacks.lock() = Some((on_data, Arc::clone(&on_error)));
        self.device.started.store(true, Ordering::SeqCst);
        if let Some(error) = self.error_on_start.clone() {
            on_error(error);
        }
        Ok(())
    }

    fn release(&mut self) {
        if self.device.is_released() {
            return;
        }
        thread::sleep(self.release_delay);
        self.device.callbacks.lock().take();
        self.device.released.store(true, Ordering::SeqCst);
        self.device.held.release();
    }
}

impl Drop for FakeStream {
    fn drop(&mut self) {
        self.release();
    }
}

/// Blocks `request_microphone` until opened, like a pending permission prompt.
#[derive(Default)]
pub(crate) struct Gate {
    open: Mutex<bool>,
    opened: Condvar,
    waiting: AtomicBool,
}

impl Gate {
    pub fn open(&self) {
        *self.open.lock() = true;
        self.opened.notify_all();
    }

    /// Wait until a request is parked on the gate.
    pub fn wait_until_requested(&self, timeout: Duration) -> bool {
        poll_until(timeout, || self.waiting.load(Ordering::SeqCst))
    }

    fn pass(&self) {
        self.waiting.store(true, Ordering::SeqCst);
        let mut open = self.open.lock();
        while !*open {
            self.opened.wait(&mut open);
        }
    }
}

enum Behavior {
    Grant(StreamFormat),
    Deny,
    Unavailable,
}

pub(crate) struct FakeMicrophone {
    behavior: Behavior,
    gate: Option<Arc<Gate>>,
    fail_start: Option<CaptureError>,
    error_on_start: Option<CaptureError>,
    release_delay: Duration,
    held: Arc<HeldDevices>,
    requests: AtomicUsize,
    last_constraints: Mutex<Option<AudioConstraints>>,
    devices: Mutex<Vec<Arc<FakeDevice>>>,
}

impl FakeMicrophone {
    fn with(behavior: Behavior) -> Self {
        Self {
            behavior,
            gate: None,
            fail_start: None,
            error_on_start: None,
            release_delay: Duration::ZERO,
            held: Arc::new(HeldDevices::default()),
            requests: AtomicUsize::new(0),
            last_constraints: Mutex::new(None),
            devices: Mutex::new(Vec::new()),
        }
    }

    pub fn granting(sample_rate: f64, channels: u16) -> Self {
        Self::with(Behavior::Grant(StreamFormat { sample_rate, channels }))
    }

    pub fn denying() -> Self {
        Self::with(Behavior::Deny)
    }

    pub fn unavailable() -> Self {
        Self::with(Behavior::Unavailable)
    }

    /// Grants only after the returned gate is opened.
    pub fn gated(sample_rate: f64, channels: u16) -> (Self, Arc<Gate>) {
        let gate = Arc::new(Gate::default());
        let mut mic = Self::granting(sample_rate, channels);
        mic.gate = Some(Arc::clone(&gate));
        (mic, gate)
    }

    /// Grants a stream whose `start` fails.
    pub fn failing_start(sample_rate: f64, channels: u16, error: CaptureError) -> Self {
        let mut mic = Self::granting(sample_rate, channels);
        mic.fail_start = Some(error);
        mic
    }

    /// Grants a stream that reports `error` from inside `start`.
    pub fn erroring_on_start(sample_rate: f64, channels: u16, error: CaptureError) -> Self {
        let mut mic = Self::granting(sample_rate, channels);
        mic.error_on_start = Some(error);
        mic
    }

    /// Make every `release` take `delay`, like hardware that stops slowly.
    pub fn with_release_delay(mut self, delay: Duration) -> Self {
        self.release_delay = delay;
        self
    }

    /// Most devices held at the same time so far.
    pub fn max_held(&self) -> usize {
        self.held.max.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn last_constraints(&self) -> Option<AudioConstraints> {
        *self.last_constraints.lock()
    }

    pub fn last_stream(&self) -> Option<Arc<FakeDevice>> {
        self.devices.lock().last().cloned()
    }

    pub fn wait_for_stream(&self, timeout: Duration) -> Option<Arc<FakeDevice>> {
        poll_until(timeout, || self.last_stream().is_some());
        self.last_stream()
    }
}

impl MicrophoneAccess for FakeMicrophone {
    fn request_microphone(&self, constraints: &AudioConstraints) -> Result<Box<dyn MicrophoneStream>, CaptureError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        *self.last_constraints.lock() = Some(*constraints);
        if let Some(gate) = &self.gate {
            gate.pass();
        }

        match &self.behavior {
            Behavior::Grant(format) => {
                let device = Arc::new(FakeDevice::new(*format, Arc::clone(&self.held)));
                self.devices.lock().push(Arc::clone(&device));
                Ok(Box::new(FakeStream {
                    device,
                    fail_start: self.fail_start.clone(),
                    error_on_start: self.error_on_start.clone(),
                    release_delay: self.release_delay,
                }))
            }
            Behavior::Deny => Err(CaptureError::DeviceAccessDenied),
            Behavior::Unavailable => Err(CaptureError::DeviceUnavailable),
        }
    }
}

/// Encoder that fails on the `fail_at`-th slice (1-based).
pub(crate) struct FailingEncoder {
    pub fail_at: usize,
    pub calls: usize,
}

impl AudioEncoder for FailingEncoder {
    fn mime_type(&self) -> String {
        "application/x-test".into()
    }

    fn encode(&mut self, samples: &[f32]) -> Result<Vec<u8>, CaptureError> {
        self.calls += 1;
        if self.calls >= self.fail_at {
            return Err(CaptureError::EncodingFailed("codec exploded".into()));
        }
        Ok(vec![0; samples.len()])
    }

    fn flush(&mut self) -> Result<Vec<u8>, CaptureError> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
pub(crate) struct RecordingSurface {
    drawn: Mutex<(usize, Option<VisualizationFrame>)>,
    clears: AtomicUsize,
}

impl RecordingSurface {
    pub fn draws(&self) -> usize {
        self.drawn.lock().0
    }

    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    pub fn last_frame(&self) -> Option<VisualizationFrame> {
        self.drawn.lock().1.clone()
    }

    pub fn wait_for_draws(&self, count: usize, timeout: Duration) -> bool {
        poll_until(timeout, || self.draws() >= count)
    }
}

impl DrawingSurface for RecordingSurface {
    fn draw(&self, frame: &VisualizationFrame) {
        let mut drawn = self.drawn.lock();
        drawn.0 += 1;
        drawn.1 = Some(frame.clone());
    }

    fn clear(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub(crate) struct RecordingObserver {
    states: Mutex<Vec<CaptureState>>,
    errors: Mutex<Vec<CaptureError>>,
    finished: Mutex<Vec<AudioObject>>,
}

impl RecordingObserver {
    pub fn states(&self) -> Vec<CaptureState> {
        self.states.lock().clone()
    }

    pub fn errors(&self) -> Vec<CaptureError> {
        self.errors.lock().clone()
    }

    pub fn finished(&self) -> usize {
        self.finished.lock().len()
    }
}

impl CaptureObserver for RecordingObserver {
    fn on_state_changed(&self, state: &CaptureState) {
        self.states.lock().push(state.clone());
    }

    fn on_error(&self, error: &CaptureError) {
        self.errors.lock().push(error.clone());
    }

    fn on_capture_finished(&self, audio: &AudioObject) {
        self.finished.lock().push(audio.clone());
    }
}
