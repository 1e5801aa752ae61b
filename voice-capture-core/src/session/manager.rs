use std::sync::{Arc, Weak};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::models::audio::{CaptureDiagnostics, LevelSample, SessionHandle, StreamFormat};
use crate::models::audio_object::AudioObject;
use crate::models::config::RecorderConfig;
use crate::models::error::CaptureError;
use crate::models::state::CaptureState;
use crate::processing::level_analyzer::LevelAnalyzer;
use crate::processing::pcm_encoder::PcmEncoder;
use crate::processing::wav_format;
use crate::render::render_loop::RenderLoop;
use crate::traits::capture_observer::CaptureObserver;
use crate::traits::encoder::{AudioEncoder, EncoderFactory};
use crate::traits::microphone::{
    AudioBufferCallback, MicrophoneAccess, MicrophoneStream, StreamErrorCallback,
};
use crate::traits::surface::DrawingSurface;

use super::acquire;
use super::pipeline::EncodingPipeline;

/// Resources owned by the one session that may hold the microphone.
struct ActiveSession {
    handle: SessionHandle,
    started_at: Option<Instant>,
    stream: Option<Box<dyn MicrophoneStream>>,
    pipeline: Option<EncodingPipeline>,
    analyzer_generation: Option<u64>,
    render: Option<RenderLoop>,
}

impl ActiveSession {
    fn new(handle: SessionHandle) -> Self {
        Self {
            handle,
            started_at: None,
            stream: None,
            pipeline: None,
            analyzer_generation: None,
            render: None,
        }
    }
}

/// Mutable manager state, protected by `parking_lot::Mutex`.
struct Inner {
    state: CaptureState,
    session: Option<ActiveSession>,
    elapsed: Duration,
    diagnostics: CaptureDiagnostics,
    /// Release of a failed session's device, still running.
    teardown: Option<thread::JoinHandle<()>>,
}

impl Inner {
    fn owns(&self, id: Uuid) -> bool {
        self.session.as_ref().is_some_and(|s| s.handle.id == id)
    }

    fn acquiring(&self, id: Uuid) -> bool {
        self.state == CaptureState::Acquiring && self.owns(id)
    }

    /// Outcome for a `start()` whose session ended before it finished: the
    /// device error if the stream failed during start, otherwise `Cancelled`.
    fn interrupted_start(&self) -> CaptureError {
        match &self.state {
            CaptureState::Failed(error) if self.session.is_none() => error.clone(),
            _ => CaptureError::Cancelled,
        }
    }
}

struct Shared {
    config: RecorderConfig,
    access: Arc<dyn MicrophoneAccess>,
    surface: Option<Arc<dyn DrawingSurface>>,
    observer: Option<Arc<dyn CaptureObserver>>,
    encoder_factory: EncoderFactory,
    analyzer: LevelAnalyzer,
    inner: Mutex<Inner>,
}

/// Mediates the microphone, the encoder, the level analyzer, and the render
/// loop for one capture session at a time.
///
/// ```text
/// start() ─→ [MicrophoneAccess] ─→ stream ─┬→ [LevelAnalyzer] ←─ [RenderLoop] ─→ surface
///                                          └→ [EncodingPipeline] ─→ chunks ─→ stop() ─→ AudioObject
/// ```
///
/// All methods take `&self`; `cancel()` may be called from another thread
/// while `start()` is still waiting on a permission prompt.
pub struct CaptureSessionManager {
    shared: Arc<Shared>,
}

/// Builder for `CaptureSessionManager`.
pub struct CaptureSessionManagerBuilder {
    access: Arc<dyn MicrophoneAccess>,
    config: RecorderConfig,
    surface: Option<Arc<dyn DrawingSurface>>,
    observer: Option<Arc<dyn CaptureObserver>>,
    encoder_factory: Option<EncoderFactory>,
}

impl CaptureSessionManagerBuilder {
    pub fn config(mut self, config: RecorderConfig) -> Self {
        self.config = config;
        self
    }

    /// Draw the level visualization here while recording.
    pub fn surface(mut self, surface: Arc<dyn DrawingSurface>) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn CaptureObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Replace the built-in 16-bit PCM encoder.
    pub fn encoder_factory(mut self, factory: EncoderFactory) -> Self {
        self.encoder_factory = Some(factory);
        self
    }

    pub fn build(self) -> Result<CaptureSessionManager, CaptureError> {
        self.config.validate().map_err(CaptureError::ConfigurationFailed)?;

        let encoder_factory = self.encoder_factory.unwrap_or_else(|| {
            Arc::new(|format: &StreamFormat| Box::new(PcmEncoder::new(format)) as Box<dyn AudioEncoder>)
        });

        Ok(CaptureSessionManager {
            shared: Arc::new(Shared {
                config: self.config,
                access: self.access,
                surface: self.surface,
                observer: self.observer,
                encoder_factory,
                analyzer: LevelAnalyzer::new(),
                inner: Mutex::new(Inner {
                    state: CaptureState::Idle,
                    session: None,
                    elapsed: Duration::ZERO,
                    diagnostics: CaptureDiagnostics::default(),
                    teardown: None,
                }),
            }),
        })
    }
}

impl CaptureSessionManager {
    pub fn builder(access: Arc<dyn MicrophoneAccess>) -> CaptureSessionManagerBuilder {
        CaptureSessionManagerBuilder {
            access,
            config: RecorderConfig::default(),
            surface: None,
            observer: None,
            encoder_factory: None,
        }
    }

    /// Manager with default configuration and no surface or observer.
    pub fn new(access: Arc<dyn MicrophoneAccess>) -> Result<Self, CaptureError> {
        Self::builder(access).build()
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.shared.config
    }

    pub fn state(&self) -> CaptureState {
        self.shared.inner.lock().state.clone()
    }

    /// Current input loudness; 0 unless recording.
    pub fn current_level(&self) -> LevelSample {
        self.shared.analyzer.sample()
    }

    /// Handle for polling levels from elsewhere (e.g., a UI thread).
    pub fn analyzer(&self) -> LevelAnalyzer {
        self.shared.analyzer.clone()
    }

    /// Time since recording began; frozen once the session ends.
    pub fn elapsed_duration(&self) -> Duration {
        let inner = self.shared.inner.lock();
        match (&inner.state, inner.session.as_ref().and_then(|s| s.started_at)) {
            (CaptureState::Recording, Some(started_at)) => started_at.elapsed(),
            _ => inner.elapsed,
        }
    }

    pub fn diagnostics(&self) -> CaptureDiagnostics {
        self.shared.inner.lock().diagnostics.clone()
    }

    /// Whether the render loop is currently drawing.
    pub fn is_rendering(&self) -> bool {
        self.shared
            .inner
            .lock()
            .session
            .as_ref()
            .and_then(|s| s.render.as_ref())
            .is_some_and(RenderLoop::is_running)
    }

    /// Acquire the microphone and begin recording.
    ///
    /// Transitions: idle/terminal → acquiring → recording. Blocks while the
    /// platform asks the user for permission (bounded by
    /// `acquire_timeout_ms` when set). After a runtime failure, also waits
    /// until the failed session's device has been released.
    pub fn start(&self) -> Result<SessionHandle, CaptureError> {
        let shared = &self.shared;
        let (handle, teardown) = {
            let mut inner = shared.inner.lock();
            if inner.state.is_active() {
                return Err(CaptureError::SessionAlreadyActive);
            }
            let handle = SessionHandle::new();
            inner.session = Some(ActiveSession::new(handle.clone()));
            inner.state = CaptureState::Acquiring;
            inner.elapsed = Duration::ZERO;
            inner.diagnostics = CaptureDiagnostics::default();
            (handle, inner.teardown.take())
        };
        shared.notify(&CaptureState::Acquiring);

        if let Some(teardown) = teardown {
            log::debug!("Waiting for the previous device to be released");
            if teardown.join().is_err() {
                log::error!("Teardown thread panicked");
            }
            if !shared.inner.lock().acquiring(handle.id) {
                return Err(CaptureError::Cancelled);
            }
        }
        log::info!("Requesting microphone for session {}", handle.id);

        let acquired = match shared.config.acquire_timeout() {
            Some(timeout) => {
                acquire::request_with_timeout(Arc::clone(&shared.access), shared.config.constraints, timeout)
            }
            None => shared.access.request_microphone(&shared.config.constraints),
        };

        match acquired {
            Ok(stream) => shared.begin_recording(handle, stream),
            Err(error) => Err(shared.abandon_acquire(handle.id, error)),
        }
    }

    /// Stop recording and hand back everything captured as one object.
    ///
    /// Transitions: recording → stopping → stopped. Outside `Recording` this
    /// changes nothing and returns `InvalidStateTransition`.
    pub fn stop(&self) -> Result<AudioObject, CaptureError> {
        let shared = &self.shared;
        let (mut session, elapsed) = {
            let mut inner = shared.inner.lock();
            if !inner.state.is_recording() {
                let error = inner.state.invalid("stop");
                log::warn!("Ignoring stop: {}", error);
                return Err(error);
            }
            let Some(session) = inner.session.take() else {
                let error = inner.state.invalid("stop");
                log::warn!("Ignoring stop: {}", error);
                return Err(error);
            };
            let elapsed = session.started_at.map(|t| t.elapsed()).unwrap_or_default();
            inner.state = CaptureState::Stopping;
            inner.elapsed = elapsed;
            (session, elapsed)
        };
        shared.notify(&CaptureState::Stopping);

        // Silence the device first so nothing lands after the flush.
        if let Some(stream) = session.stream.as_mut() {
            stream.release();
        }
        let result = match session.pipeline.take() {
            Some(pipeline) => pipeline.finish(elapsed),
            None => Err(CaptureError::EncodingFailed("encoding pipeline missing".into())),
        };
        shared.release_session(session);

        let final_state = {
            let mut inner = shared.inner.lock();
            if inner.state != CaptureState::Stopping {
                // cancel() won the race; its outcome stands.
                return Err(CaptureError::Cancelled);
            }
            inner.state = match &result {
                Ok(_) => CaptureState::Stopped,
                Err(error) => CaptureState::Failed(error.clone()),
            };
            inner.state.clone()
        };
        shared.notify(&final_state);

        match &result {
            Ok(audio) => {
                log::info!(
                    "Recording stopped: {:.2}s of audio in {} chunks ({} bytes)",
                    audio.media_duration.as_secs_f64(),
                    audio.chunk_count(),
                    audio.data.len()
                );
                if let Some(observer) = &shared.observer {
                    observer.on_capture_finished(audio);
                }
            }
            Err(error) => log::error!("Failed to finalize recording: {}", error),
        }
        result
    }

    /// Abandon the current session, discarding captured audio.
    ///
    /// Transitions: acquiring/recording/stopping → cancelled. From idle or a
    /// terminal state this changes nothing and returns `InvalidStateTransition`.
    pub fn cancel(&self) -> Result<(), CaptureError> {
        let shared = &self.shared;
        let session = {
            let mut inner = shared.inner.lock();
            if !inner.state.is_active() {
                let error = inner.state.invalid("cancel");
                log::warn!("Ignoring cancel: {}", error);
                return Err(error);
            }
            let session = inner.session.take();
            if let Some(started_at) = session.as_ref().and_then(|s| s.started_at) {
                inner.elapsed = started_at.elapsed();
            }
            inner.state = CaptureState::Cancelled;
            session
        };
        shared.notify(&CaptureState::Cancelled);

        if let Some(session) = session {
            log::info!("Cancelled session {}", session.handle.id);
            shared.release_session(session);
        }
        Ok(())
    }
}

impl Drop for CaptureSessionManager {
    fn drop(&mut self) {
        if self.state().is_active() {
            let _ = self.cancel();
        }
    }
}

impl Shared {
    fn notify(&self, state: &CaptureState) {
        log::debug!("Capture state → {}", state.name());
        if let Some(observer) = &self.observer {
            observer.on_state_changed(state);
        }
    }

    /// Acquisition failed or timed out: return to a clean idle state.
    fn abandon_acquire(&self, id: Uuid, error: CaptureError) -> CaptureError {
        let mut inner = self.inner.lock();
        if !inner.acquiring(id) {
            return CaptureError::Cancelled;
        }
        inner.session = None;
        inner.state = CaptureState::Idle;
        drop(inner);

        if error.is_device_error() {
            log::warn!("Microphone unavailable: {}", error);
        } else {
            log::error!("Microphone acquisition failed: {}", error);
        }
        self.notify(&CaptureState::Idle);
        error
    }

    fn begin_recording(
        self: &Arc<Self>,
        handle: SessionHandle,
        mut stream: Box<dyn MicrophoneStream>,
    ) -> Result<SessionHandle, CaptureError> {
        let id = handle.id;
        let format = stream.format();
        let source = stream.source();

        {
            let mut inner = self.inner.lock();
            if !inner.acquiring(id) {
                drop(inner);
                log::info!("Session {} was cancelled during acquisition; releasing device", id);
                stream.release();
                return Err(CaptureError::Cancelled);
            }
            let generation = self.analyzer.attach(self.config.analyser);
            inner.diagnostics.format = format!("{} Hz, {} ch", format.sample_rate, format.channels);
            if let Some(session) = inner.session.as_mut() {
                session.pipeline = Some(EncodingPipeline::new(&format, &self.config, &self.encoder_factory));
                session.analyzer_generation = Some(generation);
            }
        }

        let (on_data, on_error) = self.callbacks(id);
        if let Err(error) = stream.start(on_data, on_error) {
            stream.release();
            return Err(self.abandon_start(id, error));
        }

        let mut inner = self.inner.lock();
        if !inner.acquiring(id) {
            let outcome = inner.interrupted_start();
            drop(inner);
            log::info!("Session {} ended while the stream started; releasing device", id);
            stream.release();
            return Err(outcome);
        }

        let render = self.surface.as_ref().and_then(|surface| {
            RenderLoop::start(self.analyzer.clone(), Arc::clone(surface), self.config.render)
                .map_err(|e| log::warn!("Recording without visualization: {}", e))
                .ok()
        });
        if let Some(session) = inner.session.as_mut() {
            session.stream = Some(stream);
            session.started_at = Some(Instant::now());
            session.render = render;
        }
        inner.state = CaptureState::Recording;
        drop(inner);

        log::info!("Recording from {} ({} Hz, {} ch)", source.name, format.sample_rate, format.channels);
        self.notify(&CaptureState::Recording);
        Ok(handle)
    }

    /// The device refused to start: undo the partial setup.
    fn abandon_start(&self, id: Uuid, error: CaptureError) -> CaptureError {
        let session = {
            let mut inner = self.inner.lock();
            if !inner.acquiring(id) {
                return inner.interrupted_start();
            }
            inner.state = CaptureState::Idle;
            inner.session.take()
        };
        if let Some(session) = session {
            self.release_session(session);
        }
        log::warn!("Input stream failed to start: {}", error);
        self.notify(&CaptureState::Idle);
        error
    }

    fn callbacks(self: &Arc<Self>, id: Uuid) -> (AudioBufferCallback, StreamErrorCallback) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let on_data: AudioBufferCallback = Arc::new(move |samples: &[f32], sample_rate: f64, channels: u16| {
            if let Some(shared) = weak.upgrade() {
                shared.on_audio(id, samples, sample_rate, channels);
            }
        });

        let weak: Weak<Self> = Arc::downgrade(self);
        let on_error: StreamErrorCallback = Arc::new(move |error: CaptureError| {
            if let Some(shared) = weak.upgrade() {
                shared.fail(id, error);
            }
        });

        (on_data, on_error)
    }

    /// Device callback: meter and encode one buffer.
    fn on_audio(self: &Arc<Self>, id: Uuid, samples: &[f32], sample_rate: f64, channels: u16) {
        let mono = wav_format::downmix_to_mono(samples, channels.max(1) as usize);

        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        inner.diagnostics.callback_count += 1;

        let accepting = matches!(inner.state, CaptureState::Acquiring | CaptureState::Recording) && inner.owns(id);
        let pushed = match inner.session.as_mut().and_then(|s| s.pipeline.as_mut()) {
            Some(pipeline) if accepting => {
                self.analyzer.process(&mono);
                pipeline.push(&mono, sample_rate)
            }
            _ => {
                inner.diagnostics.dropped_callbacks += 1;
                return;
            }
        };

        match pushed {
            Ok(outcome) => {
                inner.diagnostics.frames_captured += outcome.frames;
                inner.diagnostics.chunks_emitted += outcome.chunks;
                inner.diagnostics.bytes_encoded += outcome.bytes;
            }
            Err(error) => {
                drop(guard);
                self.fail(id, error);
            }
        }
    }

    /// Runtime failure while recording: move to `Failed` and free everything.
    ///
    /// May run on the device thread, so the stream itself is released from a
    /// separate teardown thread. The next `start()` joins it before asking
    /// for a device again.
    fn fail(self: &Arc<Self>, id: Uuid, error: CaptureError) {
        let mut session = {
            let mut inner = self.inner.lock();
            if !inner.state.is_active() || !inner.owns(id) {
                return;
            }
            let Some(mut session) = inner.session.take() else {
                return;
            };
            if let Some(started_at) = session.started_at {
                inner.elapsed = started_at.elapsed();
            }
            if let Some(mut stream) = session.stream.take() {
                let spawned = thread::Builder::new()
                    .name("capture-teardown".into())
                    .spawn(move || stream.release());
                match spawned {
                    Ok(handle) => inner.teardown = Some(handle),
                    Err(e) => log::error!("Failed to spawn teardown thread, stream dropped with it: {}", e),
                }
            }
            inner.state = CaptureState::Failed(error.clone());
            session
        };

        log::error!("Recording failed: {}", error);
        if let Some(generation) = session.analyzer_generation.take() {
            self.analyzer.detach_generation(generation);
        }
        if let Some(render) = session.render.as_mut() {
            render.stop();
        }
        self.notify(&CaptureState::Failed(error.clone()));
        if let Some(observer) = &self.observer {
            observer.on_error(&error);
        }
    }

    /// Release the device, the analysis graph, and the render loop.
    fn release_session(&self, mut session: ActiveSession) {
        if let Some(stream) = session.stream.as_mut() {
            stream.release();
        }
        if let Some(generation) = session.analyzer_generation.take() {
            self.analyzer.detach_generation(generation);
        }
        if let Some(render) = session.render.as_mut() {
            render.stop();
        }
    }
}
