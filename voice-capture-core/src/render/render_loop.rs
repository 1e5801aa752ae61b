use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crate::models::config::RenderOptions;
use crate::models::error::CaptureError;
use crate::processing::level_analyzer::LevelAnalyzer;
use crate::traits::surface::DrawingSurface;

use super::frame::VisualizationFrame;

/// Redraws the level visualization once per frame interval on a dedicated
/// thread, for as long as it is running.
///
/// ```text
/// stopped ──start()──→ running ──stop()/drop──→ stopped
/// ```
/// `stop()` joins the thread before returning, so once it returns no draw
/// is in flight and none will follow.
pub struct RenderLoop {
    running: Arc<AtomicBool>,
    frames_drawn: Arc<AtomicU64>,
    surface: Arc<dyn DrawingSurface>,
    handle: Option<thread::JoinHandle<()>>,
}

impl RenderLoop {
    pub fn start(
        analyzer: LevelAnalyzer,
        surface: Arc<dyn DrawingSurface>,
        options: RenderOptions,
    ) -> Result<Self, CaptureError> {
        let running = Arc::new(AtomicBool::new(true));
        let frames_drawn = Arc::new(AtomicU64::new(0));

        let thread_running = Arc::clone(&running);
        let thread_frames = Arc::clone(&frames_drawn);
        let thread_surface = Arc::clone(&surface);
        let interval = options.frame_interval();
        let layout = options.layout;

        let handle = thread::Builder::new()
            .name("render-loop".into())
            .spawn(move || {
                let began = Instant::now();
                while thread_running.load(Ordering::SeqCst) {
                    let frame = VisualizationFrame::compute(&layout, analyzer.sample(), began.elapsed());

                    // stop() may have landed while the frame was computed.
                    if !thread_running.load(Ordering::SeqCst) {
                        break;
                    }
                    thread_surface.draw(&frame);
                    thread_frames.fetch_add(1, Ordering::Relaxed);

                    thread::park_timeout(interval);
                }
            })
            .map_err(|e| CaptureError::Unknown(format!("failed to spawn render thread: {}", e)))?;

        log::debug!("Render loop started ({} ms interval)", options.frame_interval_ms);

        Ok(Self {
            running,
            frames_drawn,
            surface,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some() && self.running.load(Ordering::SeqCst)
    }

    /// Number of frames handed to the surface so far.
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn.load(Ordering::Relaxed)
    }

    /// Cancel the pending tick, wait for the thread, then blank the surface.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        self.running.store(false, Ordering::SeqCst);
        handle.thread().unpark();
        if handle.join().is_err() {
            log::error!("Render thread panicked");
        }
        self.surface.clear();

        log::debug!("Render loop stopped after {} frames", self.frames_drawn());
    }
}

impl Drop for RenderLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
