use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::audio::LevelSample;
use crate::models::config::AnalyserOptions;

use super::analyser::AnalysisGraph;

struct Attached {
    generation: u64,
    graph: AnalysisGraph,
}

/// Cloneable handle that turns the live input into a 0–100 loudness value.
///
/// The device thread calls `process`; UI and render threads call `sample`,
/// which only reads the last published value. With no graph attached every
/// reading is 0.
#[derive(Clone, Default)]
pub struct LevelAnalyzer {
    attached: Arc<Mutex<Option<Attached>>>,
    level_bits: Arc<AtomicU32>,
    generations: Arc<AtomicU64>,
}

impl LevelAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a fresh analysis graph, replacing any previous one.
    ///
    /// Returns the attachment's generation for `detach_generation`.
    pub fn attach(&self, options: AnalyserOptions) -> u64 {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        *self.attached.lock() = Some(Attached {
            generation,
            graph: AnalysisGraph::new(options),
        });
        self.publish(0.0);
        generation
    }

    /// Drop the analysis graph. Subsequent samples read 0.
    pub fn detach(&self) {
        let mut attached = self.attached.lock();
        *attached = None;
        self.publish(0.0);
    }

    /// Detach only if `generation` is still the installed graph.
    pub fn detach_generation(&self, generation: u64) {
        let mut attached = self.attached.lock();
        if attached.as_ref().is_some_and(|a| a.generation == generation) {
            *attached = None;
            self.publish(0.0);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached.lock().is_some()
    }

    /// Feed mono samples from the live stream. No-op while detached.
    pub fn process(&self, samples: &[f32]) {
        let mut attached = self.attached.lock();
        if let Some(a) = attached.as_mut() {
            a.graph.process(samples);
            self.publish(a.graph.level());
        }
    }

    /// Most recent loudness reading.
    pub fn sample(&self) -> LevelSample {
        LevelSample::new(f32::from_bits(self.level_bits.load(Ordering::Acquire)))
    }

    /// Copy of the latest per-bin magnitudes (empty while detached).
    pub fn frequency_data(&self) -> Vec<u8> {
        self.attached
            .lock()
            .as_ref()
            .map(|a| a.graph.frequency_data().to_vec())
            .unwrap_or_default()
    }

    fn publish(&self, level: f32) {
        self.level_bits.store(level.to_bits(), Ordering::Release);
    }
}
