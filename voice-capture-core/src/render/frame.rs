use std::time::Duration;

use crate::models::audio::LevelSample;
use crate::models::config::BarLayout;

/// Phase offset between neighbouring bars, in radians.
const BAR_PHASE_STEP: f32 = 0.2;
/// Oscillation speed, in radians per millisecond.
const BAR_ANGULAR_SPEED: f32 = 0.005;

/// One filled rectangle, origin at the top-left of the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Drawing instructions for one instant of the "dancing bars" display.
///
/// The bars are not a spectrum: each one is a phase-shifted sine scaled by
/// the current level, so the display shows the mic reacting rather than
/// what it hears.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualizationFrame {
    pub width: f32,
    pub height: f32,
    pub level: LevelSample,
    pub bars: Vec<Bar>,
}

impl VisualizationFrame {
    /// Compute the frame for `level` at local animation time `elapsed`.
    ///
    /// Bar `i` has height `(sin(0.2 i + 0.005 t_ms) + 1) * max * level/100 * 0.5`
    /// and sits on the bottom edge.
    pub fn compute(layout: &BarLayout, level: LevelSample, elapsed: Duration) -> Self {
        let t_ms = elapsed.as_secs_f64() * 1000.0;
        let max_height = layout.max_bar_height();
        let stride = layout.bar_width + layout.bar_spacing;

        let bars = (0..layout.bar_count())
            .map(|i| {
                let phase = (i as f64 * BAR_PHASE_STEP as f64 + t_ms * BAR_ANGULAR_SPEED as f64) as f32;
                let height = (phase.sin() + 1.0) * max_height * level.fraction() * 0.5;
                Bar {
                    x: i as f32 * stride,
                    y: layout.height - height,
                    width: layout.bar_width,
                    height,
                }
            })
            .collect();

        Self {
            width: layout.width,
            height: layout.height,
            level,
            bars,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.bars.iter().all(|b| b.height == 0.0)
    }
}
