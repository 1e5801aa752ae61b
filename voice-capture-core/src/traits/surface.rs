use crate::render::frame::VisualizationFrame;

/// Host drawing target for the level visualization.
///
/// Called from the render thread; implementations marshal to their UI
/// thread if they need to.
pub trait DrawingSurface: Send + Sync {
    /// Replace the current picture with `frame`.
    fn draw(&self, frame: &VisualizationFrame);

    /// Blank the surface. Called once when the render loop stops.
    fn clear(&self) {}
}
