use tracing::{debug, warn};

use crate::graphics::Graphics;
use crate::types::{SurfaceSize, Viewport};

/// Keeps the surface resolution in step with the viewport.
#[derive(Debug, Default)]
pub(crate) struct SurfaceManager {
    current: Option<SurfaceSize>,
}

impl SurfaceManager {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Size last applied to the surface.
    pub(crate) fn current(&self) -> Option<SurfaceSize> {
        self.current
    }

    /// Resizes the surface to `viewport_size` and points the context viewport
    /// at the whole of it. Returns the size in effect afterwards.
    pub(crate) fn sync<G: Graphics>(
        &mut self,
        graphics: &mut G,
        viewport_size: SurfaceSize,
    ) -> Option<SurfaceSize> {
        if viewport_size.is_empty() {
            debug!(size = %viewport_size, "ignoring empty viewport");
            return self.current;
        }

        let max_dimension = graphics.max_surface_dimension();
        let size = SurfaceSize::new(
            viewport_size.width.min(max_dimension),
            viewport_size.height.min(max_dimension),
        );
        if size != viewport_size {
            warn!(
                requested = %viewport_size,
                clamped = %size,
                max_dimension,
                "viewport exceeds GPU max texture dimension; clamping surface"
            );
        }

        graphics.resize_surface(size);
        graphics.set_viewport(Viewport::covering(size));
        self.current = Some(size);
        debug!(size = %size, "surface synced to viewport");
        Some(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::testing::{Call, RecordingGraphics};

    #[test]
    fn surface_and_viewport_follow_every_size() {
        for (width, height) in [(1, 1), (800, 600), (1024, 768), (3840, 2160), (7, 4000)] {
            let mut graphics = RecordingGraphics::default();
            let mut manager = SurfaceManager::new();
            let size = SurfaceSize::new(width, height);

            assert_eq!(manager.sync(&mut graphics, size), Some(size));
            assert_eq!(graphics.surface_size(), size);
            assert_eq!(
                graphics.calls,
                vec![
                    Call::ResizeSurface(size),
                    Call::SetViewport(Viewport::covering(size)),
                ]
            );
        }
    }

    #[test]
    fn empty_viewport_keeps_previous_size() {
        let mut graphics = RecordingGraphics::default();
        let mut manager = SurfaceManager::new();
        manager.sync(&mut graphics, SurfaceSize::new(640, 480));
        graphics.calls.clear();

        let kept = manager.sync(&mut graphics, SurfaceSize::new(0, 480));
        assert_eq!(kept, Some(SurfaceSize::new(640, 480)));
        assert!(graphics.calls.is_empty());
    }

    #[test]
    fn oversized_viewport_is_clamped() {
        let mut graphics = RecordingGraphics {
            max_dimension: 4096,
            ..RecordingGraphics::default()
        };
        let mut manager = SurfaceManager::new();
        let applied = manager.sync(&mut graphics, SurfaceSize::new(5120, 1440));
        assert_eq!(applied, Some(SurfaceSize::new(4096, 1440)));
        assert_eq!(manager.current(), Some(SurfaceSize::new(4096, 1440)));
    }
}
