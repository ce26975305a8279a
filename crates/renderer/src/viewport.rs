use winit::dpi::{LogicalSize, PhysicalSize};

/// Default side of the square canvas in logical pixels.
pub const DEFAULT_LOGICAL_SIDE: u32 = 1000;

/// Physical sizing and aspect ratios resolved for one preview surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportFrame {
    /// Backing store size in physical pixels.
    pub backing: PhysicalSize<u32>,
    /// Aspect ratio of the canvas itself. The canvas is a square, so
    /// this is always 1.
    pub canvas_ratio: f32,
    /// Aspect ratio of the extracted field raster.
    pub image_ratio: f32,
}

/// Maps the fixed logical canvas onto physical pixels.
///
/// The canvas never tracks window geometry; it is a logical square whose
/// backing store scales with the display's scale factor. Resolving twice
/// for the same inputs yields the same frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportCoordinator {
    logical_side: u32,
}

impl Default for ViewportCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_LOGICAL_SIDE)
    }
}

impl ViewportCoordinator {
    pub fn new(logical_side: u32) -> Self {
        Self {
            logical_side: logical_side.max(1),
        }
    }

    pub fn logical_side(&self) -> u32 {
        self.logical_side
    }

    /// Logical window size handed to the windowing system.
    pub fn logical_size(&self) -> LogicalSize<f64> {
        LogicalSize::new(f64::from(self.logical_side), f64::from(self.logical_side))
    }

    /// Physical backing size for the given display scale factor.
    pub fn backing_size(&self, scale_factor: f64) -> PhysicalSize<u32> {
        let side = (f64::from(self.logical_side) * scale_factor).round().max(1.0) as u32;
        PhysicalSize::new(side, side)
    }

    /// Resolves the full frame for a scale factor and field raster size.
    pub fn resolve(&self, scale_factor: f64, image_width: u32, image_height: u32) -> ViewportFrame {
        ViewportFrame {
            backing: self.backing_size(scale_factor),
            canvas_ratio: 1.0,
            image_ratio: image_width.max(1) as f32 / image_height.max(1) as f32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backing_store_is_square_at_scale_one() {
        let frame = ViewportCoordinator::default().resolve(1.0, 800, 600);
        assert_eq!(frame.backing, PhysicalSize::new(1000, 1000));
        assert_eq!(frame.canvas_ratio, 1.0);
    }

    #[test]
    fn hidpi_scale_multiplies_the_backing_store() {
        let coordinator = ViewportCoordinator::new(1000);
        assert_eq!(coordinator.backing_size(2.0), PhysicalSize::new(2000, 2000));
        assert_eq!(coordinator.backing_size(1.5), PhysicalSize::new(1500, 1500));
    }

    #[test]
    fn resolve_is_idempotent() {
        let coordinator = ViewportCoordinator::new(640);
        let first = coordinator.resolve(1.25, 1000, 500);
        let second = coordinator.resolve(1.25, 1000, 500);
        assert_eq!(first, second);
        assert_eq!(first.image_ratio, 2.0);
    }

    #[test]
    fn canvas_stays_square_for_any_image_shape() {
        let coordinator = ViewportCoordinator::new(512);
        let tall = coordinator.resolve(1.0, 500, 1000);
        let wide = coordinator.resolve(1.0, 1000, 200);
        assert_eq!(tall.canvas_ratio, 1.0);
        assert_eq!(wide.canvas_ratio, 1.0);
        assert_eq!(tall.backing, wide.backing);
    }

    #[test]
    fn degenerate_inputs_are_clamped() {
        let coordinator = ViewportCoordinator::new(0);
        assert_eq!(coordinator.logical_side(), 1);
        let frame = coordinator.resolve(1.0, 0, 0);
        assert_eq!(frame.backing, PhysicalSize::new(1, 1));
        assert_eq!(frame.image_ratio, 1.0);
    }
}
