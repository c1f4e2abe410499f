use crate::geometry::{PixelPosition, PixelSize};

/// Read-only view of whatever is looking at the world.
pub trait Camera {
    /// Top-left corner of the view in pixel space.
    fn position(&self) -> PixelPosition;
    fn size(&self) -> PixelSize;
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Camera2D {
    pub position: PixelPosition,
    pub size: PixelSize,
}

impl Camera2D {
    pub fn new(position: PixelPosition, size: PixelSize) -> Self {
        Self { position, size }
    }

    pub fn center_on(&mut self, target: PixelPosition) {
        self.position = PixelPosition {
            x: target.x - self.size.width as f32 * 0.5,
            y: target.y - self.size.height as f32 * 0.5,
        };
    }

    /// Keeps the view inside `[0, map)` on each axis. When the map is
    /// smaller than the view along an axis the camera is pinned to 0.
    pub fn clamp_within(&mut self, map: PixelSize) {
        self.position.x = clamp_axis(self.position.x, self.size.width, map.width);
        self.position.y = clamp_axis(self.position.y, self.size.height, map.height);
    }
}

impl Camera for Camera2D {
    fn position(&self) -> PixelPosition {
        self.position
    }

    fn size(&self) -> PixelSize {
        self.size
    }
}

fn clamp_axis(value: f32, view: u32, map: u32) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    let max = map.saturating_sub(view) as f32;
    value.clamp(0.0, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_on_offsets_by_half_the_view() {
        let mut camera = Camera2D::new(PixelPosition::default(), PixelSize::new(100, 50));
        camera.center_on(PixelPosition::new(200.0, 100.0));
        assert_eq!(camera.position, PixelPosition::new(150.0, 75.0));
    }

    #[test]
    fn clamp_within_keeps_view_inside_map() {
        let mut camera = Camera2D::new(PixelPosition::new(-20.0, 900.0), PixelSize::new(100, 100));
        camera.clamp_within(PixelSize::new(640, 640));
        assert_eq!(camera.position, PixelPosition::new(0.0, 540.0));
    }

    #[test]
    fn clamp_within_pins_to_origin_when_map_is_smaller_than_view() {
        let mut camera = Camera2D::new(PixelPosition::new(30.0, f32::NAN), PixelSize::new(800, 600));
        camera.clamp_within(PixelSize::new(320, 320));
        assert_eq!(camera.position, PixelPosition::new(0.0, 0.0));
    }
}
