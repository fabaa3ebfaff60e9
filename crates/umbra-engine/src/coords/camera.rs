use super::{Rect, Vec2, Viewport};

/// Pan/zoom of the zone view.
///
/// `screen = model * scale + pan`, with `pan` in physical pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ZoneCamera {
    pub pan: Vec2,
    pub scale: f32,
}

impl Default for ZoneCamera {
    fn default() -> Self {
        Self { pan: Vec2::zero(), scale: 1.0 }
    }
}

impl ZoneCamera {
    /// Smallest and largest zoom the camera accepts.
    pub const MIN_SCALE: f32 = 0.05;
    pub const MAX_SCALE: f32 = 32.0;

    #[inline]
    pub fn new(pan: Vec2, scale: f32) -> Self {
        Self { pan, scale: scale.clamp(Self::MIN_SCALE, Self::MAX_SCALE) }
    }

    #[inline]
    pub fn model_to_screen(self, p: Vec2) -> Vec2 {
        p * self.scale + self.pan
    }

    #[inline]
    pub fn screen_to_model(self, p: Vec2) -> Vec2 {
        (p - self.pan) / self.scale
    }

    /// Size of one screen pixel measured in model units.
    ///
    /// Used to keep line widths and arc tolerances constant on screen.
    #[inline]
    pub fn pixel_size(self) -> f32 {
        1.0 / self.scale
    }

    /// Model-space rectangle covered by `viewport` (top-left origin).
    pub fn visible_bounds(self, viewport: Viewport) -> Rect {
        let min = self.screen_to_model(Vec2::zero());
        let max = self.screen_to_model(Vec2::new(viewport.width as f32, viewport.height as f32));
        Rect::from_min_max(min, max)
    }

    /// Zooms around a fixed screen point (typically the cursor).
    pub fn zoom_at(&mut self, screen_anchor: Vec2, factor: f32) {
        let anchor_model = self.screen_to_model(screen_anchor);
        self.scale = (self.scale * factor).clamp(Self::MIN_SCALE, Self::MAX_SCALE);
        self.pan = screen_anchor - anchor_model * self.scale;
    }

    #[inline]
    pub fn projection(self) -> Projection {
        Projection { scale: self.scale, translate: self.pan }
    }
}

/// Render space (y-up) → screen pixels (y-down).
///
/// `screen.x = x * scale + translate.x`, `screen.y = -y * scale + translate.y`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Projection {
    pub scale: f32,
    pub translate: Vec2,
}

impl Default for Projection {
    fn default() -> Self {
        Self::screen()
    }
}

impl Projection {
    /// Identity pixel mapping: render point `(x, -y)` lands on pixel `(x, y)`.
    #[inline]
    pub const fn screen() -> Self {
        Self { scale: 1.0, translate: Vec2::new(0.0, 0.0) }
    }

    #[inline]
    pub fn apply(self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x * self.scale + self.translate.x,
            -p.y * self.scale + self.translate.y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_matches_camera_for_flipped_points() {
        let camera = ZoneCamera::new(Vec2::new(40.0, -12.0), 2.5);
        let model = Vec2::new(7.0, 3.0);
        let via_camera = camera.model_to_screen(model);
        let via_projection = camera.projection().apply(model.flip_y());
        assert!((via_camera - via_projection).length() < 1e-5);
    }

    #[test]
    fn visible_bounds_cover_viewport() {
        let camera = ZoneCamera::new(Vec2::new(100.0, 50.0), 2.0);
        let bounds = camera.visible_bounds(Viewport::new(800, 600));
        assert_eq!(bounds.origin, Vec2::new(-50.0, -25.0));
        assert_eq!(bounds.size, Vec2::new(400.0, 300.0));
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let mut camera = ZoneCamera::default();
        let anchor = Vec2::new(320.0, 200.0);
        let before = camera.screen_to_model(anchor);
        camera.zoom_at(anchor, 1.5);
        let after = camera.screen_to_model(anchor);
        assert!((before - after).length() < 1e-4);
    }
}
