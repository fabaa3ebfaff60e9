/// Drawable size in physical pixels.
///
/// Render targets, the software rasterizer and the projection all work in this
/// space; logical (DPI-scaled) sizes never reach the renderer.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    #[inline]
    pub fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}
