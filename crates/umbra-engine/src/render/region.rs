use crate::coords::{Rect, Vec2};
use crate::geom::{AreaTriangulator, Flattener, Join, PathStroker, Region};
use crate::paint::Color;

use super::backend::CompositeBackend;

/// Fills and outlines regions against the active backend.
///
/// Keeps a current color, line width (model units) and join, like a pen. All
/// scratch buffers live here and are reused between calls.
#[derive(Debug)]
pub struct RegionRenderer {
    triangulator: AreaTriangulator,
    flattener: Flattener,
    stroker: PathStroker,
    scratch: Vec<Vec2>,

    color: Color,
    line_width: f32,
    join: Join,
}

impl Default for RegionRenderer {
    fn default() -> Self {
        Self {
            triangulator: AreaTriangulator::new(),
            flattener: Flattener::new(),
            stroker: PathStroker::new(),
            scratch: Vec::new(),
            color: Color::white(),
            line_width: 1.0,
            join: Join::default(),
        }
    }
}

impl RegionRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    #[inline]
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    #[inline]
    pub fn line_width(&self) -> f32 {
        self.line_width
    }

    /// Line width in model units.
    #[inline]
    pub fn set_line_width(&mut self, width: f32) {
        self.line_width = width.max(0.0);
    }

    /// Line width in screen pixels at the current pixel size.
    #[inline]
    pub fn set_line_width_px(&mut self, pixels: f32) {
        self.set_line_width(pixels * self.stroker.pixel_size());
    }

    #[inline]
    pub fn join(&self) -> Join {
        self.join
    }

    #[inline]
    pub fn set_join(&mut self, join: Join) {
        self.join = join;
    }

    /// Model units per screen pixel; keeps arcs smooth at every zoom.
    #[inline]
    pub fn set_pixel_size(&mut self, pixel_size: f32) {
        self.stroker.set_pixel_size(pixel_size);
    }

    #[inline]
    pub fn pixel_size(&self) -> f32 {
        self.stroker.pixel_size()
    }

    /// Fills the area enclosed by `region` with the current color.
    pub fn fill_region(&mut self, backend: &mut impl CompositeBackend, region: &Region) {
        let color = self.color;
        for mesh in self.triangulator.triangulate(region) {
            backend.fill_mesh(mesh, color);
        }
    }

    /// Outlines every sub-path of `region` with the current pen.
    pub fn draw_region(&mut self, backend: &mut impl CompositeBackend, region: &Region) {
        self.flattener.flatten(region);
        for i in 0..self.flattener.subpath_count() {
            let sub = self.flattener.subpath(i);
            let mesh = self.stroker.stroke(sub.points, self.line_width, self.join, sub.closed);
            backend.fill_mesh(mesh, self.color);
        }
    }

    /// Outlines model-space `points`.
    pub fn draw_polyline(&mut self, backend: &mut impl CompositeBackend, points: &[Vec2], closed: bool) {
        self.scratch.clear();
        self.scratch.extend(points.iter().map(|p| p.flip_y()));
        let mesh = self.stroker.stroke(&self.scratch, self.line_width, self.join, closed);
        backend.fill_mesh(mesh, self.color);
    }

    pub fn fill_rect(&mut self, backend: &mut impl CompositeBackend, rect: Rect) {
        self.fill_region(backend, &Region::rect(rect));
    }

    pub fn fill_circle(&mut self, backend: &mut impl CompositeBackend, center: Vec2, radius: f32) {
        self.fill_region(backend, &Region::circle(center, radius));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{Projection, Viewport};
    use crate::render::{Attachment, SoftwareBackend};

    fn backend() -> SoftwareBackend {
        let mut b = SoftwareBackend::new(Viewport::new(20, 20));
        b.set_projection(Projection::screen());
        b
    }

    fn px(b: &SoftwareBackend, x: u32, y: u32) -> Color {
        b.pixel(Attachment::Screen, x, y).unwrap()
    }

    #[test]
    fn fill_region_paints_interior_only() {
        let mut b = backend();
        let mut r = RegionRenderer::new();
        r.set_color(Color::white());

        let mut region = Region::rect(Rect::new(2.0, 2.0, 16.0, 16.0));
        region.append(&Region::rect(Rect::new(8.0, 8.0, 4.0, 4.0)));
        r.fill_region(&mut b, &region);

        assert_eq!(px(&b, 3, 3), Color::white());
        assert_eq!(px(&b, 10, 10), Color::transparent());
        assert_eq!(px(&b, 0, 0), Color::transparent());
    }

    #[test]
    fn draw_region_outlines_the_boundary() {
        let mut b = backend();
        let mut r = RegionRenderer::new();
        r.set_line_width(2.0);
        r.fill_region(&mut b, &Region::new());
        r.draw_region(&mut b, &Region::rect(Rect::new(4.0, 4.0, 12.0, 12.0)));

        assert_eq!(px(&b, 4, 10), Color::white());
        assert_eq!(px(&b, 10, 4), Color::white());
        assert_eq!(px(&b, 10, 10), Color::transparent());
    }

    #[test]
    fn polyline_is_flipped_into_render_space() {
        let mut b = backend();
        let mut r = RegionRenderer::new();
        r.set_line_width(2.0);
        r.set_join(Join::Smooth);
        r.draw_polyline(&mut b, &[Vec2::new(2.0, 5.0), Vec2::new(18.0, 5.0)], false);

        assert_eq!(px(&b, 10, 4), Color::white());
        assert_eq!(px(&b, 10, 5), Color::white());
        assert_eq!(px(&b, 10, 7), Color::transparent());
    }

    #[test]
    fn pixel_width_follows_pixel_size() {
        let mut r = RegionRenderer::new();
        r.set_pixel_size(0.5);
        r.set_line_width_px(3.0);
        assert!((r.line_width() - 1.5).abs() < 1e-6);
    }
}
