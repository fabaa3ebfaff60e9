//! Deterministic CPU implementation of [`CompositeBackend`].
//!
//! Samples at pixel centres, evaluates blend factors exactly and keeps every
//! attachment as premultiplied `f32` RGBA. Used by tests and headless inspection.

use crate::coords::{Projection, Vec2, Viewport};
use crate::geom::Mesh;
use crate::paint::Color;

use super::backend::{Attachment, CompositeBackend, TargetId};
use super::blend::{BlendFunction, BlendShader};
use super::error::RenderError;

#[derive(Debug, Clone, Default)]
struct Pixmap {
    width: u32,
    height: u32,
    data: Vec<[f32; 4]>,
}

impl Pixmap {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![[0.0; 4]; width as usize * height as usize],
        }
    }

    #[inline]
    fn get(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(Color::from_array(self.data[(y * self.width + x) as usize]))
    }

    #[inline]
    fn blend_at(&mut self, x: u32, y: u32, src: Color, blend: BlendFunction) {
        let i = (y * self.width + x) as usize;
        let dst = Color::from_array(self.data[i]);
        self.data[i] = blend.blend(src, dst).to_array();
    }

    fn size(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }
}

/// CPU rasterizer behind the backend contract.
#[derive(Debug)]
pub struct SoftwareBackend {
    screen: Pixmap,
    targets: Vec<Option<Pixmap>>,
    bound: Attachment,
    blend: BlendFunction,
    projection: Projection,

    /// Refuse target allocations that would exceed this many live pixels.
    pixel_budget: Option<u64>,
    allocated: u64,
}

impl SoftwareBackend {
    pub fn new(screen: Viewport) -> Self {
        Self {
            screen: Pixmap::new(screen.width, screen.height),
            targets: Vec::new(),
            bound: Attachment::Screen,
            blend: BlendFunction::default(),
            projection: Projection::screen(),
            pixel_budget: None,
            allocated: 0,
        }
    }

    /// Caps the total pixel count of live off-screen targets.
    pub fn with_pixel_budget(mut self, pixels: u64) -> Self {
        self.pixel_budget = Some(pixels);
        self
    }

    pub fn set_pixel_budget(&mut self, pixels: Option<u64>) {
        self.pixel_budget = pixels;
    }

    /// Replaces the screen with a transparent one of the new size.
    pub fn resize_screen(&mut self, size: Viewport) {
        self.screen = Pixmap::new(size.width, size.height);
    }

    /// Reads one pixel of an attachment (premultiplied).
    pub fn pixel(&self, attachment: Attachment, x: u32, y: u32) -> Option<Color> {
        match attachment {
            Attachment::Screen => self.screen.get(x, y),
            Attachment::Target(id) => self.pixmap(id)?.get(x, y),
        }
    }

    /// Number of targets currently allocated.
    pub fn live_targets(&self) -> usize {
        self.targets.iter().filter(|t| t.is_some()).count()
    }

    fn pixmap(&self, id: TargetId) -> Option<&Pixmap> {
        self.targets.get(id.0 as usize).and_then(Option::as_ref)
    }

    fn bound_mut(&mut self) -> Option<&mut Pixmap> {
        match self.bound {
            Attachment::Screen => Some(&mut self.screen),
            Attachment::Target(id) => self.targets.get_mut(id.0 as usize).and_then(Option::as_mut),
        }
    }

    /// Moves the bound pixmap out so sources can be borrowed alongside it.
    fn take_bound(&mut self) -> Result<Pixmap, RenderError> {
        match self.bound {
            Attachment::Screen => Ok(std::mem::take(&mut self.screen)),
            Attachment::Target(id) => self
                .targets
                .get_mut(id.0 as usize)
                .and_then(Option::take)
                .ok_or(RenderError::UnknownTarget(id)),
        }
    }

    fn restore_bound(&mut self, pixmap: Pixmap) {
        match self.bound {
            Attachment::Screen => self.screen = pixmap,
            Attachment::Target(id) => {
                if let Some(slot) = self.targets.get_mut(id.0 as usize) {
                    *slot = Some(pixmap);
                }
            }
        }
    }

    fn check_source(&self, source: TargetId) -> Result<(), RenderError> {
        if self.bound == Attachment::Target(source) {
            return Err(RenderError::TargetFeedback(source));
        }
        self.pixmap(source).map(|_| ()).ok_or(RenderError::UnknownTarget(source))
    }
}

impl CompositeBackend for SoftwareBackend {
    fn create_target(&mut self, width: u32, height: u32) -> Result<TargetId, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::EmptyViewport { width, height });
        }
        let pixels = width as u64 * height as u64;
        if let Some(budget) = self.pixel_budget {
            if self.allocated + pixels > budget {
                return Err(RenderError::TargetAllocation {
                    width,
                    height,
                    reason: format!("pixel budget of {budget} exceeded"),
                });
            }
        }
        self.allocated += pixels;

        let pixmap = Pixmap::new(width, height);
        let id = match self.targets.iter().position(Option::is_none) {
            Some(free) => {
                self.targets[free] = Some(pixmap);
                free
            }
            None => {
                self.targets.push(Some(pixmap));
                self.targets.len() - 1
            }
        };
        Ok(TargetId(id as u32))
    }

    fn release_target(&mut self, id: TargetId) {
        if let Some(pixmap) = self.targets.get_mut(id.0 as usize).and_then(Option::take) {
            self.allocated -= pixmap.width as u64 * pixmap.height as u64;
        }
        if self.bound == Attachment::Target(id) {
            self.bound = Attachment::Screen;
        }
    }

    fn target_size(&self, id: TargetId) -> Option<Viewport> {
        self.pixmap(id).map(Pixmap::size)
    }

    fn screen_size(&self) -> Viewport {
        self.screen.size()
    }

    fn bind(&mut self, attachment: Attachment) -> Result<(), RenderError> {
        if let Attachment::Target(id) = attachment {
            if self.pixmap(id).is_none() {
                return Err(RenderError::UnknownTarget(id));
            }
        }
        self.bound = attachment;
        Ok(())
    }

    fn bound(&self) -> Attachment {
        self.bound
    }

    fn clear(&mut self, color: Color) {
        if let Some(dst) = self.bound_mut() {
            dst.data.fill(color.to_array());
        }
    }

    fn blend_function(&self) -> BlendFunction {
        self.blend
    }

    fn set_blend_function(&mut self, blend: BlendFunction) {
        self.blend = blend;
    }

    fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
    }

    fn projection(&self) -> Projection {
        self.projection
    }

    fn fill_mesh(&mut self, mesh: &Mesh, color: Color) {
        let projection = self.projection;
        let blend = self.blend;
        let Some(dst) = self.bound_mut() else { return };
        for [a, b, c] in mesh.triangles() {
            rasterize(dst, projection.apply(a), projection.apply(b), projection.apply(c), color, blend);
        }
    }

    fn draw_target(&mut self, source: TargetId, opacity: f32) -> Result<(), RenderError> {
        self.check_source(source)?;
        let blend = self.blend;
        let mut dst = self.take_bound()?;
        if let Some(src) = self.pixmap(source) {
            for y in 0..dst.height {
                for x in 0..dst.width {
                    if let Some(s) = src.get(x, y) {
                        dst.blend_at(x, y, s.with_opacity(opacity), blend);
                    }
                }
            }
        }
        self.restore_bound(dst);
        Ok(())
    }

    fn draw_target_shaded(
        &mut self,
        source: TargetId,
        accumulated: TargetId,
        shader: BlendShader,
    ) -> Result<(), RenderError> {
        self.check_source(source)?;
        self.check_source(accumulated)?;
        let blend = self.blend;
        let mut dst = self.take_bound()?;
        if let (Some(src), Some(acc)) = (self.pixmap(source), self.pixmap(accumulated)) {
            for y in 0..dst.height {
                for x in 0..dst.width {
                    if let (Some(s), Some(a)) = (src.get(x, y), acc.get(x, y)) {
                        dst.blend_at(x, y, shader.shade(s, a), blend);
                    }
                }
            }
        }
        self.restore_bound(dst);
        Ok(())
    }

    fn flush(&mut self) {}
}

/// Top-left style tie break: an edge shared by two consistently oriented
/// triangles is owned by exactly one of them.
#[inline]
fn owns_edge(a: Vec2, b: Vec2) -> bool {
    b.y > a.y || (b.y == a.y && b.x > a.x)
}

#[inline]
fn inside(a: Vec2, b: Vec2, p: Vec2) -> bool {
    let w = (b - a).cross(p - a);
    w > 0.0 || (w == 0.0 && owns_edge(a, b))
}

fn rasterize(dst: &mut Pixmap, a: Vec2, b: Vec2, c: Vec2, color: Color, blend: BlendFunction) {
    let area = (b - a).cross(c - a);
    if !area.is_finite() || area.abs() < 1e-9 {
        return;
    }
    let (b, c) = if area < 0.0 { (c, b) } else { (b, c) };

    let min_x = a.x.min(b.x).min(c.x);
    let max_x = a.x.max(b.x).max(c.x);
    let min_y = a.y.min(b.y).min(c.y);
    let max_y = a.y.max(b.y).max(c.y);

    let x0 = (min_x - 0.5).ceil().clamp(0.0, dst.width as f32) as u32;
    let x1 = ((max_x - 0.5).floor() + 1.0).clamp(0.0, dst.width as f32) as u32;
    let y0 = (min_y - 0.5).ceil().clamp(0.0, dst.height as f32) as u32;
    let y1 = ((max_y - 0.5).floor() + 1.0).clamp(0.0, dst.height as f32) as u32;

    for y in y0..y1 {
        for x in x0..x1 {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            if inside(a, b, p) && inside(b, c, p) && inside(c, a, p) {
                dst.blend_at(x, y, color, blend);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Rect;
    use crate::geom::{AreaTriangulator, Region};

    fn screen_rect_mesh(rect: Rect) -> Mesh {
        // Screen projection maps render (x, -y) to pixel (x, y).
        let mut t = AreaTriangulator::new();
        t.triangulate(&Region::rect(rect))[0].clone()
    }

    // ── rasterization ─────────────────────────────────────────────────────

    #[test]
    fn rect_covers_exact_pixels() {
        let mut backend = SoftwareBackend::new(Viewport::new(8, 8));
        backend.fill_mesh(&screen_rect_mesh(Rect::new(2.0, 2.0, 3.0, 3.0)), Color::white());

        let covered = (0..8)
            .flat_map(|y| (0..8).map(move |x| (x, y)))
            .filter(|&(x, y)| backend.pixel(Attachment::Screen, x, y).unwrap().a > 0.0)
            .count();
        assert_eq!(covered, 9);
        assert_eq!(backend.pixel(Attachment::Screen, 2, 2), Some(Color::white()));
        assert_eq!(backend.pixel(Attachment::Screen, 5, 5), Some(Color::transparent()));
    }

    #[test]
    fn shared_diagonal_is_not_blended_twice() {
        let mut backend = SoftwareBackend::new(Viewport::new(4, 4));
        let half = Color::from_straight(1.0, 1.0, 1.0, 0.5);
        backend.fill_mesh(&screen_rect_mesh(Rect::new(0.0, 0.0, 4.0, 4.0)), half);
        for y in 0..4 {
            for x in 0..4 {
                let px = backend.pixel(Attachment::Screen, x, y).unwrap();
                assert!((px.a - 0.5).abs() < 1e-6, "pixel ({x},{y}) alpha {}", px.a);
            }
        }
    }

    // ── targets ───────────────────────────────────────────────────────────

    #[test]
    fn pixel_budget_refuses_allocation() {
        let mut backend = SoftwareBackend::new(Viewport::new(4, 4)).with_pixel_budget(100);
        let first = backend.create_target(10, 10).unwrap();
        let err = backend.create_target(1, 1).unwrap_err();
        assert!(matches!(err, RenderError::TargetAllocation { width: 1, height: 1, .. }));

        backend.release_target(first);
        assert!(backend.create_target(5, 5).is_ok());
    }

    #[test]
    fn drawing_a_bound_target_into_itself_is_rejected() {
        let mut backend = SoftwareBackend::new(Viewport::new(4, 4));
        let t = backend.create_target(4, 4).unwrap();
        backend.bind(Attachment::Target(t)).unwrap();
        assert_eq!(backend.draw_target(t, 1.0), Err(RenderError::TargetFeedback(t)));
        // The bound target survives the failed call.
        assert_eq!(backend.target_size(t), Some(Viewport::new(4, 4)));
    }

    #[test]
    fn binding_unknown_target_fails() {
        let mut backend = SoftwareBackend::new(Viewport::new(4, 4));
        let missing = TargetId(7);
        assert_eq!(backend.bind(Attachment::Target(missing)), Err(RenderError::UnknownTarget(missing)));
        assert_eq!(backend.bound(), Attachment::Screen);
    }

    #[test]
    fn draw_target_applies_opacity() {
        let mut backend = SoftwareBackend::new(Viewport::new(2, 2));
        let t = backend.create_target(2, 2).unwrap();
        backend.bind(Attachment::Target(t)).unwrap();
        backend.clear(Color::white());
        backend.bind(Attachment::Screen).unwrap();
        backend.draw_target(t, 0.5).unwrap();
        let px = backend.pixel(Attachment::Screen, 1, 1).unwrap();
        assert!(px.approx_eq(Color::from_premul(0.5, 0.5, 0.5, 0.5), 1e-6));
    }
}
