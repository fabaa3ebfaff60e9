//! Layered compositing over three same-sized off-screen targets.
//!
//! - `back`: the layer being drawn in isolation
//! - `results`: the accumulated scene
//! - `spare`: scratch output for shader blends, exchanged with `results` via [`LayerTargets::swap`]

use crate::coords::Viewport;
use crate::paint::Color;

use super::backend::{Attachment, CompositeBackend, TargetId};
use super::blend::{BlendFunction, BlendShader};
use super::error::RenderError;

/// The three compositor targets.
///
/// Ids are only exchanged through [`swap`](Self::swap); nothing else may reassign them.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct LayerTargets {
    back: TargetId,
    results: TargetId,
    spare: TargetId,
    size: Viewport,
}

impl LayerTargets {
    #[inline]
    pub fn back(&self) -> TargetId {
        self.back
    }

    #[inline]
    pub fn results(&self) -> TargetId {
        self.results
    }

    #[inline]
    pub fn spare(&self) -> TargetId {
        self.spare
    }

    #[inline]
    pub fn size(&self) -> Viewport {
        self.size
    }

    /// Exchanges `results` and `spare` (handles only, no pixel copy).
    #[inline]
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.results, &mut self.spare);
    }
}

/// Sequencing of layers into the accumulated scene.
///
/// Between [`begin_frame`](Self::begin_frame) and [`present`](Self::present),
/// `results` is bound except while a layer is open.
#[derive(Debug, Default)]
pub struct Compositor {
    targets: Option<LayerTargets>,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn targets(&self) -> Option<&LayerTargets> {
        self.targets.as_ref()
    }

    #[inline]
    pub fn size(&self) -> Option<Viewport> {
        self.targets.map(|t| t.size)
    }

    /// (Re)creates the targets at `size`. A no-op when the size is unchanged.
    ///
    /// On failure no targets remain allocated and every layer operation returns
    /// [`RenderError::NoTargets`] until a later resize succeeds.
    pub fn resize(&mut self, backend: &mut impl CompositeBackend, size: Viewport) -> Result<(), RenderError> {
        if self.size() == Some(size) {
            return Ok(());
        }
        self.dispose(backend);

        if !size.is_valid() {
            return Err(RenderError::EmptyViewport { width: size.width, height: size.height });
        }

        let mut created = Vec::with_capacity(3);
        for _ in 0..3 {
            match backend.create_target(size.width, size.height) {
                Ok(id) => created.push(id),
                Err(err) => {
                    log::error!("compositor: render target allocation failed: {err}");
                    for id in created {
                        backend.release_target(id);
                    }
                    return Err(err);
                }
            }
        }

        self.targets = Some(LayerTargets {
            back: created[0],
            results: created[1],
            spare: created[2],
            size,
        });
        log::debug!("compositor: render targets created at {}x{}", size.width, size.height);
        Ok(())
    }

    /// Releases the targets. Safe to call repeatedly.
    pub fn dispose(&mut self, backend: &mut impl CompositeBackend) {
        if let Some(targets) = self.targets.take() {
            backend.flush();
            if backend.bound() != Attachment::Screen {
                // Screen always exists, so this cannot fail.
                let _ = backend.bind(Attachment::Screen);
            }
            backend.release_target(targets.back);
            backend.release_target(targets.results);
            backend.release_target(targets.spare);
            log::debug!("compositor: render targets released");
        }
    }

    fn require(&self) -> Result<LayerTargets, RenderError> {
        self.targets.ok_or(RenderError::NoTargets)
    }

    /// Binds `results`, clears it to `background` and restores the working blend.
    pub fn begin_frame(&mut self, backend: &mut impl CompositeBackend, background: Color) -> Result<(), RenderError> {
        let targets = self.require()?;
        backend.bind(Attachment::Target(targets.results))?;
        backend.clear(background);
        BlendFunction::PREMULTIPLIED_SOURCE_OVER.apply(backend);
        Ok(())
    }

    /// Binds `back` and clears it to transparent for an isolated layer.
    pub fn begin_layer(&mut self, backend: &mut impl CompositeBackend) -> Result<(), RenderError> {
        let targets = self.require()?;
        backend.flush();
        backend.bind(Attachment::Target(targets.back))?;
        backend.clear(Color::transparent());
        BlendFunction::PREMULTIPLIED_SOURCE_OVER.apply(backend);
        Ok(())
    }

    /// Blends `back` into `results` with `blend`; `results` stays bound.
    pub fn end_layer(&mut self, backend: &mut impl CompositeBackend, blend: BlendFunction) -> Result<(), RenderError> {
        self.end_layer_with_opacity(backend, blend, 1.0)
    }

    /// Like [`end_layer`](Self::end_layer) with the layer scaled by `opacity` first.
    pub fn end_layer_with_opacity(
        &mut self,
        backend: &mut impl CompositeBackend,
        blend: BlendFunction,
        opacity: f32,
    ) -> Result<(), RenderError> {
        let targets = self.require()?;
        backend.flush();
        backend.bind(Attachment::Target(targets.results))?;
        blend.apply(backend);
        backend.draw_target(targets.back, opacity)?;
        BlendFunction::PREMULTIPLIED_SOURCE_OVER.apply(backend);
        Ok(())
    }

    /// Blends `back` into the scene with a shader that reads the accumulated image.
    ///
    /// The shader writes into `spare` (replace blend), then `results` and `spare`
    /// are swapped so `results` again holds the scene. `results` stays bound.
    pub fn end_layer_shaded(&mut self, backend: &mut impl CompositeBackend, shader: BlendShader) -> Result<(), RenderError> {
        let mut targets = self.require()?;
        backend.flush();
        backend.bind(Attachment::Target(targets.spare))?;
        backend.clear(Color::transparent());
        BlendFunction::SOURCE_ONLY.apply(backend);
        backend.draw_target_shaded(targets.back, targets.results, shader)?;
        backend.flush();

        targets.swap();
        self.targets = Some(targets);

        backend.bind(Attachment::Target(targets.results))?;
        BlendFunction::PREMULTIPLIED_SOURCE_OVER.apply(backend);
        Ok(())
    }

    /// Draws `results` over the screen and flushes.
    pub fn present(&mut self, backend: &mut impl CompositeBackend) -> Result<(), RenderError> {
        let targets = self.require()?;
        backend.flush();
        backend.bind(Attachment::Screen)?;
        BlendFunction::PREMULTIPLIED_SOURCE_OVER.apply(backend);
        backend.draw_target(targets.results, 1.0)?;
        backend.flush();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{Projection, Rect};
    use crate::geom::{AreaTriangulator, Mesh, Region};
    use crate::render::SoftwareBackend;

    const SIZE: Viewport = Viewport::new(16, 16);

    fn rect_mesh(rect: Rect) -> Mesh {
        let mut t = AreaTriangulator::new();
        t.triangulate(&Region::rect(rect))[0].clone()
    }

    fn setup() -> (SoftwareBackend, Compositor) {
        let mut backend = SoftwareBackend::new(SIZE);
        backend.set_projection(Projection::screen());
        let mut compositor = Compositor::new();
        compositor.resize(&mut backend, SIZE).unwrap();
        (backend, compositor)
    }

    // ── ordering ──────────────────────────────────────────────────────────

    #[test]
    fn stacked_layers_match_analytic_over() {
        let (mut backend, mut compositor) = setup();
        let background = Color::from_straight(0.2, 0.2, 0.2, 1.0);
        let layers = [
            Color::from_straight(1.0, 0.0, 0.0, 0.5),
            Color::from_straight(0.0, 1.0, 0.0, 0.25),
            Color::from_straight(0.0, 0.0, 1.0, 0.75),
        ];
        let full = rect_mesh(Rect::new(0.0, 0.0, 16.0, 16.0));

        compositor.begin_frame(&mut backend, background).unwrap();
        for color in layers {
            compositor.begin_layer(&mut backend).unwrap();
            backend.fill_mesh(&full, color);
            compositor.end_layer(&mut backend, BlendFunction::PREMULTIPLIED_SOURCE_OVER).unwrap();
        }
        compositor.present(&mut backend).unwrap();

        let expected = layers.iter().fold(background, |acc, c| c.over(acc));
        let px = backend.pixel(Attachment::Screen, 8, 8).unwrap();
        assert!(px.approx_eq(expected, 1e-5), "{px:?} != {expected:?}");
    }

    #[test]
    fn layer_overlaps_blend_in_isolation() {
        let (mut backend, mut compositor) = setup();
        let half_white = Color::from_straight(1.0, 1.0, 1.0, 0.5);
        let left = rect_mesh(Rect::new(0.0, 0.0, 10.0, 16.0));
        let right = rect_mesh(Rect::new(6.0, 0.0, 10.0, 16.0));

        compositor.begin_frame(&mut backend, Color::black()).unwrap();
        compositor.begin_layer(&mut backend).unwrap();
        backend.fill_mesh(&left, half_white);
        backend.fill_mesh(&right, half_white);
        compositor.end_layer_with_opacity(&mut backend, BlendFunction::PREMULTIPLIED_SOURCE_OVER, 0.5).unwrap();
        compositor.present(&mut backend).unwrap();

        let overlap = half_white.over(half_white).with_opacity(0.5).over(Color::black());
        let single = half_white.with_opacity(0.5).over(Color::black());
        assert!(backend.pixel(Attachment::Screen, 8, 4).unwrap().approx_eq(overlap, 1e-5));
        assert!(backend.pixel(Attachment::Screen, 2, 4).unwrap().approx_eq(single, 1e-5));
    }

    #[test]
    fn end_layer_leaves_results_bound() {
        let (mut backend, mut compositor) = setup();
        compositor.begin_frame(&mut backend, Color::black()).unwrap();
        compositor.begin_layer(&mut backend).unwrap();
        compositor.end_layer(&mut backend, BlendFunction::SCREEN).unwrap();
        let results = compositor.targets().unwrap().results();
        assert_eq!(backend.bound(), Attachment::Target(results));
        assert_eq!(backend.blend_function(), BlendFunction::PREMULTIPLIED_SOURCE_OVER);
    }

    // ── shader pass ───────────────────────────────────────────────────────

    #[test]
    fn shaded_layer_swaps_results_and_spare() {
        let (mut backend, mut compositor) = setup();
        let before = *compositor.targets().unwrap();
        let scene = Color::from_straight(0.5, 0.5, 0.5, 1.0);
        let light = Color::from_straight(1.0, 0.5, 0.0, 0.6);

        compositor.begin_frame(&mut backend, scene).unwrap();
        compositor.begin_layer(&mut backend).unwrap();
        backend.fill_mesh(&rect_mesh(Rect::new(0.0, 0.0, 16.0, 16.0)), light);
        compositor.end_layer_shaded(&mut backend, BlendShader::EnvironmentalLight).unwrap();

        let after = *compositor.targets().unwrap();
        assert_eq!(after.results(), before.spare());
        assert_eq!(after.spare(), before.results());
        assert_eq!(after.back(), before.back());
        assert_eq!(backend.bound(), Attachment::Target(after.results()));

        let expected = BlendShader::EnvironmentalLight.shade(light, scene);
        let px = backend.pixel(Attachment::Target(after.results()), 3, 3).unwrap();
        assert!(px.approx_eq(expected, 1e-5));
    }

    // ── blend state ───────────────────────────────────────────────────────

    #[test]
    fn applying_blend_twice_equals_once() {
        let mut backend = SoftwareBackend::new(SIZE);
        BlendFunction::SCREEN.apply(&mut backend);
        let once = BlendFunction::current(&backend);
        BlendFunction::SCREEN.apply(&mut backend);
        assert_eq!(BlendFunction::current(&backend), once);
        assert_eq!(once, BlendFunction::SCREEN);
    }

    // ── resize / lifecycle ────────────────────────────────────────────────

    #[test]
    fn resize_recreates_targets_at_new_size() {
        let (mut backend, mut compositor) = setup();
        let bigger = Viewport::new(32, 24);
        backend.resize_screen(bigger);
        compositor.resize(&mut backend, bigger).unwrap();

        let t = *compositor.targets().unwrap();
        for id in [t.back(), t.results(), t.spare()] {
            assert_eq!(backend.target_size(id), Some(bigger));
        }
        assert_eq!(backend.live_targets(), 3);

        compositor.begin_frame(&mut backend, Color::black()).unwrap();
        compositor.begin_layer(&mut backend).unwrap();
        backend.fill_mesh(&rect_mesh(Rect::new(20.0, 20.0, 8.0, 4.0)), Color::white());
        compositor.end_layer(&mut backend, BlendFunction::PREMULTIPLIED_SOURCE_OVER).unwrap();
        compositor.present(&mut backend).unwrap();
        assert_eq!(backend.pixel(Attachment::Screen, 25, 22), Some(Color::white()));
    }

    #[test]
    fn same_size_resize_keeps_targets() {
        let (mut backend, mut compositor) = setup();
        let before = *compositor.targets().unwrap();
        compositor.resize(&mut backend, SIZE).unwrap();
        assert_eq!(*compositor.targets().unwrap(), before);
    }

    #[test]
    fn failed_allocation_leaves_no_targets() {
        let mut backend = SoftwareBackend::new(SIZE).with_pixel_budget(16 * 16 * 3);
        let mut compositor = Compositor::new();
        compositor.resize(&mut backend, SIZE).unwrap();

        let err = compositor.resize(&mut backend, Viewport::new(64, 64)).unwrap_err();
        assert!(matches!(err, RenderError::TargetAllocation { width: 64, height: 64, .. }));
        assert!(compositor.targets().is_none());
        assert_eq!(backend.live_targets(), 0);
        assert_eq!(compositor.begin_frame(&mut backend, Color::black()), Err(RenderError::NoTargets));

        compositor.resize(&mut backend, SIZE).unwrap();
        assert!(compositor.begin_frame(&mut backend, Color::black()).is_ok());
    }

    #[test]
    fn empty_viewport_is_rejected() {
        let (mut backend, mut compositor) = setup();
        let err = compositor.resize(&mut backend, Viewport::new(0, 10)).unwrap_err();
        assert_eq!(err, RenderError::EmptyViewport { width: 0, height: 10 });
        assert!(compositor.targets().is_none());
    }

    #[test]
    fn dispose_releases_everything() {
        let (mut backend, mut compositor) = setup();
        compositor.dispose(&mut backend);
        compositor.dispose(&mut backend);
        assert_eq!(backend.live_targets(), 0);
        assert_eq!(backend.bound(), Attachment::Screen);
    }
}
