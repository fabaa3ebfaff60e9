//! Per-frame sequencing of a zone's layers through the compositor.

use crate::coords::{Projection, Rect, Vec2, Viewport, ZoneCamera};
use crate::geom::{Join, Region};
use crate::grid::GridRenderer;
use crate::paint::Color;
use crate::render::{
    Attachment, BlendFunction, BlendShader, CompositeBackend, Compositor, RegionRenderer, RenderError,
};

use super::prefs::{LightingStyle, RenderPrefs};
use super::view::{Drawable, Token, ZoneLayer, ZoneView};

/// One step of the frame, in [`FRAME_LAYER_ORDER`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum FrameLayer {
    Board,
    BackgroundDrawables,
    Grid,
    ObjectLayer,
    Lights,
    Lumens,
    Auras,
    /// Direct fill, no isolated layer.
    PlayerDarkness,
    /// GM view only.
    HiddenLayer,
    TokenLayer,
    Fog,
    AlwaysVisibleTokens,
    Labels,
    Overlays,
}

impl FrameLayer {
    /// Drawn into `back` and blended into the scene once, so its own overlaps blend correctly.
    pub fn is_isolated(self) -> bool {
        matches!(self, FrameLayer::Lights | FrameLayer::Lumens | FrameLayer::Auras | FrameLayer::Fog)
    }
}

pub const FRAME_LAYER_ORDER: [FrameLayer; 14] = [
    FrameLayer::Board,
    FrameLayer::BackgroundDrawables,
    FrameLayer::Grid,
    FrameLayer::ObjectLayer,
    FrameLayer::Lights,
    FrameLayer::Lumens,
    FrameLayer::Auras,
    FrameLayer::PlayerDarkness,
    FrameLayer::HiddenLayer,
    FrameLayer::TokenLayer,
    FrameLayer::Fog,
    FrameLayer::AlwaysVisibleTokens,
    FrameLayer::Labels,
    FrameLayer::Overlays,
];

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameOutcome {
    Rendered,
    /// The view was not ready; a wait indicator was drawn instead.
    Placeholder,
    /// Nothing was drawn (no render targets at this size).
    Skipped,
}

const PLACEHOLDER_BACKDROP: Color = Color::from_premul(0.08, 0.08, 0.1, 1.0);
const PLACEHOLDER_DOT: Color = Color::from_premul(0.75, 0.75, 0.75, 1.0);
const PLACEHOLDER_DOT_RADIUS: f32 = 4.0;
const PLACEHOLDER_DOT_SPACING: f32 = 14.0;

// Label backdrop metrics, in screen pixels.
const LABEL_CHAR_PX: f32 = 7.0;
const LABEL_LINE_PX: f32 = 14.0;
const LABEL_PADDING_PX: f32 = 4.0;

/// How an isolated layer is blended into the scene.
#[derive(Debug, Copy, Clone, PartialEq)]
enum LayerComposite {
    Opacity(f32),
    Shaded(BlendShader),
}

/// Blend for an isolated layer, or `None` when it has nothing to draw this frame.
fn isolated_composite(layer: FrameLayer, view: &impl ZoneView, prefs: &RenderPrefs) -> Option<LayerComposite> {
    match layer {
        FrameLayer::Lights if !view.lights().is_empty() => Some(match prefs.lighting_style {
            LightingStyle::Overtop => LayerComposite::Opacity(prefs.light_overlay()),
            LightingStyle::Environmental => LayerComposite::Shaded(BlendShader::EnvironmentalLight),
        }),
        FrameLayer::Lumens if prefs.show_lumens_overlay && !view.lumens_levels().is_empty() => {
            Some(LayerComposite::Opacity(prefs.lumens_overlay()))
        }
        FrameLayer::Auras if !view.auras().is_empty() => Some(LayerComposite::Opacity(prefs.aura_overlay())),
        FrameLayer::Fog if view.fog().is_some() => Some(LayerComposite::Opacity(prefs.fog())),
        _ => None,
    }
}

/// Draws zones frame by frame.
///
/// Owns the compositor targets for the active zone's session. A failed target
/// allocation puts the session in a failed state: frames are skipped until the
/// screen size changes and a new allocation succeeds.
#[derive(Debug, Default)]
pub struct ZoneRenderer {
    compositor: Compositor,
    regions: RegionRenderer,
    grid: GridRenderer,

    failed_size: Option<Viewport>,
    warned_skip: bool,
    waiting: bool,

    /// Layers composited through `back` in the last frame.
    isolated: Vec<FrameLayer>,

    // scratch
    lumens_order: Vec<usize>,
}

impl ZoneRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    #[inline]
    pub fn grid(&self) -> &GridRenderer {
        &self.grid
    }

    /// Whether frames are being skipped after a failed allocation.
    #[inline]
    pub fn is_failed(&self) -> bool {
        self.failed_size.is_some()
    }

    /// Recreates the compositor targets at `size`.
    pub fn resize(&mut self, backend: &mut impl CompositeBackend, size: Viewport) -> Result<(), RenderError> {
        match self.compositor.resize(backend, size) {
            Ok(()) => {
                self.failed_size = None;
                self.warned_skip = false;
                Ok(())
            }
            Err(err) => {
                self.failed_size = Some(size);
                Err(err)
            }
        }
    }

    #[inline]
    pub fn isolated_layers(&self) -> &[FrameLayer] {
        &self.isolated
    }

    /// Renders one frame of `view` to the backend's screen.
    pub fn render(
        &mut self,
        backend: &mut impl CompositeBackend,
        view: &impl ZoneView,
        camera: ZoneCamera,
        prefs: &RenderPrefs,
    ) -> FrameOutcome {
        let size = backend.screen_size();
        if !size.is_valid() {
            return FrameOutcome::Skipped;
        }
        if self.failed_size == Some(size) {
            if !self.warned_skip {
                log::warn!(
                    "zone renderer: skipping frames at {}x{} until the next successful resize",
                    size.width,
                    size.height
                );
                self.warned_skip = true;
            }
            return FrameOutcome::Skipped;
        }

        if !view.is_ready() {
            if !self.waiting {
                log::debug!("zone renderer: view not ready, drawing placeholder");
                self.waiting = true;
            }
            self.draw_placeholder(backend);
            return FrameOutcome::Placeholder;
        }
        self.waiting = false;

        if self.resize(backend, size).is_err() {
            return FrameOutcome::Skipped;
        }

        match self.draw_scene(backend, view, camera, prefs) {
            Ok(()) => FrameOutcome::Rendered,
            Err(err) => {
                log::error!("zone renderer: frame aborted: {err}");
                FrameOutcome::Skipped
            }
        }
    }

    /// Releases everything tied to the previous zone.
    pub fn change_zone(&mut self, backend: &mut impl CompositeBackend) {
        self.compositor.dispose(backend);
        self.grid.evict();
        self.failed_size = None;
        self.warned_skip = false;
        log::info!("zone renderer: zone changed, render targets and grid cache released");
    }

    pub fn shutdown(&mut self, backend: &mut impl CompositeBackend) {
        self.compositor.dispose(backend);
        self.grid.evict();
        self.failed_size = None;
        log::debug!("zone renderer: shut down");
    }

    fn draw_scene(
        &mut self,
        backend: &mut impl CompositeBackend,
        view: &impl ZoneView,
        camera: ZoneCamera,
        prefs: &RenderPrefs,
    ) -> Result<(), RenderError> {
        let visible = camera.visible_bounds(backend.screen_size());
        self.isolated.clear();

        backend.flush();
        backend.bind(Attachment::Screen)?;
        backend.clear(Color::black());

        backend.set_projection(camera.projection());
        self.regions.set_pixel_size(camera.pixel_size());
        self.compositor.begin_frame(backend, Color::transparent())?;

        for layer in FRAME_LAYER_ORDER {
            self.draw_layer(layer, backend, view, visible, prefs)?;
        }

        self.compositor.present(backend)
    }

    fn draw_layer(
        &mut self,
        layer: FrameLayer,
        backend: &mut impl CompositeBackend,
        view: &impl ZoneView,
        visible: Rect,
        prefs: &RenderPrefs,
    ) -> Result<(), RenderError> {
        if !layer.is_isolated() {
            self.draw_direct(layer, backend, view, visible, prefs);
            return Ok(());
        }
        let Some(composite) = isolated_composite(layer, view, prefs) else { return Ok(()) };

        self.compositor.begin_layer(backend)?;
        match layer {
            FrameLayer::Lights => self.draw_lights(backend, view, prefs),
            FrameLayer::Lumens => self.draw_lumens(backend, view, prefs),
            FrameLayer::Auras => {
                for aura in view.auras() {
                    self.regions.set_color(aura.color);
                    self.regions.fill_region(backend, &aura.area);
                }
            }
            FrameLayer::Fog => self.draw_fog(backend, view, visible, prefs),
            _ => {}
        }
        self.isolated.push(layer);

        match composite {
            LayerComposite::Opacity(opacity) => {
                self.compositor
                    .end_layer_with_opacity(backend, BlendFunction::PREMULTIPLIED_SOURCE_OVER, opacity)
            }
            LayerComposite::Shaded(shader) => self.compositor.end_layer_shaded(backend, shader),
        }
    }

    /// Layers drawn straight into `results`.
    fn draw_direct(
        &mut self,
        layer: FrameLayer,
        backend: &mut impl CompositeBackend,
        view: &impl ZoneView,
        visible: Rect,
        prefs: &RenderPrefs,
    ) {
        match layer {
            FrameLayer::Board => {
                self.regions.set_color(view.board_color());
                self.regions.fill_rect(backend, visible);
            }
            FrameLayer::BackgroundDrawables => self.draw_zone_layer(backend, view, ZoneLayer::Background, prefs),
            FrameLayer::Grid => {
                if let Some(grid) = view.grid() {
                    self.grid.render(backend, &mut self.regions, &grid, visible, prefs.grid_color, prefs.grid_line_weight);
                }
            }
            FrameLayer::ObjectLayer => self.draw_zone_layer(backend, view, ZoneLayer::Object, prefs),
            FrameLayer::PlayerDarkness => {
                if let Some(darkness) = view.player_darkness() {
                    self.regions.set_color(Color::black().with_opacity(prefs.darkness()));
                    self.regions.fill_region(backend, darkness);
                }
            }
            FrameLayer::HiddenLayer => {
                if view.is_gm_view() {
                    self.draw_zone_layer(backend, view, ZoneLayer::Hidden, prefs);
                }
            }
            FrameLayer::TokenLayer => self.draw_zone_layer(backend, view, ZoneLayer::Token, prefs),
            FrameLayer::AlwaysVisibleTokens => {
                if view.fog().is_some() {
                    for layer in [ZoneLayer::Object, ZoneLayer::Token] {
                        for token in view.tokens(layer).iter().filter(|t| t.always_visible) {
                            self.draw_token(backend, token, prefs);
                        }
                    }
                }
            }
            FrameLayer::Labels => {
                let px = self.regions.pixel_size();
                for label in view.labels() {
                    let chars = label.text.chars().count().max(1) as f32;
                    let w = (chars * LABEL_CHAR_PX + 2.0 * LABEL_PADDING_PX) * px;
                    let h = (LABEL_LINE_PX + 2.0 * LABEL_PADDING_PX) * px;
                    let rect = Rect::new(label.position.x - w * 0.5, label.position.y - h * 0.5, w, h);

                    self.regions.set_color(label.background);
                    self.regions.fill_rect(backend, rect);
                    self.regions.set_color(label.border);
                    self.regions.set_join(Join::Pointy);
                    self.regions.set_line_width_px(1.0);
                    self.regions.draw_region(backend, &Region::rect(rect));
                }
            }
            FrameLayer::Overlays => {
                for outline in view.overlays() {
                    self.regions.set_color(outline.stroke.color);
                    self.regions.set_join(outline.stroke.join);
                    self.regions.set_line_width_px(outline.stroke.width);
                    self.regions.draw_polyline(backend, &outline.points, outline.closed);
                }
            }
            FrameLayer::Lights | FrameLayer::Lumens | FrameLayer::Auras | FrameLayer::Fog => {}
        }
    }

    fn draw_zone_layer(
        &mut self,
        backend: &mut impl CompositeBackend,
        view: &impl ZoneView,
        layer: ZoneLayer,
        prefs: &RenderPrefs,
    ) {
        for drawable in view.drawables(layer) {
            self.draw_drawable(backend, drawable);
        }
        for token in view.tokens(layer) {
            self.draw_token(backend, token, prefs);
        }
    }

    fn draw_drawable(&mut self, backend: &mut impl CompositeBackend, drawable: &Drawable) {
        if let Some(fill) = drawable.fill {
            self.regions.set_color(fill);
            self.regions.fill_region(backend, &drawable.region);
        }
        if let Some(stroke) = drawable.stroke {
            self.regions.set_color(stroke.color);
            self.regions.set_join(stroke.join);
            self.regions.set_line_width_px(stroke.width);
            self.regions.draw_region(backend, &drawable.region);
        }
    }

    fn draw_token(&mut self, backend: &mut impl CompositeBackend, token: &Token, prefs: &RenderPrefs) {
        if let Some(halo) = token.halo {
            self.regions.set_color(halo);
            self.regions.set_join(Join::Round);
            self.regions.set_line_width_px(prefs.halo_line_width);
            self.regions.draw_region(backend, &token.footprint);
        }

        self.regions.set_color(token.color);
        self.regions.fill_region(backend, &token.footprint);

        if let Some(overlay) = token.overlay {
            overlay.draw(backend, &mut self.regions, token.bounds);
        }
        if let Some(bar) = token.bar {
            bar.draw(backend, &mut self.regions, token.bounds);
        }
    }

    fn draw_lights(&mut self, backend: &mut impl CompositeBackend, view: &impl ZoneView, prefs: &RenderPrefs) {
        // The environmental shader mixes by the layer's alpha, so opacity goes into the colors.
        let premix = match prefs.lighting_style {
            LightingStyle::Overtop => 1.0,
            LightingStyle::Environmental => prefs.light_overlay(),
        };
        for light in view.lights() {
            self.regions.set_color(light.color.with_opacity(premix));
            self.regions.fill_region(backend, &light.area);
        }
    }

    /// Grey-scale intensity map: dark areas black, lit areas brighter with lumens,
    /// brighter levels drawn last.
    fn draw_lumens(&mut self, backend: &mut impl CompositeBackend, view: &impl ZoneView, prefs: &RenderPrefs) {
        let levels = view.lumens_levels();
        self.lumens_order.clear();
        self.lumens_order.extend(0..levels.len());
        self.lumens_order.sort_by_key(|&i| levels[i].lumens);

        for &i in &self.lumens_order {
            let level = &levels[i];
            self.regions.set_color(Color::black());
            self.regions.fill_region(backend, &level.dark);

            let grey = (level.lumens.max(0) as f32 / 100.0).min(1.0);
            self.regions.set_color(Color::from_straight(grey, grey, grey, 1.0));
            self.regions.fill_region(backend, &level.lit);
        }

        if prefs.lumens_overlay_border_thickness > 0.0 {
            self.regions.set_color(Color::black());
            self.regions.set_join(Join::Round);
            self.regions.set_line_width_px(prefs.lumens_overlay_border_thickness);
            for &i in &self.lumens_order {
                self.regions.draw_region(backend, &levels[i].lit);
            }
        }
    }

    /// Fog mask: the fog color everywhere, the exposed color where the area has been
    /// seen, and a hole where it is currently visible.
    fn draw_fog(&mut self, backend: &mut impl CompositeBackend, view: &impl ZoneView, visible: Rect, prefs: &RenderPrefs) {
        let Some(fog) = view.fog() else { return };

        self.regions.set_color(prefs.fog_color);
        self.regions.fill_rect(backend, visible);

        BlendFunction::SOURCE_ONLY.apply(backend);
        self.regions.set_color(prefs.exposed_fog_color);
        self.regions.fill_region(backend, &fog.exposed);
        self.regions.set_color(Color::transparent());
        self.regions.fill_region(backend, &fog.visible);
        BlendFunction::PREMULTIPLIED_SOURCE_OVER.apply(backend);
    }

    /// Dark backdrop with three dots in the middle of the screen.
    fn draw_placeholder(&mut self, backend: &mut impl CompositeBackend) {
        let size = backend.screen_size();
        backend.flush();
        if let Err(err) = backend.bind(Attachment::Screen) {
            log::error!("zone renderer: cannot bind the screen: {err}");
            return;
        }
        BlendFunction::PREMULTIPLIED_SOURCE_OVER.apply(backend);
        backend.set_projection(Projection::screen());
        backend.clear(PLACEHOLDER_BACKDROP);

        self.regions.set_pixel_size(1.0);
        self.regions.set_color(PLACEHOLDER_DOT);
        let center = Vec2::new(size.width as f32 * 0.5, size.height as f32 * 0.5);
        for i in -1..=1 {
            let c = center + Vec2::new(i as f32 * PLACEHOLDER_DOT_SPACING, 0.0);
            self.regions.fill_circle(backend, c, PLACEHOLDER_DOT_RADIUS);
        }
        backend.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GridKind, GridSpec};
    use crate::render::SoftwareBackend;
    use crate::zone::view::{Aura, FogState, Label, Light, LumensLevel, Outline, Stroke};

    const SIZE: Viewport = Viewport::new(16, 16);

    #[derive(Default)]
    struct ScriptedZone {
        not_ready: bool,
        gm: bool,
        board: Color,
        grid: Option<GridSpec>,
        background: Vec<Drawable>,
        hidden: Vec<Drawable>,
        tokens: Vec<Token>,
        lights: Vec<Light>,
        lumens: Vec<LumensLevel>,
        auras: Vec<Aura>,
        darkness: Option<Region>,
        fog: Option<FogState>,
        labels: Vec<Label>,
        overlays: Vec<Outline>,
    }

    impl ZoneView for ScriptedZone {
        fn is_ready(&self) -> bool {
            !self.not_ready
        }
        fn is_gm_view(&self) -> bool {
            self.gm
        }
        fn board_color(&self) -> Color {
            self.board
        }
        fn grid(&self) -> Option<GridSpec> {
            self.grid
        }
        fn drawables(&self, layer: ZoneLayer) -> &[Drawable] {
            match layer {
                ZoneLayer::Background => &self.background,
                ZoneLayer::Hidden => &self.hidden,
                ZoneLayer::Object | ZoneLayer::Token => &[],
            }
        }
        fn tokens(&self, layer: ZoneLayer) -> &[Token] {
            match layer {
                ZoneLayer::Token => &self.tokens,
                _ => &[],
            }
        }
        fn lights(&self) -> &[Light] {
            &self.lights
        }
        fn lumens_levels(&self) -> &[LumensLevel] {
            &self.lumens
        }
        fn auras(&self) -> &[Aura] {
            &self.auras
        }
        fn player_darkness(&self) -> Option<&Region> {
            self.darkness.as_ref()
        }
        fn fog(&self) -> Option<&FogState> {
            self.fog.as_ref()
        }
        fn labels(&self) -> &[Label] {
            &self.labels
        }
        fn overlays(&self) -> &[Outline] {
            &self.overlays
        }
    }

    fn grey(v: f32) -> Color {
        Color::from_straight(v, v, v, 1.0)
    }

    fn full() -> Region {
        Region::rect(Rect::new(0.0, 0.0, 16.0, 16.0))
    }

    fn square_token(rect: Rect, color: Color) -> Token {
        Token { footprint: Region::rect(rect), ..Token::round(rect, color) }
    }

    fn render(zone: &ScriptedZone, prefs: &RenderPrefs) -> (SoftwareBackend, FrameOutcome) {
        let mut backend = SoftwareBackend::new(SIZE);
        let mut renderer = ZoneRenderer::new();
        let outcome = renderer.render(&mut backend, zone, ZoneCamera::default(), prefs);
        (backend, outcome)
    }

    fn px(b: &SoftwareBackend, x: u32, y: u32) -> Color {
        b.pixel(Attachment::Screen, x, y).unwrap()
    }

    // ── layer order ───────────────────────────────────────────────────────

    #[test]
    fn layer_order_is_fixed() {
        let pos = |l: FrameLayer| FRAME_LAYER_ORDER.iter().position(|&x| x == l).unwrap();
        assert_eq!(FRAME_LAYER_ORDER[0], FrameLayer::Board);
        assert_eq!(*FRAME_LAYER_ORDER.last().unwrap(), FrameLayer::Overlays);
        assert!(pos(FrameLayer::BackgroundDrawables) < pos(FrameLayer::Grid));
        assert!(pos(FrameLayer::Grid) < pos(FrameLayer::ObjectLayer));
        assert!(pos(FrameLayer::Lights) < pos(FrameLayer::Lumens));
        assert!(pos(FrameLayer::Lumens) < pos(FrameLayer::Auras));
        assert!(pos(FrameLayer::Auras) < pos(FrameLayer::PlayerDarkness));
        assert!(pos(FrameLayer::PlayerDarkness) < pos(FrameLayer::HiddenLayer));
        assert!(pos(FrameLayer::TokenLayer) < pos(FrameLayer::Fog));
        assert!(pos(FrameLayer::Fog) < pos(FrameLayer::AlwaysVisibleTokens));
        assert!(pos(FrameLayer::AlwaysVisibleTokens) < pos(FrameLayer::Labels));
    }

    #[test]
    fn only_light_lumens_aura_and_fog_are_isolated() {
        let isolated: Vec<_> = FRAME_LAYER_ORDER.iter().copied().filter(|l| l.is_isolated()).collect();
        assert_eq!(isolated, vec![FrameLayer::Lights, FrameLayer::Lumens, FrameLayer::Auras, FrameLayer::Fog]);
    }

    #[test]
    fn isolated_layers_follow_the_layer_predicate() {
        let zone = ScriptedZone {
            board: grey(0.5),
            background: vec![Drawable { region: full(), fill: Some(grey(0.2)), stroke: None }],
            lights: vec![Light { area: full(), color: Color::white() }],
            lumens: vec![LumensLevel { lumens: 40, lit: full(), dark: Region::new() }],
            auras: vec![Aura { area: full(), color: Color::black() }],
            darkness: Some(full()),
            fog: Some(FogState::default()),
            ..ScriptedZone::default()
        };
        let prefs = RenderPrefs { show_lumens_overlay: true, ..RenderPrefs::default() };
        let mut backend = SoftwareBackend::new(SIZE);
        let mut renderer = ZoneRenderer::new();
        renderer.render(&mut backend, &zone, ZoneCamera::default(), &prefs);

        let expected: Vec<_> = FRAME_LAYER_ORDER.iter().copied().filter(|l| l.is_isolated()).collect();
        assert_eq!(renderer.isolated_layers(), expected.as_slice());
    }

    #[test]
    fn empty_isolated_layers_are_not_composited() {
        let zone = ScriptedZone { board: grey(0.5), ..ScriptedZone::default() };
        let mut backend = SoftwareBackend::new(SIZE);
        let mut renderer = ZoneRenderer::new();
        renderer.render(&mut backend, &zone, ZoneCamera::default(), &RenderPrefs::default());
        assert!(renderer.isolated_layers().is_empty());
    }

    // ── scene ─────────────────────────────────────────────────────────────

    #[test]
    fn board_fills_the_frame() {
        let zone = ScriptedZone { board: grey(0.5), ..ScriptedZone::default() };
        let (b, outcome) = render(&zone, &RenderPrefs::default());
        assert_eq!(outcome, FrameOutcome::Rendered);
        assert!(px(&b, 0, 0).approx_eq(grey(0.5), 1e-6));
        assert!(px(&b, 15, 15).approx_eq(grey(0.5), 1e-6));
    }

    #[test]
    fn overtop_light_is_blended_at_light_opacity() {
        let light = Color::from_straight(1.0, 1.0, 0.0, 1.0);
        let zone = ScriptedZone {
            board: Color::black(),
            lights: vec![Light { area: full(), color: light }],
            ..ScriptedZone::default()
        };
        let prefs = RenderPrefs { light_overlay_opacity: 128, ..RenderPrefs::default() };
        let (b, _) = render(&zone, &prefs);

        let expected = light.with_opacity(128.0 / 255.0).over(Color::black());
        assert!(px(&b, 8, 8).approx_eq(expected, 1e-4));
    }

    #[test]
    fn overlapping_lights_blend_once_into_the_scene() {
        let light = Color::from_straight(1.0, 1.0, 1.0, 0.5);
        let zone = ScriptedZone {
            board: Color::black(),
            lights: vec![Light { area: full(), color: light }, Light { area: full(), color: light }],
            ..ScriptedZone::default()
        };
        let prefs = RenderPrefs { light_overlay_opacity: 255, ..RenderPrefs::default() };
        let (b, _) = render(&zone, &prefs);

        let layer = light.over(light);
        assert!(px(&b, 4, 4).approx_eq(layer.over(Color::black()), 1e-4));
    }

    #[test]
    fn environmental_light_keeps_scene_luminosity() {
        let zone = ScriptedZone {
            board: grey(0.5),
            lights: vec![Light { area: Region::rect(Rect::new(0.0, 0.0, 8.0, 16.0)), color: Color::from_straight(1.0, 0.0, 0.0, 1.0) }],
            ..ScriptedZone::default()
        };
        let prefs = RenderPrefs {
            light_overlay_opacity: 255,
            lighting_style: LightingStyle::Environmental,
            ..RenderPrefs::default()
        };
        let (b, _) = render(&zone, &prefs);

        let lit = px(&b, 2, 8);
        assert!(lit.r > lit.g);
        assert!((0.3 * lit.r + 0.59 * lit.g + 0.11 * lit.b - 0.5).abs() < 1e-3);
        assert!(px(&b, 12, 8).approx_eq(grey(0.5), 1e-5));
    }

    #[test]
    fn lumens_overlay_shows_intensity_as_grey() {
        let zone = ScriptedZone {
            board: Color::white(),
            lumens: vec![
                LumensLevel { lumens: 100, lit: Region::rect(Rect::new(4.0, 4.0, 8.0, 8.0)), dark: Region::new() },
                LumensLevel { lumens: 50, lit: full(), dark: Region::new() },
            ],
            ..ScriptedZone::default()
        };
        let prefs = RenderPrefs {
            show_lumens_overlay: true,
            lumens_overlay_opacity: 255,
            lumens_overlay_border_thickness: 0.0,
            ..RenderPrefs::default()
        };
        let (b, _) = render(&zone, &prefs);

        assert!(px(&b, 1, 1).approx_eq(grey(0.5), 1e-5));
        assert!(px(&b, 8, 8).approx_eq(Color::white(), 1e-5));
    }

    #[test]
    fn lumens_overlay_is_off_by_default() {
        let zone = ScriptedZone {
            board: Color::white(),
            lumens: vec![LumensLevel { lumens: 0, lit: full(), dark: full() }],
            ..ScriptedZone::default()
        };
        let (b, _) = render(&zone, &RenderPrefs::default());
        assert!(px(&b, 8, 8).approx_eq(Color::white(), 1e-6));
    }

    #[test]
    fn auras_and_darkness_darken_the_board() {
        let zone = ScriptedZone {
            board: Color::white(),
            auras: vec![Aura { area: Region::rect(Rect::new(0.0, 0.0, 8.0, 16.0)), color: Color::black() }],
            darkness: Some(Region::rect(Rect::new(8.0, 0.0, 8.0, 16.0))),
            ..ScriptedZone::default()
        };
        let prefs = RenderPrefs { aura_overlay_opacity: 255, darkness_opacity: 255, ..RenderPrefs::default() };
        let (b, _) = render(&zone, &prefs);

        assert!(px(&b, 2, 8).approx_eq(Color::black(), 1e-6));
        assert!(px(&b, 12, 8).approx_eq(Color::black(), 1e-6));
    }

    #[test]
    fn hidden_layer_is_drawn_for_the_gm_only() {
        let red = Color::from_straight(1.0, 0.0, 0.0, 1.0);
        let mut zone = ScriptedZone {
            board: Color::white(),
            hidden: vec![Drawable { region: full(), fill: Some(red), stroke: None }],
            ..ScriptedZone::default()
        };
        let (b, _) = render(&zone, &RenderPrefs::default());
        assert!(px(&b, 8, 8).approx_eq(Color::white(), 1e-6));

        zone.gm = true;
        let (b, _) = render(&zone, &RenderPrefs::default());
        assert!(px(&b, 8, 8).approx_eq(red, 1e-6));
    }

    // ── fog ───────────────────────────────────────────────────────────────

    #[test]
    fn fog_hides_all_but_the_visible_area() {
        let red = Color::from_straight(1.0, 0.0, 0.0, 1.0);
        let blue = Color::from_straight(0.0, 0.0, 1.0, 1.0);
        let mut figure = square_token(Rect::new(10.0, 2.0, 4.0, 4.0), red);
        figure.always_visible = true;

        let zone = ScriptedZone {
            board: Color::white(),
            tokens: vec![figure, square_token(Rect::new(10.0, 10.0, 4.0, 4.0), blue)],
            fog: Some(FogState {
                exposed: Region::rect(Rect::new(6.0, 0.0, 2.0, 16.0)),
                visible: Region::rect(Rect::new(0.0, 0.0, 6.0, 16.0)),
            }),
            ..ScriptedZone::default()
        };
        let prefs = RenderPrefs {
            fog_opacity: 255,
            fog_color: Color::black(),
            exposed_fog_color: Color::from_straight(0.0, 0.0, 0.0, 0.5),
            ..RenderPrefs::default()
        };
        let (b, _) = render(&zone, &prefs);

        // visible
        assert!(px(&b, 2, 8).approx_eq(Color::white(), 1e-6));
        // exposed
        assert!(px(&b, 7, 8).approx_eq(grey(0.5), 1e-5));
        // fogged, with the ordinary token hidden and the figure redrawn on top
        assert!(px(&b, 9, 8).approx_eq(Color::black(), 1e-6));
        assert!(px(&b, 12, 12).approx_eq(Color::black(), 1e-6));
        assert!(px(&b, 12, 4).approx_eq(red, 1e-6));
    }

    // ── labels and overlays ───────────────────────────────────────────────

    #[test]
    fn label_backdrop_is_centred_on_its_position() {
        let zone = ScriptedZone {
            board: Color::white(),
            labels: vec![Label {
                position: Vec2::new(12.0, 8.0),
                text: String::new(),
                background: Color::black(),
                border: Color::black(),
            }],
            ..ScriptedZone::default()
        };
        let (b, _) = render(&zone, &RenderPrefs::default());
        // one char cell: 15x22 px, spanning x 4.5..19.5
        assert!(px(&b, 12, 8).approx_eq(Color::black(), 1e-6));
        assert!(px(&b, 1, 8).approx_eq(Color::white(), 1e-6));
    }

    #[test]
    fn overlays_are_stroked_last() {
        let green = Color::from_straight(0.0, 1.0, 0.0, 1.0);
        let zone = ScriptedZone {
            board: Color::white(),
            fog: Some(FogState::default()),
            overlays: vec![Outline {
                points: vec![Vec2::new(0.0, 8.0), Vec2::new(16.0, 8.0)],
                closed: false,
                stroke: Stroke::new(green, 2.0),
            }],
            ..ScriptedZone::default()
        };
        let (b, _) = render(&zone, &RenderPrefs::default());
        assert!(px(&b, 8, 8).approx_eq(green, 1e-6));
        assert!(px(&b, 8, 2).approx_eq(Color::black(), 1e-6));
    }

    // ── session lifecycle ─────────────────────────────────────────────────

    #[test]
    fn placeholder_while_view_is_not_ready() {
        let zone = ScriptedZone { not_ready: true, ..ScriptedZone::default() };
        let mut backend = SoftwareBackend::new(Viewport::new(64, 32));
        let mut renderer = ZoneRenderer::new();

        let outcome = renderer.render(&mut backend, &zone, ZoneCamera::default(), &RenderPrefs::default());
        assert_eq!(outcome, FrameOutcome::Placeholder);
        assert_eq!(backend.pixel(Attachment::Screen, 32, 16), Some(PLACEHOLDER_DOT));
        assert_eq!(backend.pixel(Attachment::Screen, 18, 16), Some(PLACEHOLDER_DOT));
        assert_eq!(backend.pixel(Attachment::Screen, 0, 0), Some(PLACEHOLDER_BACKDROP));
        assert_eq!(backend.live_targets(), 0);
    }

    #[test]
    fn failed_allocation_skips_until_resize() {
        let zone = ScriptedZone { board: Color::white(), ..ScriptedZone::default() };
        let prefs = RenderPrefs::default();
        let mut backend = SoftwareBackend::new(SIZE).with_pixel_budget(300);
        let mut renderer = ZoneRenderer::new();

        assert_eq!(renderer.render(&mut backend, &zone, ZoneCamera::default(), &prefs), FrameOutcome::Skipped);
        assert!(renderer.is_failed());
        assert_eq!(backend.live_targets(), 0);

        // Same size: still failed even though memory is now available.
        backend.set_pixel_budget(None);
        assert_eq!(renderer.render(&mut backend, &zone, ZoneCamera::default(), &prefs), FrameOutcome::Skipped);

        backend.resize_screen(Viewport::new(8, 8));
        assert_eq!(renderer.render(&mut backend, &zone, ZoneCamera::default(), &prefs), FrameOutcome::Rendered);
        assert!(!renderer.is_failed());
        assert_eq!(renderer.compositor().size(), Some(Viewport::new(8, 8)));
    }

    #[test]
    fn screen_resize_recreates_targets() {
        let zone = ScriptedZone { board: Color::white(), ..ScriptedZone::default() };
        let mut backend = SoftwareBackend::new(SIZE);
        let mut renderer = ZoneRenderer::new();
        renderer.render(&mut backend, &zone, ZoneCamera::default(), &RenderPrefs::default());

        backend.resize_screen(Viewport::new(24, 10));
        let outcome = renderer.render(&mut backend, &zone, ZoneCamera::default(), &RenderPrefs::default());
        assert_eq!(outcome, FrameOutcome::Rendered);
        assert_eq!(backend.live_targets(), 3);
        assert!(backend.pixel(Attachment::Screen, 23, 9).unwrap().approx_eq(Color::white(), 1e-6));
    }

    #[test]
    fn zone_change_releases_targets_and_grid_cache() {
        let zone = ScriptedZone {
            board: Color::white(),
            grid: Some(GridSpec::new(GridKind::HexHorizontal, 8.0)),
            ..ScriptedZone::default()
        };
        let mut backend = SoftwareBackend::new(SIZE);
        let mut renderer = ZoneRenderer::new();
        renderer.render(&mut backend, &zone, ZoneCamera::default(), &RenderPrefs::default());
        assert_eq!(backend.live_targets(), 3);
        assert!(!renderer.grid().cache().is_empty());

        renderer.change_zone(&mut backend);
        assert_eq!(backend.live_targets(), 0);
        assert!(renderer.grid().cache().is_empty());

        renderer.shutdown(&mut backend);
        assert_eq!(backend.live_targets(), 0);
    }

    #[test]
    fn camera_zoom_scales_the_scene() {
        let red = Color::from_straight(1.0, 0.0, 0.0, 1.0);
        let zone = ScriptedZone {
            board: Color::white(),
            background: vec![Drawable { region: Region::rect(Rect::new(0.0, 0.0, 4.0, 4.0)), fill: Some(red), stroke: None }],
            ..ScriptedZone::default()
        };
        let mut backend = SoftwareBackend::new(SIZE);
        let mut renderer = ZoneRenderer::new();
        let camera = ZoneCamera::new(Vec2::zero(), 2.0);
        renderer.render(&mut backend, &zone, camera, &RenderPrefs::default());

        assert!(px(&backend, 7, 7).approx_eq(red, 1e-6));
        assert!(px(&backend, 9, 9).approx_eq(Color::white(), 1e-6));
    }
}
