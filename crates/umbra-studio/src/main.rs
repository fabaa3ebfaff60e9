mod demo;

use anyhow::Result;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

use umbra_engine::coords::{Vec2, Viewport, ZoneCamera};
use umbra_engine::core::{App, AppControl, FrameCtx};
use umbra_engine::device::GpuInit;
use umbra_engine::logging::{init_logging, LoggingConfig};
use umbra_engine::paint::Color;
use umbra_engine::render::GpuBackend;
use umbra_engine::window::{Runtime, RuntimeConfig};
use umbra_engine::zone::{FrameOutcome, RenderPrefs, ZoneRenderer};

use demo::DemoZone;

/// Frames the placeholder is shown for, standing in for zone loading.
const LOADING_FRAMES: u64 = 45;
const PAN_STEP_PX: f32 = 40.0;
const ZOOM_STEP: f32 = 1.25;

struct Studio {
    backend: Option<GpuBackend>,
    renderer: ZoneRenderer,
    zones: [DemoZone; 2],
    active: usize,
    loading_until: u64,

    camera: ZoneCamera,
    centred: bool,
    viewport: Viewport,
    prefs: RenderPrefs,

    last_outcome: Option<FrameOutcome>,
    zone_changed: bool,
}

impl Studio {
    fn new() -> Self {
        Self {
            backend: None,
            renderer: ZoneRenderer::new(),
            zones: [DemoZone::crypt(), DemoZone::ruins()],
            active: 0,
            loading_until: LOADING_FRAMES,
            camera: ZoneCamera::default(),
            centred: false,
            viewport: Viewport::default(),
            prefs: RenderPrefs {
                show_lumens_overlay: false,
                fog_opacity: 230,
                light_overlay_opacity: 80,
                ..RenderPrefs::default()
            },
            last_outcome: None,
            zone_changed: false,
        }
    }

    fn zone(&mut self) -> &mut DemoZone {
        &mut self.zones[self.active]
    }

    fn centre_camera(&mut self) {
        let bounds = self.zones[self.active].bounds();
        let screen_centre = Vec2::new(self.viewport.width as f32, self.viewport.height as f32) * 0.5;
        self.camera.pan = screen_centre - bounds.center() * self.camera.scale;
    }

    fn on_key(&mut self, key: KeyCode) -> AppControl {
        let centre = Vec2::new(self.viewport.width as f32, self.viewport.height as f32) * 0.5;
        match key {
            KeyCode::Escape => return AppControl::Exit,
            KeyCode::ArrowLeft => self.camera.pan.x += PAN_STEP_PX,
            KeyCode::ArrowRight => self.camera.pan.x -= PAN_STEP_PX,
            KeyCode::ArrowUp => self.camera.pan.y += PAN_STEP_PX,
            KeyCode::ArrowDown => self.camera.pan.y -= PAN_STEP_PX,
            KeyCode::Equal | KeyCode::NumpadAdd => self.camera.zoom_at(centre, ZOOM_STEP),
            KeyCode::Minus | KeyCode::NumpadSubtract => self.camera.zoom_at(centre, 1.0 / ZOOM_STEP),
            KeyCode::KeyL => {
                self.prefs.lighting_style = self.prefs.lighting_style.toggled();
                log::info!("lighting style: {:?}", self.prefs.lighting_style);
            }
            KeyCode::KeyO => {
                self.prefs.show_lumens_overlay = !self.prefs.show_lumens_overlay;
                log::info!("lumens overlay: {}", self.prefs.show_lumens_overlay);
            }
            KeyCode::KeyG => {
                let kind = self.zone().cycle_grid();
                log::info!("grid: {kind:?}");
            }
            KeyCode::KeyF => {
                let zone = self.zone();
                zone.fog_enabled = !zone.fog_enabled;
                log::info!("fog of war: {}", zone.fog_enabled);
            }
            KeyCode::KeyV => {
                let zone = self.zone();
                zone.gm = !zone.gm;
                log::info!("view: {}", if zone.gm { "GM" } else { "player" });
            }
            KeyCode::KeyN => {
                self.active = (self.active + 1) % self.zones.len();
                self.zone_changed = true;
                self.centred = false;
                log::info!("switching to zone {}", self.zones[self.active].name);
            }
            _ => {}
        }
        AppControl::Continue
    }
}

impl App for Studio {
    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                match event.physical_key {
                    PhysicalKey::Code(code) => self.on_key(code),
                    PhysicalKey::Unidentified(_) => AppControl::Continue,
                }
            }
            _ => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        self.viewport = ctx.window.physical_size();
        if !self.viewport.is_valid() {
            return AppControl::Continue;
        }

        if self.backend.is_none() {
            match GpuBackend::new(ctx.gpu.device(), ctx.gpu.queue(), ctx.gpu.surface_format()) {
                Ok(backend) => self.backend = Some(backend),
                Err(err) => {
                    log::error!("cannot start the renderer: {err}");
                    return AppControl::Exit;
                }
            }
        }

        if self.zone_changed {
            if let Some(backend) = self.backend.as_mut() {
                self.renderer.change_zone(backend);
            }
            self.loading_until = ctx.frame_index + LOADING_FRAMES;
            self.zone_changed = false;
        }
        let ready = ctx.frame_index >= self.loading_until;
        self.zones[self.active].ready = ready;
        if ready && !self.centred {
            self.centre_camera();
            self.centred = true;
        }

        let viewport = self.viewport;
        let Studio { backend, renderer, zones, active, camera, prefs, .. } = self;
        let Some(backend) = backend.as_mut() else { return AppControl::Exit };
        let zone = &zones[*active];

        let mut outcome = FrameOutcome::Skipped;
        let control = ctx.render(Color::black(), |_rctx, target| {
            backend.begin_frame(target.color_view, viewport);
            outcome = renderer.render(backend, zone, *camera, prefs);
            backend.end_frame();
        });

        if self.last_outcome != Some(outcome) {
            log::info!("{}: {outcome:?}", self.zones[self.active].name);
            self.last_outcome = Some(outcome);
        }
        control
    }

    fn on_window_closed(&mut self, _window_id: WindowId) {
        if let Some(mut backend) = self.backend.take() {
            self.renderer.shutdown(&mut backend);
        }
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());
    log::info!("arrows pan, +/- zoom, L lighting, O lumens, G grid, F fog, V GM/player, N next zone");

    Runtime::run(
        RuntimeConfig {
            title: "Umbra Studio".to_string(),
            ..RuntimeConfig::default()
        },
        GpuInit::default(),
        Studio::new(),
    )
}
