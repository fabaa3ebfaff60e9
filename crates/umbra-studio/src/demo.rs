//! Hand-built demo zones standing in for a campaign's view model.

use umbra_engine::coords::{Rect, Vec2};
use umbra_engine::geom::{Join, Region};
use umbra_engine::grid::{GridKind, GridSpec};
use umbra_engine::paint::Color;
use umbra_engine::zone::{
    Aura, BarOverlay, BarSide, Drawable, FogState, Label, Light, LumensLevel, Outline, Stroke, Token,
    TokenOverlay, ZoneLayer, ZoneView,
};

const CELL: f32 = 50.0;

pub struct DemoZone {
    pub name: &'static str,
    pub ready: bool,
    pub gm: bool,
    pub fog_enabled: bool,

    bounds: Rect,
    board: Color,
    grid: GridSpec,

    background: Vec<Drawable>,
    objects: Vec<Drawable>,
    hidden: Vec<Drawable>,
    tokens: Vec<Token>,
    hidden_tokens: Vec<Token>,

    lights: Vec<Light>,
    lumens: Vec<LumensLevel>,
    auras: Vec<Aura>,
    darkness: Region,
    fog: FogState,

    labels: Vec<Label>,
    overlays: Vec<Outline>,
}

fn cell_rect(col: f32, row: f32, cols: f32, rows: f32) -> Rect {
    Rect::new(col * CELL, row * CELL, cols * CELL, rows * CELL)
}

fn ring(center: Vec2, radius: f32, sides: usize) -> Vec<Vec2> {
    (0..sides)
        .map(|i| center + Vec2::from_angle(i as f32 / sides as f32 * std::f32::consts::TAU) * radius)
        .collect()
}

fn wall(points: &[Vec2]) -> Drawable {
    let mut region = Region::new();
    region.add_polyline(points);
    Drawable {
        region,
        fill: None,
        stroke: Some(Stroke::new(Color::from_rgba8(30, 26, 24, 255), 6.0).with_join(Join::Smooth)),
    }
}

fn floor(rect: Rect, color: Color) -> Drawable {
    Drawable { region: Region::rect(rect), fill: Some(color), stroke: None }
}

fn token(col: f32, row: f32, size: f32, color: Color) -> Token {
    Token::round(cell_rect(col, row, size, size), color)
}

fn light(center: Vec2, radius: f32, color: Color) -> Light {
    Light { area: Region::circle(center, radius), color }
}

impl DemoZone {
    /// Torch-lit crypt with a pillared hall, fog of war and a hidden trap.
    pub fn crypt() -> Self {
        let bounds = cell_rect(0.0, 0.0, 20.0, 14.0);
        let stone = Color::from_rgba8(96, 90, 82, 255);
        let hall = cell_rect(1.0, 1.0, 12.0, 8.0);
        let side_room = cell_rect(14.0, 2.0, 5.0, 10.0);

        let mut corridor = Region::rect(cell_rect(12.0, 5.0, 3.0, 2.0));
        corridor.append(&Region::rect(cell_rect(13.0, 5.5, 1.0, 1.0)));

        let pillars: Vec<Drawable> = [(4.0, 3.0), (9.0, 3.0), (4.0, 7.0), (9.0, 7.0)]
            .into_iter()
            .map(|(c, r)| Drawable {
                region: Region::circle(Vec2::new(c * CELL, r * CELL), CELL * 0.4),
                fill: Some(Color::from_rgba8(60, 56, 52, 255)),
                stroke: Some(Stroke::new(Color::black(), 2.0)),
            })
            .collect();

        let mut objects = vec![
            wall(&[
                hall.min(),
                Vec2::new(hall.max().x, hall.min().y),
                Vec2::new(hall.max().x, 5.0 * CELL),
            ]),
            wall(&[
                Vec2::new(hall.max().x, 7.0 * CELL),
                hall.max(),
                Vec2::new(hall.min().x, hall.max().y),
                hall.min(),
            ]),
        ];
        objects.extend(pillars);

        let hero_center = Vec2::new(6.5 * CELL, 5.5 * CELL);
        let mut hero = token(6.0, 5.0, 1.0, Color::from_rgba8(40, 110, 200, 255));
        hero.halo = Some(Color::from_rgba8(250, 220, 90, 255));
        hero.bar = Some(BarOverlay::TwoTone {
            value: 0.7,
            fill: Color::from_rgba8(40, 200, 60, 255),
            background: Color::from_rgba8(120, 20, 20, 255),
            side: BarSide::Bottom,
        });

        let mut goblin = token(10.0, 5.0, 1.0, Color::from_rgba8(90, 150, 60, 255));
        goblin.overlay = Some(TokenOverlay::X(Color::from_rgba8(200, 30, 30, 255)));
        goblin.bar = Some(BarOverlay::Segmented {
            value: 0.25,
            segments: 4,
            color: Color::from_rgba8(220, 60, 60, 255),
            side: BarSide::Top,
        });

        let mut ogre = token(15.0, 8.0, 2.0, Color::from_rgba8(140, 100, 70, 255));
        ogre.overlay = Some(TokenOverlay::Triangle(Color::from_rgba8(250, 200, 40, 255)));

        let mut statue = token(16.0, 3.0, 1.0, Color::from_rgba8(200, 200, 210, 255));
        statue.always_visible = true;
        statue.overlay = Some(TokenOverlay::Diamond(Color::black()));

        let mut trap_token = token(7.0, 8.0, 1.0, Color::from_straight(0.8, 0.1, 0.1, 0.6));
        trap_token.overlay = Some(TokenOverlay::Shade(Color::from_straight(0.0, 0.0, 0.0, 0.3)));

        let torches = [Vec2::new(2.0 * CELL, 2.0 * CELL), Vec2::new(11.0 * CELL, 8.0 * CELL)];
        let warm = Color::from_straight(1.0, 0.75, 0.35, 0.9);
        let mut lights: Vec<Light> = torches.iter().map(|&c| light(c, 4.0 * CELL, warm)).collect();
        lights.push(light(Vec2::new(16.5 * CELL, 10.0 * CELL), 3.0 * CELL, Color::from_straight(0.4, 0.6, 1.0, 0.9)));

        let mut dim = Region::new();
        let mut bright = Region::new();
        for &c in &torches {
            dim.append(&Region::circle(c, 4.0 * CELL));
            bright.append(&Region::circle(c, 2.0 * CELL));
        }
        let lumens = vec![
            LumensLevel { lumens: 100, lit: bright, dark: Region::new() },
            LumensLevel { lumens: 30, lit: dim, dark: Region::new() },
            LumensLevel {
                lumens: -20,
                lit: Region::new(),
                dark: Region::circle(Vec2::new(16.0 * CELL, 6.0 * CELL), 1.5 * CELL),
            },
        ];

        let vision = ring(hero_center, 5.0 * CELL, 64);
        let mut exposed = Region::rect(cell_rect(0.0, 0.0, 15.0, 14.0));
        exposed.append(&Region::rect(cell_rect(3.0, 3.0, 2.0, 2.0)));

        Self {
            name: "Crypt",
            ready: true,
            gm: true,
            fog_enabled: true,
            bounds,
            board: Color::from_rgba8(24, 22, 20, 255),
            grid: GridSpec::new(GridKind::Square, CELL),
            background: vec![
                floor(bounds, Color::from_rgba8(44, 40, 36, 255)),
                floor(hall, stone),
                floor(side_room, stone),
                Drawable { region: corridor, fill: Some(stone), stroke: None },
            ],
            objects,
            hidden: vec![Drawable {
                region: Region::rect(cell_rect(7.0, 8.0, 1.0, 1.0)),
                fill: Some(Color::from_straight(0.8, 0.0, 0.0, 0.4)),
                stroke: Some(Stroke::new(Color::from_rgba8(200, 0, 0, 255), 2.0)),
            }],
            tokens: vec![hero, goblin, ogre, statue],
            hidden_tokens: vec![trap_token],
            lights,
            lumens,
            auras: vec![Aura {
                area: Region::circle(hero_center, 2.0 * CELL),
                color: Color::from_straight(0.3, 0.5, 1.0, 0.8),
            }],
            darkness: Region::circle(Vec2::new(16.0 * CELL, 6.0 * CELL), 1.5 * CELL),
            fog: FogState { exposed, visible: Region::polygon(&vision) },
            labels: vec![
                Label {
                    position: Vec2::new(7.0 * CELL, 0.5 * CELL),
                    text: "Pillared Hall".into(),
                    background: Color::from_straight(0.0, 0.0, 0.0, 0.6),
                    border: Color::from_rgba8(220, 210, 190, 255),
                },
                Label {
                    position: Vec2::new(16.5 * CELL, 1.5 * CELL),
                    text: "Shrine".into(),
                    background: Color::from_straight(0.0, 0.0, 0.0, 0.6),
                    border: Color::from_rgba8(220, 210, 190, 255),
                },
            ],
            overlays: vec![
                Outline {
                    points: vision,
                    closed: true,
                    stroke: Stroke::new(Color::from_straight(1.0, 1.0, 1.0, 0.5), 1.5),
                },
                Outline {
                    points: vec![
                        hero_center,
                        Vec2::new(8.5 * CELL, 5.5 * CELL),
                        Vec2::new(8.5 * CELL, 6.5 * CELL),
                        Vec2::new(10.0 * CELL, 6.5 * CELL),
                    ],
                    closed: false,
                    stroke: Stroke::new(Color::from_rgba8(255, 230, 0, 255), 3.0).with_join(Join::Round),
                },
            ],
        }
    }

    /// Open ruins on a hex grid, lit by moonlight only.
    pub fn ruins() -> Self {
        let bounds = cell_rect(0.0, 0.0, 24.0, 16.0);
        let grass = Color::from_rgba8(58, 84, 48, 255);

        let mut courtyard = Region::rect(cell_rect(6.0, 4.0, 10.0, 8.0));
        courtyard.append(&Region::rect(cell_rect(9.0, 6.0, 4.0, 4.0)));

        let ranger_center = Vec2::new(11.0 * CELL, 8.0 * CELL);
        let mut ranger = token(10.5, 7.5, 1.0, Color::from_rgba8(30, 120, 90, 255));
        ranger.halo = Some(Color::white());
        ranger.bar = Some(BarOverlay::Single { value: 0.9, color: Color::from_rgba8(40, 200, 60, 255), side: BarSide::Left });

        let mut wolf = token(15.0, 9.0, 1.0, Color::from_rgba8(110, 110, 120, 255));
        wolf.overlay = Some(TokenOverlay::Dot(Color::from_rgba8(250, 250, 60, 255)));
        let mut bat = token(4.0, 3.0, 1.0, Color::from_rgba8(70, 50, 80, 255));
        bat.overlay = Some(TokenOverlay::Cross(Color::white()));

        let vision = ring(ranger_center, 6.0 * CELL, 48);

        Self {
            name: "Ruins",
            ready: true,
            gm: true,
            fog_enabled: true,
            bounds,
            board: grass,
            grid: GridSpec::new(GridKind::HexHorizontal, CELL),
            background: vec![Drawable {
                region: courtyard,
                fill: Some(Color::from_rgba8(120, 112, 100, 255)),
                stroke: Some(Stroke::new(Color::from_rgba8(50, 46, 40, 255), 4.0)),
            }],
            objects: vec![wall(&[
                Vec2::new(6.0 * CELL, 4.0 * CELL),
                Vec2::new(16.0 * CELL, 4.0 * CELL),
                Vec2::new(16.0 * CELL, 9.0 * CELL),
            ])],
            hidden: Vec::new(),
            tokens: vec![ranger, wolf, bat],
            hidden_tokens: Vec::new(),
            lights: vec![light(ranger_center, 3.0 * CELL, Color::from_straight(0.7, 0.8, 1.0, 0.8))],
            lumens: Vec::new(),
            auras: Vec::new(),
            darkness: Region::new(),
            fog: FogState { exposed: Region::rect(cell_rect(3.0, 2.0, 16.0, 12.0)), visible: Region::polygon(&vision) },
            labels: vec![Label {
                position: Vec2::new(11.0 * CELL, 3.5 * CELL),
                text: "Old Courtyard".into(),
                background: Color::from_straight(0.0, 0.0, 0.0, 0.5),
                border: Color::white(),
            }],
            overlays: vec![Outline {
                points: vision,
                closed: true,
                stroke: Stroke::new(Color::from_straight(1.0, 1.0, 1.0, 0.4), 1.0),
            }],
        }
    }

    #[inline]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn cycle_grid(&mut self) -> GridKind {
        self.grid.kind = match self.grid.kind {
            GridKind::Square => GridKind::HexHorizontal,
            GridKind::HexHorizontal => GridKind::HexVertical,
            GridKind::HexVertical => GridKind::Isometric,
            GridKind::Isometric => GridKind::Square,
        };
        self.grid.kind
    }
}

impl ZoneView for DemoZone {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn is_gm_view(&self) -> bool {
        self.gm
    }

    fn board_color(&self) -> Color {
        self.board
    }

    fn grid(&self) -> Option<GridSpec> {
        Some(self.grid)
    }

    fn drawables(&self, layer: ZoneLayer) -> &[Drawable] {
        match layer {
            ZoneLayer::Background => &self.background,
            ZoneLayer::Object => &self.objects,
            ZoneLayer::Hidden => &self.hidden,
            ZoneLayer::Token => &[],
        }
    }

    fn tokens(&self, layer: ZoneLayer) -> &[Token] {
        match layer {
            ZoneLayer::Token => &self.tokens,
            ZoneLayer::Hidden => &self.hidden_tokens,
            ZoneLayer::Background | ZoneLayer::Object => &[],
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
        (!self.gm && !self.darkness.is_empty()).then_some(&self.darkness)
    }

    fn fog(&self) -> Option<&FogState> {
        self.fog_enabled.then_some(&self.fog)
    }

    fn labels(&self) -> &[Label] {
        &self.labels
    }

    fn overlays(&self) -> &[Outline] {
        &self.overlays
    }
}
