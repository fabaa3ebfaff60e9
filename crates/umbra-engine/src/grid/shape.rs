use std::collections::HashMap;

use crate::coords::Vec2;

/// Grid geometry families.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum GridKind {
    #[default]
    Square,
    /// Flat-topped hexes stacked in vertical columns.
    HexVertical,
    /// Pointy-topped hexes laid out in horizontal rows.
    HexHorizontal,
    /// Diamonds twice as wide as they are tall.
    Isometric,
}

/// Grid parameters consumed from the zone.
///
/// `size` is the cell pitch in model units: square side, hex width across flats,
/// or diamond height. `offset` shifts the lattice origin.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GridSpec {
    pub kind: GridKind,
    pub size: f32,
    pub offset: Vec2,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self { kind: GridKind::Square, size: 50.0, offset: Vec2::zero() }
    }
}

impl GridSpec {
    pub fn new(kind: GridKind, size: f32) -> Self {
        Self { kind, size, offset: Vec2::zero() }
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    #[inline]
    pub fn is_drawable(&self) -> bool {
        self.size.is_finite() && self.size > 0.0
    }

    /// Hex circumradius (centre to vertex).
    #[inline]
    pub fn hex_radius(&self) -> f32 {
        self.size / 3f32.sqrt()
    }

    /// Distance between neighbouring cell centres as `(along rows, between rows)`.
    pub fn pitch(&self) -> (f32, f32) {
        match self.kind {
            GridKind::Square => (self.size, self.size),
            GridKind::HexHorizontal => (self.size, 1.5 * self.hex_radius()),
            GridKind::HexVertical => (1.5 * self.hex_radius(), self.size),
            GridKind::Isometric => (2.0 * self.size, 0.5 * self.size),
        }
    }

    /// Centre of cell `(col, row)` in model space.
    pub fn cell_center(&self, col: i32, row: i32) -> Vec2 {
        let (px, py) = self.pitch();
        let local = match self.kind {
            GridKind::Square => Vec2::new((col as f32 + 0.5) * px, (row as f32 + 0.5) * py),
            GridKind::HexHorizontal | GridKind::Isometric => {
                let shift = if row.rem_euclid(2) == 1 { px * 0.5 } else { 0.0 };
                Vec2::new(col as f32 * px + shift, row as f32 * py)
            }
            GridKind::HexVertical => {
                let shift = if col.rem_euclid(2) == 1 { py * 0.5 } else { 0.0 };
                Vec2::new(col as f32 * px, row as f32 * py + shift)
            }
        };
        local + self.offset
    }
}

/// Cache key: grid kind plus the exact cell size.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct GridCacheKey {
    pub kind: GridKind,
    size_bits: u32,
}

impl GridCacheKey {
    pub fn new(kind: GridKind, size: f32) -> Self {
        Self { kind, size_bits: size.to_bits() }
    }

    #[inline]
    pub fn size(&self) -> f32 {
        f32::from_bits(self.size_bits)
    }
}

impl From<&GridSpec> for GridCacheKey {
    fn from(spec: &GridSpec) -> Self {
        Self::new(spec.kind, spec.size)
    }
}

/// Per-cell edge polylines relative to the cell centre, keyed by kind and size.
///
/// Each polyline covers the edges a cell "owns" so that tiling draws every
/// lattice edge exactly once. Asking for a size other than the cached one
/// evicts everything.
#[derive(Debug, Default)]
pub struct GridShapeCache {
    shapes: HashMap<GridCacheKey, Vec<Vec2>>,
    size_bits: Option<u32>,
    evictions: usize,
}

impl GridShapeCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// How many times a size change emptied the cache.
    #[inline]
    pub fn evictions(&self) -> usize {
        self.evictions
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
        self.size_bits = None;
    }

    /// Returns the cell polyline for `key`, building it on first use.
    pub fn shape(&mut self, key: GridCacheKey) -> &[Vec2] {
        if self.size_bits.is_some_and(|bits| bits != key.size_bits) {
            log::debug!("grid shape cache: size changed to {}; evicting {} shapes", key.size(), self.shapes.len());
            self.shapes.clear();
            self.evictions += 1;
        }
        self.size_bits = Some(key.size_bits);
        self.shapes.entry(key).or_insert_with(|| build_cell(key.kind, key.size()))
    }
}

fn build_cell(kind: GridKind, size: f32) -> Vec<Vec2> {
    let r = size / 3f32.sqrt();
    let at = |deg: f32| Vec2::from_angle(deg.to_radians()) * r;
    match kind {
        // Left and top edges.
        GridKind::Square => {
            let h = size * 0.5;
            vec![Vec2::new(-h, h), Vec2::new(-h, -h), Vec2::new(h, -h)]
        }
        // Left, upper-left and upper-right edges (model space is y-down).
        GridKind::HexHorizontal => vec![at(150.0), at(210.0), at(270.0), at(330.0)],
        // Same edges with the axes swapped: top, upper-left and lower-left.
        GridKind::HexVertical => [150.0, 210.0, 270.0, 330.0]
            .into_iter()
            .map(|deg| {
                let p = at(deg);
                Vec2::new(p.y, p.x)
            })
            .collect(),
        // Upper two edges of the diamond.
        GridKind::Isometric => vec![Vec2::new(-size, 0.0), Vec2::new(0.0, -size * 0.5), Vec2::new(size, 0.0)],
    }
}
