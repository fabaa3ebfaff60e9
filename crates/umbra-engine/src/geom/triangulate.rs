use crate::coords::Vec2;

use super::flatten::Flattener;
use super::mesh::Mesh;
use super::path::Region;

/// Turns regions into fill meshes.
///
/// Contours are related to each other with a single-point test: a contour's
/// parent is the smallest larger contour containing its *first vertex*. Even
/// nesting depths are filled, odd depths are holes of their parent, so a hole
/// inside an island is cut out of that island. Well-formed region iterators
/// never interleave partially overlapping siblings, so this is enough in
/// practice; overlapping input produces a best-effort mesh.
#[derive(Debug, Default)]
pub struct AreaTriangulator {
    flattener: Flattener,

    // scratch, reused across calls
    candidates: Vec<usize>,
    areas: Vec<f32>,
    parents: Vec<Option<usize>>, // candidate positions
    depths: Vec<usize>,
    holes: Vec<usize>,
    coords: Vec<f64>,
    hole_starts: Vec<usize>,

    meshes: Vec<Mesh>,
    used: usize,

    warned_failure: bool,
}

impl AreaTriangulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Triangulates `region` into one mesh per "outer contour + its holes" group
    /// and one per standalone contour.
    ///
    /// Empty or degenerate regions yield an empty slice. The slice borrows the
    /// triangulator and is invalidated by the next call.
    pub fn triangulate(&mut self, region: &Region) -> &[Mesh] {
        self.used = 0;
        self.flattener.flatten(region);

        self.candidates.clear();
        self.candidates.extend(
            self.flattener
                .spans()
                .iter()
                .enumerate()
                .filter(|(_, span)| span.len >= 3)
                .map(|(i, _)| i),
        );

        match self.candidates.len() {
            0 => {}
            1 => {
                let sub = self.candidates[0];
                self.emit_group(sub, &[]);
            }
            _ => self.triangulate_nested(),
        }

        &self.meshes[..self.used]
    }

    fn triangulate_nested(&mut self) {
        let n = self.candidates.len();

        self.areas.clear();
        for &sub in &self.candidates {
            self.areas.push(signed_area(self.flattener.subpath(sub).points).abs());
        }

        // Parent: the smallest strictly larger contour holding the first vertex.
        self.parents.clear();
        for k in 0..n {
            let first = self.flattener.subpath(self.candidates[k]).points[0];
            let mut parent = None;
            let mut parent_area = f32::INFINITY;
            for j in 0..n {
                let area = self.areas[j];
                if j == k || area <= self.areas[k] || area >= parent_area {
                    continue;
                }
                if contains_point(self.flattener.subpath(self.candidates[j]).points, first) {
                    parent = Some(j);
                    parent_area = area;
                }
            }
            self.parents.push(parent);
        }

        // Parents are strictly larger, so every chain ends.
        self.depths.clear();
        for k in 0..n {
            let mut depth = 0;
            let mut at = self.parents[k];
            while let Some(p) = at {
                depth += 1;
                at = self.parents[p];
            }
            self.depths.push(depth);
        }

        let mut holes = std::mem::take(&mut self.holes);
        for k in 0..n {
            if self.depths[k] % 2 == 1 {
                continue;
            }
            holes.clear();
            holes.extend(
                (0..n)
                    .filter(|&h| self.parents[h] == Some(k) && self.depths[h] % 2 == 1)
                    .map(|h| self.candidates[h]),
            );
            self.emit_group(self.candidates[k], &holes);
        }
        self.holes = holes;
    }

    /// Ear-clips one outer contour (subpath index) with the given holes (subpath indices).
    fn emit_group(&mut self, outer: usize, holes: &[usize]) {
        self.coords.clear();
        self.hole_starts.clear();

        let mut vertex_count = 0;
        for (i, &sub) in std::iter::once(&outer).chain(holes).enumerate() {
            if i > 0 {
                self.hole_starts.push(vertex_count);
            }
            let points = self.flattener.subpath(sub).points;
            for p in points {
                self.coords.push(p.x as f64);
                self.coords.push(p.y as f64);
            }
            vertex_count += points.len();
        }

        let indices = match earcutr::earcut(&self.coords, &self.hole_starts, 2) {
            Ok(indices) => indices,
            Err(err) => {
                if !self.warned_failure {
                    log::debug!("AreaTriangulator: ear clipping failed ({err:?}); contour skipped");
                    self.warned_failure = true;
                }
                return;
            }
        };
        if indices.len() < 3 {
            return;
        }

        if self.used == self.meshes.len() {
            self.meshes.push(Mesh::new());
        }
        let mesh = &mut self.meshes[self.used];
        mesh.clear();
        self.used += 1;

        for xy in self.coords.chunks_exact(2) {
            mesh.push_vertex(Vec2::new(xy[0] as f32, xy[1] as f32));
        }
        for tri in indices.chunks_exact(3) {
            mesh.push_triangle(tri[0] as u32, tri[1] as u32, tri[2] as u32);
        }
    }
}

/// Even-odd point-in-polygon test (the polygon is implicitly closed).
pub fn contains_point(polygon: &[Vec2], p: Vec2) -> bool {
    let mut inside = false;
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Signed polygon area (positive for counter-clockwise in a y-up space).
pub fn signed_area(polygon: &[Vec2]) -> f32 {
    let n = polygon.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        sum += polygon[i].cross(polygon[(i + 1) % n]);
    }
    sum * 0.5
}
