use crate::coords::{Rect, Vec2};

/// Triangle mesh in render space.
///
/// `vertices` holds flat `x, y` pairs; `indices` holds three vertex indices per
/// triangle. Meshes are ephemeral: builders reuse them between draw calls, so
/// a borrowed mesh is only valid until the builder is used again.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl Mesh {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties the mesh, keeping its allocations.
    #[inline]
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 2
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn vertex(&self, index: usize) -> Vec2 {
        Vec2::new(self.vertices[index * 2], self.vertices[index * 2 + 1])
    }

    /// Appends a vertex and returns its index.
    #[inline]
    pub fn push_vertex(&mut self, p: Vec2) -> u32 {
        let index = self.vertex_count() as u32;
        self.vertices.push(p.x);
        self.vertices.push(p.y);
        index
    }

    #[inline]
    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Appends a quad as two triangles `(a, b, c)` and `(a, c, d)`.
    #[inline]
    pub fn push_quad(&mut self, a: u32, b: u32, c: u32, d: u32) {
        self.push_triangle(a, b, c);
        self.push_triangle(a, c, d);
    }

    /// Iterates triangles as vertex triples.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec2; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |t| {
            [
                self.vertex(t[0] as usize),
                self.vertex(t[1] as usize),
                self.vertex(t[2] as usize),
            ]
        })
    }

    /// Sum of the absolute triangle areas.
    pub fn area(&self) -> f32 {
        self.triangles()
            .map(|[a, b, c]| ((b - a).cross(c - a) * 0.5).abs())
            .sum()
    }

    /// Bounds of the vertices referenced by at least one triangle.
    pub fn bounds(&self) -> Option<Rect> {
        Rect::from_points(self.indices.iter().map(|&i| self.vertex(i as usize)))
    }

    /// Every index refers to an existing vertex.
    pub fn indices_in_range(&self) -> bool {
        let n = self.vertex_count() as u32;
        self.indices.len() % 3 == 0 && self.indices.iter().all(|&i| i < n)
    }
}
