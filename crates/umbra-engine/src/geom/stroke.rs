use std::f32::consts::{PI, TAU};

use crate::coords::Vec2;

use super::mesh::Mesh;

/// Geometry connecting two stroke segments at a shared vertex.
///
/// Also selects the end caps of open polylines: `Round` gets half-circle caps,
/// the others end flat at the endpoint.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum Join {
    /// Miter: the offset lines are extended to their intersection.
    #[default]
    Pointy,
    /// Bevel: one triangle fills the gap on the outer side.
    Smooth,
    /// A fan of arc triangles fills the gap on the outer side.
    Round,
}

/// Miters longer than this many half widths fall back to a bevel.
pub const MITER_LIMIT: f32 = 10.0;

/// Target length of one arc side, in screen pixels.
pub const ARC_SIDE_PX: f32 = 4.0;

/// Lower bound on the side count of a full circle.
pub const MIN_CIRCLE_SIDES: usize = 20;

/// Side count for a full circle of `radius` model units when one screen pixel
/// spans `pixel_size` model units.
pub fn estimate_circle_sides(radius: f32, pixel_size: f32) -> usize {
    let circumference_px = TAU * radius.abs() / pixel_size.max(1e-6);
    let sides = (circumference_px / ARC_SIDE_PX).ceil();
    if sides.is_finite() {
        (sides as usize).clamp(MIN_CIRCLE_SIDES, 4096)
    } else {
        MIN_CIRCLE_SIDES
    }
}

/// Mesh indices of the offset points around one polyline vertex.
///
/// `in_*` are where the incoming segment ends, `out_*` where the outgoing one
/// starts. They coincide except on the outer side of a bevel or round join.
#[derive(Debug, Copy, Clone, Default)]
struct VertexJoin {
    in_left: u32,
    in_right: u32,
    out_left: u32,
    out_right: u32,
}

impl VertexJoin {
    fn same(left: u32, right: u32) -> Self {
        Self { in_left: left, in_right: right, out_left: left, out_right: right }
    }
}

/// Converts polylines (render space) into constant-width outline meshes.
///
/// Owns its scratch buffers and output mesh; the returned mesh is valid until
/// the next call.
#[derive(Debug)]
pub struct PathStroker {
    pixel_size: f32,
    points: Vec<Vec2>,
    joins: Vec<VertexJoin>,
    mesh: Mesh,
}

impl Default for PathStroker {
    fn default() -> Self {
        Self {
            pixel_size: 1.0,
            points: Vec::new(),
            joins: Vec::new(),
            mesh: Mesh::new(),
        }
    }
}

impl PathStroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Model units covered by one screen pixel; drives arc tessellation density.
    pub fn set_pixel_size(&mut self, pixel_size: f32) {
        if pixel_size.is_finite() && pixel_size > 0.0 {
            self.pixel_size = pixel_size;
        }
    }

    #[inline]
    pub fn pixel_size(&self) -> f32 {
        self.pixel_size
    }

    /// Number of triangles used for an arc of `sweep` radians at `radius`.
    pub fn arc_segments(&self, radius: f32, sweep: f32) -> usize {
        let sides = estimate_circle_sides(radius, self.pixel_size) as f32;
        // Small slack so exact fractions of a turn don't round up an extra side.
        ((sides * sweep.abs() / TAU - 1e-4).ceil() as usize).max(1)
    }

    /// Strokes `points` with `width`, joining interior vertices with `join`.
    ///
    /// Closed polylines also join the last vertex back to the first. Empty input
    /// or a non-positive width yields an empty mesh.
    pub fn stroke(&mut self, points: &[Vec2], width: f32, join: Join, closed: bool) -> &Mesh {
        self.mesh.clear();
        if !(width > 0.0) || !width.is_finite() {
            return &self.mesh;
        }

        self.points.clear();
        for &p in points {
            if self.points.last() != Some(&p) {
                self.points.push(p);
            }
        }
        if closed {
            while self.points.len() >= 2 && self.points.last() == self.points.first() {
                self.points.pop();
            }
        }

        let hw = width * 0.5;
        match self.points.len() {
            0 => {}
            1 => self.stroke_dot(hw, join),
            2 => self.stroke_segment(hw, join),
            _ => self.stroke_polyline(hw, join, closed),
        }
        &self.mesh
    }

    fn stroke_dot(&mut self, hw: f32, join: Join) {
        let c = self.points[0];
        match join {
            Join::Round => {
                let center = self.mesh.push_vertex(c);
                let start = self.mesh.push_vertex(c + Vec2::new(hw, 0.0));
                self.add_arc(center, c, hw, 0.0, TAU, start);
            }
            Join::Pointy | Join::Smooth => {
                let a = self.mesh.push_vertex(c + Vec2::new(-hw, -hw));
                let b = self.mesh.push_vertex(c + Vec2::new(hw, -hw));
                let d = self.mesh.push_vertex(c + Vec2::new(hw, hw));
                let e = self.mesh.push_vertex(c + Vec2::new(-hw, hw));
                self.mesh.push_quad(a, b, d, e);
            }
        }
    }

    fn stroke_segment(&mut self, hw: f32, join: Join) {
        let (a, b) = (self.points[0], self.points[1]);
        let start = self.cap(a, b - a, hw, join, true);
        let end = self.cap(b, b - a, hw, join, false);
        self.mesh.push_quad(start.out_left, start.out_right, end.in_right, end.in_left);
    }

    fn stroke_polyline(&mut self, hw: f32, join: Join, closed: bool) {
        let n = self.points.len();
        self.joins.clear();

        for i in 0..n {
            let p = self.points[i];
            let vj = if !closed && i == 0 {
                self.cap(p, self.points[1] - p, hw, join, true)
            } else if !closed && i == n - 1 {
                self.cap(p, p - self.points[n - 2], hw, join, false)
            } else {
                let prev = self.points[(i + n - 1) % n];
                let next = self.points[(i + 1) % n];
                self.join(prev, p, next, hw, join)
            };
            self.joins.push(vj);
        }

        let segments = if closed { n } else { n - 1 };
        for i in 0..segments {
            let a = self.joins[i];
            let b = self.joins[(i + 1) % n];
            self.mesh.push_quad(a.out_left, a.out_right, b.in_right, b.in_left);
        }
    }

    /// Endpoint offsets, plus a half-circle cap for round strokes.
    ///
    /// `dir` is the direction of the segment touching the endpoint.
    fn cap(&mut self, p: Vec2, dir: Vec2, hw: f32, join: Join, start: bool) -> VertexJoin {
        let n = dir.normalized().perp() * hw;
        let left = self.mesh.push_vertex(p + n);
        let right = self.mesh.push_vertex(p - n);

        if join == Join::Round {
            let center = self.mesh.push_vertex(p);
            // Start caps sweep left → back → right, end caps right → front → left.
            if start {
                self.add_arc(center, p, hw, n.angle(), PI, left);
            } else {
                self.add_arc(center, p, hw, (-n).angle(), PI, right);
            }
        }
        VertexJoin::same(left, right)
    }

    /// Offsets around interior vertex `b` of the path `a → b → c`.
    fn join(&mut self, a: Vec2, b: Vec2, c: Vec2, hw: f32, join: Join) -> VertexJoin {
        let d1 = (b - a).normalized();
        let d2 = (c - b).normalized();
        let n1 = d1.perp();
        let n2 = d2.perp();
        let cross = d1.cross(d2);
        let dot = d1.dot(d2);

        // Straight continuation: no join geometry.
        if cross.abs() < 1e-6 && dot > 0.0 {
            let left = self.mesh.push_vertex(b + n1 * hw);
            let right = self.mesh.push_vertex(b - n1 * hw);
            return VertexJoin::same(left, right);
        }

        let miter = (n1 + n2).normalized();
        let cos_half = miter.dot(n1);

        if join == Join::Pointy && cos_half > 1.0 / MITER_LIMIT {
            let len = hw / cos_half;
            let left = self.mesh.push_vertex(b + miter * len);
            let right = self.mesh.push_vertex(b - miter * len);
            return VertexJoin::same(left, right);
        }

        // Bevel / round: the inner side meets at the miter point, the outer side
        // keeps both segment offsets and the gap between them is filled.
        let bends_left = cross >= 0.0;
        let inner_len = if cos_half > 1e-4 { (hw / cos_half).min(hw * MITER_LIMIT) } else { 0.0 };
        let inner_dir = if bends_left { miter } else { -miter };
        let inner = self.mesh.push_vertex(b + inner_dir * inner_len);

        let outer_sign = if bends_left { -1.0 } else { 1.0 };
        let center = self.mesh.push_vertex(b);
        let outer_in = self.mesh.push_vertex(b + n1 * (hw * outer_sign));

        let outer_out = if join == Join::Round {
            // Sweep through the exact turning angle, in the direction of the turn.
            let turn = cross.atan2(dot).abs();
            let sweep = if bends_left { turn } else { -turn };
            let start_angle = (n1 * outer_sign).angle();
            self.add_arc(center, b, hw, start_angle, sweep, outer_in)
        } else {
            let v = self.mesh.push_vertex(b + n2 * (hw * outer_sign));
            self.mesh.push_triangle(center, outer_in, v);
            v
        };

        // The segment quads end on the inner→outer diagonals; close the wedge at `b`.
        self.mesh.push_triangle(inner, outer_in, center);
        self.mesh.push_triangle(inner, center, outer_out);

        if bends_left {
            VertexJoin { in_left: inner, in_right: outer_in, out_left: inner, out_right: outer_out }
        } else {
            VertexJoin { in_left: outer_in, in_right: inner, out_left: outer_out, out_right: inner }
        }
    }

    /// Emits an arc fan around `center_index`, starting at the existing vertex
    /// `first` (which sits at `start_angle`). Returns the index of the last arc vertex.
    fn add_arc(
        &mut self,
        center_index: u32,
        center: Vec2,
        radius: f32,
        start_angle: f32,
        sweep: f32,
        first: u32,
    ) -> u32 {
        let segments = self.arc_segments(radius, sweep);
        let step = sweep / segments as f32;
        let mut prev = first;
        for s in 1..=segments {
            let angle = start_angle + step * s as f32;
            let v = self.mesh.push_vertex(center + Vec2::from_angle(angle) * radius);
            self.mesh.push_triangle(center_index, prev, v);
            prev = v;
        }
        prev
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;
    use crate::coords::Rect;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    // ── empty / degenerate ────────────────────────────────────────────────

    #[test]
    fn empty_polyline_yields_empty_mesh() {
        let mut s = PathStroker::new();
        assert!(s.stroke(&[], 2.0, Join::Round, false).is_empty());
    }

    #[test]
    fn zero_width_yields_empty_mesh() {
        let mut s = PathStroker::new();
        let pts = [Vec2::new(0.0, 0.0), Vec2::new(5.0, 0.0)];
        assert!(s.stroke(&pts, 0.0, Join::Pointy, false).is_empty());
    }

    #[test]
    fn single_point_square_dot() {
        let mut s = PathStroker::new();
        let mesh = s.stroke(&[Vec2::new(1.0, 1.0)], 2.0, Join::Pointy, false);
        assert_eq!(mesh.bounds(), Some(Rect::new(0.0, 0.0, 2.0, 2.0)));
        assert!(approx(mesh.area(), 4.0));
    }

    #[test]
    fn single_point_round_dot_is_a_circle() {
        let mut s = PathStroker::new();
        let mesh = s.stroke(&[Vec2::new(0.0, 0.0)], 20.0, Join::Round, false);
        let area = mesh.area();
        assert!(area > 0.97 * PI * 100.0 && area <= PI * 100.0 + 1e-3);
    }

    #[test]
    fn duplicate_points_collapse() {
        let mut s = PathStroker::new();
        let pts = [Vec2::new(0.0, 0.0), Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0)];
        let mesh = s.stroke(&pts, 2.0, Join::Pointy, false);
        assert!(approx(mesh.area(), 8.0));
    }

    // ── width ─────────────────────────────────────────────────────────────

    #[test]
    fn flat_segment_bounds_are_length_by_width() {
        let mut s = PathStroker::new();
        let pts = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)];
        let b = s.stroke(&pts, 4.0, Join::Smooth, false).bounds().unwrap();
        assert!(approx(b.width(), 10.0));
        assert!(approx(b.height(), 4.0));
    }

    #[test]
    fn round_segment_extends_half_width_at_each_end() {
        let mut s = PathStroker::new();
        let pts = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)];
        let b = s.stroke(&pts, 4.0, Join::Round, false).bounds().unwrap();
        assert!(approx(b.min().x, -2.0));
        assert!(approx(b.max().x, 12.0));
        assert!(approx(b.height(), 4.0));
    }

    #[test]
    fn straight_polyline_has_constant_width() {
        let mut s = PathStroker::new();
        let pts = [Vec2::new(0.0, 0.0), Vec2::new(5.0, 0.0), Vec2::new(10.0, 0.0)];
        let mesh = s.stroke(&pts, 2.0, Join::Pointy, false);
        assert!(approx(mesh.area(), 20.0));
    }

    // ── joins ─────────────────────────────────────────────────────────────

    #[test]
    fn pointy_right_angle_reaches_miter_corner() {
        let mut s = PathStroker::new();
        let pts = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)];
        let b = s.stroke(&pts, 2.0, Join::Pointy, false).bounds().unwrap();
        // The outer miter corner sits at (11, -1).
        assert!(approx(b.max().x, 11.0));
        assert!(approx(b.min().y, -1.0));
    }

    #[test]
    fn smooth_right_angle_cuts_the_corner() {
        let mut s = PathStroker::new();
        let pts = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)];
        let pointy = s.stroke(&pts, 2.0, Join::Pointy, false).area();
        let smooth = s.stroke(&pts, 2.0, Join::Smooth, false).area();
        // Bevel drops half of the unit miter square.
        assert!(approx(pointy - smooth, 0.5));
    }

    #[test]
    fn round_join_arc_is_proportional_to_turn_angle() {
        let s = PathStroker::new();
        let radius = 10.0;
        let full = s.arc_segments(radius, TAU);
        let quarter = s.arc_segments(radius, FRAC_PI_2);
        assert!(quarter * 4 >= full && quarter * 4 <= full + 4);

        let mut s = PathStroker::new();
        let pts = [Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0), Vec2::new(100.0, 100.0)];
        let round = s.stroke(&pts, radius * 2.0, Join::Round, false).vertex_count();
        let half = s.arc_segments(radius, PI);
        // caps: left, right, center + arc each; join: inner, center, outer-in + arc.
        assert_eq!(round, 2 * (3 + half) + 3 + quarter);
    }

    #[test]
    fn round_right_angle_adds_arc_and_caps() {
        let mut s = PathStroker::new();
        let pts = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)];
        let smooth = s.stroke(&pts, 2.0, Join::Smooth, false).area();
        let round = s.stroke(&pts, 2.0, Join::Round, false).area();
        assert!(approx(smooth, 39.5));
        // Bevel + rounded corner sliver + two half-disc caps.
        assert!(round > 42.0 && round < 39.5 + (PI / 4.0 - 0.5) + PI);
    }

    // ── closed ────────────────────────────────────────────────────────────

    #[test]
    fn closed_square_outline_area() {
        let mut s = PathStroker::new();
        let pts = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ];
        let mesh = s.stroke(&pts, 2.0, Join::Pointy, true);
        // Frame from 12×12 outer to 8×8 inner.
        assert!(approx(mesh.area(), 144.0 - 64.0));
        let b = mesh.bounds().unwrap();
        assert!(approx(b.min().x, -1.0) && approx(b.min().y, -1.0));
        assert!(approx(b.width(), 12.0) && approx(b.height(), 12.0));
        assert!(mesh.indices_in_range());
    }

    #[test]
    fn closed_input_with_repeated_first_point_matches_without() {
        let mut s = PathStroker::new();
        let open = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)];
        let repeated = [open[0], open[1], open[2], open[0]];
        let a = s.stroke(&open, 2.0, Join::Pointy, true).area();
        let b = s.stroke(&repeated, 2.0, Join::Pointy, true).area();
        assert!(approx(a, b));
    }

    // ── side estimation ───────────────────────────────────────────────────

    #[test]
    fn side_estimate_grows_with_zoom() {
        let coarse = estimate_circle_sides(50.0, 1.0);
        let fine = estimate_circle_sides(50.0, 0.25);
        assert!(fine > coarse);
        assert_eq!(estimate_circle_sides(0.1, 1.0), MIN_CIRCLE_SIDES);
    }
}
