use crate::coords::{Rect, Vec2};

/// One boundary command of a [`Region`], in model space (+Y down).
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PathCmd {
    MoveTo(Vec2),
    LineTo(Vec2),
    /// Quadratic Bézier: control point, end point.
    QuadTo(Vec2, Vec2),
    /// Cubic Bézier: two control points, end point.
    CubicTo(Vec2, Vec2, Vec2),
    Close,
}

/// Cubic control-point distance for a quarter circle of radius 1.
const KAPPA: f32 = 0.552_284_8;

/// A possibly multi-contour, possibly holed 2D shape described by its boundary.
///
/// Contour order carries meaning: a later contour whose first point lies inside
/// an earlier one (or vice versa) is treated as a hole by the triangulator.
/// Regions are rebuilt every frame by the view model; nothing here is cached.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Region {
    cmds: Vec<PathCmd>,
}

impl Region {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn from_cmds(cmds: Vec<PathCmd>) -> Self {
        Self { cmds }
    }

    #[inline]
    pub fn cmds(&self) -> &[PathCmd] {
        &self.cmds
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.cmds.clear();
    }

    pub fn move_to(&mut self, p: Vec2) -> &mut Self {
        self.cmds.push(PathCmd::MoveTo(p));
        self
    }

    pub fn line_to(&mut self, p: Vec2) -> &mut Self {
        self.cmds.push(PathCmd::LineTo(p));
        self
    }

    pub fn quad_to(&mut self, ctrl: Vec2, p: Vec2) -> &mut Self {
        self.cmds.push(PathCmd::QuadTo(ctrl, p));
        self
    }

    pub fn cubic_to(&mut self, c1: Vec2, c2: Vec2, p: Vec2) -> &mut Self {
        self.cmds.push(PathCmd::CubicTo(c1, c2, p));
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.cmds.push(PathCmd::Close);
        self
    }

    /// Appends `other`'s contours after this region's, preserving their order.
    pub fn append(&mut self, other: &Region) -> &mut Self {
        self.cmds.extend_from_slice(&other.cmds);
        self
    }

    /// Adds a closed polygon contour. Fewer than two points adds nothing.
    pub fn add_polygon(&mut self, points: &[Vec2]) -> &mut Self {
        if let [first, rest @ ..] = points {
            if rest.is_empty() {
                return self;
            }
            self.move_to(*first);
            for &p in rest {
                self.line_to(p);
            }
            self.close();
        }
        self
    }

    /// Adds an open polyline contour (no closing segment).
    pub fn add_polyline(&mut self, points: &[Vec2]) -> &mut Self {
        if let [first, rest @ ..] = points {
            self.move_to(*first);
            for &p in rest {
                self.line_to(p);
            }
        }
        self
    }

    pub fn add_rect(&mut self, rect: Rect) -> &mut Self {
        let min = rect.min();
        let max = rect.max();
        self.add_polygon(&[
            min,
            Vec2::new(max.x, min.y),
            max,
            Vec2::new(min.x, max.y),
        ])
    }

    /// Adds an ellipse inscribed in `rect`, built from four cubic arcs.
    pub fn add_ellipse(&mut self, rect: Rect) -> &mut Self {
        let c = rect.center();
        let rx = rect.width() * 0.5;
        let ry = rect.height() * 0.5;
        let kx = rx * KAPPA;
        let ky = ry * KAPPA;

        self.move_to(Vec2::new(c.x + rx, c.y));
        self.cubic_to(
            Vec2::new(c.x + rx, c.y + ky),
            Vec2::new(c.x + kx, c.y + ry),
            Vec2::new(c.x, c.y + ry),
        );
        self.cubic_to(
            Vec2::new(c.x - kx, c.y + ry),
            Vec2::new(c.x - rx, c.y + ky),
            Vec2::new(c.x - rx, c.y),
        );
        self.cubic_to(
            Vec2::new(c.x - rx, c.y - ky),
            Vec2::new(c.x - kx, c.y - ry),
            Vec2::new(c.x, c.y - ry),
        );
        self.cubic_to(
            Vec2::new(c.x + kx, c.y - ry),
            Vec2::new(c.x + rx, c.y - ky),
            Vec2::new(c.x + rx, c.y),
        );
        self.close()
    }

    pub fn rect(rect: Rect) -> Self {
        let mut region = Self::new();
        region.add_rect(rect);
        region
    }

    pub fn polygon(points: &[Vec2]) -> Self {
        let mut region = Self::new();
        region.add_polygon(points);
        region
    }

    pub fn ellipse(rect: Rect) -> Self {
        let mut region = Self::new();
        region.add_ellipse(rect);
        region
    }

    pub fn circle(center: Vec2, radius: f32) -> Self {
        Self::ellipse(Rect::new(center.x - radius, center.y - radius, radius * 2.0, radius * 2.0))
    }

    /// Bounding box of every point the commands mention (control points included).
    pub fn bounds(&self) -> Option<Rect> {
        Rect::from_points(self.cmds.iter().flat_map(|cmd| {
            let pts: [Option<Vec2>; 3] = match *cmd {
                PathCmd::MoveTo(p) | PathCmd::LineTo(p) => [Some(p), None, None],
                PathCmd::QuadTo(c, p) => [Some(c), Some(p), None],
                PathCmd::CubicTo(c1, c2, p) => [Some(c1), Some(c2), Some(p)],
                PathCmd::Close => [None, None, None],
            };
            pts.into_iter().flatten()
        }))
    }
}
