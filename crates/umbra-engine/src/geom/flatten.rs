use crate::coords::Vec2;

use super::path::{PathCmd, Region};

/// Straight segments used to approximate each quadratic or cubic curve.
pub const POINTS_PER_CURVE: usize = 10;

/// Location of one flattened sub-path inside [`Flattener::points`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SubPathSpan {
    pub start: usize,
    pub len: usize,
    pub closed: bool,
}

/// Borrowed view of one flattened sub-path.
#[derive(Debug, Copy, Clone)]
pub struct SubPath<'a> {
    /// Vertices in render space (+Y up). Never ends with a copy of its first vertex.
    pub points: &'a [Vec2],
    pub closed: bool,
}

/// Converts region boundaries into render-space polylines.
///
/// The flattener owns its output buffers and reuses them between calls, so a
/// warmed-up instance flattens without allocating. Results borrow the
/// flattener and are invalidated by the next call.
#[derive(Debug, Default)]
pub struct Flattener {
    points: Vec<Vec2>,
    spans: Vec<SubPathSpan>,

    // in-progress sub-path
    open_start: Option<usize>,
    contour_start: Vec2,
    last_model: Vec2,
}

impl Flattener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flattens `region`, replacing the previous result.
    pub fn flatten(&mut self, region: &Region) {
        self.flatten_cmds(region.cmds());
    }

    pub fn flatten_cmds(&mut self, cmds: &[PathCmd]) {
        self.points.clear();
        self.spans.clear();
        self.open_start = None;
        self.contour_start = Vec2::zero();
        self.last_model = Vec2::zero();

        for cmd in cmds {
            match *cmd {
                PathCmd::MoveTo(p) => {
                    self.finish(false);
                    self.begin(p);
                }
                PathCmd::LineTo(p) => {
                    self.ensure_open();
                    self.push(p);
                }
                PathCmd::QuadTo(c, p) => {
                    self.ensure_open();
                    let s = self.last_model;
                    for i in 1..=POINTS_PER_CURVE {
                        let t = i as f32 / POINTS_PER_CURVE as f32;
                        let u = 1.0 - t;
                        self.push(s * (u * u) + c * (2.0 * u * t) + p * (t * t));
                    }
                }
                PathCmd::CubicTo(c1, c2, p) => {
                    self.ensure_open();
                    let s = self.last_model;
                    for i in 1..=POINTS_PER_CURVE {
                        let t = i as f32 / POINTS_PER_CURVE as f32;
                        let u = 1.0 - t;
                        self.push(
                            s * (u * u * u)
                                + c1 * (3.0 * u * u * t)
                                + c2 * (3.0 * u * t * t)
                                + p * (t * t * t),
                        );
                    }
                }
                PathCmd::Close => {
                    self.finish(true);
                    // The pen returns to the contour start, like a closed Java2D/SVG subpath.
                    self.last_model = self.contour_start;
                }
            }
        }
        self.finish(false);
    }

    /// All flattened vertices, sub-paths stored back to back.
    #[inline]
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    #[inline]
    pub fn spans(&self) -> &[SubPathSpan] {
        &self.spans
    }

    /// Start index of every sub-path within [`points`](Self::points).
    pub fn starts(&self) -> impl Iterator<Item = usize> + '_ {
        self.spans.iter().map(|s| s.start)
    }

    #[inline]
    pub fn subpath_count(&self) -> usize {
        self.spans.len()
    }

    pub fn subpath(&self, index: usize) -> SubPath<'_> {
        let span = self.spans[index];
        SubPath {
            points: &self.points[span.start..span.start + span.len],
            closed: span.closed,
        }
    }

    pub fn subpaths(&self) -> impl Iterator<Item = SubPath<'_>> + '_ {
        (0..self.spans.len()).map(move |i| self.subpath(i))
    }

    fn begin(&mut self, p: Vec2) {
        self.open_start = Some(self.points.len());
        self.contour_start = p;
        self.last_model = p;
        self.points.push(p.flip_y());
    }

    /// A segment without a preceding move starts from the current pen position.
    fn ensure_open(&mut self) {
        if self.open_start.is_none() {
            let pen = self.last_model;
            self.begin(pen);
        }
    }

    fn push(&mut self, p: Vec2) {
        self.last_model = p;
        let q = p.flip_y();
        if self.points.last() != Some(&q) {
            self.points.push(q);
        }
    }

    fn finish(&mut self, close: bool) {
        let Some(start) = self.open_start.take() else { return };

        let mut len = self.points.len() - start;
        let first = self.points[start];
        let mut closed = close;

        // Strip the duplicated closing vertex; a ring that returns to its start is closed.
        while len >= 2 && self.points[start + len - 1] == first {
            self.points.pop();
            len -= 1;
            closed = true;
        }

        if len == 0 {
            return;
        }
        self.spans.push(SubPathSpan { start, len, closed });
    }
}
