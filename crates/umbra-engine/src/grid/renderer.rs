use crate::coords::{Rect, Vec2};
use crate::geom::{Join, Region};
use crate::paint::Color;
use crate::render::{CompositeBackend, RegionRenderer};

use super::shape::{GridCacheKey, GridKind, GridShapeCache, GridSpec};

/// Above this many cells in view the grid is skipped (lines would merge anyway).
pub const MAX_VISIBLE_CELLS: usize = 40_000;

/// Draws the grid overlay for the visible part of the zone.
///
/// Owns the per-cell shape cache; [`evict`](Self::evict) it when the zone changes.
#[derive(Debug, Default)]
pub struct GridRenderer {
    cache: GridShapeCache,
    lines: Region,
    cell_points: Vec<Vec2>,
    warned_dense: bool,
}

impl GridRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn cache(&self) -> &GridShapeCache {
        &self.cache
    }

    pub fn evict(&mut self) {
        self.cache.clear();
    }

    /// Strokes the grid lines crossing `visible` (model space) at `line_px` screen pixels.
    ///
    /// Returns the number of polylines drawn.
    pub fn render(
        &mut self,
        backend: &mut impl CompositeBackend,
        regions: &mut RegionRenderer,
        grid: &GridSpec,
        visible: Rect,
        color: Color,
        line_px: f32,
    ) -> usize {
        if !grid.is_drawable() || visible.is_empty() || !(line_px > 0.0) {
            return 0;
        }

        self.lines.clear();
        let count = match grid.kind {
            GridKind::Square => self.build_square(grid, visible),
            GridKind::HexVertical | GridKind::HexHorizontal | GridKind::Isometric => {
                self.build_cells(grid, visible)
            }
        };
        if count == 0 {
            return 0;
        }

        regions.set_color(color);
        regions.set_join(Join::Pointy);
        regions.set_line_width_px(line_px);
        regions.draw_region(backend, &self.lines);
        count
    }

    /// Full-height and full-width lines at every multiple of the cell size.
    fn build_square(&mut self, grid: &GridSpec, visible: Rect) -> usize {
        let (min, max) = (visible.min(), visible.max());
        let size = grid.size;
        let columns = ((max.x - min.x) / size).ceil() as usize + 1;
        let rows = ((max.y - min.y) / size).ceil() as usize + 1;
        if columns * rows > MAX_VISIBLE_CELLS {
            self.warn_dense(columns * rows);
            return 0;
        }

        // Integer line indices: stepping a float by `size` stalls once it is
        // below the float spacing at large coordinates.
        let (x0, x1) = line_indices(min.x, max.x, grid.offset.x, size);
        let (y0, y1) = line_indices(min.y, max.y, grid.offset.y, size);

        let mut count = 0;
        for i in x0..=x1 {
            let x = grid.offset.x + i as f32 * size;
            self.lines.add_polyline(&[Vec2::new(x, min.y), Vec2::new(x, max.y)]);
            count += 1;
        }
        for i in y0..=y1 {
            let y = grid.offset.y + i as f32 * size;
            self.lines.add_polyline(&[Vec2::new(min.x, y), Vec2::new(max.x, y)]);
            count += 1;
        }
        count
    }

    /// One cached edge polyline per cell whose centre is near the view.
    fn build_cells(&mut self, grid: &GridSpec, visible: Rect) -> usize {
        let (px, py) = grid.pitch();
        // A cell centre at most one pitch outside still has edges in view.
        let area = visible.inflate(px.max(py));
        let (min, max) = (area.min() - grid.offset, area.max() - grid.offset);

        let col0 = (min.x / px).floor() as i32 - 1;
        let col1 = (max.x / px).ceil() as i32 + 1;
        let row0 = (min.y / py).floor() as i32 - 1;
        let row1 = (max.y / py).ceil() as i32 + 1;
        let cells = (col1 - col0).max(0) as usize * (row1 - row0).max(0) as usize;
        if cells > MAX_VISIBLE_CELLS {
            self.warn_dense(cells);
            return 0;
        }

        let key = GridCacheKey::from(grid);
        let cell = self.cache.shape(key);
        let mut count = 0;
        for row in row0..=row1 {
            for col in col0..=col1 {
                let c = grid.cell_center(col, row);
                if !area.contains(c) {
                    continue;
                }
                self.cell_points.clear();
                self.cell_points.extend(cell.iter().map(|&p| p + c));
                self.lines.add_polyline(&self.cell_points);
                count += 1;
            }
        }
        count
    }

    fn warn_dense(&mut self, cells: usize) {
        if !self.warned_dense {
            log::debug!("GridRenderer: {cells} cells in view; grid skipped at this zoom");
            self.warned_dense = true;
        }
    }
}

/// First and last index `i` with `offset + i * size` inside `min..=max`.
fn line_indices(min: f32, max: f32, offset: f32, size: f32) -> (i64, i64) {
    let first = ((min - offset) / size).ceil() as i64;
    let last = ((max - offset) / size).floor() as i64;
    (first, last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{Projection, Viewport};
    use crate::render::{Attachment, SoftwareBackend};

    fn setup() -> (SoftwareBackend, RegionRenderer, GridRenderer) {
        let mut backend = SoftwareBackend::new(Viewport::new(40, 40));
        backend.set_projection(Projection::screen());
        (backend, RegionRenderer::new(), GridRenderer::new())
    }

    #[test]
    fn square_grid_draws_lines_on_multiples() {
        let (mut backend, mut regions, mut grid) = setup();
        let spec = GridSpec::new(GridKind::Square, 10.0);
        let drawn = grid.render(
            &mut backend,
            &mut regions,
            &spec,
            Rect::new(0.0, 0.0, 40.0, 40.0),
            Color::white(),
            2.0,
        );
        // x and y at 0, 10, 20, 30, 40.
        assert_eq!(drawn, 10);
        assert_eq!(backend.pixel(Attachment::Screen, 10, 5), Some(Color::white()));
        assert_eq!(backend.pixel(Attachment::Screen, 9, 25), Some(Color::white()));
        assert_eq!(backend.pixel(Attachment::Screen, 5, 5), Some(Color::transparent()));
    }

    #[test]
    fn hex_grid_fills_cache_once() {
        let (mut backend, mut regions, mut grid) = setup();
        let spec = GridSpec::new(GridKind::HexHorizontal, 12.0);
        let visible = Rect::new(0.0, 0.0, 40.0, 40.0);
        assert!(grid.render(&mut backend, &mut regions, &spec, visible, Color::white(), 1.0) > 0);
        grid.render(&mut backend, &mut regions, &spec, visible, Color::white(), 1.0);
        assert_eq!(grid.cache().len(), 1);

        let bigger = GridSpec::new(GridKind::HexHorizontal, 16.0);
        grid.render(&mut backend, &mut regions, &bigger, visible, Color::white(), 1.0);
        assert_eq!(grid.cache().len(), 1);
        assert_eq!(grid.cache().evictions(), 1);
    }

    #[test]
    fn dense_grid_is_skipped() {
        let (mut backend, mut regions, mut grid) = setup();
        let spec = GridSpec::new(GridKind::Isometric, 0.05);
        let drawn = grid.render(
            &mut backend,
            &mut regions,
            &spec,
            Rect::new(0.0, 0.0, 40.0, 40.0),
            Color::white(),
            1.0,
        );
        assert_eq!(drawn, 0);
    }

    #[test]
    fn degenerate_grid_draws_nothing() {
        let (mut backend, mut regions, mut grid) = setup();
        let spec = GridSpec::new(GridKind::Square, 0.0);
        let visible = Rect::new(0.0, 0.0, 40.0, 40.0);
        assert_eq!(grid.render(&mut backend, &mut regions, &spec, visible, Color::white(), 1.0), 0);
    }

    #[test]
    fn far_square_grid_terminates() {
        let mut grid = GridRenderer::new();
        let spec = GridSpec::new(GridKind::Square, 1.0);
        // 1e8 + 1.0 == 1e8 in f32; lines are still enumerated by index.
        let drawn = grid.build_square(&spec, Rect::new(1.0e8, 0.0, 40.0, 40.0));
        assert_eq!(drawn, 41 + 41);
    }

    #[test]
    fn square_lines_honour_offset() {
        let mut grid = GridRenderer::new();
        let mut spec = GridSpec::new(GridKind::Square, 10.0);
        spec.offset = Vec2::new(5.0, 0.0);
        // x at 5, 15, 25, 35; y at 0, 10, 20, 30, 40.
        assert_eq!(grid.build_square(&spec, Rect::new(0.0, 0.0, 40.0, 40.0)), 4 + 5);
    }

    #[test]
    fn cell_scratch_is_reused_between_renders() {
        let (mut backend, mut regions, mut grid) = setup();
        let spec = GridSpec::new(GridKind::Isometric, 10.0);
        let visible = Rect::new(0.0, 0.0, 40.0, 40.0);
        grid.render(&mut backend, &mut regions, &spec, visible, Color::white(), 1.0);
        let capacity = grid.cell_points.capacity();
        assert!(capacity > 0);
        grid.render(&mut backend, &mut regions, &spec, visible, Color::white(), 1.0);
        assert_eq!(grid.cell_points.capacity(), capacity);
    }
}
