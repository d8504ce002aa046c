use glam::DVec2;

use crate::error::{RasterError, RasterResult};
use crate::geo::Extent;

/// Output grid geometry: pixel dimensions plus the world-space box they cover.
/// Row 0 is the northern (max y) edge, matching image memory order.
#[derive(Clone, Debug, PartialEq)]
pub struct Canvas {
    /// Grid width in cells (pixels)
    pub width: usize,
    /// Grid height in cells (pixels)
    pub height: usize,
    extent: Extent,
}

/// Build a canvas, rejecting degenerate geometry before any data is read.
pub fn make_canvas(
    width: usize,
    height: usize,
    x_range: (f64, f64),
    y_range: (f64, f64),
) -> RasterResult<Canvas> {
    Canvas::new(width, height, x_range, y_range)
}

impl Canvas {
    pub fn new(
        width: usize,
        height: usize,
        x_range: (f64, f64),
        y_range: (f64, f64),
    ) -> RasterResult<Self> {
        if width == 0 || height == 0 {
            return Err(RasterError::geometry(format!(
                "canvas must be at least 1x1 pixels, got {width}x{height}"
            )));
        }
        if width.checked_mul(height).is_none() {
            return Err(RasterError::geometry(format!(
                "canvas {width}x{height} overflows the cell index space"
            )));
        }
        check_range("x_range", x_range)?;
        check_range("y_range", y_range)?;

        Ok(Self {
            width,
            height,
            extent: Extent::new(x_range, y_range),
        })
    }

    #[inline(always)]
    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    #[inline(always)]
    pub fn x_range(&self) -> (f64, f64) {
        self.extent.x_range
    }

    #[inline(always)]
    pub fn y_range(&self) -> (f64, f64) {
        self.extent.y_range
    }

    /// (width, height) in cells
    #[inline(always)]
    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Total number of cells
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Map a world coordinate to its (col, row) cell.
    ///
    /// Binning is floor-based and half-open, except that the max-x and min-y
    /// edges are folded into the last column/row so points lying exactly on
    /// the east or south border are kept.
    #[inline(always)]
    pub fn to_cell(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let (x_min, x_max) = self.extent.x_range;
        let (y_min, y_max) = self.extent.y_range;
        if x < x_min || x > x_max || y < y_min || y > y_max {
            return None;
        }

        // Offset from the NW corner, y flipped so rows grow southwards
        let offset = DVec2::new(x - x_min, y_max - y);
        let dims = DVec2::new(self.width as f64, self.height as f64);
        let scaled = (offset / self.extent.size() * dims).floor();

        let col = (scaled.x as usize).min(self.width - 1);
        let row = (scaled.y as usize).min(self.height - 1);
        Some((col, row))
    }

    /// Row-major flat index of a cell
    #[inline(always)]
    pub fn index(&self, col: usize, row: usize) -> usize {
        row * self.width + col
    }

    /// World coordinate of a cell center (inverse of `to_cell`)
    pub fn cell_center(&self, col: usize, row: usize) -> DVec2 {
        let cell = self.cell_size();
        let (x_min, _) = self.extent.x_range;
        let (_, y_max) = self.extent.y_range;
        DVec2::new(
            x_min + (col as f64 + 0.5) * cell.x,
            y_max - (row as f64 + 0.5) * cell.y,
        )
    }

    /// World-space size of a single cell
    pub fn cell_size(&self) -> DVec2 {
        self.extent.size() / DVec2::new(self.width as f64, self.height as f64)
    }
}

fn check_range(name: &str, (min, max): (f64, f64)) -> RasterResult<()> {
    if !min.is_finite() || !max.is_finite() {
        return Err(RasterError::geometry(format!(
            "{name} bounds must be finite, got ({min}, {max})"
        )));
    }
    if min >= max {
        return Err(RasterError::geometry(format!(
            "{name} must satisfy min < max, got ({min}, {max})"
        )));
    }
    if !(max - min).is_finite() {
        return Err(RasterError::geometry(format!(
            "{name} span overflows, got ({min}, {max})"
        )));
    }
    Ok(())
}
