use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Payload carried by a point into its cell
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointValue {
    /// Plain occurrence; contributes 1 to whatever the reducer accumulates
    Unweighted,
    /// Numeric field value (fare, passenger count, delay, ...)
    Weight(f64),
    /// Category code for color-by-category renders
    Category(u32),
}

impl PointValue {
    /// Numeric contribution of this value (1 for unweighted points)
    #[inline(always)]
    pub fn weight(self) -> f64 {
        match self {
            PointValue::Unweighted => 1.0,
            PointValue::Weight(w) => w,
            PointValue::Category(_) => 1.0,
        }
    }
}

/// A world-space point (usually lon/lat) with an optional payload
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub value: PointValue,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            value: PointValue::Unweighted,
        }
    }

    pub fn weighted(x: f64, y: f64, weight: f64) -> Self {
        Self {
            x,
            y,
            value: PointValue::Weight(weight),
        }
    }

    pub fn categorical(x: f64, y: f64, category: u32) -> Self {
        Self {
            x,
            y,
            value: PointValue::Category(category),
        }
    }

    #[inline(always)]
    pub fn position(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }
}

/// World-space bounding box of a rendered image
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
}

impl Extent {
    pub fn new(x_range: (f64, f64), y_range: (f64, f64)) -> Self {
        Self { x_range, y_range }
    }

    /// Corners in the order map image overlays expect: SW, SE, NE, NW.
    /// Each corner is `[x, y]` (lon, lat for geographic canvases).
    pub fn corners(&self) -> [[f64; 2]; 4] {
        let (x0, x1) = self.x_range;
        let (y0, y1) = self.y_range;
        [[x0, y0], [x1, y0], [x1, y1], [x0, y1]]
    }

    #[inline(always)]
    pub fn min(&self) -> DVec2 {
        DVec2::new(self.x_range.0, self.y_range.0)
    }

    #[inline(always)]
    pub fn max(&self) -> DVec2 {
        DVec2::new(self.x_range.1, self.y_range.1)
    }

    #[inline(always)]
    pub fn size(&self) -> DVec2 {
        self.max() - self.min()
    }
}
