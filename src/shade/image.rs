use std::collections::HashSet;

use crate::geo::Extent;
use crate::shade::colormap::Rgba;

/// Shaded raster plus the world extent it covers.
/// Pixels are row-major with row 0 at the northern edge.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageBuffer {
    pub width: usize,
    pub height: usize,
    pixels: Vec<Rgba>,
    extent: Extent,
}

impl ImageBuffer {
    pub(crate) fn new(width: usize, height: usize, pixels: Vec<Rgba>, extent: Extent) -> Self {
        debug_assert_eq!(pixels.len(), width * height);
        Self {
            width,
            height,
            pixels,
            extent,
        }
    }

    pub fn pixel(&self, col: usize, row: usize) -> Option<Rgba> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.pixels.get(row * self.width + col).copied()
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Flat RGBA bytes, ready for a PNG encoder or an overlay texture
    pub fn as_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flatten().copied().collect()
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    /// World corners in overlay order: SW, SE, NE, NW
    pub fn corners(&self) -> [[f64; 2]; 4] {
        self.extent.corners()
    }

    /// Pixels with non-zero alpha
    pub fn count_opaque(&self) -> usize {
        self.pixels.iter().filter(|p| p[3] > 0).count()
    }

    /// Number of distinct colors among non-transparent pixels
    pub fn distinct_colors(&self) -> usize {
        self.pixels
            .iter()
            .filter(|p| p[3] > 0)
            .collect::<HashSet<_>>()
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let img = ImageBuffer::new(
            2,
            1,
            vec![[1, 2, 3, 255], [0, 0, 0, 0]],
            Extent::new((0.0, 2.0), (0.0, 1.0)),
        );
        assert_eq!(img.pixel(0, 0), Some([1, 2, 3, 255]));
        assert_eq!(img.pixel(2, 0), None);
        assert_eq!(img.as_bytes(), vec![1, 2, 3, 255, 0, 0, 0, 0]);
        assert_eq!(img.count_opaque(), 1);
        assert_eq!(img.distinct_colors(), 1);
        assert_eq!(img.corners()[2], [2.0, 1.0]);
    }
}
