use crate::geo::{Point, PointValue};
use crate::raster::Canvas;

/// A point resolved to its grid cell
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Binned {
    pub col: usize,
    pub row: usize,
    pub value: PointValue,
}

/// Lazy point-to-cell mapping over any point stream.
///
/// Points outside the canvas, with non-finite coordinates, or with a
/// non-finite weight are skipped and counted; they never stop the stream.
pub struct Binner<'a, I> {
    points: I,
    canvas: &'a Canvas,
    dropped: u64,
}

impl<'a, I> Binner<'a, I>
where
    I: Iterator<Item = Point>,
{
    pub fn new(points: I, canvas: &'a Canvas) -> Self {
        Self {
            points,
            canvas,
            dropped: 0,
        }
    }

    /// Number of points skipped so far
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl<I> Iterator for Binner<'_, I>
where
    I: Iterator<Item = Point>,
{
    type Item = Binned;

    #[inline]
    fn next(&mut self) -> Option<Binned> {
        for point in self.points.by_ref() {
            if let PointValue::Weight(w) = point.value {
                if !w.is_finite() {
                    self.dropped += 1;
                    continue;
                }
            }
            match self.canvas.to_cell(point.x, point.y) {
                Some((col, row)) => {
                    return Some(Binned {
                        col,
                        row,
                        value: point.value,
                    })
                }
                None => self.dropped += 1,
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.points.size_hint().1)
    }
}

/// Bin a point stream against a canvas
pub fn bin<I>(points: I, canvas: &Canvas) -> Binner<'_, I::IntoIter>
where
    I: IntoIterator<Item = Point>,
{
    Binner::new(points.into_iter(), canvas)
}
