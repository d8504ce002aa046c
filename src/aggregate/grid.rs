use crate::aggregate::cell::{CategoryCounts, CellState, SumCount};
use crate::aggregate::Reducer;
use crate::raster::Binned;

/// Counts from folding a binned stream into a grid
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AbsorbStats {
    /// Points accepted into a cell
    pub observed: u64,
    /// Points the reducer had no use for (wrong value kind)
    pub rejected: u64,
}

impl AbsorbStats {
    pub fn consumed(&self) -> u64 {
        self.observed + self.rejected
    }
}

/// Dense row-major grid of accumulators
#[derive(Clone, Debug, PartialEq)]
pub struct CellGrid<S> {
    width: usize,
    height: usize,
    cells: Vec<S>,
}

impl<S: CellState> CellGrid<S> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![S::default(); width * height],
        }
    }

    #[inline(always)]
    pub fn get(&self, col: usize, row: usize) -> Option<&S> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.cells.get(row * self.width + col)
    }

    pub fn cells(&self) -> &[S] {
        &self.cells
    }

    fn absorb<I: Iterator<Item = Binned>>(&mut self, binned: I) -> AbsorbStats {
        let mut stats = AbsorbStats::default();
        for b in binned {
            let idx = b.row * self.width + b.col;
            if self.cells[idx].observe(b.value) {
                stats.observed += 1;
            } else {
                stats.rejected += 1;
            }
        }
        stats
    }

    fn merge(&mut self, other: &Self) {
        assert_eq!(
            (self.width, self.height),
            (other.width, other.height),
            "cannot merge grids of different shapes"
        );
        for (a, b) in self.cells.iter_mut().zip(&other.cells) {
            a.merge(b);
        }
    }
}

/// Aggregate grid for one reducer over one canvas
#[derive(Clone, Debug, PartialEq)]
pub enum Grid {
    Count(CellGrid<u64>),
    Sum(CellGrid<SumCount>),
    Mean(CellGrid<SumCount>),
    Categorical(CellGrid<CategoryCounts>),
}

impl Grid {
    /// Identity grid for `reducer`: every cell holds "no observation"
    pub fn empty(reducer: &Reducer, (width, height): (usize, usize)) -> Self {
        match reducer {
            Reducer::Count => Grid::Count(CellGrid::new(width, height)),
            Reducer::Sum { .. } => Grid::Sum(CellGrid::new(width, height)),
            Reducer::Mean { .. } => Grid::Mean(CellGrid::new(width, height)),
            Reducer::CategoricalCount { .. } => Grid::Categorical(CellGrid::new(width, height)),
        }
    }

    /// (width, height) in cells
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Grid::Count(g) => (g.width, g.height),
            Grid::Sum(g) | Grid::Mean(g) => (g.width, g.height),
            Grid::Categorical(g) => (g.width, g.height),
        }
    }

    pub fn width(&self) -> usize {
        self.shape().0
    }

    pub fn height(&self) -> usize {
        self.shape().1
    }

    pub(crate) fn absorb<I: Iterator<Item = Binned>>(&mut self, binned: I) -> AbsorbStats {
        match self {
            Grid::Count(g) => g.absorb(binned),
            Grid::Sum(g) | Grid::Mean(g) => g.absorb(binned),
            Grid::Categorical(g) => g.absorb(binned),
        }
    }

    /// Cell-wise merge of a partial grid built over the same canvas with the
    /// same reducer.
    ///
    /// # Panics
    /// On a shape or reducer mismatch. Both are derived from a single canvas
    /// and config, so a mismatch is a bug in the caller.
    pub fn merge(&mut self, other: &Grid) {
        match (self, other) {
            (Grid::Count(a), Grid::Count(b)) => a.merge(b),
            (Grid::Sum(a), Grid::Sum(b)) => a.merge(b),
            (Grid::Mean(a), Grid::Mean(b)) => a.merge(b),
            (Grid::Categorical(a), Grid::Categorical(b)) => a.merge(b),
            (a, b) => panic!(
                "cannot merge a {} grid into a {} grid",
                b.kind(),
                a.kind()
            ),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Grid::Count(_) => "count",
            Grid::Sum(_) => "sum",
            Grid::Mean(_) => "mean",
            Grid::Categorical(_) => "categorical",
        }
    }

    /// Finalized scalar for one cell; `None` is the "no observation" sentinel.
    /// Categorical cells report their total count.
    pub fn value(&self, col: usize, row: usize) -> Option<f64> {
        match self {
            Grid::Count(g) => g.get(col, row).and_then(|&c| count_value(c)),
            Grid::Sum(g) => g.get(col, row).and_then(SumCount::total),
            Grid::Mean(g) => g.get(col, row).and_then(SumCount::mean),
            Grid::Categorical(g) => g.get(col, row).and_then(|c| count_value(c.total())),
        }
    }

    /// Finalized scalars for every cell in row-major order
    pub fn values(&self) -> Vec<Option<f64>> {
        match self {
            Grid::Count(g) => g.cells.iter().map(|&c| count_value(c)).collect(),
            Grid::Sum(g) => g.cells.iter().map(SumCount::total).collect(),
            Grid::Mean(g) => g.cells.iter().map(SumCount::mean).collect(),
            Grid::Categorical(g) => g.cells.iter().map(|c| count_value(c.total())).collect(),
        }
    }

    /// Per-category counts of a cell (categorical grids only)
    pub fn categories(&self, col: usize, row: usize) -> Option<&CategoryCounts> {
        match self {
            Grid::Categorical(g) => g.get(col, row),
            _ => None,
        }
    }

    /// Number of cells holding at least one observation
    pub fn observed_cells(&self) -> usize {
        match self {
            Grid::Count(g) => g.cells.iter().filter(|c| !c.is_empty()).count(),
            Grid::Sum(g) | Grid::Mean(g) => g.cells.iter().filter(|c| !c.is_empty()).count(),
            Grid::Categorical(g) => g.cells.iter().filter(|c| !c.is_empty()).count(),
        }
    }

    /// Count grid as nested rows (north row first), mainly for assertions
    pub fn count_rows(&self) -> Option<Vec<Vec<u64>>> {
        match self {
            Grid::Count(g) => Some(g.cells.chunks(g.width).map(<[u64]>::to_vec).collect()),
            _ => None,
        }
    }
}

#[inline(always)]
fn count_value(count: u64) -> Option<f64> {
    if count == 0 {
        None
    } else {
        Some(count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::PointValue;

    fn binned(col: usize, row: usize, value: PointValue) -> Binned {
        Binned { col, row, value }
    }

    #[test]
    fn test_mean_sentinel_not_nan() {
        let mut grid = Grid::empty(&Reducer::mean("fare"), (2, 1));
        grid.absorb(
            [
                binned(0, 0, PointValue::Weight(10.0)),
                binned(0, 0, PointValue::Weight(20.0)),
            ]
            .into_iter(),
        );
        assert_eq!(grid.value(0, 0), Some(15.0));
        assert_eq!(grid.value(1, 0), None);
        assert_eq!(grid.values(), vec![Some(15.0), None]);
    }

    #[test]
    fn test_rejected_values_counted() {
        let mut grid = Grid::empty(&Reducer::categorical("airline"), (1, 1));
        let stats = grid.absorb(
            [
                binned(0, 0, PointValue::Category(1)),
                binned(0, 0, PointValue::Weight(1.0)),
            ]
            .into_iter(),
        );
        assert_eq!(stats, AbsorbStats { observed: 1, rejected: 1 });
        assert_eq!(grid.value(0, 0), Some(1.0));
    }

    #[test]
    fn test_merge_matches_single_pass() {
        let points: Vec<Binned> = (0..100)
            .map(|i| binned(i % 3, i % 2, PointValue::Weight((i % 7) as f64)))
            .collect();

        let mut whole = Grid::empty(&Reducer::sum("w"), (3, 2));
        whole.absorb(points.iter().copied());

        let mut left = Grid::empty(&Reducer::sum("w"), (3, 2));
        let mut right = Grid::empty(&Reducer::sum("w"), (3, 2));
        left.absorb(points[..37].iter().copied());
        right.absorb(points[37..].iter().copied());
        right.merge(&left);

        assert_eq!(whole, right);
    }

    #[test]
    #[should_panic(expected = "cannot merge")]
    fn test_merge_mismatched_reducer_panics() {
        let mut a = Grid::empty(&Reducer::Count, (2, 2));
        let b = Grid::empty(&Reducer::sum("w"), (2, 2));
        a.merge(&b);
    }

    #[test]
    #[should_panic(expected = "different shapes")]
    fn test_merge_mismatched_shape_panics() {
        let mut a = Grid::empty(&Reducer::Count, (2, 2));
        let b = Grid::empty(&Reducer::Count, (3, 2));
        a.merge(&b);
    }
}
