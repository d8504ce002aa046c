//! Binned-stream reduction into a grid.
//!
//! A grid is built in one pass over the binned stream. Because every cell
//! accumulator merges associatively, the same grid can also be assembled from
//! partial grids built over disjoint chunks (see [`aggregate_par`]).

mod cell;
mod exact;
mod grid;
mod parallel;
mod reducer;

pub use cell::{CategoryCounts, CellState, SumCount};
pub use exact::ExactSum;
pub use grid::{AbsorbStats, CellGrid, Grid};
pub use parallel::{aggregate_par, aggregate_stream_par};
pub use reducer::Reducer;

use tracing::warn;

use crate::cancel::CancelToken;
use crate::error::{RasterError, RasterResult};
use crate::geo::Point;
use crate::raster::{Binned, Binner, Canvas};

/// Default number of points folded between cancellation checks
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// A finished grid plus the diagnostics gathered while building it
#[derive(Clone, Debug, PartialEq)]
pub struct Aggregation {
    pub grid: Grid,
    /// Points folded into a cell
    pub binned: u64,
    /// Points excluded (outside the canvas, non-finite, or unusable value)
    pub dropped: u64,
}

impl Aggregation {
    pub fn empty(reducer: &Reducer, shape: (usize, usize)) -> Self {
        Self {
            grid: Grid::empty(reducer, shape),
            binned: 0,
            dropped: 0,
        }
    }

    /// Combine two partial aggregations over the same canvas and reducer
    pub fn merge(mut self, other: Aggregation) -> Aggregation {
        self.grid.merge(&other.grid);
        self.binned += other.binned;
        self.dropped += other.dropped;
        self
    }
}

/// Fold a binned stream into a fresh grid of `shape`.
pub fn aggregate<I>(binned: I, reducer: &Reducer, shape: (usize, usize)) -> Grid
where
    I: IntoIterator<Item = Binned>,
{
    let mut grid = Grid::empty(reducer, shape);
    grid.absorb(binned.into_iter());
    grid
}

/// Bin and aggregate a point stream in one pass, keeping the drop counter.
pub fn aggregate_points<I>(points: I, canvas: &Canvas, reducer: &Reducer) -> Aggregation
where
    I: IntoIterator<Item = Point>,
{
    let mut binner = Binner::new(points.into_iter(), canvas);
    let mut grid = Grid::empty(reducer, canvas.shape());
    let stats = grid.absorb(binner.by_ref());
    Aggregation {
        grid,
        binned: stats.observed,
        dropped: binner.dropped() + stats.rejected,
    }
}

/// Streaming aggregation that polls `cancel` every `chunk_size` points.
///
/// Memory use is one grid regardless of how long the stream is. On
/// cancellation the partial grid is discarded and `Cancelled` reports how
/// many points had been consumed.
pub fn aggregate_chunked<I>(
    points: I,
    canvas: &Canvas,
    reducer: &Reducer,
    chunk_size: usize,
    cancel: &CancelToken,
) -> RasterResult<Aggregation>
where
    I: IntoIterator<Item = Point>,
{
    let chunk_size = chunk_size.max(1);
    let mut points = points.into_iter();
    let mut grid = Grid::empty(reducer, canvas.shape());
    let mut consumed = 0u64;
    let mut binned = 0u64;
    let mut dropped = 0u64;

    loop {
        if cancel.is_cancelled() {
            warn!(processed = consumed, "aggregation cancelled");
            return Err(RasterError::Cancelled { processed: consumed });
        }

        let mut taken = 0usize;
        let chunk = points.by_ref().take(chunk_size).inspect(|_| taken += 1);
        let mut binner = Binner::new(chunk, canvas);
        let stats = grid.absorb(binner.by_ref());
        let chunk_dropped = binner.dropped();
        drop(binner);

        consumed += taken as u64;
        binned += stats.observed;
        dropped += chunk_dropped + stats.rejected;

        if taken < chunk_size {
            break;
        }
    }

    Ok(Aggregation {
        grid,
        binned,
        dropped,
    })
}
