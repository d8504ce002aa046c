use std::sync::atomic::{AtomicU64, Ordering};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::aggregate::{Aggregation, Reducer};
use crate::cancel::CancelToken;
use crate::error::{RasterError, RasterResult};
use crate::geo::Point;
use crate::raster::{Binner, Canvas};

/// Smallest slice handed to a single rayon job
const MIN_SPLIT: usize = 1024;

/// Partition-then-merge aggregation of an in-memory batch on the rayon pool.
///
/// Each rayon job folds its chunks into a private grid; the private grids are
/// merged pairwise at the end. No lock is taken while accumulating.
pub fn aggregate_par(
    points: &[Point],
    canvas: &Canvas,
    reducer: &Reducer,
    chunk_size: usize,
    cancel: &CancelToken,
) -> RasterResult<Aggregation> {
    let chunk_size = chunk_size.max(1);
    let shape = canvas.shape();
    let consumed = AtomicU64::new(0);

    let result = points
        .par_chunks(chunk_size)
        .try_fold(
            || Aggregation::empty(reducer, shape),
            |mut acc, chunk| {
                if cancel.is_cancelled() {
                    return Err(RasterError::Cancelled {
                        processed: consumed.load(Ordering::Relaxed),
                    });
                }
                let mut binner = Binner::new(chunk.iter().copied(), canvas);
                let stats = acc.grid.absorb(binner.by_ref());
                acc.binned += stats.observed;
                acc.dropped += binner.dropped() + stats.rejected;
                consumed.fetch_add(chunk.len() as u64, Ordering::Relaxed);
                Ok(acc)
            },
        )
        .try_reduce(
            || Aggregation::empty(reducer, shape),
            |a, b| Ok(a.merge(b)),
        );

    match &result {
        Ok(agg) => debug!(
            points = points.len(),
            binned = agg.binned,
            dropped = agg.dropped,
            "parallel aggregation done"
        ),
        Err(RasterError::Cancelled { processed }) => {
            warn!(processed, "parallel aggregation cancelled")
        }
        Err(_) => {}
    }
    result
}

/// Streaming counterpart of [`aggregate_par`]: pulls at most `chunk_size`
/// points at a time, aggregates that batch on the pool, and merges it into
/// the running result. Memory stays at one batch plus the grids.
pub fn aggregate_stream_par<I>(
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
    let split = (chunk_size / rayon::current_num_threads().max(1)).max(MIN_SPLIT);
    let mut points = points.into_iter();
    let mut total = Aggregation::empty(reducer, canvas.shape());
    let mut consumed = 0u64;
    let mut batch: Vec<Point> = Vec::with_capacity(chunk_size.min(1 << 20));

    loop {
        if cancel.is_cancelled() {
            warn!(processed = consumed, "parallel aggregation cancelled");
            return Err(RasterError::Cancelled { processed: consumed });
        }
        batch.clear();
        batch.extend(points.by_ref().take(chunk_size));
        if batch.is_empty() {
            break;
        }

        let partial = aggregate_par(&batch, canvas, reducer, split, cancel).map_err(|e| match e {
            RasterError::Cancelled { processed } => RasterError::Cancelled {
                processed: consumed + processed,
            },
            other => other,
        })?;
        total = total.merge(partial);
        consumed += batch.len() as u64;

        if batch.len() < chunk_size {
            break;
        }
    }

    Ok(total)
}
