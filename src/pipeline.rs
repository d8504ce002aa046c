//! End-to-end render: sample -> bin -> aggregate -> shade.

use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};

use crate::aggregate::{aggregate_chunked, aggregate_stream_par, Grid};
use crate::cancel::CancelToken;
use crate::config::{Execution, RenderConfig};
use crate::error::{RasterError, RasterResult};
use crate::geo::Point;
use crate::lod::sample_cancellable;
use crate::record::Record;
use crate::shade::{shade, shade_categorical, ImageBuffer};

/// Diagnostics for one render call
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RenderStats {
    /// Input points read from the source
    pub seen: u64,
    /// Points that survived LOD sampling
    pub sampled: u64,
    /// Points folded into a cell
    pub binned: u64,
    /// Sampled points excluded by the binner or reducer
    pub dropped: u64,
    pub elapsed: Duration,
}

/// Result of a completed render
#[derive(Clone, Debug)]
pub struct Rendered {
    pub image: ImageBuffer,
    pub grid: Grid,
    pub stats: RenderStats,
}

/// Render a point stream with `config`.
///
/// The config is validated up front, so geometry/colormap/budget problems
/// surface before the first point is read. Cancellation reports how many
/// input points had been read when the flag was observed.
#[instrument(skip_all, fields(width = config.width, height = config.height, reducer = config.reducer.name()))]
pub fn render_points<I>(
    points: I,
    config: &RenderConfig,
    cancel: &CancelToken,
) -> RasterResult<Rendered>
where
    I: IntoIterator<Item = Point>,
{
    let start = Instant::now();
    config.validate()?;
    let canvas = config.canvas()?;
    let colormap = config.colormap()?;

    let mut seen = 0u64;
    let aggregated = {
        let counted = points.into_iter().inspect(|_| seen += 1);
        let sampled =
            sample_cancellable(counted, &config.lod, config.seed, config.chunk_size, cancel);
        sampled.and_then(|sampled| match config.execution {
            Execution::Sequential => aggregate_chunked(
                sampled,
                &canvas,
                &config.reducer,
                config.chunk_size,
                cancel,
            ),
            Execution::Parallel => aggregate_stream_par(
                sampled,
                &canvas,
                &config.reducer,
                config.chunk_size,
                cancel,
            ),
        })
    };
    let agg = aggregated.map_err(|e| match e {
        RasterError::Cancelled { .. } => RasterError::Cancelled { processed: seen },
        other => other,
    })?;

    debug!(
        seen,
        binned = agg.binned,
        dropped = agg.dropped,
        observed_cells = agg.grid.observed_cells(),
        "aggregated"
    );

    let image = if config.reducer.is_categorical() {
        shade_categorical(
            &agg.grid,
            &canvas,
            colormap.stops(),
            config.how,
            config.min_alpha,
        )?
    } else {
        shade(&agg.grid, &canvas, &colormap, config.how)?
    };

    let stats = RenderStats {
        seen,
        sampled: agg.binned + agg.dropped,
        binned: agg.binned,
        dropped: agg.dropped,
        elapsed: start.elapsed(),
    };
    info!(
        seen = stats.seen,
        sampled = stats.sampled,
        dropped = stats.dropped,
        elapsed_ms = stats.elapsed.as_secs_f64() * 1000.0,
        "render complete"
    );

    Ok(Rendered {
        image,
        grid: agg.grid,
        stats,
    })
}

/// Render caller records, selecting coordinates and the reducer's value field
/// by the names in `config.fields` / `config.reducer`.
pub fn render_records<R, I>(
    records: I,
    config: &RenderConfig,
    cancel: &CancelToken,
) -> RasterResult<Rendered>
where
    R: Record,
    I: IntoIterator<Item = R>,
{
    let points = records
        .into_iter()
        .map(|r| config.fields.extract(&r, &config.reducer));
    render_points(points, config, cancel)
}
