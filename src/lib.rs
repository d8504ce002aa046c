//! Bounded-cost rasterization of large point clouds.
//!
//! Points are sampled down to a budget, binned into a fixed pixel grid over a
//! geographic extent, reduced per cell (count, sum, mean, per-category count)
//! and shaded into an RGBA image with its world corners, ready to drape over
//! a base map.

pub mod aggregate;
pub mod cancel;
pub mod config;
pub mod error;
pub mod geo;
pub mod hash;
pub mod lod;
pub mod pipeline;
pub mod raster;
pub mod record;
pub mod shade;

pub use aggregate::{aggregate, aggregate_chunked, aggregate_par, Aggregation, Grid, Reducer};
pub use cancel::CancelToken;
pub use config::{Execution, RenderConfig};
pub use error::{RasterError, RasterResult};
pub use geo::{Extent, Point, PointValue};
pub use lod::{sample, sample_cancellable, LodBudget};
pub use pipeline::{render_points, render_records, RenderStats, Rendered};
pub use raster::{bin, make_canvas, Canvas};
pub use record::{FieldSelector, Record};
pub use shade::{shade, shade_categorical, Colormap, ColormapSpec, ImageBuffer, Rescale};
