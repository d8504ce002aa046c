use serde::{Deserialize, Serialize};

use crate::aggregate::{Reducer, DEFAULT_CHUNK_SIZE};
use crate::error::{RasterError, RasterResult};
use crate::lod::LodBudget;
use crate::raster::{make_canvas, Canvas};
use crate::record::FieldSelector;
use crate::shade::{Colormap, ColormapSpec, Rescale, DEFAULT_MIN_ALPHA};

/// How the aggregation pass is scheduled
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Execution {
    #[default]
    Sequential,
    /// Each pulled chunk is split across the rayon pool
    Parallel,
}

/// Everything a render call needs besides the points themselves
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: usize,
    pub height: usize,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub fields: FieldSelector,
    pub reducer: Reducer,
    pub colormap: ColormapSpec,
    pub how: Rescale,
    pub lod: LodBudget,
    pub seed: u64,
    pub chunk_size: usize,
    pub execution: Execution,
    /// Alpha floor for categorical renders
    pub min_alpha: u8,
}

impl Default for RenderConfig {
    /// Midtown Manhattan at 600x600, the view the ride-hailing dashboards open on
    fn default() -> Self {
        Self {
            width: 600,
            height: 600,
            x_range: (-74.02, -73.91),
            y_range: (40.70, 40.82),
            fields: FieldSelector::default(),
            reducer: Reducer::Count,
            colormap: ColormapSpec::default(),
            how: Rescale::EqHist,
            lod: LodBudget::Full,
            seed: 0,
            chunk_size: DEFAULT_CHUNK_SIZE,
            execution: Execution::Sequential,
            min_alpha: DEFAULT_MIN_ALPHA,
        }
    }
}

impl RenderConfig {
    pub fn from_json(text: &str) -> RasterResult<Self> {
        serde_json::from_str(text).map_err(|e| RasterError::config(e.to_string()))
    }

    /// Check every structural parameter before any data is touched
    pub fn validate(&self) -> RasterResult<()> {
        self.canvas()?;
        self.colormap.resolve()?;
        self.lod.validate()?;
        if self.chunk_size == 0 {
            return Err(RasterError::config("chunk_size must be at least 1"));
        }
        if self.min_alpha == 0 {
            return Err(RasterError::config(
                "min_alpha must be at least 1 so observed cells stay visible",
            ));
        }
        if let Some(field) = self.reducer.field() {
            if field.is_empty() {
                return Err(RasterError::config(format!(
                    "{} reducer needs a field name",
                    self.reducer.name()
                )));
            }
        }
        Ok(())
    }

    pub fn canvas(&self) -> RasterResult<Canvas> {
        make_canvas(self.width, self.height, self.x_range, self.y_range)
    }

    pub fn colormap(&self) -> RasterResult<Colormap> {
        self.colormap.resolve()
    }
}
