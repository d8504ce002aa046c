use serde::{Deserialize, Serialize};

use crate::error::{RasterError, RasterResult};

/// Value-to-[0, 1] rescaling applied before the colormap lookup
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rescale {
    /// Min-max normalization
    Linear,
    /// Min-max normalization of ln(1 + v); values must be non-negative
    Log,
    /// Histogram equalization: each value replaced by its empirical CDF rank
    #[default]
    EqHist,
}

impl Rescale {
    pub fn name(&self) -> &'static str {
        match self {
            Rescale::Linear => "linear",
            Rescale::Log => "log",
            Rescale::EqHist => "eq_hist",
        }
    }
}

impl std::str::FromStr for Rescale {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" => Ok(Rescale::Linear),
            "log" => Ok(Rescale::Log),
            "eq_hist" | "eqhist" => Ok(Rescale::EqHist),
            other => Err(RasterError::config(format!(
                "unknown rescale method '{other}', expected linear, log or eq_hist"
            ))),
        }
    }
}

/// Rescale finalized cell values into [0, 1].
///
/// `None` (no observation) and non-finite values stay `None`. When every
/// observed value is equal there is no spread to normalize and all of them
/// map to 1.0, the top of the colormap.
pub fn rescale(values: &[Option<f64>], how: Rescale) -> RasterResult<Vec<Option<f64>>> {
    let observed = values.iter().map(|v| v.filter(|x| x.is_finite()));

    match how {
        Rescale::Linear => Ok(min_max(observed.collect())),
        Rescale::Log => {
            let collected: Vec<Option<f64>> = observed.collect();
            if let Some(neg) = collected.iter().flatten().find(|v| **v < 0.0) {
                return Err(RasterError::range(format!(
                    "log rescale needs non-negative values, found {neg}"
                )));
            }
            Ok(min_max(
                collected.into_iter().map(|v| v.map(f64::ln_1p)).collect(),
            ))
        }
        Rescale::EqHist => Ok(eq_hist(observed.collect())),
    }
}

fn min_max(values: Vec<Option<f64>>) -> Vec<Option<f64>> {
    let (lo, hi) = values
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let span = hi - lo;

    values
        .into_iter()
        .map(|v| {
            v.map(|x| {
                if span > 0.0 {
                    ((x - lo) / span).clamp(0.0, 1.0)
                } else {
                    1.0
                }
            })
        })
        .collect()
}

/// Histogram equalization over observed cells.
///
/// Each value is placed halfway between its empirical-CDF rank (fraction of
/// cells <= v, lowest value pinned to 0) and its rank among the distinct
/// values spread evenly over [0, 1]. Ties share a position, and neighbouring
/// distinct values are always at least `1 / (2 * (distinct - 1))` apart, so
/// a heavy pile of equal cells cannot squeeze the rest into one color.
fn eq_hist(values: Vec<Option<f64>>) -> Vec<Option<f64>> {
    let mut sorted: Vec<f64> = values.iter().flatten().copied().collect();
    if sorted.is_empty() {
        return values;
    }
    sorted.sort_by(f64::total_cmp);
    let mut distinct = sorted.clone();
    distinct.dedup();
    if distinct.len() == 1 {
        return values.iter().map(|v| v.map(|_| 1.0)).collect();
    }

    let n = sorted.len() as f64;
    let cdf = |v: f64| sorted.partition_point(|&x| x <= v) as f64 / n;
    let floor = cdf(distinct[0]);
    let steps = (distinct.len() - 1) as f64;

    values
        .iter()
        .map(|v| {
            v.map(|x| {
                let by_cells = (cdf(x) - floor) / (1.0 - floor);
                let by_value = distinct.partition_point(|&d| d < x) as f64 / steps;
                (0.5 * (by_cells + by_value)).clamp(0.0, 1.0)
            })
        })
        .collect()
}
