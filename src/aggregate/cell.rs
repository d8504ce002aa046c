//! Per-cell accumulators.
//!
//! Every accumulator starts at its identity (`Default`), absorbs points one at
//! a time, and merges with another partial accumulator through an associative,
//! commutative `merge`. That pair of properties is what lets a grid be built
//! in any point order, in chunks, or on several workers at once.

use std::collections::BTreeMap;

use crate::aggregate::exact::ExactSum;
use crate::geo::PointValue;

/// Accumulator stored in every grid cell
pub trait CellState: Clone + Default + Send + Sync {
    /// Fold one point into the cell. Returns false if this accumulator has
    /// no use for the value (e.g. a weight under a categorical reducer).
    fn observe(&mut self, value: PointValue) -> bool;

    /// Combine another partial accumulator into this one
    fn merge(&mut self, other: &Self);

    /// True while the cell has received no observation
    fn is_empty(&self) -> bool;
}

/// Plain occurrence count
impl CellState for u64 {
    #[inline(always)]
    fn observe(&mut self, _value: PointValue) -> bool {
        *self += 1;
        true
    }

    #[inline(always)]
    fn merge(&mut self, other: &Self) {
        *self += *other;
    }

    #[inline(always)]
    fn is_empty(&self) -> bool {
        *self == 0
    }
}

/// Running sum together with the number of contributions, so that both the
/// total and the mean can be finalized and empty cells stay recognizable.
/// The sum is exact, so any partition of the points merges to the same total.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SumCount {
    pub sum: ExactSum,
    pub count: u64,
}

impl SumCount {
    /// Mean of the observed values, `None` for an empty cell
    #[inline(always)]
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum.value() / self.count as f64)
        }
    }

    /// Total of the observed values, `None` for an empty cell
    #[inline(always)]
    pub fn total(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum.value())
        }
    }
}

impl CellState for SumCount {
    #[inline(always)]
    fn observe(&mut self, value: PointValue) -> bool {
        match value {
            PointValue::Category(_) => false,
            other => {
                self.sum.add(other.weight());
                self.count += 1;
                true
            }
        }
    }

    #[inline(always)]
    fn merge(&mut self, other: &Self) {
        self.sum.merge(&other.sum);
        self.count += other.count;
    }

    #[inline(always)]
    fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Category code -> count for one cell. Ordered so iteration (and anything
/// derived from it, like blended colors) is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategoryCounts(BTreeMap<u32, u64>);

impl CategoryCounts {
    pub fn get(&self, category: u32) -> u64 {
        self.0.get(&category).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u64)> + '_ {
        self.0.iter().map(|(&k, &v)| (k, v))
    }

    /// Most frequent category; ties go to the lowest code
    pub fn dominant(&self) -> Option<u32> {
        self.0
            .iter()
            .fold(None, |best: Option<(u32, u64)>, (&k, &v)| match best {
                Some((_, bv)) if bv >= v => best,
                _ => Some((k, v)),
            })
            .map(|(k, _)| k)
    }
}

impl CellState for CategoryCounts {
    #[inline]
    fn observe(&mut self, value: PointValue) -> bool {
        match value {
            PointValue::Category(c) => {
                *self.0.entry(c).or_insert(0) += 1;
                true
            }
            _ => false,
        }
    }

    fn merge(&mut self, other: &Self) {
        for (&k, &v) in &other.0 {
            *self.0.entry(k).or_insert(0) += v;
        }
    }

    #[inline(always)]
    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
