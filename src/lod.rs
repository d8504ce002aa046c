//! Level-of-detail pre-filter.
//!
//! Bounds how many points reach the binner. It never looks at coordinates or
//! the canvas; it only decides which items of the stream to keep.

use std::iter::Enumerate;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cancel::CancelToken;
use crate::error::{RasterError, RasterResult};
use crate::hash;

/// Zoom level at and above which every point is rendered
pub const FULL_DETAIL_ZOOM: f64 = 10.0;

/// Point budget for one render call
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LodBudget {
    /// Every point passes
    #[default]
    Full,
    /// Keep each point independently with this probability (0 keeps none)
    Fraction(f64),
    /// Keep a uniform random subset of at most this many points
    Cap(usize),
}

impl LodBudget {
    /// Budget for a map zoom level: full detail from zoom 10 up, otherwise
    /// `1 / (11 - zoom)` of the points (zoom 9 keeps half, zoom 5 a sixth).
    pub fn from_zoom(zoom: f64) -> Self {
        if zoom < FULL_DETAIL_ZOOM {
            LodBudget::Fraction((1.0 / (FULL_DETAIL_ZOOM + 1.0 - zoom)).clamp(f64::MIN_POSITIVE, 1.0))
        } else {
            LodBudget::Full
        }
    }

    pub fn validate(&self) -> RasterResult<()> {
        match *self {
            LodBudget::Fraction(f) if !f.is_finite() || f < 0.0 => Err(RasterError::config(
                format!("LOD fraction must be a finite number >= 0, got {f}"),
            )),
            _ => Ok(()),
        }
    }

    /// True when the budget keeps everything
    pub fn is_full(&self) -> bool {
        match *self {
            LodBudget::Full => true,
            LodBudget::Fraction(f) => f >= 1.0,
            LodBudget::Cap(_) => false,
        }
    }

    /// Expected number of survivors out of `n` input points
    pub fn expected(&self, n: usize) -> usize {
        match *self {
            LodBudget::Full => n,
            LodBudget::Fraction(f) => (n as f64 * f.min(1.0)).round() as usize,
            LodBudget::Cap(cap) => n.min(cap),
        }
    }
}

/// Stream produced by [`sample`]
pub enum Sampled<I: Iterator> {
    Full(I),
    Fraction {
        inner: Enumerate<I>,
        fraction: f64,
        seed: u64,
    },
    Reservoir(std::vec::IntoIter<I::Item>),
}

impl<I: Iterator> Iterator for Sampled<I> {
    type Item = I::Item;

    #[inline]
    fn next(&mut self) -> Option<I::Item> {
        match self {
            Sampled::Full(inner) => inner.next(),
            Sampled::Fraction {
                inner,
                fraction,
                seed,
            } => inner
                .by_ref()
                .find(|(i, _)| hash::draw(*seed, *i as u64) < *fraction)
                .map(|(_, item)| item),
            Sampled::Reservoir(kept) => kept.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Sampled::Full(inner) => inner.size_hint(),
            Sampled::Fraction { inner, .. } => (0, inner.size_hint().1),
            Sampled::Reservoir(kept) => kept.size_hint(),
        }
    }
}

/// Apply `budget` to a stream.
///
/// `Fraction` stays lazy: each item's fate is a pure function of
/// `(seed, position)`, so the same seed always keeps the same items no matter
/// how the stream is chunked. `Cap` has to see the whole stream before it
/// knows which items survive, so it drains the source into a reservoir of at
/// most `cap` items.
pub fn sample<I>(items: I, budget: &LodBudget, seed: u64) -> RasterResult<Sampled<I::IntoIter>>
where
    I: IntoIterator,
{
    sample_cancellable(items, budget, seed, usize::MAX, &CancelToken::new())
}

/// [`sample`] for long streams: while draining a `Cap` reservoir, `cancel`
/// is polled every `chunk_size` items. The lazy budgets leave polling to
/// whoever pulls the returned stream.
pub fn sample_cancellable<I>(
    items: I,
    budget: &LodBudget,
    seed: u64,
    chunk_size: usize,
    cancel: &CancelToken,
) -> RasterResult<Sampled<I::IntoIter>>
where
    I: IntoIterator,
{
    budget.validate()?;
    let items = items.into_iter();
    Ok(match *budget {
        _ if budget.is_full() => Sampled::Full(items),
        LodBudget::Fraction(fraction) => Sampled::Fraction {
            inner: items.enumerate(),
            fraction,
            seed,
        },
        LodBudget::Cap(cap) => {
            let kept = reservoir(items, cap, seed, chunk_size.max(1), cancel)?;
            Sampled::Reservoir(kept.into_iter())
        }
        LodBudget::Full => Sampled::Full(items),
    })
}

/// Algorithm R: uniform subset of at most `cap` items in a single pass
fn reservoir<I: Iterator>(
    mut items: I,
    cap: usize,
    seed: u64,
    chunk_size: usize,
    cancel: &CancelToken,
) -> RasterResult<Vec<I::Item>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut kept = Vec::with_capacity(cap.min(1 << 20));
    let mut i = 0usize;
    loop {
        if i % chunk_size == 0 && cancel.is_cancelled() {
            warn!(processed = i, "reservoir sampling cancelled");
            return Err(RasterError::Cancelled { processed: i as u64 });
        }
        let Some(item) = items.next() else {
            break;
        };
        if i < cap {
            kept.push(item);
        } else {
            let j = rng.random_range(0..=i);
            if j < cap {
                kept[j] = item;
            }
        }
        i += 1;
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Point;

    fn source(n: usize) -> Vec<Point> {
        (0..n).map(|i| Point::new(i as f64, -(i as f64))).collect()
    }

    #[test]
    fn test_from_zoom() {
        assert_eq!(LodBudget::from_zoom(12.0), LodBudget::Full);
        assert_eq!(LodBudget::from_zoom(10.0), LodBudget::Full);
        assert_eq!(LodBudget::from_zoom(9.0), LodBudget::Fraction(0.5));
        assert_eq!(LodBudget::from_zoom(5.0), LodBudget::Fraction(1.0 / 6.0));
        assert_eq!(LodBudget::from_zoom(f64::NAN), LodBudget::Full);
    }

    #[test]
    fn test_fraction_reproducible() {
        let pts = source(1000);
        let a: Vec<Point> = sample(pts.clone(), &LodBudget::Fraction(0.5), 42).unwrap().collect();
        let b: Vec<Point> = sample(pts.clone(), &LodBudget::Fraction(0.5), 42).unwrap().collect();
        assert_eq!(a, b);
        assert!((430..=570).contains(&a.len()), "kept {}", a.len());

        let c: Vec<Point> = sample(pts, &LodBudget::Fraction(0.5), 7).unwrap().collect();
        assert_ne!(a, c);
    }

    #[test]
    fn test_fraction_independent_of_chunking() {
        let pts = source(300);
        let whole: Vec<Point> = sample(pts.clone(), &LodBudget::Fraction(0.3), 9).unwrap().collect();
        // Pull the same sampler in uneven bites
        let mut sampler = sample(pts, &LodBudget::Fraction(0.3), 9).unwrap();
        let mut bitten = Vec::new();
        for bite in [1, 5, 17, 1000] {
            bitten.extend(sampler.by_ref().take(bite));
        }
        assert_eq!(whole, bitten);
    }

    #[test]
    fn test_pass_through() {
        let pts = source(50);
        for budget in [LodBudget::Full, LodBudget::Fraction(1.0), LodBudget::Fraction(3.0)] {
            let out: Vec<Point> = sample(pts.clone(), &budget, 1).unwrap().collect();
            assert_eq!(out, pts);
        }
    }

    #[test]
    fn test_cap() {
        let pts = source(1000);
        let a: Vec<Point> = sample(pts.clone(), &LodBudget::Cap(100), 42).unwrap().collect();
        let b: Vec<Point> = sample(pts.clone(), &LodBudget::Cap(100), 42).unwrap().collect();
        assert_eq!(a.len(), 100);
        assert_eq!(a, b);

        let all: Vec<Point> = sample(pts.clone(), &LodBudget::Cap(5000), 42).unwrap().collect();
        assert_eq!(all, pts);
        assert_eq!(sample(pts, &LodBudget::Cap(0), 42).unwrap().count(), 0);
    }

    #[test]
    fn test_zero_fraction_keeps_nothing() {
        let out: Vec<Point> = sample(source(500), &LodBudget::Fraction(0.0), 3).unwrap().collect();
        assert!(out.is_empty());
    }

    #[test]
    fn test_cap_reservoir_stops_on_cancel() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut read = 0usize;
        let src = (0..1_000_000).map(|i| {
            read += 1;
            Point::new(i as f64, 0.0)
        });
        let result = sample_cancellable(src, &LodBudget::Cap(10), 1, 100, &cancel);
        assert!(matches!(result, Err(RasterError::Cancelled { processed: 0 })));
        assert_eq!(read, 0);
    }

    #[test]
    fn test_cap_reservoir_cancel_mid_stream() {
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let src = (0..10_000).map(move |i| {
            if i == 250 {
                trigger.cancel();
            }
            Point::new(i as f64, 0.0)
        });
        let result = sample_cancellable(src, &LodBudget::Cap(10), 1, 100, &cancel);
        assert!(matches!(result, Err(RasterError::Cancelled { processed: 300 })));
    }

    #[test]
    fn test_invalid_fraction() {
        for f in [-0.5, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                sample(source(3), &LodBudget::Fraction(f), 1),
                Err(RasterError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_expected() {
        assert_eq!(LodBudget::Fraction(0.25).expected(1000), 250);
        assert_eq!(LodBudget::Cap(10).expected(3), 3);
        assert_eq!(LodBudget::Full.expected(7), 7);
    }
}
