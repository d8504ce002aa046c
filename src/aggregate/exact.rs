//! Order-independent floating-point summation.
//!
//! The running total is kept as a short list of non-overlapping partials
//! whose exact sum is the exact sum of every value added so far. Finalizing
//! rounds that exact value once, so the result does not depend on the order
//! values arrived in or on how partial sums were merged.

/// Exact running sum of finite `f64` values
#[derive(Clone, Debug, Default)]
pub struct ExactSum {
    /// Increasing magnitude, pairwise non-overlapping. A single non-finite
    /// entry means the sum overflowed.
    partials: Vec<f64>,
}

impl ExactSum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: f64) {
        if self.overflowed() {
            self.partials[0] += value;
            return;
        }

        let mut x = value;
        let mut kept = 0;
        for j in 0..self.partials.len() {
            let mut y = self.partials[j];
            if x.abs() < y.abs() {
                std::mem::swap(&mut x, &mut y);
            }
            let hi = x + y;
            if !hi.is_finite() {
                self.partials.clear();
                self.partials.push(hi);
                return;
            }
            let lo = y - (hi - x);
            if lo != 0.0 {
                self.partials[kept] = lo;
                kept += 1;
            }
            x = hi;
        }
        self.partials.truncate(kept);
        self.partials.push(x);
    }

    /// Fold another exact sum into this one
    pub fn merge(&mut self, other: &ExactSum) {
        for &p in &other.partials {
            self.add(p);
        }
    }

    /// The exact sum rounded to the nearest `f64` (ties to even)
    pub fn value(&self) -> f64 {
        let p = &self.partials;
        let Some(&top) = p.last() else {
            return 0.0;
        };
        if self.overflowed() {
            return top;
        }

        let mut n = p.len() - 1;
        let mut hi = top;
        let mut lo = 0.0;
        while n > 0 {
            let x = hi;
            n -= 1;
            let y = p[n];
            hi = x + y;
            lo = y - (hi - x);
            if lo != 0.0 {
                break;
            }
        }
        // Half-way case: the remaining partials decide the rounding direction
        if n > 0 && ((lo < 0.0 && p[n - 1] < 0.0) || (lo > 0.0 && p[n - 1] > 0.0)) {
            let y = lo * 2.0;
            let x = hi + y;
            if y == x - hi {
                hi = x;
            }
        }
        hi
    }

    fn overflowed(&self) -> bool {
        self.partials.first().is_some_and(|p| !p.is_finite())
    }
}

/// Two sums are equal when their exact values round to the same `f64`
impl PartialEq for ExactSum {
    fn eq(&self, other: &Self) -> bool {
        self.value().to_bits() == other.value().to_bits()
    }
}

impl FromIterator<f64> for ExactSum {
    fn from_iter<T: IntoIterator<Item = f64>>(iter: T) -> Self {
        let mut sum = ExactSum::new();
        for v in iter {
            sum.add(v);
        }
        sum
    }
}
