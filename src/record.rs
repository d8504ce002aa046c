//! Caller-side records and the field selection that turns them into points.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::aggregate::Reducer;
use crate::geo::{Point, PointValue};

/// Anything that can hand out numeric fields by name: a parsed CSV row, a
/// JSON object, a struct wrapper around a dataframe row.
pub trait Record {
    fn number(&self, field: &str) -> Option<f64>;
}

impl Record for HashMap<String, f64> {
    fn number(&self, field: &str) -> Option<f64> {
        self.get(field).copied()
    }
}

impl Record for BTreeMap<String, f64> {
    fn number(&self, field: &str) -> Option<f64> {
        self.get(field).copied()
    }
}

impl Record for serde_json::Map<String, serde_json::Value> {
    fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(serde_json::Value::as_f64)
    }
}

impl Record for serde_json::Value {
    fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(serde_json::Value::as_f64)
    }
}

impl<R: Record + ?Sized> Record for &R {
    fn number(&self, field: &str) -> Option<f64> {
        (**self).number(field)
    }
}

/// Names of the coordinate fields in the caller's records
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelector {
    pub x: String,
    pub y: String,
}

impl Default for FieldSelector {
    fn default() -> Self {
        Self {
            x: "lon".to_string(),
            y: "lat".to_string(),
        }
    }
}

impl FieldSelector {
    pub fn new(x: &str, y: &str) -> Self {
        Self {
            x: x.to_string(),
            y: y.to_string(),
        }
    }

    /// Pull the coordinates and the reducer's value field out of a record.
    ///
    /// Never fails: a missing coordinate becomes NaN and a missing or
    /// malformed value becomes a NaN weight, both of which the binner drops
    /// and counts. Categories must be non-negative whole numbers.
    pub fn extract<R: Record + ?Sized>(&self, record: &R, reducer: &Reducer) -> Point {
        let x = record.number(&self.x).unwrap_or(f64::NAN);
        let y = record.number(&self.y).unwrap_or(f64::NAN);

        let value = match reducer {
            Reducer::Count => PointValue::Unweighted,
            Reducer::Sum { field } | Reducer::Mean { field } => {
                PointValue::Weight(record.number(field).unwrap_or(f64::NAN))
            }
            Reducer::CategoricalCount { field } => match record.number(field) {
                Some(c) if c >= 0.0 && c.fract() == 0.0 && c <= u32::MAX as f64 => {
                    PointValue::Category(c as u32)
                }
                _ => PointValue::Weight(f64::NAN),
            },
        };

        Point { x, y, value }
    }
}
