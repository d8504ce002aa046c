use serde::{Deserialize, Serialize};

/// Aggregation applied to every point falling into a cell.
///
/// Field names are resolved against input records by
/// [`FieldSelector`](crate::record::FieldSelector); the reducer itself only
/// ever sees the extracted point values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reducer {
    /// Number of points per cell
    #[default]
    Count,
    /// Total of `field` per cell
    Sum { field: String },
    /// Mean of `field` per cell, finalized lazily as sum / count
    Mean { field: String },
    /// Count per category code of `field`, for color-by-category
    CategoricalCount { field: String },
}

impl Reducer {
    pub fn sum(field: &str) -> Self {
        Reducer::Sum {
            field: field.to_string(),
        }
    }

    pub fn mean(field: &str) -> Self {
        Reducer::Mean {
            field: field.to_string(),
        }
    }

    pub fn categorical(field: &str) -> Self {
        Reducer::CategoricalCount {
            field: field.to_string(),
        }
    }

    /// Record field the reducer reads, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            Reducer::Count => None,
            Reducer::Sum { field } | Reducer::Mean { field } | Reducer::CategoricalCount { field } => {
                Some(field)
            }
        }
    }

    /// Short label for logs
    pub fn name(&self) -> &'static str {
        match self {
            Reducer::Count => "count",
            Reducer::Sum { .. } => "sum",
            Reducer::Mean { .. } => "mean",
            Reducer::CategoricalCount { .. } => "categorical_count",
        }
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self, Reducer::CategoricalCount { .. })
    }
}
