//! Central error type for the rasterization pipeline.
//!
//! Structural problems (bad canvas, bad colormap, bad config, rescale
//! preconditions) are reported before any point is processed. Per-point data
//! problems are never errors; the binner drops and counts them instead.

/// Errors surfaced to callers of the pipeline.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RasterError {
    #[error("invalid canvas geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid value range: {0}")]
    InvalidRange(String),

    #[error("invalid colormap: {0}")]
    InvalidColormap(String),

    #[error("invalid render config: {0}")]
    InvalidConfig(String),

    /// Cooperative cancellation observed between chunks. `processed` is the
    /// number of input items consumed before the pipeline stopped.
    #[error("render cancelled after {processed} points")]
    Cancelled { processed: u64 },
}

impl RasterError {
    pub fn geometry<T: ToString>(msg: T) -> Self {
        RasterError::InvalidGeometry(msg.to_string())
    }

    pub fn range<T: ToString>(msg: T) -> Self {
        RasterError::InvalidRange(msg.to_string())
    }

    pub fn colormap<T: ToString>(msg: T) -> Self {
        RasterError::InvalidColormap(msg.to_string())
    }

    pub fn config<T: ToString>(msg: T) -> Self {
        RasterError::InvalidConfig(msg.to_string())
    }

    /// True for the cancellation outcome, which callers usually treat as
    /// "stop quietly" rather than a failure to report.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RasterError::Cancelled { .. })
    }
}

/// Result type alias for pipeline operations
pub type RasterResult<T> = Result<T, RasterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_category() {
        let err = RasterError::geometry("width must be positive");
        assert_eq!(err.to_string(), "invalid canvas geometry: width must be positive");
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_cancelled_is_distinct() {
        let err = RasterError::Cancelled { processed: 4096 };
        assert!(err.is_cancelled());
        assert_eq!(err.to_string(), "render cancelled after 4096 points");
    }
}
