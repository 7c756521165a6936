//! Errors raised when a visibility engine is configured or entered with
//! input it cannot work with. An unreachable target is not an error.

/// Errors that can occur when building or invoking a visibility engine.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum VisionError {
    /// The resistance map has no cells.
    #[error("resistance map must be non-empty, got {width}x{height}")]
    EmptyMap {
        /// Width of the map.
        width: i32,
        /// Height of the map.
        height: i32,
    },

    /// An algorithm or metric name that does not match any known variant.
    #[error("unknown algorithm or metric: {0:?}")]
    UnknownAlgorithm(String),

    /// A ripple neighbor count outside {1, 2, 3, 6}.
    #[error("ripple looseness must be 1, 2, 3 or 6, got {0}")]
    InvalidLooseness(usize),

    /// Configuration text that could not be parsed.
    #[error("invalid vision config: {0}")]
    Config(#[from] toml::de::Error),

    /// A configuration file that could not be read.
    #[error("failed to read vision config: {0}")]
    Io(#[from] std::io::Error),
}

pub(crate) fn check_map<T: Clone>(map: &crate::base::Matrix<T>) -> Result<(), VisionError> {
    if map.is_empty() {
        let crate::base::Point(width, height) = map.size;
        return Err(VisionError::EmptyMap { width, height });
    }
    Ok(())
}
