//! Errors raised while attaching the engine to a target.

use thiserror::Error;

/// Construction errors.
///
/// Both variants are fatal and raised before any listener is attached.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PanZoomError {
    /// Missing or invalid target, or an invalid configuration value.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The target is the coordinate-space root itself.
    #[error(
        "Unsupported target: do not apply panzoom to the root <svg> element, \
         use one of its children instead (e.g. <g>)"
    )]
    UnsupportedTarget,
}

/// Result type for engine construction.
pub type PanZoomResult<T> = Result<T, PanZoomError>;
