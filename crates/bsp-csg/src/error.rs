//! Error types for polygon construction and boolean operations.

use thiserror::Error;

/// Errors surfaced by the kernel.
///
/// Degenerate fragments produced while splitting are never reported here;
/// they are dropped. Only malformed input and resource limits are errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CsgError {
    /// A polygon was given fewer than three vertices.
    #[error("polygon needs at least 3 vertices, got {count}")]
    TooFewVertices { count: usize },

    /// A vertex coincides with the one before it.
    #[error("vertex {index} repeats the previous vertex")]
    RepeatedVertex { index: usize },

    /// A vertex lies off the polygon's plane.
    #[error("vertex {index} lies {distance} off the polygon plane (tolerance {tolerance})")]
    NonPlanar {
        index: usize,
        distance: f64,
        tolerance: f64,
    },

    /// The plane normal is (near) zero, so the polygon has no area.
    #[error("degenerate plane: normal length {length}")]
    DegeneratePlane { length: f64 },

    /// The BSP tree grew deeper than the configured limit.
    #[error("BSP depth limit of {limit} exceeded")]
    DepthLimitExceeded { limit: usize },

    /// A configuration value is out of range.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl CsgError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CsgError>;
