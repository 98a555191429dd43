//! Tolerances and limits threaded through every kernel operation.

use crate::{CsgError, Result};

/// Default distance epsilon for plane classification.
/// Points within this distance of a plane are considered "on" the plane.
pub const DEFAULT_EPSILON: f64 = 1e-5;

/// Default angular tolerance (radians) used to derive the area epsilon.
pub const DEFAULT_ANGLE_EPSILON: f64 = 0.1;

/// Default cap on BSP depth before an operation gives up.
pub const DEFAULT_MAX_DEPTH: usize = 1 << 16;

/// Kernel context passed by reference into every operation.
///
/// There is no process-wide tolerance; configurations with different
/// tolerances can be used side by side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CsgConfig {
    /// Distance below which a point is on a plane.
    pub epsilon: f64,
    /// Minimum Newell normal length (twice the area) of a usable polygon.
    pub area_epsilon: f64,
    /// Bucket width used by the fuzzy deduplication pass.
    pub fuzzy_tolerance: f64,
    /// Maximum BSP depth.
    pub max_depth: usize,
    /// Merge coplanar fragments back together after a boolean.
    pub retessellate: bool,
}

impl Default for CsgConfig {
    fn default() -> Self {
        Self::with_epsilon(DEFAULT_EPSILON)
    }
}

impl CsgConfig {
    /// Builds a configuration around a distance epsilon, deriving the area
    /// epsilon and the fuzzy tolerance from it.
    pub fn with_epsilon(epsilon: f64) -> Self {
        Self {
            epsilon,
            area_epsilon: area_epsilon_for(epsilon, DEFAULT_ANGLE_EPSILON),
            fuzzy_tolerance: epsilon,
            max_depth: DEFAULT_MAX_DEPTH,
            retessellate: true,
        }
    }

    /// Returns a copy with a different depth cap.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns a copy with a different fuzzy bucket width.
    pub fn with_fuzzy_tolerance(mut self, tolerance: f64) -> Self {
        self.fuzzy_tolerance = tolerance;
        self
    }

    /// Returns a copy with retessellation switched on or off.
    pub fn with_retessellate(mut self, retessellate: bool) -> Self {
        self.retessellate = retessellate;
        self
    }

    /// Checks that all tolerances are finite and positive.
    pub fn validate(&self) -> Result<()> {
        let positive = |value: f64| value.is_finite() && value > 0.0;
        if !positive(self.epsilon) {
            return Err(CsgError::invalid_config(format!(
                "epsilon must be finite and positive, got {}",
                self.epsilon
            )));
        }
        if !positive(self.area_epsilon) {
            return Err(CsgError::invalid_config(format!(
                "area epsilon must be finite and positive, got {}",
                self.area_epsilon
            )));
        }
        if !positive(self.fuzzy_tolerance) {
            return Err(CsgError::invalid_config(format!(
                "fuzzy tolerance must be finite and positive, got {}",
                self.fuzzy_tolerance
            )));
        }
        if self.max_depth == 0 {
            return Err(CsgError::invalid_config("max depth must be at least 1"));
        }
        Ok(())
    }
}

/// Area tolerance for a triangle with two sides of length `epsilon` meeting
/// at `angle_epsilon`.
fn area_epsilon_for(epsilon: f64, angle_epsilon: f64) -> f64 {
    0.5 * epsilon * epsilon * angle_epsilon.sin()
}
