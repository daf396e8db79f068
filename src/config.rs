use crate::error::TraceError;
use crate::prune::COLLINEAR_EPSILON;

/// All tracing parameters in one struct.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    // -- Bitmap stage --
    /// Gray level separating foreground (brighter) from background.
    pub threshold: u8,
    /// If true, invert the binary mask so dark pixels become foreground.
    pub invert: bool,

    // -- Contour stage --
    /// Contours enclosing at least this fraction of the image area are
    /// treated as the background and dropped.
    pub background_ratio: f64,
    /// Ramer-Douglas-Peucker tolerance in pixels applied to each boundary.
    /// Removes single-pixel staircase steps so straight edges stay straight
    /// and only real corners survive. 0 = off.
    pub simplify_epsilon: f64,

    // -- Curve fitting --
    /// Smoothing tolerance handed to the spline fitter: the bound on the sum
    /// of squared residuals in normalized coordinates. Lower = tighter fit,
    /// more segments.
    pub tolerance: f64,
    /// Normalize each shape by its own bounding box instead of the unit box.
    pub scale_fix: bool,
    /// Maximum edge length after densification, as a fraction of the
    /// median edge length.
    pub densify_factor: f64,
    /// B-spline degree. The emitted records assume cubic segments.
    pub degree: usize,

    // -- Pruning --
    /// Collinearity threshold for removing redundant vertices.
    pub collinear_epsilon: f64,
}

impl TracingConfig {
    /// Reject settings that make the run meaningless before any work starts.
    pub fn validate(&self) -> Result<(), TraceError> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(TraceError::InvalidTolerance(self.tolerance));
        }
        if self.degree == 0 {
            return Err(TraceError::InvalidSpline("degree must be at least 1".into()));
        }
        Ok(())
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            threshold: 110,
            invert: false,
            background_ratio: 0.99,
            simplify_epsilon: 1.0,
            tolerance: 1e-4,
            scale_fix: true,
            densify_factor: 0.5,
            degree: 3,
            collinear_epsilon: COLLINEAR_EPSILON,
        }
    }
}
