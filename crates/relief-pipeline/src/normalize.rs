//! Elevation-to-unit-interval normalization ahead of the colormap.
//!
//! Two curves are supported:
//!
//! ```text
//! linear:  t(v) = v
//! symlog:  t(v) = v * k                              for |v| <= L
//!          t(v) = sign(v) * L * (k + log10(|v| / L)) for |v| >  L
//!          with k = 1 / (1 - 1/10)
//! ```
//!
//! and the normalized value is `(t(v) - t(min)) / (t(max) - t(min))`,
//! clamped to `[0, 1]`. The symlog curve is linear within `L` of zero and
//! logarithmic beyond, which keeps detail near sea level without letting
//! mountain peaks wash out the low-lying terrain. Both curves are
//! continuous and monotone, so normalization preserves elevation order.

use serde::{Deserialize, Serialize};

use crate::types::PipelineError;

/// Linear-region scale of the symlog curve (one decade, base 10).
const SYMLOG_LINSCALE: f64 = 1.0 / (1.0 - 1.0 / 10.0);

/// Curve used to map elevations into `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Normalization {
    /// Straight proportional mapping.
    Linear,
    /// Symmetric logarithm, linear within `linthresh` of zero.
    SymLog {
        /// Half-width of the linear region around zero.
        linthresh: f64,
    },
}

impl Normalization {
    /// Default half-width of the symlog linear region.
    pub const DEFAULT_LINTHRESH: f64 = 100.0;

    /// Check this curve against normalization bounds.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidParameter`] if either bound is not
    /// finite, `min >= max`, or the symlog threshold is not a positive
    /// finite number.
    pub fn validate(&self, min: f64, max: f64) -> Result<(), PipelineError> {
        if !(min.is_finite() && max.is_finite()) {
            return Err(PipelineError::InvalidParameter(format!(
                "normalization bounds must be finite, got [{min}, {max}]"
            )));
        }
        if min >= max {
            return Err(PipelineError::InvalidParameter(format!(
                "normalization bounds must satisfy min < max, got [{min}, {max}]"
            )));
        }
        if let Self::SymLog { linthresh } = *self
            && !(linthresh.is_finite() && linthresh > 0.0)
        {
            return Err(PipelineError::InvalidParameter(format!(
                "symlog threshold must be a positive number, got {linthresh}"
            )));
        }
        Ok(())
    }

    /// The curve `t(v)` before rescaling.
    fn transform(&self, v: f64) -> f64 {
        match *self {
            Self::Linear => v,
            Self::SymLog { linthresh } => {
                let magnitude = v.abs();
                if magnitude <= linthresh {
                    v * SYMLOG_LINSCALE
                } else {
                    v.signum() * linthresh * (SYMLOG_LINSCALE + (magnitude / linthresh).log10())
                }
            }
        }
    }
}

impl Default for Normalization {
    fn default() -> Self {
        Self::SymLog {
            linthresh: Self::DEFAULT_LINTHRESH,
        }
    }
}

/// A [`Normalization`] bound to validated `[min, max]` bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalizer {
    curve: Normalization,
    low: f64,
    span: f64,
}

impl Normalizer {
    /// Bind `curve` to `[min, max]`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidParameter`] if
    /// [`Normalization::validate`] rejects the bounds.
    pub fn new(curve: Normalization, min: f64, max: f64) -> Result<Self, PipelineError> {
        curve.validate(min, max)?;
        let low = curve.transform(min);
        let span = curve.transform(max) - low;
        Ok(Self { curve, low, span })
    }

    /// Map `value` into `[0, 1]`. `NaN` passes through as `NaN`.
    #[must_use]
    pub fn normalize(&self, value: f64) -> f64 {
        if value.is_nan() {
            return f64::NAN;
        }
        ((self.curve.transform(value) - self.low) / self.span).clamp(0.0, 1.0)
    }
}
