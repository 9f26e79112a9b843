//! Hillshade (shaded relief) from an elevation raster.
//!
//! Gradients are taken with centered differences in the interior and
//! one-sided differences on the first/last row and column, at unit pixel
//! spacing. Slope and aspect are combined with a virtual light source:
//!
//! ```text
//! slope  = pi/2 - atan(|g|)
//! aspect = atan2(-g_row, g_col)
//! v      = sin(alt) sin(slope) + cos(alt) cos(slope) cos((az' - pi/2) - aspect)
//! shade  = 255 (v + 1) / 2
//! ```
//!
//! where `az' = radians(360 - azimuth)`. The result always lies in
//! `[0, 255]`.
//!
//! # Slope magnitude
//!
//! `|g|` is selected by [`SlopeMagnitude`]. [`SlopeMagnitude::TwoAxis`]
//! uses the true hypotenuse of both gradient components and is the
//! default. [`SlopeMagnitude::RowAxisOnly`] uses only the row component,
//! which reproduces maps rendered by earlier versions of this tool: on
//! east-west slopes it reports the terrain as flat.

use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use crate::types::{ElevationRaster, PipelineError, ShadeRaster};

/// How the two gradient components are combined into a slope magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SlopeMagnitude {
    /// `sqrt(g_row^2 + g_col^2)`.
    #[default]
    TwoAxis,
    /// `|g_row|` alone.
    RowAxisOnly,
}

/// Light source and slope model for [`hillshade`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HillshadeParams {
    /// Light azimuth in degrees; wrapped into `[0, 360)`.
    pub azimuth: f64,
    /// Light altitude above the horizon in degrees, `[0, 90]`.
    pub altitude: f64,
    /// Gradient combination used for the slope.
    pub slope_magnitude: SlopeMagnitude,
}

impl HillshadeParams {
    /// Default light azimuth in degrees.
    pub const DEFAULT_AZIMUTH: f64 = 30.0;

    /// Default light altitude in degrees.
    pub const DEFAULT_ALTITUDE: f64 = 30.0;

    /// Check the light source angles.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidParameter`] if the azimuth is not
    /// finite or the altitude lies outside `[0, 90]`.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.azimuth.is_finite() {
            return Err(PipelineError::InvalidParameter(format!(
                "hillshade azimuth must be finite, got {}",
                self.azimuth
            )));
        }
        if !(0.0..=90.0).contains(&self.altitude) {
            return Err(PipelineError::InvalidParameter(format!(
                "hillshade altitude must lie in [0, 90] degrees, got {}",
                self.altitude
            )));
        }
        Ok(())
    }

    /// Azimuth wrapped into `[0, 360)`.
    #[must_use]
    pub fn wrapped_azimuth(&self) -> f64 {
        let az = self.azimuth.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360 for tiny negative inputs.
        if az >= 360.0 { 0.0 } else { az }
    }
}

impl Default for HillshadeParams {
    fn default() -> Self {
        Self {
            azimuth: Self::DEFAULT_AZIMUTH,
            altitude: Self::DEFAULT_ALTITUDE,
            slope_magnitude: SlopeMagnitude::default(),
        }
    }
}

/// Derivative of `len` samples read through `at` (numpy-style gradient).
fn derivative(len: u32, i: u32, at: impl Fn(u32) -> f64) -> f64 {
    if len < 2 {
        0.0
    } else if i == 0 {
        at(1) - at(0)
    } else if i == len - 1 {
        at(i) - at(i - 1)
    } else {
        (at(i + 1) - at(i - 1)) / 2.0
    }
}

/// Compute the illumination raster for `elevation`.
///
/// `NaN` elevations propagate to `NaN` shade in their neighborhood.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidParameter`] if `params` fails
/// [`HillshadeParams::validate`].
pub fn hillshade(
    elevation: &ElevationRaster,
    params: &HillshadeParams,
) -> Result<ShadeRaster, PipelineError> {
    params.validate()?;

    let rows = elevation.rows();
    let cols = elevation.cols();
    let az_rad = (360.0 - params.wrapped_azimuth()).to_radians();
    let alt_rad = params.altitude.to_radians();
    let (sin_alt, cos_alt) = alt_rad.sin_cos();

    let shade = ShadeRaster::from_fn(elevation.dimensions(), |row, col| {
        let g_row = derivative(rows, row, |r| elevation.get(r, col));
        let g_col = derivative(cols, col, |c| elevation.get(row, c));

        let magnitude = match params.slope_magnitude {
            SlopeMagnitude::TwoAxis => g_row.hypot(g_col),
            SlopeMagnitude::RowAxisOnly => g_row.abs(),
        };
        let slope = FRAC_PI_2 - magnitude.atan();
        let aspect = (-g_row).atan2(g_col);

        let lit = sin_alt.mul_add(
            slope.sin(),
            cos_alt * slope.cos() * ((az_rad - FRAC_PI_2) - aspect).cos(),
        );
        255.0 * (lit + 1.0) / 2.0
    });
    Ok(shade)
}
