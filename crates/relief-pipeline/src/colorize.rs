//! Elevation coloring and hillshade blending.
//!
//! The elevation raster is normalized into `[0, 1]` and run through a
//! [`Colormap`], giving one opaque pixel per grid node (transparent for
//! `NaN` nodes). When shading is on, the hillshade is rendered through
//! [`Colormap::Greys`] after dividing by its own maximum, and the two
//! images are blended per channel:
//!
//! ```text
//! out = color * (1 - f) + grey * f
//! ```
//!
//! All images are `cols` wide and `rows` tall, matching the raster.

use image::{Rgba, RgbaImage};

use crate::colormap::Colormap;
use crate::normalize::{Normalization, Normalizer};
use crate::types::{ElevationRaster, LevelBounds, PipelineError, ShadeRaster};

/// Resolve the normalization domain for `elevation`.
///
/// # Errors
///
/// Returns [`PipelineError::ComputationFailure`] if bounds are
/// [`LevelBounds::Auto`] and the raster holds no finite value.
pub fn resolve_bounds(
    levels: LevelBounds,
    elevation: &ElevationRaster,
) -> Result<(f64, f64), PipelineError> {
    match levels {
        LevelBounds::Fixed {
            min_level,
            max_level,
        } => Ok((min_level, max_level)),
        LevelBounds::Auto => elevation.finite_range().ok_or_else(|| {
            PipelineError::ComputationFailure(
                "cannot derive color bounds from a raster with no finite values".to_string(),
            )
        }),
    }
}

/// Color an elevation raster.
///
/// # Errors
///
/// Returns [`PipelineError::ComputationFailure`] if the raster holds no
/// finite value, and [`PipelineError::InvalidParameter`] if the resolved
/// bounds are rejected by the normalization.
pub fn colorize(
    elevation: &ElevationRaster,
    colormap: Colormap,
    normalization: Normalization,
    levels: LevelBounds,
) -> Result<RgbaImage, PipelineError> {
    if elevation.finite_range().is_none() {
        return Err(PipelineError::ComputationFailure(
            "elevation raster has no finite values".to_string(),
        ));
    }
    let (min, max) = resolve_bounds(levels, elevation)?;
    let normalizer = Normalizer::new(normalization, min, max)?;

    let dimensions = elevation.dimensions();
    Ok(RgbaImage::from_fn(dimensions.width, dimensions.height, |x, y| {
        Rgba(colormap.rgba(normalizer.normalize(elevation.get(y, x))))
    }))
}

/// Render a hillshade as greys, scaled by its own maximum.
///
/// Brighter illumination renders darker, following the white-to-black
/// [`Colormap::Greys`] ramp.
///
/// # Errors
///
/// Returns [`PipelineError::ComputationFailure`] if the shade holds no
/// finite value or its maximum is not positive.
pub fn shade_to_grey(shade: &ShadeRaster) -> Result<RgbaImage, PipelineError> {
    let max = match shade.finite_range() {
        Some((_, max)) if max > 0.0 => max,
        Some((_, max)) => {
            return Err(PipelineError::ComputationFailure(format!(
                "hillshade maximum must be positive, got {max}"
            )));
        }
        None => {
            return Err(PipelineError::ComputationFailure(
                "hillshade has no finite values".to_string(),
            ));
        }
    };

    let dimensions = shade.dimensions();
    Ok(RgbaImage::from_fn(dimensions.width, dimensions.height, |x, y| {
        Rgba(Colormap::Greys.rgba(shade.get(y, x) / max))
    }))
}

/// Blend `grey` into `color` with weight `factor` on `grey`.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidParameter`] if the images differ in
/// size or `factor` lies outside `[0, 1]`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn blend(color: &RgbaImage, grey: &RgbaImage, factor: f64) -> Result<RgbaImage, PipelineError> {
    if color.dimensions() != grey.dimensions() {
        return Err(PipelineError::InvalidParameter(format!(
            "cannot blend {:?} with {:?} image",
            color.dimensions(),
            grey.dimensions()
        )));
    }
    if !(0.0..=1.0).contains(&factor) {
        return Err(PipelineError::InvalidParameter(format!(
            "blend factor must lie in [0, 1], got {factor}"
        )));
    }

    let mut out = color.clone();
    for (dst, src) in out.pixels_mut().zip(grey.pixels()) {
        for (d, &s) in dst.0.iter_mut().zip(&src.0) {
            let mixed = (f64::from(s) - f64::from(*d)).mul_add(factor, f64::from(*d));
            *d = mixed.clamp(0.0, 255.0) as u8;
        }
    }
    Ok(out)
}

/// Color `elevation` and, when `shade` is given, blend its greys in.
///
/// # Errors
///
/// Propagates errors from [`colorize`], [`shade_to_grey`] and [`blend`].
pub fn colorize_shaded(
    elevation: &ElevationRaster,
    shade: Option<&ShadeRaster>,
    colormap: Colormap,
    normalization: Normalization,
    levels: LevelBounds,
    shade_blend: f64,
) -> Result<RgbaImage, PipelineError> {
    let colored = colorize(elevation, colormap, normalization, levels)?;
    match shade {
        Some(shade) => blend(&colored, &shade_to_grey(shade)?, shade_blend),
        None => Ok(colored),
    }
}
