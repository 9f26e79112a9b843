//! Gaussian smoothing of elevation rasters before contour tracing.
//!
//! Wraps [`imageproc::filter::gaussian_blur_f32`] on a single-channel
//! `f32` image. Smoothing is a convex combination of neighboring samples,
//! so the output stays inside the input's value range and is **not**
//! renormalized afterwards. Borders are handled by edge replication.
//!
//! `NaN` cells would spread through the kernel; they are filled with the
//! raster mean before blurring and restored to `NaN` afterwards so no-data
//! holes keep their footprint.

use image::{ImageBuffer, Luma};

use crate::types::ElevationRaster;

/// Single-channel `f32` image accepted by `imageproc` filters.
type FloatImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Apply a Gaussian blur to an elevation raster.
///
/// Higher `sigma` values produce more smoothing. Non-positive sigma values
/// (zero or negative) return the raster unchanged, since `imageproc`'s
/// underlying function panics on `sigma <= 0.0`.
#[must_use = "returns the smoothed raster"]
#[allow(clippy::cast_possible_truncation)]
pub fn gaussian_blur(raster: &ElevationRaster, sigma: f32) -> ElevationRaster {
    if sigma <= 0.0 || sigma.is_nan() {
        return raster.clone();
    }

    let dimensions = raster.dimensions();
    let fill = finite_mean(raster.as_slice());
    let samples: Vec<f32> = raster
        .as_slice()
        .iter()
        .map(|&v| (if v.is_nan() { fill } else { v }) as f32)
        .collect();

    let Some(image) = FloatImage::from_raw(dimensions.width, dimensions.height, samples) else {
        return raster.clone();
    };
    let blurred = imageproc::filter::gaussian_blur_f32(&image, sigma);

    ElevationRaster::from_fn(dimensions, |row, col| {
        if raster.get(row, col).is_nan() {
            f64::NAN
        } else {
            f64::from(blurred.get_pixel(col, row).0[0])
        }
    })
}

/// Mean of the finite samples, or 0 when there are none.
#[allow(clippy::cast_precision_loss)]
fn finite_mean(samples: &[f64]) -> f64 {
    let (sum, count) = samples
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0_usize), |(sum, count), &v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}
