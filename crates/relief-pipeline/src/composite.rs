//! Overlay compositing and PNG encoding.
//!
//! The contour overlay is pasted onto the colored raster using its own
//! alpha channel as the mask. Base alpha is never changed, so no-data
//! holes in the colored raster stay transparent under contour pixels.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::types::PipelineError;

/// How overlay pixels are combined with the base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PasteMode {
    /// Overlay pixels with non-zero alpha replace the base RGB outright.
    #[default]
    Stencil,
    /// Overlay RGB is mixed into the base, weighted by overlay alpha.
    Blend,
}

/// Paste `overlay` onto `base`.
///
/// With no overlay the base is returned unchanged.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidParameter`] if the overlay and base
/// differ in size.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn composite(
    base: &RgbaImage,
    overlay: Option<&RgbaImage>,
    mode: PasteMode,
) -> Result<RgbaImage, PipelineError> {
    let Some(overlay) = overlay else {
        return Ok(base.clone());
    };
    if overlay.dimensions() != base.dimensions() {
        return Err(PipelineError::InvalidParameter(format!(
            "overlay is {:?} but base is {:?}",
            overlay.dimensions(),
            base.dimensions()
        )));
    }

    let mut out = base.clone();
    for (dst, src) in out.pixels_mut().zip(overlay.pixels()) {
        let alpha = src.0[3];
        if alpha == 0 {
            continue;
        }
        match mode {
            PasteMode::Stencil => dst.0[..3].copy_from_slice(&src.0[..3]),
            PasteMode::Blend => {
                let weight = f64::from(alpha) / 255.0;
                for (d, &s) in dst.0[..3].iter_mut().zip(&src.0[..3]) {
                    let mixed = (f64::from(s) - f64::from(*d)).mul_add(weight, f64::from(*d));
                    *d = mixed.round().clamp(0.0, 255.0) as u8;
                }
            }
        }
    }
    Ok(out)
}

/// Encode an RGBA image as PNG bytes.
///
/// # Errors
///
/// Returns [`PipelineError::ImageEncode`] if the encoder fails.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, PipelineError> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(buf)
}
